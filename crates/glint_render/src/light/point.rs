use glint_math::{Color, Vec3, INV_FOUR_PI};

use crate::light::{DirectLightSample, Light};
use crate::sampler::Sampler;

/// Isotropic point light.
#[derive(Debug, Clone)]
pub struct PointLight {
    position: Vec3,
    intensity: Color,
}

impl PointLight {
    /// `power` is the total emitted flux.
    pub fn new(position: Vec3, power: Color) -> Self {
        Self {
            position,
            intensity: power * INV_FOUR_PI,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }
}

impl Light for PointLight {
    fn sample_direct(&self, origin: Vec3, _rng: &mut dyn Sampler) -> DirectLightSample {
        let offset = self.position - origin;
        let distance2 = offset.length_squared();
        if distance2 == 0.0 {
            return DirectLightSample::invalid();
        }
        let distance = distance2.sqrt();
        DirectLightSample {
            wi: offset / distance,
            weight: self.intensity / distance2,
            distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::IndependentSampler;
    use std::f32::consts::PI;

    #[test]
    fn test_point_light_falloff() {
        let light = PointLight::new(Vec3::new(0.0, 4.0, 0.0), Color::splat(4.0 * PI * 16.0));
        let mut rng = IndependentSampler::new(1, 0);
        let sample = light.sample_direct(Vec3::ZERO, &mut rng);
        assert!((sample.wi - Vec3::Y).length() < 1e-6);
        assert!((sample.distance - 4.0).abs() < 1e-6);
        assert!((sample.weight.x - 1.0).abs() < 1e-5);
        assert!(!light.can_be_intersected());
    }
}
