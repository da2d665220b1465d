//! Thread-safe render progress that logs every ten percent.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct Progress {
    completed: AtomicUsize,
    /// Last reported tenth
    reported: AtomicUsize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            reported: AtomicUsize::new(0),
            total,
        }
    }

    /// Records `amount` finished units of work.
    pub fn advance(&self, amount: usize) {
        let done = self.completed.fetch_add(amount, Ordering::SeqCst) + amount;
        if self.total == 0 {
            return;
        }
        let tenth = (done * 10 / self.total).min(10);
        let previous = self.reported.fetch_max(tenth, Ordering::SeqCst);
        if tenth > previous {
            log::info!("Rendering: {}%", tenth * 10);
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Fraction of the work done, in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed() as f32 / self.total as f32).min(1.0)
    }

    pub fn is_done(&self) -> bool {
        self.completed() >= self.total
    }
}
