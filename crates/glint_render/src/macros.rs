/// Marks a code path that has deliberately not been written yet.
///
/// Reaching it logs the location and aborts the process. This is not an
/// error that callers can handle.
#[macro_export]
macro_rules! not_implemented {
    () => {{
        log::error!("{}:{}: method not implemented", file!(), line!());
        std::process::abort()
    }};
}
