//! Pure helpers for HTTP fetching: no I/O happens here.

mod retry;
mod status;

pub use retry::retry_delay;
pub use status::{StatusClass, classify_status};
