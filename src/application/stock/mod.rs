mod adjuster;
mod errors;

pub use adjuster::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy, StockAdjuster};
pub use errors::{Result, StockAdjustError};
