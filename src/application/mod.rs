pub mod error_code;
pub mod lending;
pub mod stock;

pub use error_code::ErrorCode;
