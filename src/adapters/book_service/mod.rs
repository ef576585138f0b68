pub mod http;
pub mod local;

pub use http::HttpBookService;
pub use local::LocalBookService;
