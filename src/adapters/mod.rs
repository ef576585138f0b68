pub mod book_service;
pub mod mock;
pub mod postgres;
