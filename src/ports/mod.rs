pub mod book_service;
pub mod loan_repository;
pub mod stock_ledger;

pub use book_service::{BookService, BookServiceError};
pub use loan_repository::LoanRepository;
pub use stock_ledger::StockLedger;
