pub mod loan_repository;
pub mod stock_ledger;

pub use loan_repository::LoanRepository;
pub use stock_ledger::StockLedger;
