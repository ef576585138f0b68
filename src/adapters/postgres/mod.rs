pub mod loan_repository;
pub mod stock_ledger;

// パブリックに型を再エクスポート
pub use loan_repository::LoanRepository as PostgresLoanRepository;
pub use stock_ledger::StockLedger as PostgresStockLedger;
