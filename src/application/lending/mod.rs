mod errors;
mod lending_service;
mod saga_stream;

pub use errors::{LendingError, Result};
pub use lending_service::{
    Compensation, STOCK_EMPTY_MESSAGE, SagaOutcome, ServiceDependencies, create_lending,
    finish_lending, get_lending, renew_lending,
};
pub use saga_stream::{SagaFrame, SnapshotEmitter, create_lending_stream};
