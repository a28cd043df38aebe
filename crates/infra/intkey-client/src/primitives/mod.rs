//! Primitive types shared by the endpoint clients.

mod error;
pub use error::ClientError;

mod status;
pub use status::TransactionStatus;

mod transaction;
pub use transaction::{Operation, TransactionId, TransactionRequest};
