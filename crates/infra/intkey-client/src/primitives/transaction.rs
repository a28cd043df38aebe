//! Contains the transaction types exchanged with integer-key endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier assigned to a transaction by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Mutation applied to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Overwrite the key with the operand.
    #[serde(rename = "set")]
    Set,
    /// Add the operand to the key.
    #[serde(rename = "inc")]
    Increment,
    /// Subtract the operand from the key.
    #[serde(rename = "dec")]
    Decrement,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => f.write_str("set"),
            Self::Increment => f.write_str("inc"),
            Self::Decrement => f.write_str("dec"),
        }
    }
}

/// A mutation to submit to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Target key.
    pub key: String,
    /// Mutation kind.
    #[serde(rename = "op")]
    pub operation: Operation,
    /// New value for `set`, delta for `inc` and `dec`.
    pub value: i64,
    /// Transaction that must commit before this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<TransactionId>,
}

impl TransactionRequest {
    /// Builds a `set` request.
    pub fn set(key: impl Into<String>, value: i64) -> Self {
        Self { key: key.into(), operation: Operation::Set, value, dependency: None }
    }

    /// Builds an `inc` request.
    pub fn increment(key: impl Into<String>, delta: i64) -> Self {
        Self { key: key.into(), operation: Operation::Increment, value: delta, dependency: None }
    }

    /// Builds a `dec` request.
    pub fn decrement(key: impl Into<String>, delta: i64) -> Self {
        Self { key: key.into(), operation: Operation::Decrement, value: delta, dependency: None }
    }

    /// Declares a dependency on another transaction.
    #[must_use]
    pub fn depends_on(mut self, dependency: TransactionId) -> Self {
        self.dependency = Some(dependency);
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::set(TransactionRequest::set("1", 42), Operation::Set, 42)]
    #[case::increment(TransactionRequest::increment("1", 2), Operation::Increment, 2)]
    #[case::decrement(TransactionRequest::decrement("1", 1), Operation::Decrement, 1)]
    fn test_constructors(
        #[case] request: TransactionRequest,
        #[case] operation: Operation,
        #[case] value: i64,
    ) {
        assert_eq!(request.operation, operation);
        assert_eq!(request.value, value);
        assert_eq!(request.dependency, None);
    }

    #[test]
    fn test_request_wire_format() {
        let request = TransactionRequest::increment("7", 2).depends_on("abc".into());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "key": "7", "op": "inc", "value": 2, "dependency": "abc" })
        );

        let json = serde_json::to_value(TransactionRequest::set("7", 9)).unwrap();
        assert!(json.get("dependency").is_none());
    }
}
