use std::collections::BTreeMap;

use super::error::LoadTestError;

/// Locally predicted key/value state, updated optimistically at submission time.
///
/// Only ever compared against the service, never sent to it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShadowState {
    values: BTreeMap<String, i64>,
}

impl ShadowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), value);
    }

    /// Adds `delta` to an existing key and returns the new value.
    ///
    /// The key keeps its old value if the sum leaves the `i64` range.
    pub fn adjust(&mut self, key: &str, delta: i64) -> Result<i64, LoadTestError> {
        let value =
            self.values.get_mut(key).ok_or_else(|| LoadTestError::UnknownKey(key.to_string()))?;
        let next = value.checked_add(delta).ok_or_else(|| LoadTestError::Overflow {
            key: key.to_string(),
            value: *value,
            delta,
        })?;
        *value = next;
        Ok(next)
    }

    pub fn get(&self, key: &str) -> Result<i64, LoadTestError> {
        self.values.get(key).copied().ok_or_else(|| LoadTestError::UnknownKey(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

impl Extend<(String, i64)> for ShadowState {
    fn extend<T: IntoIterator<Item = (String, i64)>>(&mut self, iter: T) {
        self.values.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let mut shadow = ShadowState::new();
        shadow.set("1", 10);
        shadow.set("1", 20);
        assert_eq!(shadow.get("1").unwrap(), 20);
        assert_eq!(shadow.len(), 1);
    }

    #[test]
    fn test_adjust_existing_key() {
        let mut shadow = ShadowState::new();
        shadow.set("3", 42);
        assert_eq!(shadow.adjust("3", 2).unwrap(), 44);
        assert_eq!(shadow.adjust("3", -1).unwrap(), 43);
        assert_eq!(shadow.get("3").unwrap(), 43);
    }

    #[test]
    fn test_unknown_key() {
        let mut shadow = ShadowState::new();
        assert!(matches!(shadow.adjust("missing", 1), Err(LoadTestError::UnknownKey(k)) if k == "missing"));
        assert!(matches!(shadow.get("missing"), Err(LoadTestError::UnknownKey(_))));
        assert!(shadow.is_empty());
    }

    #[test]
    fn test_adjust_out_of_range() {
        let mut shadow = ShadowState::new();
        shadow.set("big", i64::MAX - 1);

        let err = shadow.adjust("big", 2).unwrap_err();

        assert!(
            matches!(
                err,
                LoadTestError::Overflow { ref key, value, delta: 2 }
                    if key == "big" && value == i64::MAX - 1
            ),
            "{err}"
        );
        assert_eq!(shadow.get("big").unwrap(), i64::MAX - 1);
        assert_eq!(shadow.adjust("big", 1).unwrap(), i64::MAX);
    }

    #[test]
    fn test_extend_from_snapshot() {
        let mut shadow = ShadowState::new();
        shadow.set("1", 1);
        shadow.extend([("1".to_string(), 5), ("2".to_string(), 6)]);
        assert_eq!(shadow.iter().collect::<Vec<_>>(), vec![("1", 5), ("2", 6)]);
    }
}
