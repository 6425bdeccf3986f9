//! Records of values for logging.
//!
//! A [`Record`] is handed to the training loop, which writes it to whatever
//! recorder it uses. The actor fills records with statistics of its parameters,
//! see [`Actor::param_stats`](crate::Actor::param_stats).
use crate::error::ActorError;
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics like loss.
    Scalar(f32),
}

/// A container for storing key-value pairs.
///
/// ```rust
/// use ddpg_candle_actor::record::{Record, RecordValue};
///
/// let mut record = Record::empty();
/// record.insert("loss", RecordValue::Scalar(0.5));
/// assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
/// ```
#[derive(Debug, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<'_, String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, ActorError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            None => Err(ActorError::RecordKey(k.to_string())),
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_scalar() {
        let mut record = Record::empty();
        assert!(record.is_empty());
        record.insert("loss", RecordValue::Scalar(0.5));
        record.insert("loss", RecordValue::Scalar(0.25));

        assert_eq!(record.len(), 1);
        assert_eq!(record.get_scalar("loss").unwrap(), 0.25);
        assert_eq!(record.get("loss"), Some(&RecordValue::Scalar(0.25)));
        assert!(matches!(
            record.get_scalar("reward"),
            Err(ActorError::RecordKey(_))
        ));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["loss"]);
        assert_eq!(record.iter().count(), 1);
    }
}
