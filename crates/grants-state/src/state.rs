//! Form session state
//!
//! Answers are kept as JSON values in insertion order. Field names posted by
//! a page may use dot notation (`actionsObj.CMOR1.value`) to build nested
//! objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known state keys
pub mod keys {
    /// Single Business Identifier
    pub const SBI: &str = "sbi";
    /// Firm Reference Number
    pub const FRN: &str = "frn";
    /// Customer Reference Number
    pub const CRN: &str = "crn";
    /// Defra identity id
    pub const DEFRA_ID: &str = "defraId";
    /// Grant scheme code
    pub const SCHEME: &str = "scheme";
    /// Scheme year
    pub const YEAR: &str = "year";
    /// Land details confirmation
    pub const HAS_CHECKED_LAND_IS_UP_TO_DATE: &str = "hasCheckedLandIsUpToDate";
    /// Selected parcel, `"sheetId-parcelId"`
    pub const LAND_PARCEL: &str = "landParcel";
    /// Selected actions, code to `{value, unit}`
    pub const ACTIONS_OBJ: &str = "actionsObj";
}

/// Errors raised while writing answers into state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// State root was not a JSON object
    #[error("form state must be a JSON object, got {0}")]
    NotAnObject(String),

    /// Answer path was empty or had an empty segment
    #[error("invalid answer path: '{0}'")]
    InvalidPath(String),

    /// A path segment already holds a non-object value
    #[error("answer path '{path}' conflicts with existing value at '{segment}'")]
    PathConflict {
        /// Full path being written
        path: String,
        /// Segment holding the scalar
        segment: String,
    },
}

/// Accumulated answers for one journey
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState(Map<String, Value>);

impl FormState {
    /// Create empty state
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build state from a JSON object
    pub fn from_value(value: Value) -> Result<Self, StateError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StateError::NotAnObject(type_name(&other).to_string())),
        }
    }

    /// Raw value for a key, including explicit nulls
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value for a key, treating `null` as absent
    #[inline]
    #[must_use]
    pub fn get_present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// String value for a key
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Insert a top-level value
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Insert only when the key has no present value
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if self.get_present(&key).is_none() {
            self.0.insert(key, value);
        }
    }

    /// Remove a top-level value
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Write an answer at a dotted path, creating intermediate objects
    pub fn set_answer(&mut self, path: &str, value: Value) -> Result<(), StateError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(StateError::InvalidPath(path.to_string()));
        }

        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| StateError::InvalidPath(path.to_string()))?;

        let mut current = &mut self.0;
        for segment in parents {
            let slot = current
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => {
                    return Err(StateError::PathConflict {
                        path: path.to_string(),
                        segment: (*segment).to_string(),
                    })
                }
            };
        }

        current.insert((*last).to_string(), value);
        Ok(())
    }

    /// Write a batch of answers
    pub fn merge_answers<I, K>(&mut self, answers: I) -> Result<(), StateError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (path, value) in answers {
            self.set_answer(path.as_ref(), value)?;
        }
        Ok(())
    }

    /// Drop every answer
    #[inline]
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of top-level keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no answers are held
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate top-level answers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON object value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
