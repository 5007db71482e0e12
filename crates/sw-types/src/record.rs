//! Flat, ordered result records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::GridResult;

/// A flat mapping from field name to JSON scalar or list.
///
/// Field order is insertion order. Writing an existing key replaces its value
/// but keeps its position, so overlays only ever append new fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecord(Map<String, Value>);

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Overlay `other` onto this record: on key collision `other` wins.
    pub fn overlay(&mut self, other: ResultRecord) {
        for (field, value) in other.0 {
            self.0.insert(field, value);
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Single-line JSON object terminated by a newline.
    pub fn to_json_line(&self) -> GridResult<String> {
        let mut line = serde_json::to_string(&self.0)?;
        line.push('\n');
        Ok(line)
    }
}

impl FromIterator<(String, Value)> for ResultRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_later_wins_and_keeps_position() {
        let mut base = ResultRecord::new();
        base.insert("model_id", 3);
        base.insert("alpha", 0.1);

        let mut params = ResultRecord::new();
        params.insert("alpha", 0.5);
        params.insert("beta", "x");
        base.overlay(params);

        let fields: Vec<&str> = base.fields().collect();
        assert_eq!(fields, vec!["model_id", "alpha", "beta"]);
        assert_eq!(base.get("alpha"), Some(&json!(0.5)));
    }

    #[test]
    fn json_line_is_single_line() {
        let mut record = ResultRecord::new();
        record.insert("training_accuracy", 0.75);
        record.insert("cross_validation_accuracy_all", json!([0.5, 1.0]));

        let line = record.to_json_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(
            line.trim_end(),
            r#"{"training_accuracy":0.75,"cross_validation_accuracy_all":[0.5,1.0]}"#
        );
    }
}
