//! Hyperparameter values, combinations and grid definitions.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Position of a grid point in enumeration order. Names the model and result
/// files, so it must be stable for a given grid definition.
pub type ModelId = usize;

/// A concrete hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Json(serde_json::Value),
}

impl ParameterValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Json(v) => v.as_f64(),
        }
    }

    /// Integer view; floats are accepted only when they carry no fraction.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Self::Float(_) => None,
            Self::Json(v) => v.as_i64(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Json(v) => v.as_str(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Value::from(*v),
            Self::Json(v) => v.clone(),
        }
    }
}

impl From<serde_json::Value> for ParameterValue {
    fn from(value: serde_json::Value) -> Self {
        if let Some(v) = value.as_i64() {
            return Self::Int(v);
        }
        if value.is_f64() {
            if let Some(v) = value.as_f64() {
                return Self::Float(v);
            }
        }
        Self::Json(value)
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Json(serde_json::Value::String(s)) => f.write_str(s),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// One point in the grid: parameter name to value, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, ParameterValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: ParameterValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = ParameterSet;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("an object of parameter values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut set = ParameterSet::new();
                while let Some((name, value)) = access.next_entry::<String, ParameterValue>()? {
                    set.insert(name, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(SetVisitor)
    }
}

/// A single grid axis: the candidate values for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    pub name: String,
    pub values: Vec<ParameterValue>,
}

/// Grid definition: ordered axes, each with an ordered list of candidates.
///
/// Deserializes from a JSON object of arrays and keeps the declaration order
/// of the keys; enumeration treats the first axis as the outermost loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    pub axes: Vec<GridAxis>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_axis(mut self, name: impl Into<String>, values: Vec<ParameterValue>) -> Self {
        self.axes.push(GridAxis {
            name: name.into(),
            values,
        });
        self
    }

    /// Number of grid points, `None` on overflow.
    pub fn size(&self) -> Option<usize> {
        self.axes
            .iter()
            .try_fold(1usize, |total, axis| total.checked_mul(axis.values.len()))
    }
}

impl Serialize for ParamGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.axes.len()))?;
        for axis in &self.axes {
            map.serialize_entry(&axis.name, &axis.values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GridVisitor;

        impl<'de> Visitor<'de> for GridVisitor {
            type Value = ParamGrid;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("an object mapping parameter names to arrays of values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut grid = ParamGrid::new();
                while let Some(name) = access.next_key::<String>()? {
                    if grid.axes.iter().any(|axis| axis.name == name) {
                        return Err(de::Error::custom(format!("duplicate parameter {name}")));
                    }
                    let values: Vec<ParameterValue> = access.next_value()?;
                    grid.axes.push(GridAxis { name, values });
                }
                Ok(grid)
            }
        }

        deserializer.deserialize_map(GridVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn untagged_values_prefer_integers() {
        let values: Vec<ParameterValue> = serde_json::from_value(json!([3, 0.5, "uniform", true])).unwrap();
        assert_eq!(values[0], ParameterValue::Int(3));
        assert_eq!(values[1], ParameterValue::Float(0.5));
        assert_eq!(values[2], ParameterValue::Json(json!("uniform")));
        assert_eq!(values[3], ParameterValue::Json(json!(true)));
    }

    #[test]
    fn grid_keeps_declaration_order() {
        let grid: ParamGrid = serde_json::from_value(json!({
            "n": [1, 2],
            "m": ["a", "b", "c"]
        }))
        .unwrap();

        let names: Vec<&str> = grid.axes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["n", "m"]);
        assert_eq!(grid.size(), Some(6));
    }

    #[test]
    fn empty_axis_makes_an_empty_grid() {
        let grid = ParamGrid::new()
            .add_axis("a", vec![ParameterValue::Int(1)])
            .add_axis("b", vec![]);
        assert_eq!(grid.size(), Some(0));
    }

    #[test]
    fn parameter_set_display_and_serialization() {
        let set = ParameterSet::new()
            .with("n_neighbors", ParameterValue::Int(5))
            .with("weights", ParameterValue::Json(json!("distance")));

        assert_eq!(set.to_string(), "n_neighbors=5, weights=distance");
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"{"n_neighbors":5,"weights":"distance"}"#
        );
    }

    #[test]
    fn parameter_set_insert_replaces_in_place() {
        let mut set = ParameterSet::new()
            .with("a", ParameterValue::Int(1))
            .with("b", ParameterValue::Int(2));
        set.insert("a", ParameterValue::Int(9));

        let names: Vec<&str> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(set.get("a"), Some(&ParameterValue::Int(9)));
    }

    #[test]
    fn integral_float_reads_as_integer() {
        assert_eq!(ParameterValue::Float(4.0).as_i64(), Some(4));
        assert_eq!(ParameterValue::Float(4.5).as_i64(), None);
    }
}
