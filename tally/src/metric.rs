//! Sample model consumed from the host
//!
//! The host owns collection and scheduling; this module only describes the
//! shape of what it hands over. A sample is aggregatable when it carries
//! exactly one field, named `value`, of numeric kind. Everything else is
//! expected, irrelevant traffic and is discarded without comment at ingest.

use std::time::SystemTime;

use rustc_hash::FxHashMap;

/// The tag set of a series: unique string keys to string values.
pub type Tags = FxHashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
/// The value of a single sample field.
pub enum FieldValue {
    /// A floating point, 64 bits wide
    Float(f64),
    /// A signed integer, 64 bits wide
    Signed(i64),
    /// A signless integer, 64 bits wide
    Unsigned(u64),
    /// A boolean flag
    Bool(bool),
    /// Free-form text
    Text(String),
}

impl FieldValue {
    /// Get an f64 representation of this value, `None` for non-numeric
    /// kinds. Extremely large integers will be truncated.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn numeric(&self) -> Option<f64> {
        match self {
            FieldValue::Float(value) => Some(*value),
            FieldValue::Signed(value) => Some(*value as f64),
            FieldValue::Unsigned(value) => Some(*value as f64),
            FieldValue::Bool(_) | FieldValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
/// One observation handed over by the host.
pub struct Sample {
    /// The name of the metric recorded by this sample.
    pub name: String,
    /// The labels associated with this metric.
    pub tags: Tags,
    /// The field set carried by this sample.
    pub fields: Vec<(String, FieldValue)>,
    /// The time at which the host observed this reading.
    pub timestamp: SystemTime,
}

impl Sample {
    /// The counter reading, when this sample has the aggregatable shape:
    /// exactly one field, named `value`, of numeric kind.
    #[must_use]
    pub fn counter_value(&self) -> Option<f64> {
        match self.fields.as_slice() {
            [(name, value)] if name == "value" => value.numeric(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_with_fields(fields: Vec<(String, FieldValue)>) -> Sample {
        Sample {
            name: "requests".to_string(),
            tags: Tags::default(),
            fields,
            timestamp: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn numeric_kinds_convert() {
        assert_eq!(FieldValue::Float(1.5).numeric(), Some(1.5));
        assert_eq!(FieldValue::Signed(-3).numeric(), Some(-3.0));
        assert_eq!(FieldValue::Unsigned(7).numeric(), Some(7.0));
        assert_eq!(FieldValue::Bool(true).numeric(), None);
        assert_eq!(FieldValue::Text("up".to_string()).numeric(), None);
    }

    #[test]
    fn counter_value_requires_single_value_field() {
        let sample =
            sample_with_fields(vec![("value".to_string(), FieldValue::Unsigned(42))]);
        assert_eq!(sample.counter_value(), Some(42.0));

        let wrong_name =
            sample_with_fields(vec![("count".to_string(), FieldValue::Unsigned(42))]);
        assert_eq!(wrong_name.counter_value(), None);

        let two_fields = sample_with_fields(vec![
            ("value".to_string(), FieldValue::Unsigned(42)),
            ("other".to_string(), FieldValue::Unsigned(1)),
        ]);
        assert_eq!(two_fields.counter_value(), None);

        let no_fields = sample_with_fields(vec![]);
        assert_eq!(no_fields.counter_value(), None);

        let non_numeric =
            sample_with_fields(vec![("value".to_string(), FieldValue::Text("42".to_string()))]);
        assert_eq!(non_numeric.counter_value(), None);
    }
}
