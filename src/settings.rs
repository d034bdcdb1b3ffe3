//! Engine settings, loaded from the `settings` block of a model file.
use serde::Deserialize;

use crate::error::FixtureError;
use crate::hints::AfterGenerate;
use crate::random::DEFAULT_NULL_PROBABILITY;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Fixed seed; entropy is used when absent.
    pub seed: Option<u64>,
    /// Weight of the coin flip for nullable nodes.
    pub null_probability: f64,
    /// Treat every object field as nullable.
    pub nullable_fields: bool,
    pub nullable_elements: bool,
    pub collection_min_size: usize,
    pub collection_max_size: usize,
    pub string_min_length: usize,
    pub string_max_length: usize,
    pub int_min: i64,
    pub int_max: i64,
    pub float_min: f64,
    pub float_max: f64,
    /// Temporal values are generated within this many days of today.
    pub temporal_range_days: i64,
    /// Resolve cyclic nodes to the nearest materialized ancestor.
    pub set_back_references: bool,
    pub after_generate: AfterGenerate,
    pub overwrite_existing_values: bool,
    /// Prefix generated strings with the field name (`name_XYZ`).
    pub string_field_prefix: bool,
    /// When false, usage errors on a node degrade to null with a warning.
    pub fail_on_error: bool,
    pub max_depth: usize,
    /// Attempts to find a fresh element for unique collections.
    pub max_unique_retries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            null_probability: DEFAULT_NULL_PROBABILITY,
            nullable_fields: false,
            nullable_elements: false,
            collection_min_size: 2,
            collection_max_size: 6,
            string_min_length: 3,
            string_max_length: 10,
            int_min: 1,
            int_max: 10_000,
            float_min: 1.0,
            float_max: 10_000.0,
            temporal_range_days: 3650,
            set_back_references: false,
            after_generate: AfterGenerate::default(),
            overwrite_existing_values: true,
            string_field_prefix: false,
            fail_on_error: true,
            max_depth: 8,
            max_unique_retries: 100,
        }
    }
}

impl Settings {
    /// Reject bounds that cannot produce a value.
    pub fn validate(&self) -> Result<(), FixtureError> {
        let mut problems = Vec::new();
        if !(0.0..=1.0).contains(&self.null_probability) {
            problems.push(format!("null_probability must be within [0, 1], got {}", self.null_probability));
        }
        if self.collection_min_size > self.collection_max_size {
            problems.push("collection_min_size exceeds collection_max_size".to_string());
        }
        if self.string_min_length > self.string_max_length {
            problems.push("string_min_length exceeds string_max_length".to_string());
        }
        if self.int_min > self.int_max {
            problems.push("int_min exceeds int_max".to_string());
        }
        if self.float_min > self.float_max {
            problems.push("float_min exceeds float_max".to_string());
        }
        if self.temporal_range_days < 0 {
            problems.push("temporal_range_days must not be negative".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(FixtureError::config(format!("invalid settings: {}", problems.join("; "))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let s: Settings = serde_json::from_str(r#"{"seed": 5, "set_back_references": true}"#).unwrap();
        assert_eq!(s.seed, Some(5));
        assert!(s.set_back_references);
        assert_eq!(s.collection_max_size, 6);
        assert_eq!(s.after_generate, AfterGenerate::PopulateNullsAndDefaultPrimitives);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<Settings>(r#"{"sed": 5}"#).is_err());
    }

    #[test]
    fn inverted_bounds_are_reported_together() {
        let s = Settings { int_min: 5, int_max: 1, null_probability: 2.0, ..Settings::default() };
        let msg = s.validate().unwrap_err().to_string();
        assert!(msg.contains("int_min exceeds int_max"));
        assert!(msg.contains("null_probability"));
        assert!(Settings::default().validate().is_ok());
    }
}
