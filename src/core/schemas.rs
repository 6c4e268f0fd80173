//! Static schema data: the closed model set and per-model field lists.
//!
//! Nothing in here is logic. Models own their field lists and typed defaults;
//! the rest of the crate treats this module as data.

use serde_json::{json, Value};

/// Name of the persisted JSON document, resolved against the process working
/// directory. Injected into the store at startup; not a user-facing knob.
pub const STORAGE_FILE_NAME: &str = "file_storage.json";

/// Reserved key carrying the model name inside a serialized record.
pub const CLASS_TAG: &str = "__class__";

/// Default value for a schema field. Strings default to empty, numerics to
/// zero, lists to empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Str,
    Int,
    Float,
    List,
}

impl FieldDefault {
    pub fn value(self) -> Value {
        match self {
            FieldDefault::Str => json!(""),
            FieldDefault::Int => json!(0),
            FieldDefault::Float => json!(0.0),
            FieldDefault::List => json!([]),
        }
    }
}

pub const BASE_MODEL_FIELDS: &[(&str, FieldDefault)] = &[];

pub const USER_FIELDS: &[(&str, FieldDefault)] = &[
    ("email", FieldDefault::Str),
    ("password", FieldDefault::Str),
    ("first_name", FieldDefault::Str),
    ("last_name", FieldDefault::Str),
];

pub const STATE_FIELDS: &[(&str, FieldDefault)] = &[("name", FieldDefault::Str)];

pub const CITY_FIELDS: &[(&str, FieldDefault)] = &[
    ("state_id", FieldDefault::Str),
    ("name", FieldDefault::Str),
];

pub const AMENITY_FIELDS: &[(&str, FieldDefault)] = &[("name", FieldDefault::Str)];

pub const PLACE_FIELDS: &[(&str, FieldDefault)] = &[
    ("city_id", FieldDefault::Str),
    ("user_id", FieldDefault::Str),
    ("name", FieldDefault::Str),
    ("description", FieldDefault::Str),
    ("number_rooms", FieldDefault::Int),
    ("number_bathrooms", FieldDefault::Int),
    ("max_guest", FieldDefault::Int),
    ("price_by_night", FieldDefault::Int),
    ("latitude", FieldDefault::Float),
    ("longitude", FieldDefault::Float),
    ("amenity_ids", FieldDefault::List),
];

pub const REVIEW_FIELDS: &[(&str, FieldDefault)] = &[
    ("place_id", FieldDefault::Str),
    ("user_id", FieldDefault::Str),
    ("text", FieldDefault::Str),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_typed() {
        assert_eq!(FieldDefault::Str.value(), json!(""));
        assert_eq!(FieldDefault::Int.value(), json!(0));
        assert_eq!(FieldDefault::Float.value(), json!(0.0));
        assert_eq!(FieldDefault::List.value(), json!([]));
    }

    #[test]
    fn place_carries_every_field_type() {
        let kinds: Vec<FieldDefault> = PLACE_FIELDS.iter().map(|(_, d)| *d).collect();
        assert!(kinds.contains(&FieldDefault::Str));
        assert!(kinds.contains(&FieldDefault::Int));
        assert!(kinds.contains(&FieldDefault::Float));
        assert!(kinds.contains(&FieldDefault::List));
    }
}
