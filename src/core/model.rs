//! The entity model: typed records with identity, timestamps, and an
//! attribute bag.
//!
//! Every mutation routes through [`Entity::set`], which refreshes
//! `updated_at` as a side effect. There is deliberately no other write path,
//! so "time of most recent observable change" is always trustworthy.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::error::KardexError;
use crate::core::schemas::{self, FieldDefault, CLASS_TAG};
use crate::core::time;

/// The closed set of record types the shell knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelKind {
    BaseModel,
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

impl ModelKind {
    pub const ALL: &'static [ModelKind] = &[
        ModelKind::BaseModel,
        ModelKind::User,
        ModelKind::State,
        ModelKind::City,
        ModelKind::Amenity,
        ModelKind::Place,
        ModelKind::Review,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::BaseModel => "BaseModel",
            ModelKind::User => "User",
            ModelKind::State => "State",
            ModelKind::City => "City",
            ModelKind::Amenity => "Amenity",
            ModelKind::Place => "Place",
            ModelKind::Review => "Review",
        }
    }

    /// Exact-name lookup; anything else is not a model.
    pub fn from_name(name: &str) -> Option<ModelKind> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// Fixed field list with typed defaults for this model.
    pub fn fields(self) -> &'static [(&'static str, FieldDefault)] {
        match self {
            ModelKind::BaseModel => schemas::BASE_MODEL_FIELDS,
            ModelKind::User => schemas::USER_FIELDS,
            ModelKind::State => schemas::STATE_FIELDS,
            ModelKind::City => schemas::CITY_FIELDS,
            ModelKind::Amenity => schemas::AMENITY_FIELDS,
            ModelKind::Place => schemas::PLACE_FIELDS,
            ModelKind::Review => schemas::REVIEW_FIELDS,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed record. Identity and timestamps are typed fields; everything else
/// lives in the attribute bag, which keeps insertion order.
#[derive(Debug, Clone)]
pub struct Entity {
    kind: ModelKind,
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    attributes: Map<String, Value>,
}

impl Entity {
    /// Builds a brand-new record: fresh uuid, `created_at == updated_at`,
    /// schema fields materialized with their typed defaults.
    ///
    /// Registration with the store is the caller's job.
    pub fn fresh(kind: ModelKind) -> Entity {
        let now = time::now();
        let mut attributes = Map::new();
        for (name, default) in kind.fields() {
            attributes.insert((*name).to_string(), default.value());
        }
        Entity {
            kind,
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            attributes,
        }
    }

    /// Rebuilds a record from a previously serialized attribute map.
    ///
    /// Every field is copied verbatim except `created_at`/`updated_at`, which
    /// are parsed from ISO-8601 text (malformed text fails the whole
    /// reconstruction), and the reserved class tag, which is consumed. Schema
    /// fields absent from the map keep their defaults; unrecognized keys are
    /// kept so a later save is lossless. Does not register with the store.
    pub fn reconstruct(kind: ModelKind, record: &Map<String, Value>) -> Result<Entity, KardexError> {
        let mut entity = Entity::fresh(kind);
        for (name, value) in record {
            if name == CLASS_TAG {
                continue;
            }
            match name.as_str() {
                "id" => entity.id = value_as_text(value),
                "created_at" => {
                    entity.created_at = time::from_iso("created_at", &value_as_text(value))?
                }
                "updated_at" => {
                    entity.updated_at = time::from_iso("updated_at", &value_as_text(value))?
                }
                _ => {
                    entity.attributes.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(entity)
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Composite key identifying this record's slot in the store.
    pub fn key(&self) -> String {
        format!("{}.{}", self.kind, self.id)
    }

    /// The single mutation path. Every write except a direct write to
    /// `updated_at` refreshes the clock. Writes to the housekeeping fields
    /// hit the typed fields; timestamps must be valid ISO-8601 text.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), KardexError> {
        match name {
            "updated_at" => {
                self.updated_at = time::from_iso("updated_at", &value_as_text(&value))?;
            }
            "created_at" => {
                self.created_at = time::from_iso("created_at", &value_as_text(&value))?;
                self.touch();
            }
            "id" => {
                self.id = value_as_text(&value);
                self.touch();
            }
            _ => {
                self.attributes.insert(name.to_string(), value);
                self.touch();
            }
        }
        Ok(())
    }

    /// Refreshes `updated_at`, never regressing it even if the wall clock
    /// stepped backwards.
    pub fn touch(&mut self) {
        self.updated_at = self.updated_at.max(time::now());
    }

    /// Flat map of all current attributes: bag fields, then `id`, the
    /// timestamps as ISO-8601 strings, and the reserved class tag.
    pub fn serialize(&self) -> Map<String, Value> {
        let mut record = self.attributes.clone();
        record.insert("id".to_string(), Value::String(self.id.clone()));
        record.insert(
            "created_at".to_string(),
            Value::String(time::to_iso(self.created_at)),
        );
        record.insert(
            "updated_at".to_string(),
            Value::String(time::to_iso(self.updated_at)),
        );
        record.insert(
            CLASS_TAG.to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        record
    }

    /// `"[Type] (id) {attributes}"`, attributes being the live bag plus the
    /// housekeeping fields (but not the class tag, which only exists in
    /// serialized form).
    pub fn display(&self) -> String {
        let mut shown = self.attributes.clone();
        shown.insert("id".to_string(), Value::String(self.id.clone()));
        shown.insert(
            "created_at".to_string(),
            Value::String(time::to_iso(self.created_at)),
        );
        shown.insert(
            "updated_at".to_string(),
            Value::String(time::to_iso(self.updated_at)),
        );
        format!("[{}] ({}) {}", self.kind, self.id, Value::Object(shown))
    }
}

/// String form of a value headed for a string-typed field: quoted strings
/// lose their quotes, everything else keeps its literal rendering.
fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
