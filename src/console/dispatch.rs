//! The command dispatcher: validates a canonical command against store state
//! and executes it.
//!
//! Validation is ordered and short-circuits at the first failing check, so a
//! broken command produces exactly one diagnostic and no partial effects.

use serde_json::Value;

use crate::console::normalize::{Command, Verb};
use crate::core::error::KardexError;
use crate::core::model::{Entity, ModelKind};
use crate::core::store::FileStore;

/// The interpreter's two flow states. Every verb except `quit`/`eof` leaves
/// it `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Running,
    Stopped,
}

/// What a dispatched command wants printed, plus where the loop goes next.
#[derive(Debug)]
pub struct Reply {
    pub lines: Vec<String>,
    pub flow: Flow,
}

impl Reply {
    fn running(lines: Vec<String>) -> Reply {
        Reply {
            lines,
            flow: Flow::Running,
        }
    }
}

/// Executes one canonical command against the store.
///
/// Recoverable errors (validation, lookup) come back as `Err` with the
/// exact diagnostic as their `Display` text; fatal save/reload errors
/// propagate the same way and are told apart by
/// [`KardexError::is_fatal`].
pub fn dispatch(store: &mut FileStore, cmd: Command) -> Result<Reply, KardexError> {
    match cmd.verb {
        Verb::Create => create(store, &cmd),
        Verb::Show => show(store, &cmd),
        Verb::Destroy => destroy(store, &cmd),
        Verb::Update => update(store, cmd),
        Verb::All => all(store, &cmd),
        Verb::Count => count(store, &cmd),
        Verb::Quit => Ok(Reply {
            lines: Vec::new(),
            flow: Flow::Stopped,
        }),
        // `eof` leaves the terminal tidy with one trailing newline.
        Verb::Eof => Ok(Reply {
            lines: vec![String::new()],
            flow: Flow::Stopped,
        }),
    }
}

fn require_kind(cmd: &Command) -> Result<ModelKind, KardexError> {
    let name = cmd
        .class_name
        .as_deref()
        .ok_or(KardexError::ClassNameMissing)?;
    ModelKind::from_name(name).ok_or(KardexError::ClassDoesntExist)
}

fn require_id(cmd: &Command) -> Result<&str, KardexError> {
    cmd.id.as_deref().ok_or(KardexError::InstanceIdMissing)
}

fn create(store: &mut FileStore, cmd: &Command) -> Result<Reply, KardexError> {
    let kind = require_kind(cmd)?;
    let entity = Entity::fresh(kind);
    let id = entity.id().to_string();
    let key = entity.key();
    store.new(entity);
    // Persisting counts as a mutation, so the clock moves here too.
    if let Some(entity) = store.get_mut(&key) {
        entity.touch();
    }
    store.save()?;
    Ok(Reply::running(vec![id]))
}

fn show(store: &mut FileStore, cmd: &Command) -> Result<Reply, KardexError> {
    let kind = require_kind(cmd)?;
    let id = require_id(cmd)?;
    let entity = store
        .get(&composite_key(kind, id))
        .ok_or(KardexError::NoInstanceFound)?;
    Ok(Reply::running(vec![entity.display()]))
}

fn destroy(store: &mut FileStore, cmd: &Command) -> Result<Reply, KardexError> {
    let kind = require_kind(cmd)?;
    let id = require_id(cmd)?;
    let key = composite_key(kind, id);
    if store.all_mut().remove(&key).is_none() {
        return Err(KardexError::NoInstanceFound);
    }
    store.save()?;
    Ok(Reply::running(Vec::new()))
}

fn update(store: &mut FileStore, cmd: Command) -> Result<Reply, KardexError> {
    let kind = require_kind(&cmd)?;
    let id = require_id(&cmd)?.to_string();

    // The bulk map form carries its writes directly; the scalar form needs
    // an attribute name and a value, validated in that order. Positional
    // arguments beyond the recognized shape are ignored.
    let writes: Vec<(String, Value)> = match cmd.updates {
        Some(map) => map.into_iter().collect(),
        None => {
            let attr = cmd
                .args
                .first()
                .map(arg_text)
                .ok_or(KardexError::AttributeNameMissing)?;
            let value = cmd.args.get(1).cloned().ok_or(KardexError::ValueMissing)?;
            vec![(attr, value)]
        }
    };

    let key = composite_key(kind, &id);
    let entity = store.get_mut(&key).ok_or(KardexError::NoInstanceFound)?;
    for (attr, value) in writes {
        entity.set(&attr, value)?;
    }
    entity.touch();
    store.save()?;
    Ok(Reply::running(Vec::new()))
}

fn all(store: &mut FileStore, cmd: &Command) -> Result<Reply, KardexError> {
    // The type filter is optional, but a type that is present must exist.
    let filter = match cmd.class_name.as_deref() {
        Some(name) => Some(ModelKind::from_name(name).ok_or(KardexError::ClassDoesntExist)?),
        None => None,
    };
    let lines = store
        .all()
        .values()
        .filter(|e| filter.map_or(true, |kind| e.kind() == kind))
        .map(Entity::display)
        .collect();
    Ok(Reply::running(lines))
}

fn count(store: &mut FileStore, cmd: &Command) -> Result<Reply, KardexError> {
    let kind = require_kind(cmd)?;
    Ok(Reply::running(vec![store.count(kind).to_string()]))
}

fn composite_key(kind: ModelKind, id: &str) -> String {
    format!("{kind}.{id}")
}

/// Attribute names arrive as coerced values; quoted or bare words are
/// strings already, anything else keeps its literal rendering.
fn arg_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
