//! kardex: an interactive shell for typed records with whole-file JSON
//! persistence.
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! raw input line → [`console::normalize`] → canonical
//! [`Command`](console::normalize::Command) → [`console::dispatch`] →
//! [`FileStore`](core::store::FileStore) / [`Entity`](core::model::Entity)
//! operations → printed lines or a single diagnostic.
//!
//! Two input grammars are accepted — shell-style (`update User <id>
//! first_name Betty`) and call-style (`User.update(<id>, first_name,
//! Betty)`) — and both normalize into the same command before anything is
//! validated or executed.
//!
//! # State
//!
//! One [`FileStore`](core::store::FileStore) exists per process, keyed by
//! `"<Type>.<id>"` and persisted as a single JSON document. Everything is
//! single-threaded and synchronous; the only blocking point is reading the
//! next input line. A wrapper that adds concurrent access must add its own
//! mutual exclusion around the store's read-modify-write sequences, since
//! "check existence then mutate" is not atomic here.

pub mod cli;
pub mod console;
pub mod core;
