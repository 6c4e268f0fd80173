//! The command normalizer: both input grammars in, one canonical command out.
//!
//! Grammar 1 is shell-style: `verb [type] [id] [args...]`, with quoting.
//! Grammar 2 is call-style: `Type.verb(payload)`. Both are parsed
//! independently and emit the same [`Command`], so the dispatcher has a
//! single downstream path and never re-parses rewritten text.

use regex::Regex;
use serde_json::{Map, Value};

use crate::core::error::KardexError;

/// The verbs the shell understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Show,
    Destroy,
    Update,
    All,
    Count,
    Quit,
    Eof,
}

impl Verb {
    fn from_word(word: &str) -> Option<Verb> {
        match word {
            "create" => Some(Verb::Create),
            "show" => Some(Verb::Show),
            "destroy" => Some(Verb::Destroy),
            "update" => Some(Verb::Update),
            "all" => Some(Verb::All),
            "count" => Some(Verb::Count),
            "quit" => Some(Verb::Quit),
            "eof" | "EOF" => Some(Verb::Eof),
            _ => None,
        }
    }
}

/// The canonical command tuple both grammars normalize into.
#[derive(Debug, Clone)]
pub struct Command {
    pub verb: Verb,
    pub class_name: Option<String>,
    pub id: Option<String>,
    /// Positional arguments beyond the id, literal-coerced where unquoted.
    pub args: Vec<Value>,
    /// Bulk attribute map from the call-style `update` dictionary form.
    pub updates: Option<Map<String, Value>>,
}

/// A token plus whether it came from a quoted region. Quoted tokens are
/// never literal-coerced, so `"25"` stays a string while `25` becomes a
/// number.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

/// Parses one input line into a canonical command.
///
/// Anything that matches neither grammar, names an unknown verb, or is
/// structurally broken (unterminated quote, unparsable dictionary literal)
/// comes back as `UnknownSyntax` carrying the original line.
pub fn normalize(line: &str) -> Result<Command, KardexError> {
    let unknown = || KardexError::UnknownSyntax(line.trim().to_string());

    if let Some((class_name, verb_word, payload)) = match_call_style(line) {
        let verb = Verb::from_word(&verb_word).ok_or_else(unknown)?;
        return normalize_call_style(verb, class_name, &payload).map_err(|_| unknown());
    }

    let tokens = tokenize(line).map_err(|_| unknown())?;
    let mut words = tokens.into_iter();
    let verb_word = words.next().ok_or_else(unknown)?;
    let verb = Verb::from_word(&verb_word.text).ok_or_else(unknown)?;

    let class_name = words.next().map(|t| t.text);
    let id = words.next().map(|t| t.text);
    let args = words.map(coerce).collect();
    Ok(Command {
        verb,
        class_name,
        id,
        args,
        updates: None,
    })
}

/// Fixed-shape recognizer for `Type.verb(payload)`.
fn match_call_style(line: &str) -> Option<(String, String, String)> {
    let pattern = Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\((.*)\)\s*$")
        .expect("static regex");
    let caps = pattern.captures(line)?;
    Some((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()))
}

/// Rewrites a recognized call into the canonical command.
///
/// Errors here are shape errors; the caller folds them all into the
/// unknown-syntax diagnostic.
fn normalize_call_style(
    verb: Verb,
    class_name: String,
    payload: &str,
) -> Result<Command, ShapeError> {
    let mut remainder = payload.to_string();
    let mut updates = None;

    if verb == Verb::Update {
        // Bulk form: `id, {attr: value, ...}`. The mapping literal is parsed
        // as a literal expression and carried whole.
        if let Some((start, end)) = bracket_span(&remainder, '{', '}') {
            let literal = &remainder[start..=end];
            let parsed = parse_literal_map(literal).ok_or(ShapeError)?;
            updates = Some(parsed);
            remainder.replace_range(start..=end, " ");
        }
        // An unquoted list literal in the payload is excised before the
        // scalar arguments are tokenized; its content is dropped.
        if let Some((start, end)) = bracket_span(&remainder, '[', ']') {
            remainder.replace_range(start..=end, " ");
        }
    }

    // Payload arguments are comma-separated; after the special shapes are
    // out, unquoted commas are just separators. Commas inside quoted
    // strings are payload text and survive.
    let spaced = separate_unquoted_commas(&remainder);
    let tokens = tokenize(&spaced)?;
    let mut words = tokens.into_iter();

    let id = words.next().map(|t| t.text);
    let args = words.map(coerce).collect();
    Ok(Command {
        verb,
        class_name: Some(class_name),
        id,
        args,
        updates,
    })
}

/// Quote state shared by the tokenizer and the payload pre-passes, so all
/// three agree on what counts as quoted text.
#[derive(PartialEq, Clone, Copy)]
enum Mode {
    Plain,
    Single,
    Double,
}

/// Span of the first unquoted `open` bracket through its matching `close`,
/// by depth. Brackets inside quoted strings are payload text and do not
/// open, close, or nest anything.
fn bracket_span(text: &str, open: char, close: char) -> Option<(usize, usize)> {
    let mut start = None;
    let mut depth = 0usize;
    let mut mode = Mode::Plain;
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        match mode {
            Mode::Plain => {
                if c == '\'' {
                    mode = Mode::Single;
                } else if c == '"' {
                    mode = Mode::Double;
                } else if c == '\\' {
                    chars.next();
                } else if c == open {
                    start.get_or_insert(i);
                    depth += 1;
                } else if c == close && depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        return Some((start?, i));
                    }
                }
            }
            Mode::Single => {
                if c == '\'' {
                    mode = Mode::Plain;
                }
            }
            Mode::Double => {
                if c == '"' {
                    mode = Mode::Plain;
                } else if c == '\\' {
                    chars.next();
                }
            }
        }
    }
    None
}

/// Rewrites unquoted commas into spaces so they become token separators;
/// commas inside quoted strings stay verbatim.
fn separate_unquoted_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut mode = Mode::Plain;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match mode {
            Mode::Plain => match c {
                ',' => {
                    out.push(' ');
                    continue;
                }
                '\'' => mode = Mode::Single,
                '"' => mode = Mode::Double,
                '\\' => {
                    out.push('\\');
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                    continue;
                }
                _ => {}
            },
            Mode::Single => {
                if c == '\'' {
                    mode = Mode::Plain;
                }
            }
            Mode::Double => match c {
                '"' => mode = Mode::Plain,
                '\\' => {
                    out.push('\\');
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                    continue;
                }
                _ => {}
            },
        }
        out.push(c);
    }
    out
}

/// Literal-only evaluation of a mapping expression. Strict JSON first; a
/// single-quoted variant gets one retry with the quotes normalized.
fn parse_literal_map(text: &str) -> Option<Map<String, Value>> {
    let direct = serde_json::from_str::<Value>(text)
        .ok()
        .or_else(|| serde_json::from_str::<Value>(&text.replace('\'', "\"")).ok())?;
    match direct {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Literal-only value coercion: integers, floats, booleans, lists, and
/// mappings parse; anything else (and anything the user quoted) stays a
/// verbatim string.
fn coerce(token: Token) -> Value {
    if token.quoted {
        return Value::String(token.text);
    }
    serde_json::from_str(&token.text).unwrap_or(Value::String(token.text))
}

/// Marker for a structurally broken command; always rendered as the
/// unknown-syntax diagnostic by the caller.
#[derive(Debug)]
struct ShapeError;

/// Shell-style tokenizer: unescaped whitespace separates tokens, quoted
/// substrings (single or double) are single tokens with the quotes dropped,
/// backslash escapes the next character outside single quotes.
fn tokenize(input: &str) -> Result<Vec<Token>, ShapeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut mode = Mode::Plain;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match mode {
            Mode::Plain => match c {
                '\'' => {
                    mode = Mode::Single;
                    in_token = true;
                    quoted = true;
                }
                '"' => {
                    mode = Mode::Double;
                    in_token = true;
                    quoted = true;
                }
                '\\' => {
                    let escaped = chars.next().ok_or(ShapeError)?;
                    current.push(escaped);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(Token {
                            text: std::mem::take(&mut current),
                            quoted,
                        });
                        in_token = false;
                        quoted = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
            Mode::Single => match c {
                '\'' => mode = Mode::Plain,
                c => current.push(c),
            },
            Mode::Double => match c {
                '"' => mode = Mode::Plain,
                '\\' => {
                    let escaped = chars.next().ok_or(ShapeError)?;
                    current.push(escaped);
                }
                c => current.push(c),
            },
        }
    }
    if mode != Mode::Plain {
        return Err(ShapeError); // unterminated quote
    }
    if in_token {
        tokens.push(Token {
            text: current,
            quoted,
        });
    }
    Ok(tokens)
}
