//! Parser for the quoted key / value text format used by Steam's `.acf` and
//! `.vdf` files.
//!
//! A document is a sequence of entries. Each entry is a quoted key followed
//! either by a quoted value or by a `{ ... }` block of further entries.
//! Quoted strings have no escape sequences: the next `"` always ends them.


use std::io::Read;
use std::ops::Deref;

use indexmap::IndexMap;
use thiserror::Error;

/// A parsed value: either a terminal string or a nested block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Leaf(String),
    Block(Block),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Leaf(s) => Some(s.as_str()),
            Value::Block(_) => None,
        }
    }

    #[must_use]
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Value::Block(block) => Some(block),
            Value::Leaf(_) => None,
        }
    }
}

/// An ordered, string keyed block of values.
///
/// Entries keep the order in which their keys were first declared. A parsed
/// document is itself a block. Blocks are read-only once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block(IndexMap<String, Value>);

impl Deref for Block {
    type Target = IndexMap<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Block {
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.as_str()
    }

    #[must_use]
    pub fn get_block(&self, key: &str) -> Option<&Block> {
        self.0.get(key)?.as_block()
    }

    /// Follow a `/` separated chain of keys, eg. `AppState/StateFlags`.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut keys = path.split('/');
        let first = self.0.get(keys.next()?)?;
        keys.try_fold(first, |value, key| value.as_block()?.0.get(key))
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    #[error("unterminated quoted string")]
    UnterminatedString,

    #[error("key has no value")]
    MissingValue,

    #[error("{depth} block(s) left open")]
    UnterminatedBlock { depth: usize },

    #[error("closing brace without an open block")]
    UnbalancedClose,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed manifest at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: Reason },

    #[error("failed to read manifest")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A block that is still open, along with the key it will be stored under
/// once its closing brace is reached.
struct Frame {
    key: String,
    entries: IndexMap<String, Value>,
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        self.text.get(self.pos..).unwrap_or_default()
    }

    /// Skip any unicode whitespace, not just ASCII.
    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Step over the whole character under the cursor, keeping `pos` on a
    /// character boundary.
    fn bump(&mut self) {
        self.pos += self.rest().chars().next().map_or(1, char::len_utf8);
    }

    fn malformed(&self, reason: Reason) -> Error {
        Error::Malformed {
            offset: self.pos,
            reason,
        }
    }

    /// Read the string starting at the opening quote under the cursor.
    fn quoted(&mut self) -> Result<&'a str> {
        let start = self.pos + 1;
        let Some((string, _)) = self.text.get(start..).and_then(|rest| rest.split_once('"')) else {
            return Err(self.malformed(Reason::UnterminatedString));
        };

        self.pos = start + string.len() + 1;
        Ok(string)
    }
}

fn innermost<'m>(
    root: &'m mut IndexMap<String, Value>,
    open: &'m mut [Frame],
) -> &'m mut IndexMap<String, Value> {
    match open.last_mut() {
        Some(frame) => &mut frame.entries,
        None => root,
    }
}

/// Parse a document.
///
/// Returns the implicit outermost block. Nothing is returned for input that
/// ends inside a string or block; such input fails as a whole.
///
/// Characters outside of keys, values and blocks are skipped, with one
/// exception: a `}` while no block is open fails the whole document, even
/// when nothing follows it.
///
/// # Errors
/// [`Error::Malformed`] when a string or block is not terminated, a key has
/// no value before the end of input, or a `}` closes nothing
/// ([`Reason::UnbalancedClose`]).
pub fn parse(text: &str) -> Result<Block> {
    let mut cursor = Cursor { text, pos: 0 };
    let mut root = IndexMap::new();
    let mut open = Vec::<Frame>::new();

    loop {
        cursor.skip_whitespace();
        let Some(byte) = cursor.peek() else {
            break;
        };

        match byte {
            b'"' => {
                let key = cursor.quoted()?;
                cursor.skip_whitespace();
                match cursor.peek() {
                    Some(b'"') => {
                        let value = cursor.quoted()?;
                        innermost(&mut root, &mut open)
                            .insert(key.to_owned(), Value::Leaf(value.to_owned()));
                    }
                    Some(b'{') => {
                        cursor.pos += 1;
                        open.push(Frame {
                            key: key.to_owned(),
                            entries: IndexMap::new(),
                        });
                    }
                    // Neither a value nor a block: drop the key and the character after it
                    Some(_) => cursor.bump(),
                    None => return Err(cursor.malformed(Reason::MissingValue)),
                }
            }
            b'}' => {
                let Some(frame) = open.pop() else {
                    return Err(cursor.malformed(Reason::UnbalancedClose));
                };

                innermost(&mut root, &mut open).insert(frame.key, Value::Block(Block(frame.entries)));
                cursor.pos += 1;
            }
            _ => cursor.bump(),
        }
    }

    if !open.is_empty() {
        return Err(cursor.malformed(Reason::UnterminatedBlock { depth: open.len() }));
    }

    Ok(Block(root))
}

/// Parse a buffer.
///
/// # Errors
/// [`Error::Io`] if the buffer cannot be read as UTF-8 text, otherwise as [`parse`].
pub fn from_reader<T: Read>(buf: &mut T) -> Result<Block> {
    let mut string = String::new();
    buf.read_to_string(&mut string)?;
    parse(&string)
}
