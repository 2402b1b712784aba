//! Structural diffs carried by `update` operations
//!
//! An update edits a property in place instead of replacing it: one element
//! inserted into or removed from an array, or one run of text inserted into or
//! removed from a string. Text positions count chars, not bytes.

use crate::operations::OperationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Diff applied by an `update` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PropertyDiff {
    Array(ArrayDiff),
    Text(TextDiff),
}

/// Single-element edit of an ordered collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ArrayDiff {
    Insert { pos: usize, value: Value },
    Delete { pos: usize, value: Value },
}

/// Edit of a text property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum TextDiff {
    Insert { pos: usize, text: String },
    Delete { pos: usize, text: String },
}

impl PropertyDiff {
    pub fn is_array(&self) -> bool {
        matches!(self, PropertyDiff::Array(_))
    }

    /// Apply the diff to `target` in place
    pub fn apply(&self, target: &mut Value) -> Result<(), OperationError> {
        match self {
            PropertyDiff::Array(diff) => match target {
                Value::Array(items) => diff.apply(items),
                other => Err(OperationError::type_mismatch("array", other)),
            },
            PropertyDiff::Text(diff) => match target {
                Value::String(text) => diff.apply(text),
                other => Err(OperationError::type_mismatch("text", other)),
            },
        }
    }

    pub fn invert(&self) -> PropertyDiff {
        match self {
            PropertyDiff::Array(diff) => PropertyDiff::Array(diff.invert()),
            PropertyDiff::Text(diff) => PropertyDiff::Text(diff.invert()),
        }
    }
}

impl ArrayDiff {
    pub fn insert(pos: usize, value: impl Into<Value>) -> Self {
        ArrayDiff::Insert {
            pos,
            value: value.into(),
        }
    }

    pub fn delete(pos: usize, value: impl Into<Value>) -> Self {
        ArrayDiff::Delete {
            pos,
            value: value.into(),
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, ArrayDiff::Delete { .. })
    }

    pub fn pos(&self) -> usize {
        match self {
            ArrayDiff::Insert { pos, .. } | ArrayDiff::Delete { pos, .. } => *pos,
        }
    }

    /// The inserted or removed element
    pub fn value(&self) -> &Value {
        match self {
            ArrayDiff::Insert { value, .. } | ArrayDiff::Delete { value, .. } => value,
        }
    }

    pub fn apply(&self, items: &mut Vec<Value>) -> Result<(), OperationError> {
        match self {
            ArrayDiff::Insert { pos, value } => {
                if *pos > items.len() {
                    return Err(OperationError::out_of_bounds(*pos, items.len()));
                }
                items.insert(*pos, value.clone());
            }
            ArrayDiff::Delete { pos, value } => {
                let actual = items
                    .get(*pos)
                    .ok_or_else(|| OperationError::out_of_bounds(*pos, items.len()))?;
                if actual != value {
                    return Err(OperationError::value_mismatch(
                        *pos,
                        value.clone(),
                        actual.clone(),
                    ));
                }
                items.remove(*pos);
            }
        }
        Ok(())
    }

    pub fn invert(&self) -> ArrayDiff {
        match self {
            ArrayDiff::Insert { pos, value } => ArrayDiff::Delete {
                pos: *pos,
                value: value.clone(),
            },
            ArrayDiff::Delete { pos, value } => ArrayDiff::Insert {
                pos: *pos,
                value: value.clone(),
            },
        }
    }
}

impl TextDiff {
    pub fn insert(pos: usize, text: impl Into<String>) -> Self {
        TextDiff::Insert {
            pos,
            text: text.into(),
        }
    }

    pub fn delete(pos: usize, text: impl Into<String>) -> Self {
        TextDiff::Delete {
            pos,
            text: text.into(),
        }
    }

    pub fn apply(&self, target: &mut String) -> Result<(), OperationError> {
        let len = target.chars().count();
        match self {
            TextDiff::Insert { pos, text } => {
                if *pos > len {
                    return Err(OperationError::out_of_bounds(*pos, len));
                }
                let at = byte_offset(target, *pos);
                target.insert_str(at, text);
            }
            TextDiff::Delete { pos, text } => {
                let end_pos = pos
                    .checked_add(text.chars().count())
                    .filter(|end| *end <= len)
                    .ok_or_else(|| OperationError::out_of_bounds(*pos, len))?;
                let start = byte_offset(target, *pos);
                let end = byte_offset(target, end_pos);
                if target[start..end] != *text {
                    return Err(OperationError::value_mismatch(
                        *pos,
                        Value::String(text.clone()),
                        Value::String(target[start..end].to_string()),
                    ));
                }
                target.replace_range(start..end, "");
            }
        }
        Ok(())
    }

    pub fn invert(&self) -> TextDiff {
        match self {
            TextDiff::Insert { pos, text } => TextDiff::Delete {
                pos: *pos,
                text: text.clone(),
            },
            TextDiff::Delete { pos, text } => TextDiff::Insert {
                pos: *pos,
                text: text.clone(),
            },
        }
    }
}

/// Byte offset of the char at `char_pos` (or the end of the string)
fn byte_offset(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
