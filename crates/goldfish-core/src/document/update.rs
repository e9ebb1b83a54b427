//! Single-document updates
//!
//! An [`Update`] is an ordered list of field operations. Backends apply the
//! whole list to one document atomically; [`Update::apply`] is the shared
//! reference semantics they all use.

use serde_json::Value;

use super::{Document, StoreError, ID_FIELD};

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Replace a top-level field
    Set { field: String, value: Value },
    /// Remove every element equal to `value` from an array field
    Pull { field: String, value: Value },
    /// Insert `value` into an array field at `position`, appending when
    /// `position` is `None` or past the end
    Push {
        field: String,
        value: Value,
        position: Option<usize>,
    },
}

impl UpdateOp {
    pub fn field(&self) -> &str {
        match self {
            UpdateOp::Set { field, .. } | UpdateOp::Pull { field, .. } | UpdateOp::Push { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::Set {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn pull(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::Pull {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn push(mut self, field: impl Into<String>, value: impl Into<Value>, position: Option<usize>) -> Self {
        self.ops.push(UpdateOp::Push {
            field: field.into(),
            value: value.into(),
            position,
        });
        self
    }

    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Check the operations without touching a document
    pub fn validate(&self) -> Result<(), StoreError> {
        for op in &self.ops {
            let field = op.field();
            if field.is_empty() {
                return Err(StoreError::InvalidUpdate("empty field name".to_string()));
            }
            if field == ID_FIELD {
                return Err(StoreError::InvalidUpdate(format!("{} cannot be modified", ID_FIELD)));
            }
        }
        Ok(())
    }

    /// Apply every operation to the document.
    ///
    /// Either all operations succeed and the document is replaced, or an
    /// error is returned and the document is left as it was. Returns whether
    /// the content changed.
    pub fn apply(&self, document: &mut Document) -> Result<bool, StoreError> {
        self.validate()?;

        let mut working = document.clone();
        for op in &self.ops {
            match op {
                UpdateOp::Set { field, value } => {
                    working.insert(field.clone(), value.clone());
                }
                UpdateOp::Pull { field, value } => {
                    if let Some(existing) = working.get_mut(field) {
                        let items = as_array_mut(existing, field)?;
                        items.retain(|item| item != value);
                    }
                }
                UpdateOp::Push { field, value, position } => {
                    let existing = working
                        .entry(field.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    let items = as_array_mut(existing, field)?;
                    let index = position.map_or(items.len(), |p| p.min(items.len()));
                    items.insert(index, value.clone());
                }
            }
        }

        let changed = working != *document;
        *document = working;
        Ok(changed)
    }
}

fn as_array_mut<'a>(value: &'a mut Value, field: &str) -> Result<&'a mut Vec<Value>, StoreError> {
    value
        .as_array_mut()
        .ok_or_else(|| StoreError::InvalidUpdate(format!("field {} is not an array", field)))
}
