//! Document filters
//!
//! A small query language in the MongoDB style: `{}` matches everything,
//! `{"field": value}` is equality on a dotted path, and the operators
//! `$eq`, `$exists`, `$in` and `$and` are understood. Anything else is
//! rejected rather than silently ignored.

use serde_json::{Map, Value};

use super::{Document, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Value at `path` equals `value`, or is an array containing it
    Eq { path: String, value: Value },
    /// Presence (or absence) of `path`
    Exists { path: String, exists: bool },
    /// Value at `path` equals any of `values`
    In { path: String, values: Vec<Value> },
    /// Every clause matches
    And(Vec<Filter>),
}

impl Filter {
    pub fn all() -> Self {
        Filter::All
    }

    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Filter::Exists {
            path: path.into(),
            exists: true,
        }
    }

    pub fn and(clauses: Vec<Filter>) -> Self {
        Filter::And(clauses)
    }

    /// Match the document with the given identifier
    pub fn by_id(id: &str) -> Self {
        Filter::eq(super::ID_FIELD, id)
    }

    /// Parse a MongoDB-style JSON filter object
    pub fn from_json(value: &Value) -> Result<Self, StoreError> {
        let object = value
            .as_object()
            .ok_or_else(|| StoreError::InvalidFilter("filter must be a JSON object".to_string()))?;

        let mut clauses = Vec::with_capacity(object.len());
        for (key, condition) in object {
            if key == "$and" {
                let items = condition.as_array().ok_or_else(|| {
                    StoreError::InvalidFilter("$and expects an array of filters".to_string())
                })?;
                let nested = items
                    .iter()
                    .map(Filter::from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                clauses.push(Filter::And(nested));
            } else if key.starts_with('$') {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported top-level operator {}",
                    key
                )));
            } else {
                clauses.push(parse_condition(key, condition)?);
            }
        }

        Ok(collapse(clauses))
    }

    /// Evaluate the filter against a document
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { path, value } => value_matches(lookup(document, path), value),
            Filter::Exists { path, exists } => lookup(document, path).is_some() == *exists,
            Filter::In { path, values } => {
                let stored = lookup(document, path);
                values.iter().any(|value| value_matches(stored, value))
            }
            Filter::And(clauses) => clauses.iter().all(|clause| clause.matches(document)),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

/// Split a dotted field path into its segments
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

/// Resolve a dotted path inside a document.
///
/// Integer segments index into arrays, negative ones from the end, the same
/// way PostgreSQL's `#>` walks a path.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(array_index(segment, items.len())?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn array_index(segment: &str, len: usize) -> Option<usize> {
    let index: i64 = segment.parse().ok()?;
    if index < 0 {
        len.checked_sub(usize::try_from(index.unsigned_abs()).ok()?)
    } else {
        usize::try_from(index).ok()
    }
}

fn value_matches(stored: Option<&Value>, expected: &Value) -> bool {
    match stored {
        // equality with null also matches a missing field
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(stored) => stored == expected,
    }
}

fn parse_condition(path: &str, condition: &Value) -> Result<Filter, StoreError> {
    let operators = match condition {
        Value::Object(map) if is_operator_object(map)? => map,
        _ => return Ok(Filter::eq(path, condition.clone())),
    };

    let mut clauses = Vec::with_capacity(operators.len());
    for (operator, argument) in operators {
        let clause = match operator.as_str() {
            "$eq" => Filter::eq(path, argument.clone()),
            "$exists" => {
                let exists = argument.as_bool().ok_or_else(|| {
                    StoreError::InvalidFilter(format!("$exists on {} expects a boolean", path))
                })?;
                Filter::Exists {
                    path: path.to_string(),
                    exists,
                }
            }
            "$in" => {
                let values = argument.as_array().ok_or_else(|| {
                    StoreError::InvalidFilter(format!("$in on {} expects an array", path))
                })?;
                Filter::In {
                    path: path.to_string(),
                    values: values.clone(),
                }
            }
            other => {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported operator {} on {}",
                    other, path
                )))
            }
        };
        clauses.push(clause);
    }

    Ok(collapse(clauses))
}

fn is_operator_object(map: &Map<String, Value>) -> Result<bool, StoreError> {
    let operators = map.keys().filter(|key| key.starts_with('$')).count();
    if operators == 0 {
        return Ok(false);
    }
    if operators != map.len() {
        return Err(StoreError::InvalidFilter(
            "cannot mix operators and plain fields in one condition".to_string(),
        ));
    }
    Ok(true)
}

fn collapse(mut clauses: Vec<Filter>) -> Filter {
    match clauses.len() {
        0 => Filter::All,
        1 => clauses.remove(0),
        _ => Filter::And(clauses),
    }
}
