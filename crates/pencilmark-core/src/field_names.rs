//! Field naming at the solving engine boundary.
//!
//! The model serializes with snake_case keys; the solving engine expects
//! camelCase. Rather than case-converting arbitrary strings at runtime, every
//! known key is listed in [`FIELD_TABLE`], and the table is checked for
//! duplicates at compile time. Keys missing from the table pass through
//! unchanged, which keeps variant-specific extras intact.

use serde_json::{Map, Value};

use crate::Constraints;

/// One row of the field mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldName {
    /// Key used by the model.
    pub internal: &'static str,
    /// Key used by the solving engine.
    pub engine: &'static str,
}

impl FieldName {
    const fn new(internal: &'static str, engine: &'static str) -> Self {
        Self { internal, engine }
    }
}

/// Every key the model can produce, paired with its engine spelling.
pub const FIELD_TABLE: &[FieldName] = &[
    FieldName::new("size", "size"),
    FieldName::new("givens", "givens"),
    FieldName::new("cell", "cell"),
    FieldName::new("value", "value"),
    FieldName::new("row", "row"),
    FieldName::new("col", "col"),
    FieldName::new("rows", "rows"),
    FieldName::new("columns", "columns"),
    FieldName::new("boxes", "boxes"),
    FieldName::new("diagonals", "diagonals"),
    FieldName::new("extra_regions", "extraRegions"),
    FieldName::new("killer_cages", "killerCages"),
    FieldName::new("cells", "cells"),
    FieldName::new("sum", "sum"),
    FieldName::new("thermometers", "thermometers"),
];

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

const fn is_bijective(table: &[FieldName]) -> bool {
    let mut i = 0;
    while i < table.len() {
        let mut j = i + 1;
        while j < table.len() {
            if str_eq(table[i].internal, table[j].internal)
                || str_eq(table[i].engine, table[j].engine)
            {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    is_bijective(FIELD_TABLE),
    "FIELD_TABLE must not repeat a key on either side"
);

/// Direction of a key translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Direction {
    /// Model naming to engine naming.
    ToEngine,
    /// Engine naming to model naming.
    FromEngine,
}

impl Direction {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::ToEngine => Self::FromEngine,
            Self::FromEngine => Self::ToEngine,
        }
    }
}

/// Errors that can occur while translating a payload.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TranslationError {
    /// The payload root was not an object.
    #[display("payload root is not an object")]
    NotAnObject,
    /// Two keys of one object translate to the same key.
    #[display("key `{key}` collides with another key after translation")]
    KeyCollision {
        /// The translated key.
        key: String,
    },
    /// An unmapped key is spelled like a mapped key of the other side, so the
    /// translation could not be reversed.
    #[display("unmapped key `{key}` is reserved by the field table")]
    AmbiguousKey {
        /// The offending key.
        key: String,
    },
    /// Converting between the model and a JSON payload failed.
    #[display("payload conversion failed: {message}")]
    Conversion {
        /// Underlying serializer message.
        message: String,
    },
}

/// Looks up the translation of a single key.
///
/// Returns `None` for keys that are not in [`FIELD_TABLE`].
#[must_use]
pub fn lookup(key: &str, direction: Direction) -> Option<&'static str> {
    FIELD_TABLE.iter().find_map(|field| match direction {
        Direction::ToEngine => (field.internal == key).then_some(field.engine),
        Direction::FromEngine => (field.engine == key).then_some(field.internal),
    })
}

fn translate_key(key: &str, direction: Direction) -> Result<String, TranslationError> {
    if let Some(mapped) = lookup(key, direction) {
        return Ok(mapped.to_owned());
    }
    // An unmapped key spelled like a target-side key would come back as
    // something else on the reverse trip.
    if lookup(key, direction.reverse()).is_some() {
        return Err(TranslationError::AmbiguousKey {
            key: key.to_owned(),
        });
    }
    Ok(key.to_owned())
}

/// Renames every object key in `value`, recursing into nested objects and arrays.
///
/// # Errors
///
/// Returns [`TranslationError::KeyCollision`] if two keys of one object map to
/// the same key, and [`TranslationError::AmbiguousKey`] if an unmapped key
/// cannot be told apart from a mapped one on the other side.
pub fn translate_keys(value: &Value, direction: Direction) -> Result<Value, TranslationError> {
    match value {
        Value::Object(map) => {
            let mut translated = Map::with_capacity(map.len());
            for (key, inner) in map {
                let key = translate_key(key, direction)?;
                if translated.contains_key(&key) {
                    return Err(TranslationError::KeyCollision { key });
                }
                let inner = translate_keys(inner, direction)?;
                translated.insert(key, inner);
            }
            Ok(Value::Object(translated))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| translate_keys(item, direction))
            .collect::<Result<_, _>>()
            .map(Value::Array),
        scalar => Ok(scalar.clone()),
    }
}

/// Serializes constraints into the engine's schema.
///
/// # Errors
///
/// Returns a [`TranslationError`] if serialization fails or a key cannot be
/// translated losslessly.
pub fn constraints_to_engine(constraints: &Constraints) -> Result<Value, TranslationError> {
    let value = serde_json::to_value(constraints).map_err(|err| TranslationError::Conversion {
        message: err.to_string(),
    })?;
    if !value.is_object() {
        return Err(TranslationError::NotAnObject);
    }
    translate_keys(&value, Direction::ToEngine)
}

/// Reads constraints back from the engine's schema.
///
/// # Errors
///
/// Returns a [`TranslationError`] if the payload is not an object, a key
/// cannot be translated, or the result does not describe valid constraints.
pub fn constraints_from_engine(value: &Value) -> Result<Constraints, TranslationError> {
    if !value.is_object() {
        return Err(TranslationError::NotAnObject);
    }
    let value = translate_keys(value, Direction::FromEngine)?;
    serde_json::from_value(value).map_err(|err| TranslationError::Conversion {
        message: err.to_string(),
    })
}
