//! Dotted/indexed paths into JSON payloads.
//!
//! A path such as `result.rows.0.ttk` (or `result.rows[0].ttk`) is parsed once
//! into segments and then walked against a `serde_json::Value`.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::PathError;

/// One step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object member access.
    Key(String),
    /// Array element access. On an object, the decimal text is used as a key.
    Index(usize),
}

/// A parsed path into a JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walk the payload and return the value the path points at.
    pub fn resolve<'a>(&self, payload: &'a Value) -> Result<&'a Value, PathError> {
        let mut current = payload;
        for segment in &self.segments {
            current = match (current, segment) {
                (Value::Object(map), Segment::Key(key)) => {
                    map.get(key).ok_or_else(|| PathError::MissingKey {
                        key: key.clone(),
                        path: self.raw.clone(),
                    })?
                }
                (Value::Object(map), Segment::Index(index)) => {
                    let key = index.to_string();
                    map.get(&key).ok_or(PathError::MissingKey {
                        key,
                        path: self.raw.clone(),
                    })?
                }
                (Value::Array(items), Segment::Index(index)) => {
                    items.get(*index).ok_or_else(|| PathError::IndexOutOfRange {
                        index: *index,
                        path: self.raw.clone(),
                    })?
                }
                (Value::Array(_), Segment::Key(token)) => {
                    return Err(PathError::NonIntegerIndex {
                        token: token.clone(),
                        path: self.raw.clone(),
                    })
                }
                (_, segment) => {
                    return Err(PathError::ScalarDescent {
                        token: segment.to_string(),
                        path: self.raw.clone(),
                    })
                }
            };
        }
        Ok(current)
    }

    /// Resolve the path and coerce the result to `f64`. Numbers, numeric
    /// strings, and booleans convert; anything else is an error.
    pub fn resolve_f64(&self, payload: &Value) -> Result<f64, PathError> {
        let not_numeric = || PathError::NotNumeric {
            path: self.raw.clone(),
        };
        as_number(self.resolve(payload)?).ok_or_else(not_numeric)
    }
}

/// Numeric reading of a scalar: numbers as-is, trimmed numeric strings, and
/// booleans as 1/0.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || PathError::Malformed(raw.to_string());
        let mut segments = Vec::new();

        for token in raw.split('.').map(str::trim).filter(|t| !t.is_empty()) {
            // `rows[0][1]` -> key "rows", index 0, index 1
            let (head, mut rest) = match token.find('[') {
                Some(open) => token.split_at(open),
                None => (token, ""),
            };
            if !head.is_empty() {
                segments.push(Segment::from_token(head));
            }
            while !rest.is_empty() {
                let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
                let close = inner.find(']').ok_or_else(malformed)?;
                let index = inner[..close].trim();
                if index.is_empty() {
                    return Err(malformed());
                }
                segments.push(Segment::from_token(index));
                rest = &inner[close + 1..];
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }
}

impl Segment {
    fn from_token(token: &str) -> Self {
        if token.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = token.parse::<usize>() {
                return Segment::Index(index);
            }
        }
        Segment::Key(token.to_string())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{key}"),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
