use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object field access: `field`
    Field(String),
    /// Bounded slice over an array: `[a..b]`, clamped to available length
    Slice(usize, usize),
    /// Projection over array elements: `*`; the remaining path is applied
    /// to each element, preserving order
    Star,
}

/// Parsed path expression applied to a task's output data.
///
/// Examples: `items`, `items[0..5]`, `items[0..5].*.name`, `repo.owner.login`.
/// The empty expression selects the whole output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathExpr {
    segments: Vec<Segment>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathParseError {
    #[error("empty path segment")]
    EmptySegment,

    #[error("invalid slice '{0}', expected [start..end]")]
    InvalidSlice(String),

    #[error("unexpected character '{0}' in path")]
    UnexpectedChar(char),
}

/// Errors from applying a path to a concrete value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("field '{field}' not present")]
    NotFound { field: String },

    #[error("expected {expected} at '{segment}'")]
    WrongType {
        segment: String,
        expected: &'static str,
    },
}

impl PathExpr {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Apply the expression to a value, producing the extracted value.
    ///
    /// Slices are clamped: requesting `[0..5]` of a 3-element array yields
    /// those 3 elements, not an error. Field access on a non-object, or a
    /// slice/projection on a non-array, is a type error.
    pub fn apply(&self, value: &Value) -> Result<Value, PathError> {
        apply_segments(&self.segments, value)
    }
}

fn apply_segments(segments: &[Segment], value: &Value) -> Result<Value, PathError> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(value.clone());
    };

    match first {
        Segment::Field(name) => match value {
            Value::Object(map) => match map.get(name) {
                Some(inner) => apply_segments(rest, inner),
                None => Err(PathError::NotFound {
                    field: name.clone(),
                }),
            },
            _ => Err(PathError::WrongType {
                segment: name.clone(),
                expected: "object",
            }),
        },
        Segment::Slice(start, end) => match value {
            Value::Array(items) => {
                let lo = (*start).min(items.len());
                let hi = (*end).min(items.len()).max(lo);
                let sliced = Value::Array(items[lo..hi].to_vec());
                apply_segments(rest, &sliced)
            }
            _ => Err(PathError::WrongType {
                segment: format!("[{start}..{end}]"),
                expected: "array",
            }),
        },
        Segment::Star => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| apply_segments(rest, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err(PathError::WrongType {
                segment: "*".to_string(),
                expected: "array",
            }),
        },
    }
}

impl FromStr for PathExpr {
    type Err = PathParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::default());
        }

        let mut segments = Vec::new();
        let mut chars = input.chars().peekable();

        loop {
            match chars.peek() {
                Some('*') => {
                    chars.next();
                    segments.push(Segment::Star);
                }
                Some(_) => {
                    let mut ident = String::new();
                    while let Some(&c) = chars.peek() {
                        if c == '.' || c == '[' {
                            break;
                        }
                        if c == ']' || c == '*' {
                            return Err(PathParseError::UnexpectedChar(c));
                        }
                        ident.push(c);
                        chars.next();
                    }
                    if ident.is_empty() {
                        return Err(PathParseError::EmptySegment);
                    }
                    segments.push(Segment::Field(ident));

                    if chars.peek() == Some(&'[') {
                        chars.next();
                        let mut inner = String::new();
                        let mut closed = false;
                        for c in chars.by_ref() {
                            if c == ']' {
                                closed = true;
                                break;
                            }
                            inner.push(c);
                        }
                        if !closed {
                            return Err(PathParseError::InvalidSlice(inner));
                        }
                        let (start, end) = inner
                            .split_once("..")
                            .ok_or_else(|| PathParseError::InvalidSlice(inner.clone()))?;
                        let start: usize = start
                            .trim()
                            .parse()
                            .map_err(|_| PathParseError::InvalidSlice(inner.clone()))?;
                        let end: usize = end
                            .trim()
                            .parse()
                            .map_err(|_| PathParseError::InvalidSlice(inner.clone()))?;
                        segments.push(Segment::Slice(start, end));
                    }
                }
                None => break,
            }

            match chars.next() {
                Some('.') => {
                    if chars.peek().is_none() {
                        return Err(PathParseError::EmptySegment);
                    }
                }
                Some(c) => return Err(PathParseError::UnexpectedChar(c)),
                None => break,
            }
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            match segment {
                Segment::Field(name) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{name}")?;
                }
                Segment::Slice(a, b) => write!(f, "[{a}..{b}]")?,
                Segment::Star => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "*")?;
                }
            }
            first = false;
        }
        Ok(())
    }
}

impl Serialize for PathExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PathExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_field_chain() {
        let path: PathExpr = "repo.owner.login".parse().unwrap();
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.to_string(), "repo.owner.login");
    }

    #[test]
    fn parses_slice_and_projection() {
        let path: PathExpr = "items[0..5].*.name".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Field("items".into()),
                Segment::Slice(0, 5),
                Segment::Star,
                Segment::Field("name".into()),
            ]
        );
        assert_eq!(path.to_string(), "items[0..5].*.name");
    }

    #[test]
    fn empty_path_selects_whole_value() {
        let path: PathExpr = "".parse().unwrap();
        assert!(path.is_empty());
        let value = json!({"a": 1});
        assert_eq!(path.apply(&value).unwrap(), value);
    }

    #[test]
    fn rejects_malformed_slices() {
        assert!("items[0..]".parse::<PathExpr>().is_err());
        assert!("items[..5]".parse::<PathExpr>().is_err());
        assert!("items[0..5".parse::<PathExpr>().is_err());
        assert!("items 0]".parse::<PathExpr>().is_err());
    }

    #[test]
    fn rejects_trailing_dot_and_empty_segments() {
        assert!("items.".parse::<PathExpr>().is_err());
        assert!(".items".parse::<PathExpr>().is_err());
        assert!("a..b".parse::<PathExpr>().is_err());
    }

    #[test]
    fn field_access_extracts_value() {
        let path: PathExpr = "count".parse().unwrap();
        assert_eq!(path.apply(&json!({"count": 7})).unwrap(), json!(7));
    }

    #[test]
    fn slice_clamps_to_available_length() {
        let path: PathExpr = "items[0..5]".parse().unwrap();
        let value = json!({"items": ["a", "b", "c"]});
        assert_eq!(path.apply(&value).unwrap(), json!(["a", "b", "c"]));
    }

    #[test]
    fn slice_out_of_range_start_yields_empty() {
        let path: PathExpr = "items[10..20]".parse().unwrap();
        let value = json!({"items": [1, 2, 3]});
        assert_eq!(path.apply(&value).unwrap(), json!([]));
    }

    #[test]
    fn projection_preserves_order() {
        let path: PathExpr = "items.*.name".parse().unwrap();
        let value = json!({"items": [{"name": "x"}, {"name": "y"}]});
        assert_eq!(path.apply(&value).unwrap(), json!(["x", "y"]));
    }

    #[test]
    fn sliced_projection_combines() {
        let path: PathExpr = "items[0..2].*.name".parse().unwrap();
        let value = json!({"items": [{"name": "x"}, {"name": "y"}, {"name": "z"}]});
        assert_eq!(path.apply(&value).unwrap(), json!(["x", "y"]));
    }

    #[test]
    fn missing_field_is_not_found() {
        let path: PathExpr = "absent".parse().unwrap();
        assert_eq!(
            path.apply(&json!({"present": 1})),
            Err(PathError::NotFound {
                field: "absent".into()
            })
        );
    }

    #[test]
    fn slicing_a_scalar_is_a_type_error() {
        let path: PathExpr = "items[0..3]".parse().unwrap();
        let err = path.apply(&json!({"items": "not-an-array"})).unwrap_err();
        assert!(matches!(err, PathError::WrongType { expected: "array", .. }));
    }

    #[test]
    fn projecting_a_non_array_is_a_type_error() {
        let path: PathExpr = "items.*.name".parse().unwrap();
        let err = path.apply(&json!({"items": {"name": "x"}})).unwrap_err();
        assert!(matches!(err, PathError::WrongType { expected: "array", .. }));
    }

    #[test]
    fn serde_round_trips_as_string() {
        let path: PathExpr = serde_json::from_value(json!("items[1..4].*.id")).unwrap();
        assert_eq!(serde_json::to_value(&path).unwrap(), json!("items[1..4].*.id"));
    }
}
