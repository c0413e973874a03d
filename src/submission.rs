// Record decoder: turns one line of the bluuit export into a validated
// `Submission`. Decoding happens in two steps so that callers can tell a
// line that is not JSON at all apart from a JSON record with bad fields;
// both keep the raw line around so a single record can be replayed by hand.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// One submission from the export, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub title: String,
    pub permalink: String,
    /// Link target of the submission. Self posts export an empty string,
    /// which is normalized to `None`.
    pub url: Option<String>,
    pub author: String,
    /// Creation time in unix seconds.
    pub created_utc: i64,
    pub id: String,
    pub over_18: bool,
    pub subreddit_name_prefixed: String,
}

/// Why a line could not be read as a JSON document.
#[derive(Debug, Error)]
pub enum DecodeCause {
    #[error("blank line")]
    Blank,

    #[error("line is not valid UTF-8: {0}")]
    Encoding(#[source] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
}

/// A line that could not be parsed as JSON.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct DecodeError {
    /// The raw line, lossily converted if it was not UTF-8.
    pub line: String,
    pub cause: DecodeCause,
}

/// A single problem with one field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: Problem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Missing,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
}

/// Field name used for issues about the record as a whole.
pub const RECORD_ROOT: &str = "$";

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            Problem::Missing => write!(f, "{}: missing", self.field),
            Problem::WrongType { expected, found } => {
                write!(f, "{}: expected {expected}, found {found}", self.field)
            }
        }
    }
}

/// A JSON document that does not have the shape of a submission.
#[derive(Debug, Error)]
#[error("invalid submission: {}", join_issues(.issues))]
pub struct ValidationError {
    pub line: String,
    pub document: Value,
    /// Every offending field, in declaration order of `Submission`.
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Names of the offending fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.issues.iter().map(|issue| issue.field).collect()
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Decode raw bytes of one line, rejecting invalid UTF-8 before parsing.
pub fn decode_bytes(raw: &[u8]) -> Result<Submission, RecordError> {
    match std::str::from_utf8(raw) {
        Ok(line) => decode(line),
        Err(cause) => Err(DecodeError {
            line: String::from_utf8_lossy(raw).into_owned(),
            cause: DecodeCause::Encoding(cause),
        }
        .into()),
    }
}

/// Decode and validate one line of the export.
pub fn decode(raw: &str) -> Result<Submission, RecordError> {
    if raw.trim().is_empty() {
        return Err(DecodeError {
            line: raw.to_string(),
            cause: DecodeCause::Blank,
        }
        .into());
    }

    let document: Value = serde_json::from_str(raw).map_err(|cause| DecodeError {
        line: raw.to_string(),
        cause: DecodeCause::Syntax(cause),
    })?;

    match validate(&document) {
        Ok(submission) => Ok(submission),
        Err(issues) => Err(ValidationError {
            line: raw.to_string(),
            document,
            issues,
        }
        .into()),
    }
}

fn validate(document: &Value) -> Result<Submission, Vec<FieldIssue>> {
    let Some(fields) = document.as_object() else {
        return Err(vec![FieldIssue {
            field: RECORD_ROOT,
            problem: Problem::WrongType {
                expected: "object",
                found: json_type(document),
            },
        }]);
    };

    let mut issues = Vec::new();
    let title = required(fields, "title", "string", as_string, &mut issues);
    let permalink = required(fields, "permalink", "string", as_string, &mut issues);
    let url = optional_url(fields, &mut issues);
    let author = required(fields, "author", "string", as_string, &mut issues);
    let created_utc = required(fields, "created_utc", "integer", as_timestamp, &mut issues);
    let id = required(fields, "id", "string", as_string, &mut issues);
    let over_18 = required(fields, "over_18", "boolean", Value::as_bool, &mut issues);
    let subreddit_name_prefixed = required(
        fields,
        "subreddit_name_prefixed",
        "string",
        as_string,
        &mut issues,
    );

    match (
        title,
        permalink,
        author,
        created_utc,
        id,
        over_18,
        subreddit_name_prefixed,
    ) {
        (
            Some(title),
            Some(permalink),
            Some(author),
            Some(created_utc),
            Some(id),
            Some(over_18),
            Some(subreddit_name_prefixed),
        ) if issues.is_empty() => Ok(Submission {
            title,
            permalink,
            url,
            author,
            created_utc,
            id,
            over_18,
            subreddit_name_prefixed,
        }),
        _ => Err(issues),
    }
}

fn required<T>(
    fields: &Map<String, Value>,
    name: &'static str,
    expected: &'static str,
    extract: impl Fn(&Value) -> Option<T>,
    issues: &mut Vec<FieldIssue>,
) -> Option<T> {
    let Some(value) = fields.get(name) else {
        issues.push(FieldIssue {
            field: name,
            problem: Problem::Missing,
        });
        return None;
    };
    let extracted = extract(value);
    if extracted.is_none() {
        issues.push(FieldIssue {
            field: name,
            problem: Problem::WrongType {
                expected,
                found: json_type(value),
            },
        });
    }
    extracted
}

// Lemmy rejects `url: ""`, so absent, null and empty all mean "no link".
fn optional_url(fields: &Map<String, Value>, issues: &mut Vec<FieldIssue>) -> Option<String> {
    match fields.get("url") {
        None | Some(Value::Null) => None,
        Some(Value::String(url)) if url.is_empty() => None,
        Some(Value::String(url)) => Some(url.clone()),
        Some(other) => {
            issues.push(FieldIssue {
                field: "url",
                problem: Problem::WrongType {
                    expected: "string",
                    found: json_type(other),
                },
            });
            None
        }
    }
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

#[allow(clippy::cast_possible_truncation)]
fn as_timestamp(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|secs| secs.fract() == 0.0 && *secs >= i64::MIN as f64 && *secs < i64::MAX as f64)
            .map(|secs| secs as i64)
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
