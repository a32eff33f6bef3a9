//! Input field readers and email syntax checks.
//!
//! Payloads arrive as loosely typed JSON. Each [`CharField`] pulls one value
//! out of the request object and records a message in a [`ValidationError`]
//! when it is missing or malformed, so every failing field is reported in a
//! single response.

use super::errors::ValidationError;
use serde_json::{Map, Value};

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const NOT_UNIQUE: &str = "This field must be unique.";

/// Longest accepted email address
pub const EMAIL_MAX_LENGTH: usize = 254;
/// Longest accepted first/last name
pub const NAME_MAX_LENGTH: usize = 150;
/// Longest accepted password
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Borrow the payload as a JSON object, or explain what was sent instead.
pub fn as_object(data: &Value) -> Result<&Map<String, Value>, ValidationError> {
    data.as_object().ok_or_else(|| {
        ValidationError::field(
            ValidationError::NON_FIELD_ERRORS,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                type_name(data)
            ),
        )
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Declarative reader for one string field of a request object.
#[derive(Debug, Clone, Copy)]
pub struct CharField {
    name: &'static str,
    required: bool,
    allow_blank: bool,
    trim_whitespace: bool,
    max_length: Option<usize>,
}

impl CharField {
    /// A field that must be present and non-blank.
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            allow_blank: false,
            trim_whitespace: true,
            max_length: None,
        }
    }

    /// A field that may be omitted or blank; absent reads as `""`.
    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            allow_blank: true,
            trim_whitespace: true,
            max_length: None,
        }
    }

    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Keep leading and trailing whitespace (passwords).
    pub const fn keep_whitespace(mut self) -> Self {
        self.trim_whitespace = false;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Read the field from `data`.
    ///
    /// Returns `None` and records a message in `errors` when the value is
    /// rejected.
    pub fn read(&self, data: &Map<String, Value>, errors: &mut ValidationError) -> Option<String> {
        let raw = match data.get(self.name) {
            None if self.required => {
                errors.add(self.name, REQUIRED);
                return None;
            }
            None => return Some(String::new()),
            Some(Value::Null) => {
                errors.add(self.name, NOT_NULL);
                return None;
            }
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(_) | Value::Array(_) | Value::Object(_)) => {
                errors.add(self.name, NOT_A_STRING);
                return None;
            }
        };

        let value = if self.trim_whitespace {
            raw.trim().to_string()
        } else {
            raw
        };

        if value.is_empty() && !self.allow_blank {
            errors.add(self.name, NOT_BLANK);
            return None;
        }

        if let Some(max) = self.max_length {
            if value.chars().count() > max {
                errors.add(
                    self.name,
                    format!("Ensure this field has no more than {max} characters."),
                );
                return None;
            }
        }

        Some(value)
    }
}

const LOCAL_PART_MAX_LENGTH: usize = 64;
const LABEL_MAX_LENGTH: usize = 63;

/// Syntactic email check: dot-atom local part, then either `localhost`, a
/// bracketed address literal, or a dotted hostname whose last label is at
/// least two characters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    const SPECIALS: &str = "!#$%&'*+/=?^_`{|}~-";

    !local.is_empty()
        && local.len() <= LOCAL_PART_MAX_LENGTH
        && local.split('.').all(|atom| {
            !atom.is_empty()
                && atom
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c))
        })
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }

    if let Some(literal) = domain
        .strip_prefix('[')
        .and_then(|d| d.strip_suffix(']'))
    {
        return literal.parse::<std::net::IpAddr>().is_ok()
            || literal
                .strip_prefix("IPv6:")
                .is_some_and(|v6| v6.parse::<std::net::Ipv6Addr>().is_ok());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some((tld, hosts)) = labels.split_last() else {
        return false;
    };

    !hosts.is_empty() && hosts.iter().all(|label| is_valid_label(label)) && is_valid_tld(tld)
}

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            bytes.len() <= LABEL_MAX_LENGTH
                && first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        _ => false,
    }
}

fn is_valid_tld(tld: &str) -> bool {
    (2..=LABEL_MAX_LENGTH).contains(&tld.len())
        && !tld.ends_with('-')
        && tld.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
