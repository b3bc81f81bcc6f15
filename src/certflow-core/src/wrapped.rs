//! Read-only helpers over wrapped (salted) certificate documents.
//!
//! A wrapped document stores every leaf of its `data` section as a salted
//! string:
//!
//! ```text
//! "<salt>:<type>:<value>"   e.g. "9c6bbd2e-...:string:Jane Doe"
//! ```
//!
//! These helpers recover the typed values needed for analytics. They never
//! modify the certificate.

use serde_json::{Map, Number, Value};

use crate::error::WrappedDocumentError;
use crate::types::Certificate;

/// Strip salts from a wrapped `data` section, restoring typed leaves.
///
/// Strings that are not salted are kept unchanged. Leaves of type
/// `undefined` are dropped from objects and become `null` inside arrays.
pub fn unsalt(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                if let Some(restored) = unsalt_leaf(child) {
                    out.insert(key.clone(), restored);
                }
            }
            Value::Object(out)
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| unsalt_leaf(item).unwrap_or(Value::Null))
                .collect(),
        ),
        Value::String(s) => unsalt_string(s).unwrap_or(Value::Null),
        other => other.clone(),
    }
}

fn unsalt_leaf(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => unsalt_string(s),
        other => Some(unsalt(other)),
    }
}

/// `None` means the leaf was `undefined` and should be omitted.
fn unsalt_string(raw: &str) -> Option<Value> {
    let mut parts = raw.splitn(3, ':');
    let (Some(_salt), Some(kind), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        return Some(Value::String(raw.to_string()));
    };

    match kind {
        "string" => Some(Value::String(rest.to_string())),
        "number" => Some(parse_number(rest).unwrap_or_else(|| Value::String(raw.to_string()))),
        "boolean" => match rest {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => Some(Value::String(raw.to_string())),
        },
        "null" => Some(Value::Null),
        "undefined" => None,
        _ => Some(Value::String(raw.to_string())),
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

impl Certificate {
    /// The unsalted `data` section.
    pub fn data(&self) -> Result<Value, WrappedDocumentError> {
        self.as_value()
            .get("data")
            .filter(|data| data.is_object())
            .map(unsalt)
            .ok_or(WrappedDocumentError::MissingData)
    }

    /// The document identifier (`data.id`).
    pub fn id(&self) -> Result<String, WrappedDocumentError> {
        match self.data()?.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(WrappedDocumentError::MissingId),
        }
    }

    /// The store address of every issuer, in issuer order.
    ///
    /// Each issuer contributes its `certificateStore`, else its
    /// `documentStore`, else its `tokenRegistry`.
    pub fn issuer_addresses(&self) -> Result<Vec<String>, WrappedDocumentError> {
        let data = self.data()?;
        let issuers = data
            .get("issuers")
            .and_then(Value::as_array)
            .filter(|issuers| !issuers.is_empty())
            .ok_or(WrappedDocumentError::MissingIssuers)?;

        issuers
            .iter()
            .enumerate()
            .map(|(index, issuer)| {
                ["certificateStore", "documentStore", "tokenRegistry"]
                    .iter()
                    .find_map(|field| {
                        issuer
                            .get(*field)
                            .and_then(Value::as_str)
                            .filter(|address| !address.is_empty())
                    })
                    .map(str::to_string)
                    .ok_or(WrappedDocumentError::MissingIssuerAddress { index })
            })
            .collect()
    }
}
