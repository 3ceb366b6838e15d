//! Decoding of the `{status: "success" | "error", ...}` reply envelope.
use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use vidgen_core::{AssetBundle, AssetCategory};

use crate::{ApiError, FailureKind};

pub(crate) type Body = Map<String, Value>;

/// Turns a status code and raw body into the success payload, or the failure
/// the backend meant to report.
pub(crate) fn open(status: StatusCode, raw: &[u8]) -> Result<Body, ApiError> {
    reject_error(object(status, raw)?)
}

/// Like [`open`], but a bare job record is returned as is. Its `status` is
/// the job's lifecycle tag, so a failed job is not a failed request.
pub(crate) fn open_job(status: StatusCode, raw: &[u8]) -> Result<Body, ApiError> {
    let body = object(status, raw)?;
    if is_bare_job(&body) {
        return Ok(body);
    }
    reject_error(body)
}

fn is_bare_job(body: &Body) -> bool {
    !body.contains_key("job") && (body.contains_key("job_id") || body.contains_key("progress"))
}

fn object(status: StatusCode, raw: &[u8]) -> Result<Body, ApiError> {
    let parsed = serde_json::from_slice::<Value>(raw).ok();

    if !status.is_success() {
        let message = parsed
            .as_ref()
            .and_then(Value::as_object)
            .and_then(backend_message)
            .unwrap_or_else(|| status_text(status));
        let kind = if status == StatusCode::NOT_FOUND {
            FailureKind::NotFound
        } else {
            FailureKind::HttpStatus(status.as_u16())
        };
        return Err(ApiError::new(kind, message));
    }

    let body = match parsed {
        Some(Value::Object(body)) => body,
        Some(_) => {
            return Err(ApiError::new(
                FailureKind::Malformed,
                "expected a JSON object",
            ))
        }
        None => {
            return Err(ApiError::new(
                FailureKind::Malformed,
                "response is not valid JSON",
            ))
        }
    };
    Ok(body)
}

fn reject_error(body: Body) -> Result<Body, ApiError> {
    let reports_error = match body.get("status").and_then(Value::as_str) {
        Some(tag) => tag.eq_ignore_ascii_case("error"),
        None => body.contains_key("error"),
    };
    if reports_error {
        let message = backend_message(&body).unwrap_or_else(|| "request failed".to_string());
        return Err(ApiError::new(FailureKind::Backend, message));
    }
    Ok(body)
}

/// Deserializes a required field of the payload.
pub(crate) fn field<T: DeserializeOwned>(body: &mut Body, key: &str) -> Result<T, ApiError> {
    let value = body
        .remove(key)
        .filter(|value| !value.is_null())
        .ok_or_else(|| ApiError::new(FailureKind::Malformed, format!("missing field `{key}`")))?;
    serde_json::from_value(value)
        .map_err(|err| ApiError::new(FailureKind::Malformed, format!("field `{key}`: {err}")))
}

/// Deserializes the whole payload, ignoring the envelope keys.
pub(crate) fn whole<T: DeserializeOwned>(body: Body) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(body))
        .map_err(|err| ApiError::new(FailureKind::Malformed, err.to_string()))
}

pub(crate) fn message(body: &Body) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn backend_message(body: &Body) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// Shapes the assets endpoint has been seen to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AssetsPayload {
    Flat(Vec<String>),
    Grouped(BTreeMap<String, Vec<String>>),
}

impl AssetsPayload {
    pub(crate) fn into_bundle(self) -> AssetBundle {
        match self {
            AssetsPayload::Flat(paths) => AssetBundle::from_paths(paths),
            AssetsPayload::Grouped(groups) => {
                let mut bundle = AssetBundle::new();
                for (key, paths) in groups {
                    match AssetCategory::from_key(&key) {
                        Some(category) => {
                            for path in paths {
                                bundle.push(category, path);
                            }
                        }
                        None => {
                            for path in paths {
                                if let Some(category) = AssetCategory::from_path(&path) {
                                    bundle.push(category, path);
                                }
                            }
                        }
                    }
                }
                bundle
            }
        }
    }
}
