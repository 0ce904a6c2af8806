use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::config::ProxyConfig;

/// Canonical form of a media reference after resolution. The backend returns
/// file attachments in several shapes depending on API version; every form
/// in the dashboard consumes this one.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMedia {
    pub file_id: Option<i64>,
    pub preview_url: Option<String>,
}

/// Numeric coercion accepting both JSON numbers and numeric strings.
/// Non-finite and non-numeric inputs count as absent.
pub fn as_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

/// Extract the file identifier from a heterogeneous reference. Precedence:
/// `fileId`, then `id`, then `file.id`; a candidate that fails coercion
/// falls through to the next one.
pub fn resolve_file_id(value: &Value) -> Option<i64> {
    let obj = value.as_object()?;
    let file = obj.get("file").and_then(Value::as_object);
    [
        obj.get("fileId"),
        obj.get("id"),
        file.and_then(|f| f.get("id")),
    ]
    .into_iter()
    .flatten()
    .find_map(as_number)
}

/// Extract a browser-loadable preview URL. First non-blank string among
/// `previewUrl`, `url`, `path`, `file.url`, `file.path`, joined onto the
/// backend base when storage-relative.
pub fn resolve_preview_url(value: &Value, cfg: &ProxyConfig) -> Option<String> {
    let obj = value.as_object()?;
    let file = obj.get("file").and_then(Value::as_object);
    let raw = [
        obj.get("previewUrl"),
        obj.get("url"),
        obj.get("path"),
        file.and_then(|f| f.get("url")),
        file.and_then(|f| f.get("path")),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|s| !s.trim().is_empty())?;
    Some(cfg.absolute_upload_url(raw))
}

pub fn resolve(value: &Value, cfg: &ProxyConfig) -> ResolvedMedia {
    ResolvedMedia {
        file_id: resolve_file_id(value),
        preview_url: resolve_preview_url(value, cfg),
    }
}
