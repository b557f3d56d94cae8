//! Stable key derivation for store namespaces.

/// Sanitize an identifier for use inside a store key: lower-case, replace
/// anything outside `[a-z0-9:]` with `_`, trim leading/trailing `_`. Empty
/// identifiers map to the fixed sentinel `"unknown"` so no caller can ever
/// produce an empty key.
pub fn sanitize_id(id: &str) -> String {
    if id.is_empty() {
        return "unknown".to_string();
    }
    let mut out = String::with_capacity(id.len());
    for c in id.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == ':' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    let out = out.trim_matches('_');
    if out.is_empty() {
        "unknown".to_string()
    } else {
        out.to_string()
    }
}

/// Derive a namespaced series key: `<namespace>:<sanitized id>:<metric>`.
pub fn series_key(namespace: &str, id: &str, metric: &str) -> String {
    format!("{namespace}:{}:{metric}", sanitize_id(id))
}
