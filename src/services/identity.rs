//! Anonymous requester identity.

use axum::http::HeaderMap;

const UNKNOWN_CLIENT: &str = "unknown";

/// Client address as reported by the fronting proxy
pub fn client_ip(headers: &HeaderMap) -> String {
    forwarded_for(headers)
        .or_else(|| header_value(headers, "x-real-ip"))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() || first.len() > 64 {
        return None;
    }
    Some(first.to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Keyed BLAKE3 hash of an address; the raw address is never stored
pub fn hash_ip(ip: &str, salt: &str) -> String {
    let key = blake3::derive_key("shelfscout requester ip", salt.as_bytes());
    blake3::keyed_hash(&key, ip.as_bytes()).to_hex().to_string()
}
