//! Shared object naming and URL derivation for transfer backends.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is in a key segment (RFC 3986 unreserved).
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Object name for an artifact: `{organization_id}_{version}_{timestamp_millis}.{extension}`.
pub fn generate_object_name(
    organization_id: &str,
    version: &str,
    timestamp_millis: i64,
    extension: &str,
) -> String {
    format!(
        "{}_{}_{}.{}",
        organization_id,
        version,
        timestamp_millis,
        extension.trim_start_matches('.')
    )
}

/// `url` without its query string or fragment.
pub fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Object key as a URL path: each `/`-separated segment is percent-encoded.
pub fn encode_object_key(key: &str) -> String {
    key.trim_start_matches('/')
        .split('/')
        .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Public retrieval URL for an object written through `grant_url`.
///
/// Without a public origin the signed URL is returned with its authorization
/// parameters removed. With one, the object is addressed on that origin instead,
/// since storage endpoints and public domains use different path layouts.
pub fn derive_public_url(grant_url: &str, object_key: &str, public_base_url: Option<&str>) -> String {
    match public_base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), encode_object_key(object_key)),
        None => strip_query(grant_url).to_string(),
    }
}
