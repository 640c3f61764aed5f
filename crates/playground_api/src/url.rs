use url::Url;

use crate::error::PlaygroundApiError;

/// Default base URL of a locally served agent playground.
pub const DEFAULT_PLAYGROUND_BASE_URL: &str = "http://localhost:7777";

/// Trim a base URL, fall back to the default when blank, and drop trailing slashes.
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_PLAYGROUND_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

/// Build `<base>/v1/playground/agents/<agent_id>/<leaf>`.
///
/// The agent id is percent-encoded as a single path segment.
pub fn agent_endpoint(base: &str, agent_id: &str, leaf: &str) -> Result<Url, PlaygroundApiError> {
    let normalized = normalize_base_url(base);
    let mut url = Url::parse(&normalized)
        .map_err(|error| PlaygroundApiError::InvalidBaseUrl(format!("{normalized}: {error}")))?;

    url.path_segments_mut()
        .map_err(|_| PlaygroundApiError::InvalidBaseUrl(normalized.clone()))?
        .pop_if_empty()
        .extend(["v1", "playground", "agents", agent_id, leaf]);

    Ok(url)
}
