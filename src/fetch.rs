/// Why a document could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("could not reach {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not read response body from {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Downloads the raw text of a JSON document.
///
/// The body is returned as-is; whether it is valid JSON is decided by whoever
/// parses it next.
pub fn fetch_metadata(url: &str) -> Result<String, FetchError> {
    tracing::info!(url, "fetching metadata");

    let agent = ureq::Agent::new_with_defaults();
    let response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::StatusCode(status) => FetchError::Status {
            url: url.to_owned(),
            status,
        },
        other => FetchError::Unreachable {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    })?;

    response
        .into_body()
        .read_to_string()
        .map_err(|e| FetchError::Body {
            url: url.to_owned(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_host() {
        // Nothing listens on the discard port of the loopback address.
        match fetch_metadata("http://127.0.0.1:9/metadata.json") {
            Err(FetchError::Unreachable { url, .. }) => {
                assert_eq!("http://127.0.0.1:9/metadata.json", url)
            }
            other => panic!("expected an unreachable error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_url() {
        assert!(fetch_metadata("not a url").is_err());
    }
}
