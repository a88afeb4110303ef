//! Default HTTP+JSON version provider.
//!
//! Issues one read-only GET per invocation with cache-bypass headers (the
//! endpoint answers with different version numbers over time at a fixed URL, so
//! a transport cache must never serve it) and bounded timeouts. The JSON schema
//! here is a default-provider detail, not part of the core contract.

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::{FetchError, VersionInfo, VersionProvider};
use crate::rules::AlertType;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
/// Version payloads are tiny; anything larger than this is not one.
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Query parameter carrying the caller's installed version.
const APP_VERSION_PARAM: &str = "app_version";

/// Provider that fetches version information from a JSON endpoint.
///
/// Expected payload shape:
///
/// ```json
/// {
///   "version": "1.2.0",
///   "notes": "Bug fixes",
///   "alert_type": "skip",
///   "update_url": "https://example.com/download"
/// }
/// ```
///
/// Only `version` is required.
pub struct HttpVersionProvider {
    endpoint: Url,
    agent: ureq::Agent,
}

impl HttpVersionProvider {
    /// Provider for `endpoint` with the default timeouts.
    pub fn new(endpoint: Url) -> Self {
        Self::with_timeouts(endpoint, CONNECT_TIMEOUT, READ_TIMEOUT)
    }

    /// Provider with explicit connect/read timeouts (tests, unusual hosts).
    pub fn with_timeouts(endpoint: Url, connect: Duration, read: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect)
            .timeout_read(read)
            .timeout_write(WRITE_TIMEOUT)
            .build();
        Self { endpoint, agent }
    }

    fn request_url(&self, current_version: &str) -> Url {
        let mut url = self.endpoint.clone();
        if !current_version.is_empty() {
            url.query_pairs_mut()
                .append_pair(APP_VERSION_PARAM, current_version);
        }
        url
    }
}

impl VersionProvider for HttpVersionProvider {
    fn fetch(&self, current_version: &str) -> Result<VersionInfo, FetchError> {
        let url = self.request_url(current_version);
        tracing::debug!("Fetching version information from {url}");
        let response = self
            .agent
            .request_url("GET", &url)
            .set("User-Agent", concat!("update-nudge/", env!("CARGO_PKG_VERSION")))
            .set("Accept", "application/json")
            .set("Cache-Control", "no-cache")
            .set("Pragma", "no-cache")
            .call()
            .map_err(map_call_error)?;
        let bytes = read_bounded(response)?;
        let payload: RemotePayload = serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::Decode(err.to_string()))?;
        payload.try_into()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RemotePayload {
    version: String,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    alert_type: Option<AlertType>,
    #[serde(default)]
    update_url: Option<String>,
}

impl TryFrom<RemotePayload> for VersionInfo {
    type Error = FetchError;

    fn try_from(payload: RemotePayload) -> Result<Self, FetchError> {
        let update_location = payload
            .update_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|err| FetchError::Decode(format!("Invalid update_url: {err}")))?;
        Ok(VersionInfo {
            remote_version: payload.version,
            release_notes: payload.notes,
            suggested_alert: payload.alert_type,
            update_location,
        })
    }
}

fn map_call_error(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(code, _) => FetchError::Network(format!("HTTP status {code}")),
        ureq::Error::Transport(transport) => {
            if transport_is_timeout(&transport) {
                FetchError::Timeout
            } else {
                FetchError::Network(transport.to_string())
            }
        }
    }
}

fn transport_is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>()
            && io_error_is_timeout(io_err)
        {
            return true;
        }
        source = err.source();
    }
    false
}

fn io_error_is_timeout(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
    )
}

/// Read a response into memory, enforcing the payload size cap.
fn read_bounded(response: ureq::Response) -> Result<Vec<u8>, FetchError> {
    if let Some(length) = response.header("Content-Length")
        && let Ok(length) = length.parse::<u64>()
        && length > MAX_RESPONSE_BYTES as u64
    {
        return Err(FetchError::Decode(format!(
            "Response too large: {length} bytes"
        )));
    }
    let mut limited = response.into_reader().take(MAX_RESPONSE_BYTES as u64 + 1);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(|err| {
        if io_error_is_timeout(&err) {
            FetchError::Timeout
        } else {
            FetchError::Network(err.to_string())
        }
    })?;
    if bytes.len() > MAX_RESPONSE_BYTES {
        return Err(FetchError::Decode(format!(
            "Response exceeded {MAX_RESPONSE_BYTES} bytes"
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    fn serve_once(response: String) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        Url::parse(&format!("http://{addr}/version")).unwrap()
    }

    fn http_ok(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[test]
    fn fetch_decodes_full_payload() {
        let body = r#"{
            "version": "1.2.0",
            "notes": "Bug fixes",
            "alert_type": "skip",
            "update_url": "https://example.invalid/download"
        }"#;
        let url = serve_once(http_ok(body));
        let provider = HttpVersionProvider::new(url);
        let info = provider.fetch("1.0.0").unwrap();
        assert_eq!(info.remote_version, "1.2.0");
        assert_eq!(info.release_notes.as_deref(), Some("Bug fixes"));
        assert_eq!(info.suggested_alert, Some(AlertType::Skip));
        assert_eq!(
            info.update_location.unwrap().as_str(),
            "https://example.invalid/download"
        );
    }

    #[test]
    fn fetch_accepts_minimal_payload() {
        let url = serve_once(http_ok(r#"{"version":"2.0"}"#));
        let provider = HttpVersionProvider::new(url);
        let info = provider.fetch("1.0.0").unwrap();
        assert_eq!(info.remote_version, "2.0");
        assert!(info.suggested_alert.is_none());
        assert!(info.update_location.is_none());
    }

    #[test]
    fn fetch_appends_current_version_query() {
        let provider = HttpVersionProvider::new(Url::parse("https://example.invalid/v").unwrap());
        let url = provider.request_url("1.2.3");
        assert_eq!(url.query(), Some("app_version=1.2.3"));
        assert_eq!(provider.request_url("").query(), None);
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        let url = serve_once(http_ok("<html>nope</html>"));
        let provider = HttpVersionProvider::new(url);
        let err = provider.fetch("1.0.0").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn invalid_update_url_is_a_decode_error() {
        let url = serve_once(http_ok(r#"{"version":"2.0","update_url":"not a url"}"#));
        let provider = HttpVersionProvider::new(url);
        let err = provider.fetch("1.0.0").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn http_error_status_is_a_network_error() {
        let url = serve_once("HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n".to_string());
        let provider = HttpVersionProvider::new(url);
        let err = provider.fetch("1.0.0").unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    }

    #[test]
    fn refused_connection_is_a_network_error() {
        // Bind then drop to get a port that refuses connections.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = Url::parse(&format!("http://{addr}/version")).unwrap();
        let provider = HttpVersionProvider::new(url);
        let err = provider.fetch("1.0.0").unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                thread::sleep(Duration::from_secs(2));
            }
        });
        let url = Url::parse(&format!("http://{addr}/version")).unwrap();
        let provider = HttpVersionProvider::with_timeouts(
            url,
            Duration::from_secs(1),
            Duration::from_millis(200),
        );
        let err = provider.fetch("1.0.0").unwrap_err();
        assert!(matches!(err, FetchError::Timeout), "got {err:?}");
    }

    #[test]
    fn oversized_response_is_rejected() {
        let body = format!(r#"{{"version":"2.0","notes":"{}"}}"#, "x".repeat(MAX_RESPONSE_BYTES));
        let url = serve_once(http_ok(&body));
        let provider = HttpVersionProvider::new(url);
        let err = provider.fetch("1.0.0").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }
}
