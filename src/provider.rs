//! Version information sources.
//!
//! The update checker is polymorphic over [`VersionProvider`]: the default
//! [`http::HttpVersionProvider`] fetches a small JSON payload over HTTPS, and
//! embedders with their own distribution channel can inject any implementation
//! (or [`StaticVersionProvider`] for values sourced from embedded
//! configuration).

pub mod http;

use thiserror::Error;
use url::Url;

use crate::rules::AlertType;

/// Immutable result of a remote version lookup.
///
/// Produced by a [`VersionProvider`], consumed once per check cycle.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Latest published version, as a dotted numeric string.
    pub remote_version: String,
    /// Release notes for the latest version, when the source carries them.
    pub release_notes: Option<String>,
    /// Provider's suggestion for how urgent the prompt should be.
    ///
    /// `None` defaults to [`AlertType::Option`] during rule evaluation.
    pub suggested_alert: Option<AlertType>,
    /// Where the update can be obtained (store page, download URL).
    pub update_location: Option<Url>,
}

/// Failure modes of a version fetch.
///
/// Ordinary network and parse failures are mapped here rather than panicking;
/// the check cycle recovers by completing with no user decision.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or answered.
    #[error("Network error: {0}")]
    Network(String),
    /// The response arrived but could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The request exceeded the configured timeout.
    #[error("Timed out fetching version information")]
    Timeout,
}

/// Pluggable source of remote version information.
pub trait VersionProvider: Send + Sync {
    /// Fetch the latest published version, given the currently installed one.
    ///
    /// One best-effort attempt per invocation; retries are out of scope.
    fn fetch(&self, current_version: &str) -> Result<VersionInfo, FetchError>;
}

/// Provider backed by an embedded [`VersionInfo`].
///
/// Useful when the latest-version data ships inside some other channel the app
/// already has (remote config, a bundled manifest) and for tests.
#[derive(Debug, Clone)]
pub struct StaticVersionProvider {
    info: VersionInfo,
}

impl StaticVersionProvider {
    /// Wrap an already known `VersionInfo`.
    pub fn new(info: VersionInfo) -> Self {
        Self { info }
    }
}

impl VersionProvider for StaticVersionProvider {
    fn fetch(&self, _current_version: &str) -> Result<VersionInfo, FetchError> {
        Ok(self.info.clone())
    }
}
