//! Lenient dotted-numeric version tags.
//!
//! Published app versions are not always strict semver: store listings commonly
//! carry two components (`1.0`) or four (`1.0.0.1`). Comparison is therefore
//! component-wise numeric, with missing trailing components treated as zero, so
//! `1.0` and `1.0.0` compare equal.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid version '{text}': {reason}")]
pub struct VersionParseError {
    /// The offending input.
    pub text: String,
    /// Why parsing failed.
    pub reason: String,
}

impl VersionParseError {
    fn new(text: &str, reason: impl Into<String>) -> Self {
        Self {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// A dotted numeric version such as `1.2.3` or `1.0.0.1`.
///
/// The original text is preserved for display; ordering and equality use the
/// parsed components only.
#[derive(Debug, Clone)]
pub struct VersionTag {
    components: Vec<u64>,
    text: String,
}

impl VersionTag {
    /// Parsed numeric components in major-first order.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// The version string as originally written.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for VersionTag {
    type Err = VersionParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        if text.is_empty() {
            return Err(VersionParseError::new(input, "empty string"));
        }
        let mut components = Vec::new();
        for part in text.split('.') {
            if part.is_empty() {
                return Err(VersionParseError::new(input, "empty component"));
            }
            let value = part.parse::<u64>().map_err(|err| {
                VersionParseError::new(input, format!("component '{part}': {err}"))
            })?;
            components.push(value);
        }
        Ok(Self {
            components,
            text: text.to_string(),
        })
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for VersionTag {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionTag {}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for index in 0..len {
            match self.component(index).cmp(&other.component(index)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
