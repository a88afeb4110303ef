//! Pure decision rules for one update-check cycle.
//!
//! `evaluate` is deterministic and side-effect free apart from diagnostics:
//! every input that can vary (clock, persisted skip, policy) is passed in, so
//! the same context always yields the same decision.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::provider::VersionInfo;
use crate::version::VersionTag;

/// Severity classes for the update prompt.
///
/// Severity is a policy outcome, not a comparable value; the enum deliberately
/// has no ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    /// Update is the only choice (one-button alert).
    Force,
    /// Update now or at next launch (two-button alert).
    Option,
    /// Update now, at next launch, or skip this version (three-button alert).
    Skip,
    /// No prompt is shown.
    None,
}

/// Embedder-configured thresholds consulted during evaluation.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Installed versions below this floor get a forced update prompt.
    pub force_below: Option<VersionTag>,
    /// Minimum time between prompts; zero disables the gate.
    pub min_reprompt_interval: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            force_below: None,
            min_reprompt_interval: Duration::ZERO,
        }
    }
}

/// Outcome of rule evaluation, consumed by the presenter for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDecision {
    /// Which prompt (if any) to show.
    pub alert_type: AlertType,
    /// The remote version the prompt is about.
    pub remote_version: String,
}

/// Inputs to one rule evaluation.
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    /// Installed version of the running app.
    pub current: &'a str,
    /// Result of the remote version lookup.
    pub info: &'a VersionInfo,
    /// Version the user previously chose to skip, if any.
    pub skipped: Option<&'a str>,
    /// When a prompt was last shown, if ever.
    pub last_prompt: Option<OffsetDateTime>,
    /// Evaluation time.
    pub now: OffsetDateTime,
    /// Embedder policy.
    pub policy: &'a Policy,
}

/// Map one check cycle's inputs to an alert decision.
///
/// Rule order is normative: up-to-date and malformed versions suppress first,
/// policy floors beat everything else, then the persisted skip, then the
/// provider's suggestion gated by the re-prompt interval. The provider can only
/// request a lower urgency than policy mandates, never override a forced
/// update.
pub fn evaluate(ctx: &RuleContext<'_>) -> AlertDecision {
    let remote_text = ctx.info.remote_version.as_str();
    let suppressed = AlertDecision {
        alert_type: AlertType::None,
        remote_version: remote_text.to_string(),
    };

    let remote = match VersionTag::from_str(remote_text) {
        Ok(version) => version,
        Err(err) => {
            tracing::warn!("Ignoring malformed remote version: {err}");
            return suppressed;
        }
    };
    let current = match VersionTag::from_str(ctx.current) {
        Ok(version) => version,
        Err(err) => {
            tracing::warn!("Ignoring malformed installed version: {err}");
            return suppressed;
        }
    };

    if remote <= current {
        return suppressed;
    }

    if let Some(floor) = &ctx.policy.force_below
        && current < *floor
    {
        return AlertDecision {
            alert_type: AlertType::Force,
            remote_version: remote_text.to_string(),
        };
    }

    if let Some(skipped_text) = ctx.skipped {
        match VersionTag::from_str(skipped_text) {
            Ok(skipped) if remote <= skipped => return suppressed,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("Ignoring malformed skipped version: {err}");
            }
        }
    }

    let suggested = ctx.info.suggested_alert.unwrap_or(AlertType::Option);
    if suggested == AlertType::None {
        return suppressed;
    }

    // A forced prompt is never silenced by the re-prompt interval.
    if suggested != AlertType::Force
        && ctx.policy.min_reprompt_interval > Duration::ZERO
        && let Some(last) = ctx.last_prompt
        && ctx.now - last < ctx.policy.min_reprompt_interval
    {
        tracing::debug!(
            "Suppressing prompt for {remote_text}: re-prompt interval has not elapsed"
        );
        return suppressed;
    }

    AlertDecision {
        alert_type: suggested,
        remote_version: remote_text.to_string(),
    }
}
