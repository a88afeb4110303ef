//! Update check façade.
//!
//! One `check` call runs the whole cycle: fetch version information through the
//! injected provider, evaluate the decision rules against persisted state, and
//! hand a presentable decision to the presentation controller. Fetch and parse
//! failures never reach the caller as errors; the cycle completes with
//! [`AlertAction::Unknown`] and a diagnostic event.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::localization::{BuiltinCatalog, Localizer};
use crate::presenter::{
    AlertAction, Completion, ModalHost, PresentError, PresentOutcome, PresentationController,
    PromptCopy,
};
use crate::provider::{VersionInfo, VersionProvider};
use crate::rules::{self, AlertType, Policy, RuleContext};
use crate::store::{SettingsStore, StateStore};

/// Configuration surface consumed by [`UpdateChecker`].
#[derive(Debug, Clone, Default)]
pub struct CheckerConfig {
    /// Decision thresholds (forced-update floor, re-prompt interval).
    pub policy: Policy,
    /// Prompt copy overrides and locale selection.
    pub copy: PromptCopy,
}

/// Orchestrates provider, rules, state, and presentation for one app.
///
/// `check` blocks on the network fetch (bounded by the provider's timeouts);
/// embedders typically call it from a background thread on launch or
/// foreground events. Overlapping calls are safe: at most one prompt is ever
/// visible, and an overlapped call's completion is dropped rather than queued.
pub struct UpdateChecker {
    provider: Box<dyn VersionProvider>,
    state: Arc<StateStore>,
    presenter: PresentationController,
    policy: Policy,
}

impl UpdateChecker {
    /// Checker with the built-in localization catalog.
    pub fn new(
        provider: Box<dyn VersionProvider>,
        host: Arc<dyn ModalHost>,
        backing: Box<dyn SettingsStore>,
        config: CheckerConfig,
    ) -> Self {
        Self::with_localizer(provider, host, backing, Arc::new(BuiltinCatalog), config)
    }

    /// Checker with an embedder-supplied localizer.
    pub fn with_localizer(
        provider: Box<dyn VersionProvider>,
        host: Arc<dyn ModalHost>,
        backing: Box<dyn SettingsStore>,
        localizer: Arc<dyn Localizer>,
        config: CheckerConfig,
    ) -> Self {
        let state = Arc::new(StateStore::new(backing));
        let presenter =
            PresentationController::new(host, localizer, state.clone(), config.copy);
        Self {
            provider,
            state,
            presenter,
            policy: config.policy,
        }
    }

    /// Run one check cycle.
    ///
    /// `completion` receives the user's choice, or [`AlertAction::Unknown`]
    /// when no prompt was shown (up to date, suppressed, or fetch failure). It
    /// is invoked at most once; when this cycle overlaps an already visible
    /// prompt it is dropped without being invoked.
    pub fn check(
        &self,
        current_version: &str,
        completion: impl FnOnce(AlertAction) + Send + 'static,
    ) {
        if let Err(err) = self.state.record_installed_version(current_version) {
            tracing::warn!("Could not record installed version: {err}");
        }

        let info = match self.provider.fetch(current_version) {
            Ok(info) => info,
            Err(err) => {
                tracing::warn!("Version fetch failed: {err}");
                completion(AlertAction::Unknown);
                return;
            }
        };

        let skipped = self.state.skipped_version();
        let decision = rules::evaluate(&RuleContext {
            current: current_version,
            info: &info,
            skipped: skipped.as_deref(),
            last_prompt: self.state.last_prompt_date(),
            now: OffsetDateTime::now_utc(),
            policy: &self.policy,
        });

        if decision.alert_type == AlertType::None {
            tracing::debug!(
                "No prompt for remote version {}; completing with Unknown",
                decision.remote_version
            );
            completion(AlertAction::Unknown);
            return;
        }

        let completion: Completion = Box::new(completion);
        match self.presenter.present_alert(&decision, completion) {
            Ok(PresentOutcome::Presented) => {}
            Ok(PresentOutcome::AlreadyActive) => {}
            Err(err @ PresentError::Store(_)) => {
                // The presenter completed with Unknown before returning this.
                tracing::error!("Presentation failed: {err}");
            }
            Err(err @ PresentError::SuppressedDecision) => {
                // Unreachable here: None decisions complete with Unknown above.
                tracing::error!("Presentation rejected: {err}");
            }
        }
    }

    /// Persisted notifier state (skip records, prompt timestamps).
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// The presentation controller, for explicit dismissal.
    pub fn presenter(&self) -> &PresentationController {
        &self.presenter
    }
}

/// Best-effort open the update location with the OS default handler.
pub fn open_update_location(info: &VersionInfo) -> Result<(), String> {
    let Some(url) = &info.update_location else {
        return Err("Version info carries no update location".to_string());
    };
    open::that(url.as_str()).map_err(|err| err.to_string())
}
