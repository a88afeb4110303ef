//! Single-flight presentation of the update prompt.
//!
//! The controller owns the one live alert session: it builds localized copy,
//! hands the rendered choice to the [`ModalHost`] collaborator, and routes the
//! user's answer back to the caller and into persisted state. Overlapping
//! presentation requests are dropped, never queued, so at most one prompt is
//! visible regardless of how many check cycles overlap.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use time::OffsetDateTime;

use crate::localization::{FALLBACK_LOCALE, Localizer, TextKey, resolve};
use crate::rules::{AlertDecision, AlertType};
use crate::store::{StateStore, StoreError};

/// Choice made by the user for one prompt.
///
/// `Unknown` means no user decision was available: the decision was suppressed,
/// the fetch failed, or presentation could not occur. It is distinct from the
/// user actively dismissing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    /// The user chose to update now.
    Update,
    /// The user chose to be reminded at the next check.
    NextTime,
    /// The user chose to skip this version.
    Skip,
    /// No user decision was available.
    Unknown,
}

/// One button offered by the modal collaborator, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalButton {
    /// Localized label.
    pub label: String,
    /// Action delivered when this button is chosen.
    pub action: AlertAction,
}

/// Fully built prompt copy handed to the modal collaborator.
#[derive(Debug, Clone)]
pub struct ModalRequest {
    /// Alert title.
    pub title: String,
    /// Alert body with placeholders already substituted.
    pub message: String,
    /// Buttons in the exact order they must be rendered.
    pub buttons: Vec<ModalButton>,
}

/// Callback invoked exactly once with the user's choice.
///
/// Runs on whatever thread the modal host delivers choices on; no main-thread
/// guarantee is made or assumed.
pub type Completion = Box<dyn FnOnce(AlertAction) + Send>;

/// Native modal collaborator.
///
/// The core never draws anything itself; it asks the host to present a choice
/// among ordered buttons and waits for exactly one callback.
pub trait ModalHost: Send + Sync {
    /// Render `request` and invoke `on_choice` exactly once with the selection.
    fn show_choice(&self, request: ModalRequest, on_choice: Completion);
    /// Tear down any visible modal. Must be safe to call when nothing is shown.
    fn hide(&self);
}

/// Copy configuration for the prompt.
///
/// Every field is an explicit override: present means "use this string", absent
/// means "use the localized default". Comparing caller strings against default
/// constants is deliberately avoided.
#[derive(Debug, Clone, Default)]
pub struct PromptCopy {
    /// App name substituted for `{app}` in message templates.
    pub app_name: Option<String>,
    /// Override for the alert title.
    pub alert_title: Option<String>,
    /// Override for the alert message; may use `{app}` and `{version}`.
    pub alert_message: Option<String>,
    /// Override for the update button label.
    pub update_button: Option<String>,
    /// Override for the next-time button label.
    pub next_time_button: Option<String>,
    /// Override for the skip button label.
    pub skip_button: Option<String>,
    /// Locale requested from the localizer; absent means the fallback locale.
    pub locale: Option<String>,
}

/// Errors from [`PresentationController::present_alert`].
#[derive(Debug, Error)]
pub enum PresentError {
    /// A `None` decision was passed in; callers must filter those upstream.
    #[error("Refusing to present a suppressed (None) decision")]
    SuppressedDecision,
    /// Persisting the prompt timestamp failed; the prompt was not shown.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What happened to a presentation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The prompt is now visible; the completion fires on the user's choice.
    Presented,
    /// Another prompt was already active; this request was dropped and its
    /// completion will never be invoked.
    AlreadyActive,
}

/// The single live alert instance.
#[derive(Debug)]
struct Session {
    remote_version: String,
}

struct Inner {
    host: Arc<dyn ModalHost>,
    localizer: Arc<dyn Localizer>,
    state: Arc<StateStore>,
    copy: PromptCopy,
    session: Mutex<Option<Session>>,
}

impl Inner {
    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the single session slot. Check-then-set happens under the lock.
    fn try_acquire(&self, remote_version: &str) -> bool {
        let mut slot = self.lock_session();
        if slot.is_some() {
            return false;
        }
        *slot = Some(Session {
            remote_version: remote_version.to_string(),
        });
        true
    }

    /// Free the session slot. Safe to call when no session exists.
    fn release(&self) -> bool {
        self.lock_session().take().is_some()
    }
}

/// Owns the single in-flight update prompt.
pub struct PresentationController {
    inner: Arc<Inner>,
}

impl Clone for PresentationController {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl PresentationController {
    /// Controller wired to its collaborators.
    pub fn new(
        host: Arc<dyn ModalHost>,
        localizer: Arc<dyn Localizer>,
        state: Arc<StateStore>,
        copy: PromptCopy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                localizer,
                state,
                copy,
                session: Mutex::new(None),
            }),
        }
    }

    /// Whether a prompt is currently visible.
    pub fn is_presenting(&self) -> bool {
        self.inner.lock_session().is_some()
    }

    /// Remote version of the active prompt, if one is visible.
    pub fn active_remote_version(&self) -> Option<String> {
        self.inner
            .lock_session()
            .as_ref()
            .map(|session| session.remote_version.clone())
    }

    /// Present the prompt for `decision` and route the user's choice to
    /// `completion`.
    ///
    /// Passing a `None` decision is a contract violation: it is asserted in
    /// debug builds and rejected with [`PresentError::SuppressedDecision`] in
    /// release. If a prompt is already active the request is a no-op and
    /// `completion` is dropped. The prompt timestamp is recorded at
    /// presentation time; if that flush fails, nothing is shown and
    /// `completion` receives [`AlertAction::Unknown`] before the error is
    /// returned.
    pub fn present_alert(
        &self,
        decision: &AlertDecision,
        completion: Completion,
    ) -> Result<PresentOutcome, PresentError> {
        if decision.alert_type == AlertType::None {
            debug_assert!(false, "present_alert called with a None decision");
            return Err(PresentError::SuppressedDecision);
        }
        if !self.inner.try_acquire(&decision.remote_version) {
            tracing::debug!(
                "Update prompt already active; dropping request for {}",
                decision.remote_version
            );
            return Ok(PresentOutcome::AlreadyActive);
        }

        if let Err(err) = self
            .inner
            .state
            .record_prompt_shown(OffsetDateTime::now_utc())
        {
            tracing::error!("Could not record prompt time; aborting presentation: {err}");
            self.inner.release();
            completion(AlertAction::Unknown);
            return Err(err.into());
        }

        let request = self.build_request(decision);
        let inner = Arc::clone(&self.inner);
        let remote_version = decision.remote_version.clone();
        let on_choice: Completion = Box::new(move |action| {
            let delivered = match action {
                AlertAction::Skip => match inner.state.record_skipped_version(&remote_version) {
                    Ok(()) => AlertAction::Skip,
                    Err(err) => {
                        tracing::error!("Could not persist skipped version: {err}");
                        AlertAction::Unknown
                    }
                },
                other => other,
            };
            // Teardown before the completion fires.
            inner.release();
            inner.host.hide();
            completion(delivered);
        });
        self.inner.host.show_choice(request, on_choice);
        Ok(PresentOutcome::Presented)
    }

    /// Cancel any active prompt without delivering a user action.
    ///
    /// Idempotent; safe to call when nothing is presented. The pending
    /// completion is dropped, never invoked.
    pub fn dismiss(&self) {
        if self.inner.release() {
            self.inner.host.hide();
        }
    }

    fn build_request(&self, decision: &AlertDecision) -> ModalRequest {
        let copy = &self.inner.copy;
        let locale = copy.locale.as_deref().unwrap_or(FALLBACK_LOCALE);
        let localizer = self.inner.localizer.as_ref();

        let title = copy
            .alert_title
            .clone()
            .unwrap_or_else(|| resolve(localizer, TextKey::AlertTitle, locale));
        let message_template = copy
            .alert_message
            .clone()
            .unwrap_or_else(|| resolve(localizer, TextKey::AlertMessage, locale));
        let app_name = copy.app_name.as_deref().unwrap_or("this app");
        let message = message_template
            .replace("{app}", app_name)
            .replace("{version}", &decision.remote_version);

        let update = ModalButton {
            label: copy
                .update_button
                .clone()
                .unwrap_or_else(|| resolve(localizer, TextKey::UpdateButton, locale)),
            action: AlertAction::Update,
        };
        let next_time = ModalButton {
            label: copy
                .next_time_button
                .clone()
                .unwrap_or_else(|| resolve(localizer, TextKey::NextTimeButton, locale)),
            action: AlertAction::NextTime,
        };
        let skip = ModalButton {
            label: copy
                .skip_button
                .clone()
                .unwrap_or_else(|| resolve(localizer, TextKey::SkipButton, locale)),
            action: AlertAction::Skip,
        };

        // Button order is part of the contract.
        let buttons = match decision.alert_type {
            AlertType::Force => vec![update],
            AlertType::Option => vec![next_time, update],
            AlertType::Skip => vec![update, next_time, skip],
            AlertType::None => Vec::new(),
        };

        ModalRequest {
            title,
            message,
            buttons,
        }
    }
}
