//! In-app "update available" notifier.
//!
//! Fetches the latest published version of an application from a remote
//! source, compares it against the running app's version, decides which prompt
//! (if any) the user must see, and remembers the user's answer so prompts are
//! not repeated inappropriately.
//!
//! Rendering, localization tables, transport, and persistence are collaborator
//! seams ([`ModalHost`], [`localization::Localizer`], [`VersionProvider`],
//! [`SettingsStore`]); a default implementation for each ships in this crate.
//!
//! ```no_run
//! use std::sync::Arc;
//! use update_nudge::{CheckerConfig, UpdateChecker};
//! use update_nudge::provider::http::HttpVersionProvider;
//! use update_nudge::store::file::FileStore;
//! # struct MyModalHost;
//! # impl update_nudge::ModalHost for MyModalHost {
//! #     fn show_choice(&self, _: update_nudge::ModalRequest, _: update_nudge::presenter::Completion) {}
//! #     fn hide(&self) {}
//! # }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = HttpVersionProvider::new("https://example.com/version".parse()?);
//! let checker = UpdateChecker::new(
//!     Box::new(provider),
//!     Arc::new(MyModalHost),
//!     Box::new(FileStore::for_app("my-app")?),
//!     CheckerConfig::default(),
//! );
//! checker.check(env!("CARGO_PKG_VERSION"), |action| {
//!     println!("user chose {action:?}");
//! });
//! # Ok(())
//! # }
//! ```

/// Update check façade and configuration.
pub mod checker;
/// Localized prompt strings.
pub mod localization;
/// Single-flight prompt presentation.
pub mod presenter;
/// Version information sources.
pub mod provider;
/// Pure decision rules.
pub mod rules;
/// Persisted check state.
pub mod store;
/// Lenient version tags.
pub mod version;

pub use checker::{CheckerConfig, UpdateChecker, open_update_location};
pub use presenter::{
    AlertAction, ModalButton, ModalHost, ModalRequest, PresentError, PresentOutcome,
    PresentationController, PromptCopy,
};
pub use provider::{FetchError, StaticVersionProvider, VersionInfo, VersionProvider};
pub use rules::{AlertDecision, AlertType, Policy, RuleContext, evaluate};
pub use store::{SettingsStore, StateStore, StoreError};
pub use version::{VersionParseError, VersionTag};
