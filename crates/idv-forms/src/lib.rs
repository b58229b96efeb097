//! # idv-forms
//!
//! Schema-driven identity-verification forms.
//!
//! This crate provides:
//! - A typed schema of providers, categories and fields, parsed from JSON
//! - A small rule language (`maxlength=10|digits`) compiled to validators
//! - A form compiler that builds the runtime field state for one provider
//! - A debounced, case-insensitive provider search
//! - A submission controller that gates on validation and waits for the
//!   presentation layer to finish its transition
//!
//! Rendering, notifications and transition effects are left to the caller
//! through the [`Notifier`] and [`Transitions`] traits.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use idv_forms::prelude::*;
//!
//! struct Silent;
//!
//! impl Notifier for Silent {
//!     fn notify(&self, _notification: Notification) {}
//! }
//!
//! impl Transitions for Silent {
//!     fn on_validation_failed(&self) {}
//!     fn on_accepted(&self, on_done: CompletionHandle) {
//!         on_done.complete();
//!     }
//! }
//!
//! let schema = r#"{
//!     "Alpha Bank": {
//!         "Passport": [
//!             {"label": "Passport Number", "order": 1, "required": true, "validation": "maxlength=9"}
//!         ]
//!     }
//! }"#;
//!
//! let silent = Arc::new(Silent);
//! let mut session = FormSession::new(FormConfig::default(), silent.clone(), silent);
//! session.load_schema_json(schema).unwrap();
//! session.select_provider("Alpha Bank").unwrap();
//!
//! // The required field is empty, so the submission is rejected.
//! assert!(matches!(session.submit(), SubmitOutcome::Rejected(_)));
//!
//! session.set_value("Passport", "Passport Number", "AB1234567").unwrap();
//! assert!(matches!(session.submit(), SubmitOutcome::Accepted(_)));
//! assert_eq!(session.controller().state(), SubmissionState::Submitted);
//! ```
//!
//! ## Validation
//!
//! ```rust
//! use idv_forms::{ErrorKind, FieldSpec, RuleEngine, ValidatorRule};
//! use idv_forms::form::FieldState;
//!
//! let engine = RuleEngine::new();
//! let spec = FieldSpec::new("Licence", 1).validation("digits|special=-");
//! let rules = engine.parse_rules(&spec);
//! assert_eq!(rules, vec![ValidatorRule::DigitsWithDash]);
//!
//! let errors = engine.validate(&FieldState::with_value("123--4"), &rules);
//! assert!(errors.contains(&ErrorKind::InvalidFormat));
//! ```

pub mod compiler;
pub mod config;
mod error;
pub mod form;
pub mod schema;
pub mod search;
pub mod session;
pub mod submission;
pub mod validation;

pub use compiler::{Compilation, FormCompiler};
pub use config::{FormConfig, NoticeTemplate, NotificationKind, SchemaPolicy};
pub use error::{ErrorKind, FieldErrors, FormError, Result};
pub use form::{FieldPath, FieldState, FormModel};
pub use schema::{FieldSpec, ProviderConfig, Schema, SchemaStore};
pub use search::{filter_names, FilterResult, SearchFilter};
pub use session::FormSession;
pub use submission::{
    CompletionHandle, Notification, Notifier, SubmissionController, SubmissionState,
    SubmitOutcome, SubmittedData, Transitions,
};
pub use validation::{RuleEngine, ValidatorRule};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::compiler::{Compilation, FormCompiler};
    pub use crate::config::{FormConfig, NoticeTemplate, NotificationKind, SchemaPolicy};
    pub use crate::error::{ErrorKind, FieldErrors, FormError, Result};
    pub use crate::form::{FieldPath, FieldState, FormModel};
    pub use crate::schema::{FieldSpec, ProviderConfig, Schema, SchemaStore};
    pub use crate::search::{FilterResult, SearchFilter};
    pub use crate::session::FormSession;
    pub use crate::submission::{
        CompletionHandle, Notification, Notifier, SubmissionController, SubmissionState,
        SubmitOutcome, SubmittedData, Transitions,
    };
    pub use crate::validation::{RuleEngine, ValidatorRule};
}
