//! Submission lifecycle.
//!
//! ```text
//! Idle -> Validating -> RejectedInvalid -> Idle
//!                    -> Accepted -> Transitioning -> Submitted
//! ```
//!
//! On acceptance the controller hands a [`CompletionHandle`] to the
//! [`Transitions`] collaborator and stays in `Transitioning` until the
//! handle is completed. No new submission is accepted meanwhile.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{FormConfig, NoticeTemplate, NotificationKind};
use crate::form::{FieldPath, FormModel};
use crate::validation::RuleEngine;

/// States of the submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionState {
    Idle,
    Validating,
    RejectedInvalid,
    Accepted,
    Transitioning,
    Submitted,
}

impl SubmissionState {
    /// Returns whether a submission is in flight.
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Validating | Self::Transitioning)
    }
}

/// A message for the user, rendered by a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub duration: Duration,
}

impl Notification {
    fn from_template(template: &NoticeTemplate, kind: NotificationKind) -> Self {
        Self {
            message: template.message.clone(),
            kind,
            duration: template.duration(),
        }
    }
}

/// Displays notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Runs the presentation effects of a submission outcome.
pub trait Transitions: Send + Sync {
    /// Called when a submission is rejected. Must not block.
    fn on_validation_failed(&self);

    /// Called when a submission is accepted. The collaborator must call
    /// [`CompletionHandle::complete`] when its effect has finished.
    fn on_accepted(&self, on_done: CompletionHandle);
}

/// One-shot completion callback for an accepted submission.
///
/// Completing consumes the handle, so it can fire at most once.
#[must_use = "the submission stays in `Transitioning` until the handle is completed"]
pub struct CompletionHandle {
    state: Arc<watch::Sender<SubmissionState>>,
    done: bool,
}

impl CompletionHandle {
    /// Signals that the transition finished; the submission becomes `Submitted`.
    pub fn complete(mut self) {
        self.done = true;
        self.state.send_replace(SubmissionState::Submitted);
        debug!("submission transition completed");
    }
}

impl fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        if !self.done {
            warn!("completion handle dropped without completing; submission stays in Transitioning");
        }
    }
}

/// Immutable snapshot of an accepted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedData {
    /// Key of the provider selector in [`SubmittedData::to_json`].
    pub selector_label: String,
    pub provider: String,
    /// Values per category, in form order.
    pub categories: Vec<(String, Vec<(String, String)>)>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmittedData {
    fn snapshot(model: &FormModel, selector_label: &str, submitted_at: DateTime<Utc>) -> Self {
        let categories = model
            .categories()
            .iter()
            .map(|category| {
                let values = category
                    .fields
                    .iter()
                    .map(|f| (f.label.clone(), f.state.value.clone()))
                    .collect();
                (category.name.clone(), values)
            })
            .collect();
        Self {
            selector_label: selector_label.to_string(),
            provider: model.provider_selector().state.value.clone(),
            categories,
            submitted_at,
        }
    }

    /// Returns the value of a field.
    pub fn value(&self, category: &str, label: &str) -> Option<&str> {
        let (_, values) = self.categories.iter().find(|(name, _)| name == category)?;
        values
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the snapshot as `{selector: provider, category: {label: value}}`.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        root.insert(self.selector_label.clone(), Value::String(self.provider.clone()));
        for (category, values) in &self.categories {
            let group: Map<String, Value> = values
                .iter()
                .map(|(label, value)| (label.clone(), Value::String(value.clone())))
                .collect();
            root.insert(category.clone(), Value::Object(group));
        }
        Value::Object(root)
    }
}

/// Result of a call to [`SubmissionController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission was already in flight; nothing happened.
    Ignored,
    /// Validation failed on these fields.
    Rejected(Vec<FieldPath>),
    /// Validation passed; the transition is running.
    Accepted(Arc<SubmittedData>),
}

/// Drives validation and the outcome of form submissions.
pub struct SubmissionController {
    state: Arc<watch::Sender<SubmissionState>>,
    notifier: Arc<dyn Notifier>,
    transitions: Arc<dyn Transitions>,
    rejection_notice: NoticeTemplate,
    acceptance_notice: NoticeTemplate,
    selector_label: String,
    submitted: Option<Arc<SubmittedData>>,
    trail: Vec<SubmissionState>,
}

impl fmt::Debug for SubmissionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionController")
            .field("state", &self.state())
            .field("submitted", &self.submitted)
            .field("trail", &self.trail)
            .finish_non_exhaustive()
    }
}

impl SubmissionController {
    /// Creates an idle controller.
    pub fn new(
        config: &FormConfig,
        notifier: Arc<dyn Notifier>,
        transitions: Arc<dyn Transitions>,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            state: Arc::new(state),
            notifier,
            transitions,
            rejection_notice: config.rejection_notice.clone(),
            acceptance_notice: config.acceptance_notice.clone(),
            selector_label: config.provider_selector_label.clone(),
            submitted: None,
            trail: Vec::new(),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> SubmissionState {
        *self.state.borrow()
    }

    /// Returns a receiver that observes state changes.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Returns the states entered by the latest `submit` call, in order.
    pub fn trail(&self) -> &[SubmissionState] {
        &self.trail
    }

    /// Returns the snapshot of the latest accepted submission.
    pub fn submitted_data(&self) -> Option<&Arc<SubmittedData>> {
        self.submitted.as_ref()
    }

    fn enter(&mut self, next: SubmissionState) {
        debug!(from = ?self.state(), to = ?next, "submission state");
        self.state.send_replace(next);
        self.trail.push(next);
    }

    /// Validates the whole form and drives the outcome.
    pub fn submit(&mut self, model: &mut FormModel, engine: &RuleEngine) -> SubmitOutcome {
        self.submit_at(model, engine, Utc::now())
    }

    /// Like [`submit`](Self::submit), validating date rules against `now`.
    pub fn submit_at(
        &mut self,
        model: &mut FormModel,
        engine: &RuleEngine,
        now: DateTime<Utc>,
    ) -> SubmitOutcome {
        if self.state().is_busy() {
            debug!(state = ?self.state(), "submission already in flight; ignoring");
            return SubmitOutcome::Ignored;
        }

        self.trail.clear();
        self.enter(SubmissionState::Validating);
        model.mark_all_touched();
        let invalid = model.validate_all_at(engine, now);

        if invalid > 0 {
            self.enter(SubmissionState::RejectedInvalid);
            let fields = model.invalid_fields();
            info!(invalid, "submission rejected");
            self.notifier.notify(Notification::from_template(
                &self.rejection_notice,
                NotificationKind::Error,
            ));
            self.transitions.on_validation_failed();
            self.enter(SubmissionState::Idle);
            return SubmitOutcome::Rejected(fields);
        }

        self.enter(SubmissionState::Accepted);
        let data = Arc::new(SubmittedData::snapshot(model, &self.selector_label, now));
        self.submitted = Some(Arc::clone(&data));
        info!(provider = %data.provider, "submission accepted");
        self.notifier.notify(Notification::from_template(
            &self.acceptance_notice,
            NotificationKind::Success,
        ));

        self.enter(SubmissionState::Transitioning);
        self.transitions.on_accepted(CompletionHandle {
            state: Arc::clone(&self.state),
            done: false,
        });
        SubmitOutcome::Accepted(data)
    }

    /// Waits until the submission reaches `Submitted`.
    pub async fn wait_submitted(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel stays open while we wait.
        let _ = rx.wait_for(|state| *state == SubmissionState::Submitted).await;
    }
}
