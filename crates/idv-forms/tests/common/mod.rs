#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use idv_forms::prelude::*;

pub const SCHEMA: &str = include_str!("../fixtures/idv_schema.json");

pub fn schema() -> Schema {
    Schema::from_json(SCHEMA, SchemaPolicy::Strict)
        .unwrap_or_else(|e| panic!("Fixture schema failed to load: {e}"))
}

/// How the recording transitions double reacts to an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnAccepted {
    /// Complete the handle immediately.
    Complete,
    /// Keep the handle until the test completes it.
    Hold,
}

/// Records notifications and transition calls.
pub struct Recorder {
    mode: OnAccepted,
    pub notices: Mutex<Vec<Notification>>,
    pub failed: Mutex<usize>,
    pub accepted: Mutex<usize>,
    pub held: Mutex<Option<CompletionHandle>>,
}

impl Recorder {
    pub fn new(mode: OnAccepted) -> Arc<Self> {
        Arc::new(Self {
            mode,
            notices: Mutex::new(Vec::new()),
            failed: Mutex::new(0),
            accepted: Mutex::new(0),
            held: Mutex::new(None),
        })
    }

    pub fn notices(&self) -> Vec<Notification> {
        self.notices.lock().unwrap().clone()
    }

    pub fn failed(&self) -> usize {
        *self.failed.lock().unwrap()
    }

    pub fn accepted(&self) -> usize {
        *self.accepted.lock().unwrap()
    }

    pub fn take_handle(&self) -> CompletionHandle {
        self.held
            .lock()
            .unwrap()
            .take()
            .expect("Expected a held completion handle")
    }
}

impl Notifier for Recorder {
    fn notify(&self, notification: Notification) {
        self.notices.lock().unwrap().push(notification);
    }
}

impl Transitions for Recorder {
    fn on_validation_failed(&self) {
        *self.failed.lock().unwrap() += 1;
    }

    fn on_accepted(&self, on_done: CompletionHandle) {
        *self.accepted.lock().unwrap() += 1;
        match self.mode {
            OnAccepted::Complete => on_done.complete(),
            OnAccepted::Hold => *self.held.lock().unwrap() = Some(on_done),
        }
    }
}

pub fn session(mode: OnAccepted) -> (FormSession, Arc<Recorder>) {
    let recorder = Recorder::new(mode);
    let mut session = FormSession::new(FormConfig::default(), recorder.clone(), recorder.clone());
    session
        .load_schema(schema())
        .unwrap_or_else(|e| panic!("Failed to load schema: {e}"));
    (session, recorder)
}

/// Fills every field of the TD Canada Trust form with valid values.
pub fn fill_td(session: &mut FormSession) {
    let values = [
        ("Driver's License", "License Number", "1234-5678-90"),
        ("Driver's License", "Province of Issue", "ON"),
        ("Driver's License", "Expiry Date", "2999-01-01"),
        ("Driver's License", "Date of Birth", "1990-05-17"),
        ("Social Insurance Number", "SIN", "046454286"),
    ];
    for (category, label, value) in values {
        session
            .set_value(category, label, value)
            .unwrap_or_else(|e| panic!("Failed to set {category}/{label}: {e}"));
    }
}
