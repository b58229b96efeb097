//! A form session: one schema, one current form, one submission controller.

use std::sync::Arc;

use tracing::debug;

use crate::compiler::FormCompiler;
use crate::config::FormConfig;
use crate::error::{FieldErrors, FormError, Result};
use crate::form::FormModel;
use crate::schema::{Schema, SchemaStore};
use crate::search::SearchFilter;
use crate::submission::{Notifier, SubmissionController, SubmitOutcome, Transitions};
use crate::validation::RuleEngine;

/// Ties the schema store, compiler, current form and submission together.
#[derive(Debug)]
pub struct FormSession {
    config: FormConfig,
    store: SchemaStore,
    engine: RuleEngine,
    compiler: FormCompiler,
    model: FormModel,
    controller: SubmissionController,
}

impl FormSession {
    /// Creates a session with no schema and an empty form.
    pub fn new(
        config: FormConfig,
        notifier: Arc<dyn Notifier>,
        transitions: Arc<dyn Transitions>,
    ) -> Self {
        let engine = RuleEngine::new();
        let controller = SubmissionController::new(&config, notifier, transitions);
        Self {
            config,
            store: SchemaStore::new(),
            engine,
            compiler: FormCompiler::new(engine),
            model: FormModel::new(),
            controller,
        }
    }

    /// Loads the session schema.
    pub fn load_schema(&mut self, schema: Schema) -> Result<()> {
        self.store.load(schema)
    }

    /// Parses a JSON schema document with the configured policy and loads it.
    pub fn load_schema_json(&mut self, json: &str) -> Result<()> {
        let schema = Schema::from_json(json, self.config.schema_policy)?;
        self.load_schema(schema)
    }

    /// Returns provider names in schema order.
    pub fn provider_names(&self) -> Vec<String> {
        self.store.get_provider_names()
    }

    /// Starts a debounced search over the provider names.
    ///
    /// Must be called from within a tokio runtime.
    pub fn search_filter(&self) -> SearchFilter {
        SearchFilter::spawn(self.provider_names(), self.config.search_debounce())
    }

    /// Rebuilds the form for `provider`, discarding all previous field state.
    ///
    /// An empty name resets the form. Returns the schema issues reported
    /// while compiling; the form is built regardless. An unknown provider
    /// leaves the current form untouched.
    pub fn select_provider(&mut self, provider: &str) -> Result<Vec<FormError>> {
        if provider.is_empty() {
            debug!("provider cleared; resetting form");
            self.model.reset();
            return Ok(Vec::new());
        }

        let config = self.store.get_provider_config(provider)?;
        let compilation = self.compiler.compile(config, provider);
        self.model = compilation.model;
        Ok(compilation.issues)
    }

    /// Returns the current form.
    pub fn model(&self) -> &FormModel {
        &self.model
    }

    /// Returns the rule engine.
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Returns the submission controller.
    pub fn controller(&self) -> &SubmissionController {
        &self.controller
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Sets a field value.
    pub fn set_value(&mut self, category: &str, label: &str, value: impl Into<String>) -> Result<()> {
        self.model.set_value(category, label, value)
    }

    /// Marks a field as touched.
    pub fn touch(&mut self, category: &str, label: &str) -> Result<()> {
        self.model.touch(category, label)
    }

    /// Re-validates one field.
    pub fn validate_field(&mut self, category: &str, label: &str) -> Result<&FieldErrors> {
        self.model.validate_field(&self.engine, category, label)
    }

    /// Submits the current form.
    pub fn submit(&mut self) -> SubmitOutcome {
        self.controller.submit(&mut self.model, &self.engine)
    }

    /// Waits until the accepted submission has finished its transition.
    pub async fn wait_submitted(&self) {
        self.controller.wait_submitted().await;
    }
}
