//! Runtime form state.
//!
//! A [`FormModel`] holds one [`FormField`] per schema field of the selected
//! provider, grouped by category, plus the provider selector which lives
//! outside every category and is always required.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{FieldErrors, FormError, Result};
use crate::validation::{RuleEngine, ValidatorRule};

/// Label of the provider selector control.
pub const PROVIDER_SELECTOR: &str = "selectedProvider";

/// The mutable state of one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    /// Current value.
    pub value: String,
    /// Whether the user has interacted with the field.
    pub touched: bool,
    /// Failures found by the last validation pass.
    pub errors: FieldErrors,
}

impl FieldState {
    /// Creates an empty, untouched state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an untouched state holding a value.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Returns whether the last validation pass found no failures.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the errors to display: none until the field is touched.
    pub fn visible_errors(&self) -> Option<&FieldErrors> {
        (self.touched && !self.errors.is_empty()).then_some(&self.errors)
    }
}

/// A field of the compiled form: its rules and its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: String,
    /// Sort key from the schema, if any.
    pub order: Option<i64>,
    pub rules: Vec<ValidatorRule>,
    pub state: FieldState,
}

impl FormField {
    /// Creates a field with an empty state.
    pub fn new(label: impl Into<String>, order: Option<i64>, rules: Vec<ValidatorRule>) -> Self {
        Self {
            label: label.into(),
            order,
            rules,
            state: FieldState::new(),
        }
    }

    /// Re-runs the field's rules and stores the result.
    pub fn validate_at(&mut self, engine: &RuleEngine, now: DateTime<Utc>) -> &FieldErrors {
        self.state.errors = engine.validate_at(&self.state, &self.rules, now);
        &self.state.errors
    }
}

/// The fields of one category, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCategory {
    pub name: String,
    pub fields: Vec<FormField>,
}

impl FormCategory {
    /// Returns the field with the given label.
    pub fn field(&self, label: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.label == label)
    }

    /// Returns field labels in display order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.label.as_str())
    }
}

/// Location of a field in the form. The provider selector has no category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    pub category: Option<String>,
    pub label: String,
}

impl FieldPath {
    fn selector() -> Self {
        Self {
            category: None,
            label: PROVIDER_SELECTOR.to_string(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{category}/{}", self.label),
            None => f.write_str(&self.label),
        }
    }
}

/// The form currently presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormModel {
    selected_provider: Option<String>,
    selector: FormField,
    categories: Vec<FormCategory>,
}

impl Default for FormModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FormModel {
    /// Creates a form holding only an empty provider selector.
    pub fn new() -> Self {
        Self::with_selector("")
    }

    /// Creates a form whose provider selector holds `value`.
    pub fn with_selector(value: &str) -> Self {
        let mut selector = FormField::new(PROVIDER_SELECTOR, None, vec![ValidatorRule::Required]);
        selector.state.value = value.to_string();
        Self {
            selected_provider: (!value.is_empty()).then(|| value.to_string()),
            selector,
            categories: Vec::new(),
        }
    }

    pub(crate) fn push_category(&mut self, category: FormCategory) {
        self.categories.push(category);
    }

    /// Returns the provider this form was built for.
    pub fn selected_provider(&self) -> Option<&str> {
        self.selected_provider.as_deref()
    }

    /// Returns the provider selector control.
    pub fn provider_selector(&self) -> &FormField {
        &self.selector
    }

    /// Returns the categories in schema order.
    pub fn categories(&self) -> &[FormCategory] {
        &self.categories
    }

    /// Returns a category by name.
    pub fn category(&self, name: &str) -> Option<&FormCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Returns a field by category and label.
    pub fn field(&self, category: &str, label: &str) -> Option<&FormField> {
        self.category(category)?.field(label)
    }

    fn field_mut(&mut self, category: &str, label: &str) -> Result<&mut FormField> {
        let group = self
            .categories
            .iter_mut()
            .find(|c| c.name == category)
            .ok_or_else(|| FormError::CategoryNotFound(category.to_string()))?;
        group
            .fields
            .iter_mut()
            .find(|f| f.label == label)
            .ok_or_else(|| FormError::FieldNotFound {
                category: category.to_string(),
                label: label.to_string(),
            })
    }

    fn fields_mut(&mut self) -> impl Iterator<Item = &mut FormField> {
        std::iter::once(&mut self.selector).chain(
            self.categories
                .iter_mut()
                .flat_map(|c| c.fields.iter_mut()),
        )
    }

    /// Replaces the value of a field.
    pub fn set_value(&mut self, category: &str, label: &str, value: impl Into<String>) -> Result<()> {
        self.field_mut(category, label)?.state.value = value.into();
        Ok(())
    }

    /// Marks a field as touched.
    pub fn touch(&mut self, category: &str, label: &str) -> Result<()> {
        self.field_mut(category, label)?.state.touched = true;
        Ok(())
    }

    /// Marks every field, the provider selector included, as touched.
    pub fn mark_all_touched(&mut self) {
        for field in self.fields_mut() {
            field.state.touched = true;
        }
    }

    /// Re-validates one field and returns its errors.
    pub fn validate_field(
        &mut self,
        engine: &RuleEngine,
        category: &str,
        label: &str,
    ) -> Result<&FieldErrors> {
        let now = Utc::now();
        Ok(self.field_mut(category, label)?.validate_at(engine, now))
    }

    /// Re-validates every field at `now` and returns the number of invalid fields.
    pub fn validate_all_at(&mut self, engine: &RuleEngine, now: DateTime<Utc>) -> usize {
        let mut invalid = 0;
        for field in self.fields_mut() {
            if !field.validate_at(engine, now).is_empty() {
                invalid += 1;
            }
        }
        invalid
    }

    /// Re-validates every field at the current moment.
    pub fn validate_all(&mut self, engine: &RuleEngine) -> usize {
        self.validate_all_at(engine, Utc::now())
    }

    /// Returns whether the last validation pass left every field valid.
    pub fn is_valid(&self) -> bool {
        self.selector.state.is_valid()
            && self
                .categories
                .iter()
                .flat_map(|c| c.fields.iter())
                .all(|f| f.state.is_valid())
    }

    /// Returns the fields that failed the last validation pass.
    pub fn invalid_fields(&self) -> Vec<FieldPath> {
        let mut invalid = Vec::new();
        if !self.selector.state.is_valid() {
            invalid.push(FieldPath::selector());
        }
        for category in &self.categories {
            for field in category.fields.iter().filter(|f| !f.state.is_valid()) {
                invalid.push(FieldPath {
                    category: Some(category.name.clone()),
                    label: field.label.clone(),
                });
            }
        }
        invalid
    }

    /// Returns the errors the user should currently see, per field.
    pub fn visible_errors(&self) -> Vec<(FieldPath, &FieldErrors)> {
        let mut visible = Vec::new();
        if let Some(errors) = self.selector.state.visible_errors() {
            visible.push((FieldPath::selector(), errors));
        }
        for category in &self.categories {
            for field in &category.fields {
                if let Some(errors) = field.state.visible_errors() {
                    let path = FieldPath {
                        category: Some(category.name.clone()),
                        label: field.label.clone(),
                    };
                    visible.push((path, errors));
                }
            }
        }
        visible
    }

    /// Drops every category and clears the provider selector.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
