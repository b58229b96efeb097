//! Builds a [`FormModel`] from a provider's schema configuration.

use tracing::{debug, warn};

use crate::error::{FormError, Result};
use crate::form::{FormCategory, FormField, FormModel};
use crate::schema::{Category, ProviderConfig};
use crate::validation::RuleEngine;

/// The outcome of compiling a provider configuration.
///
/// A category with no fields or with an unordered field is still built;
/// the problem is reported in `issues` as [`FormError::InvalidSchema`].
#[derive(Debug)]
pub struct Compilation {
    pub model: FormModel,
    pub issues: Vec<FormError>,
}

impl Compilation {
    /// Returns whether compilation reported no issues.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the model, or the first reported issue.
    pub fn into_result(mut self) -> Result<FormModel> {
        if self.issues.is_empty() {
            Ok(self.model)
        } else {
            Err(self.issues.swap_remove(0))
        }
    }
}

/// Compiles provider configurations into form models.
#[derive(Debug, Clone, Default)]
pub struct FormCompiler {
    engine: RuleEngine,
}

impl FormCompiler {
    /// Creates a compiler that assigns rules with `engine`.
    pub fn new(engine: RuleEngine) -> Self {
        Self { engine }
    }

    /// Builds a fresh form for `config`, keeping the provider selector value.
    ///
    /// Fields within a category are ordered by `order`; fields with equal
    /// order keep their declaration order.
    pub fn compile(&self, config: &ProviderConfig, selector_value: &str) -> Compilation {
        let mut model = FormModel::with_selector(selector_value);
        let mut issues = Vec::new();

        for category in &config.categories {
            let path = match model.selected_provider() {
                Some(provider) => format!("{provider}/{}", category.name),
                None => category.name.clone(),
            };
            model.push_category(self.compile_category(category, &path, &mut issues));
        }

        debug!(
            provider = model.selected_provider().unwrap_or_default(),
            categories = model.categories().len(),
            issues = issues.len(),
            "form compiled"
        );
        Compilation { model, issues }
    }

    fn compile_category(
        &self,
        category: &Category,
        path: &str,
        issues: &mut Vec<FormError>,
    ) -> FormCategory {
        let mut specs: Vec<_> = category.fields.iter().collect();

        if specs.is_empty() {
            issues.push(FormError::invalid_schema(path, "category has no fields"));
        } else if let Some(unordered) = specs.iter().find(|s| s.order.is_none()) {
            warn!(path, label = %unordered.label, "field has no numeric order; keeping declaration order");
            issues.push(FormError::invalid_schema(
                path,
                format!("field '{}' has no numeric order", unordered.label),
            ));
        } else {
            // `sort_by_key` is stable, so ties keep declaration order.
            specs.sort_by_key(|s| s.order);
        }

        let fields = specs
            .into_iter()
            .map(|spec| FormField::new(spec.label.clone(), spec.order, self.engine.parse_rules(spec)))
            .collect();

        FormCategory {
            name: category.name.clone(),
            fields,
        }
    }
}
