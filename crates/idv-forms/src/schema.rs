//! Typed schema model and the store that holds it.
//!
//! A schema document maps provider names to categories, and each category to
//! an ordered list of field descriptions:
//!
//! ```json
//! { "<provider>": { "<category>": [ {"label": "...", "order": 1, "required": true, "validation": "digits"} ] } }
//! ```
//!
//! The document is checked once when it is parsed. Structural problems are
//! always fatal; a missing `order` or an empty category is fatal only under
//! [`SchemaPolicy::Strict`].

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::SchemaPolicy;
use crate::error::{FormError, Result};

/// Description of one field as declared in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Label, unique within its category.
    pub label: String,
    /// Sort key. `None` when the document carried no usable number.
    pub order: Option<i64>,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Composite rule string, e.g. `maxlength=10|digits`.
    pub validation: Option<String>,
}

impl FieldSpec {
    /// Creates a new optional field with the given label and order.
    pub fn new(label: impl Into<String>, order: i64) -> Self {
        Self {
            label: label.into(),
            order: Some(order),
            required: false,
            validation: None,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the rule string.
    #[must_use]
    pub fn validation(mut self, rules: impl Into<String>) -> Self {
        self.validation = Some(rules.into());
        self
    }
}

/// A named group of fields under a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
}

/// The categories declared for one provider, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    pub categories: Vec<Category>,
}

impl ProviderConfig {
    /// Creates an empty provider configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a category.
    #[must_use]
    pub fn category(mut self, name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        self.categories.push(Category {
            name: name.into(),
            fields,
        });
        self
    }

    /// Returns the category with the given name.
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }
}

/// A parsed schema: provider names mapped to their configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    providers: Vec<(String, ProviderConfig)>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider. A provider with the same name is replaced in place.
    #[must_use]
    pub fn provider(mut self, name: impl Into<String>, config: ProviderConfig) -> Self {
        let name = name.into();
        match self.providers.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = config,
            None => self.providers.push((name, config)),
        }
        self
    }

    /// Parses a JSON schema document.
    pub fn from_json(json: &str, policy: SchemaPolicy) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value, policy)
    }

    /// Parses an already decoded schema document.
    pub fn from_value(value: &Value, policy: SchemaPolicy) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| FormError::invalid_schema("$", "expected an object of providers"))?;

        let mut providers = Vec::with_capacity(root.len());
        for (name, provider) in root {
            let config = parse_provider(name, provider, policy)?;
            providers.push((name.clone(), config));
        }

        Ok(Self { providers })
    }

    /// Returns provider names in document order.
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the configuration for a provider.
    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, config)| config)
    }

    /// Returns the number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns whether the schema declares no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn parse_provider(name: &str, value: &Value, policy: SchemaPolicy) -> Result<ProviderConfig> {
    let categories = value
        .as_object()
        .ok_or_else(|| FormError::invalid_schema(name, "expected an object of categories"))?;

    let mut config = ProviderConfig::new();
    for (category, fields) in categories {
        let path = format!("{name}/{category}");
        let fields = parse_category(&path, fields, policy)?;
        config.categories.push(Category {
            name: category.clone(),
            fields,
        });
    }
    Ok(config)
}

fn parse_category(path: &str, value: &Value, policy: SchemaPolicy) -> Result<Vec<FieldSpec>> {
    let entries = value
        .as_array()
        .ok_or_else(|| FormError::invalid_schema(path, "expected an array of fields"))?;

    if entries.is_empty() {
        lenient_or_fail(policy, path, "category has no fields")?;
    }

    let mut labels = HashSet::new();
    let mut fields = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let field_path = format!("{path}[{index}]");
        let field = parse_field(&field_path, entry, policy)?;
        if !labels.insert(field.label.clone()) {
            return Err(FormError::invalid_schema(
                field_path,
                format!("duplicate label '{}'", field.label),
            ));
        }
        fields.push(field);
    }
    Ok(fields)
}

fn parse_field(path: &str, value: &Value, policy: SchemaPolicy) -> Result<FieldSpec> {
    let object = value
        .as_object()
        .ok_or_else(|| FormError::invalid_schema(path, "expected a field object"))?;

    let label = match object.get("label") {
        Some(Value::String(label)) => label.clone(),
        Some(_) => return Err(FormError::invalid_schema(path, "label must be a string")),
        None => return Err(FormError::invalid_schema(path, "missing label")),
    };

    let order = parse_order(object);
    if order.is_none() {
        lenient_or_fail(policy, path, "order is missing or not an integer")?;
    }

    let required = match object.get("required") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(required)) => *required,
        Some(_) => return Err(FormError::invalid_schema(path, "required must be a boolean")),
    };

    let validation = match object.get("validation") {
        None | Some(Value::Null) => None,
        Some(Value::String(rules)) => Some(rules.clone()),
        Some(_) => return Err(FormError::invalid_schema(path, "validation must be a string")),
    };

    Ok(FieldSpec {
        label,
        order,
        required,
        validation,
    })
}

fn parse_order(object: &Map<String, Value>) -> Option<i64> {
    let Value::Number(number) = object.get("order")? else {
        return None;
    };
    if let Some(order) = number.as_i64() {
        return Some(order);
    }
    // Accept integral floats such as `2.0`.
    number
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
        .map(|f| f as i64)
}

fn lenient_or_fail(policy: SchemaPolicy, path: &str, message: &str) -> Result<()> {
    match policy {
        SchemaPolicy::Strict => Err(FormError::invalid_schema(path, message)),
        SchemaPolicy::Lenient => {
            warn!(path, "{message}; keeping entry");
            Ok(())
        }
    }
}

/// Holds the session schema. A store is loaded at most once.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    schema: Option<Arc<Schema>>,
}

impl SchemaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the schema. Fails if a schema was already loaded.
    pub fn load(&mut self, schema: Schema) -> Result<()> {
        if self.schema.is_some() {
            return Err(FormError::SchemaAlreadyLoaded);
        }
        debug!(providers = schema.len(), "schema loaded");
        self.schema = Some(Arc::new(schema));
        Ok(())
    }

    /// Returns whether a schema has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.schema.is_some()
    }

    /// Returns the loaded schema.
    pub fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema.as_ref()
    }

    /// Returns provider names in document order, or an empty list before load.
    pub fn get_provider_names(&self) -> Vec<String> {
        self.schema
            .as_deref()
            .map(|schema| schema.provider_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Returns the configuration of a provider.
    pub fn get_provider_config(&self, name: &str) -> Result<&ProviderConfig> {
        let schema = self.schema.as_deref().ok_or(FormError::SchemaNotLoaded)?;
        schema
            .get(name)
            .ok_or_else(|| FormError::NotFound(name.to_string()))
    }
}
