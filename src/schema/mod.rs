//! Schema normalization
//!
//! Resolves logical fields (customer identifier, churn label, numeric and
//! categorical attributes) against the concrete column names of a dataset.
//! The accepted spellings live in a declarative [`AliasTable`]; a single
//! resolver walks it, so supporting a new source schema is a data change.

mod partition;

pub use partition::FeaturePartition;

use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Role a logical field plays in training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// Customer identifier, used to label predictions
    Identifier,
    /// Churn label
    Target,
    /// Numeric attribute (median-imputed, standardized)
    Numeric,
    /// Categorical attribute (mode-imputed, one-hot encoded)
    Categorical,
}

/// One logical field and its accepted column names, in priority order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub role: FieldRole,
    pub aliases: Vec<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, role: FieldRole, aliases: &[&str]) -> Self {
        Self {
            name: name.into(),
            role,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Declarative table of logical field -> accepted column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasTable {
    pub fields: Vec<FieldSpec>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::telco()
    }
}

impl AliasTable {
    /// Empty table
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Telco customer churn layout, accepting both PascalCase and snake_case exports
    pub fn telco() -> Self {
        use FieldRole::*;
        Self::new()
            .with_field(FieldSpec::new("customer_id", Identifier, &["CustomerID", "customerID", "customer_id"]))
            .with_field(FieldSpec::new("gender", Categorical, &["Gender", "gender"]))
            .with_field(FieldSpec::new("senior_citizen", Categorical, &["SeniorCitizen", "senior_citizen"]))
            .with_field(FieldSpec::new("partner", Categorical, &["Partner", "partner"]))
            .with_field(FieldSpec::new("dependents", Categorical, &["Dependents", "dependents"]))
            .with_field(FieldSpec::new("tenure", Numeric, &["Tenure", "tenure"]))
            .with_field(FieldSpec::new("phone_service", Categorical, &["PhoneService", "phone_service"]))
            .with_field(FieldSpec::new("multiple_lines", Categorical, &["MultipleLines", "multiple_lines"]))
            .with_field(FieldSpec::new("internet_service", Categorical, &["InternetService", "internet_service"]))
            .with_field(FieldSpec::new("online_security", Categorical, &["OnlineSecurity", "online_security"]))
            .with_field(FieldSpec::new("online_backup", Categorical, &["OnlineBackup", "online_backup"]))
            .with_field(FieldSpec::new("device_protection", Categorical, &["DeviceProtection", "device_protection"]))
            .with_field(FieldSpec::new("tech_support", Categorical, &["TechSupport", "tech_support"]))
            .with_field(FieldSpec::new("streaming_tv", Categorical, &["StreamingTV", "streaming_tv"]))
            .with_field(FieldSpec::new("streaming_movies", Categorical, &["StreamingMovies", "streaming_movies"]))
            .with_field(FieldSpec::new("contract", Categorical, &["Contract", "contract"]))
            .with_field(FieldSpec::new("paperless_billing", Categorical, &["PaperlessBilling", "paperless_billing"]))
            .with_field(FieldSpec::new("payment_method", Categorical, &["PaymentMethod", "payment_method"]))
            .with_field(FieldSpec::new("monthly_charges", Numeric, &["MonthlyCharges", "monthly_charges"]))
            .with_field(FieldSpec::new("total_charges", Numeric, &["TotalCharges", "total_charges"]))
            .with_field(FieldSpec::new("churn", Target, &["Churn", "churn", "is_churned"]))
    }

    /// Builder method to append a field
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Load a table from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let table: Self = serde_json::from_str(&json)?;
        table.validate()?;
        Ok(table)
    }

    /// A table needs exactly one target field and at most one identifier
    pub fn validate(&self) -> Result<()> {
        let targets = self.fields.iter().filter(|f| f.role == FieldRole::Target).count();
        if targets != 1 {
            return Err(ChurnError::ConfigError(format!(
                "alias table must declare exactly one target field, found {}",
                targets
            )));
        }
        let ids = self.fields.iter().filter(|f| f.role == FieldRole::Identifier).count();
        if ids > 1 {
            return Err(ChurnError::ConfigError(format!(
                "alias table declares {} identifier fields",
                ids
            )));
        }
        Ok(())
    }

    fn target_field(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.role == FieldRole::Target)
    }
}

/// A logical field resolved against a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub name: String,
    pub role: FieldRole,
    /// Concrete column name, `None` when no alias matched
    pub column: Option<String>,
}

/// Logical field -> concrete column, built once per dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaMapping {
    fields: Vec<ResolvedField>,
}

impl SchemaMapping {
    /// Column resolved for a logical field
    pub fn get(&self, logical: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == logical)
            .and_then(|f| f.column.as_deref())
    }

    /// Resolved identifier column, if any
    pub fn identifier(&self) -> Option<&str> {
        self.first_with_role(FieldRole::Identifier)
    }

    /// Resolved churn column, if any
    pub fn target(&self) -> Option<&str> {
        self.first_with_role(FieldRole::Target)
    }

    /// Resolved numeric columns in table order
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.role == FieldRole::Numeric)
            .filter_map(|f| f.column.as_deref())
            .collect()
    }

    fn first_with_role(&self, role: FieldRole) -> Option<&str> {
        self.fields
            .iter()
            .filter(|f| f.role == role)
            .find_map(|f| f.column.as_deref())
    }
}

/// Map every logical field to the first alias present in `columns`.
///
/// Never fails; fields with no matching alias are marked absent.
pub fn map_columns(columns: &[String], table: &AliasTable) -> SchemaMapping {
    let fields = table
        .fields
        .iter()
        .map(|spec| ResolvedField {
            name: spec.name.clone(),
            role: spec.role,
            column: spec
                .aliases
                .iter()
                .find(|alias| columns.iter().any(|c| c == *alias))
                .cloned(),
        })
        .collect();
    SchemaMapping { fields }
}

/// Resolve a training schema. The churn field is mandatory.
pub fn resolve(columns: &[String], table: &AliasTable) -> Result<SchemaMapping> {
    let mapping = map_columns(columns, table);
    if mapping.target().is_none() {
        let tried = table
            .target_field()
            .map(|f| f.aliases.clone())
            .unwrap_or_default();
        return Err(ChurnError::MissingTargetColumn { tried });
    }
    Ok(mapping)
}
