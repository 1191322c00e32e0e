use crate::models::{Category, Fluids, Formula, Minerals, Nutrients};
use crate::services::postgres::{PostgresClient, PostgresError, ReferenceTable};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading formula reference data
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read reference data: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse reference data: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Reference data refers to unknown formula {0}")]
    UnknownFormula(i64),

    #[error("Reference data refers to unknown category {0}")]
    UnknownCategory(i64),

    #[error("Database error: {0}")]
    DatabaseError(#[from] PostgresError),
}

/// Contents of the reference data file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub formulas: Vec<Formula>,
    #[serde(default)]
    pub nutrients: Vec<Nutrients>,
    #[serde(default)]
    pub minerals: Vec<Minerals>,
    #[serde(default)]
    pub fluids: Vec<Fluids>,
}

impl ReferenceData {
    /// Parse and check that formulas point at listed categories and
    /// composition rows at listed formulas
    pub fn from_toml_str(contents: &str) -> Result<Self, SeedError> {
        let data: ReferenceData = toml::from_str(contents)?;

        for category_id in data.formulas.iter().filter_map(|f| f.category_id) {
            if !data.categories.iter().any(|c| c.id == category_id) {
                return Err(SeedError::UnknownCategory(category_id));
            }
        }

        let known = |id: i64| data.formulas.iter().any(|f| f.id == id);
        let referenced = data
            .nutrients
            .iter()
            .map(|n| n.formula_id)
            .chain(data.minerals.iter().map(|m| m.formula_id))
            .chain(data.fluids.iter().map(|f| f.formula_id));

        for formula_id in referenced {
            if !known(formula_id) {
                return Err(SeedError::UnknownFormula(formula_id));
            }
        }

        Ok(data)
    }

    /// Read the reference data file; a missing file yields `None`
    pub async fn load(path: impl AsRef<Path>) -> Result<Option<Self>, SeedError> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Self::from_toml_str(&contents).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Reference data file {} not found, skipping seed", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Rows inserted per reference table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: u64,
    pub formulas: u64,
    pub nutrients: u64,
    pub minerals: u64,
    pub fluids: u64,
}

/// Populate each reference table that is currently empty
///
/// Tables that already hold rows are left untouched, so restarting the
/// service never duplicates or overwrites reference data.
pub async fn seed_reference_data(
    postgres: &PostgresClient,
    data: &ReferenceData,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    // Parents first so foreign keys resolve
    if is_empty(postgres, ReferenceTable::Categories).await? {
        report.categories = postgres.insert_categories(&data.categories).await?;
    }
    if is_empty(postgres, ReferenceTable::Formulas).await? {
        report.formulas = postgres.insert_formulas(&data.formulas).await?;
    }
    if is_empty(postgres, ReferenceTable::Nutrients).await? {
        report.nutrients = postgres.insert_nutrients(&data.nutrients).await?;
    }
    if is_empty(postgres, ReferenceTable::Minerals).await? {
        report.minerals = postgres.insert_minerals(&data.minerals).await?;
    }
    if is_empty(postgres, ReferenceTable::Fluids).await? {
        report.fluids = postgres.insert_fluids(&data.fluids).await?;
    }

    tracing::info!("Reference data seeded: {:?}", report);

    Ok(report)
}

async fn is_empty(postgres: &PostgresClient, table: ReferenceTable) -> Result<bool, PostgresError> {
    let count = postgres.reference_count(table).await?;
    if count > 0 {
        tracing::debug!("Table {} already has {} rows, not seeding", table.name(), count);
    }
    Ok(count == 0)
}
