//! # Study Container
//!
//! A `Study` groups the calculations of one job. Studies serialize to
//! human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Study
//! ├── meta: StudyMetadata (schema version, engineer, job info, timestamps)
//! ├── settings: NetworkSettings (voltages, grid fault level)
//! └── items: HashMap<Uuid, CalculationItem>
//! ```
//!
//! The coordination policy is not stored in the study; it is supplied when
//! items are run, so the same study can be checked against different
//! policies.
//!
//! ## Example
//!
//! ```rust
//! use cabina_core::calculations::{CalculationItem, SubstationInput};
//! use cabina_core::calculations::selectivity::CoordinationPolicy;
//! use cabina_core::study::Study;
//!
//! let mut study = Study::new("Jane Engineer", "26-014", "ACME Srl");
//! study.add_item(CalculationItem::Substation(SubstationInput::for_load("Cabina 1", 500.0)));
//!
//! let runs = study.run_all(&CoordinationPolicy::default());
//! assert!(runs[0].error.is_none());
//!
//! let json = study.to_json().unwrap();
//! let loaded = Study::from_json(&json).unwrap();
//! assert_eq!(loaded.item_count(), 1);
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calculations::selectivity::CoordinationPolicy;
use crate::calculations::{CalculationItem, CalculationOutput};
use crate::config::{CabinaConfig, NetworkSettings};
use crate::errors::{CalcError, CalcResult};

/// Current schema version for study files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root study container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub meta: StudyMetadata,

    /// Network data shared by every item
    #[serde(default)]
    pub settings: NetworkSettings,

    /// All calculation items, keyed by UUID
    #[serde(default)]
    pub items: HashMap<Uuid, CalculationItem>,
}

/// Study metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub engineer: String,
    pub job_id: String,
    pub client: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Outcome of running one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRun {
    pub id: Uuid,
    pub label: String,
    pub calc_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CalculationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CalcError>,
}

impl Study {
    /// Create a new empty study.
    ///
    /// ```rust
    /// use cabina_core::study::Study;
    ///
    /// let study = Study::new("John Doe", "26-001", "Client Srl");
    /// assert_eq!(study.meta.engineer, "John Doe");
    /// ```
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Study {
            meta: StudyMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: NetworkSettings::default(),
            items: HashMap::new(),
        }
    }

    /// Add a calculation item, returning its UUID.
    pub fn add_item(&mut self, item: CalculationItem) -> Uuid {
        let id = Uuid::new_v4();
        self.items.insert(id, item);
        self.touch();
        id
    }

    /// Remove a calculation item by UUID.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<CalculationItem> {
        let item = self.items.remove(id);
        if item.is_some() {
            self.touch();
        }
        item
    }

    pub fn get_item(&self, id: &Uuid) -> Option<&CalculationItem> {
        self.items.get(id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    fn config(&self, policy: &CoordinationPolicy) -> CabinaConfig {
        CabinaConfig {
            network: self.settings.clone(),
            coordination: policy.clone(),
        }
    }

    /// Run one item with the study network and the given policy.
    pub fn run_item(&self, id: &Uuid, policy: &CoordinationPolicy) -> CalcResult<CalculationOutput> {
        let item = self
            .items
            .get(id)
            .ok_or_else(|| CalcError::missing_field(format!("items.{}", id)))?;
        item.run(&self.config(policy))
    }

    /// Run every item, ordered by label then UUID.
    ///
    /// A failing item does not stop the others; its error is recorded in
    /// the returned [`ItemRun`].
    pub fn run_all(&self, policy: &CoordinationPolicy) -> Vec<ItemRun> {
        let config = self.config(policy);
        let mut entries: Vec<_> = self.items.iter().collect();
        entries.sort_by(|a, b| a.1.label().cmp(b.1.label()).then(a.0.cmp(b.0)));

        entries
            .into_iter()
            .map(|(id, item)| {
                let (output, error) = match item.run(&config) {
                    Ok(output) => (Some(output), None),
                    Err(e) => {
                        warn!(label = item.label(), code = e.error_code(), "study item failed: {}", e);
                        (None, Some(e))
                    }
                };
                ItemRun {
                    id: *id,
                    label: item.label().to_string(),
                    calc_type: item.calc_type().to_string(),
                    output,
                    error,
                }
            })
            .collect()
    }

    /// Parse a study, checking the schema version.
    pub fn from_json(source: &str) -> CalcResult<Self> {
        let study: Study = serde_json::from_str(source).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid study JSON: {}", e),
        })?;
        validate_version(&study.meta.version)?;
        debug!(job_id = %study.meta.job_id, items = study.items.len(), "study loaded");
        Ok(study)
    }

    pub fn to_json(&self) -> CalcResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CalcError::SerializationError {
            reason: e.to_string(),
        })
    }
}

impl Default for Study {
    fn default() -> Self {
        Study::new("", "", "")
    }
}

fn parse_version(version: &str) -> Option<Vec<u32>> {
    version.split('.').map(|p| p.parse().ok()).collect()
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let file = parse_version(file_version).ok_or_else(mismatch)?;
    let current = parse_version(SCHEMA_VERSION).ok_or_else(mismatch)?;
    if file.len() < 2 || current.len() < 2 {
        return Err(mismatch());
    }

    // Major version must match
    if file[0] != current[0] {
        return Err(mismatch());
    }
    // 0.x: a newer minor may carry breaking changes
    if current[0] == 0 && file[1] > current[1] {
        return Err(mismatch());
    }
    Ok(())
}
