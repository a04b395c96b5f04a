//! Scenario configuration — declare a ground truth and an attack as data
//!
//! A `ScenarioConfig` lists the records the authority starts with and the
//! policy the hooked view applies. Configs load from JSON and build into a
//! live `Scenario`. Built-in configs reproduce the classic state-hiding
//! cases: process unlinking, routine patching, alert suppression and
//! service interposition.

use crate::audit::Auditor;
use crate::error::{CrossViewError, Result};
use crate::store::AuthorityStore;
use crate::types::{Record, RecordId};
use crate::view::adversarial::AdversarialView;
use crate::view::honest::HonestView;
use crate::view::View;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Declarative description of one audit scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioConfig {
    /// Scenario name, used for logging
    pub name: String,

    /// Initial ground truth, in order
    pub records: Vec<Record>,

    /// Ids the hooked view hides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hide: Vec<RecordId>,

    /// Records the hooked view reports in place of the true ones,
    /// each keyed by its own id
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substitute: Vec<Record>,
}

impl ScenarioConfig {
    /// Parse a scenario from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a scenario from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CrossViewError::Config(format!(
                "Failed to read scenario file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: ScenarioConfig = serde_json::from_str(&json).map_err(|e| {
            CrossViewError::Config(format!(
                "Failed to parse scenario file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            path = %path.display(),
            scenario = %config.name,
            records = config.records.len(),
            "Scenario loaded"
        );
        Ok(config)
    }

    /// Create the authority and views this config describes
    pub fn build(&self) -> Result<Scenario> {
        if self.name.is_empty() {
            return Err(CrossViewError::Config(
                "Scenario name cannot be empty".to_string(),
            ));
        }

        let authority = Arc::new(AuthorityStore::with_records(self.records.iter().cloned())?);
        let honest = Arc::new(HonestView::new(Arc::clone(&authority)));
        let hooked = Arc::new(AdversarialView::new(Arc::clone(&authority)));

        for id in &self.hide {
            hooked.hide(id.clone());
        }
        for replacement in &self.substitute {
            hooked.substitute(replacement.id.clone(), replacement.clone())?;
        }

        tracing::info!(
            scenario = %self.name,
            records = authority.len(),
            hidden = self.hide.len(),
            substituted = self.substitute.len(),
            "Scenario built"
        );

        Ok(Scenario {
            name: self.name.clone(),
            authority,
            honest,
            hooked,
        })
    }

    /// Process table with pid 3 unlinked from the visible list
    pub fn process_hiding() -> Self {
        Self {
            name: "process-hiding".to_string(),
            records: vec![
                Record::process(1, "system", true),
                Record::process(2, "svchost", true),
                Record::process(3, "malicious", true),
                Record::process(4, "explorer", true),
            ],
            hide: vec![RecordId::Numeric(3)],
            substitute: Vec::new(),
        }
    }

    /// Integrity routine whose slot has been patched
    pub fn routine_substitution() -> Self {
        Self {
            name: "routine-substitution".to_string(),
            records: vec![Record::routine("integrity-routine", "original")],
            hide: Vec::new(),
            substitute: vec![Record::routine("integrity-routine", "patched")],
        }
    }

    /// Three alerts, one filtered out by a hooked alert service
    pub fn alert_suppression() -> Self {
        Self {
            name: "alert-suppression".to_string(),
            records: vec![
                Record::alert("WARNING: suspicious process detected"),
                Record::alert("WARNING: unsigned driver loaded"),
                Record::alert("WARNING: anomalous network activity observed"),
            ],
            hide: vec![RecordId::from("WARNING: suspicious process detected")],
            substitute: Vec::new(),
        }
    }

    /// Security status service whose hooked version always reports OK
    pub fn status_interposition() -> Self {
        Self {
            name: "status-interposition".to_string(),
            records: vec![Record::new(
                "security-status",
                "WARNING - suspicious activity detected",
            )],
            hide: Vec::new(),
            substitute: vec![Record::new("security-status", "OK - no issues detected")],
        }
    }
}

/// A built scenario: one authority, an honest view and a hooked view
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub authority: Arc<AuthorityStore>,
    pub honest: Arc<HonestView>,
    pub hooked: Arc<AdversarialView>,
}

impl Scenario {
    /// Auditor over this scenario's authority with both views registered
    pub fn auditor(&self) -> Result<Auditor> {
        Auditor::new(Arc::clone(&self.authority))
            .with_view(Arc::clone(&self.honest) as Arc<dyn View>)?
            .with_view(Arc::clone(&self.hooked) as Arc<dyn View>)
    }
}
