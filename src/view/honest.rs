//! Pass-through view

use super::View;
use crate::store::AuthorityStore;
use crate::types::Record;
use std::sync::Arc;

/// Uncompromised view: reports exactly what the authority holds
///
/// The baseline against which adversarial views are measured.
#[derive(Debug, Clone)]
pub struct HonestView {
    authority: Arc<AuthorityStore>,
    name: String,
}

impl HonestView {
    /// Create an honest view named "honest"
    pub fn new(authority: Arc<AuthorityStore>) -> Self {
        Self {
            authority,
            name: "honest".to_string(),
        }
    }

    /// Override the view name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl View for HonestView {
    fn project(&self) -> Vec<Record> {
        self.project_from(self.authority.snapshot())
    }

    fn project_from(&self, truth: Vec<Record>) -> Vec<Record> {
        truth
    }

    fn name(&self) -> &str {
        &self.name
    }
}
