//! Interposing view with a redaction/substitution policy
//!
//! Models a hook sitting between an observer and the real source: it
//! forwards to the view it wraps, then drops redacted identities and swaps
//! substituted ones before the observer sees the result.

use super::honest::HonestView;
use super::{View, ViewInfo};
use crate::error::{CrossViewError, Result};
use crate::store::AuthorityStore;
use crate::types::{Record, RecordId};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// The policy an adversarial view applies, as inspectable data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionPolicy {
    /// Ids omitted from the projection
    pub redactions: IndexSet<RecordId>,

    /// id → record reported in place of the true one
    pub substitutions: IndexMap<RecordId, Record>,
}

impl RedactionPolicy {
    /// Apply the policy to a projection: redaction first, then substitution
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .filter(|r| !self.redactions.contains(&r.id))
            .map(|r| match self.substitutions.get(&r.id) {
                Some(replacement) => replacement.clone(),
                None => r,
            })
            .collect()
    }

    /// Whether the policy changes nothing
    pub fn is_empty(&self) -> bool {
        self.redactions.is_empty() && self.substitutions.is_empty()
    }
}

/// Compromised view: forwards to an inner view and rewrites its output
///
/// Policy state is private; it changes only through `hide`, `unhide`,
/// `substitute` and `clear_substitution`.
pub struct AdversarialView {
    inner: Arc<dyn View>,
    name: String,
    policy: RwLock<RedactionPolicy>,
}

impl AdversarialView {
    /// Create a hook over an honest view of `authority`, named "hooked"
    pub fn new(authority: Arc<AuthorityStore>) -> Self {
        Self::over(Arc::new(HonestView::new(authority)))
    }

    /// Create a hook over any existing view (hooks may be layered)
    pub fn over(inner: Arc<dyn View>) -> Self {
        Self {
            inner,
            name: "hooked".to_string(),
            policy: RwLock::new(RedactionPolicy::default()),
        }
    }

    /// Override the view name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Omit `id` from every projection; the id need not exist yet
    pub fn hide(&self, id: impl Into<RecordId>) {
        let id = id.into();
        let mut policy = self.policy.write().unwrap_or_else(PoisonError::into_inner);
        if policy.redactions.insert(id.clone()) {
            tracing::debug!(view = %self.name, id = %id, "Redaction installed");
        }
    }

    /// Stop omitting `id`; no-op if it was not hidden
    pub fn unhide(&self, id: impl Into<RecordId>) {
        let id = id.into();
        let mut policy = self.policy.write().unwrap_or_else(PoisonError::into_inner);
        if policy.redactions.shift_remove(&id) {
            tracing::debug!(view = %self.name, id = %id, "Redaction removed");
        }
    }

    /// Report `replacement` in place of the true record at `id`
    ///
    /// Fails without touching the policy if `replacement` belongs to another
    /// identity slot. Overwrites any earlier substitution for `id`.
    pub fn substitute(&self, id: impl Into<RecordId>, replacement: Record) -> Result<()> {
        let id = id.into();
        if replacement.id != id {
            return Err(CrossViewError::IdentityMismatch {
                slot: id,
                replacement: replacement.id,
            });
        }

        let mut policy = self.policy.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(
            view = %self.name,
            id = %id,
            label = %replacement.label,
            "Substitution installed"
        );
        policy.substitutions.insert(id, replacement);
        Ok(())
    }

    /// Remove the substitution for `id`; no-op if none exists
    pub fn clear_substitution(&self, id: impl Into<RecordId>) {
        let id = id.into();
        let mut policy = self.policy.write().unwrap_or_else(PoisonError::into_inner);
        if policy.substitutions.shift_remove(&id).is_some() {
            tracing::debug!(view = %self.name, id = %id, "Substitution removed");
        }
    }

    /// Copy of the current policy
    pub fn policy(&self) -> RedactionPolicy {
        self.policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `id` is currently hidden
    pub fn is_hidden(&self, id: &RecordId) -> bool {
        self.policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .redactions
            .contains(id)
    }
}

impl View for AdversarialView {
    fn project(&self) -> Vec<Record> {
        // Forward before taking our own lock
        let forwarded = self.inner.project();
        let policy = self.policy.read().unwrap_or_else(PoisonError::into_inner);
        policy.apply(forwarded)
    }

    fn project_from(&self, truth: Vec<Record>) -> Vec<Record> {
        let forwarded = self.inner.project_from(truth);
        let policy = self.policy.read().unwrap_or_else(PoisonError::into_inner);
        policy.apply(forwarded)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn info(&self) -> ViewInfo {
        let policy = self.policy.read().unwrap_or_else(PoisonError::into_inner);
        ViewInfo {
            name: self.name.clone(),
            adversarial: true,
            redactions: policy.redactions.len(),
            substitutions: policy.substitutions.len(),
        }
    }
}

impl std::fmt::Debug for AdversarialView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdversarialView")
            .field("name", &self.name)
            .field("inner", &self.inner.name())
            .field("policy", &self.policy())
            .finish()
    }
}
