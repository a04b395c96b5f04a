//! View trait — the capability every projection of ground truth implements
//!
//! A view reads the authority and reports what some observer would see.
//! `HonestView` passes truth through; `AdversarialView` interposes a
//! redaction/substitution policy, optionally on top of another view.

use crate::types::Record;
use serde::Serialize;

pub mod adversarial;
pub mod honest;

/// Core trait for projections of an `AuthorityStore`
///
/// Implementations must never introduce identities the authority does not
/// hold and must never repeat an identity; the `Auditor` treats either as an
/// integrity violation.
pub trait View: Send + Sync {
    /// Produce the ordered sequence of records this view reports
    fn project(&self) -> Vec<Record>;

    /// Project a truth snapshot the caller already holds
    ///
    /// Lets the `Auditor` compare truth and projection taken at the same
    /// instant. Default implementation ignores `truth` and reads live via
    /// `project()`; views backed by an `AuthorityStore` should override it.
    fn project_from(&self, truth: Vec<Record>) -> Vec<Record> {
        let _ = truth;
        self.project()
    }

    /// View name used in audit reports (e.g., "honest", "hooked")
    fn name(&self) -> &str;

    /// Descriptive information for reporting
    ///
    /// Default implementation describes a pass-through view.
    fn info(&self) -> ViewInfo {
        ViewInfo {
            name: self.name().to_string(),
            adversarial: false,
            redactions: 0,
            substitutions: 0,
        }
    }
}

/// View status information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewInfo {
    /// View name
    pub name: String,
    /// Whether the view interposes a policy
    pub adversarial: bool,
    /// Number of ids this view declares hidden
    pub redactions: usize,
    /// Number of ids this view substitutes
    pub substitutions: usize,
}
