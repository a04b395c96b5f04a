//! # a3s-crossview
//!
//! Cross-view auditing: detect state hiding by reconciling an authoritative
//! record set against what a possibly-compromised view reports.
//!
//! ## Overview
//!
//! Rootkit-style attacks do not change what is true; they change what an
//! observer is shown. A process stays in the execution table but is unlinked
//! from the visible list, a routine slot keeps its name but runs a patched
//! body, an alert service silently drops entries. `a3s-crossview` models that
//! information asymmetry with three parts:
//!
//! - **AuthorityStore** — the ground truth; the only thing that can change it
//! - **View** trait — a projection of truth; `HonestView` passes it through,
//!   `AdversarialView` hides and substitutes records
//! - **Auditor** — diffs truth against a view and classifies every record as
//!   visible, hidden, or substituted
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_crossview::{AdversarialView, Auditor, AuthorityStore, Record};
//! use std::sync::Arc;
//!
//! # fn example() -> a3s_crossview::Result<()> {
//! let authority = Arc::new(AuthorityStore::with_records(vec![
//!     Record::process(1, "system", true),
//!     Record::process(3, "malicious", true),
//! ])?);
//!
//! let hooked = AdversarialView::new(Arc::clone(&authority));
//! hooked.hide(3u64);
//!
//! let diff = Auditor::new(authority).diff(&hooked)?;
//! assert_eq!(diff.hidden, vec![Record::process(3, "malicious", true)]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Modules
//!
//! - **scenario** — JSON-loadable scenario configs and the built-in cases
//! - **report** — text and JSON rendering of a `Diff`
//! - **monitor** — periodic auditing of a live authority with broadcast reports

pub mod audit;
pub mod error;
pub mod monitor;
pub mod report;
pub mod scenario;
pub mod store;
pub mod types;
pub mod view;

// Re-export core types
pub use audit::{compute_diff, Auditor, Diff, DiffCounts, Substitution};
pub use error::{CrossViewError, Result};
pub use monitor::{AuditLog, AuditMonitor, AuditReport, MemoryAuditLog, MonitorConfig, MonitorHandle};
pub use scenario::{Scenario, ScenarioConfig};
pub use store::AuthorityStore;
pub use types::{Record, RecordId, RecordKind};
pub use view::{View, ViewInfo};

// Re-export views for convenience
pub use view::adversarial::{AdversarialView, RedactionPolicy};
pub use view::honest::HonestView;
