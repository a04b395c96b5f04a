//! Cross-view auditor
//!
//! Reconciles ground truth against what a view reports. Both sides are
//! indexed by identity with insertion-ordered maps, then every true record
//! is classified as visible, hidden, or substituted. Output order follows
//! the input sequences, never hash order, so the same inputs always give
//! the same `Diff`.

use crate::error::{CrossViewError, Result};
use crate::store::AuthorityStore;
use crate::types::{Record, RecordId};
use crate::view::{View, ViewInfo};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// A true record reported with different content under the same identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    /// The identity slot
    pub id: RecordId,
    /// What the authority holds
    pub truth: Record,
    /// What the view reported instead
    pub visible: Record,
}

/// Result of reconciling ground truth against one view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    /// Name of the audited view
    pub view: String,

    /// Ground truth at audit time, in authority order
    pub truth: Vec<Record>,

    /// Records the view reported verbatim, in view order
    pub visible: Vec<Record>,

    /// True records the view omitted, in authority order
    pub hidden: Vec<Record>,

    /// True records the view altered, in authority order
    pub substituted: Vec<Substitution>,
}

/// Classification counts for a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffCounts {
    /// Records in ground truth
    pub truth: usize,
    /// Records reported verbatim
    pub visible: usize,
    /// Records omitted by the view
    pub hidden: usize,
    /// Records altered by the view
    pub substituted: usize,
}

impl Diff {
    /// Classification counts
    pub fn counts(&self) -> DiffCounts {
        DiffCounts {
            truth: self.truth.len(),
            visible: self.visible.len(),
            hidden: self.hidden.len(),
            substituted: self.substituted.len(),
        }
    }

    /// True when the view hides and alters nothing
    pub fn is_clean(&self) -> bool {
        self.hidden.is_empty() && self.substituted.is_empty()
    }

    /// Number of hidden plus substituted records
    pub fn discrepancies(&self) -> usize {
        self.hidden.len() + self.substituted.len()
    }

    /// Ids of hidden records, in authority order
    pub fn hidden_ids(&self) -> Vec<&RecordId> {
        self.hidden.iter().map(|r| &r.id).collect()
    }

    /// Look up the substitution for an id
    pub fn substitution(&self, id: &RecordId) -> Option<&Substitution> {
        self.substituted.iter().find(|s| &s.id == id)
    }
}

/// Classify `truth` against a view's `projected` output
///
/// Pure function of its inputs. Fails with `IntegrityViolation` if the
/// projection reports an id absent from truth or repeats an id, and if
/// `truth` itself repeats an id.
pub fn compute_diff(view: &str, truth: Vec<Record>, projected: Vec<Record>) -> Result<Diff> {
    let mut truth_by_id: IndexMap<&RecordId, &Record> = IndexMap::with_capacity(truth.len());
    for record in &truth {
        if truth_by_id.insert(&record.id, record).is_some() {
            return Err(integrity_violation(
                view,
                &record.id,
                "identity repeated in ground truth",
            ));
        }
    }

    let mut visible_by_id: IndexMap<&RecordId, &Record> =
        IndexMap::with_capacity(projected.len());
    for record in &projected {
        if !truth_by_id.contains_key(&record.id) {
            return Err(integrity_violation(
                view,
                &record.id,
                "view reported an identity absent from ground truth",
            ));
        }
        if visible_by_id.insert(&record.id, record).is_some() {
            return Err(integrity_violation(
                view,
                &record.id,
                "view reported the same identity more than once",
            ));
        }
    }

    let mut hidden = Vec::new();
    let mut substituted = Vec::new();
    for (id, truth_record) in &truth_by_id {
        match visible_by_id.get(id) {
            None => hidden.push((*truth_record).clone()),
            Some(visible_record) if visible_record != truth_record => {
                substituted.push(Substitution {
                    id: (*id).clone(),
                    truth: (*truth_record).clone(),
                    visible: (*visible_record).clone(),
                })
            }
            Some(_) => {}
        }
    }

    let visible = visible_by_id
        .iter()
        .filter(|(id, record)| truth_by_id.get(*id) == Some(*record))
        .map(|(_, record)| (*record).clone())
        .collect();

    Ok(Diff {
        view: view.to_string(),
        truth,
        visible,
        hidden,
        substituted,
    })
}

fn integrity_violation(view: &str, id: &RecordId, reason: &str) -> CrossViewError {
    tracing::error!(view = %view, id = %id, reason = %reason, "Integrity invariant violated");
    CrossViewError::IntegrityViolation {
        view: view.to_string(),
        id: id.clone(),
        reason: reason.to_string(),
    }
}

/// Audits registered views against one authority
///
/// Holds no state that affects results; `last_diff` is kept only for
/// inspection.
pub struct Auditor {
    authority: Arc<AuthorityStore>,

    /// Registered views (name → view), in registration order
    views: RwLock<IndexMap<String, Arc<dyn View>>>,

    last: Mutex<Option<Diff>>,
}

impl Auditor {
    /// Create an auditor over `authority` with no registered views
    pub fn new(authority: Arc<AuthorityStore>) -> Self {
        Self {
            authority,
            views: RwLock::new(IndexMap::new()),
            last: Mutex::new(None),
        }
    }

    /// Builder form of `register`
    pub fn with_view(self, view: Arc<dyn View>) -> Result<Self> {
        self.register(view)?;
        Ok(self)
    }

    /// Register a view for `audit_all`; names must be unique
    pub fn register(&self, view: Arc<dyn View>) -> Result<()> {
        let name = view.name().to_string();
        let mut views = self.views.write().unwrap_or_else(PoisonError::into_inner);
        if views.contains_key(&name) {
            return Err(CrossViewError::Config(format!(
                "View '{}' is already registered",
                name
            )));
        }

        tracing::info!(view = %name, "View registered with auditor");
        views.insert(name, view);
        Ok(())
    }

    /// Unregister a view by name, returning it
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn View>> {
        let mut views = self.views.write().unwrap_or_else(PoisonError::into_inner);
        views.shift_remove(name)
    }

    /// Info for every registered view, in registration order
    pub fn views(&self) -> Vec<ViewInfo> {
        let views = self.views.read().unwrap_or_else(PoisonError::into_inner);
        views.values().map(|v| v.info()).collect()
    }

    /// The audited authority
    pub fn authority(&self) -> &Arc<AuthorityStore> {
        &self.authority
    }

    /// Reconcile current truth against one view
    ///
    /// Truth is read once and the view projects that same snapshot, so
    /// writers racing the audit cannot make an honest view look tampered.
    pub fn diff(&self, view: &dyn View) -> Result<Diff> {
        let truth = self.authority.snapshot();
        let projected = view.project_from(truth.clone());
        let diff = compute_diff(view.name(), truth, projected)?;

        let counts = diff.counts();
        if diff.is_clean() {
            tracing::info!(
                view = %diff.view,
                truth = counts.truth,
                visible = counts.visible,
                "Audit clean"
            );
        } else {
            tracing::warn!(
                view = %diff.view,
                truth = counts.truth,
                visible = counts.visible,
                hidden = counts.hidden,
                substituted = counts.substituted,
                "Audit found discrepancies"
            );
        }

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(diff.clone());
        Ok(diff)
    }

    /// Reconcile current truth against every registered view
    ///
    /// Stops at the first integrity violation.
    pub fn audit_all(&self) -> Result<Vec<Diff>> {
        let views: Vec<Arc<dyn View>> = {
            let views = self.views.read().unwrap_or_else(PoisonError::into_inner);
            views.values().cloned().collect()
        };

        views.iter().map(|view| self.diff(view.as_ref())).collect()
    }

    /// The most recently computed diff, if any
    pub fn last_diff(&self) -> Option<Diff> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor")
            .field("records", &self.authority.len())
            .field("views", &self.views())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordKind;
    use crate::view::adversarial::AdversarialView;
    use crate::view::honest::HonestView;

    fn process_authority() -> Arc<AuthorityStore> {
        Arc::new(
            AuthorityStore::with_records(vec![
                Record::process(1, "system", true),
                Record::process(2, "svchost", true),
                Record::process(3, "malicious", true),
                Record::process(4, "explorer", true),
            ])
            .unwrap(),
        )
    }

    /// A broken view that invents an identity
    struct ForgingView;

    impl View for ForgingView {
        fn project(&self) -> Vec<Record> {
            vec![Record::process(99, "phantom", true)]
        }

        fn name(&self) -> &str {
            "forging"
        }
    }

    /// A broken view that repeats an identity
    struct DuplicatingView(Arc<AuthorityStore>);

    impl View for DuplicatingView {
        fn project(&self) -> Vec<Record> {
            let mut out = self.0.snapshot();
            if let Some(first) = out.first().cloned() {
                out.push(first);
            }
            out
        }

        fn name(&self) -> &str {
            "duplicating"
        }
    }

    #[test]
    fn test_process_hiding() {
        let authority = process_authority();
        let view = AdversarialView::new(Arc::clone(&authority));
        view.hide(3u64);

        let auditor = Auditor::new(authority);
        let diff = auditor.diff(&view).unwrap();

        assert_eq!(diff.hidden, vec![Record::process(3, "malicious", true)]);
        assert!(diff.substituted.is_empty());
        let visible: Vec<&str> = diff.visible.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(visible, vec!["system", "svchost", "explorer"]);
        assert_eq!(diff.view, "hooked");
    }

    #[test]
    fn test_routine_substitution() {
        let authority = Arc::new(
            AuthorityStore::with_records(vec![Record::routine("integrity-routine", "original")])
                .unwrap(),
        );
        let view = AdversarialView::new(Arc::clone(&authority));
        view.substitute("integrity-routine", Record::routine("integrity-routine", "patched"))
            .unwrap();

        let diff = Auditor::new(authority).diff(&view).unwrap();
        assert!(diff.hidden.is_empty());
        assert!(diff.visible.is_empty());
        assert_eq!(
            diff.substituted,
            vec![Substitution {
                id: RecordId::from("integrity-routine"),
                truth: Record::routine("integrity-routine", "original"),
                visible: Record::routine("integrity-routine", "patched"),
            }]
        );
    }

    #[test]
    fn test_kind_only_change_is_substitution() {
        let authority = process_authority();
        let view = AdversarialView::new(Arc::clone(&authority));
        let relabeled = Record::process(2, "svchost", true).with_kind(RecordKind::Generic);
        view.substitute(2u64, relabeled.clone()).unwrap();

        let diff = Auditor::new(authority).diff(&view).unwrap();
        assert_eq!(diff.substituted.len(), 1);
        assert!(diff.hidden.is_empty());

        let sub = diff.substitution(&RecordId::Numeric(2)).unwrap();
        assert_eq!(sub.truth.kind, RecordKind::Process);
        assert_eq!(sub.visible, relabeled);
        assert!(diff.substitution(&RecordId::Numeric(1)).is_none());
    }

    #[test]
    fn test_replaced_state_is_substitution() {
        let authority = process_authority();
        let view = AdversarialView::new(Arc::clone(&authority));
        let masked = Record::process(3, "malicious", true)
            .with_state(serde_json::json!({ "running": true, "suspended": true }));
        view.substitute(3u64, masked).unwrap();

        let diff = Auditor::new(authority).diff(&view).unwrap();
        let sub = diff.substitution(&RecordId::Numeric(3)).unwrap();
        assert_eq!(sub.visible.state.as_ref().unwrap()["suspended"], true);
        assert_eq!(sub.visible.running(), sub.truth.running());
    }

    #[test]
    fn test_auditor_exposes_its_authority() {
        let authority = process_authority();
        let auditor = Auditor::new(Arc::clone(&authority));
        assert!(Arc::ptr_eq(auditor.authority(), &authority));

        auditor.authority().add(Record::process(9, "late", true)).unwrap();
        assert_eq!(authority.len(), 5);
    }

    #[test]
    fn test_honest_view_clean_under_concurrent_writers() {
        let authority = process_authority();
        let honest = HonestView::new(Arc::clone(&authority));
        let hooked = AdversarialView::new(Arc::clone(&authority));
        hooked.hide(3u64);
        let auditor = Auditor::new(Arc::clone(&authority));

        let writer = {
            let authority = Arc::clone(&authority);
            std::thread::spawn(move || {
                for pid in 100..2100u64 {
                    authority.add(Record::process(pid, "worker", true)).unwrap();
                    authority.remove(&RecordId::Numeric(pid)).unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let diff = auditor.diff(&honest).unwrap();
            assert!(diff.is_clean());
            assert_eq!(diff.visible, diff.truth);

            let diff = auditor.diff(&hooked).unwrap();
            assert_eq!(diff.hidden_ids(), vec![&RecordId::Numeric(3)]);
            assert!(diff.substituted.is_empty());
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_state_only_change_is_substitution() {
        let authority = process_authority();
        let view = AdversarialView::new(Arc::clone(&authority));
        view.substitute(3u64, Record::process(3, "malicious", false)).unwrap();

        let diff = Auditor::new(authority).diff(&view).unwrap();
        assert_eq!(diff.substituted.len(), 1);
        assert!(diff.hidden.is_empty());
        assert!(diff
            .visible
            .iter()
            .all(|r| r.id != RecordId::Numeric(3)));
    }

    #[test]
    fn test_honest_view_is_clean() {
        let authority = process_authority();
        let view = HonestView::new(Arc::clone(&authority));
        let diff = Auditor::new(authority).diff(&view).unwrap();

        assert!(diff.is_clean());
        assert_eq!(diff.visible, diff.truth);
        assert_eq!(diff.discrepancies(), 0);
    }

    #[test]
    fn test_forged_identity_fails_fast() {
        let authority = process_authority();
        let auditor = Auditor::new(authority);
        let err = auditor.diff(&ForgingView).unwrap_err();
        assert!(matches!(
            err,
            CrossViewError::IntegrityViolation { ref view, ref id, .. }
                if view == "forging" && *id == RecordId::Numeric(99)
        ));
        // A failed audit leaves no cached diff behind
        assert!(auditor.last_diff().is_none());
    }

    #[test]
    fn test_duplicated_identity_fails_fast() {
        let authority = process_authority();
        let view = DuplicatingView(Arc::clone(&authority));
        let err = Auditor::new(authority).diff(&view).unwrap_err();
        assert!(matches!(err, CrossViewError::IntegrityViolation { .. }));
    }

    #[test]
    fn test_compute_diff_rejects_repeated_truth() {
        let truth = vec![Record::alert("a"), Record::alert("a")];
        let result = compute_diff("any", truth, Vec::new());
        assert!(matches!(result, Err(CrossViewError::IntegrityViolation { .. })));
    }

    #[test]
    fn test_visible_follows_view_order() {
        let truth = vec![
            Record::new("a", "A"),
            Record::new("b", "B"),
            Record::new("c", "C"),
        ];
        let projected = vec![
            Record::new("c", "C"),
            Record::new("a", "A"),
            Record::new("b", "B*"),
        ];

        let diff = compute_diff("reordering", truth, projected).unwrap();
        let visible: Vec<String> = diff.visible.iter().map(|r| r.label.clone()).collect();
        assert_eq!(visible, vec!["C", "A"]);
        assert_eq!(diff.substituted[0].id, RecordId::from("b"));
    }

    #[test]
    fn test_diff_is_deterministic() {
        let authority = process_authority();
        let view = AdversarialView::new(Arc::clone(&authority));
        view.hide(2u64);
        view.substitute(4u64, Record::process(4, "explorer.exe", true)).unwrap();

        let auditor = Auditor::new(authority);
        let first = auditor.diff(&view).unwrap();
        let second = auditor.diff(&view).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_completeness() {
        let authority = process_authority();
        let view = AdversarialView::new(Arc::clone(&authority));
        view.hide(1u64);
        view.substitute(2u64, Record::process(2, "svchost", false)).unwrap();

        let diff = Auditor::new(authority).diff(&view).unwrap();
        let c = diff.counts();
        assert_eq!(c.hidden + c.substituted + c.visible, c.truth);
        assert_eq!(c.truth, 4);
    }

    #[test]
    fn test_audit_all_in_registration_order() {
        let authority = process_authority();
        let hooked = Arc::new(AdversarialView::new(Arc::clone(&authority)));
        hooked.hide(3u64);

        let auditor = Auditor::new(Arc::clone(&authority))
            .with_view(Arc::new(HonestView::new(Arc::clone(&authority))))
            .unwrap()
            .with_view(hooked)
            .unwrap();

        let diffs = auditor.audit_all().unwrap();
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].view, "honest");
        assert!(diffs[0].is_clean());
        assert_eq!(diffs[1].view, "hooked");
        assert_eq!(diffs[1].hidden.len(), 1);

        // Cache holds the last audited view
        assert_eq!(auditor.last_diff().unwrap().view, "hooked");
    }

    #[test]
    fn test_register_duplicate_name_fails() {
        let authority = process_authority();
        let auditor = Auditor::new(Arc::clone(&authority));
        auditor
            .register(Arc::new(HonestView::new(Arc::clone(&authority))))
            .unwrap();
        let err = auditor
            .register(Arc::new(HonestView::new(Arc::clone(&authority))))
            .unwrap_err();
        assert!(matches!(err, CrossViewError::Config(_)));

        assert!(auditor.unregister("honest").is_some());
        assert!(auditor.views().is_empty());
    }

    #[test]
    fn test_audit_all_propagates_violation() {
        let authority = process_authority();
        let auditor = Auditor::new(Arc::clone(&authority))
            .with_view(Arc::new(ForgingView))
            .unwrap();
        assert!(auditor.audit_all().is_err());
    }

    #[test]
    fn test_truth_changes_reflected_next_audit() {
        let authority = process_authority();
        let view = AdversarialView::new(Arc::clone(&authority));
        view.hide(5u64);

        let auditor = Auditor::new(Arc::clone(&authority));
        assert!(auditor.diff(&view).unwrap().is_clean());

        authority.add(Record::process(5, "dropper", true)).unwrap();
        let diff = auditor.diff(&view).unwrap();
        assert_eq!(diff.hidden_ids(), vec![&RecordId::Numeric(5)]);

        authority.remove(&RecordId::Numeric(5)).unwrap();
        assert!(auditor.diff(&view).unwrap().is_clean());
    }
}
