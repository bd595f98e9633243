//! Set differ: old declaration × new declaration → operation batch.
//!
//! Deletes cover identities dropped from the declaration. Upserts cover
//! **every** entry of the new declaration, changed or not: the remote upsert
//! is idempotent, so re-sending unchanged entries re-applies any field drift
//! without a per-field diff.

use std::collections::HashSet;

use similar::TextDiff;

use tether_core::{DesiredSet, Relation, TargetId};

/// Operations needed to converge the remote side onto a declaration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    /// Targets to remove, in old-declaration order.
    pub to_delete: Vec<TargetId>,
    /// Relations to create or overwrite, in new-declaration order.
    pub to_upsert: Vec<Relation>,
}

impl Plan {
    pub fn operation_count(&self) -> usize {
        self.to_delete.len() + self.to_upsert.len()
    }
}

/// Compute the operation batch for moving from `old` to `new`.
pub fn diff(old: &DesiredSet, new: &DesiredSet) -> Plan {
    let kept: HashSet<&TargetId> = new.iter().map(|r| &r.target_id).collect();
    let to_delete = old
        .iter()
        .filter(|r| !kept.contains(&r.target_id))
        .map(|r| r.target_id.clone())
        .collect();
    Plan {
        to_delete,
        to_upsert: new.relations().to_vec(),
    }
}

/// Unified diff of two declarations, one relation per line.
///
/// Returns an empty string when both declarations render identically.
pub fn render_unified(old: &DesiredSet, new: &DesiredSet, label: &str) -> String {
    let old_text = render_lines(old);
    let new_text = render_lines(new);
    if old_text == new_text {
        return String::new();
    }
    let old_header = format!("a/{label}");
    let new_header = format!("b/{label}");
    TextDiff::from_lines(&old_text, &new_text)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}

fn render_lines(set: &DesiredSet) -> String {
    set.iter()
        .map(|r| {
            format!(
                "{} priority={} profile={}\n",
                r.target_id, r.ordering, r.payload
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::Payload;

    fn set(relations: Vec<Relation>) -> DesiredSet {
        DesiredSet::new(relations).expect("valid set")
    }

    fn ids(targets: &[TargetId]) -> Vec<&str> {
        targets.iter().map(|t| t.0.as_str()).collect()
    }

    #[test]
    fn unchanged_declaration_upserts_everything_and_deletes_nothing() {
        let d = set(vec![
            Relation::new("a").with_ordering(1),
            Relation::new("b"),
            Relation::new("c").with_ordering(0),
        ]);
        let plan = diff(&d, &d);
        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.to_upsert, d.relations());
    }

    #[test]
    fn removed_entries_are_deleted_by_identity() {
        let old = set(vec![Relation::new("a"), Relation::new("b"), Relation::new("c")]);
        let new = set(vec![Relation::new("b").with_ordering(2)]);
        let plan = diff(&old, &new);
        assert_eq!(ids(&plan.to_delete), ["a", "c"]);
        assert_eq!(plan.to_upsert, new.relations());
        assert_eq!(plan.operation_count(), 3);
    }

    #[test]
    fn field_change_only_still_upserts() {
        let mut payload = Payload::new();
        payload.insert("role", "admin");
        let old = set(vec![Relation::new("a")]);
        let new = set(vec![Relation::new("a").with_payload(payload)]);
        let plan = diff(&old, &new);
        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.to_upsert.len(), 1);
    }

    #[test]
    fn first_declaration_has_no_deletes() {
        let new = set(vec![Relation::new("a"), Relation::new("b")]);
        let plan = diff(&DesiredSet::empty(), &new);
        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.to_upsert.len(), 2);
    }

    #[test]
    fn unified_render_marks_changed_lines() {
        let old = set(vec![Relation::new("a").with_ordering(1), Relation::new("b")]);
        let new = set(vec![Relation::new("a").with_ordering(2), Relation::new("b")]);
        let out = render_unified(&old, &new, "app1");
        assert!(out.contains("--- a/app1"));
        assert!(out.contains("+++ b/app1"));
        assert!(out.lines().any(|l| l == "-a priority=1 profile={}"));
        assert!(out.lines().any(|l| l == "+a priority=2 profile={}"));
    }

    #[test]
    fn unified_render_is_empty_without_changes() {
        let d = set(vec![Relation::new("a")]);
        assert!(render_unified(&d, &d, "app1").is_empty());
    }
}
