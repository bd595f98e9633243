//! Ordering invariant check.
//!
//! For targets declared with an explicit priority and confirmed with one, the
//! relative order implied by the declared values must match the relative
//! order of the confirmed values. Absolute values may differ: a remote that
//! compacts `1, 3, 5` to `1, 2, 3` is fine.
//!
//! The check is advisory. The remote side may resolve conflicts however it
//! likes, so a mismatch is reported and logged but never fails reconciliation.
//! Targets declared with equal priorities carry no relative order and are
//! never reported against each other.

use std::fmt;

use tether_core::{DesiredSet, ObservedView, TargetId};

/// A pair whose declared order was not kept by the confirmed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingMismatch {
    /// Declared to come first.
    pub earlier: TargetId,
    /// Declared to come second.
    pub later: TargetId,
    /// Declared priorities of `(earlier, later)`.
    pub desired: (i64, i64),
    /// Confirmed priorities of `(earlier, later)`.
    pub confirmed: (i64, i64),
}

impl fmt::Display for OrderingMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' (priority {}) should precede '{}' (priority {}), but confirmed priorities are {} and {}",
            self.earlier, self.desired.0, self.later, self.desired.1, self.confirmed.0, self.confirmed.1
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderingReport {
    /// Number of targets that took part in the check.
    pub checked: usize,
    pub mismatches: Vec<OrderingMismatch>,
}

impl OrderingReport {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compare declared and confirmed relative order.
pub fn check(desired: &DesiredSet, view: &ObservedView) -> OrderingReport {
    let mut entries: Vec<(&TargetId, i64, i64)> = desired
        .iter()
        .filter_map(|declared| {
            let wanted = declared.ordering.explicit()?;
            let got = view.get(&declared.target_id)?.ordering.explicit()?;
            Some((&declared.target_id, wanted, got))
        })
        .collect();
    entries.sort_by_key(|(_, wanted, _)| *wanted);

    let mut report = OrderingReport {
        checked: entries.len(),
        mismatches: Vec::new(),
    };
    for (i, (first, wanted_first, got_first)) in entries.iter().enumerate() {
        for (second, wanted_second, got_second) in &entries[i + 1..] {
            if wanted_first < wanted_second && got_first >= got_second {
                report.mismatches.push(OrderingMismatch {
                    earlier: (*first).clone(),
                    later: (*second).clone(),
                    desired: (*wanted_first, *wanted_second),
                    confirmed: (*got_first, *got_second),
                });
            }
        }
    }

    for mismatch in &report.mismatches {
        tracing::warn!("ordering not preserved: {mismatch}");
    }
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::Relation;

    fn desired(pairs: &[(&str, Option<i64>)]) -> DesiredSet {
        DesiredSet::new(
            pairs
                .iter()
                .map(|(id, p)| match p {
                    Some(v) => Relation::new(*id).with_ordering(*v),
                    None => Relation::new(*id),
                })
                .collect(),
        )
        .expect("valid set")
    }

    fn view(pairs: &[(&str, Option<i64>)]) -> ObservedView {
        ObservedView(
            pairs
                .iter()
                .map(|(id, p)| match p {
                    Some(v) => Relation::new(*id).with_ordering(*v),
                    None => Relation::new(*id),
                })
                .collect(),
        )
    }

    #[test]
    fn compaction_keeps_relative_order() {
        let d = desired(&[("A", Some(1)), ("B", Some(3)), ("C", Some(5))]);
        let v = view(&[("A", Some(1)), ("B", Some(2)), ("C", Some(3))]);
        let report = check(&d, &v);
        assert!(report.is_ok());
        assert_eq!(report.checked, 3);
    }

    #[test]
    fn inversion_is_reported_as_pair() {
        let d = desired(&[("A", Some(1)), ("B", Some(2))]);
        let v = view(&[("A", Some(5)), ("B", Some(1))]);
        let report = check(&d, &v);
        assert_eq!(
            report.mismatches,
            vec![OrderingMismatch {
                earlier: TargetId::from("A"),
                later: TargetId::from("B"),
                desired: (1, 2),
                confirmed: (5, 1),
            }]
        );
    }

    #[test]
    fn declaration_order_is_irrelevant_only_values_count() {
        let d = desired(&[("B", Some(2)), ("A", Some(1))]);
        let v = view(&[("B", Some(2)), ("A", Some(1))]);
        assert!(check(&d, &v).is_ok());
    }

    #[test]
    fn unset_on_either_side_is_ignored() {
        let d = desired(&[("A", Some(1)), ("B", None), ("C", Some(2))]);
        let v = view(&[("A", Some(9)), ("B", Some(1)), ("C", None)]);
        let report = check(&d, &v);
        assert!(report.is_ok());
        assert_eq!(report.checked, 1);
    }

    #[test]
    fn duplicate_declared_priorities_are_not_judged() {
        let d = desired(&[("A", Some(1)), ("B", Some(1))]);
        let v = view(&[("A", Some(2)), ("B", Some(1))]);
        assert!(check(&d, &v).is_ok());
    }

    #[test]
    fn confirmed_tie_breaks_declared_order() {
        let d = desired(&[("A", Some(1)), ("B", Some(2))]);
        let v = view(&[("A", Some(3)), ("B", Some(3))]);
        assert_eq!(check(&d, &v).mismatches.len(), 1);
    }

    #[test]
    fn targets_missing_from_view_are_skipped() {
        let d = desired(&[("A", Some(2)), ("B", Some(1))]);
        let v = view(&[("A", Some(1))]);
        assert!(check(&d, &v).is_ok());
    }

    #[test]
    fn zero_priority_participates() {
        let d = desired(&[("A", Some(0)), ("B", Some(1))]);
        let v = view(&[("A", Some(2)), ("B", Some(1))]);
        assert_eq!(check(&d, &v).mismatches.len(), 1);
    }
}
