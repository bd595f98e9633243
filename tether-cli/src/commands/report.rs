//! Human and JSON rendering of reconciliation results.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use tether_core::{ObservedView, OrderValue, TargetId};
use tether_sync::{ApplyOutcome, OrderingMismatch, Reconciliation};

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReconciliationJson<'a> {
    owner: &'a str,
    dry_run: bool,
    applied: Vec<OutcomeJson<'a>>,
    view: &'a ObservedView,
    drift: &'a [TargetId],
    dropped: &'a [TargetId],
    ordering_mismatches: Vec<MismatchJson<'a>>,
}

#[derive(Serialize)]
pub struct OutcomeJson<'a> {
    op: &'static str,
    target_id: &'a str,
}

#[derive(Serialize)]
struct MismatchJson<'a> {
    earlier: &'a str,
    later: &'a str,
    desired: (i64, i64),
    confirmed: (i64, i64),
}

pub fn outcomes_json(outcomes: &[ApplyOutcome]) -> Vec<OutcomeJson<'_>> {
    outcomes
        .iter()
        .map(|o| OutcomeJson {
            op: outcome_key(o),
            target_id: &o.target_id().0,
        })
        .collect()
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize JSON output")?
    );
    Ok(())
}

pub fn print_reconciliation_json(result: &Reconciliation, dry_run: bool) -> Result<()> {
    print_json(&ReconciliationJson {
        owner: &result.owner.0,
        dry_run,
        applied: outcomes_json(&result.applied),
        view: &result.view,
        drift: &result.drift,
        dropped: &result.dropped,
        ordering_mismatches: result
            .ordering
            .mismatches
            .iter()
            .map(|m: &OrderingMismatch| MismatchJson {
                earlier: &m.earlier.0,
                later: &m.later.0,
                desired: m.desired,
                confirmed: m.confirmed,
            })
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Human-readable
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct ViewRow {
    #[tabled(rename = "")]
    indicator: String,
    #[tabled(rename = "target")]
    target: String,
    #[tabled(rename = "priority")]
    priority: String,
    #[tabled(rename = "profile")]
    profile: String,
}

pub fn print_outcomes(outcomes: &[ApplyOutcome]) {
    for outcome in outcomes {
        let target = outcome.target_id();
        match outcome {
            ApplyOutcome::Upserted { .. } => println!("  ✎  {target}"),
            ApplyOutcome::Deleted { .. } => println!("  ✗  {target}"),
            ApplyOutcome::AlreadyAbsent { .. } => println!("  ·  {target} (already absent)"),
            ApplyOutcome::WouldUpsert { .. } => println!("  ~  {target}"),
            ApplyOutcome::WouldDelete { .. } => println!("  ~  {target} (delete)"),
        }
    }
}

pub fn print_reconciliation(result: &Reconciliation) {
    let separator = "■".repeat(60).bright_black().to_string();
    println!("{separator}");
    println!(
        "Indicators: {} DECLARED  {} DRIFT",
        "■".green().bold(),
        "■".yellow().bold()
    );
    println!("{separator}");

    if result.view.is_empty() {
        println!("No relations exist for '{}'.", result.owner);
    } else {
        let rows: Vec<ViewRow> = result
            .view
            .iter()
            .map(|relation| ViewRow {
                indicator: if result.drift.contains(&relation.target_id) {
                    "■".yellow().bold().to_string()
                } else {
                    "■".green().bold().to_string()
                },
                target: relation.target_id.to_string(),
                priority: match relation.ordering {
                    OrderValue::Unset => "-".to_string(),
                    OrderValue::Explicit(value) => value.to_string(),
                },
                profile: relation.payload.to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    if !result.drift.is_empty() {
        println!(
            "{} {} relation(s) exist remotely but are not declared: {}",
            "drift:".yellow().bold(),
            result.drift.len(),
            join_ids(&result.drift)
        );
    }
    if !result.dropped.is_empty() {
        println!(
            "{} {} declared relation(s) are not present remotely: {}",
            "missing:".red().bold(),
            result.dropped.len(),
            join_ids(&result.dropped)
        );
    }
    for mismatch in &result.ordering.mismatches {
        println!("{} {mismatch}", "ordering:".yellow().bold());
    }
}

fn join_ids(ids: &[TargetId]) -> String {
    ids.iter()
        .map(|id| id.0.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn outcome_key(outcome: &ApplyOutcome) -> &'static str {
    match outcome {
        ApplyOutcome::Deleted { .. } => "deleted",
        ApplyOutcome::AlreadyAbsent { .. } => "already_absent",
        ApplyOutcome::Upserted { .. } => "upserted",
        ApplyOutcome::WouldDelete { .. } => "would_delete",
        ApplyOutcome::WouldUpsert { .. } => "would_upsert",
    }
}
