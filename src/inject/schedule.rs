//! Schedule injection: construction tasks, dates, durations and unit cost.
//!
//! Columns: element key (`GlobalId` | `ObjectId` | `SyncID`), `TaskName`,
//! `PlannedStart`, `PlannedEnd`, `ActualStart`, `ActualEnd`,
//! `PlannedDuration`, `ActualDuration`, `Duration` (legacy free text),
//! `UnitCost`, `Cost`, `PlannedInstallDate`, `DeliveryStatus`, `CWP_ID`.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::graph::{Iri, Literal};
use crate::vocab::{NodeKind, awp, bim, sched};

use super::csv::{CsvRow, CsvTable};
use super::{InjectResult, InjectionReport, LeanLayerInjector, parse_number};

static LEGACY_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap());

const TASK_DATES: &[(&str, Iri)] = &[
    ("PlannedStart", sched::HAS_PLANNED_START),
    ("PlannedEnd", sched::HAS_PLANNED_END),
    ("ActualStart", sched::HAS_ACTUAL_START),
    ("ActualEnd", sched::HAS_ACTUAL_END),
];

/// Whole days from a numeric duration (`7`, `7.0`, `7.5` → 7).
pub fn parse_duration_days(text: &str) -> Option<i64> {
    let days = text.trim().parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)?;
    Some(days.trunc() as i64)
}

/// Which source a resolved duration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationSource {
    Actual,
    Planned,
    Legacy,
}

/// Resolve a duration by priority: actual, else planned, else the legacy
/// free-text value when it is purely numeric.
pub fn resolve_duration(
    actual: Option<&str>,
    planned: Option<&str>,
    legacy: Option<&str>,
) -> Option<(i64, DurationSource)> {
    if let Some(days) = actual.and_then(parse_duration_days) {
        return Some((days, DurationSource::Actual));
    }
    if let Some(days) = planned.and_then(parse_duration_days) {
        return Some((days, DurationSource::Planned));
    }
    let legacy = legacy.map(str::trim)?;
    if LEGACY_NUMERIC.is_match(legacy) {
        parse_duration_days(legacy).map(|days| (days, DurationSource::Legacy))
    } else {
        None
    }
}

impl LeanLayerInjector<'_> {
    /// Read and inject a schedule CSV.
    pub fn inject_schedule_file(&mut self, path: &Path) -> InjectResult<InjectionReport> {
        let table = CsvTable::read(path)?;
        Ok(self.inject_schedule(&table))
    }

    /// Inject schedule rows. Rows sharing a `TaskName` share one task node.
    pub fn inject_schedule(&mut self, table: &CsvTable) -> InjectionReport {
        let mut report = InjectionReport::new("schedule", table.len());
        for row in table.rows() {
            let Some((element, _)) = self.resolve_row(&row, &mut report) else {
                continue;
            };
            self.schedule_row(&row, &element, &mut report);
        }
        tracing::info!(
            rows = report.rows_read,
            matched = report.rows_matched,
            not_found = report.not_found.len(),
            tasks = report.created(NodeKind::Task),
            triples = report.triples_added,
            "schedule injected"
        );
        report
    }

    fn schedule_row(&mut self, row: &CsvRow<'_>, element: &Iri, report: &mut InjectionReport) {
        let actual = row.get("ActualDuration");
        let planned = row.get("PlannedDuration");
        let legacy = row.get("Duration");
        for (column, value) in [("ActualDuration", actual), ("PlannedDuration", planned)] {
            if let Some(value) = value {
                if parse_duration_days(value).is_none() {
                    tracing::warn!(row = row.number(), column, value, "non-numeric duration ignored");
                    report.malformed_values += 1;
                }
            }
        }
        let resolved = resolve_duration(actual, planned, legacy);

        if let Some(task_name) = row.get("TaskName") {
            let class = sched::CONSTRUCTION_TASK;
            let (task, created) = self.ensure_node(NodeKind::Task, task_name, &class, task_name, report);
            if created {
                self.task_details(row, &task, resolved, report);
            }
            self.add(element, &sched::ASSIGNED_TO_TASK, &task, report);
            self.add(&task, &sched::HAS_ASSIGNED_ELEMENT, element, report);
        }

        if let Some(date) = self.date_cell(row, "PlannedInstallDate", report) {
            self.set(element, &sched::HAS_PLANNED_INSTALL_DATE, date, report);
        }
        if let Some(status) = row.get("DeliveryStatus") {
            self.set(element, &bim::HAS_DELIVERY_STATUS, Literal::string(status), report);
        }
        if let Some(cwp) = row.get("CWP_ID") {
            self.set(element, &awp::BELONGS_TO_CWP_ID, Literal::string(cwp), report);
        }
        if let Some(cost) = self.cost_cell(row, report) {
            self.set(element, &bim::HAS_UNIT_COST, Literal::double(cost), report);
        }
        if let Some((days, _)) = resolved {
            self.set(element, &bim::HAS_CONSUME_DURATION, Literal::integer(days), report);
        }
    }

    fn task_details(
        &mut self,
        row: &CsvRow<'_>,
        task: &Iri,
        resolved: Option<(i64, DurationSource)>,
        report: &mut InjectionReport,
    ) {
        for (column, predicate) in TASK_DATES {
            if let Some(date) = self.date_cell(row, column, report) {
                self.add(task, predicate, date, report);
            }
        }
        // Raw duration text as scheduled, planned column first.
        if let Some(raw) = row.first_of(&["PlannedDuration", "Duration"]) {
            self.add(task, &sched::HAS_DURATION, Literal::string(raw), report);
        }
        if let Some(days) = row.get("PlannedDuration").and_then(parse_duration_days) {
            self.add(task, &sched::HAS_PLANNED_DURATION, Literal::integer(days), report);
        }
        if let Some(days) = row.get("ActualDuration").and_then(parse_duration_days) {
            self.add(task, &sched::HAS_ACTUAL_DURATION, Literal::integer(days), report);
        }
        if let Some((days, _)) = resolved {
            self.add(task, &sched::HAS_EFFECTIVE_DURATION, Literal::integer(days), report);
        }
    }

    /// `UnitCost`, else `Cost`. A malformed `UnitCost` does not fall through.
    fn cost_cell(&self, row: &CsvRow<'_>, report: &mut InjectionReport) -> Option<f64> {
        let (column, value) = [("UnitCost", row.get("UnitCost")), ("Cost", row.get("Cost"))]
            .into_iter()
            .find_map(|(column, value)| Some((column, value?)))?;
        let cost = parse_number(value);
        if cost.is_none() {
            tracing::warn!(row = row.number(), column, value, "invalid numeric value ignored");
            report.malformed_values += 1;
        }
        cost
    }
}
