//! Element status records and delivery status.
//!
//! Columns: element key, `StatusValue`, `StatusDate`, `DeliveryStatus`.
//!
//! Records are keyed by element key and row number. Re-injecting a file finds
//! its own records again; a different file whose row lands on an occupied key
//! gets a fresh numbered record instead.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::graph::{Iri, Literal, Term};
use crate::vocab::{self, NodeKind, bim, rdf};

use super::csv::{CsvRow, CsvTable};
use super::{InjectResult, InjectionReport, LeanLayerInjector, parse_date_time};

/// Status values after which an element counts as ready.
pub const READY_STATUSES: &[&str] = &["Installed", "OnSite", "Inspected"];

pub fn is_ready_status(value: &str) -> bool {
    READY_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(value.trim()))
}

/// Result of a single-element status update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub key: String,
    pub found: bool,
    pub ready: bool,
    pub status: Option<Iri>,
    pub triples_added: usize,
}

impl LeanLayerInjector<'_> {
    /// Read and inject a status CSV.
    pub fn inject_status_file(&mut self, path: &Path) -> InjectResult<InjectionReport> {
        let table = CsvTable::read(path)?;
        Ok(self.inject_status(&table))
    }

    /// Inject status rows: one status record per row carrying a
    /// `StatusValue`, and the element's single current delivery status.
    pub fn inject_status(&mut self, table: &CsvTable) -> InjectionReport {
        let mut report = InjectionReport::new("status", table.len());
        for row in table.rows() {
            let Some((element, key)) = self.resolve_row(&row, &mut report) else {
                continue;
            };
            self.status_row(&row, &element, &key, &mut report);
        }
        tracing::info!(
            rows = report.rows_read,
            matched = report.rows_matched,
            records = report.created(NodeKind::Status),
            triples = report.triples_added,
            "status injected"
        );
        report
    }

    fn status_row(&mut self, row: &CsvRow<'_>, element: &Iri, key: &str, report: &mut InjectionReport) {
        if let Some(value) = row.get("StatusValue") {
            let date = row.get("StatusDate").and_then(|text| match parse_date_time(text) {
                Some((_, lexical)) => Some(Literal::date_time(lexical)),
                None => {
                    tracing::warn!(row = row.number(), value = text, "invalid status date ignored");
                    report.malformed_values += 1;
                    None
                }
            });
            let record = self.row_record(element, &format!("{key}_{}", row.number()), value, date.as_ref());
            self.status_record(element, &record, value, date, report);
        }
        if let Some(delivery) = row.get("DeliveryStatus") {
            self.set(element, &bim::HAS_DELIVERY_STATUS, Literal::string(delivery), report);
        }
    }

    /// The record IRI for a status row: the base IRI when it is free or holds
    /// this exact record, else the first free or matching `{base}_{n}`.
    fn row_record(&self, element: &Iri, base: &str, value: &str, date: Option<&Literal>) -> Iri {
        let mut record = vocab::mint_node(NodeKind::Status, base);
        let mut n = 1;
        while self.graph.has_type(&record, &bim::ELEMENT_STATUS)
            && !self.same_record(&record, element, value, date)
        {
            n += 1;
            record = vocab::mint_node(NodeKind::Status, &format!("{base}_{n}"));
        }
        record
    }

    fn same_record(&self, record: &Iri, element: &Iri, value: &str, date: Option<&Literal>) -> bool {
        let dates: Vec<Term> = date.cloned().map(Term::from).into_iter().collect();
        self.graph.contains(element, &bim::HAS_STATUS, &Term::from(record))
            && self.graph.objects(record, &bim::HAS_STATUS_VALUE) == [Term::from(Literal::string(value))]
            && self.graph.objects(record, &bim::HAS_STATUS_DATE) == dates
    }

    fn status_record(
        &mut self,
        element: &Iri,
        record: &Iri,
        value: &str,
        date: Option<Literal>,
        report: &mut InjectionReport,
    ) {
        if !self.graph.has_type(record, &bim::ELEMENT_STATUS) {
            *report.nodes_created.entry(NodeKind::Status).or_default() += 1;
        }
        self.add(record, &rdf::TYPE, &bim::ELEMENT_STATUS, report);
        self.add(record, &bim::HAS_STATUS_VALUE, Literal::string(value), report);
        if let Some(date) = date {
            self.add(record, &bim::HAS_STATUS_DATE, date, report);
        }
        self.add(element, &bim::HAS_STATUS, record, report);
    }

    /// Record a new status for one element, stamped with the current time.
    ///
    /// `key` is a GlobalId, or an ObjectId when no GlobalId matches.
    pub fn update_element_status(&mut self, key: &str, status_value: &str, delivery_status: Option<&str>) -> StatusUpdate {
        self.update_element_status_at(key, status_value, delivery_status, Utc::now())
    }

    /// [`update_element_status`](Self::update_element_status) at a given time.
    ///
    /// Sets `isReady` from [`READY_STATUSES`] and replaces any earlier
    /// `isReady` and delivery status values.
    pub fn update_element_status_at(
        &mut self,
        key: &str,
        status_value: &str,
        delivery_status: Option<&str>,
        at: DateTime<Utc>,
    ) -> StatusUpdate {
        let mut report = InjectionReport::new("status update", 1);
        let Some(element) = self.identity.resolve(&*self.graph, Some(key), Some(key)) else {
            tracing::warn!(key, "status update: element not found");
            return StatusUpdate {
                key: key.to_string(),
                found: false,
                ready: false,
                status: None,
                triples_added: 0,
            };
        };

        let stamp = at.format("%Y%m%dT%H%M%S%.6f").to_string();
        let record = vocab::mint_node(NodeKind::Status, &format!("{key}_{stamp}"));
        let date = Literal::date_time(at.to_rfc3339_opts(SecondsFormat::Secs, true));
        self.status_record(&element, &record, status_value, Some(date), &mut report);

        if let Some(delivery) = delivery_status.map(str::trim).filter(|d| !d.is_empty()) {
            self.set(&element, &bim::HAS_DELIVERY_STATUS, Literal::string(delivery), &mut report);
        }
        let ready = is_ready_status(status_value);
        self.set(&element, &bim::IS_READY, Literal::boolean(ready), &mut report);

        tracing::info!(key, status = status_value, ready, "element status updated");
        StatusUpdate {
            key: key.to_string(),
            found: true,
            ready,
            status: Some(record),
            triples_added: report.triples_added,
        }
    }
}
