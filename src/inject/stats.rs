//! Lean-layer coverage statistics, read straight from graph patterns.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::graph::{Iri, Term, TripleGraph};
use crate::vocab::{awp, bim, sched};

use super::schedule::resolve_duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeanStats {
    pub tasks: usize,
    pub installation_packages: usize,
    pub work_packages: usize,
    pub work_areas: usize,
    pub status_records: usize,
    pub equipment: usize,
    pub elements_with_delivery_status: usize,
    pub elements_with_iwp: usize,
    pub elements_with_unit_cost: usize,
    pub elements_with_consume_duration: usize,
    pub tasks_with_typed_duration: usize,
    pub tasks_with_legacy_duration: usize,
    pub total_unit_cost: f64,
    pub avg_unit_cost: f64,
    pub avg_consume_duration: f64,
    /// Mean effective task duration (actual, else planned, else numeric
    /// legacy), over tasks with a positive value.
    pub avg_task_duration: f64,
}

impl LeanStats {
    pub fn collect(graph: &TripleGraph) -> Self {
        let tasks = graph.instances_of(&sched::CONSTRUCTION_TASK);
        let unit_costs = numbers(graph, &bim::HAS_UNIT_COST);
        let consume = numbers(graph, &bim::HAS_CONSUME_DURATION);

        let text = |t: &Iri, p: &Iri| graph.object(t, p).and_then(|o| o.as_literal().map(|l| l.lexical().to_string()));
        let effective: Vec<f64> = tasks
            .iter()
            .filter_map(|t| {
                let actual = text(t, &sched::HAS_ACTUAL_DURATION);
                let planned = text(t, &sched::HAS_PLANNED_DURATION);
                let legacy = text(t, &sched::HAS_DURATION);
                resolve_duration(actual.as_deref(), planned.as_deref(), legacy.as_deref())
            })
            .map(|(days, _)| days as f64)
            .filter(|d| *d > 0.0)
            .collect();

        Self {
            tasks: tasks.len(),
            installation_packages: graph.instances_of(&awp::INSTALLATION_WORK_PACKAGE).len(),
            work_packages: graph.instances_of(&awp::CONSTRUCTION_WORK_PACKAGE).len(),
            work_areas: graph.instances_of(&awp::CONSTRUCTION_WORK_AREA).len(),
            status_records: graph.instances_of(&bim::ELEMENT_STATUS).len(),
            equipment: graph.instances_of(&bim::CONSTRUCTION_EQUIPMENT).len(),
            elements_with_delivery_status: distinct_subjects(graph, &bim::HAS_DELIVERY_STATUS),
            elements_with_iwp: distinct_subjects(graph, &awp::ASSIGNED_TO_IWP),
            elements_with_unit_cost: distinct_subjects(graph, &bim::HAS_UNIT_COST),
            elements_with_consume_duration: distinct_subjects(graph, &bim::HAS_CONSUME_DURATION),
            tasks_with_typed_duration: tasks
                .iter()
                .filter(|t| {
                    graph.object(t, &sched::HAS_PLANNED_DURATION).is_some()
                        || graph.object(t, &sched::HAS_ACTUAL_DURATION).is_some()
                })
                .count(),
            tasks_with_legacy_duration: tasks
                .iter()
                .filter(|t| graph.object(t, &sched::HAS_DURATION).is_some())
                .count(),
            total_unit_cost: unit_costs.iter().sum(),
            avg_unit_cost: mean(&unit_costs),
            avg_consume_duration: mean(&consume),
            avg_task_duration: mean(&effective),
        }
    }
}

fn numbers(graph: &TripleGraph, predicate: &Iri) -> Vec<f64> {
    graph
        .pairs(predicate)
        .iter()
        .filter_map(|(_, o)| o.as_literal()?.as_f64())
        .collect()
}

fn distinct_subjects(graph: &TripleGraph, predicate: &Iri) -> usize {
    graph
        .pairs(predicate)
        .into_iter()
        .map(|(s, _): (Iri, Term)| s)
        .collect::<HashSet<_>>()
        .len()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl fmt::Display for LeanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "lean layer:")?;
        writeln!(f, "  tasks:                   {}", self.tasks)?;
        writeln!(
            f,
            "  work areas / packages:   {} / {} / {} IWP",
            self.work_areas, self.work_packages, self.installation_packages
        )?;
        writeln!(f, "  status records:          {}", self.status_records)?;
        writeln!(f, "  equipment:               {}", self.equipment)?;
        writeln!(f, "  with delivery status:    {}", self.elements_with_delivery_status)?;
        writeln!(f, "  assigned to an IWP:      {}", self.elements_with_iwp)?;
        writeln!(
            f,
            "  with unit cost:          {} (total {:.2}, avg {:.2})",
            self.elements_with_unit_cost, self.total_unit_cost, self.avg_unit_cost
        )?;
        writeln!(
            f,
            "  with consume duration:   {} (avg {:.1} days)",
            self.elements_with_consume_duration, self.avg_consume_duration
        )?;
        write!(f, "  avg task duration:       {:.1} days", self.avg_task_duration)
    }
}
