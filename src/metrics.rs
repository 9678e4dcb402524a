//! Snapshot reduction and per-entity metric derivation.
//!
//! Every metric is an `Option`: a zero denominator or an unknown population
//! yields `None` instead of an infinite or NaN value, and each metric is
//! computed on its own so one gap never blanks another.
use crate::error::ReportError;
use crate::population::PopulationTable;
use crate::types::{EntityHistory, EntitySnapshot, SurveillanceRecord};
use crate::util::{checked_ratio, round_to};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Share of the population targeted for vaccination.
pub const COVERAGE_TARGET: f64 = 0.05;
/// Doses per person in the regimen.
pub const DOSES_PER_PERSON: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    /// One per entity, ordered by entity name.
    pub snapshots: Vec<EntitySnapshot>,
    /// One per entity, ordered by entity name.
    pub histories: Vec<EntityHistory>,
    /// Entities without a population reference, in name order.
    pub missing_population: Vec<String>,
}

impl Derived {
    /// Non-fatal issues found while deriving.
    pub fn warnings(&self) -> Vec<ReportError> {
        self.missing_population
            .iter()
            .map(|entity| ReportError::MissingReference {
                entity: entity.clone(),
            })
            .collect()
    }
}

pub fn derive(records: &[SurveillanceRecord], population: &PopulationTable) -> Derived {
    let latest = latest_by_entity(records);
    let mut missing_population = Vec::new();

    let snapshots: Vec<EntitySnapshot> = latest
        .into_values()
        .map(|record| {
            let pop = population.get(&record.entity);
            if pop.is_none() {
                warn!("No population reference for {}", record.entity);
                missing_population.push(record.entity.clone());
            }
            let snapshot = snapshot(record.clone(), pop);
            debug!("{}: {:?}", snapshot.entity(), snapshot);
            snapshot
        })
        .collect();

    let histories = histories(records);
    info!(
        "Derived {} snapshots from {} records ({} without population)",
        snapshots.len(),
        records.len(),
        missing_population.len()
    );
    Derived {
        snapshots,
        histories,
        missing_population,
    }
}

/// Latest record per entity. Ties on the date go to the later row.
pub fn latest_by_entity(records: &[SurveillanceRecord]) -> BTreeMap<&str, &SurveillanceRecord> {
    let mut latest: BTreeMap<&str, &SurveillanceRecord> = BTreeMap::new();
    for r in records {
        latest
            .entry(r.entity.as_str())
            .and_modify(|cur| {
                if r.report_date >= cur.report_date {
                    *cur = r;
                }
            })
            .or_insert(r);
    }
    latest
}

pub fn histories(records: &[SurveillanceRecord]) -> Vec<EntityHistory> {
    let mut by_entity: BTreeMap<&str, EntityHistory> = BTreeMap::new();
    for r in records {
        let e = by_entity
            .entry(r.entity.as_str())
            .or_insert_with(|| EntityHistory {
                entity: r.entity.clone(),
                total_confirmed: 0,
                peak_weekly_new_cases: 0,
                observations: 0,
            });
        e.total_confirmed = e.total_confirmed.saturating_add(r.confirmed_cases);
        e.peak_weekly_new_cases = e.peak_weekly_new_cases.max(r.weekly_new_cases);
        e.observations += 1;
    }
    by_entity.into_values().collect()
}

/// Derive the metrics for one entity's latest record.
///
/// `gap_doses` only needs a known population; the per-capita densities also
/// need it to be non-zero.
pub fn snapshot(record: SurveillanceRecord, pop_millions: Option<f64>) -> EntitySnapshot {
    let pop = pop_millions.filter(|p| *p > 0.0);
    EntitySnapshot {
        gap_doses: pop_millions.map(|p| gap_doses(p, record.vaccine_dose_deployed)),
        labs_per_10m: pop
            .and_then(|p| checked_ratio(record.testing_laboratories as f64, p))
            .map(|v| round_to(v * 10.0, 1)),
        load_per_lab: one_decimal(checked_ratio(
            record.suspected_cases as f64,
            record.testing_laboratories as f64,
        )),
        ratio: one_decimal(checked_ratio(
            record.suspected_cases as f64,
            record.confirmed_cases as f64,
        )),
        wastage_pct: wastage_pct(record.vaccine_dose_allocated, record.vaccine_dose_deployed),
        chw_per_100k: pop
            .and_then(|p| checked_ratio(record.trained_chws as f64, p))
            .map(|v| round_to(v * 100_000.0, 1)),
        deploy_ratio: one_decimal(checked_ratio(
            record.deployed_chws as f64,
            record.trained_chws as f64,
        )),
        pop_millions,
        record,
    }
}

/// Doses still needed to reach the coverage target; negative when deployment
/// already exceeds it.
pub fn gap_doses(pop_millions: f64, deployed: u64) -> i64 {
    let target = pop_millions * 1e6 * COVERAGE_TARGET * DOSES_PER_PERSON;
    round_to(target - deployed as f64, 0) as i64
}

pub fn wastage_pct(allocated: u64, deployed: u64) -> Option<f64> {
    let unused = allocated as f64 - deployed as f64;
    one_decimal(checked_ratio(unused, allocated as f64).map(|v| v * 100.0))
}

fn one_decimal(v: Option<f64>) -> Option<f64> {
    v.map(|x| round_to(x, 1))
}
