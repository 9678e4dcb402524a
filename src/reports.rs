use crate::metrics::{derive, Derived};
use crate::population::PopulationTable;
use crate::types::{
    EntityHistory, EntitySnapshot, KpiSummary, MapRow, RankValue, RankingRow,
    SurveillanceRecord,
};
use crate::util::median;
use log::info;
use serde::Serialize;

/// Which rows a ranking is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Aggregated over every observation of an entity.
    History,
    /// The latest observation of an entity.
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalConfirmedCases,
    PeakWeeklyNewCases,
    LoadPerLab,
    SuspectedConfirmedRatio,
    ChwPer100k,
    GapDoses,
    WastagePct,
    DeployRatio,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::TotalConfirmedCases,
        Metric::PeakWeeklyNewCases,
        Metric::LoadPerLab,
        Metric::SuspectedConfirmedRatio,
        Metric::ChwPer100k,
        Metric::GapDoses,
        Metric::WastagePct,
        Metric::DeployRatio,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Metric::TotalConfirmedCases => "total_confirmed_cases",
            Metric::PeakWeeklyNewCases => "peak_weekly_new_cases",
            Metric::LoadPerLab => "load_per_lab",
            Metric::SuspectedConfirmedRatio => "suspected_confirmed_ratio",
            Metric::ChwPer100k => "chw_per_100k",
            Metric::GapDoses => "gap_doses",
            Metric::WastagePct => "wastage_pct",
            Metric::DeployRatio => "deploy_ratio",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::TotalConfirmedCases => "Total Confirmed Cases",
            Metric::PeakWeeklyNewCases => "Weekly New-Case Peaks",
            Metric::LoadPerLab => "Diagnostic Load per Lab",
            Metric::SuspectedConfirmedRatio => "Suspected/Confirmed Ratios",
            Metric::ChwPer100k => "CHWs per 100k Population",
            Metric::GapDoses => "Vaccine Dose Gaps",
            Metric::WastagePct => "Vaccine Wastage (%)",
            Metric::DeployRatio => "CHW Deployment Ratios",
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            Metric::TotalConfirmedCases | Metric::PeakWeeklyNewCases => Scope::History,
            _ => Scope::Snapshot,
        }
    }

    fn history_value(self, h: &EntityHistory) -> Option<RankValue> {
        let count = |n: u64| RankValue::Count(i64::try_from(n).unwrap_or(i64::MAX));
        match self {
            Metric::TotalConfirmedCases => Some(count(h.total_confirmed)),
            Metric::PeakWeeklyNewCases => Some(count(h.peak_weekly_new_cases)),
            _ => None,
        }
    }

    fn snapshot_value(self, s: &EntitySnapshot) -> Option<RankValue> {
        match self {
            Metric::LoadPerLab => s.load_per_lab.map(RankValue::Ratio),
            Metric::SuspectedConfirmedRatio => s.ratio.map(RankValue::Ratio),
            Metric::ChwPer100k => s.chw_per_100k.map(RankValue::Ratio),
            Metric::GapDoses => s.gap_doses.map(RankValue::Count),
            Metric::WastagePct => s.wastage_pct.map(RankValue::Ratio),
            Metric::DeployRatio => s.deploy_ratio.map(RankValue::Ratio),
            Metric::TotalConfirmedCases | Metric::PeakWeeklyNewCases => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingTable {
    pub metric: Metric,
    pub title: String,
    pub rows: Vec<RankingRow>,
}

/// Everything handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub derived: Derived,
    pub rankings: Vec<RankingTable>,
    pub kpis: KpiSummary,
    pub map: Vec<MapRow>,
}

pub fn generate_report(
    records: &[SurveillanceRecord],
    population: &PopulationTable,
    top_n: usize,
) -> Report {
    let derived = derive(records, population);
    let rankings = generate_rankings(&derived, top_n);
    let kpis = generate_kpis(&derived.snapshots);
    let map = generate_map_layer(&derived.snapshots);
    info!("Generated {} rankings", rankings.len());
    Report {
        derived,
        rankings,
        kpis,
        map,
    }
}

pub fn generate_rankings(derived: &Derived, top_n: usize) -> Vec<RankingTable> {
    Metric::ALL
        .iter()
        .map(|m| generate_ranking(*m, derived, top_n))
        .collect()
}

/// Top `top_n` entities by `metric`, descending. Entities whose value is not
/// computable are left out; equal values keep entity-name order.
pub fn generate_ranking(metric: Metric, derived: &Derived, top_n: usize) -> RankingTable {
    let mut values: Vec<(&str, RankValue)> = match metric.scope() {
        Scope::History => derived
            .histories
            .iter()
            .filter_map(|h| metric.history_value(h).map(|v| (h.entity.as_str(), v)))
            .collect(),
        Scope::Snapshot => derived
            .snapshots
            .iter()
            .filter_map(|s| metric.snapshot_value(s).map(|v| (s.entity(), v)))
            .collect(),
    };
    // Inputs are in entity order and the sort is stable.
    values.sort_by(|a, b| b.1.as_f64().total_cmp(&a.1.as_f64()));

    let rows = values
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, (entity, value))| RankingRow {
            rank: idx + 1,
            entity: entity.to_string(),
            value,
        })
        .collect();
    RankingTable {
        metric,
        title: format!("Top-{} {}", top_n, metric.label()),
        rows,
    }
}

pub fn generate_kpis(snapshots: &[EntitySnapshot]) -> KpiSummary {
    let gaps: Vec<i64> = snapshots.iter().filter_map(|s| s.gap_doses).collect();
    KpiSummary {
        total_gap_doses: (!gaps.is_empty()).then(|| gaps.iter().sum()),
        median_cfr: median(
            snapshots
                .iter()
                .map(|s| s.record.case_fatality_rate)
                .collect(),
        ),
        median_load_per_lab: median(snapshots.iter().filter_map(|s| s.load_per_lab).collect()),
    }
}

/// Vaccine-gap layer for the choropleth, one row per entity.
pub fn generate_map_layer(snapshots: &[EntitySnapshot]) -> Vec<MapRow> {
    snapshots
        .iter()
        .map(|s| MapRow {
            entity: s.entity().to_string(),
            gap_doses: s.gap_doses,
            pop_millions: s.pop_millions,
        })
        .collect()
}
