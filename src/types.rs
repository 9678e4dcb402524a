use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::util::{format_int, format_number, format_opt};
use std::fmt;

/// Column names of the surveillance table, in canonical order.
pub const COLUMNS: [&str; 11] = [
    "Country",
    "Report_Date",
    "Confirmed_Cases",
    "Suspected_Cases",
    "Weekly_New_Cases",
    "Case_Fatality_Rate",
    "Testing_Laboratories",
    "Vaccine_Dose_Allocated",
    "Vaccine_Dose_Deployed",
    "Trained_CHWs",
    "Deployed_CHWs",
];

#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "Report_Date")]
    pub report_date: Option<String>,
    #[serde(rename = "Confirmed_Cases")]
    pub confirmed_cases: Option<String>,
    #[serde(rename = "Suspected_Cases")]
    pub suspected_cases: Option<String>,
    #[serde(rename = "Weekly_New_Cases")]
    pub weekly_new_cases: Option<String>,
    #[serde(rename = "Case_Fatality_Rate")]
    pub case_fatality_rate: Option<String>,
    #[serde(rename = "Testing_Laboratories")]
    pub testing_laboratories: Option<String>,
    #[serde(rename = "Vaccine_Dose_Allocated")]
    pub vaccine_dose_allocated: Option<String>,
    #[serde(rename = "Vaccine_Dose_Deployed")]
    pub vaccine_dose_deployed: Option<String>,
    #[serde(rename = "Trained_CHWs")]
    pub trained_chws: Option<String>,
    #[serde(rename = "Deployed_CHWs")]
    pub deployed_chws: Option<String>,
}

/// One surveillance observation for an entity on a report date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveillanceRecord {
    #[serde(rename = "Country")]
    pub entity: String,
    #[serde(rename = "Report_Date")]
    pub report_date: NaiveDate,
    #[serde(rename = "Confirmed_Cases")]
    pub confirmed_cases: u64,
    #[serde(rename = "Suspected_Cases")]
    pub suspected_cases: u64,
    #[serde(rename = "Weekly_New_Cases")]
    pub weekly_new_cases: u64,
    #[serde(rename = "Case_Fatality_Rate")]
    pub case_fatality_rate: f64,
    #[serde(rename = "Testing_Laboratories")]
    pub testing_laboratories: u64,
    #[serde(rename = "Vaccine_Dose_Allocated")]
    pub vaccine_dose_allocated: u64,
    #[serde(rename = "Vaccine_Dose_Deployed")]
    pub vaccine_dose_deployed: u64,
    #[serde(rename = "Trained_CHWs")]
    pub trained_chws: u64,
    #[serde(rename = "Deployed_CHWs")]
    pub deployed_chws: u64,
}

/// Latest record of an entity plus its derived metrics. `None` means the
/// metric is not computable (zero denominator or unknown population).
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub record: SurveillanceRecord,
    pub pop_millions: Option<f64>,
    pub gap_doses: Option<i64>,
    pub labs_per_10m: Option<f64>,
    pub load_per_lab: Option<f64>,
    pub ratio: Option<f64>,
    pub wastage_pct: Option<f64>,
    pub chw_per_100k: Option<f64>,
    pub deploy_ratio: Option<f64>,
}

impl EntitySnapshot {
    pub fn entity(&self) -> &str {
        &self.record.entity
    }
}

/// Whole-history aggregates for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityHistory {
    pub entity: String,
    pub total_confirmed: u64,
    pub peak_weekly_new_cases: u64,
    pub observations: usize,
}

/// Flat CSV shape of an `EntitySnapshot`; empty cells are "not computable".
#[derive(Debug, Serialize)]
pub struct SnapshotRow<'a> {
    #[serde(rename = "Country")]
    pub entity: &'a str,
    #[serde(rename = "Report_Date")]
    pub report_date: NaiveDate,
    #[serde(rename = "Confirmed_Cases")]
    pub confirmed_cases: u64,
    #[serde(rename = "Suspected_Cases")]
    pub suspected_cases: u64,
    #[serde(rename = "Weekly_New_Cases")]
    pub weekly_new_cases: u64,
    #[serde(rename = "Case_Fatality_Rate")]
    pub case_fatality_rate: f64,
    #[serde(rename = "Testing_Laboratories")]
    pub testing_laboratories: u64,
    #[serde(rename = "Vaccine_Dose_Allocated")]
    pub vaccine_dose_allocated: u64,
    #[serde(rename = "Vaccine_Dose_Deployed")]
    pub vaccine_dose_deployed: u64,
    #[serde(rename = "Trained_CHWs")]
    pub trained_chws: u64,
    #[serde(rename = "Deployed_CHWs")]
    pub deployed_chws: u64,
    pub pop_millions: Option<f64>,
    pub gap_doses: Option<i64>,
    #[serde(rename = "labs_per_10M")]
    pub labs_per_10m: Option<f64>,
    pub load_per_lab: Option<f64>,
    pub ratio: Option<f64>,
    pub wastage_pct: Option<f64>,
    pub chw_per_100k: Option<f64>,
    pub deploy_ratio: Option<f64>,
}

impl<'a> From<&'a EntitySnapshot> for SnapshotRow<'a> {
    fn from(s: &'a EntitySnapshot) -> Self {
        let r = &s.record;
        Self {
            entity: &r.entity,
            report_date: r.report_date,
            confirmed_cases: r.confirmed_cases,
            suspected_cases: r.suspected_cases,
            weekly_new_cases: r.weekly_new_cases,
            case_fatality_rate: r.case_fatality_rate,
            testing_laboratories: r.testing_laboratories,
            vaccine_dose_allocated: r.vaccine_dose_allocated,
            vaccine_dose_deployed: r.vaccine_dose_deployed,
            trained_chws: r.trained_chws,
            deployed_chws: r.deployed_chws,
            pop_millions: s.pop_millions,
            gap_doses: s.gap_doses,
            labs_per_10m: s.labs_per_10m,
            load_per_lab: s.load_per_lab,
            ratio: s.ratio,
            wastage_pct: s.wastage_pct,
            chw_per_100k: s.chw_per_100k,
            deploy_ratio: s.deploy_ratio,
        }
    }
}

/// Console preview of a snapshot.
#[derive(Debug, Tabled, Clone)]
pub struct SnapshotPreviewRow {
    #[tabled(rename = "Country")]
    pub entity: String,
    #[tabled(rename = "Report_Date")]
    pub report_date: String,
    #[tabled(rename = "Pop (M)")]
    pub pop_millions: String,
    #[tabled(rename = "Gap Doses")]
    pub gap_doses: String,
    #[tabled(rename = "Labs/10M")]
    pub labs_per_10m: String,
    #[tabled(rename = "Load/Lab")]
    pub load_per_lab: String,
    #[tabled(rename = "Susp/Conf")]
    pub ratio: String,
    #[tabled(rename = "Wastage %")]
    pub wastage_pct: String,
    #[tabled(rename = "CHW/100k")]
    pub chw_per_100k: String,
    #[tabled(rename = "Deploy Ratio")]
    pub deploy_ratio: String,
}

impl From<&EntitySnapshot> for SnapshotPreviewRow {
    fn from(s: &EntitySnapshot) -> Self {
        Self {
            entity: s.record.entity.clone(),
            report_date: s.record.report_date.to_string(),
            pop_millions: format_opt(s.pop_millions, 1),
            gap_doses: format_opt(s.gap_doses.map(|g| g as f64), 0),
            labs_per_10m: format_opt(s.labs_per_10m, 1),
            load_per_lab: format_opt(s.load_per_lab, 1),
            ratio: format_opt(s.ratio, 1),
            wastage_pct: format_opt(s.wastage_pct, 1),
            chw_per_100k: format_opt(s.chw_per_100k, 1),
            deploy_ratio: format_opt(s.deploy_ratio, 1),
        }
    }
}

/// Column names written when a table has no rows to derive them from.
pub trait CsvColumns {
    const COLUMNS: &'static [&'static str];
}

impl CsvColumns for SnapshotRow<'_> {
    const COLUMNS: &'static [&'static str] = &[
        "Country",
        "Report_Date",
        "Confirmed_Cases",
        "Suspected_Cases",
        "Weekly_New_Cases",
        "Case_Fatality_Rate",
        "Testing_Laboratories",
        "Vaccine_Dose_Allocated",
        "Vaccine_Dose_Deployed",
        "Trained_CHWs",
        "Deployed_CHWs",
        "pop_millions",
        "gap_doses",
        "labs_per_10M",
        "load_per_lab",
        "ratio",
        "wastage_pct",
        "chw_per_100k",
        "deploy_ratio",
    ];
}

/// A ranked value: whole counts stay integers in every output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RankValue {
    Count(i64),
    Ratio(f64),
}

impl RankValue {
    pub fn as_f64(self) -> f64 {
        match self {
            RankValue::Count(n) => n as f64,
            RankValue::Ratio(v) => v,
        }
    }
}

impl fmt::Display for RankValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankValue::Count(n) => write!(f, "{}", format_int(*n)),
            RankValue::Ratio(v) => write!(f, "{}", format_number(*v, 1)),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct RankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Country")]
    #[tabled(rename = "Country")]
    pub entity: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: RankValue,
}

impl CsvColumns for RankingRow {
    const COLUMNS: &'static [&'static str] = &["Rank", "Country", "Value"];
}

/// Choropleth layer row.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapRow {
    #[serde(rename = "Country")]
    pub entity: String,
    pub gap_doses: Option<i64>,
    pub pop_millions: Option<f64>,
}

impl CsvColumns for MapRow {
    const COLUMNS: &'static [&'static str] = &["Country", "gap_doses", "pop_millions"];
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct KpiSummary {
    pub total_gap_doses: Option<i64>,
    pub median_cfr: Option<f64>,
    pub median_load_per_lab: Option<f64>,
}
