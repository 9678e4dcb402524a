//! Chart specifications handed to the presentation layer alongside each
//! table. Rendering itself happens elsewhere.
use crate::reports::{Metric, RankingTable};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Choropleth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scale: Option<&'static str>,
    /// Column of the source table plotted as the value.
    pub value_field: String,
    /// File the chart reads its rows from.
    pub source: String,
}

pub const MAP_FILE: &str = "map_vaccine_gap.csv";

pub fn ranking_file(metric: Metric) -> String {
    format!("rank_{}.csv", metric.key())
}

fn style(metric: Metric) -> (ChartKind, Option<Orientation>, Option<&'static str>) {
    use ChartKind::*;
    use Orientation::*;
    match metric {
        Metric::TotalConfirmedCases => (Bar, Some(Horizontal), Some("Blues")),
        Metric::PeakWeeklyNewCases => (Line, None, None),
        Metric::LoadPerLab => (Bar, Some(Vertical), Some("Viridis")),
        Metric::SuspectedConfirmedRatio => (Scatter, None, None),
        Metric::ChwPer100k => (Bar, Some(Horizontal), Some("Teal")),
        Metric::GapDoses => (Bar, Some(Horizontal), Some("Reds")),
        Metric::WastagePct => (Bar, Some(Horizontal), Some("Oranges")),
        Metric::DeployRatio => (Bar, Some(Vertical), Some("Greens")),
    }
}

pub fn ranking_chart(table: &RankingTable) -> ChartSpec {
    let (kind, orientation, color_scale) = style(table.metric);
    ChartSpec {
        id: table.metric.key().to_string(),
        title: table.title.clone(),
        kind,
        orientation,
        color_scale,
        value_field: "Value".to_string(),
        source: ranking_file(table.metric),
    }
}

pub fn map_chart() -> ChartSpec {
    ChartSpec {
        id: "vaccine_gap_map".to_string(),
        title: "Vaccine Gap Across Africa (All Countries)".to_string(),
        kind: ChartKind::Choropleth,
        orientation: None,
        color_scale: Some("Reds"),
        value_field: "gap_doses".to_string(),
        source: MAP_FILE.to_string(),
    }
}

/// One spec per ranking, then the map.
pub fn chart_specs(rankings: &[RankingTable]) -> Vec<ChartSpec> {
    rankings
        .iter()
        .map(ranking_chart)
        .chain(std::iter::once(map_chart()))
        .collect()
}
