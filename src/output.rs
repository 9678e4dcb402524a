use crate::charts::{chart_specs, ranking_file, MAP_FILE};
use crate::error::Result;
use crate::reports::Report;
use crate::types::{CsvColumns, KpiSummary, SnapshotRow};
use crate::util::format_opt;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub const SNAPSHOT_FILE: &str = "snapshots.csv";
pub const KPI_FILE: &str = "kpis.json";
pub const CHART_FILE: &str = "charts.json";

/// Write `rows` as CSV. An empty table still gets its header row.
pub fn write_csv<T: Serialize + CsvColumns>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        wtr.write_record(T::COLUMNS)?;
    }
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

/// Write every table, the KPIs and the chart specs into `out_dir`.
/// Returns the written paths in write order.
pub fn write_report(out_dir: &Path, report: &Report) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    let path = out_dir.join(SNAPSHOT_FILE);
    let rows: Vec<SnapshotRow> = report.derived.snapshots.iter().map(SnapshotRow::from).collect();
    write_csv(&path, &rows)?;
    written.push(path);

    for table in &report.rankings {
        let path = out_dir.join(ranking_file(table.metric));
        write_csv(&path, &table.rows)?;
        written.push(path);
    }

    let path = out_dir.join(MAP_FILE);
    write_csv(&path, &report.map)?;
    written.push(path);

    let path = out_dir.join(KPI_FILE);
    write_json(&path, &report.kpis)?;
    written.push(path);

    let path = out_dir.join(CHART_FILE);
    write_json(&path, &chart_specs(&report.rankings))?;
    written.push(path);

    info!("Wrote {} files to {}", written.len(), out_dir.display());
    Ok(written)
}

/// KPI labels and display values.
pub fn kpi_lines(kpis: &KpiSummary) -> [(&'static str, String); 3] {
    let millions = kpis.total_gap_doses.map(|g| g as f64 / 1e6);
    [
        ("Total Gap Doses", with_unit(format_opt(millions, 1), " M")),
        ("Median CFR", with_unit(format_opt(kpis.median_cfr.map(|c| c * 100.0), 1), " %")),
        ("Avg Lab Load", format_opt(kpis.median_load_per_lab, 0)),
    ]
}

fn with_unit(value: String, unit: &str) -> String {
    if value == "n/a" {
        value
    } else {
        value + unit
    }
}

pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MapRow, RankValue, RankingRow};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mpox_output_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn empty_tables_keep_their_header() {
        let dir = scratch_dir("empty");
        let ranking = dir.join("rank.csv");
        write_csv::<RankingRow>(&ranking, &[]).unwrap();
        assert_eq!(fs::read_to_string(&ranking).unwrap(), "Rank,Country,Value\n");

        let map = dir.join("map.csv");
        write_csv::<MapRow>(&map, &[]).unwrap();
        assert_eq!(fs::read_to_string(&map).unwrap(), "Country,gap_doses,pop_millions\n");

        let snapshots = dir.join("snapshots.csv");
        write_csv::<SnapshotRow>(&snapshots, &[]).unwrap();
        let header = fs::read_to_string(&snapshots).unwrap();
        assert!(header.starts_with("Country,Report_Date,"));
        assert!(header.trim_end().ends_with(",chw_per_100k,deploy_ratio"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn count_rankings_are_written_without_fraction() {
        let dir = scratch_dir("counts");
        let path = dir.join("rank.csv");
        let rows = vec![
            RankingRow {
                rank: 1,
                entity: "Nigeria".into(),
                value: RankValue::Count(700),
            },
            RankingRow {
                rank: 2,
                entity: "Togo".into(),
                value: RankValue::Ratio(25.5),
            },
        ];
        write_csv(&path, &rows).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Rank,Country,Value\n1,Nigeria,700\n2,Togo,25.5\n"
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn kpis_render_like_the_dashboard() {
        let kpis = KpiSummary {
            total_gap_doses: Some(19_380_000),
            median_cfr: Some(0.034),
            median_load_per_lab: Some(1_234.4),
        };
        let lines = kpi_lines(&kpis);
        assert_eq!(lines[0], ("Total Gap Doses", "19.4 M".to_string()));
        assert_eq!(lines[1], ("Median CFR", "3.4 %".to_string()));
        assert_eq!(lines[2], ("Avg Lab Load", "1,234".to_string()));
    }

    #[test]
    fn missing_kpis_show_na() {
        let kpis = KpiSummary {
            total_gap_doses: None,
            median_cfr: None,
            median_load_per_lab: None,
        };
        assert!(kpi_lines(&kpis).iter().all(|(_, v)| v == "n/a"));
    }
}
