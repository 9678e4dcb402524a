use crate::config::IngestConfig;
use crate::error::{ReportError, Result};
use crate::types::{RawRow, SurveillanceRecord, COLUMNS};
use crate::util::{parse_count, parse_date, parse_f64};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub total_rows: usize,
    pub entities: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl IngestReport {
    fn from_records(records: &[SurveillanceRecord]) -> Self {
        let entities: BTreeSet<&str> = records.iter().map(|r| r.entity.as_str()).collect();
        Self {
            total_rows: records.len(),
            entities: entities.len(),
            first_date: records.iter().map(|r| r.report_date).min(),
            last_date: records.iter().map(|r| r.report_date).max(),
        }
    }
}

/// Read a raw surveillance table and return its records sorted by
/// (entity, report date).
///
/// Header names are trimmed before the schema check. Any missing column or
/// unparsable cell fails the whole table.
pub fn normalize<R: Read>(
    reader: R,
    cfg: &IngestConfig,
) -> Result<(Vec<SurveillanceRecord>, IngestReport)> {
    let mut rdr = ReaderBuilder::new().from_reader(reader);

    let headers: StringRecord = rdr.headers()?.iter().map(str::trim).collect();
    let missing: Vec<String> = COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == **c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ReportError::Schema { missing });
    }
    rdr.set_headers(headers);

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        // Line 1 is the header.
        let row_no = idx + 2;
        let raw = result?;
        records.push(record_from_raw(row_no, raw, cfg)?);
    }

    sort_records(&mut records);
    let report = IngestReport::from_records(&records);
    info!(
        "Normalized {} rows covering {} entities",
        report.total_rows, report.entities
    );
    Ok((records, report))
}

fn required(row: usize, column: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ReportError::parse(row, column, "", "empty value")),
    }
}

fn record_from_raw(row: usize, raw: RawRow, cfg: &IngestConfig) -> Result<SurveillanceRecord> {
    let count = |column: &str, value: Option<String>| -> Result<u64> {
        let v = required(row, column, value)?;
        parse_count(row, column, &v)
    };

    let entity = required(row, "Country", raw.country)?.trim().to_string();
    let date_raw = required(row, "Report_Date", raw.report_date)?;
    let report_date = parse_date(row, "Report_Date", &date_raw, &cfg.date_formats)?;
    let cfr_raw = required(row, "Case_Fatality_Rate", raw.case_fatality_rate)?;

    Ok(SurveillanceRecord {
        entity,
        report_date,
        confirmed_cases: count("Confirmed_Cases", raw.confirmed_cases)?,
        suspected_cases: count("Suspected_Cases", raw.suspected_cases)?,
        weekly_new_cases: count("Weekly_New_Cases", raw.weekly_new_cases)?,
        case_fatality_rate: parse_f64(row, "Case_Fatality_Rate", &cfr_raw)?,
        testing_laboratories: count("Testing_Laboratories", raw.testing_laboratories)?,
        vaccine_dose_allocated: count("Vaccine_Dose_Allocated", raw.vaccine_dose_allocated)?,
        vaccine_dose_deployed: count("Vaccine_Dose_Deployed", raw.vaccine_dose_deployed)?,
        trained_chws: count("Trained_CHWs", raw.trained_chws)?,
        deployed_chws: count("Deployed_CHWs", raw.deployed_chws)?,
    })
}

/// Stable sort by entity then report date; equal keys keep input order.
pub fn sort_records(records: &mut [SurveillanceRecord]) {
    records.sort_by(|a, b| {
        a.entity
            .cmp(&b.entity)
            .then_with(|| a.report_date.cmp(&b.report_date))
    });
}

/// Write records as the tidy flat table (canonical headers, ISO dates).
pub fn write_tidy<W: Write>(writer: W, records: &[SurveillanceRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if records.is_empty() {
        wtr.write_record(COLUMNS)?;
    }
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Normalize `input` and persist the tidy table to `output`. The output file
/// is only created once the whole input parsed cleanly.
pub fn ingest_file(input: &Path, output: &Path, cfg: &IngestConfig) -> Result<IngestReport> {
    let file = File::open(input)?;
    let (records, report) = normalize(file, cfg)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_tidy(File::create(output)?, &records)?;
    info!("Wrote {} rows to {}", records.len(), output.display());
    Ok(report)
}

/// The tidy table held in memory for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<SurveillanceRecord>,
}

impl Dataset {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let (records, _) = normalize(reader, &IngestConfig::default())?;
        Ok(Self { records })
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading tidy table from {}", path.display());
        Self::from_reader(File::open(path)?)
    }

    /// Records sorted by (entity, report date).
    pub fn records(&self) -> &[SurveillanceRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<SurveillanceRecord>> for Dataset {
    fn from(mut records: Vec<SurveillanceRecord>) -> Self {
        sort_records(&mut records);
        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
 Country ,Report_Date, Confirmed_Cases,Suspected_Cases,Weekly_New_Cases,Case_Fatality_Rate,Testing_Laboratories,Vaccine_Dose_Allocated,Vaccine_Dose_Deployed,Trained_CHWs,Deployed_CHWs
Uganda,2024-02-01,10,40,5,0.01,3,1000,900,200,150
Nigeria,2024-03-01,30,90,12,0.02,10,5000,4000,800,600
Nigeria,2024-01-15 00:00:00,20,\"1,200\",8,0.03,9,5000,3500,700,500
";

    #[test]
    fn trims_headers_and_sorts_by_entity_then_date() {
        let (records, report) = normalize(RAW.as_bytes(), &IngestConfig::default()).unwrap();
        let keys: Vec<(&str, String)> = records
            .iter()
            .map(|r| (r.entity.as_str(), r.report_date.to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Nigeria", "2024-01-15".to_string()),
                ("Nigeria", "2024-03-01".to_string()),
                ("Uganda", "2024-02-01".to_string()),
            ]
        );
        assert_eq!(records[0].suspected_cases, 1200);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.entities, 2);
        assert_eq!(report.first_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(report.last_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let raw = "Country,Report_Date,Confirmed_Cases\nKenya,2024-01-01,1\n";
        match normalize(raw.as_bytes(), &IngestConfig::default()) {
            Err(ReportError::Schema { missing }) => {
                assert!(missing.contains(&"Suspected_Cases".to_string()));
                assert!(missing.contains(&"Deployed_CHWs".to_string()));
                assert!(!missing.contains(&"Country".to_string()));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn bad_date_fails_the_whole_table() {
        let raw = RAW.replace("2024-02-01", "sometime");
        match normalize(raw.as_bytes(), &IngestConfig::default()) {
            Err(ReportError::Parse { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "Report_Date");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn blank_counter_is_a_parse_error() {
        let raw = RAW.replace("10,40,5", "10,,5");
        let err = normalize(raw.as_bytes(), &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, ReportError::Parse { ref column, .. } if column == "Suspected_Cases"));
    }

    #[test]
    fn tidy_output_reads_back_identically() {
        let (records, _) = normalize(RAW.as_bytes(), &IngestConfig::default()).unwrap();
        let mut buf = Vec::new();
        write_tidy(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Country,Report_Date,Confirmed_Cases,"));
        assert!(text.contains("Nigeria,2024-01-15,20,1200,8,0.03,"));

        let dataset = Dataset::from_reader(buf.as_slice()).unwrap();
        assert_eq!(dataset.records(), records.as_slice());
    }

    #[test]
    fn failed_ingest_writes_nothing() {
        let dir = std::env::temp_dir().join(format!("mpox_ingest_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("raw.csv");
        let output = dir.join("processed").join("clean.csv");
        fs::write(&input, RAW.replace("2024-03-01", "2024-13-45")).unwrap();

        let err = ingest_file(&input, &output, &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, ReportError::Parse { ref column, .. } if column == "Report_Date"));
        assert!(!output.exists());

        fs::write(&input, RAW).unwrap();
        let report = ingest_file(&input, &output, &IngestConfig::default()).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(Dataset::load(&output).unwrap().records().len(), 3);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_table_still_writes_header() {
        let mut buf = Vec::new();
        write_tidy(&mut buf, &[]).unwrap();
        let dataset = Dataset::from_reader(buf.as_slice()).unwrap();
        assert!(dataset.is_empty());
    }
}
