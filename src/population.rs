//! Population reference: entity name to population in millions.
//!
//! An embedded table covers the entities of the published dataset; a JSON
//! object or a two-column CSV can replace it at run time.
use crate::error::{ReportError, Result};
use log::info;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 2024 population estimates, millions.
static EMBEDDED: Lazy<PopulationTable> = Lazy::new(|| {
    PopulationTable::from_pairs([
        ("Sierra Leone", 8.2),
        ("Uganda", 48.6),
        ("DR Congo", 115.0),
        ("Nigeria", 223.8),
        ("Ghana", 34.0),
        ("Cameroon", 28.6),
        ("Burundi", 13.2),
        ("Liberia", 5.4),
        ("Guinea", 14.2),
        ("Togo", 9.0),
        ("Sudan", 48.1),
        ("South Sudan", 11.4),
        ("Ethiopia", 126.5),
        ("Tanzania", 67.4),
        ("Kenya", 55.1),
        ("Mozambique", 34.5),
        ("Zambia", 20.6),
    ])
});

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopulationTable {
    millions: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct PopRow {
    #[serde(rename = "Country")]
    country: String,
    pop_millions: f64,
}

impl PopulationTable {
    pub fn embedded() -> Self {
        EMBEDDED.clone()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            millions: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parse a JSON object such as `{"Nigeria": 223.8}`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: BTreeMap<String, f64> = serde_json::from_reader(reader)?;
        let mut table = Self::default();
        for (row, (country, pop)) in raw.into_iter().enumerate() {
            table.insert_checked(row + 1, country, pop)?;
        }
        Ok(table)
    }

    /// Parse a CSV with columns `Country,pop_millions`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut table = Self::default();
        for (idx, result) in rdr.deserialize::<PopRow>().enumerate() {
            let row = result?;
            table.insert_checked(idx + 2, row.country, row.pop_millions)?;
        }
        Ok(table)
    }

    /// Load from a `.csv` file, or from JSON for any other extension.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let table = if is_csv {
            Self::from_csv_reader(file)?
        } else {
            Self::from_json_reader(file)?
        };
        info!(
            "Loaded population reference for {} entities from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    fn insert_checked(&mut self, row: usize, country: String, pop: f64) -> Result<()> {
        if !pop.is_finite() || pop < 0.0 {
            return Err(ReportError::parse(
                row,
                "pop_millions",
                &pop.to_string(),
                "population must be a non-negative number",
            ));
        }
        self.millions.insert(country.trim().to_string(), pop);
        Ok(())
    }

    pub fn get(&self, entity: &str) -> Option<f64> {
        self.millions.get(entity).copied()
    }

    pub fn len(&self) -> usize {
        self.millions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.millions.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.millions.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_has_seventeen_entities() {
        let table = PopulationTable::embedded();
        assert_eq!(table.len(), 17);
        assert_eq!(table.get("Nigeria"), Some(223.8));
        assert_eq!(table.get("DR Congo"), Some(115.0));
        assert_eq!(table.get("Chad"), None);
    }

    #[test]
    fn json_reference_replaces_embedded() {
        let table =
            PopulationTable::from_json_reader(r#"{"Chad": 18.3, "Niger": 27.2}"#.as_bytes())
                .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Chad"), Some(18.3));
        assert_eq!(table.get("Nigeria"), None);
    }

    #[test]
    fn csv_reference_trims_names() {
        let table =
            PopulationTable::from_csv_reader("Country,pop_millions\n Chad ,18.3\n".as_bytes())
                .unwrap();
        assert_eq!(table.entities().collect::<Vec<_>>(), vec!["Chad"]);
    }

    #[test]
    fn load_picks_format_by_extension() {
        let dir = std::env::temp_dir().join(format!("mpox_population_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let csv_path = dir.join("pop.CSV");
        std::fs::write(&csv_path, "Country,pop_millions\nChad,18.3\n").unwrap();
        let json_path = dir.join("pop.json");
        std::fs::write(&json_path, r#"{"Niger": 27.2}"#).unwrap();

        assert_eq!(PopulationTable::load(&csv_path).unwrap().get("Chad"), Some(18.3));
        assert_eq!(PopulationTable::load(&json_path).unwrap().get("Niger"), Some(27.2));
        // Anything that is not `.csv` is read as JSON.
        let txt_path = dir.join("pop.txt");
        std::fs::write(&txt_path, "Country,pop_millions\nChad,18.3\n").unwrap();
        assert!(PopulationTable::load(&txt_path).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn negative_population_is_rejected() {
        let err = PopulationTable::from_json_reader(r#"{"Chad": -1}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }
}
