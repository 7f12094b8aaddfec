//! Utilities for printing store data
use clap::ValueEnum;
use serde::Serialize;
use table::StorectlTable;
use tabled::{Table, Tabled};

pub(crate) mod rows;
pub(crate) mod table;

/// Data format for printing the list of stores
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub(crate) enum OutputFormat {
    /// Human readable table of data
    Table,
    /// Comma-separated values for importing into a spreadsheet
    Csv,
    /// JSON-formatted objects
    Json,
    /// YAML-formatted objects
    Yaml,
}

/// Serialize a sequence of objects into the given data format
pub(crate) fn format_seq<I>(items: I, fmt: OutputFormat) -> anyhow::Result<String>
where
    I: IntoIterator,
    <I as IntoIterator>::Item: Tabled + Serialize + 'static,
{
    let iter = items.into_iter();
    match fmt {
        OutputFormat::Table => {
            let mut table = Table::new(iter);
            let n = table.count_rows() - 1;
            Ok(format!("{}\n{} records found", table.styled(), n,))
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(vec![]);
            iter.map(|item| writer.serialize(item))
                .collect::<Result<Vec<_>, _>>()?;
            writer.flush()?;
            String::from_utf8(writer.into_inner()?).map_err(|e| e.into())
        }
        OutputFormat::Json => {
            serde_json::to_string(&iter.collect::<Vec<_>>()).map_err(|e| e.into())
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(&iter.collect::<Vec<_>>()).map_err(|e| e.into())
        }
    }
}

#[cfg(test)]
mod test {
    use super::rows::LocationRow;
    use super::*;
    use libstore::{Coordinate, LocationRecord};

    fn rows() -> Vec<LocationRow> {
        [
            LocationRecord::new(
                "Store A".into(),
                "1 Main St".into(),
                Some(Coordinate::try_new(35.0, 139.0).unwrap()),
            )
            .unwrap(),
            LocationRecord::new("Store B".into(), "??".into(), None).unwrap(),
        ]
        .iter()
        .map(LocationRow::new)
        .collect()
    }

    #[test]
    fn csv_output() {
        let out = format_seq(rows(), OutputFormat::Csv).unwrap();
        assert_eq!(
            out,
            "Store Name,Address,lat,lon\nStore A,1 Main St,35.0,139.0\nStore B,??,,\n"
        );
    }

    #[test]
    fn json_output() {
        let out = format_seq(rows(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["Store Name"], "Store A");
        assert_eq!(parsed[0]["lat"], 35.0);
        assert!(parsed[1]["lon"].is_null());
    }

    #[test]
    fn table_output_counts_records() {
        let out = format_seq(rows(), OutputFormat::Table).unwrap();
        assert!(out.ends_with("2 records found"));
        assert!(out.contains("Store B"));
    }
}
