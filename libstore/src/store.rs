//! Loading and saving the store list as a CSV file
use crate::{
    Error, Result,
    record::{Coordinate, LocationRecord, LocationTable},
};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Column holding the display name of a store
pub const NAME_COLUMN: &str = "Store Name";
/// Column holding the free-text postal address
pub const ADDRESS_COLUMN: &str = "Address";
pub const LATITUDE_COLUMN: &str = "lat";
pub const LONGITUDE_COLUMN: &str = "lon";

// spreadsheet applications use this to detect UTF-8
const BOM: &str = "\u{feff}";

/// A flat CSV file that holds the whole [LocationTable]
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

struct Columns {
    name: usize,
    address: usize,
    latitude: Option<usize>,
    longitude: Option<usize>,
    extra: Vec<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |col: &str| headers.iter().position(|h| h.trim() == col);
        let name = find(NAME_COLUMN).ok_or(Error::MissingColumn(NAME_COLUMN))?;
        let address = find(ADDRESS_COLUMN).ok_or(Error::MissingColumn(ADDRESS_COLUMN))?;
        let latitude = find(LATITUDE_COLUMN);
        let longitude = find(LONGITUDE_COLUMN);
        let known = [Some(name), Some(address), latitude, longitude];
        let extra = (0..headers.len())
            .filter(|i| !known.contains(&Some(*i)))
            .collect();
        Ok(Self {
            name,
            address,
            latitude,
            longitude,
            extra,
        })
    }
}

fn parse_degrees(value: Option<&str>, line: u64, column: &str) -> Result<Option<f64>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<f64>().map(Some).map_err(|e| Error::InvalidRecord {
            line,
            reason: format!("column '{column}': {e}"),
        }),
    }
}

fn parse_record(columns: &Columns, row: &StringRecord) -> Result<LocationRecord> {
    let line = row.position().map(|p| p.line()).unwrap_or_default();
    let field = |i: usize| row.get(i).unwrap_or_default().to_string();
    let lat = parse_degrees(
        columns.latitude.and_then(|i| row.get(i)),
        line,
        LATITUDE_COLUMN,
    )?;
    let lon = parse_degrees(
        columns.longitude.and_then(|i| row.get(i)),
        line,
        LONGITUDE_COLUMN,
    )?;
    let coordinate = match (lat, lon) {
        (Some(lat), Some(lon)) => {
            Some(
                Coordinate::try_new(lat, lon).map_err(|e| Error::InvalidRecord {
                    line,
                    reason: e.to_string(),
                })?,
            )
        }
        (None, None) => None,
        _ => {
            warn!(line, "Ignoring incomplete coordinate, it will be resolved again");
            None
        }
    };
    let record = LocationRecord::new(field(columns.name), field(columns.address), coordinate)
        .map_err(|e| Error::InvalidRecord {
            line,
            reason: e.to_string(),
        })?;
    Ok(record.with_extra(columns.extra.iter().map(|i| field(*i)).collect()))
}

fn format_degrees(value: Option<f64>) -> String {
    // Debug keeps the decimal point for whole numbers
    value.map(|v| format!("{v:?}")).unwrap_or_default()
}

impl RecordStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole table from the backing file.
    ///
    /// The returned flag tells whether at least one record already has a coordinate. A missing or
    /// unreadable file is treated as an empty table.
    pub fn load(&self) -> Result<(LocationTable, bool)> {
        debug!(path = ?self.path, "Loading store data");
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "Store file doesn't exist yet");
                return Ok((LocationTable::default(), false));
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Store file is unreadable, using an empty table");
                return Ok((LocationTable::default(), false));
            }
        };
        let contents = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Store file is not valid UTF-8, using an empty table");
                return Ok((LocationTable::default(), false));
            }
        };
        let table = Self::parse(contents.strip_prefix(BOM).unwrap_or(&contents))?;
        let has_coordinates = table.has_coordinates();
        debug!(
            records = table.len(),
            coordinated = table.coordinated_count(),
            "Loaded store data"
        );
        Ok((table, has_coordinates))
    }

    fn parse(contents: &str) -> Result<LocationTable> {
        if contents.trim().is_empty() {
            return Ok(LocationTable::default());
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(contents.as_bytes());
        let headers = reader.headers()?.clone();
        let columns = Columns::from_headers(&headers)?;
        let extra_columns = columns
            .extra
            .iter()
            .map(|i| headers[*i].to_string())
            .collect();
        let records = reader
            .records()
            .map(|row| parse_record(&columns, &row?))
            .collect::<Result<Vec<_>>>()?;
        Ok(LocationTable::with_extra_columns(extra_columns, records))
    }

    /// Write the whole table to the backing file.
    ///
    /// The data is written to a temporary file next to the target and renamed over it, so the
    /// previous contents stay intact if anything fails.
    pub fn save(&self, table: &LocationTable) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(BOM.as_bytes())?;
        {
            let mut writer = WriterBuilder::new().from_writer(&mut tmp);
            let mut header = vec![NAME_COLUMN, ADDRESS_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN];
            header.extend(table.extra_columns().iter().map(String::as_str));
            writer.write_record(&header)?;
            for record in table {
                let mut row = vec![
                    record.name.clone(),
                    record.address.clone(),
                    format_degrees(record.latitude()),
                    format_degrees(record.longitude()),
                ];
                row.extend(record.extra.iter().cloned());
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        // dropping the returned file removes it from disk
        tmp.persist(&self.path).map_err(|e| Error::Persist(e.error))?;
        debug!(path = ?self.path, records = table.len(), "Saved store data");
        Ok(())
    }
}
