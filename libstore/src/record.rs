//! The in-memory representation of the store list
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside of the valid latitude and longitude ranges
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinate(latitude, longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// A single store from the backing table
///
/// Latitude and longitude are stored together as a [Coordinate] so a record either has both or
/// neither.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub name: String,
    pub address: String,
    pub coordinate: Option<Coordinate>,
    /// Values of columns this crate doesn't interpret, in the table's column order
    pub extra: Vec<String>,
}

impl LocationRecord {
    pub fn new(name: String, address: String, coordinate: Option<Coordinate>) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::EmptyName);
        }
        Ok(Self {
            name,
            address,
            coordinate,
            extra: Vec::new(),
        })
    }

    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinate.map(|c| c.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coordinate.map(|c| c.longitude)
    }

    pub fn is_coordinated(&self) -> bool {
        self.coordinate.is_some()
    }
}

/// An ordered list of stores, loaded and persisted as a whole
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationTable {
    extra_columns: Vec<String>,
    records: Vec<LocationRecord>,
}

impl LocationTable {
    pub fn new(records: Vec<LocationRecord>) -> Self {
        Self {
            extra_columns: Vec::new(),
            records,
        }
    }

    /// Create a table that carries additional, uninterpreted columns. Every record is expected
    /// to hold one `extra` value per column.
    pub fn with_extra_columns(extra_columns: Vec<String>, records: Vec<LocationRecord>) -> Self {
        Self {
            extra_columns,
            records,
        }
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocationRecord> {
        self.records.iter()
    }

    pub(crate) fn records_mut(&mut self) -> &mut [LocationRecord] {
        &mut self.records
    }

    pub fn coordinated(&self) -> impl Iterator<Item = &LocationRecord> {
        self.records.iter().filter(|r| r.is_coordinated())
    }

    pub fn coordinated_count(&self) -> usize {
        self.coordinated().count()
    }

    /// Whether at least one record already has a coordinate
    pub fn has_coordinates(&self) -> bool {
        self.records.iter().any(LocationRecord::is_coordinated)
    }

    /// Number of records that still need to be geocoded
    pub fn pending_count(&self) -> usize {
        self.len() - self.coordinated_count()
    }

    /// Forget every coordinate so the next enrichment pass resolves all records again
    pub fn clear_coordinates(&mut self) {
        for record in self.records.iter_mut() {
            record.coordinate = None;
        }
    }
}

impl<'a> IntoIterator for &'a LocationTable {
    type Item = &'a LocationRecord;
    type IntoIter = std::slice::Iter<'a, LocationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
