use libstore::LocationRecord;
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
pub(crate) struct LocationRow {
    #[tabled(rename = "Store Name")]
    #[serde(rename = "Store Name")]
    name: String,
    #[tabled(rename = "Address")]
    #[serde(rename = "Address")]
    address: String,
    #[tabled(rename = "lat")]
    #[tabled(display("tabled::derive::display::option", ""))]
    #[serde(rename = "lat")]
    latitude: Option<f64>,
    #[tabled(rename = "lon")]
    #[tabled(display("tabled::derive::display::option", ""))]
    #[serde(rename = "lon")]
    longitude: Option<f64>,
}

impl LocationRow {
    pub(crate) fn new(record: &LocationRecord) -> Self {
        Self {
            name: record.name.clone(),
            address: record.address.clone(),
            latitude: record.latitude(),
            longitude: record.longitude(),
        }
    }
}
