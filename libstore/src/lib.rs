//! This is a library that keeps a list of stores in a CSV file and fills in their geographic
//! coordinates by looking up their postal addresses with a geocoding service.

pub mod enrich;
pub mod error;
pub mod geocode;
pub mod record;
pub mod store;
pub mod view;

pub use error::Error;
pub use error::Result;
pub use record::{Coordinate, LocationRecord, LocationTable};
pub use store::RecordStore;
