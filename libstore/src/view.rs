//! What a map front end needs from an enriched table
use crate::record::{Coordinate, LocationRecord, LocationTable};

/// Zoom level when the map is centered on the user
pub const USER_ZOOM: u8 = 10;
/// Zoom level when the map shows all stores
pub const OVERVIEW_ZOOM: u8 = 5;

/// A read-only view of the stores that can be drawn on a map
#[derive(Debug)]
pub struct MapView<'a> {
    markers: Vec<&'a LocationRecord>,
    pub center: Coordinate,
    pub zoom: u8,
    pub user_location: Option<Coordinate>,
}

impl<'a> MapView<'a> {
    /// Build a view of every record that has a coordinate.
    ///
    /// The map is centered on `user_location` if one is given, otherwise on the mean position of
    /// all stores. Returns `None` if no record has a coordinate yet.
    pub fn new(table: &'a LocationTable, user_location: Option<Coordinate>) -> Option<Self> {
        let markers: Vec<_> = table.coordinated().collect();
        if markers.is_empty() {
            return None;
        }
        let (center, zoom) = match user_location {
            Some(loc) => (loc, USER_ZOOM),
            None => {
                let n = markers.len() as f64;
                let (lat, lon) = markers
                    .iter()
                    .filter_map(|r| r.coordinate)
                    .fold((0.0, 0.0), |(lat, lon), c| {
                        (lat + c.latitude, lon + c.longitude)
                    });
                (
                    Coordinate {
                        latitude: lat / n,
                        longitude: lon / n,
                    },
                    OVERVIEW_ZOOM,
                )
            }
        };
        Some(Self {
            markers,
            center,
            zoom,
            user_location,
        })
    }

    pub fn markers(&self) -> &[&'a LocationRecord] {
        &self.markers
    }

    /// A link that opens the view in the OpenStreetMap web viewer
    pub fn viewer_uri(&self) -> String {
        format!(
            "https://www.openstreetmap.org/#map={}/{:.5}/{:.5}",
            self.zoom, self.center.latitude, self.center.longitude
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn table() -> LocationTable {
        LocationTable::new(vec![
            LocationRecord::new(
                "A".into(),
                "a".into(),
                Some(Coordinate::try_new(34.0, 134.0).unwrap()),
            )
            .unwrap(),
            LocationRecord::new("B".into(), "b".into(), None).unwrap(),
            LocationRecord::new(
                "C".into(),
                "c".into(),
                Some(Coordinate::try_new(36.0, 138.0).unwrap()),
            )
            .unwrap(),
        ])
    }

    #[test]
    fn centered_on_stores() {
        let table = table();
        let view = MapView::new(&table, None).expect("no view");
        assert_eq!(view.markers().len(), 2);
        assert_eq!(view.center, Coordinate::try_new(35.0, 136.0).unwrap());
        assert_eq!(view.zoom, OVERVIEW_ZOOM);
        assert_eq!(
            view.viewer_uri(),
            "https://www.openstreetmap.org/#map=5/35.00000/136.00000"
        );
    }

    #[test]
    fn centered_on_user() {
        let table = table();
        let me = Coordinate::try_new(35.6762, 139.6503).unwrap();
        let view = MapView::new(&table, Some(me)).expect("no view");
        assert_eq!(view.center, me);
        assert_eq!(view.zoom, USER_ZOOM);
        assert_eq!(view.user_location, Some(me));
    }

    #[test]
    fn nothing_to_show() {
        let mut table = table();
        table.clear_coordinates();
        assert!(MapView::new(&table, None).is_none());
    }
}
