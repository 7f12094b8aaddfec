//! Filling in missing coordinates for every record of a [LocationTable]
use crate::{
    Error, Result,
    geocode::{self, Geocoder},
    record::{Coordinate, LocationRecord, LocationTable},
};
use std::{fmt, time::Duration};
use tracing::{debug, info, warn};

/// Pacing of requests to the geocoding provider
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// How long to wait for a single lookup before giving up on it
    pub lookup_timeout: Duration,
    /// Pause after every lookup
    pub request_delay: Duration,
    /// Pause after a lookup that failed with a timeout or a service error. Replaces
    /// `request_delay` for that lookup.
    pub cooldown: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(10),
            request_delay: Duration::from_millis(500),
            cooldown: Duration::from_secs(1),
        }
    }
}

/// Why a record was left without a coordinate
#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    NotFound,
    Timeout,
    Service(String),
}

impl From<geocode::Error> for WarningKind {
    fn from(value: geocode::Error) -> Self {
        match value {
            geocode::Error::Timeout => Self::Timeout,
            geocode::Error::Service(msg) => Self::Service(msg),
        }
    }
}

/// A record that could not be resolved during a pass
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    /// Position of the record in the table
    pub row: usize,
    pub name: String,
    pub address: String,
    pub kind: WarningKind,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::NotFound => write!(f, "Unable to find address: {}", self.address),
            WarningKind::Timeout => write!(
                f,
                "Geocoding timed out: {} ({})",
                self.name, self.address
            ),
            WarningKind::Service(msg) => write!(
                f,
                "Geocoding error: {} ({}) - {msg}",
                self.name, self.address
            ),
        }
    }
}

/// What happened to a single record
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The record already had a coordinate
    Skipped,
    Resolved(Coordinate),
    Unresolved(Warning),
}

/// Progress notification, sent once per record in table order
#[derive(Debug)]
pub struct Progress<'a> {
    /// Number of records handled so far, including this one
    pub completed: usize,
    pub total: usize,
    pub record: &'a LocationRecord,
    pub outcome: &'a Outcome,
}

impl Progress<'_> {
    /// Share of the table that has been handled, between 0 and 1
    pub fn fraction(&self) -> f64 {
        self.completed as f64 / self.total as f64
    }
}

/// Summary of a finished pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Report {
    pub total: usize,
    /// Records that already had a coordinate
    pub skipped: usize,
    /// Requests sent to the geocoding provider
    pub lookups: usize,
    pub resolved: usize,
    /// Records left without a coordinate, in table order
    pub warnings: Vec<Warning>,
}

/// Runs enrichment passes against a single geocoding provider
pub struct Enricher<G> {
    geocoder: G,
    policy: Policy,
}

impl<G: Geocoder> Enricher<G> {
    pub fn new(geocoder: G, policy: Policy) -> Self {
        Self { geocoder, policy }
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    async fn lookup(&self, address: &str) -> std::result::Result<Option<Coordinate>, WarningKind> {
        if address.trim().is_empty() {
            return Err(WarningKind::NotFound);
        }
        match tokio::time::timeout(self.policy.lookup_timeout, self.geocoder.resolve(address))
            .await
        {
            Ok(res) => res.map_err(WarningKind::from),
            Err(_) => Err(WarningKind::Timeout),
        }
    }

    /// Resolve the address of every record that doesn't have a coordinate yet.
    ///
    /// Records are handled one at a time in table order. A failed lookup never aborts the pass:
    /// the record keeps no coordinate and a [Warning] is added to the report. `on_progress` is
    /// called after every record. An empty table is rejected before anything is looked up.
    pub async fn run<F>(&self, table: &mut LocationTable, mut on_progress: F) -> Result<Report>
    where
        F: FnMut(&Progress<'_>),
    {
        if table.is_empty() {
            return Err(Error::EmptyTable);
        }
        let total = table.len();
        info!(
            total,
            pending = table.pending_count(),
            provider = self.geocoder.name(),
            "Starting enrichment pass"
        );
        let mut report = Report {
            total,
            ..Default::default()
        };

        for (row, record) in table.records_mut().iter_mut().enumerate() {
            let mut pause = None;
            let outcome = if record.is_coordinated() {
                report.skipped += 1;
                Outcome::Skipped
            } else {
                debug!(row, name = %record.name, "Looking up address");
                if !record.address.trim().is_empty() {
                    report.lookups += 1;
                    pause = Some(self.policy.request_delay);
                }
                match self.lookup(&record.address).await {
                    Ok(Some(coordinate)) => {
                        record.coordinate = Some(coordinate);
                        report.resolved += 1;
                        Outcome::Resolved(coordinate)
                    }
                    res => {
                        let kind = match res {
                            Ok(_) => WarningKind::NotFound,
                            Err(kind) => kind,
                        };
                        if matches!(kind, WarningKind::Timeout | WarningKind::Service(_)) {
                            pause = Some(self.policy.cooldown);
                        }
                        let warning = Warning {
                            row,
                            name: record.name.clone(),
                            address: record.address.clone(),
                            kind,
                        };
                        warn!(row, "{warning}");
                        report.warnings.push(warning.clone());
                        Outcome::Unresolved(warning)
                    }
                }
            };

            on_progress(&Progress {
                completed: row + 1,
                total,
                record,
                outcome: &outcome,
            });

            if let Some(pause) = pause
                && row + 1 < total
            {
                tokio::time::sleep(pause).await;
            }
        }

        info!(
            lookups = report.lookups,
            resolved = report.resolved,
            unresolved = report.warnings.len(),
            "Finished enrichment pass"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Mutex};
    use test_log::test;
    use tokio::time::Instant;

    #[derive(Clone)]
    enum Answer {
        Found(f64, f64),
        NotFound,
        Fail(geocode::Error),
        Hang,
    }

    #[derive(Default)]
    struct ScriptedGeocoder {
        answers: HashMap<String, Answer>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGeocoder {
        fn answer(mut self, address: &str, answer: Answer) -> Self {
            self.answers.insert(address.to_string(), answer);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for ScriptedGeocoder {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn resolve(
            &self,
            address: &str,
        ) -> std::result::Result<Option<Coordinate>, geocode::Error> {
            self.calls.lock().unwrap().push(address.to_string());
            match self.answers.get(address).cloned().unwrap_or(Answer::NotFound) {
                Answer::Found(lat, lon) => Ok(Some(Coordinate::try_new(lat, lon).unwrap())),
                Answer::NotFound => Ok(None),
                Answer::Fail(e) => Err(e),
                Answer::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }
    }

    fn record(name: &str, address: &str, coordinate: Option<(f64, f64)>) -> LocationRecord {
        LocationRecord::new(
            name.into(),
            address.into(),
            coordinate.map(|(lat, lon)| Coordinate::try_new(lat, lon).unwrap()),
        )
        .unwrap()
    }

    async fn run(
        enricher: &Enricher<ScriptedGeocoder>,
        table: &mut LocationTable,
    ) -> (Report, Vec<f64>) {
        let mut fractions = vec![];
        let report = enricher
            .run(table, |p| fractions.push(p.fraction()))
            .await
            .expect("Enrichment pass failed");
        (report, fractions)
    }

    #[test(tokio::test(start_paused = true))]
    async fn resolves_missing_coordinate() {
        let gc = ScriptedGeocoder::default().answer("1 Main St", Answer::Found(35.0, 139.0));
        let enricher = Enricher::new(gc, Policy::default());
        let mut table = LocationTable::new(vec![record("Store A", "1 Main St", None)]);
        let (report, fractions) = run(&enricher, &mut table).await;

        assert_eq!(
            table,
            LocationTable::new(vec![record("Store A", "1 Main St", Some((35.0, 139.0)))])
        );
        assert_eq!(report.lookups, 1);
        assert_eq!(report.resolved, 1);
        assert!(report.warnings.is_empty());
        assert_eq!(fractions, vec![1.0]);
    }

    #[test(tokio::test(start_paused = true))]
    async fn not_found_leaves_record() {
        let gc = ScriptedGeocoder::default().answer("??", Answer::NotFound);
        let enricher = Enricher::new(gc, Policy::default());
        let original = LocationTable::new(vec![record("Store B", "??", None)]);
        let mut table = original.clone();
        let (report, _) = run(&enricher, &mut table).await;

        assert_eq!(table, original);
        assert_eq!(
            report.warnings,
            vec![Warning {
                row: 0,
                name: "Store B".into(),
                address: "??".into(),
                kind: WarningKind::NotFound,
            }]
        );
    }

    #[test(tokio::test(start_paused = true))]
    async fn timeout_applies_cooldown() {
        let gc = ScriptedGeocoder::default()
            .answer("X", Answer::Fail(geocode::Error::Timeout))
            .answer("Y", Answer::Found(34.0, 135.0));
        let enricher = Enricher::new(gc, Policy::default());
        let mut table = LocationTable::new(vec![
            record("Store C", "X", None),
            record("Store D", "Y", None),
        ]);

        let start = Instant::now();
        let mut lookup_started = None;
        let report = enricher
            .run(&mut table, |p| {
                if p.completed == 1 {
                    lookup_started = Some(Instant::now());
                }
            })
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(table.iter().next().unwrap().coordinate, None);
        assert!(table.iter().nth(1).unwrap().is_coordinated());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::Timeout);
        // the first record finished immediately, the cooldown came before the second record
        assert!(lookup_started.unwrap() - start < Duration::from_millis(1));
        assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1500), "{elapsed:?}");
    }

    #[test(tokio::test(start_paused = true))]
    async fn slow_provider_times_out() {
        let gc = ScriptedGeocoder::default().answer("slow", Answer::Hang);
        let policy = Policy {
            lookup_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        let enricher = Enricher::new(gc, policy);
        let mut table = LocationTable::new(vec![record("Store E", "slow", None)]);

        let start = Instant::now();
        let (report, _) = run(&enricher, &mut table).await;
        let elapsed = start.elapsed();

        assert_eq!(report.warnings[0].kind, WarningKind::Timeout);
        assert!(!table.has_coordinates());
        assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "{elapsed:?}");
    }

    #[test(tokio::test(start_paused = true))]
    async fn service_error_is_reported() {
        let gc = ScriptedGeocoder::default().answer(
            "bad",
            Answer::Fail(geocode::Error::Service("REQUEST_DENIED".into())),
        );
        let enricher = Enricher::new(gc, Policy::default());
        let mut table = LocationTable::new(vec![record("Store F", "bad", None)]);
        let (report, _) = run(&enricher, &mut table).await;
        assert_eq!(
            report.warnings[0].kind,
            WarningKind::Service("REQUEST_DENIED".into())
        );
        assert_eq!(
            report.warnings[0].to_string(),
            "Geocoding error: Store F (bad) - REQUEST_DENIED"
        );
    }

    #[test(tokio::test(start_paused = true))]
    async fn skips_coordinated_records() {
        let gc = ScriptedGeocoder::default().answer("2 Main St", Answer::Found(35.5, 139.5));
        let enricher = Enricher::new(gc, Policy::default());
        let mut table = LocationTable::new(vec![
            record("Store A", "1 Main St", Some((35.0, 139.0))),
            record("Store B", "2 Main St", None),
        ]);
        let (report, fractions) = run(&enricher, &mut table).await;

        assert_eq!(enricher.geocoder().calls(), vec!["2 Main St".to_string()]);
        assert_eq!(report.lookups, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(fractions, vec![0.5, 1.0]);
    }

    #[test(tokio::test(start_paused = true))]
    async fn second_pass_is_a_no_op() {
        let gc = ScriptedGeocoder::default()
            .answer("1 Main St", Answer::Found(35.0, 139.0))
            .answer("2 Main St", Answer::Found(34.0, 135.0))
            .answer("3 Main St", Answer::Found(43.0, 141.3));
        let enricher = Enricher::new(gc, Policy::default());
        let mut table = LocationTable::new(vec![
            record("Store A", "1 Main St", None),
            record("Store A", "1 Main St", None),
            record("Store B", "2 Main St", None),
            record("Store C", "3 Main St", None),
        ]);
        run(&enricher, &mut table).await;
        let after_first = table.clone();
        assert_eq!(enricher.geocoder().calls().len(), 4);

        let start = Instant::now();
        let (report, fractions) = run(&enricher, &mut table).await;
        assert_eq!(table, after_first);
        assert_eq!(report.lookups, 0);
        assert_eq!(report.skipped, 4);
        assert_eq!(enricher.geocoder().calls().len(), 4);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(fractions, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test(tokio::test(start_paused = true))]
    async fn pairing_and_progress_with_mixed_outcomes() {
        let gc = ScriptedGeocoder::default()
            .answer("a", Answer::Found(35.0, 139.0))
            .answer("b", Answer::NotFound)
            .answer("c", Answer::Fail(geocode::Error::Service("boom".into())))
            .answer("d", Answer::Fail(geocode::Error::Timeout))
            .answer("e", Answer::Found(-33.9, 151.2));
        let enricher = Enricher::new(gc, Policy::default());
        let mut table = LocationTable::new(
            ["a", "b", "c", "d", "e", ""]
                .iter()
                .map(|addr| record("Store", addr, None))
                .collect(),
        );
        let (report, fractions) = run(&enricher, &mut table).await;

        for r in &table {
            assert_eq!(r.latitude().is_some(), r.longitude().is_some());
        }
        assert_eq!(table.coordinated_count(), 2);
        assert_eq!(report.warnings.len(), 4);
        // a blank address never reaches the provider
        assert_eq!(report.lookups, 5);
        assert_eq!(report.warnings[3].kind, WarningKind::NotFound);
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(fractions.last(), Some(&1.0));
    }

    #[test(tokio::test(start_paused = true))]
    async fn empty_table_is_rejected() {
        let enricher = Enricher::new(ScriptedGeocoder::default(), Policy::default());
        let mut table = LocationTable::default();
        let res = enricher.run(&mut table, |_| {}).await;
        assert!(matches!(res, Err(Error::EmptyTable)));
        assert!(enricher.geocoder().calls().is_empty());
    }
}
