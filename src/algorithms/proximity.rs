//! Geofence and delivery-progress alerting.
//!
//! One call to [`ProximityAlertEngine::evaluate`] is one polling cycle. The
//! engine keeps no state between cycles; the only memory across cycles is the
//! caller-owned [`ThrottleTracker`] holding last emission times.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use rayon::prelude::*;
use std::collections::HashMap;

use crate::models::{
    Alert, AlertKind, GeofenceZone, Job, JobStatus, Km, Severity, WorkerLocation,
};
use crate::utils::config::AlertConfig;

/// Last emission time per (alert kind, subject id).
///
/// Entries are never dropped by [`ProximityAlertEngine::evaluate`]. A
/// long-running poller should call [`ThrottleTracker::prune`] every few cycles
/// with a `max_age` longer than the largest throttle window, so that records
/// of finished jobs go away without re-enabling a throttled alert.
#[derive(Debug, Clone, Default)]
pub struct ThrottleTracker {
    last_emitted: HashMap<(AlertKind, String), DateTime<Utc>>,
}

impl ThrottleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and records `now` when nothing was emitted for this key
    /// within `interval`; returns false otherwise, leaving the record as is.
    pub fn should_emit(
        &mut self,
        kind: AlertKind,
        key: &str,
        now: DateTime<Utc>,
        interval: Duration,
    ) -> bool {
        let slot = (kind, key.to_string());
        if let Some(prev) = self.last_emitted.get(&slot) {
            if now - *prev < interval {
                return false;
            }
        }
        self.last_emitted.insert(slot, now);
        true
    }

    pub fn last_emitted(&self, kind: AlertKind, key: &str) -> Option<DateTime<Utc>> {
        self.last_emitted.get(&(kind, key.to_string())).copied()
    }

    /// Drops records older than `max_age`, e.g. for jobs long finished
    pub fn prune(&mut self, now: DateTime<Utc>, max_age: Duration) {
        self.last_emitted.retain(|_, at| now - *at < max_age);
    }

    pub fn len(&self) -> usize {
        self.last_emitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_emitted.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProximityAlertEngine {
    config: AlertConfig,
}

impl ProximityAlertEngine {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    /// Estimated minutes left to deliver from `distance_km` away
    pub fn estimated_remaining_minutes(&self, distance_km: Km) -> f64 {
        distance_km * self.config.remaining_minutes_per_km + self.config.remaining_overhead_min
    }

    /// Runs every rule once over the current positions
    pub fn evaluate(
        &self,
        workers: &[WorkerLocation],
        active_jobs: &[Job],
        zones: &[GeofenceZone],
        now: DateTime<Utc>,
        throttle: &mut ThrottleTracker,
    ) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = workers
            .par_iter()
            .flat_map_iter(|worker| self.worker_alerts(worker, zones, now))
            .collect();

        let by_id: HashMap<&str, &WorkerLocation> = workers
            .iter()
            .map(|w| (w.worker_id.as_str(), w))
            .collect();

        for job in active_jobs.iter().filter(|j| j.status.is_active()) {
            alerts.extend(self.job_alerts(job, &by_id, now, throttle));
        }

        if !alerts.is_empty() {
            debug!(
                "{} alerts for {} workers / {} jobs",
                alerts.len(),
                workers.len(),
                active_jobs.len()
            );
        }
        alerts
    }

    /// Zone entry and inactivity; depend on the worker alone
    fn worker_alerts(
        &self,
        worker: &WorkerLocation,
        zones: &[GeofenceZone],
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if !worker.is_available {
            return alerts;
        }

        if let Some(position) = worker.known_position() {
            for zone in zones.iter().filter(|z| z.contains(&position)) {
                let meters = zone.center.distance_to(&position) * 1000.0;
                alerts.push(
                    Alert::new(
                        AlertKind::ZoneEntry,
                        Severity::Info,
                        &worker.worker_id,
                        None,
                        format!("{} is in zone {}", worker.name, zone.name),
                        now,
                    )
                    .with_zone(&zone.id)
                    .with_value(meters),
                );
            }
        }

        if worker.idle_for(now) > Duration::minutes(self.config.inactivity_minutes) {
            let idle = worker.minutes_since_update(now);
            alerts.push(
                Alert::new(
                    AlertKind::Inactivity,
                    Severity::Warning,
                    &worker.worker_id,
                    None,
                    format!("{} has not moved for {} min", worker.name, idle),
                    now,
                )
                .with_value(idle as f64),
            );
        }
        alerts
    }

    /// Deviation, lateness and arrival proximity for the worker assigned to `job`
    fn job_alerts(
        &self,
        job: &Job,
        workers: &HashMap<&str, &WorkerLocation>,
        now: DateTime<Utc>,
        throttle: &mut ThrottleTracker,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let worker = match job
            .assigned_worker_id
            .as_deref()
            .and_then(|id| workers.get(id))
        {
            Some(w) => *w,
            None => return alerts,
        };
        let (position, destination) = match (worker.known_position(), job.known_delivery_point()) {
            (Some(p), Some(d)) => (p, d),
            _ => return alerts,
        };
        let distance = position.distance_to(&destination);
        let cfg = &self.config;

        if job.status == JobStatus::Delivering && distance > cfg.deviation_km {
            alerts.push(
                Alert::new(
                    AlertKind::Deviation,
                    Severity::Critical,
                    &worker.worker_id,
                    Some(job.id.as_str()),
                    format!(
                        "{} is {:.1} km away from the delivery point of {}",
                        worker.name, distance, job.store_name
                    ),
                    now,
                )
                .with_value(distance),
            );
        }

        let remaining = self.estimated_remaining_minutes(distance);
        if job.age(now) > Duration::minutes(cfg.lateness_age_minutes)
            && remaining > cfg.lateness_remaining_minutes
            && throttle.should_emit(
                AlertKind::Lateness,
                &job.id,
                now,
                Duration::minutes(cfg.lateness_throttle_minutes),
            )
        {
            alerts.push(
                Alert::new(
                    AlertKind::Lateness,
                    Severity::Warning,
                    &worker.worker_id,
                    Some(job.id.as_str()),
                    format!(
                        "Delivery for {} is running late, about {} min left",
                        job.store_name,
                        remaining.round()
                    ),
                    now,
                )
                .with_value(remaining),
            );
        }

        if matches!(job.status, JobStatus::Delivering | JobStatus::InProgress)
            && distance < cfg.proximity_km
            && throttle.should_emit(
                AlertKind::Proximity,
                &job.id,
                now,
                Duration::minutes(cfg.proximity_throttle_minutes),
            )
        {
            alerts.push(
                Alert::new(
                    AlertKind::Proximity,
                    Severity::Info,
                    &worker.worker_id,
                    Some(job.id.as_str()),
                    format!(
                        "{} is {:.0} m from the delivery point",
                        worker.name,
                        distance * 1000.0
                    ),
                    now,
                )
                .with_value(distance),
            );
        }
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, JobCategory};
    use crate::utils::distance::EARTH_RADIUS_KM;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()
    }

    /// Point `meters` due north of `p`
    fn north_of(p: GeoPoint, meters: f64) -> GeoPoint {
        let d_lat = (meters / 1000.0 / EARTH_RADIUS_KM).to_degrees();
        GeoPoint::new(p.latitude + d_lat, p.longitude)
    }

    fn worker(id: &str, position: GeoPoint, available: bool) -> WorkerLocation {
        WorkerLocation::new(id, "Bringeur", Some(position), available, now())
    }

    fn job(id: &str, dest: GeoPoint, status: JobStatus, worker: &str, age_min: i64) -> Job {
        let mut j = Job::new(
            id,
            "Monoprix",
            Some(dest),
            JobCategory::Groceries,
            now() - Duration::minutes(age_min),
        );
        j.status = status;
        j.assigned_worker_id = Some(worker.to_string());
        j
    }

    fn of_kind(alerts: &[Alert], kind: AlertKind) -> Vec<&Alert> {
        alerts.iter().filter(|a| a.kind == kind).collect()
    }

    fn zone() -> GeofenceZone {
        GeofenceZone::new("z1", "Test", GeoPoint::new(48.85, 2.35), 1000.0, "#fff")
    }

    #[test]
    fn test_empty_inputs() {
        let engine = ProximityAlertEngine::default();
        let mut throttle = ThrottleTracker::new();
        assert!(engine.evaluate(&[], &[], &[], now(), &mut throttle).is_empty());
        assert!(throttle.is_empty());
    }

    #[test]
    fn test_zone_center_is_flagged() {
        let engine = ProximityAlertEngine::default();
        let z = zone();
        let alerts = engine.evaluate(
            &[worker("w1", z.center, true)],
            &[],
            &[z],
            now(),
            &mut ThrottleTracker::new(),
        );
        let entries = of_kind(&alerts, AlertKind::ZoneEntry);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].zone_id.as_deref(), Some("z1"));
        assert_eq!(entries[0].severity, Severity::Info);
    }

    #[test]
    fn test_just_outside_radius_is_not_flagged() {
        let engine = ProximityAlertEngine::default();
        let z = zone();
        let outside = north_of(z.center, z.radius_meters + 1.0);
        let inside = north_of(z.center, z.radius_meters - 1.0);
        let alerts = engine.evaluate(
            &[worker("out", outside, true), worker("in", inside, true)],
            &[],
            &[z],
            now(),
            &mut ThrottleTracker::new(),
        );
        let entries = of_kind(&alerts, AlertKind::ZoneEntry);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].worker_id, "in");
    }

    #[test]
    fn test_unavailable_worker_not_flagged() {
        let engine = ProximityAlertEngine::default();
        let z = zone();
        let alerts = engine.evaluate(
            &[worker("w1", z.center, false)],
            &[],
            &[z],
            now(),
            &mut ThrottleTracker::new(),
        );
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_zone_entry_repeats_every_cycle() {
        let engine = ProximityAlertEngine::default();
        let z = zone();
        let workers = [worker("w1", z.center, true)];
        let zones = [z];
        let mut throttle = ThrottleTracker::new();
        for minute in 0..3 {
            let alerts = engine.evaluate(
                &workers,
                &[],
                &zones,
                now() + Duration::minutes(minute),
                &mut throttle,
            );
            assert_eq!(of_kind(&alerts, AlertKind::ZoneEntry).len(), 1);
        }
    }

    #[test]
    fn test_inactivity() {
        let engine = ProximityAlertEngine::default();
        let mut w = worker("w1", GeoPoint::new(48.9, 2.4), true);
        w.updated_at = now() - Duration::minutes(31);
        let mut fresh = worker("w2", GeoPoint::new(48.9, 2.4), true);
        fresh.updated_at = now() - Duration::minutes(30);
        let mut off_duty = worker("w3", GeoPoint::new(48.9, 2.4), false);
        off_duty.updated_at = now() - Duration::minutes(120);

        let alerts = engine.evaluate(&[w, fresh, off_duty], &[], &[], now(), &mut ThrottleTracker::new());
        let idle = of_kind(&alerts, AlertKind::Inactivity);
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].worker_id, "w1");
        assert_eq!(idle[0].severity, Severity::Warning);
        assert_eq!(idle[0].value, Some(31.0));
    }

    #[test]
    fn test_inactivity_counts_seconds_past_the_limit() {
        let engine = ProximityAlertEngine::default();
        let mut w = worker("w1", GeoPoint::new(48.9, 2.4), true);
        w.updated_at = now() - Duration::minutes(30) - Duration::seconds(30);

        let alerts = engine.evaluate(&[w], &[], &[], now(), &mut ThrottleTracker::new());
        let idle = of_kind(&alerts, AlertKind::Inactivity);
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].value, Some(30.0));
    }

    #[test]
    fn test_route_deviation() {
        let engine = ProximityAlertEngine::default();
        let dest = GeoPoint::new(48.85, 2.35);
        let workers = [
            worker("far", north_of(dest, 6000.0), true),
            worker("ok", north_of(dest, 4000.0), true),
            worker("shop", north_of(dest, 6000.0), true),
        ];
        let jobs = [
            job("j1", dest, JobStatus::Delivering, "far", 10),
            job("j2", dest, JobStatus::Delivering, "ok", 10),
            job("j3", dest, JobStatus::Shopping, "shop", 10),
        ];
        let alerts = engine.evaluate(&workers, &jobs, &[], now(), &mut ThrottleTracker::new());
        let deviations = of_kind(&alerts, AlertKind::Deviation);
        assert_eq!(deviations.len(), 1);
        assert_eq!(deviations[0].job_id.as_deref(), Some("j1"));
        assert_eq!(deviations[0].severity, Severity::Critical);
    }

    #[test]
    fn test_lateness_is_throttled() {
        let engine = ProximityAlertEngine::default();
        let dest = GeoPoint::new(48.85, 2.35);
        let workers = [worker("w1", north_of(dest, 4000.0), true)];
        let jobs = [job("j1", dest, JobStatus::Shopping, "w1", 90)];
        let mut throttle = ThrottleTracker::new();

        let first = engine.evaluate(&workers, &jobs, &[], now(), &mut throttle);
        assert_eq!(of_kind(&first, AlertKind::Lateness).len(), 1);

        let later = now() + Duration::minutes(9);
        let second = engine.evaluate(&workers, &jobs, &[], later, &mut throttle);
        assert!(of_kind(&second, AlertKind::Lateness).is_empty());
        assert_eq!(throttle.last_emitted(AlertKind::Lateness, "j1"), Some(now()));

        let after = now() + Duration::minutes(10);
        let third = engine.evaluate(&workers, &jobs, &[], after, &mut throttle);
        assert_eq!(of_kind(&third, AlertKind::Lateness).len(), 1);
    }

    #[test]
    fn test_lateness_needs_age_and_remaining_time() {
        let engine = ProximityAlertEngine::default();
        let dest = GeoPoint::new(48.85, 2.35);
        let workers = [
            worker("young", north_of(dest, 4000.0), true),
            worker("close", north_of(dest, 500.0), true),
        ];
        let jobs = [
            job("j1", dest, JobStatus::Shopping, "young", 30),
            // 0.5 km -> 16 min left, under the 20 min bar
            job("j2", dest, JobStatus::Shopping, "close", 90),
        ];
        let alerts = engine.evaluate(&workers, &jobs, &[], now(), &mut ThrottleTracker::new());
        assert!(of_kind(&alerts, AlertKind::Lateness).is_empty());
    }

    #[test]
    fn test_lateness_counts_seconds_past_the_age_limit() {
        let engine = ProximityAlertEngine::default();
        let dest = GeoPoint::new(48.85, 2.35);
        let workers = [worker("w1", north_of(dest, 4400.0), true)];
        let mut j = job("j1", dest, JobStatus::Shopping, "w1", 60);
        j.created_at = now() - Duration::minutes(60) - Duration::seconds(30);

        let alerts = engine.evaluate(&workers, &[j], &[], now(), &mut ThrottleTracker::new());
        assert_eq!(of_kind(&alerts, AlertKind::Lateness).len(), 1);
    }

    #[test]
    fn test_estimated_remaining_minutes() {
        let engine = ProximityAlertEngine::default();
        assert_eq!(engine.estimated_remaining_minutes(0.0), 10.0);
        assert_eq!(engine.estimated_remaining_minutes(5.0), 70.0);
    }

    #[test]
    fn test_arrival_proximity_is_throttled() {
        let engine = ProximityAlertEngine::default();
        let dest = GeoPoint::new(48.85, 2.35);
        let workers = [worker("w1", north_of(dest, 300.0), true)];
        let jobs = [job("j1", dest, JobStatus::Delivering, "w1", 20)];
        let mut throttle = ThrottleTracker::new();

        let first = engine.evaluate(&workers, &jobs, &[], now(), &mut throttle);
        let near = of_kind(&first, AlertKind::Proximity);
        assert_eq!(near.len(), 1);
        assert!((near[0].value.unwrap() - 0.3).abs() < 1e-6);

        let second = engine.evaluate(&workers, &jobs, &[], now() + Duration::minutes(3), &mut throttle);
        assert!(of_kind(&second, AlertKind::Proximity).is_empty());

        let third = engine.evaluate(&workers, &jobs, &[], now() + Duration::minutes(5), &mut throttle);
        assert_eq!(of_kind(&third, AlertKind::Proximity).len(), 1);
    }

    #[test]
    fn test_proximity_ignores_other_statuses() {
        let engine = ProximityAlertEngine::default();
        let dest = GeoPoint::new(48.85, 2.35);
        let workers = [worker("w1", north_of(dest, 100.0), true)];
        let jobs = [
            job("j1", dest, JobStatus::Shopping, "w1", 20),
            job("j2", dest, JobStatus::Completed, "w1", 20),
        ];
        let alerts = engine.evaluate(&workers, &jobs, &[], now(), &mut ThrottleTracker::new());
        assert!(of_kind(&alerts, AlertKind::Proximity).is_empty());
    }

    #[test]
    fn test_throttle_keys_are_per_job() {
        let mut throttle = ThrottleTracker::new();
        let window = Duration::minutes(10);
        assert!(throttle.should_emit(AlertKind::Lateness, "j1", now(), window));
        assert!(throttle.should_emit(AlertKind::Lateness, "j2", now(), window));
        assert!(throttle.should_emit(AlertKind::Proximity, "j1", now(), window));
        assert!(!throttle.should_emit(AlertKind::Lateness, "j1", now(), window));
        assert_eq!(throttle.len(), 3);

        throttle.prune(now() + Duration::hours(2), Duration::hours(1));
        assert!(throttle.is_empty());
    }

    #[test]
    fn test_unassigned_job_is_skipped() {
        let engine = ProximityAlertEngine::default();
        let dest = GeoPoint::new(48.85, 2.35);
        let mut j = job("j1", dest, JobStatus::Delivering, "w1", 90);
        j.assigned_worker_id = None;
        let alerts = engine.evaluate(
            &[worker("w1", north_of(dest, 8000.0), true)],
            &[j],
            &[],
            now(),
            &mut ThrottleTracker::new(),
        );
        assert!(alerts.is_empty());
    }
}
