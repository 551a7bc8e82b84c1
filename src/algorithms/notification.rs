use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{GeoPoint, Job, Km, WorkerLocation};
use crate::utils::config::NotificationConfig;

/// A candidate job with the parts of its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredJob {
    pub job: Job,
    pub distance_km: Km,
    pub distance_score: f64,
    pub fee_score: f64,
    pub items_score: f64,
    pub total_score: f64,
}

/// Picks the single new job worth a push notification to a worker
#[derive(Debug, Clone, Default)]
pub struct MissionNotificationScorer {
    config: NotificationConfig,
}

impl MissionNotificationScorer {
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    /// Scores one job; `None` when it has no usable delivery point
    pub fn score(&self, job: &Job, worker_position: &GeoPoint) -> Option<ScoredJob> {
        let cfg = &self.config;
        let destination = job.known_delivery_point()?;
        let distance_km = worker_position.distance_to(&destination);

        let distance_score = (cfg.distance_horizon_km - distance_km).max(0.0);
        let fee_score = job.service_fee / cfg.fee_divisor;
        let items_score = job.shopping_list_size as f64 / cfg.items_divisor;
        let total_score = distance_score * cfg.distance_weight
            + fee_score * cfg.fee_weight
            + items_score * cfg.items_weight;

        Some(ScoredJob {
            job: job.clone(),
            distance_km,
            distance_score,
            fee_score,
            items_score,
            total_score,
        })
    }

    /// Best candidates first, at most `shortlist_size` of them.
    /// Equal scores go to the older job, then to the smaller id.
    pub fn rank(&self, candidates: &[Job], worker_position: &GeoPoint) -> Vec<ScoredJob> {
        if !worker_position.is_known() {
            debug!("worker position unknown, nothing to rank");
            return Vec::new();
        }

        let mut scored: Vec<ScoredJob> = candidates
            .par_iter()
            .filter_map(|job| self.score(job, worker_position))
            .collect();

        scored.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.job.created_at.cmp(&b.job.created_at))
                .then_with(|| a.job.id.cmp(&b.job.id))
        });
        scored.truncate(self.config.shortlist_size);
        scored
    }

    /// The top-ranked job, unless it is too far away to be worth notifying
    pub fn select_best_job(&self, candidates: &[Job], worker_position: &GeoPoint) -> Option<ScoredJob> {
        let best = self.rank(candidates, worker_position).into_iter().next()?;
        if best.distance_km > self.config.max_notify_distance_km {
            debug!(
                "best job {} is {:.1} km away, not notifying",
                best.job.id, best.distance_km
            );
            return None;
        }
        Some(best)
    }
}

/// An available worker close to a job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyWorker<'a> {
    pub worker: &'a WorkerLocation,
    pub distance_km: Km,
}

/// Available workers with a known position within `radius_km` of the job's
/// delivery point, nearest first, at most `limit`
pub fn nearest_available_workers<'a>(
    job: &Job,
    workers: &'a [WorkerLocation],
    radius_km: Km,
    limit: usize,
) -> Vec<NearbyWorker<'a>> {
    let destination = match job.known_delivery_point() {
        Some(d) => d,
        None => return Vec::new(),
    };

    let mut nearby: Vec<NearbyWorker<'a>> = workers
        .iter()
        .filter(|w| w.is_available)
        .filter_map(|w| {
            let position = w.known_position()?;
            let distance_km = position.distance_to(&destination);
            (distance_km <= radius_km).then_some(NearbyWorker {
                worker: w,
                distance_km,
            })
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.worker.worker_id.cmp(&b.worker.worker_id))
    });
    nearby.truncate(limit);
    nearby
}
