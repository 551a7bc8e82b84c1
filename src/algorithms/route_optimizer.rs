use geo::{Centroid, MultiPoint, Point};
use log::{debug, warn};
use std::collections::BTreeMap;

use crate::algorithms::RoutePlanner;
use crate::models::{ClusterSummary, GeoPoint, Job, Km, Minutes, RoutePlan, RouteStop};
use crate::utils::config::RouteConfig;
use crate::utils::distance::ZoneKey;

/// Greedy tour builder: jobs are bucketed into 5 degree grid cells, cells are
/// visited in key order, and each cell is walked nearest-neighbor first.
#[derive(Debug, Clone, Default)]
pub struct RouteOptimizer {
    config: RouteConfig,
}

impl RouteOptimizer {
    pub fn new(config: RouteConfig) -> Self {
        Self { config }
    }

    /// Minutes to drive a hop, fixed overhead included
    pub fn travel_time(&self, distance_km: Km) -> Minutes {
        (distance_km * self.config.travel_minutes_per_km + self.config.travel_overhead_min).round()
            as Minutes
    }

    /// Minutes spent in the store for a list of `items` lines
    pub fn shopping_time(&self, items: u32) -> Minutes {
        (items as f64 * self.config.shopping_minutes_per_item + self.config.shopping_overhead_min)
            .round() as Minutes
    }

    /// Groups jobs with a usable delivery point by grid cell
    pub fn cluster<'a>(&self, jobs: &'a [Job]) -> BTreeMap<ZoneKey, Vec<(&'a Job, GeoPoint)>> {
        let mut clusters: BTreeMap<ZoneKey, Vec<(&Job, GeoPoint)>> = BTreeMap::new();
        for job in jobs {
            if let Some(point) = job.known_delivery_point() {
                clusters
                    .entry(ZoneKey::of(&point))
                    .or_default()
                    .push((job, point));
            }
        }
        clusters
    }
}

/// Index and distance of the closest candidate; first one wins on ties
fn nearest(from: &GeoPoint, candidates: &[(&Job, GeoPoint)]) -> Option<(usize, Km)> {
    let mut best: Option<(usize, Km)> = None;
    for (i, (_, point)) in candidates.iter().enumerate() {
        let d = from.distance_to(point);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best
}

fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    let multi: MultiPoint<f64> = points.iter().map(|p| Point::from(*p)).collect();
    multi.centroid().map(GeoPoint::from)
}

impl RoutePlanner for RouteOptimizer {
    fn optimize(&self, start: GeoPoint, jobs: &[Job]) -> RoutePlan {
        let clusters = self.cluster(jobs);
        if clusters.is_empty() {
            return RoutePlan::default();
        }

        let mut current = if start.is_known() {
            start
        } else {
            // no usable start: begin at the first job of the first zone
            warn!("route start position unknown, starting at first delivery point");
            clusters
                .values()
                .next()
                .and_then(|members| members.first())
                .map(|(_, p)| *p)
                .unwrap_or(start)
        };
        let origin = current;

        let mut stops: Vec<RouteStop> = Vec::new();
        let mut summaries = Vec::with_capacity(clusters.len());
        let mut warnings = Vec::new();
        let mut total_distance = 0.0;
        let mut total_time: Minutes = 0;
        let mut baseline_distance = 0.0;

        for (zone, members) in &clusters {
            let mut unvisited = members.clone();
            let mut zone_distance = 0.0;

            while let Some((idx, hop)) = nearest(&current, &unvisited) {
                let (job, point) = unvisited.remove(idx);

                if hop > self.config.long_hop_warning_km {
                    let message = format!(
                        "zone {}: large distance ({:.1} km) to {} ({})",
                        zone, hop, job.store_name, job.id
                    );
                    warn!("{}", message);
                    warnings.push(message);
                }

                let travel_time_min = self.travel_time(hop);
                let shopping_time_min = self.shopping_time(job.shopping_list_size);
                total_time += travel_time_min + shopping_time_min;
                total_distance += hop;
                zone_distance += hop;
                baseline_distance += origin.distance_to(&point);

                stops.push(RouteStop {
                    job: job.clone(),
                    order: stops.len() + 1,
                    distance_from_prev_km: hop,
                    travel_time_min,
                    shopping_time_min,
                    cluster_id: zone.to_string(),
                });
                current = point;
            }

            let points: Vec<GeoPoint> = members.iter().map(|(_, p)| *p).collect();
            summaries.push(ClusterSummary {
                zone: *zone,
                job_count: members.len(),
                centroid: centroid(&points),
                distance_km: zone_distance,
            });
        }

        debug!(
            "optimized {} stops over {} zones: {:.2} km, {} min, baseline {:.2} km",
            stops.len(),
            clusters.len(),
            total_distance,
            total_time,
            baseline_distance
        );

        RoutePlan {
            stops,
            clusters: clusters
                .into_iter()
                .map(|(zone, members)| (zone, members.into_iter().map(|(j, _)| j.clone()).collect()))
                .collect(),
            cluster_summaries: summaries,
            total_distance_km: total_distance,
            total_time_min: total_time,
            distance_saved_km: baseline_distance - total_distance,
            warnings,
        }
    }
}
