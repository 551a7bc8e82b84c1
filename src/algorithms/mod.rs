pub mod notification;
pub mod pricing;
pub mod proximity;
pub mod route_optimizer;

use crate::models::{GeoPoint, Job, RoutePlan};

/// Trait for tour builders over a worker's accepted jobs
pub trait RoutePlanner {
    /// Orders the jobs with a usable delivery point into a tour starting at `start`
    fn optimize(&self, start: GeoPoint, jobs: &[Job]) -> RoutePlan;
}
