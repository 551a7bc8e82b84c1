// Scenario files: a snapshot of jobs and workers for the demo binary and tests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::models::{GeoPoint, Job, WorkerLocation};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Tour start; falls back to the first worker's position
    #[serde(default)]
    pub start: Option<GeoPoint>,

    /// Evaluation time; falls back to the wall clock
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,

    #[serde(default)]
    pub jobs: Vec<Job>,

    #[serde(default)]
    pub workers: Vec<WorkerLocation>,
}

impl Scenario {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn worker(&self, worker_id: &str) -> Option<&WorkerLocation> {
        self.workers.iter().find(|w| w.worker_id == worker_id)
    }

    /// Explicit start, else the first worker with a usable position
    pub fn start_position(&self) -> Option<GeoPoint> {
        self.start
            .filter(GeoPoint::is_known)
            .or_else(|| self.workers.iter().find_map(|w| w.known_position()))
    }

    /// Jobs accepted by `worker_id` and not finished yet
    pub fn jobs_of(&self, worker_id: &str) -> Vec<Job> {
        self.jobs
            .iter()
            .filter(|j| j.status.is_active() && j.assigned_worker_id.as_deref() == Some(worker_id))
            .cloned()
            .collect()
    }
}
