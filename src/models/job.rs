// Job model representing a client's errand (a "mission")

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::known;
use crate::models::{Euros, GeoPoint, JobId, WorkerId};

/// Kind of service requested, drives the base fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    Groceries,
    UrgentDelivery,
    Housework,
    Handywork,
    Gardening,
    Other,
    /// Any name this build does not know; priced like groceries
    #[serde(other)]
    Unknown,
}

impl JobCategory {
    /// Parses the wire name of a category, falling back to `Unknown`
    pub fn parse(name: &str) -> Self {
        match name {
            "groceries" => JobCategory::Groceries,
            "urgent_delivery" => JobCategory::UrgentDelivery,
            "housework" => JobCategory::Housework,
            "handywork" => JobCategory::Handywork,
            "gardening" => JobCategory::Gardening,
            "other" => JobCategory::Other,
            _ => JobCategory::Unknown,
        }
    }
}

/// Preferred time window chosen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledSlot {
    Morning,
    Afternoon,
    Evening,
}

impl ScheduledSlot {
    /// Representative hour of the slot, used when pricing a slot rather than an instant
    pub fn representative_hour(&self) -> u32 {
        match self {
            ScheduledSlot::Morning => 9,
            ScheduledSlot::Afternoon => 15,
            ScheduledSlot::Evening => 19,
        }
    }
}

/// Lifecycle: pending -> accepted -> in_progress/shopping -> delivering -> completed|cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Accepted,
    InProgress,
    Shopping,
    Delivering,
    Completed,
    Cancelled,
}

impl JobStatus {
    /// A worker is attached and the job is not finished yet
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobStatus::Accepted | JobStatus::InProgress | JobStatus::Shopping | JobStatus::Delivering
        )
    }
}

/// A job as read from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,

    pub store_name: String,

    /// Where the groceries go; `None` or (0,0) when the client gave no position
    #[serde(default)]
    pub delivery_point: Option<GeoPoint>,

    /// Number of lines on the shopping list
    #[serde(default)]
    pub shopping_list_size: u32,

    #[serde(default)]
    pub estimated_budget: Euros,

    #[serde(default)]
    pub service_fee: Euros,

    pub category: JobCategory,

    #[serde(default)]
    pub scheduled_slot: Option<ScheduledSlot>,

    pub status: JobStatus,

    /// Worker who accepted the job, if any
    #[serde(default)]
    pub assigned_worker_id: Option<WorkerId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a pending job with an empty list and no fee
    pub fn new<S: Into<String>>(
        id: S,
        store_name: S,
        delivery_point: Option<GeoPoint>,
        category: JobCategory,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            store_name: store_name.into(),
            delivery_point,
            shopping_list_size: 0,
            estimated_budget: 0.0,
            service_fee: 0.0,
            category,
            scheduled_slot: None,
            status: JobStatus::Pending,
            assigned_worker_id: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Delivery point if it can be used for distance math
    pub fn known_delivery_point(&self) -> Option<GeoPoint> {
        known(self.delivery_point)
    }

    /// Time elapsed since the job was created
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Whole minutes elapsed since the job was created
    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        self.age(now).num_minutes()
    }
}
