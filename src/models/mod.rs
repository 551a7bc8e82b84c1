// Models module - exports all model types

mod alert;
mod job;
pub(crate) mod location;
mod route;
mod worker;
mod zone;

// Re-export model types
pub use self::alert::{Alert, AlertKind, Severity};
pub use self::job::{Job, JobCategory, JobStatus, ScheduledSlot};
pub use self::location::GeoPoint;
pub use self::route::{ClusterSummary, RoutePlan, RouteStop};
pub use self::worker::WorkerLocation;
pub use self::zone::{default_zones, GeofenceZone};

// Common type aliases for improved code readability
pub type JobId = String;
pub type WorkerId = String;
pub type Km = f64;
pub type Meters = f64;
pub type Minutes = i64;
pub type Euros = f64;
