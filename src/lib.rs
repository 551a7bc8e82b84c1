// Public modules
pub mod algorithms;
pub mod error;
pub mod models;
pub mod utils;

// Re-exports for convenience
pub use algorithms::notification::{MissionNotificationScorer, ScoredJob};
pub use algorithms::pricing::{DemandSource, DynamicPricingEngine, MarketSnapshot, PricingRequest};
pub use algorithms::proximity::{ProximityAlertEngine, ThrottleTracker};
pub use algorithms::route_optimizer::RouteOptimizer;
pub use algorithms::RoutePlanner;
pub use models::{Alert, GeoPoint, GeofenceZone, Job, RoutePlan, WorkerLocation};
pub use utils::config::DispatchConfig;
