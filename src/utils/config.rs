use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::models::{default_zones, Euros, GeofenceZone, JobCategory, Km};

/// Base service fee per category, in euros
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseFees {
    pub groceries: Euros,
    pub urgent_delivery: Euros,
    pub housework: Euros,
    pub handywork: Euros,
    pub gardening: Euros,
    pub other: Euros,
}

impl BaseFees {
    pub fn fee(&self, category: JobCategory) -> Euros {
        match category {
            JobCategory::Groceries | JobCategory::Unknown => self.groceries,
            JobCategory::UrgentDelivery => self.urgent_delivery,
            JobCategory::Housework => self.housework,
            JobCategory::Handywork => self.handywork,
            JobCategory::Gardening => self.gardening,
            JobCategory::Other => self.other,
        }
    }

    /// Fee for a raw category name; unknown names price like groceries
    pub fn fee_for_name(&self, name: &str) -> Euros {
        self.fee(JobCategory::parse(name))
    }
}

impl Default for BaseFees {
    fn default() -> Self {
        Self {
            groceries: 5.0,
            urgent_delivery: 10.0,
            housework: 8.0,
            handywork: 12.0,
            gardening: 10.0,
            other: 7.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub base_fees: BaseFees,
    pub rush_hour_multiplier: f64,
    pub lunch_multiplier: f64,
    pub weekend_multiplier: f64,
    pub night_multiplier: f64,
    /// Distance covered by the base fee
    pub included_distance_km: Km,
    pub per_km_surcharge: Euros,
    /// Ratio assumed when no worker is available
    pub no_worker_demand_ratio: f64,
    pub high_demand_ratio: f64,
    pub high_demand_multiplier: f64,
    pub elevated_demand_ratio: f64,
    pub elevated_demand_multiplier: f64,
    pub low_demand_ratio: f64,
    pub low_demand_multiplier: f64,
    pub budget_floor_rate: f64,
    pub budget_cap_rate: f64,
    pub min_fee: Euros,
    pub max_fee: Euros,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fees: BaseFees::default(),
            rush_hour_multiplier: 1.4,
            lunch_multiplier: 1.2,
            weekend_multiplier: 1.3,
            night_multiplier: 1.5,
            included_distance_km: 5.0,
            per_km_surcharge: 0.5,
            no_worker_demand_ratio: 2.0,
            high_demand_ratio: 1.5,
            high_demand_multiplier: 1.3,
            elevated_demand_ratio: 1.0,
            elevated_demand_multiplier: 1.15,
            low_demand_ratio: 0.5,
            low_demand_multiplier: 0.9,
            budget_floor_rate: 0.05,
            budget_cap_rate: 0.15,
            min_fee: 3.0,
            max_fee: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// 20 minutes per 5 km, i.e. ~15 km/h in town
    pub travel_minutes_per_km: f64,
    pub travel_overhead_min: f64,
    pub shopping_minutes_per_item: f64,
    pub shopping_overhead_min: f64,
    pub long_hop_warning_km: Km,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            travel_minutes_per_km: 4.0,
            travel_overhead_min: 5.0,
            shopping_minutes_per_item: 3.0,
            shopping_overhead_min: 10.0,
            long_hop_warning_km: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub inactivity_minutes: i64,
    pub deviation_km: Km,
    pub lateness_age_minutes: i64,
    pub lateness_remaining_minutes: f64,
    pub lateness_throttle_minutes: i64,
    pub proximity_km: Km,
    pub proximity_throttle_minutes: i64,
    /// 60 minutes per 5 km for the remaining-time estimate
    pub remaining_minutes_per_km: f64,
    pub remaining_overhead_min: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            inactivity_minutes: 30,
            deviation_km: 5.0,
            lateness_age_minutes: 60,
            lateness_remaining_minutes: 20.0,
            lateness_throttle_minutes: 10,
            proximity_km: 0.5,
            proximity_throttle_minutes: 5,
            remaining_minutes_per_km: 12.0,
            remaining_overhead_min: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub distance_weight: f64,
    pub fee_weight: f64,
    pub items_weight: f64,
    /// Distance at which the distance score reaches zero
    pub distance_horizon_km: Km,
    pub fee_divisor: f64,
    pub items_divisor: f64,
    pub shortlist_size: usize,
    pub max_notify_distance_km: Km,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            distance_weight: 0.5,
            fee_weight: 0.3,
            items_weight: 0.2,
            distance_horizon_km: 10.0,
            fee_divisor: 10.0,
            items_divisor: 5.0,
            shortlist_size: 3,
            max_notify_distance_km: 15.0,
        }
    }
}

/// Everything tunable in the dispatch core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub pricing: PricingConfig,
    pub route: RouteConfig,
    pub alerts: AlertConfig,
    pub notification: NotificationConfig,
    pub zones: Vec<GeofenceZone>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            route: RouteConfig::default(),
            alerts: AlertConfig::default(),
            notification: NotificationConfig::default(),
            zones: default_zones(),
        }
    }
}

impl DispatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DispatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values that would make the engines meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pricing;
        if !(p.min_fee >= 0.0 && p.min_fee <= p.max_fee) {
            return Err(invalid(
                "pricing.min_fee",
                format!("{} must be within [0, max_fee={}]", p.min_fee, p.max_fee),
            ));
        }
        if p.budget_floor_rate < 0.0 || p.budget_cap_rate < p.budget_floor_rate {
            return Err(invalid(
                "pricing.budget_cap_rate",
                "cap rate must be >= floor rate >= 0".to_string(),
            ));
        }

        let r = &self.route;
        if r.travel_minutes_per_km <= 0.0 || r.shopping_minutes_per_item < 0.0 {
            return Err(invalid(
                "route.travel_minutes_per_km",
                "travel and shopping rates must be positive".to_string(),
            ));
        }

        let n = &self.notification;
        let weights = [n.distance_weight, n.fee_weight, n.items_weight];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(invalid(
                "notification.weights",
                "weights must be finite".to_string(),
            ));
        }
        if n.fee_divisor <= 0.0 || n.items_divisor <= 0.0 || n.shortlist_size == 0 {
            return Err(invalid(
                "notification.fee_divisor",
                "divisors and shortlist size must be positive".to_string(),
            ));
        }

        for zone in &self.zones {
            if !(zone.radius_meters > 0.0) {
                return Err(invalid(
                    "zones.radius_meters",
                    format!("zone {} has radius {}", zone.id, zone.radius_meters),
                ));
            }
            if !zone.center.is_known() {
                return Err(invalid(
                    "zones.center",
                    format!("zone {} has no usable center", zone.id),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
