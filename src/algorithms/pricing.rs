//! Dynamic service-fee pricing.
//!
//! The fee is built from a category base, a time-of-day/week multiplier, a
//! per-km surcharge beyond the included distance, and a live supply/demand
//! multiplier, then lifted towards a share of the shopping budget and clamped.

use chrono::{Datelike, Local, NaiveDateTime, Timelike, Weekday};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::DemandLookupError;
use crate::models::{Euros, Job, JobCategory, JobStatus, Km, WorkerLocation};
use crate::utils::config::PricingConfig;

/// External provider of live market counts
pub trait DemandSource {
    fn pending_job_count(&self) -> Result<usize, DemandLookupError>;

    fn available_worker_count(&self) -> Result<usize, DemandLookupError>;
}

/// Demand computed from jobs and workers already loaded in memory
#[derive(Debug, Clone, Copy)]
pub struct MarketSnapshot<'a> {
    pub jobs: &'a [Job],
    pub workers: &'a [WorkerLocation],
}

impl<'a> MarketSnapshot<'a> {
    pub fn new(jobs: &'a [Job], workers: &'a [WorkerLocation]) -> Self {
        Self { jobs, workers }
    }
}

impl DemandSource for MarketSnapshot<'_> {
    fn pending_job_count(&self) -> Result<usize, DemandLookupError> {
        Ok(self
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Pending)
            .count())
    }

    fn available_worker_count(&self) -> Result<usize, DemandLookupError> {
        Ok(self.workers.iter().filter(|w| w.is_available).count())
    }
}

/// Input of a price computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub distance_km: Km,
    pub category: JobCategory,
    /// Local wall-clock time of the job; `None` prices for "now"
    pub scheduled_at: Option<NaiveDateTime>,
    pub estimated_budget: Euros,
}

/// Trace of every factor applied, for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base: Euros,
    pub time_multiplier: f64,
    pub distance_add: Euros,
    pub demand_multiplier: f64,
    /// Final fee as a percentage of the budget, 0 without budget
    pub budget_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub service_fee: Euros,
    pub breakdown: PricingBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct DynamicPricingEngine {
    config: PricingConfig,
}

impl DynamicPricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Prices a request, using the local clock when no time is scheduled
    pub fn calculate_price<D: DemandSource + ?Sized>(
        &self,
        request: &PricingRequest,
        demand: &D,
    ) -> PriceQuote {
        self.calculate_price_at(request, demand, Local::now().naive_local())
    }

    /// Prices a request with an explicit "now"
    pub fn calculate_price_at<D: DemandSource + ?Sized>(
        &self,
        request: &PricingRequest,
        demand: &D,
        now: NaiveDateTime,
    ) -> PriceQuote {
        let cfg = &self.config;
        let at = request.scheduled_at.unwrap_or(now);

        let base = cfg.base_fees.fee(request.category);
        let time_multiplier = self.time_multiplier(at);
        let mut fee = base * time_multiplier;

        let distance_add = self.distance_surcharge(request.distance_km);
        fee += distance_add;

        let demand_multiplier = self.demand_multiplier(demand);
        fee *= demand_multiplier;

        let budget = request.estimated_budget;
        let floor = (budget * cfg.budget_floor_rate).max(cfg.min_fee);
        if floor > fee {
            fee = fee.max(floor.min(budget * cfg.budget_cap_rate));
        }

        let service_fee = round2(fee).clamp(cfg.min_fee, cfg.max_fee);
        let budget_percentage = if budget > 0.0 {
            round2(service_fee / budget * 100.0)
        } else {
            0.0
        };

        debug!(
            "priced {:?} {:.1} km at {}: {:.2} EUR (time x{}, demand x{})",
            request.category, request.distance_km, at, service_fee, time_multiplier, demand_multiplier
        );

        PriceQuote {
            service_fee,
            breakdown: PricingBreakdown {
                base,
                time_multiplier,
                distance_add,
                demand_multiplier,
                budget_percentage,
            },
        }
    }

    /// Prices an existing job. A scheduled slot is priced at its representative
    /// hour on `now`'s date.
    pub fn price_job<D: DemandSource + ?Sized>(
        &self,
        job: &Job,
        distance_km: Km,
        demand: &D,
        now: NaiveDateTime,
    ) -> PriceQuote {
        let scheduled_at = job
            .scheduled_slot
            .and_then(|slot| now.date().and_hms_opt(slot.representative_hour(), 0, 0));
        let request = PricingRequest {
            distance_km,
            category: job.category,
            scheduled_at,
            estimated_budget: job.estimated_budget,
        };
        self.calculate_price_at(&request, demand, now)
    }

    /// Time-of-day/week multiplier. Night is checked last and replaces
    /// whatever the weekday/weekend rules picked.
    pub fn time_multiplier(&self, at: NaiveDateTime) -> f64 {
        let cfg = &self.config;
        let hour = at.hour();
        let weekend = matches!(at.weekday(), Weekday::Sat | Weekday::Sun);

        let mut multiplier = 1.0;
        if !weekend {
            if (7..9).contains(&hour) || (17..20).contains(&hour) {
                multiplier = cfg.rush_hour_multiplier;
            } else if (12..14).contains(&hour) {
                multiplier = cfg.lunch_multiplier;
            }
        } else {
            multiplier = cfg.weekend_multiplier;
        }

        if hour >= 20 || hour < 7 {
            multiplier = cfg.night_multiplier;
        }
        multiplier
    }

    pub fn distance_surcharge(&self, distance_km: Km) -> Euros {
        let cfg = &self.config;
        if distance_km > cfg.included_distance_km {
            (distance_km - cfg.included_distance_km) * cfg.per_km_surcharge
        } else {
            0.0
        }
    }

    /// Demand multiplier from live counts; a failed lookup prices as neutral
    pub fn demand_multiplier<D: DemandSource + ?Sized>(&self, demand: &D) -> f64 {
        match self.demand_ratio(demand) {
            Ok(ratio) => self.multiplier_for_ratio(ratio),
            Err(e) => {
                warn!("demand lookup failed, pricing without demand factor: {}", e);
                1.0
            }
        }
    }

    fn demand_ratio<D: DemandSource + ?Sized>(&self, demand: &D) -> Result<f64, DemandLookupError> {
        let pending = demand.pending_job_count()?;
        let available = demand.available_worker_count()?;
        if available == 0 {
            return Ok(self.config.no_worker_demand_ratio);
        }
        Ok(pending as f64 / available as f64)
    }

    pub fn multiplier_for_ratio(&self, ratio: f64) -> f64 {
        let cfg = &self.config;
        if ratio > cfg.high_demand_ratio {
            cfg.high_demand_multiplier
        } else if ratio > cfg.elevated_demand_ratio {
            cfg.elevated_demand_multiplier
        } else if ratio < cfg.low_demand_ratio {
            cfg.low_demand_multiplier
        } else {
            1.0
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
