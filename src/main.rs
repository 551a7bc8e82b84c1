use bring_dispatch::algorithms::notification::nearest_available_workers;
use bring_dispatch::algorithms::pricing::MarketSnapshot;
use bring_dispatch::models::{JobCategory, JobStatus};
use bring_dispatch::utils::scenario::Scenario;
use bring_dispatch::{
    DispatchConfig, DynamicPricingEngine, MissionNotificationScorer, PricingRequest,
    ProximityAlertEngine, RouteOptimizer, RoutePlanner, ThrottleTracker,
};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file overriding the default dispatch settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize a worker's tour over the scenario jobs
    Route {
        #[arg(long)]
        scenario: PathBuf,
        /// Only the active jobs assigned to this worker (default: every job)
        #[arg(long)]
        worker: Option<String>,
    },
    /// Quote a service fee
    Price {
        #[arg(long)]
        distance: f64,
        #[arg(long, default_value = "groceries")]
        category: String,
        /// Local time, e.g. 2024-03-05T18:30
        #[arg(long)]
        at: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        budget: f64,
        /// Scenario providing live demand counts
        #[arg(long)]
        scenario: Option<PathBuf>,
    },
    /// Run one alert evaluation cycle
    Alerts {
        #[arg(long)]
        scenario: PathBuf,
        /// RFC 3339 evaluation time (default: scenario time, then now)
        #[arg(long)]
        now: Option<String>,
    },
    /// Pick the job to push to a worker
    Notify {
        #[arg(long)]
        scenario: PathBuf,
        #[arg(long)]
        worker: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => DispatchConfig::from_json_file(path)?,
        None => DispatchConfig::default(),
    };

    match cli.command {
        Command::Route { scenario, worker } => run_route(&config, &scenario, worker.as_deref()),
        Command::Price {
            distance,
            category,
            at,
            budget,
            scenario,
        } => run_price(&config, distance, &category, at.as_deref(), budget, scenario),
        Command::Alerts { scenario, now } => run_alerts(&config, &scenario, now.as_deref()),
        Command::Notify { scenario, worker } => run_notify(&config, &scenario, &worker),
    }
}

fn run_route(
    config: &DispatchConfig,
    path: &Path,
    worker: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let scenario = Scenario::from_json_file(path)?;
    let (start, jobs) = match worker {
        Some(id) => {
            let w = scenario
                .worker(id)
                .ok_or_else(|| format!("unknown worker {}", id))?;
            let start = w
                .known_position()
                .ok_or_else(|| format!("worker {} has no known position", id))?;
            (start, scenario.jobs_of(id))
        }
        None => {
            let start = scenario
                .start_position()
                .ok_or("scenario has no usable start position")?;
            (start, scenario.jobs.clone())
        }
    };

    let optimizer = RouteOptimizer::new(config.route.clone());
    let plan = optimizer.optimize(start, &jobs);

    println!(
        "Tour starting at ({:.4}, {:.4})",
        start.latitude, start.longitude
    );
    println!("------------------------------------------");
    if plan.is_empty() {
        println!("No job with a usable delivery point.");
        return Ok(());
    }
    for stop in &plan.stops {
        println!(
            "{:>2}. [{}] {} ({}) +{:.2} km, {} min drive, {} min shopping",
            stop.order,
            stop.cluster_id,
            stop.job.store_name,
            stop.job.id,
            stop.distance_from_prev_km,
            stop.travel_time_min,
            stop.shopping_time_min
        );
    }
    println!("Total distance: {:.2} km", plan.total_distance_km);
    println!("Total time: {} min", plan.total_time_min);
    println!("Distance saved vs radial: {:.2} km", plan.distance_saved_km);
    let start_time = scenario.now.unwrap_or_else(Utc::now);
    println!(
        "Estimated finish: {}",
        plan.estimated_finish(start_time).format("%Y-%m-%d %H:%M UTC")
    );
    for warning in &plan.warnings {
        println!("  warning: {}", warning);
    }
    Ok(())
}

fn run_price(
    config: &DispatchConfig,
    distance: f64,
    category: &str,
    at: Option<&str>,
    budget: f64,
    scenario: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let category = match JobCategory::parse(category) {
        JobCategory::Unknown => {
            log::warn!("unknown category {:?}, pricing as groceries", category);
            JobCategory::Unknown
        }
        known => known,
    };
    let scheduled_at = match at {
        Some(s) => Some(NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")?),
        None => None,
    };
    let scenario = match scenario {
        Some(path) => Scenario::from_json_file(path)?,
        None => Scenario::default(),
    };
    let demand = MarketSnapshot::new(&scenario.jobs, &scenario.workers);

    let engine = DynamicPricingEngine::new(config.pricing.clone());
    let request = PricingRequest {
        distance_km: distance,
        category,
        scheduled_at,
        estimated_budget: budget,
    };
    let quote = engine.calculate_price_at(&request, &demand, Local::now().naive_local());

    let b = &quote.breakdown;
    println!("Service fee: {:.2} EUR", quote.service_fee);
    println!("  base:              {:.2}", b.base);
    println!("  time multiplier:   x{}", b.time_multiplier);
    println!("  distance surcharge +{:.2}", b.distance_add);
    println!("  demand multiplier: x{}", b.demand_multiplier);
    println!("  share of budget:   {:.1}%", b.budget_percentage);
    Ok(())
}

fn run_alerts(
    config: &DispatchConfig,
    path: &Path,
    now: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let scenario = Scenario::from_json_file(path)?;
    let now = match now {
        Some(s) => DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc),
        None => scenario.now.unwrap_or_else(Utc::now),
    };

    let engine = ProximityAlertEngine::new(config.alerts.clone());
    let mut throttle = ThrottleTracker::new();
    let alerts = engine.evaluate(
        &scenario.workers,
        &scenario.jobs,
        &config.zones,
        now,
        &mut throttle,
    );

    println!("{} alert(s) at {}", alerts.len(), now.to_rfc3339());
    for alert in &alerts {
        println!(
            "  [{:?}] {} {}: {}",
            alert.severity,
            alert.kind,
            alert.worker_id,
            alert.message
        );
    }

    let active: Vec<_> = scenario.jobs.iter().filter(|j| j.status.is_active()).collect();
    if !active.is_empty() {
        println!("Active deliveries:");
    }
    for job in active {
        let eta = job.known_delivery_point().and_then(|dest| {
            job.assigned_worker_id
                .as_deref()
                .and_then(|id| scenario.worker(id))
                .and_then(|w| w.known_position())
                .map(|p| engine.estimated_remaining_minutes(p.distance_to(&dest)))
        });
        match eta {
            Some(minutes) => println!(
                "  {} ({}): ~{} min left, {} min since creation",
                job.store_name,
                job.id,
                minutes.round(),
                job.age_minutes(now)
            ),
            None => println!("  {} ({}): no usable position", job.store_name, job.id),
        }
    }
    Ok(())
}

fn run_notify(config: &DispatchConfig, path: &Path, worker: &str) -> Result<(), Box<dyn Error>> {
    let scenario = Scenario::from_json_file(path)?;
    let w = scenario
        .worker(worker)
        .ok_or_else(|| format!("unknown worker {}", worker))?;
    let position = w
        .known_position()
        .ok_or_else(|| format!("worker {} has no known position", worker))?;

    let pending: Vec<_> = scenario
        .jobs
        .iter()
        .filter(|j| j.status == JobStatus::Pending)
        .cloned()
        .collect();

    let scorer = MissionNotificationScorer::new(config.notification.clone());
    for (i, s) in scorer.rank(&pending, &position).iter().enumerate() {
        println!(
            "{}. {} ({}) score {:.2}: {:.1} km, {:.2} EUR, {} items",
            i + 1,
            s.job.store_name,
            s.job.id,
            s.total_score,
            s.distance_km,
            s.job.service_fee,
            s.job.shopping_list_size
        );
    }

    match scorer.select_best_job(&pending, &position) {
        Some(best) => {
            println!("Notify {} about {} ({})", w.name, best.job.store_name, best.job.id);
            let rivals = nearest_available_workers(&best.job, &scenario.workers, 5.0, 3);
            println!("{} available worker(s) within 5 km of it", rivals.len());
        }
        None => println!("Nothing worth notifying {} about", w.name),
    }
    Ok(())
}
