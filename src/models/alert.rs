// Alerts produced by one evaluation cycle of the proximity engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{JobId, WorkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ZoneEntry,
    Inactivity,
    Deviation,
    Proximity,
    Lateness,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::ZoneEntry => "zone_entry",
            AlertKind::Inactivity => "inactivity",
            AlertKind::Deviation => "deviation",
            AlertKind::Proximity => "proximity",
            AlertKind::Lateness => "lateness",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Advisory alert; delivery and persistence belong to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub worker_id: WorkerId,
    pub job_id: Option<JobId>,
    /// Zone id for zone entries
    pub zone_id: Option<String>,
    pub message: String,
    /// Measured quantity behind the alert (minutes, km)
    pub value: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        kind: AlertKind,
        severity: Severity,
        worker_id: &str,
        job_id: Option<&str>,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let subject = job_id.unwrap_or("-");
        Self {
            id: format!(
                "{}-{}-{}-{}",
                kind,
                worker_id,
                subject,
                timestamp.timestamp_millis()
            ),
            kind,
            severity,
            worker_id: worker_id.to_string(),
            job_id: job_id.map(str::to_string),
            zone_id: None,
            message,
            value: None,
            timestamp,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_zone(mut self, zone_id: &str) -> Self {
        self.id = format!("{}-{}", self.id, zone_id);
        self.zone_id = Some(zone_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_alert_ids_are_distinct_per_zone() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let a = Alert::new(AlertKind::ZoneEntry, Severity::Info, "w1", None, "in".into(), t)
            .with_zone("paris-centre");
        let b = Alert::new(AlertKind::ZoneEntry, Severity::Info, "w1", None, "in".into(), t)
            .with_zone("bastille");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("zone_entry-w1--"));
        assert_eq!(a.zone_id.as_deref(), Some("paris-centre"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
