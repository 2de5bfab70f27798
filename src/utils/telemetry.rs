// file: src/utils/telemetry.rs
// description: Health reporting and operation timing for the site backend
// reference: Production observability best practices

use crate::config::{BlogConfig, CrmConfig};
use crate::utils::Validator;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: u64,
}

impl HealthCheck {
    pub fn healthy(component: &str, response_time: Duration) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Healthy,
            message: None,
            response_time_ms: response_time.as_millis() as u64,
        }
    }

    pub fn degraded(component: &str, message: String, response_time: Duration) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Degraded,
            message: Some(message),
            response_time_ms: response_time.as_millis() as u64,
        }
    }

    pub fn unhealthy(component: &str, message: String, response_time: Duration) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Unhealthy,
            message: Some(message),
            response_time_ms: response_time.as_millis() as u64,
        }
    }

    /// The content directory is created lazily, so a missing one only degrades.
    pub fn content_dir(config: &BlogConfig) -> Self {
        let start = Instant::now();
        let dir = &config.content_dir;
        if !dir.exists() {
            return Self::degraded(
                "content_dir",
                format!("{} does not exist yet", dir.display()),
                start.elapsed(),
            );
        }
        match Validator::validate_directory(dir) {
            Ok(()) => Self::healthy("content_dir", start.elapsed()),
            Err(e) => Self::unhealthy("content_dir", e.to_string(), start.elapsed()),
        }
    }

    /// Lead submissions fail without credentials; the blog keeps working.
    pub fn crm(config: &CrmConfig) -> Self {
        let start = Instant::now();
        let missing: Vec<&str> = [
            ("api_token", config.api_token.as_deref()),
            ("location_id", config.location_id.as_deref()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Self::healthy("crm", start.elapsed())
        } else {
            Self::degraded(
                "crm",
                format!("missing {}", missing.join(", ")),
                start.elapsed(),
            )
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub timestamp: u64,
    pub version: String,
}

impl HealthReport {
    pub fn new(checks: Vec<HealthCheck>, version: String) -> Self {
        let overall_status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_secs();

        Self {
            overall_status,
            checks,
            timestamp,
            version,
        }
    }

    pub fn format(&self) -> String {
        let mut output = format!(
            "{} System Health: {:?}\nVersion: {}\nTimestamp: {}\n\n",
            status_icon(&self.overall_status),
            self.overall_status,
            self.version,
            chrono::DateTime::from_timestamp(self.timestamp as i64, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        for check in &self.checks {
            output.push_str(&format!(
                "{} {} ({:?}) - {}ms",
                status_icon(&check.status),
                check.component,
                check.status,
                check.response_time_ms
            ));

            if let Some(ref msg) = check.message {
                output.push_str(&format!("\n  {}", msg));
            }

            output.push('\n');
        }

        output
    }
}

fn status_icon(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "✓",
        HealthStatus::Degraded => "⚠",
        HealthStatus::Unhealthy => "✗",
    }
}

pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        info!("Starting operation: {}", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish_with_count(self, count: usize) -> Duration {
        let elapsed = self.elapsed();
        info!(
            "Completed operation: {} - {} items in {:.2}s",
            self.operation,
            count,
            elapsed.as_secs_f64()
        );
        elapsed
    }

    pub fn warn_if_slow(&self, threshold: Duration, message: &str) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "Slow operation [{}]: {} took {:.2}s (threshold: {:.2}s)",
                self.operation,
                message,
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[test]
    fn test_health_report_overall_status() {
        let checks = vec![
            HealthCheck::healthy("content_dir", Duration::from_millis(1)),
            HealthCheck::degraded("crm", "missing api_token".to_string(), Duration::from_millis(1)),
        ];

        let report = HealthReport::new(checks, "0.1.0".to_string());
        assert_eq!(report.overall_status, HealthStatus::Degraded);
        assert!(report.format().contains("missing api_token"));
    }

    #[test]
    fn test_content_dir_check() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default_config().blog;

        config.content_dir = temp.path().to_path_buf();
        assert_eq!(HealthCheck::content_dir(&config).status, HealthStatus::Healthy);

        config.content_dir = temp.path().join("not-yet");
        assert_eq!(HealthCheck::content_dir(&config).status, HealthStatus::Degraded);
    }

    #[test]
    fn test_crm_check_reports_missing_credentials() {
        let mut crm = Config::default_config().crm;
        let check = HealthCheck::crm(&crm);
        assert_eq!(check.status, HealthStatus::Degraded);
        assert_eq!(check.message.as_deref(), Some("missing api_token, location_id"));

        crm.api_token = Some("token".to_string());
        crm.location_id = Some("loc".to_string());
        assert_eq!(HealthCheck::crm(&crm).status, HealthStatus::Healthy);
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test");
        std::thread::sleep(Duration::from_millis(5));
        let elapsed = timer.finish_with_count(3);
        assert!(elapsed >= Duration::from_millis(5));
    }
}
