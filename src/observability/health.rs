use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::storage::FileGateway;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Health status of a service or dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, HealthStatus::Degraded)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy)
    }
}

/// Health status of a single dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyHealth {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: Option<f64>,
    pub message: Option<String>,
}

impl DependencyHealth {
    pub fn healthy(name: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            latency_ms: Some(latency_ms),
            message: None,
        }
    }

    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            latency_ms: None,
            message: Some(message.into()),
        }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(message.into()),
        }
    }
}

/// Aggregated health check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedHealth {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: Vec<DependencyHealth>,
}

impl AggregatedHealth {
    pub fn new(version: String, uptime_seconds: u64, dependencies: Vec<DependencyHealth>) -> Self {
        let status = Self::aggregate_status(&dependencies);
        Self {
            status,
            version,
            uptime_seconds,
            dependencies,
        }
    }

    fn aggregate_status(dependencies: &[DependencyHealth]) -> HealthStatus {
        let has_unhealthy = dependencies.iter().any(|d| d.status.is_unhealthy());
        let has_degraded = dependencies.iter().any(|d| d.status.is_degraded());

        if has_unhealthy {
            HealthStatus::Unhealthy
        } else if has_degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Health checker for the database and the image bucket.
#[derive(Clone)]
pub struct HealthChecker {
    pool: PgPool,
    files: Arc<dyn FileGateway>,
    bucket: String,
    start_time: std::time::Instant,
}

impl HealthChecker {
    pub fn new(pool: PgPool, files: Arc<dyn FileGateway>, bucket: impl Into<String>) -> Self {
        Self {
            pool,
            files,
            bucket: bucket.into(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Performs a full health check of all dependencies.
    pub async fn check_all(&self) -> AggregatedHealth {
        let (database, storage) = tokio::join!(self.check_database(), self.check_storage());

        AggregatedHealth::new(
            env!("CARGO_PKG_VERSION").to_string(),
            self.uptime_seconds(),
            vec![database, storage],
        )
    }

    /// Checks database connectivity.
    pub async fn check_database(&self) -> DependencyHealth {
        let start = std::time::Instant::now();

        match tokio::time::timeout(CHECK_TIMEOUT, sqlx::query("SELECT 1").fetch_one(&self.pool)).await {
            Ok(Ok(_)) => classify_latency("database", start.elapsed().as_secs_f64() * 1000.0, 100.0),
            Ok(Err(e)) => DependencyHealth::unhealthy("database", format!("Query failed: {}", e)),
            Err(_) => DependencyHealth::unhealthy("database", "Connection timeout"),
        }
    }

    /// Checks that the image bucket is reachable.
    pub async fn check_storage(&self) -> DependencyHealth {
        let start = std::time::Instant::now();

        match tokio::time::timeout(CHECK_TIMEOUT, self.files.bucket_exists(&self.bucket)).await {
            Ok(Ok(true)) => classify_latency("storage", start.elapsed().as_secs_f64() * 1000.0, 250.0),
            Ok(Ok(false)) => {
                DependencyHealth::unhealthy("storage", format!("Bucket '{}' does not exist", self.bucket))
            }
            Ok(Err(e)) => DependencyHealth::unhealthy("storage", format!("Bucket check failed: {}", e)),
            Err(_) => DependencyHealth::unhealthy("storage", "Connection timeout"),
        }
    }

    /// Liveness check - returns true if the service is alive.
    pub fn is_alive(&self) -> bool {
        true
    }

    /// Readiness check. Storage is optional for serving most routes, so only
    /// the database gates readiness.
    pub async fn is_ready(&self) -> bool {
        !self.check_database().await.status.is_unhealthy()
    }

    /// Returns uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn classify_latency(name: &str, latency_ms: f64, degraded_above_ms: f64) -> DependencyHealth {
    if latency_ms > degraded_above_ms {
        DependencyHealth {
            name: name.to_string(),
            status: HealthStatus::Degraded,
            latency_ms: Some(latency_ms),
            message: Some("High latency detected".to_string()),
        }
    } else {
        DependencyHealth::healthy(name, latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(!HealthStatus::Healthy.is_degraded());
        assert!(!HealthStatus::Healthy.is_unhealthy());

        assert!(!HealthStatus::Degraded.is_healthy());
        assert!(HealthStatus::Degraded.is_degraded());
        assert!(!HealthStatus::Degraded.is_unhealthy());

        assert!(!HealthStatus::Unhealthy.is_healthy());
        assert!(!HealthStatus::Unhealthy.is_degraded());
        assert!(HealthStatus::Unhealthy.is_unhealthy());
    }

    #[test]
    fn test_dependency_health_constructors() {
        let healthy = DependencyHealth::healthy("test", 5.0);
        assert_eq!(healthy.status, HealthStatus::Healthy);
        assert_eq!(healthy.latency_ms, Some(5.0));

        let degraded = DependencyHealth::degraded("test", "slow");
        assert_eq!(degraded.status, HealthStatus::Degraded);
        assert_eq!(degraded.message, Some("slow".to_string()));

        let unhealthy = DependencyHealth::unhealthy("test", "down");
        assert_eq!(unhealthy.status, HealthStatus::Unhealthy);
        assert_eq!(unhealthy.message, Some("down".to_string()));
    }

    #[test]
    fn test_aggregated_health_status() {
        let all_healthy = vec![
            DependencyHealth::healthy("db", 1.0),
            DependencyHealth::healthy("storage", 2.0),
        ];
        let health = AggregatedHealth::new("1.0.0".to_string(), 100, all_healthy);
        assert_eq!(health.status, HealthStatus::Healthy);

        let one_degraded = vec![
            DependencyHealth::healthy("db", 1.0),
            DependencyHealth::degraded("storage", "slow"),
        ];
        let health = AggregatedHealth::new("1.0.0".to_string(), 100, one_degraded);
        assert_eq!(health.status, HealthStatus::Degraded);

        let one_unhealthy = vec![
            DependencyHealth::healthy("db", 1.0),
            DependencyHealth::unhealthy("storage", "down"),
        ];
        let health = AggregatedHealth::new("1.0.0".to_string(), 100, one_unhealthy);
        assert_eq!(health.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_classify_latency() {
        assert_eq!(classify_latency("database", 5.0, 100.0).status, HealthStatus::Healthy);
        let slow = classify_latency("database", 150.0, 100.0);
        assert_eq!(slow.status, HealthStatus::Degraded);
        assert_eq!(slow.latency_ms, Some(150.0));
    }
}
