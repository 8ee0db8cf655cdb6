//! Runtime Configuration
//!
//! All tunables are read from the environment at startup, mirroring how the
//! service is configured in deployment. Nothing in the core modules reads the
//! environment directly; they receive these values explicitly.

use anyhow::{Context, Result};
use rand::Rng;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings for one service instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Identity stamped on every order this instance claims.
    /// Defaults to a random six-digit id when not set.
    pub instance_id: String,
    /// Interval between scheduler ticks.
    pub job_interval: Duration,
    /// Upper bound on concurrently in-flight ticks per instance.
    pub max_in_flight: usize,
    /// When false the scheduler never starts; the HTTP surface still runs.
    pub job_enabled: bool,
    /// Minutes a Processing order may hold its lease before it is reclaimed.
    pub lock_timeout_minutes: i64,
    /// Orders whose failed_count exceeds this threshold are marked Failed.
    pub max_retries: u32,
    /// Base URL source images are fetched from (`{base}/{image_id}.jpg`).
    pub image_base_url: String,
    /// Directory rendered edge maps are written to (`{dir}/{image_id}.png`).
    pub image_output_dir: PathBuf,
    /// Pixel count source images are normalized to before detection.
    pub target_pixels: u32,
    /// Gaussian smoothing kernel size.
    pub gaussian_kernel_size: usize,
    /// Gaussian smoothing sigma.
    pub gaussian_sigma: f64,
    /// Low threshold as a fraction of the high threshold.
    pub low_threshold_ratio: f64,
    /// High threshold as a fraction of the maximum gradient magnitude.
    pub high_threshold_ratio: f64,
}

impl Config {
    /// Reads the configuration from the environment, applying defaults for
    /// anything unset. Fails on values that are present but unparseable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: parse_env("BIND_ADDR", "0.0.0.0:8080".parse().unwrap())?,
            instance_id: std::env::var("INSTANCE_ID")
                .unwrap_or_else(|_| rand::thread_rng().gen_range(100_000..=999_999).to_string()),
            job_interval: Duration::from_secs(parse_env("SCHEDULED_JOB_INTERVAL_SECONDS", 10)?),
            max_in_flight: parse_env("SCHEDULED_JOB_MAX_INSTANCES", 1)?,
            job_enabled: std::env::var("SCHEDULED_JOB_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            lock_timeout_minutes: parse_env("PROCESSING_LOCK_TIMEOUT_MINUTES", 15)?,
            max_retries: parse_env("MAX_RETRIES", 3)?,
            image_base_url: std::env::var("IMAGE_BASE_URL").unwrap_or_else(|_| {
                "https://m14workshopimages.blob.core.windows.net/m14images".to_string()
            }),
            image_output_dir: std::env::var("IMAGE_OUTPUT_FOLDER")
                .unwrap_or_else(|_| "output_images".to_string())
                .into(),
            target_pixels: parse_env("IMAGE_TARGET_PIXELS", 500_000)?,
            gaussian_kernel_size: parse_env("GAUSSIAN_KERNEL_SIZE", 5)?,
            gaussian_sigma: parse_env("GAUSSIAN_SIGMA", 1.0)?,
            low_threshold_ratio: parse_env("LOW_THRESHOLD_RATIO", 0.04)?,
            high_threshold_ratio: parse_env("HIGH_THRESHOLD_RATIO", 0.13)?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid value for {}: {}", name, raw)),
        Err(_) => Ok(default),
    }
}
