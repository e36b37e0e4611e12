use anyhow::Context;

use crate::metrics::DEFAULT_CAPACITY;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// How many recent requests the metrics log retains
    pub metrics_capacity: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            metrics_capacity: match std::env::var("METRICS_CAPACITY") {
                Ok(v) => v
                    .parse()
                    .context("METRICS_CAPACITY must be a non-negative integer")?,
                Err(_) => DEFAULT_CAPACITY,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
