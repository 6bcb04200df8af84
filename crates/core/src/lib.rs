pub mod domain;
pub mod refresh;
pub mod storage;
pub mod view;

pub mod config {
    use crate::refresh::RefreshMode;
    use anyhow::Context;
    use std::str::FromStr;
    use std::time::Duration;

    pub const DEFAULT_COLLECTION: &str = "hibor_rates";
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8899;
    pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;
    pub const DEFAULT_CHART_ROW_LIMIT: usize = 1700;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub mongodb_string: Option<String>,
        pub database: Option<String>,
        pub collection: String,
        pub host: String,
        pub port: u16,
        /// `0` means fetch once at startup and never refresh.
        pub refresh_interval_secs: u64,
        pub fetch_limit: usize,
        pub chart_row_limit: usize,
        pub debug: bool,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                mongodb_string: non_empty_var("MONGODB_STRING"),
                database: non_empty_var("HIBOR_DATABASE"),
                collection: non_empty_var("HIBOR_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
                host: non_empty_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: parse_var("PORT", DEFAULT_PORT)?,
                refresh_interval_secs: parse_var(
                    "REFRESH_INTERVAL_SECS",
                    DEFAULT_REFRESH_INTERVAL_SECS,
                )?,
                fetch_limit: parse_var("FETCH_LIMIT", crate::storage::DEFAULT_FETCH_LIMIT)?,
                chart_row_limit: parse_var("CHART_ROW_LIMIT", DEFAULT_CHART_ROW_LIMIT)?,
                debug: parse_var("DEBUG", false)?,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_mongodb_string(&self) -> anyhow::Result<&str> {
            self.mongodb_string
                .as_deref()
                .context("MONGODB_STRING is required")
        }

        pub fn refresh_mode(&self) -> RefreshMode {
            match self.refresh_interval_secs {
                0 => RefreshMode::Once,
                secs => RefreshMode::Interval(Duration::from_secs(secs)),
            }
        }

        /// Rows fed to the chart: unrestricted when the snapshot never refreshes.
        pub fn chart_row_limit(&self) -> Option<usize> {
            match self.refresh_mode() {
                RefreshMode::Once => None,
                RefreshMode::Interval(_) => Some(self.chart_row_limit),
            }
        }

        pub fn validate(&self) -> anyhow::Result<()> {
            anyhow::ensure!(self.fetch_limit >= 1, "FETCH_LIMIT must be >= 1");
            anyhow::ensure!(self.chart_row_limit >= 1, "CHART_ROW_LIMIT must be >= 1");
            Ok(())
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match non_empty_var(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{key} is invalid ({raw}): {e}")),
        }
    }

}
