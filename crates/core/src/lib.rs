pub mod domain;
pub mod error;
pub mod storage;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_DATABASE_URL: &str = "sqlite://local_bigquery.db";
    pub const DEFAULT_HOST: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 9000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: String,
        pub host: String,
        pub port: u16,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            let port = match non_empty("PORT") {
                Some(raw) => raw
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a valid port number (got {raw:?})"))?,
                None => DEFAULT_PORT,
            };

            Ok(Self {
                database_url: non_empty("DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
                sentry_dsn: non_empty("SENTRY_DSN"),
            })
        }

        pub fn bind_addr(&self) -> String {
            format!("{}:{}", self.host, self.port)
        }
    }

}
