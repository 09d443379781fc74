pub mod config {
    use serde::Deserialize;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    pub const DEFAULT_LOG_LEVEL: &str = "info";

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_log_level")]
        pub log_level: String,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        /// Builds the log filter for `log_level`.
        ///
        /// Accepts a bare level such as `debug` or a directive list such as
        /// `todo_api=debug,tower_http=info`. Returns `None` for anything else.
        pub fn log_filter(&self) -> Option<EnvFilter> {
            let log_level = self.log_level.trim();
            if log_level.parse::<LevelFilter>().is_err() && !log_level.contains('=') {
                return None;
            }
            EnvFilter::try_new(log_level).ok()
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_log_level() -> String {
        DEFAULT_LOG_LEVEL.to_string()
    }

}
pub mod entities;
pub mod todo;
pub mod web;
