use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
    pub demo_mode: bool,
    pub storage_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: "http://localhost:3000/api".to_string(),
            poll_interval: Duration::from_secs(5),
            poll_max_attempts: 60,
            demo_mode: false,
            storage_path: default_storage_path(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let api_base_url =
            env::var("BSS_API_BASE_URL").unwrap_or(defaults.api_base_url);

        let poll_interval = env::var("BSS_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        let poll_max_attempts = env::var("BSS_POLL_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.poll_max_attempts);

        let demo_mode = env::var("BSS_DEMO_MODE")
            .map(|v| parse_bool(&v))
            .unwrap_or(defaults.demo_mode);

        let storage_path = env::var("BSS_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);

        Config {
            api_base_url,
            poll_interval,
            poll_max_attempts,
            demo_mode,
            storage_path,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bss-client")
        .join("session.json")
}
