use std::env;
use std::sync::OnceLock;

static CONFIG: OnceLock<Config> = OnceLock::new();

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub monitor: MonitorConfig,
    pub tail: TailConfig,
}

impl Config {
    pub fn global() -> &'static Config {
        CONFIG.get_or_init(Self::load)
    }

    fn load() -> Self {
        dotenv::dotenv().ok();
        Self {
            cluster: ClusterConfig::load(),
            monitor: MonitorConfig::load(),
            tail: TailConfig::load(),
        }
    }
}

// --- MODULES ---

// CLUSTER
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub brokers: String,
    pub log_level: String,
}

impl ClusterConfig {
    fn load() -> Self {
        Self {
            brokers:   get_env("KAFSCOPE_BROKERS", "localhost:9092"),
            log_level: get_env("KAFSCOPE_LOG", "info"),
        }
    }
}

// MONITOR
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub topic_tick_ms: u64,
    pub group_tick_ms: u64,
    pub fetch_timeout_ms: u64,
    pub lag_alert_threshold: i64,
}

impl MonitorConfig {
    fn load() -> Self {
        Self {
            topic_tick_ms:       get_env("MONITOR_TOPIC_TICK_MS", "2000"),
            group_tick_ms:       get_env("MONITOR_GROUP_TICK_MS", "5000"),
            fetch_timeout_ms:    get_env("MONITOR_FETCH_TIMEOUT_MS", "5000"),
            lag_alert_threshold: get_env("MONITOR_LAG_ALERT_THRESHOLD", "1000"),
        }
    }
}

// TAIL
#[derive(Debug, Clone)]
pub struct TailConfig {
    pub max_partitions: usize,
    pub channel_capacity: usize,
    pub open_timeout_ms: u64,
}

impl TailConfig {
    fn load() -> Self {
        Self {
            max_partitions:   get_env("TAIL_MAX_PARTITIONS", "5"),
            channel_capacity: get_env("TAIL_CHANNEL_CAPACITY", "256"),
            open_timeout_ms:  get_env("TAIL_OPEN_TIMEOUT_MS", "5000"),
        }
    }
}

// --- PRIVATE HELPER ---

fn get_env<T: std::str::FromStr>(key: &str, default: &str) -> T {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| format!("Config error: {} must be valid", key))
        .unwrap()
}
