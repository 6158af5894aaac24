use std::sync::LazyLock;

use derive_from_env::FromEnv;

/// Tuning for background writer threads, read from `TMLOG_*` variables.
#[derive(FromEnv)]
#[from_env(prefix = "TMLOG")]
#[allow(non_snake_case)]
pub struct TMLogConfig {
    /// Longest time a background writer keeps lines buffered.
    #[from_env(default = "100")]
    pub FLUSH_INTERVAL_MS: u64,
    /// Maximum number of commands drained from the channel in one go.
    #[from_env(default = "32")]
    pub BATCH_SIZE: usize,
}

pub static TMLOG_CONFIG: LazyLock<TMLogConfig> = LazyLock::new(|| {
    TMLogConfig::from_env().expect("Invalid TMLOG_* environment configuration")
});

#[test]
fn test_config_defaults() {
    let config = TMLogConfig::from_env().unwrap();
    if std::env::var_os("TMLOG_FLUSH_INTERVAL_MS").is_none() {
        assert_eq!(config.FLUSH_INTERVAL_MS, 100);
    }
    if std::env::var_os("TMLOG_BATCH_SIZE").is_none() {
        assert_eq!(config.BATCH_SIZE, 32);
    }
}
