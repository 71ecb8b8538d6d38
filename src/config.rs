use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ENGINE_PATH: &str = if cfg!(windows) {
    "build/AlphaDeepChess.exe"
} else {
    "build/AlphaDeepChess"
};

/// Board is 700px across by default.
const DEFAULT_SQUARE_SIZE: f32 = 700.0 / 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub engine_path: PathBuf,
    pub engine_args: Vec<String>,
    /// `None` waits for engine replies for as long as the engine lives.
    pub wait_timeout: Option<Duration>,
    pub log_dir: Option<PathBuf>,
    pub square_size: f32,
    pub poll_start: Duration,
    pub poll_step: Duration,
    pub poll_max: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine_path: PathBuf::from(DEFAULT_ENGINE_PATH),
            engine_args: Vec::new(),
            wait_timeout: None,
            log_dir: None,
            square_size: DEFAULT_SQUARE_SIZE,
            poll_start: Duration::from_millis(50),
            poll_step: Duration::from_millis(10),
            poll_max: Duration::from_millis(500),
        }
    }
}

impl Config {
    /// Defaults overridden by `ENGINE_PATH`, `ENGINE_WAIT_TIMEOUT_MS` and
    /// `ENGINE_LOG_DIR`.
    pub fn from_env() -> Config {
        Config::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Config {
        let mut config = Config::default();

        if let Some(path) = var("ENGINE_PATH") {
            config.engine_path = PathBuf::from(path);
        }
        if let Some(ms) = var("ENGINE_WAIT_TIMEOUT_MS").and_then(|ms| ms.trim().parse().ok()) {
            config.wait_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(dir) = var("ENGINE_LOG_DIR") {
            config.log_dir = Some(PathBuf::from(dir));
        }

        config
    }
}

#[test]
fn env_overrides_defaults() {
    let config = Config::from_vars(|key| match key {
        "ENGINE_PATH" => Some("/opt/engine".into()),
        "ENGINE_WAIT_TIMEOUT_MS" => Some("2500".into()),
        _ => None,
    });

    assert_eq!(config.engine_path, PathBuf::from("/opt/engine"));
    assert_eq!(config.wait_timeout, Some(Duration::from_millis(2500)));
    assert_eq!(config.log_dir, None);
    assert_eq!(config.poll_max, Duration::from_millis(500));

    let bad_timeout = Config::from_vars(|key| (key == "ENGINE_WAIT_TIMEOUT_MS").then(|| "soon".into()));
    assert_eq!(bad_timeout.wait_timeout, None);
}
