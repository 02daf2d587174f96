use crate::stats::Window;
use std::{env, path::PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/caltrack.json";
const DEFAULT_WEEKS: usize = 8;
const MAX_WEEKS: usize = 104;

/// Runtime settings, read from the environment.
///
/// | Variable | Default |
/// |---|---|
/// | `PORT` | `8080` |
/// | `APP_DATA_PATH` | `data/caltrack.json` |
/// | `DASHBOARD_WINDOW_DAYS` | `7` (`all` for all-time) |
/// | `DASHBOARD_WEEKS` | `8` |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub window: Window,
    pub weeks: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            window: Window::default(),
            weeks: DEFAULT_WEEKS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let data_path = lookup("APP_DATA_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);

        let window = match lookup("DASHBOARD_WINDOW_DAYS") {
            Some(value) => value.parse::<Window>().unwrap_or_else(|err| {
                warn!("ignoring DASHBOARD_WINDOW_DAYS: {err}");
                defaults.window
            }),
            None => defaults.window,
        };

        let weeks = lookup("DASHBOARD_WEEKS")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|weeks| (1..=MAX_WEEKS).contains(weeks))
            .unwrap_or(defaults.weeks);

        Self {
            port,
            data_path,
            window,
            weeks,
        }
    }
}
