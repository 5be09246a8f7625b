//! Application-level configuration loading: scoring system address, polling intervals,
//! switchover behaviour and sink targets.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the service looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/scoring-mirror.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCORING_MIRROR_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Scheme, host and port of the scoring system, e.g. `http://10.0.100.5`.
    pub base_address: String,
    /// Paths of the scoring documents relative to [`AppConfig::base_address`].
    pub endpoints: EndpointPaths,
    /// Pause between two connection probes while the link is down.
    pub connection_retry_delay_secs: f64,
    /// Upper bound for a single fetch.
    pub connection_timeout_secs: f64,
    /// Pause between two live document fetches while connected.
    pub parsing_period_secs: f64,
    /// Consecutive failed fetches after which the link is declared lost.
    pub quick_retry_max_count: u32,
    /// Advance to the next match automatically once a match ends.
    pub auto_switchover: bool,
    /// Delay between the end of a match and the automatic switchover.
    pub switchover_time_secs: f64,
    /// Drive the countdown from the local manual timer instead of the live document.
    pub manual_timer: bool,
    /// Length the manual timer resets to.
    pub manual_timer_length_secs: u32,
    /// Prefix the match label with the phase name.
    pub show_match_phase: bool,
    /// Append team names to quadrant labels holding a bare team number.
    pub show_team_names: bool,
    /// Number of playing fields, used to blank every field at the end of a phase.
    pub field_count: u32,
    /// Embedded status and control webserver.
    pub status_server: StatusServerConfig,
    /// Overlay text files, when configured.
    pub file_sink: Option<FileSinkConfig>,
    /// Remote overlay API, when configured.
    pub overlay_sink: Option<OverlaySinkConfig>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        base_address = %config.base_address,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Pause between two connection probes.
    pub fn connection_retry_delay(&self) -> Duration {
        secs(self.connection_retry_delay_secs)
    }

    /// Upper bound for a single fetch.
    pub fn connection_timeout(&self) -> Duration {
        secs(self.connection_timeout_secs)
    }

    /// Pause between two live document fetches.
    pub fn parsing_period(&self) -> Duration {
        secs(self.parsing_period_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_address: "http://localhost".into(),
            endpoints: EndpointPaths::default(),
            connection_retry_delay_secs: 1.0,
            connection_timeout_secs: 5.0,
            parsing_period_secs: 0.5,
            quick_retry_max_count: 4,
            auto_switchover: true,
            switchover_time_secs: 10.0,
            manual_timer: false,
            manual_timer_length_secs: 150,
            show_match_phase: true,
            show_team_names: false,
            field_count: 2,
            status_server: StatusServerConfig::default(),
            file_sink: None,
            overlay_sink: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
/// Paths of the documents served by the scoring system.
pub struct EndpointPaths {
    /// Live marquee of the match in progress.
    pub live_match: String,
    /// Pit display listing upcoming matches.
    pub upcoming_schedule: String,
    /// Team listing.
    pub team_lookup: String,
    /// Phase schedule.
    pub phase_schedule: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            live_match: "/Marquee/Match".into(),
            upcoming_schedule: "/Marquee/PitRefresh".into(),
            team_lookup: "/TeamList".into(),
            phase_schedule: "/Marquee/Schedule".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
/// Embedded status webserver settings.
pub struct StatusServerConfig {
    /// Serve the status and control routes.
    pub enabled: bool,
    /// Listening port; the `PORT` environment variable takes precedence.
    pub port: u16,
}

impl Default for StatusServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
/// Overlay text files, one per logical display field.
pub struct FileSinkConfig {
    /// Directory holding every file below.
    pub rel_file_path: String,
    /// File receiving the countdown.
    pub timer_file: Option<String>,
    /// File receiving the match label.
    pub match_num_file: Option<String>,
    /// Quadrant files of fields `1..`, in order.
    pub fields: Vec<QuadrantTargets>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
/// Remote overlay API, receiving one "set text" request per logical display field.
pub struct OverlaySinkConfig {
    /// Base URL of the overlay API.
    pub base_url: String,
    /// Upper bound for a single request.
    pub timeout_secs: f64,
    /// Text source receiving the countdown.
    pub timer_source: Option<String>,
    /// Text source receiving the match label.
    pub match_source: Option<String>,
    /// Quadrant text sources of fields `1..`, in order.
    pub fields: Vec<QuadrantTargets>,
}

impl Default for OverlaySinkConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 2.0,
            timer_source: None,
            match_source: None,
            fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Per-quadrant targets of one field: file names or overlay source identifiers.
pub struct QuadrantTargets {
    /// Red quadrant target.
    #[serde(alias = "red_file", alias = "red_source")]
    pub red: Option<String>,
    /// Green quadrant target.
    #[serde(alias = "green_file", alias = "green_source")]
    pub green: Option<String>,
    /// Blue quadrant target.
    #[serde(alias = "blue_file", alias = "blue_source")]
    pub blue: Option<String>,
    /// Yellow quadrant target.
    #[serde(alias = "yellow_file", alias = "yellow_source")]
    pub yellow: Option<String>,
}

impl QuadrantTargets {
    /// Configured, non-empty targets keyed by quadrant.
    pub fn targets(&self) -> impl Iterator<Item = (crate::model::QuadrantColor, &str)> {
        use crate::model::QuadrantColor;

        [
            (QuadrantColor::Red, &self.red),
            (QuadrantColor::Green, &self.green),
            (QuadrantColor::Blue, &self.blue),
            (QuadrantColor::Yellow, &self.yellow),
        ]
        .into_iter()
        .filter_map(|(color, target)| {
            target
                .as_deref()
                .filter(|value| !value.is_empty())
                .map(|value| (color, value))
        })
    }
}

/// Non-negative seconds as a [`Duration`]; invalid values collapse to zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
