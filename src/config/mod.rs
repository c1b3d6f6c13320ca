//! Runtime configuration.
//!
//! Values come from serde defaults, then an optional TOML file, then
//! `HORARIOS_`-prefixed environment variables (a `.env` file is loaded first).

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use fundu::DurationParser;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::acatlan::{Endpoints, ProgramRef, default_programs};
use crate::pacing::Pacing;
use crate::scraper::RetryPolicy;

/// File read when no `--config` is given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "horarios.toml";

const ENV_PREFIX: &str = "HORARIOS_";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Level for this crate's own log targets; other crates stay at `warn`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory URL the three page paths are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_menu_path")]
    pub menu_path: String,
    #[serde(default = "default_selection_path")]
    pub selection_path: String,
    #[serde(default = "default_report_path")]
    pub report_path: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout", deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,

    #[serde(default = "default_selection_delay", deserialize_with = "deserialize_duration")]
    pub selection_delay: Duration,
    #[serde(default = "default_report_delay", deserialize_with = "deserialize_duration")]
    pub report_delay: Duration,
    #[serde(default = "default_program_delay", deserialize_with = "deserialize_duration")]
    pub program_delay: Duration,

    /// Attempts per program; 1 disables retrying.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff", deserialize_with = "deserialize_duration")]
    pub retry_backoff: Duration,

    /// Where the consolidated JSON is written.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default = "default_programs")]
    pub programs: Vec<ProgramRef>,
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_base_url() -> String {
    "https://escolares.acatlan.unam.mx/HISTORIA/".to_owned()
}

fn default_menu_path() -> String {
    "MenuGrupoSIsaturacionORDInarioAlumno.ASP".to_owned()
}

fn default_selection_path() -> String {
    "MenuGrupoSIsaturacionORDInarioAlumno1.asp".to_owned()
}

fn default_report_path() -> String {
    "ProcesoGRUpoSISaturacionORDINArioAlumno.asp".to_owned()
}

fn default_user_agent() -> String {
    concat!(
        "horarios/",
        env!("CARGO_PKG_VERSION"),
        " (FES Acatlan schedule catalog)"
    )
    .to_owned()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_selection_delay() -> Duration {
    Pacing::MIN_SELECTION_DELAY
}

fn default_report_delay() -> Duration {
    Pacing::MIN_REPORT_DELAY
}

fn default_program_delay() -> Duration {
    Pacing::MIN_PROGRAM_DELAY
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_backoff() -> Duration {
    Duration::from_secs(10)
}

fn default_output_path() -> PathBuf {
    PathBuf::from("materias/todas_carreras.json")
}

/// Accepts a bare number of seconds or a string with units (`"1500ms"`, `"3s"`, `"1m"`).
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => {
            let parsed = DurationParser::with_all_time_units()
                .parse(text.trim())
                .map_err(serde::de::Error::custom)?;
            Duration::try_from(parsed).map_err(serde::de::Error::custom)
        }
    }
}

impl Config {
    /// Build the figment without extracting it.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::new()
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    pub fn endpoints(&self) -> anyhow::Result<Endpoints> {
        let base = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        Endpoints::new(
            &base,
            &self.menu_path,
            &self.selection_path,
            &self.report_path,
        )
        .context("failed to resolve endpoint paths")
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::new(self.selection_delay, self.report_delay, self.program_delay)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_backoff)
    }
}
