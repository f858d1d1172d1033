pub mod app_config;
pub mod config;
pub mod professors;
pub mod reviews;
pub mod selectors;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use professors::{ProfessorRecord, ProfessorSummary, RatingDistribution, Tier};
pub use reviews::ReviewRecord;
pub use selectors::{load_selectors, ControlLocator, SiteSelectors};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read selectors file {path}: {source}")]
    SelectorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selectors file: {0}")]
    SelectorsFileParse(#[from] serde_yaml::Error),

    #[error("invalid selectors: {0}")]
    InvalidSelectors(String),
}
