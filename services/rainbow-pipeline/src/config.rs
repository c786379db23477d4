//! Pipeline configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment variables and command-line flags (both handled by clap).

use std::path::{Path, PathBuf};

use rainbow_analysis::Toolset;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{PipelineError, PipelineResult};

/// How the barrel distortion is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DistortionBackend {
    /// ImageMagick `convert -distort Barrel`
    Imagemagick,
    /// In-process implementation of the same mapping
    Native,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Forecast root holding one directory per slug
    pub data_dir: PathBuf,
    /// Directory for the latest-result alias
    pub latest_dir: PathBuf,
    pub gazetteer_path: PathBuf,
    pub grib2json_path: PathBuf,
    pub convert_path: PathBuf,
    pub distortion_backend: DistortionBackend,
    /// Push endpoint; messages are only logged when unset
    pub push_endpoint: Option<String>,
    pub push_api_key: Option<String>,
    pub push_concurrency: usize,
    /// Most unprocessed slugs handled in one run
    pub max_backlog: usize,
    /// Column shift applied to the solar mask and subsolar column
    pub solar_column_offset: isize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("static/gfs"),
            latest_dir: PathBuf::from("static/latest"),
            gazetteer_path: PathBuf::from("data/gazetteer.db"),
            grib2json_path: PathBuf::from("grib2json"),
            convert_path: PathBuf::from("convert"),
            distortion_backend: DistortionBackend::Imagemagick,
            push_endpoint: None,
            push_api_key: None,
            push_concurrency: 4,
            max_backlog: 8,
            solar_column_offset: 0,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file; missing keys keep their defaults.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: PipelineConfig = serde_yaml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "Loaded pipeline config");
        Ok(config)
    }

    /// Defaults, then the file if one is given, then `overrides`.
    pub fn resolve(file: Option<&Path>, overrides: &ConfigOverrides) -> PipelineResult<Self> {
        let mut config = match file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_backlog == 0 {
            return Err(PipelineError::Config("max_backlog must be at least 1".into()));
        }
        if self.push_concurrency == 0 {
            return Err(PipelineError::Config(
                "push_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn toolset(&self) -> Toolset {
        match self.distortion_backend {
            DistortionBackend::Imagemagick => {
                Toolset::external(&self.grib2json_path, &self.convert_path)
            }
            DistortionBackend::Native => Toolset::native(&self.grib2json_path),
        }
    }
}

/// Settings taken from the environment or the command line.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Forecast data directory
    #[arg(long, env = "RAINBOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for the latest rainbow cities alias
    #[arg(long, env = "RAINBOW_LATEST_DIR")]
    pub latest_dir: Option<PathBuf>,

    /// Gazetteer SQLite database
    #[arg(long, env = "RAINBOW_GAZETTEER")]
    pub gazetteer: Option<PathBuf>,

    /// grib2json executable
    #[arg(long, env = "GRIB2JSON_PATH")]
    pub grib2json: Option<PathBuf>,

    /// ImageMagick convert executable
    #[arg(long, env = "IMAGEMAGICK_CONVERT")]
    pub convert: Option<PathBuf>,

    /// Barrel distortion backend
    #[arg(long, env = "RAINBOW_DISTORTION", value_enum)]
    pub distortion: Option<DistortionBackend>,

    /// Push delivery endpoint
    #[arg(long, env = "PUSH_ENDPOINT")]
    pub push_endpoint: Option<String>,

    /// API key sent with every push
    #[arg(long, env = "PUSH_API_KEY", hide_env_values = true)]
    pub push_api_key: Option<String>,

    /// Maximum concurrent pushes
    #[arg(long)]
    pub push_concurrency: Option<usize>,

    /// Maximum unprocessed forecasts per run
    #[arg(long)]
    pub max_backlog: Option<usize>,

    /// Column shift for the solar mask
    #[arg(long, allow_hyphen_values = true)]
    pub solar_column_offset: Option<isize>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(v) = &self.data_dir {
            config.data_dir = v.clone();
        }
        if let Some(v) = &self.latest_dir {
            config.latest_dir = v.clone();
        }
        if let Some(v) = &self.gazetteer {
            config.gazetteer_path = v.clone();
        }
        if let Some(v) = &self.grib2json {
            config.grib2json_path = v.clone();
        }
        if let Some(v) = &self.convert {
            config.convert_path = v.clone();
        }
        if let Some(v) = self.distortion {
            config.distortion_backend = v;
        }
        if let Some(v) = &self.push_endpoint {
            config.push_endpoint = Some(v.clone());
        }
        if let Some(v) = &self.push_api_key {
            config.push_api_key = Some(v.clone());
        }
        if let Some(v) = self.push_concurrency {
            config.push_concurrency = v;
        }
        if let Some(v) = self.max_backlog {
            config.max_backlog = v;
        }
        if let Some(v) = self.solar_column_offset {
            config.solar_column_offset = v;
        }
    }
}
