//! Construction parameters for the IC-testing environment

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use ictest_rl_core::{EnvironmentConfig, RLError, Result};

use crate::table::TestTable;

/// Environment variable naming the directory that holds the training table
pub const DATA_PATH_VAR: &str = "DATA_PATH";
/// Environment variable naming the training table file inside [`DATA_PATH_VAR`]
pub const TRAINING_FILE_VAR: &str = "TRAINING_FILE";
/// [`EnvironmentConfig`] parameter overriding the table location
pub const DATA_PATH_PARAM: &str = "data_path";

/// Render modes advertised by the environment
pub const RENDER_MODES: [&str; 2] = ["human", "rgb_array"];
/// Frame rate advertised for rendering
pub const METADATA_RENDER_FPS: u32 = 4;

/// Requested render mode
///
/// Rendering itself is a no-op; the mode is only recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// No rendering
    #[default]
    None,
    /// Human-visible window
    Human,
    /// Raw pixel array
    RgbArray,
}

impl FromStr for RenderMode {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "none" => Ok(Self::None),
            "human" => Ok(Self::Human),
            "rgb_array" => Ok(Self::RgbArray),
            other => Err(RLError::Environment(format!(
                "Unsupported render mode {other:?}, expected one of {RENDER_MODES:?}"
            ))),
        }
    }
}

/// Where the test table comes from
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Load the table from this file
    Path(PathBuf),
    /// Use an already loaded table
    Table(Arc<TestTable>),
}

impl DataSource {
    /// Resolve the table location from `DATA_PATH` and `TRAINING_FILE`
    ///
    /// Only the process environment is consulted. A `.env` file is not
    /// read; export the variables in the shell (or pass the path through
    /// [`DATA_PATH_PARAM`]) instead.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the table location through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = lookup(DATA_PATH_VAR)
            .ok_or_else(|| RLError::Environment(format!("{DATA_PATH_VAR} is not set")))?;
        let file = lookup(TRAINING_FILE_VAR)
            .ok_or_else(|| RLError::Environment(format!("{TRAINING_FILE_VAR} is not set")))?;
        Ok(Self::Path(PathBuf::from(dir).join(file)))
    }

    /// Load (or hand out) the table
    pub fn load(&self) -> Result<Arc<TestTable>> {
        match self {
            Self::Path(path) => Ok(Arc::new(TestTable::load(path)?)),
            Self::Table(table) => Ok(Arc::clone(table)),
        }
    }
}

/// Configuration of [`crate::IcTestEnv`]
#[derive(Debug, Clone, Default)]
pub struct IcTestConfig {
    /// Requested render mode
    pub render_mode: RenderMode,
    /// Table source; `None` falls back to [`DataSource::from_env`]
    pub data: Option<DataSource>,
}

impl IcTestConfig {
    /// Use an in-memory table
    #[must_use]
    pub fn with_table(mut self, table: Arc<TestTable>) -> Self {
        self.data = Some(DataSource::Table(table));
        self
    }

    /// Load the table from `path`
    #[must_use]
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data = Some(DataSource::Path(path.into()));
        self
    }

    /// Set the render mode
    #[must_use]
    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    /// Translate a generic environment configuration
    pub fn from_environment_config(config: &EnvironmentConfig) -> Result<Self> {
        let render_mode = config
            .render_mode
            .as_deref()
            .map(RenderMode::from_str)
            .transpose()?
            .unwrap_or_default();
        let data = config
            .param_str(DATA_PATH_PARAM)
            .map(|path| DataSource::Path(PathBuf::from(path)));
        Ok(Self { render_mode, data })
    }

    /// Produce the table this configuration points at
    pub fn resolve_table(&self) -> Result<Arc<TestTable>> {
        match &self.data {
            Some(source) => source.load(),
            None => DataSource::from_env()?.load(),
        }
    }
}
