//! Pipeline configuration. Every policy the old one-off scripts disagreed on
//! (multi-word handling, hyphen handling, gender merging, scoring base,
//! shard layout) is an explicit field here, loaded from one YAML file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::merge::GenderMergePolicy;
use crate::normalize::{HyphenPolicy, MultiWordPolicy};
use crate::rank::DEFAULT_SCORE_BASE;
use crate::shard::ShardPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "onomast.yaml";
pub const DEFAULT_DATABASE_PATH: &str = "data/namesDatabase.json";
pub const DEFAULT_OUTPUT_DIR: &str = "public/data";

#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, serde_yaml::Error),
    Table(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(path, err) => {
                write!(f, "failed to read config '{}': {err}", path.display())
            }
            Self::Parse(path, err) => {
                write!(f, "failed to parse config '{}': {err}", path.display())
            }
            Self::Table(message) => write!(f, "curated table: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw source dataset files, loaded and flattened in order.
    pub sources: Vec<PathBuf>,
    /// Full ranked database output.
    pub database_path: PathBuf,
    /// Shard files and index output directory.
    pub output_dir: PathBuf,
    pub multi_word: MultiWordPolicy,
    pub hyphen: HyphenPolicy,
    pub allow_apostrophe: bool,
    pub gender_merge: GenderMergePolicy,
    pub score_base: u32,
    pub shard: ShardPolicy,
    /// Back up the previous database file before replacing it.
    pub backup: bool,
    /// Extra denylist entries on top of the built-in list.
    pub denylist: Vec<String>,
    /// JSON file of direct transliterations (raw form -> Latin form).
    /// Built-in defaults apply when absent.
    pub transliteration_table: Option<PathBuf>,
    /// JSON file of keep-together/must-separate variant rules.
    /// Built-in defaults apply when absent.
    pub equivalence_table: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            sources: Vec::new(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            multi_word: MultiWordPolicy::default(),
            hyphen: HyphenPolicy::default(),
            allow_apostrophe: true,
            gender_merge: GenderMergePolicy::default(),
            score_base: DEFAULT_SCORE_BASE,
            shard: ShardPolicy::default(),
            backup: true,
            denylist: Vec::new(),
            transliteration_table: None,
            equivalence_table: None,
        }
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| ConfigError::Read(path.to_path_buf(), err))?;
    serde_yaml::from_str(&raw).map_err(|err| ConfigError::Parse(path.to_path_buf(), err))
}
