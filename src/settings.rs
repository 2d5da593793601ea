use {
    fire_block_machine::config::ReaderConfig,
    serde::Deserialize,
    std::{fs::File, path::Path},
};

///
/// Settings of the `fire-reader` tool, loaded from a YAML file.
///
/// ```yaml
/// reader:
///   line_buffer_capacity: 10000
///   stats_log_interval_secs: 30
///   first_streamable_block: 0
/// forward_node_logs: true
/// debug_firehose_logs: false
/// ```
///
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reader: ReaderConfig,
    /// Re-emit the non protocol lines of the node output through our own logs.
    pub forward_node_logs: bool,
    pub debug_firehose_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reader: ReaderConfig::default(),
            forward_node_logs: true,
            debug_firehose_logs: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("opening settings file {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Invalid(#[from] serde_yaml::Error),
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SettingsError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_reader(file)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml::from_str(content)?)
    }
}
