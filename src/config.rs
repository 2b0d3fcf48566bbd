use crate::analyzer::AnalyzerOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ExportgraphConfig {
    pub exclude: Vec<String>,
    pub analysis: AnalyzerOptions,
}

impl ExportgraphConfig {
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `--no-*` switches on top of the file settings
    pub fn with_overrides(mut self, no_esm: bool, no_commonjs: bool, no_window: bool) -> Self {
        if no_esm {
            self.analysis.check_esm_exports = false;
        }
        if no_commonjs {
            self.analysis.check_common_js_exports = false;
        }
        if no_window {
            self.analysis.init_window = false;
        }
        self
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("exportgraph.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ExportgraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config = ExportgraphConfig::from_toml_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ExportgraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
