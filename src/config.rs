use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub archive: ArchiveCfg,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub text: TextCfg,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: Default::default(),
            paths: Default::default(),
            archive: Default::default(),
            classification: Default::default(),
            text: Default::default(),
            output: Default::default(),
            logging: Default::default(),
            security: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub resume: bool,
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            resume: true,
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub out_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveCfg {
    /// Entry-name suffix identifying the manifest inside the archive.
    pub manifest_suffix: String,
}
impl Default for ArchiveCfg {
    fn default() -> Self {
        Self {
            manifest_suffix: ".out".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Pages whose top class scores below this are left unprocessed.
    pub min_confidence: f64,
    pub first_page_label: String,
    pub page_label: String,
}
impl Default for Classification {
    fn default() -> Self {
        Self {
            min_confidence: 0.99,
            first_page_label: "FIRST_PAGE".into(),
            page_label: "PAGE".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextCfg {
    pub normalize_unicode: bool,
    pub normalize_newlines: bool,
    pub remove_by_regex: bool,
    #[serde(default)]
    pub regex: TextRegex,
}
impl Default for TextCfg {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            normalize_newlines: true,
            remove_by_regex: false,
            regex: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRegex {
    pub patterns: Vec<String>,
}
impl Default for TextRegex {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub write_result_json: bool,
    pub write_index_json: bool,
    pub result_filename: String,
    pub pretty: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_result_json: true,
            write_index_json: true,
            result_filename: "result.json".into(),
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}
