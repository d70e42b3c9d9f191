use crate::batch::BatchOptions;
use crate::markdown::{BlankLineOptions, BlankLineSettings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_HEIGHT_PER_BLANK: &str = "PRESERVE_BLANK_LINES_HEIGHT_PER_BLANK";
pub const ENV_UNIT: &str = "PRESERVE_BLANK_LINES_UNIT";
pub const ENV_MAX_BLANKS: &str = "PRESERVE_BLANK_LINES_MAX_BLANKS";

const PROJECT_CONFIG_FILE: &str = ".preserve-blank-lines.toml";

const CONFIG_TEMPLATE: &str = r#"[default.preserve]
height_per_blank = 1   # units added per extra blank line
unit = "em"            # em, rem, px, ...
max_blanks = 50        # clamp on blank lines counted per run

[default.batch]
src_dir = "docs"
dst_dir = "docs_temp"
extensions = ["md"]

# Additional profiles
# [print.preserve]
# height_per_blank = 12
# unit = "pt"
"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub preserve: BlankLineOptions,

    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    pub src_dir: Option<PathBuf>,
    pub dst_dir: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    default: ConfigProfile,

    #[serde(flatten)]
    profiles: HashMap<String, ConfigProfile>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct ConfigProfile {
    #[serde(default)]
    preserve: BlankLineOptions,

    #[serde(default)]
    batch: BatchConfig,
}

/// Where configuration comes from, besides the global and project files.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources<'a> {
    pub config_path: Option<&'a Path>,
    pub profile: Option<&'a str>,
    pub mkdocs_path: Option<&'a Path>,
    /// Highest-priority values, usually from CLI flags.
    pub overrides: BlankLineOptions,
}

impl Config {
    pub fn load(sources: ConfigSources<'_>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            tracing::debug!("Loading global config: {:?}", global_path);
            let profile_config = Self::load_from_file(&global_path, sources.profile)?;
            config.merge(profile_config);
        }

        // 2. Project config
        if let Some(project_path) = Self::project_config_path() {
            tracing::debug!("Loading project config: {:?}", project_path);
            let profile_config = Self::load_from_file(&project_path, sources.profile)?;
            config.merge(profile_config);
        }

        // 3. mkdocs.yml extension options
        if let Some(path) = sources.mkdocs_path {
            tracing::debug!("Loading mkdocs config: {:?}", path);
            match crate::mkdocs::load_extension_options(path)? {
                Some(options) => config.preserve.merge(options),
                None => tracing::warn!(
                    "{} is not enabled in {:?}",
                    crate::mkdocs::EXTENSION_NAME,
                    path
                ),
            }
        }

        // 4. Custom config file
        if let Some(path) = sources.config_path {
            tracing::debug!("Loading custom config: {:?}", path);
            let profile_config = Self::load_from_file(path, sources.profile)?;
            config.merge(profile_config);
        }

        // 5. Environment variables
        config.preserve.merge(BlankLineOptions::from_strings(
            std::env::var(ENV_HEIGHT_PER_BLANK).ok(),
            std::env::var(ENV_UNIT).ok(),
            std::env::var(ENV_MAX_BLANKS).ok(),
        ));

        // 6. CLI flags (highest priority)
        config.preserve.merge(sources.overrides);

        Ok(config)
    }

    /// Coerced settings; never fails, bad values fall back to defaults.
    pub fn settings(&self) -> BlankLineSettings {
        BlankLineSettings::from_options(&self.preserve)
    }

    pub fn batch_options(&self) -> BatchOptions {
        let defaults = BatchOptions::default();
        BatchOptions {
            src_dir: self.batch.src_dir.clone().unwrap_or(defaults.src_dir),
            dst_dir: self.batch.dst_dir.clone().unwrap_or(defaults.dst_dir),
            extensions: self
                .batch
                .extensions
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or(defaults.extensions),
        }
    }

    fn load_from_file(path: &Path, profile: Option<&str>) -> Result<ConfigProfile> {
        #[cfg(unix)]
        Self::check_permissions(path)?;

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse_profile(&content, profile)
            .with_context(|| format!("Failed to load config file: {:?}", path))
    }

    fn parse_profile(content: &str, profile: Option<&str>) -> Result<ConfigProfile> {
        let config_file: ConfigFile = toml::from_str(content).context("Invalid TOML")?;

        match profile {
            None | Some("default") => Ok(config_file.default),
            Some(profile_name) => config_file
                .profiles
                .get(profile_name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Profile '{}' not found", profile_name)),
        }
    }

    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let mode = fs::metadata(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?
            .permissions()
            .mode();

        // Writable by group or others (0o022)
        if mode & 0o022 != 0 {
            tracing::warn!(
                "Config file {:?} is writable by other users: {:o}. \
                 Recommend: chmod 644 {:?}",
                path,
                mode,
                path
            );
        }

        Ok(())
    }

    fn merge(&mut self, other: ConfigProfile) {
        self.preserve.merge(other.preserve);

        if other.batch.src_dir.is_some() {
            self.batch.src_dir = other.batch.src_dir;
        }
        if other.batch.dst_dir.is_some() {
            self.batch.dst_dir = other.batch.dst_dir;
        }
        if other.batch.extensions.is_some() {
            self.batch.extensions = other.batch.extensions;
        }
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".config/preserve-blank-lines/config.toml"))
    }

    pub fn project_config_path() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        let mut dir = current.as_path();

        loop {
            let candidate = dir.join(PROJECT_CONFIG_FILE);
            if candidate.exists() {
                return Some(candidate);
            }

            dir = dir.parent()?;
        }
    }

    pub fn init_config(global: bool) -> Result<PathBuf> {
        let path = if global {
            Self::global_config_path().context("Failed to determine global config path")?
        } else {
            PathBuf::from(PROJECT_CONFIG_FILE)
        };

        if path.exists() {
            anyhow::bail!("Config file already exists: {:?}", path);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, CONFIG_TEMPLATE)?;

        Ok(path)
    }
}
