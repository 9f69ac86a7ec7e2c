//! User configuration persistence.
//!
//! The configuration file lives in the platform-specific config folder:
//! - macOS: ~/Library/Application Support/org.geochem-tools.geochem-tools/
//! - Windows: %APPDATA%/geochem-tools/geochem-tools/config/
//! - Linux: ~/.config/geochem-tools/
//!
//! `--config` and the `GEOCHEM_TOOLS_CONFIG` environment variable take
//! precedence over the platform location, in that order.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use directories::ProjectDirs;
use tracing::{debug, info};

use geochem_model::{GeochemError, Result, UserConfig};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "GEOCHEM_TOOLS_CONFIG";

const APP_QUALIFIER: &str = "org";
const APP_ORG: &str = "geochem-tools";
const APP_NAME: &str = "geochem-tools";
const CONFIG_FILENAME: &str = "config.toml";

/// Where the configuration path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Flag,
    Environment,
    Platform,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigSource::Flag => "--config",
            ConfigSource::Environment => CONFIG_ENV,
            ConfigSource::Platform => "platform default",
        })
    }
}

/// A resolved configuration file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub source: ConfigSource,
}

/// Platform configuration file path.
///
/// Returns `None` if the platform-specific directory cannot be determined.
pub fn platform_config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Resolve the configuration path from the flag, the environment, then the
/// platform directory.
pub fn resolve_config_path(flag: Option<&Path>) -> Result<ConfigLocation> {
    resolve_with(flag, std::env::var_os(CONFIG_ENV), platform_config_path())
}

fn resolve_with(
    flag: Option<&Path>,
    env: Option<OsString>,
    platform: Option<PathBuf>,
) -> Result<ConfigLocation> {
    if let Some(path) = flag {
        return Ok(ConfigLocation {
            path: path.to_path_buf(),
            source: ConfigSource::Flag,
        });
    }
    if let Some(path) = env.filter(|value| !value.is_empty()) {
        return Ok(ConfigLocation {
            path: PathBuf::from(path),
            source: ConfigSource::Environment,
        });
    }
    platform
        .map(|path| ConfigLocation {
            path,
            source: ConfigSource::Platform,
        })
        .ok_or_else(|| GeochemError::Config {
            path: PathBuf::from(CONFIG_FILENAME),
            message: format!(
                "could not determine a configuration directory; pass --config or set {CONFIG_ENV}"
            ),
        })
}

/// Load the configuration at `path`.
///
/// A missing file yields the defaults. Unreadable, malformed or invalid
/// files are errors.
pub fn load_config(path: &Path) -> Result<UserConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no configuration file found, using defaults");
            return Ok(UserConfig::default());
        }
        Err(source) => {
            return Err(GeochemError::FileRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let config = parse_config(&content, path)?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Parse and validate a configuration document; `path` only labels errors.
pub fn parse_config(content: &str, path: &Path) -> Result<UserConfig> {
    let config: UserConfig = toml::from_str(content).map_err(|error| GeochemError::Config {
        path: path.to_path_buf(),
        message: error.message().to_string(),
    })?;
    config.validate().map_err(|problems| GeochemError::Config {
        path: path.to_path_buf(),
        message: problems.join("; "),
    })?;
    Ok(config)
}

/// Render a configuration as TOML.
pub fn render_config(config: &UserConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|error| GeochemError::Config {
        path: PathBuf::from(CONFIG_FILENAME),
        message: error.to_string(),
    })
}

/// Save `config` to `path`, creating the parent directory if needed.
pub fn save_config(path: &Path, config: &UserConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| GeochemError::FileWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = render_config(config)?;
    fs::write(path, content).map_err(|source| GeochemError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "saved configuration");
    Ok(())
}

/// Editor command from `$VISUAL`, `$EDITOR`, or the platform fallback.
pub fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .into_iter()
        .filter_map(std::env::var_os)
        .map(|value| value.to_string_lossy().trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "vi".to_string()
            }
        })
}

/// Open the configuration in an editor, writing defaults first if the file
/// does not exist, then check that the edited file still parses.
pub fn edit_config(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        save_config(path, &UserConfig::default())?;
    }
    let editor = editor_command();
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    info!(editor = %editor, path = %path.display(), "opening configuration");
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|source| GeochemError::FileRead {
            path: PathBuf::from(program),
            source,
        })?;
    if !status.success() {
        return Err(GeochemError::Config {
            path: path.to_path_buf(),
            message: format!("editor '{editor}' exited with {status}"),
        });
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_environment_and_platform() {
        let location = resolve_with(
            Some(Path::new("/tmp/flag.toml")),
            Some(OsString::from("/tmp/env.toml")),
            Some(PathBuf::from("/tmp/platform.toml")),
        )
        .unwrap();
        assert_eq!(location.source, ConfigSource::Flag);
        assert_eq!(location.path, PathBuf::from("/tmp/flag.toml"));
    }

    #[test]
    fn environment_beats_platform() {
        let location = resolve_with(
            None,
            Some(OsString::from("/tmp/env.toml")),
            Some(PathBuf::from("/tmp/platform.toml")),
        )
        .unwrap();
        assert_eq!(location.source, ConfigSource::Environment);
    }

    #[test]
    fn empty_environment_is_ignored() {
        let location = resolve_with(
            None,
            Some(OsString::new()),
            Some(PathBuf::from("/tmp/platform.toml")),
        )
        .unwrap();
        assert_eq!(location.source, ConfigSource::Platform);
    }

    #[test]
    fn no_location_is_a_config_error() {
        let err = resolve_with(None, None, None).unwrap_err();
        assert!(matches!(err, GeochemError::Config { .. }));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = load_config(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn malformed_file_is_fatal() {
        let err = parse_config("projection = \"EPSG\"", Path::new("config.toml")).unwrap_err();
        assert!(matches!(err, GeochemError::Config { .. }));
    }

    #[test]
    fn unknown_column_key_is_rejected() {
        let err = parse_config("[columns.generic]\nsample = \"ID\"\n", Path::new("c.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("unknown field 'sample'"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = UserConfig::default();
        config.projection = 4326;
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }
}
