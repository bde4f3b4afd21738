//! Persistent defaults.
//!
//! Config files hold the same flags as the command line, one or more per
//! line, `#` for comments. The global file is overridden by a local
//! `.marksightrc`, which is overridden by the actual command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::theme::ThemeMode;

pub const LOCAL_CONFIG_NAME: &str = ".marksightrc";
const APP_DIR: &str = "marksight";
const CONFIG_FILE: &str = "config";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub no_watch: bool,
    pub theme: Option<ThemeMode>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge with `other` taking precedence for valued options.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            no_watch: self.no_watch || other.no_watch,
            theme: other.theme.or(self.theme),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }

    /// Config file lines for these flags, without the header comment.
    fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.no_watch {
            lines.push("--no-watch".to_string());
        }
        if let Some(theme) = self.theme {
            lines.push(format!("--theme {theme}"));
        }
        if let Some(path) = &self.log_file {
            lines.push(format!("--log-file {}", path.display()));
        }
        lines
    }
}

/// Platform directory the global config lives under, if one is known.
fn platform_config_dir() -> Option<PathBuf> {
    let env_path = |name: &str| std::env::var_os(name).map(PathBuf::from);
    if cfg!(target_os = "windows") {
        env_path("APPDATA")
    } else if cfg!(target_os = "macos") {
        env_path("HOME").map(|home| home.join("Library").join("Application Support"))
    } else {
        env_path("XDG_CONFIG_HOME").or_else(|| env_path("HOME").map(|home| home.join(".config")))
    }
}

/// Location of the user-wide config, falling back to the local file when
/// no home directory can be found.
pub fn global_config_path() -> PathBuf {
    platform_config_dir().map_or_else(local_override_path, |dir| {
        dir.join(APP_DIR).join(CONFIG_FILE)
    })
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_CONFIG_NAME)
}

/// Read the flags stored at `path`. A missing file holds no flags.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ConfigFlags::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read config {}", path.display()));
        }
    };
    let tokens: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    let mut body = String::from("# marksight defaults\n");
    for line in flags.to_lines() {
        body.push_str(&line);
        body.push('\n');
    }
    fs::write(path, body).with_context(|| format!("Failed to write config {}", path.display()))
}

/// Persist `theme` into the config at `path`, keeping its other flags.
pub fn save_theme(path: &Path, theme: ThemeMode) -> Result<()> {
    let flags = ConfigFlags {
        theme: Some(theme),
        ..load_config_flags(path)?
    };
    save_config_flags(path, &flags)
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
            Err(err).with_context(|| format!("Failed to remove {}", path.display()))
        }
        _ => Ok(()),
    }
}

/// Pick the flags this crate persists out of a raw argument list. Both
/// `--flag value` and `--flag=value` are accepted; anything else is skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut rest = tokens.iter();
    while let Some(token) = rest.next() {
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token.as_str(), None),
        };
        match name {
            "--no-watch" if inline.is_none() => flags.no_watch = true,
            "--theme" => {
                if let Some(value) = inline.or_else(|| rest.next().map(String::as_str)) {
                    flags.theme = ThemeMode::parse_strict(value);
                }
            }
            "--log-file" => {
                if let Some(value) = inline.or_else(|| rest.next().map(String::as_str)) {
                    flags.log_file = Some(PathBuf::from(value));
                }
            }
            _ => {}
        }
    }
    flags
}
