use std::path::{Path, PathBuf};

use super::types::{AppConfig, CacheProvider, TagsProvider};

/// Get the default clipseek data directory: ~/.clipseek
pub fn get_clipseek_data_dir() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".clipseek"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.clipseek/config.toml (highest)
    let data_dir = get_clipseek_data_dir()?;
    let home_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg = if home_config.exists() {
        load_from_path(&home_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg);
    resolve_default_paths(&mut cfg, &data_dir);
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<AppConfig>(&s)?)
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    // Environment variable overrides (Priority 0: highest)
    if let Ok(v) = std::env::var("CLIPSEEK_TENANT") {
        if !v.trim().is_empty() {
            cfg.tenant = v.trim().to_string();
        }
    }
    if let Ok(v) = std::env::var("CLIPSEEK_DATA_DIR") {
        if !v.trim().is_empty() {
            cfg.source.data_dir = v;
        }
    }
    if let Ok(v) = std::env::var("CLIPSEEK_CACHE_DIR") {
        if !v.trim().is_empty() {
            if let CacheProvider::Fs(ref mut fs_cfg) = cfg.cache.provider {
                fs_cfg.directory = v;
            }
        }
    }
}

/// Fill empty backend paths with locations under the data directory.
fn resolve_default_paths(cfg: &mut AppConfig, data_dir: &Path) {
    if let CacheProvider::Fs(ref mut fs_cfg) = cfg.cache.provider {
        if fs_cfg.directory.trim().is_empty() {
            fs_cfg.directory = data_dir.join("cache").to_string_lossy().to_string();
        }
    }
    if let TagsProvider::File(ref mut file_cfg) = cfg.tags.provider {
        if file_cfg.path.trim().is_empty() {
            file_cfg.path = data_dir.join("tags.json").to_string_lossy().to_string();
        }
    }
    if cfg
        .logging
        .directory
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
    }
}
