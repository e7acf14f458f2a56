//! Settings parser for .hfw/config.toml

use std::path::Path;

use hfw_core::prelude::*;

use super::types::ShellSettings;

const CONFIG_FILENAME: &str = "config.toml";
const HFW_DIR: &str = ".hfw";

/// Load settings from `<root>/.hfw/config.toml`.
///
/// A missing or unparsable file yields defaults.
pub fn load_settings(root: &Path) -> ShellSettings {
    let config_path = root.join(HFW_DIR).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return ShellSettings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                ShellSettings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            ShellSettings::default()
        }
    }
}

/// Write settings to `<root>/.hfw/config.toml`, creating the directory.
pub fn save_settings(root: &Path, settings: &ShellSettings) -> Result<()> {
    let hfw_dir = root.join(HFW_DIR);

    if !hfw_dir.exists() {
        std::fs::create_dir_all(&hfw_dir)
            .map_err(|e| Error::config(format!("Failed to create .hfw dir: {}", e)))?;
    }

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;

    // Temp file, then rename over the old config
    let config_path = hfw_dir.join(CONFIG_FILENAME);
    let temp_path = hfw_dir.join(format!("{CONFIG_FILENAME}.tmp"));
    std::fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write {:?}", temp_path))?;
    std::fs::rename(&temp_path, &config_path)
        .with_context(|| format!("Failed to replace {:?}", config_path))?;

    debug!("Saved settings to {:?}", config_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_missing_file() {
        let temp = tempdir().unwrap();
        assert_eq!(load_settings(temp.path()), ShellSettings::default());
    }

    #[test]
    fn test_load_settings_invalid_toml_falls_back() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".hfw");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[layout\nbroken").unwrap();

        assert_eq!(load_settings(temp.path()), ShellSettings::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp = tempdir().unwrap();
        let mut settings = ShellSettings::default();
        settings.layout.large_screen_min_width = 1440;
        settings.session.auth_cookie_name = "sso".to_string();

        save_settings(temp.path(), &settings).unwrap();

        assert!(temp.path().join(".hfw/config.toml").exists());
        assert!(!temp.path().join(".hfw/config.toml.tmp").exists());
        assert_eq!(load_settings(temp.path()), settings);
    }
}
