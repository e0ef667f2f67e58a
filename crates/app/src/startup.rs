use std::path::PathBuf;

use tracker_store::DEFAULT_STATE_FILE_NAME;

use crate::Result;
use crate::config::TrackerConfig;

#[derive(Clone, Debug)]
pub struct AppPaths {
    pub app_data_dir: PathBuf,
    pub state_path: PathBuf,
}

impl AppPaths {
    pub fn new(app_data_dir: PathBuf) -> Self {
        let state_path = app_data_dir.join(DEFAULT_STATE_FILE_NAME);
        Self {
            app_data_dir,
            state_path,
        }
    }

    /// Paths for `config`, with the configured state file taking precedence
    /// over the default one in `app_data_dir`.
    pub fn for_config(config: &TrackerConfig, default_data_dir: PathBuf) -> Self {
        let app_data_dir = config.data_dir.clone().unwrap_or(default_data_dir);
        let mut paths = Self::new(app_data_dir);
        if let Some(state_file) = &config.state_file {
            paths.state_path = if state_file.is_absolute() {
                state_file.clone()
            } else {
                paths.app_data_dir.join(state_file)
            };
        }
        paths
    }
}

pub fn ensure_app_data_dir(paths: &AppPaths) -> Result<()> {
    std::fs::create_dir_all(&paths.app_data_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_file_lives_in_data_dir() {
        let paths = AppPaths::new(PathBuf::from("/data/lte"));
        assert_eq!(paths.state_path, PathBuf::from("/data/lte/lte_usage_data.json"));
    }

    fn config_with(extra: &str) -> TrackerConfig {
        let contents = format!(
            "controller = \"unifi.lan\"\nusername = \"admin\"\npassword = \"pw\"\n\
             device_mac = \"ac:8b:a9:83:f3:1f\"\nbilling_day = 1\n{extra}"
        );
        TrackerConfig::from_builder(config::Config::builder().add_source(config::File::from_str(
            &contents,
            config::FileFormat::Toml,
        )))
        .expect("config")
    }

    #[test]
    fn configured_data_dir_overrides_default() {
        let config = config_with("data_dir = \"/srv/lte\"\n");
        let paths = AppPaths::for_config(&config, PathBuf::from("/home/me/.local/share/lte"));
        assert_eq!(paths.app_data_dir, PathBuf::from("/srv/lte"));
        assert_eq!(paths.state_path, PathBuf::from("/srv/lte/lte_usage_data.json"));
    }

    #[test]
    fn relative_state_file_joins_data_dir() {
        let config = config_with("state_file = \"usage.json\"\n");
        let paths = AppPaths::for_config(&config, PathBuf::from("/data"));
        assert_eq!(paths.state_path, PathBuf::from("/data/usage.json"));

        let config = config_with("state_file = \"/var/lib/usage.json\"\n");
        let paths = AppPaths::for_config(&config, PathBuf::from("/data"));
        assert_eq!(paths.state_path, PathBuf::from("/var/lib/usage.json"));
    }

    #[test]
    fn ensure_app_data_dir_creates_nested_dirs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = AppPaths::new(dir.path().join("a/b"));
        ensure_app_data_dir(&paths).expect("create");
        assert!(paths.app_data_dir.is_dir());
    }
}
