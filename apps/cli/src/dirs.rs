use std::path::PathBuf;

const APP_DIR_NAME: &str = "lte-tracker";

/// `$XDG_DATA_HOME/lte-tracker`, else `~/.local/share/lte-tracker`, else a
/// directory next to the working directory.
pub fn default_data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("XDG_DATA_HOME").filter(|value| !value.is_empty()) {
        return PathBuf::from(path).join(APP_DIR_NAME);
    }
    if let Some(home) = std::env::var_os("HOME").filter(|value| !value.is_empty()) {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR_NAME);
    }
    PathBuf::from(".").join(APP_DIR_NAME)
}
