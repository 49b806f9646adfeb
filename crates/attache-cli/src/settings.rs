//! Upload settings: built-in defaults < `attache.toml` < `ATTACHE_*` env vars.

use std::path::Path;

use attache_core::UploadConfig;
use config::{Config, ConfigError, Environment, File};

/// Load the upload configuration.
///
/// `explicit` replaces the optional `attache.toml` lookup in the working
/// directory and must exist. Environment variables use a double underscore
/// for nesting, e.g. `ATTACHE_MAX_FILE_BYTES=1048576`;
/// `ATTACHE_ALLOWED_MIME_TYPES` is a comma-separated list.
pub fn load(explicit: Option<&Path>) -> Result<UploadConfig, ConfigError> {
    let file = match explicit {
        Some(path) => File::from(path).required(true),
        None => File::with_name("attache").required(false),
    };

    Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("ATTACHE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("allowed_mime_types")
                .try_parsing(true)
                .ignore_empty(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("attache-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("attache.toml");
        std::fs::write(&path, "max_file_bytes = 1024\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.max_file_bytes, 1024);
        assert_eq!(config.allowed_mime_types, UploadConfig::default().allowed_mime_types);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/attache.toml"))).is_err());
    }
}
