use std::path::PathBuf;

use tracing::debug;

use super::error::{ConfigError, ConfigResult};

/// Environment variable pointing at an explicit config file.
pub static CONFIG_ENV: &str = "CURSUS_CONFIG";

pub fn find_config_file(use_local: bool) -> PathBuf {
    let app_name = crate::APPLICATION_NAME;

    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(explicit);
    }

    if use_local {
        return PathBuf::from("./config.toml");
    }

    #[cfg(unix)]
    let path = std::env::var_os("HOME");
    #[cfg(windows)]
    let path = std::env::var_os("APPDATA");

    #[cfg(any(unix, windows))]
    if let Some(app_path) = path {
        let mut path = PathBuf::from(app_path);

        if cfg!(unix) {
            path = path.join(".config");
        }

        path = path.join(app_name).join("config.toml");

        if path.exists() {
            return path;
        }
    }

    PathBuf::from("./config.toml")
}

pub fn read_config(use_local: bool) -> ConfigResult<Vec<u8>> {
    let filename = find_config_file(use_local);

    tracing::trace!("looking for config at: {}", filename.display());
    if !filename.exists() {
        return Err(ConfigError::ConfigNotFound);
    }

    let filename = filename.canonicalize()?;
    debug!("using {} as configuration file", filename.display());

    Ok(std::fs::read(filename)?)
}

#[cfg(test)]
mod test {
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_find_config_file_local() {
        if env::var_os(CONFIG_ENV).is_some() {
            return;
        }
        let path = find_config_file(true);
        assert_eq!(path, PathBuf::from("./config.toml"));
    }

    #[test]
    fn test_find_config_file_unix_home() {
        if env::var_os(CONFIG_ENV).is_some() {
            return;
        }
        let temp_dir = tempfile::tempdir().unwrap();
        let fake_config = temp_dir
            .path()
            .join(".config")
            .join(crate::APPLICATION_NAME);
        fs::create_dir_all(&fake_config).unwrap();
        let config_file = fake_config.join("config.toml");
        fs::write(&config_file, "dummy = true").unwrap();

        #[cfg(unix)]
        unsafe {
            env::set_var("HOME", temp_dir.path());
        }

        #[cfg(windows)]
        unsafe {
            env::set_var("APPDATA", temp_dir.path());
        }

        let path = find_config_file(false);
        assert_eq!(path, config_file);
    }

    #[test]
    fn test_read_config_explicit_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(matches!(
            crate::Config::from_path(&missing),
            Err(ConfigError::IoError(_))
        ));

        let present = temp_dir.path().join("config.toml");
        let toml = "[backend]\nbase_url = \"http://x/\"\n[player]\nuser_id = 3\n";
        fs::write(&present, toml).unwrap();
        let config = crate::Config::from_path(&present).unwrap();
        assert_eq!(config.player().user_id(), 3);
    }
}
