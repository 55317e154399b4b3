use crate::consts::{APP_NAME, LAUNCH_CONFIG_FILENAME};
use std::path::PathBuf;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("USERPROFILE").map(PathBuf::from)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").map(PathBuf::from)
}

/// Returns the directory for configuration files for the application
#[cfg(windows)]
pub fn config_dir() -> Option<PathBuf> {
  std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join(APP_NAME))
}

/// Returns the directory for configuration files for the application
#[cfg(not(windows))]
pub fn config_dir() -> Option<PathBuf> {
  let config_home = std::env::var_os("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .or_else(|| home_dir().map(|h| h.join(".config")))?;
  Some(config_home.join(APP_NAME))
}

/// Path of the user-level default launch config, whether or not it exists.
pub fn launch_config_path() -> Option<PathBuf> {
  config_dir().map(|d| d.join(LAUNCH_CONFIG_FILENAME))
}

#[cfg(test)]
#[cfg(not(windows))]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn xdg_config_home_takes_precedence() {
    temp_env::with_vars(
      [
        ("XDG_CONFIG_HOME", Some("/custom/config")),
        ("HOME", Some("/home/user")),
      ],
      || {
        assert_eq!(config_dir(), Some(PathBuf::from("/custom/config").join(APP_NAME)));
      },
    );
  }

  #[test]
  #[serial]
  fn falls_back_to_home_config() {
    temp_env::with_vars(
      [("XDG_CONFIG_HOME", None::<&str>), ("HOME", Some("/home/user"))],
      || {
        assert_eq!(
          launch_config_path(),
          Some(PathBuf::from("/home/user/.config/mlaunch/launch-config.yaml"))
        );
      },
    );
  }

  #[test]
  #[serial]
  fn no_home_means_no_config_dir() {
    temp_env::with_vars([("XDG_CONFIG_HOME", None::<&str>), ("HOME", None::<&str>)], || {
      assert_eq!(config_dir(), None);
    });
  }
}
