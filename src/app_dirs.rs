//! Where the session keeps its files: `<config dir>/.winston_session/`.
//!
//! Set `WINSTON_SESSION_CONFIG_HOME` to move the whole tree, e.g. for a
//! portable install.

use std::{
    fs,
    path::PathBuf,
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;

pub const APP_DIR_NAME: &str = ".winston_session";
pub const CONFIG_HOME_ENV: &str = "WINSTON_SESSION_CONFIG_HOME";
const LOGS_DIR_NAME: &str = "logs";

static BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

#[derive(Debug, thiserror::Error)]
pub enum AppDirError {
    #[error("Could not determine a config directory for session files")]
    NoBaseDir,
    #[error("Could not create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `.winston_session` under the resolved base, created on demand.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = resolve_base().ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(LOGS_DIR_NAME))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}

/// In-process override, then the env var, then the OS config dir.
fn resolve_base() -> Option<PathBuf> {
    let pinned = BASE_OVERRIDE.lock().ok().and_then(|slot| slot.clone());
    pinned
        .or_else(|| std::env::var_os(CONFIG_HOME_ENV).map(PathBuf::from))
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}

#[cfg(test)]
static PIN_SERIAL: Mutex<()> = Mutex::new(());

/// Pins the base directory for unit tests until dropped. One pin at a time.
#[cfg(test)]
pub(crate) struct ConfigBaseGuard {
    _serial: std::sync::MutexGuard<'static, ()>,
}

#[cfg(test)]
impl ConfigBaseGuard {
    pub(crate) fn set(path: &std::path::Path) -> Self {
        let serial = PIN_SERIAL.lock().unwrap_or_else(|err| err.into_inner());
        *BASE_OVERRIDE.lock().unwrap_or_else(|err| err.into_inner()) = Some(path.to_path_buf());
        Self { _serial: serial }
    }
}

#[cfg(test)]
impl Drop for ConfigBaseGuard {
    fn drop(&mut self) {
        *BASE_OVERRIDE.lock().unwrap_or_else(|err| err.into_inner()) = None;
    }
}
