//! # Executable Locator
//!
//! Finds the external tools the pipeline drives (`protoc`, `curl`).
//!
//! A locator is created once per process and handed by reference to whoever needs an
//! executable. Each name is looked up on `PATH` at most once; later lookups are served
//! from the locator's cache.
use std::{
    cell::RefCell,
    collections::HashMap,
    env::consts::EXE_SUFFIX,
    ffi::OsString,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Directory, next to the running executable, holding a bundled `bin/protoc` and its
/// `include/` directory of well-known types.
pub const BUNDLE_DIR_NAME: &str = "protocurl-internal";

#[derive(Debug, thiserror::Error)]
#[error("I could not find a '{name}' executable. Please check your PATH: '{source}'")]
pub struct LocateError {
    pub name: String,
    #[source]
    source: which::Error,
}

#[derive(Debug, Default)]
pub struct ExecutableLocator {
    found: RefCell<HashMap<String, PathBuf>>,
}

impl ExecutableLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `name` on `PATH`, failing if it cannot be found.
    pub fn find(&self, name: &str) -> Result<PathBuf, LocateError> {
        if let Some(path) = self.found.borrow().get(name) {
            return Ok(path.clone());
        }

        let path = which::which(name).map_err(|source| LocateError {
            name: name.to_string(),
            source,
        })?;

        debug!("Found {name}: {}", path.display());

        self.found
            .borrow_mut()
            .insert(name.to_string(), path.clone());

        Ok(path)
    }

    /// Like [`ExecutableLocator::find`], but a missing executable is not an error.
    pub fn probe(&self, name: &str) -> Option<PathBuf> {
        match self.find(name) {
            Ok(path) => Some(path),
            Err(err) => {
                debug!("Did not find executable {name}: {err}");
                None
            }
        }
    }

    /// Turns a user-given executable path into one the OS can run, appending the
    /// platform's executable suffix (`.exe` on Windows) when it is missing.
    pub fn custom(path: &Path) -> PathBuf {
        if EXE_SUFFIX.is_empty() || path.to_string_lossy().ends_with(EXE_SUFFIX) {
            return path.to_path_buf();
        }

        let mut with_suffix = OsString::from(path.as_os_str());
        with_suffix.push(EXE_SUFFIX);
        let with_suffix = PathBuf::from(with_suffix);
        debug!("Path after os extension ({EXE_SUFFIX}): {}", with_suffix.display());
        with_suffix
    }

    /// The [`BUNDLE_DIR_NAME`] directory next to the running executable, if there is one.
    pub fn bundled_dir(&self) -> Option<PathBuf> {
        let executable = std::env::current_exe().ok()?.canonicalize().ok()?;
        let dir = executable.parent()?.join(BUNDLE_DIR_NAME);
        dir.is_dir().then_some(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_is_an_error() {
        let locator = ExecutableLocator::new();
        let err = locator
            .find("protocurl-surely-missing-executable")
            .unwrap_err();

        assert_eq!(err.name, "protocurl-surely-missing-executable");
        assert!(
            locator
                .probe("protocurl-surely-missing-executable")
                .is_none()
        );
    }

    #[test]
    fn found_executables_are_cached() {
        let locator = ExecutableLocator::new();
        locator
            .found
            .borrow_mut()
            .insert("fake-tool".to_string(), PathBuf::from("/opt/fake-tool"));

        assert_eq!(
            locator.find("fake-tool").unwrap(),
            PathBuf::from("/opt/fake-tool")
        );
    }

    #[cfg(unix)]
    #[test]
    fn custom_paths_are_kept_as_is_on_unix() {
        let path = Path::new("/usr/local/bin/protoc");
        assert_eq!(ExecutableLocator::custom(path), path);
    }
}
