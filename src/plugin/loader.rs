// Copyright @yucwang 2026

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{ Path, PathBuf };

use libloading::{ Library, Symbol };

#[derive(Debug)]
pub struct LoadAttempt {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug)]
pub enum PluginError {
    /// Both the unanchored and the anchored attempt failed.
    Load { name: String, attempts: Vec<LoadAttempt> },
    Abi { name: String, expected: u32, found: Option<u32> },
    Release { name: String, error: libloading::Error },
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginError::Load { name, attempts } => {
                write!(f, "could not open library {}", name)?;
                for attempt in attempts {
                    write!(f, "\n  {}: {}", attempt.path.display(), attempt.error)?;
                }
                Ok(())
            }
            PluginError::Abi { name, expected, found: Some(found) } =>
                write!(f, "library {} speaks plugin ABI {}, expected {}", name, found, expected),
            PluginError::Abi { name, expected, found: None } =>
                write!(f, "library {} does not export a plugin ABI version (expected {})", name, expected),
            PluginError::Release { name, error } => write!(f, "could not release library {}: {}", name, error),
        }
    }
}

impl std::error::Error for PluginError {}

/// A dynamically loaded library. Dropping it unloads the library, so the
/// handle is released exactly once.
pub struct Plugin {
    name: String,
    path: PathBuf,
    library: Library,
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name).field("path", &self.path).finish()
    }
}

impl Plugin {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up a symbol by name.
    ///
    /// # Safety
    /// `T` must match the actual type of the exported symbol.
    pub unsafe fn symbol<T>(&self, name: &str) -> Option<Symbol<'_, T>> {
        match self.library.get::<T>(name.as_bytes()) {
            Ok(symbol) => Some(symbol),
            Err(e) => {
                log::debug!("symbol {} not found in {}: {}", name, self.name, e);
                None
            }
        }
    }

    pub fn release(self) -> Result<(), PluginError> {
        let name = self.name;
        log::debug!("Releasing library {}.", name);
        self.library.close().map_err(|error| PluginError::Release { name, error })
    }
}

/// Platform file name, e.g. `libfoo.so`, `libfoo.dylib` or `foo.dll`.
pub fn library_file_name(name: &str) -> OsString {
    libloading::library_filename(name)
}

/// Directory containing the running executable.
pub fn library_location() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    exe.parent().map(Path::to_path_buf)
}

#[cfg(unix)]
fn open_library(path: &Path, _anchored: bool) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{ Library as UnixLibrary, RTLD_LAZY, RTLD_LOCAL };
    unsafe { UnixLibrary::open(Some(path), RTLD_LAZY | RTLD_LOCAL).map(Library::from) }
}

#[cfg(windows)]
fn open_library(path: &Path, anchored: bool) -> Result<Library, libloading::Error> {
    use libloading::os::windows::{ Library as WindowsLibrary, LOAD_WITH_ALTERED_SEARCH_PATH };
    // Anchored loads resolve dependent DLLs next to the plugin.
    let flags = if anchored { LOAD_WITH_ALTERED_SEARCH_PATH } else { 0 };
    unsafe { WindowsLibrary::load_with_flags(path, flags).map(Library::from) }
}

fn load_library(name: &str, anchor: Option<&Path>) -> Result<(Library, PathBuf), LoadAttempt> {
    let file_name = library_file_name(name);
    let path = match anchor {
        Some(dir) => dir.join(&file_name),
        None => Path::new(".").join(&file_name),
    };

    match open_library(&path, anchor.is_some()) {
        Ok(library) => Ok((library, path)),
        Err(e) => Err(LoadAttempt { path, error: e.to_string() }),
    }
}

/// Loads `name` relative to the working directory, then relative to the
/// directory of the running executable.
pub fn load_plugin(name: &str) -> Result<Plugin, PluginError> {
    let mut attempts = Vec::new();

    match load_library(name, None) {
        Ok((library, path)) => {
            log::info!("Loaded library {} from {}.", name, path.display());
            return Ok(Plugin { name: name.to_string(), path, library });
        }
        Err(attempt) => {
            log::debug!("unanchored load of {} failed: {}", name, attempt.error);
            attempts.push(attempt);
        }
    }

    match library_location() {
        Some(dir) => match load_library(name, Some(&dir)) {
            Ok((library, path)) => {
                log::info!("Loaded library {} from {}.", name, path.display());
                return Ok(Plugin { name: name.to_string(), path, library });
            }
            Err(attempt) => attempts.push(attempt),
        },
        None => attempts.push(LoadAttempt {
            path: PathBuf::from(library_file_name(name)),
            error: String::from("location of the running executable is unknown"),
        }),
    }

    Err(PluginError::Load { name: name.to_string(), attempts })
}
