//! Installation layout and module search path computation

use std::path::{Path, PathBuf};

use crate::{Error, Signal, StringList};

/// Inputs to the layout computation, all final when the calculator runs
#[derive(Debug, Clone, Copy)]
pub struct PathInput<'a> {
    pub program_name: &'a str,
    pub executable: Option<&'a str>,
    pub home: Option<&'a str>,
    pub prefix: Option<&'a str>,
    pub exec_prefix: Option<&'a str>,
    /// Extra entries from `EMBER_PATH`, searched first
    pub extra_paths: &'a StringList,
}

/// Computed installation layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLayout {
    pub executable: String,
    pub prefix: String,
    pub exec_prefix: String,
    pub module_search_paths: StringList,
}

/// Computes the installation layout.
///
/// The resolver calls this once; a failure is reported, never retried.
pub trait PathCalculator: Send {
    fn calculate(&self, input: &PathInput<'_>) -> Signal<PathLayout>;
}

/// Layout rooted at the directory above the executable's `bin/`:
///
/// ```text
/// <prefix>/bin/ember
/// <prefix>/lib/ember           (pure modules)
/// <exec_prefix>/lib/ember/native (compiled extensions)
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct InstallLayout;

impl InstallLayout {
    fn locate_executable(program_name: &str) -> PathBuf {
        let candidate = Path::new(program_name);
        if candidate.components().count() > 1 {
            return canonical(candidate);
        }
        if let Some(path_var) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&path_var) {
                let full = dir.join(program_name);
                if full.is_file() {
                    return canonical(&full);
                }
            }
        }
        candidate.to_path_buf()
    }
}

impl PathCalculator for InstallLayout {
    fn calculate(&self, input: &PathInput<'_>) -> Signal<PathLayout> {
        let executable = match input.executable {
            Some(executable) => PathBuf::from(executable),
            None => Self::locate_executable(input.program_name),
        };

        let prefix = match input.prefix.or(input.home) {
            Some(prefix) => PathBuf::from(prefix),
            None => executable
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let exec_prefix = match input.exec_prefix.or(input.home) {
            Some(exec_prefix) => PathBuf::from(exec_prefix),
            None => prefix.clone(),
        };

        let mut module_search_paths = StringList::new();
        module_search_paths.extend(input.extra_paths)?;
        module_search_paths.append(&text(&prefix.join("lib").join("ember"))?)?;
        module_search_paths.append(&text(&exec_prefix.join("lib").join("ember").join("native"))?)?;

        Ok(PathLayout {
            executable: text(&executable)?,
            prefix: text(&prefix)?,
            exec_prefix: text(&exec_prefix)?,
            module_search_paths,
        })
    }
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn text(path: &Path) -> Signal<String> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        Error::config("path calculation", format!("path is not valid text: {}", path.display())).into()
    })
}
