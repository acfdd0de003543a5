use anyhow::{Context, Result};
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Extensions of descriptor files
const DESCRIPTOR_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// File scanner for collecting descriptor files from a directory tree.
///
/// The `FileScanner` recursively walks a directory and collects every YAML or JSON file.
/// It skips `target` and hidden directories (those starting with `.`).
///
/// # Example
///
/// ```no_run
/// use openapi_inspect::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./api"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} descriptor files", result.descriptor_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of a directory scan.
pub struct ScanResult {
    /// Paths of all discovered descriptor files, sorted
    pub descriptor_files: Vec<PathBuf>,
    /// Warning messages for inaccessible entries
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all descriptor files.
    ///
    /// Entries that cannot be accessed are logged and reported in the result, and scanning
    /// continues. Files are returned in path order so merges are deterministic.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut descriptor_files = Vec::new();
        let mut warnings = Vec::new();

        std::fs::metadata(&self.root_path)
            .with_context(|| format!("Failed to access {}", self.root_path.display()))?;

        for entry in WalkDir::new(&self.root_path).into_iter().filter_entry(|e| {
            if e.path() == self.root_path {
                return true;
            }
            let file_name = e.file_name().to_string_lossy();
            !file_name.starts_with('.') && file_name != "target"
        }) {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let is_descriptor = path
                        .extension()
                        .and_then(|s| s.to_str())
                        .map_or(false, |ext| DESCRIPTOR_EXTENSIONS.contains(&ext));
                    if path.is_file() && is_descriptor {
                        descriptor_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        descriptor_files.sort();
        Ok(ScanResult {
            descriptor_files,
            warnings,
        })
    }
}
