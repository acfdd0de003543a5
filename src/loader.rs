use crate::descriptor::ApiDescription;
use crate::error::{Error, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Reads API descriptor files.
///
/// Files ending in `.json` are parsed as JSON, everything else as YAML.
pub struct DescriptorLoader;

impl DescriptorLoader {
    /// Parses a single descriptor file.
    pub fn load_file(path: &Path) -> Result<ApiDescription> {
        debug!("Loading descriptor file: {}", path.display());

        let content = fs::read_to_string(path)?;
        let parse_error = |message: String| Error::ParseError {
            file: path.to_path_buf(),
            message,
        };
        let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
        let description = if is_json {
            serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
        } else if content.trim().is_empty() {
            ApiDescription::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
        };

        debug!("Successfully loaded {}", path.display());
        Ok(description)
    }

    /// Parses and merges several descriptor files in order.
    ///
    /// The first failure aborts the load; a partially merged description is never returned.
    pub fn load_files(paths: &[PathBuf]) -> Result<ApiDescription> {
        let mut merged = ApiDescription::default();
        for path in paths {
            let description = Self::load_file(path)?;
            merged.merge(description).map_err(|e| Error::ParseError {
                file: path.clone(),
                message: e.to_string(),
            })?;
        }
        info!(
            "Loaded {} files: {} views, {} serializers, {} endpoints",
            paths.len(),
            merged.views.len(),
            merged.serializers.len(),
            merged.endpoints.len()
        );
        Ok(merged)
    }
}
