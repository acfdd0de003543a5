//! Generator-wide configuration.
//!
//! Settings are read once (from YAML or JSON) before generation starts and passed by
//! reference to every stage. Missing keys fall back to the defaults below.

use crate::descriptor::ContentHandlerDef;
use crate::error::{Error, Result};
use crate::openapi::{Info, SecurityDefinition, SecurityRequirement};
use clap::ValueEnum;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Target document dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Swagger 2.0
    #[default]
    Swagger2,
    /// OpenAPI 3.0
    Openapi3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Field inspectors probed for every field, in priority order
    pub field_inspectors: Vec<String>,
    pub filter_inspectors: Vec<String>,
    pub paginator_inspectors: Vec<String>,
    /// Info used when neither the descriptor nor the command line provides one
    pub default_info: Option<Info>,
    /// Absolute API URL, the source of `host` and `schemes`
    pub default_api_url: Option<String>,
    /// Mount point of the application, prepended to `basePath`
    pub script_prefix: String,
    pub security_definitions: IndexMap<String, SecurityDefinition>,
    /// Global security; defaults to every definition with no scopes
    pub security_requirements: Option<Vec<SecurityRequirement>>,
    /// Parsers of views that do not declare their own
    pub default_parser_classes: Vec<ContentHandlerDef>,
    /// Renderers of views that do not declare their own
    pub default_renderer_classes: Vec<ContentHandlerDef>,
    /// Render decimal fields as strings
    pub coerce_decimal_to_string: bool,
    /// File fields are rendered as URLs
    pub uploaded_files_use_url: bool,
    pub dialect: Dialect,
}

pub const DEFAULT_FIELD_INSPECTORS: &[&str] = &[
    "CamelCaseJSONFilter",
    "RecursiveFieldInspector",
    "ReferencingSerializerInspector",
    "RelatedFieldInspector",
    "ChoiceFieldInspector",
    "FileFieldInspector",
    "DictFieldInspector",
    "JSONFieldInspector",
    "HiddenFieldInspector",
    "SerializerMethodFieldInspector",
    "SimpleFieldInspector",
    "StringDefaultFieldInspector",
];

pub const DEFAULT_FILTER_INSPECTORS: &[&str] = &["CoreAPICompatInspector"];

pub const DEFAULT_PAGINATOR_INSPECTORS: &[&str] =
    &["DjangoRestResponsePagination", "CoreAPICompatInspector"];

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        let mut security_definitions = IndexMap::new();
        security_definitions.insert("basic".to_string(), SecurityDefinition::basic());
        Self {
            field_inspectors: names(DEFAULT_FIELD_INSPECTORS),
            filter_inspectors: names(DEFAULT_FILTER_INSPECTORS),
            paginator_inspectors: names(DEFAULT_PAGINATOR_INSPECTORS),
            default_info: None,
            default_api_url: None,
            script_prefix: "/".to_string(),
            security_definitions,
            security_requirements: None,
            default_parser_classes: vec![
                ContentHandlerDef::new("JSONParser", "application/json"),
                ContentHandlerDef::new("FormParser", "application/x-www-form-urlencoded"),
                ContentHandlerDef::new("MultiPartParser", "multipart/form-data"),
            ],
            default_renderer_classes: vec![
                ContentHandlerDef::new("JSONRenderer", "application/json"),
                ContentHandlerDef::new("BrowsableAPIRenderer", "text/html"),
            ],
            coerce_decimal_to_string: true,
            uploaded_files_use_url: true,
            dialect: Dialect::Swagger2,
        }
    }
}

impl GeneratorSettings {
    /// Load settings from a YAML or JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from {}", path.display());
        let content = fs::read_to_string(path)?;
        let parse_error = |message: String| Error::ParseError {
            file: path.to_path_buf(),
            message,
        };
        let settings: GeneratorSettings =
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            } else {
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.field_inspectors.is_empty() {
            return Err(Error::configuration("field_inspectors cannot be empty"));
        }
        for definition in self.security_definitions.values() {
            definition.validate()?;
        }
        if let Some(info) = &self.default_info {
            info.validate()?;
        }
        Ok(())
    }

    /// The effective global security requirements.
    pub fn security(&self) -> Option<Vec<SecurityRequirement>> {
        if let Some(requirements) = &self.security_requirements {
            return Some(requirements.clone());
        }
        if self.security_definitions.is_empty() {
            return None;
        }
        let requirement: SecurityRequirement = self
            .security_definitions
            .keys()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        Some(vec![requirement])
    }
}
