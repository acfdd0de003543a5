//! Rendering of generated documents as YAML or JSON.

use crate::generator::Document;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a document to YAML.
///
/// Keys keep the order in which the document declares them, so `swagger`/`openapi` and
/// `info` come first.
pub fn serialize_yaml(doc: &Document) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize document to YAML")
}

/// Serializes a document to pretty-printed JSON.
pub fn serialize_json(doc: &Document) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize document to JSON")
}

/// Writes string content to a file, creating missing parent directories.
///
/// An existing file is overwritten.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ApiDescription;
    use crate::generator::OpenApiSchemaGenerator;
    use crate::settings::{Dialect, GeneratorSettings};
    use tempfile::TempDir;

    const API: &str = r#"
info: {title: Test API, version: 1.0.0, description: A test API}
serializers:
  - name: UserSerializer
    fields:
      id: {type: integer, read_only: true}
      name: {type: char}
views:
  - name: UserList
    actions: {get: list}
    serializer: UserSerializer
endpoints:
  - {path: /users/, method: get, view: UserList}
"#;

    fn create_test_document(dialect: Dialect) -> Document {
        let api: ApiDescription = serde_yaml::from_str(API).unwrap();
        let settings = GeneratorSettings {
            dialect,
            ..GeneratorSettings::default()
        };
        OpenApiSchemaGenerator::new(&api, &settings)
            .unwrap()
            .get_schema(None, false)
            .unwrap()
    }

    #[test]
    fn test_serialize_yaml() {
        let doc = create_test_document(Dialect::Swagger2);
        let yaml = serialize_yaml(&doc).unwrap();

        assert!(yaml.starts_with("swagger:"));
        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("description: A test API"));
        assert!(yaml.contains("/users/:"));
        assert!(yaml.contains("operationId: users_list"));
        assert!(yaml.contains("#/definitions/User"));
    }

    #[test]
    fn test_serialize_json() {
        let doc = create_test_document(Dialect::Openapi3);
        let json = serialize_json(&doc).unwrap();

        // pretty printed
        assert!(json.lines().count() > 5);
        assert!(json.contains("  \"openapi\""));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["info"]["title"], "Test API");
        assert!(parsed["components"]["schemas"]["User"].is_object());
        assert!(parsed.get("definitions").is_none());
    }

    #[test]
    fn test_yaml_and_json_describe_the_same_document() {
        let doc = create_test_document(Dialect::Swagger2);
        let from_yaml: serde_json::Value =
            serde_yaml::from_str(&serialize_yaml(&doc).unwrap()).unwrap();
        let from_json: serde_json::Value =
            serde_json::from_str(&serialize_json(&doc).unwrap()).unwrap();
        assert_eq!(from_yaml, from_json);
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("swagger.yaml");

        write_to_file("first", &file_path).unwrap();
        write_to_file("second", &file_path).unwrap();

        let read_content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(read_content, "second");
    }
}
