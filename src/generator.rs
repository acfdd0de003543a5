//! Document generation: walks every endpoint of a description and folds the resulting
//! operations into a single Swagger 2.0 or OpenAPI 3.0 document.

use crate::descriptor::{ApiDescription, HttpMethod, ModelFieldKind, ViewDef};
use crate::error::{Error, Result};
use crate::inspectors::field::model_type_info;
use crate::inspectors::view::{consumes_of, is_list_view, produces_of};
use crate::inspectors::SwaggerAutoSchema;
use crate::openapi::{
    check_references, Component, Info, Operation, Parameter, ParameterLocation, PathItem, Paths,
    ReferenceResolver, SchemaType, Swagger, SwaggerAttrs, SwaggerParts,
};
use crate::openapi3::{self, OpenApi};
use crate::settings::{Dialect, GeneratorSettings};
use crate::type_resolver::TypeResolver;
use indexmap::IndexMap;
use log::{debug, info};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

/// A finished document of either dialect
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    Swagger(Box<Swagger>),
    OpenApi(Box<OpenApi>),
}

impl Document {
    pub fn dialect(&self) -> Dialect {
        match self {
            Document::Swagger(_) => Dialect::Swagger2,
            Document::OpenApi(_) => Dialect::Openapi3,
        }
    }
}

/// Who the document is generated for.
///
/// Views requiring a permission outside `permissions` are left out of non-public
/// documents. Without a request every view is visible.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub permissions: HashSet<String>,
}

impl GenerationRequest {
    pub fn with_permissions<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Generates one document per call from a parsed API description.
pub struct OpenApiSchemaGenerator<'a> {
    api: &'a ApiDescription,
    catalog: TypeResolver,
    settings: &'a GeneratorSettings,
    info: Option<Info>,
    url: Option<String>,
    version: Option<String>,
}

impl<'a> OpenApiSchemaGenerator<'a> {
    pub fn new(api: &'a ApiDescription, settings: &'a GeneratorSettings) -> Result<Self> {
        settings.validate()?;
        for endpoint in &api.endpoints {
            if !endpoint.path.starts_with('/') {
                return Err(Error::configuration(format!(
                    "endpoint path {:?} of view {} must start with '/'",
                    endpoint.path, endpoint.view
                )));
            }
        }
        Ok(Self {
            api,
            catalog: TypeResolver::new(api)?,
            settings,
            info: None,
            url: None,
            version: None,
        })
    }

    /// Use `info` instead of the one declared by the description or the settings.
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = Some(info);
        self
    }

    /// Absolute API URL; its host and scheme end up in the document.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Replace `info.version` in the generated document.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Generate the document in the dialect chosen by the settings.
    ///
    /// Any failure aborts the whole pass; a partial document is never returned.
    pub fn get_schema(
        &self,
        request: Option<&GenerationRequest>,
        public: bool,
    ) -> Result<Document> {
        let swagger = self.get_swagger(request, public)?;
        match self.settings.dialect {
            Dialect::Swagger2 => Ok(Document::Swagger(Box::new(swagger))),
            Dialect::Openapi3 => Ok(Document::OpenApi(Box::new(openapi3::lift(swagger)?))),
        }
    }

    /// Generate the Swagger 2.0 document.
    pub fn get_swagger(
        &self,
        request: Option<&GenerationRequest>,
        public: bool,
    ) -> Result<Swagger> {
        let endpoints = self.get_endpoints()?;
        let mut components = ReferenceResolver::swagger();
        let consumes = consumes_of(&self.settings.default_parser_classes);
        let produces = produces_of(&self.settings.default_renderer_classes);

        let (paths, prefix) =
            self.get_paths(&endpoints, &mut components, request, public, &consumes, &produces)?;
        info!(
            "Generated {} paths with prefix {}",
            paths.len(),
            if prefix.is_empty() { "/" } else { prefix.as_str() }
        );

        let security_definitions = self.settings.security_definitions.clone();
        let security = if security_definitions.is_empty() {
            None
        } else {
            self.settings.security()
        };

        let swagger = Swagger::new(SwaggerParts {
            info: self.get_info()?,
            url: self.url.clone().or_else(|| self.settings.default_api_url.clone()),
            prefix,
            script_prefix: self.settings.script_prefix.clone(),
            version: self.version.clone(),
            consumes,
            produces,
            security_definitions,
            security,
            paths,
            components,
        })?;
        check_references(&serde_json::to_value(&swagger)?)?;
        Ok(swagger)
    }

    fn get_info(&self) -> Result<Info> {
        self.info
            .clone()
            .or_else(|| self.api.info.clone())
            .or_else(|| self.settings.default_info.clone())
            .ok_or_else(|| {
                Error::configuration(
                    "no info given; declare it in the description, the settings or on the command line",
                )
            })
    }

    /// Endpoints grouped by path, sorted by path.
    fn get_endpoints(&self) -> Result<Vec<(&'a str, Vec<(HttpMethod, &ViewDef)>)>> {
        let mut grouped: IndexMap<&'a str, Vec<(HttpMethod, &ViewDef)>> = IndexMap::new();
        for endpoint in &self.api.endpoints {
            let view = self.catalog.view(&endpoint.view)?;
            if view.exclude_from_schema {
                debug!("{} is excluded from the schema", view.name);
                continue;
            }
            if matches!(endpoint.method, HttpMethod::Head | HttpMethod::Options) {
                continue;
            }
            grouped
                .entry(endpoint.path.as_str())
                .or_default()
                .push((endpoint.method, view));
        }
        let mut endpoints: Vec<_> = grouped.into_iter().collect();
        endpoints.sort_by(|a, b| a.0.cmp(b.0));
        Ok(endpoints)
    }

    fn get_paths(
        &self,
        endpoints: &[(&'a str, Vec<(HttpMethod, &ViewDef)>)],
        components: &mut ReferenceResolver<Component>,
        request: Option<&GenerationRequest>,
        public: bool,
        consumes: &[String],
        produces: &[String],
    ) -> Result<(Paths, String)> {
        let mut paths = Paths::new();
        if endpoints.is_empty() {
            return Ok((paths, String::new()));
        }
        let all_paths: Vec<&str> = endpoints.iter().map(|(path, _)| *path).collect();
        let prefix = determine_path_prefix(&all_paths);
        if prefix.contains('{') {
            return Err(Error::generation("base path cannot be templated in swagger 2.0"));
        }

        for (path, methods) in endpoints {
            let mut item = PathItem::new();
            let mut has_operations = false;
            for (method, view) in methods {
                if !should_include_endpoint(view, request, public) {
                    debug!("Skipping {} {}: missing permissions", method, path);
                    continue;
                }
                let mut operation =
                    self.get_operation(view, path, &prefix, *method, components)?;
                if same_media_types(operation.consumes.as_deref(), consumes) {
                    operation.consumes = None;
                }
                if same_media_types(operation.produces.as_deref(), produces) {
                    operation.produces = None;
                }
                item.set_operation(*method, operation)?;
                has_operations = true;
            }
            if !has_operations {
                continue;
            }
            // the view of the first method types the path parameters
            if let Some((_, view)) = methods.first() {
                item.parameters = self.get_path_parameters(path, view)?;
            }
            paths.insert(strip_path_prefix(path, &prefix)?.to_string(), item)?;
        }
        Ok((paths, prefix))
    }

    fn get_operation(
        &self,
        view: &ViewDef,
        path: &str,
        prefix: &str,
        method: HttpMethod,
        components: &mut ReferenceResolver<Component>,
    ) -> Result<Operation> {
        let subpath = strip_path_prefix(path, prefix)?;
        let keys = get_operation_keys(subpath, method, view);
        let mut inspector = SwaggerAutoSchema::new(
            view,
            path,
            method,
            components,
            &self.catalog,
            self.settings,
        )?;
        inspector.get_operation(&keys)
    }

    /// One required path parameter per `{variable}` of `path`, typed through the view's
    /// model when possible.
    fn get_path_parameters(&self, path: &str, view: &ViewDef) -> Result<Vec<Parameter>> {
        let model = view
            .model
            .as_deref()
            .or_else(|| {
                view.serializer
                    .as_deref()
                    .and_then(|name| self.catalog.find_serializer(name))
                    .and_then(|serializer| serializer.model.as_deref())
            })
            .and_then(|name| self.catalog.find_model(name));

        let mut parameters = Vec::new();
        for variable in path_variables(path) {
            let field = model.and_then(|model| self.catalog.model_field(model, &variable));
            let target = field.and_then(|f| self.catalog.relation_target(f.model, &variable));
            let mut attrs = target
                .and_then(|target| model_type_info(target.field, self.settings))
                .unwrap_or_else(|| SwaggerAttrs::of_type(SchemaType::String));
            if view.lookup_field == variable && attrs.type_ == Some(SchemaType::String) {
                if let Some(regex) = &view.lookup_value_regex {
                    attrs.pattern = Some(regex.clone());
                }
            }
            attrs.description = field.and_then(|f| {
                f.field
                    .help_text
                    .clone()
                    .filter(|text| !text.is_empty())
                    .or_else(|| f.primary_key.then(|| pk_description(f.model.verbose_name(), f.field.kind)))
            });
            attrs.required = Some(true);
            parameters.push(Parameter::new(
                attrs.with_location(variable, ParameterLocation::Path),
            )?);
        }
        Ok(parameters)
    }
}

fn should_include_endpoint(
    view: &ViewDef,
    request: Option<&GenerationRequest>,
    public: bool,
) -> bool {
    if public {
        return true;
    }
    match request {
        Some(request) => view
            .required_permissions
            .iter()
            .all(|permission| request.permissions.contains(permission)),
        None => true,
    }
}

fn same_media_types(operation: Option<&[String]>, global: &[String]) -> bool {
    match operation {
        Some(types) => {
            let ours: HashSet<&String> = types.iter().collect();
            ours == global.iter().collect()
        }
        None => false,
    }
}

fn pk_description(verbose_name: String, kind: ModelFieldKind) -> String {
    let value_type = match kind {
        ModelFieldKind::Auto | ModelFieldKind::BigAuto => "unique integer value",
        ModelFieldKind::Uuid => "UUID string",
        _ => "unique value",
    };
    format!("A {} identifying this {}.", value_type, verbose_name)
}

/// Sorted, deduplicated template variables of `path`.
pub fn path_variables(path: &str) -> BTreeSet<String> {
    static VARIABLE: OnceLock<Regex> = OnceLock::new();
    let variable = VARIABLE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("variable regex is valid"));
    variable
        .captures_iter(path)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// The longest shared run of leading literal path segments, ignoring the last literal
/// segment of each path. `/` when any path has no such prefix.
pub fn determine_path_prefix(paths: &[&str]) -> String {
    let mut prefixes: Vec<Vec<&str>> = Vec::new();
    for path in paths {
        let initial: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .take_while(|component| !component.contains('{'))
            .collect();
        if initial.len() <= 1 || initial[..initial.len() - 1].iter().all(|c| c.is_empty()) {
            return "/".to_string();
        }
        prefixes.push(initial[..initial.len() - 1].to_vec());
    }
    let (Some(first), Some(last)) = (prefixes.iter().min(), prefixes.iter().max()) else {
        return "/".to_string();
    };
    let common: Vec<&str> = first
        .iter()
        .zip(last.iter())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| *a)
        .collect();
    format!("/{}", common.join("/"))
}

/// `path` relative to the base path `prefix`, keeping its leading `/`.
fn strip_path_prefix<'p>(path: &'p str, prefix: &str) -> Result<&'p str> {
    let base = prefix.trim_end_matches('/');
    path.strip_prefix(base)
        .filter(|rest| rest.starts_with('/'))
        .ok_or_else(|| Error::generation(format!("path {} is outside the base path {}", path, prefix)))
}

const DEFAULT_ACTIONS: &[&str] = &[
    "retrieve",
    "list",
    "create",
    "update",
    "partial_update",
    "destroy",
];

fn default_mapping(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "retrieve",
        HttpMethod::Post => "create",
        HttpMethod::Put => "update",
        HttpMethod::Patch => "partial_update",
        HttpMethod::Delete => "destroy",
        other => other.as_str(),
    }
}

fn coerce(action: &str) -> &str {
    match action {
        "retrieve" => "read",
        "destroy" => "delete",
        other => other,
    }
}

/// The key path identifying an operation: named segments of `subpath` followed by the
/// action, e.g. `["users", "read"]` for `GET /users/{pk}/`.
pub fn get_operation_keys(subpath: &str, method: HttpMethod, view: &ViewDef) -> Vec<String> {
    let action = match view.action(method) {
        Some(action) => action,
        None if is_list_view(subpath, method, view) && method == HttpMethod::Get => "list",
        None => default_mapping(method),
    };
    let named: Vec<String> = subpath
        .trim_matches('/')
        .split('/')
        .filter(|component| !component.is_empty() && !component.contains('{'))
        .map(str::to_string)
        .collect();

    if !DEFAULT_ACTIONS.contains(&action) {
        if view.actions.len() > 1 {
            let mut keys = named;
            keys.push(coerce(default_mapping(method)).to_string());
            return keys;
        }
        let mut keys = named;
        keys.pop();
        keys.push(action.to_string());
        return keys;
    }
    let mut keys = named;
    keys.push(coerce(action).to_string());
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const API: &str = r#"
info: {title: Snippets API, version: v1}
models:
  - name: Snippet
    fields:
      id: {kind: auto}
      code: {kind: text}
  - name: Tag
    pk: slug
    fields:
      slug: {kind: slug, help_text: Short unique label}
serializers:
  - name: SnippetSerializer
    model: Snippet
    fields:
      id: {type: integer, read_only: true}
      code: {type: char}
views:
  - name: SnippetList
    actions: {get: list, post: create}
    serializer: SnippetSerializer
  - name: SnippetDetail
    actions: {get: retrieve, put: update, delete: destroy}
    serializer: SnippetSerializer
  - name: TagDetail
    model: Tag
    lookup_field: slug
    lookup_value_regex: "[a-z-]+"
    actions: {get: retrieve}
  - name: Admin
    required_permissions: [is_staff]
    actions: {get: list}
  - name: Hidden
    exclude_from_schema: true
endpoints:
  - {path: /api/snippets/, method: get, view: SnippetList}
  - {path: /api/snippets/, method: post, view: SnippetList}
  - {path: /api/snippets/, method: options, view: SnippetList}
  - {path: "/api/snippets/{id}/", method: get, view: SnippetDetail}
  - {path: "/api/snippets/{id}/", method: put, view: SnippetDetail}
  - {path: "/api/snippets/{id}/", method: delete, view: SnippetDetail}
  - {path: "/api/tags/{slug}/", method: get, view: TagDetail}
  - {path: /api/admin/stats/, method: get, view: Admin}
  - {path: /api/hidden/, method: get, view: Hidden}
"#;

    fn generate(request: Option<&GenerationRequest>, public: bool) -> serde_json::Value {
        let api: ApiDescription = serde_yaml::from_str(API).unwrap();
        let settings = GeneratorSettings::default();
        let generator = OpenApiSchemaGenerator::new(&api, &settings).unwrap();
        let swagger = generator.get_swagger(request, public).unwrap();
        serde_json::to_value(swagger).unwrap()
    }

    #[test]
    fn test_document_layout() {
        let document = generate(None, false);
        assert_eq!(document["swagger"], json!("2.0"));
        assert_eq!(document["basePath"], json!("/api"));
        let paths: Vec<&String> = document["paths"].as_object().unwrap().keys().collect();
        assert_eq!(
            paths,
            vec!["/admin/stats/", "/snippets/", "/snippets/{id}/", "/tags/{slug}/"]
        );
        assert_eq!(document["security"], json!([{"basic": []}]));
        assert!(document["definitions"]["Snippet"].is_object());

        let list = &document["paths"]["/snippets/"];
        assert_eq!(list["get"]["operationId"], json!("snippets_list"));
        assert_eq!(list["post"]["operationId"], json!("snippets_create"));
        assert!(list.get("options").is_none());
        // equal to the global lists
        assert!(list["post"].get("consumes").is_none());
        assert!(list["post"].get("produces").is_none());

        let detail = &document["paths"]["/snippets/{id}/"];
        assert_eq!(detail["get"]["operationId"], json!("snippets_read"));
        assert_eq!(detail["delete"]["operationId"], json!("snippets_delete"));
    }

    #[test]
    fn test_path_parameters() {
        let document = generate(None, false);
        assert_eq!(
            document["paths"]["/snippets/{id}/"]["parameters"],
            json!([{
                "name": "id",
                "in": "path",
                "description": "A unique integer value identifying this snippet.",
                "required": true,
                "type": "integer"
            }])
        );
        assert_eq!(
            document["paths"]["/tags/{slug}/"]["parameters"],
            json!([{
                "name": "slug",
                "in": "path",
                "description": "Short unique label",
                "required": true,
                "type": "string",
                "format": "slug",
                "pattern": "[a-z-]+"
            }])
        );
    }

    #[test]
    fn test_permissions_filter_views() {
        let guest = GenerationRequest::default();
        let document = generate(Some(&guest), false);
        assert!(document["paths"].get("/admin/stats/").is_none());

        let staff = GenerationRequest::with_permissions(["is_staff"]);
        let document = generate(Some(&staff), false);
        assert!(document["paths"].get("/admin/stats/").is_some());

        let document = generate(Some(&guest), true);
        assert!(document["paths"].get("/admin/stats/").is_some());
    }

    #[test]
    fn test_no_endpoints() {
        let api = ApiDescription {
            info: Some(Info::new("Empty", "1").unwrap()),
            ..ApiDescription::default()
        };
        let settings = GeneratorSettings::default();
        let swagger = OpenApiSchemaGenerator::new(&api, &settings)
            .unwrap()
            .get_swagger(None, false)
            .unwrap();
        let document = serde_json::to_value(swagger).unwrap();
        assert_eq!(document["paths"], json!({}));
        assert_eq!(document["basePath"], json!("/"));
    }

    #[test]
    fn test_missing_info() {
        let api = ApiDescription::default();
        let settings = GeneratorSettings::default();
        let err = OpenApiSchemaGenerator::new(&api, &settings)
            .unwrap()
            .get_schema(None, false)
            .unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }

    #[test]
    fn test_relative_endpoint_paths_are_rejected() {
        let settings = GeneratorSettings::default();
        for path in ["ax/x/", "éa/x/"] {
            let yaml = format!(
                r#"
info: {{title: Paths, version: v1}}
views:
  - name: Things
    actions: {{get: list}}
endpoints:
  - {{path: "{}", method: get, view: Things}}
  - {{path: /b/y/, method: get, view: Things}}
"#,
                path
            );
            let api: ApiDescription = serde_yaml::from_str(&yaml).unwrap();
            let err = OpenApiSchemaGenerator::new(&api, &settings).err().unwrap();
            assert!(matches!(err, Error::ConfigurationError(_)), "{}", path);
            assert!(err.to_string().contains(path));
        }
    }

    #[test]
    fn test_root_prefix_keeps_full_paths() {
        let api: ApiDescription = serde_yaml::from_str(
            r#"
info: {title: Paths, version: v1}
views:
  - name: Things
    actions: {get: list}
endpoints:
  - {path: /éa/x/, method: get, view: Things}
  - {path: /b/y/, method: get, view: Things}
"#,
        )
        .unwrap();
        let settings = GeneratorSettings::default();
        let swagger = OpenApiSchemaGenerator::new(&api, &settings)
            .unwrap()
            .get_swagger(None, false)
            .unwrap();
        let document = serde_json::to_value(&swagger).unwrap();
        assert_eq!(document["basePath"], json!("/"));
        let paths: Vec<&String> = document["paths"].as_object().unwrap().keys().collect();
        assert_eq!(paths, vec!["/b/y/", "/éa/x/"]);
        assert_eq!(document["paths"]["/éa/x/"]["get"]["operationId"], json!("éa_x_list"));
    }

    #[test]
    fn test_strip_path_prefix() {
        assert_eq!(strip_path_prefix("/api/users/", "/api").unwrap(), "/users/");
        assert_eq!(strip_path_prefix("/users/", "/").unwrap(), "/users/");
        assert!(strip_path_prefix("/apiary/", "/api").is_err());
    }

    #[test]
    fn test_openapi3_dialect() {
        let api: ApiDescription = serde_yaml::from_str(API).unwrap();
        let settings = GeneratorSettings {
            dialect: Dialect::Openapi3,
            ..GeneratorSettings::default()
        };
        let document = OpenApiSchemaGenerator::new(&api, &settings)
            .unwrap()
            .with_url("https://api.example.com/")
            .get_schema(None, false)
            .unwrap();
        assert_eq!(document.dialect(), Dialect::Openapi3);
        let value = serde_json::to_value(document).unwrap();
        assert!(value["openapi"].as_str().unwrap().starts_with("3.0"));
        assert!(value["components"]["schemas"]["Snippet"].is_object());
    }

    #[test]
    fn test_determine_path_prefix() {
        assert_eq!(
            determine_path_prefix(&["/api/v1/users/", "/api/v1/groups/{pk}/"]),
            "/api/v1"
        );
        assert_eq!(determine_path_prefix(&["/users/", "/api/groups/"]), "/");
        assert_eq!(
            determine_path_prefix(&["/api/users/{pk}/", "/api/groups/"]),
            "/api"
        );
    }

    #[test]
    fn test_operation_keys() {
        let mut view = ViewDef::new("Users");
        assert_eq!(
            get_operation_keys("/users/", HttpMethod::Get, &view),
            vec!["users", "list"]
        );
        assert_eq!(
            get_operation_keys("/users/{pk}/", HttpMethod::Get, &view),
            vec!["users", "read"]
        );
        assert_eq!(
            get_operation_keys("/users/{pk}/", HttpMethod::Patch, &view),
            vec!["users", "partial_update"]
        );

        view.actions.insert(HttpMethod::Post, "activate".to_string());
        assert_eq!(
            get_operation_keys("/users/{pk}/activate/", HttpMethod::Post, &view),
            vec!["users", "activate"]
        );
        view.actions.insert(HttpMethod::Delete, "activate".to_string());
        assert_eq!(
            get_operation_keys("/users/{pk}/activate/", HttpMethod::Delete, &view),
            vec!["users", "activate", "delete"]
        );
    }

    #[test]
    fn test_path_variables() {
        let variables: Vec<String> = path_variables("/a/{b}/c/{a}/{b}/").into_iter().collect();
        assert_eq!(variables, vec!["a", "b"]);
    }
}
