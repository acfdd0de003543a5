//! Operation assembly: one endpoint in, one `Operation` out.

use super::InspectorContext;
use crate::descriptor::{
    BodyOverride, ContentHandlerDef, HttpMethod, Overrides, ResponseOverride, SerializerDef,
    ViewDef,
};
use crate::error::{Error, Result};
use crate::openapi::{
    Component, Operation, Parameter, ParameterLocation, ReferenceResolver, Response, Responses,
    Schema, SchemaOrRef,
};
use crate::settings::GeneratorSettings;
use crate::type_resolver::TypeResolver;
use indexmap::IndexMap;
use log::debug;

const BODY_METHODS: &str = "PUT,PATCH,POST,DELETE";
const SUMMARY_MAX_LEN: usize = 120;

/// What an operation sends or returns: a serializer to convert, or a ready schema.
enum Body<'a> {
    Serializer(&'a SerializerDef),
    Schema(SchemaOrRef),
}

/// Builds the operation of one `(path, method, view)` endpoint.
pub struct SwaggerAutoSchema<'a> {
    ctx: InspectorContext<'a>,
    overrides: Overrides,
}

impl<'a> SwaggerAutoSchema<'a> {
    pub fn new(
        view: &'a ViewDef,
        path: &'a str,
        method: HttpMethod,
        components: &'a mut ReferenceResolver<Component>,
        catalog: &'a TypeResolver,
        settings: &'a GeneratorSettings,
    ) -> Result<Self> {
        let overrides = view.overrides(method);
        let ctx =
            InspectorContext::new(view, path, method, components, catalog, settings, overrides)?;
        Ok(Self {
            ctx,
            overrides: overrides.cloned().unwrap_or_default(),
        })
    }

    /// Assemble the operation. `operation_keys` identify it within the document and seed
    /// its id and tags.
    pub fn get_operation(&mut self, operation_keys: &[String]) -> Result<Operation> {
        let consumes = self.consumes();
        let produces = self.produces();

        let mut parameters = self.request_body_parameters(&consumes)?;
        parameters.extend(self.query_parameters()?);
        let parameters = self.add_manual_parameters(parameters, &consumes)?;

        let operation_id = self
            .overrides
            .operation_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| operation_keys.join("_"));
        let (summary, description) = self.summary_and_description();
        let tags = self
            .overrides
            .tags
            .clone()
            .or_else(|| operation_keys.first().map(|key| vec![key.clone()]));
        let responses = self.responses()?;

        debug!(
            "Assembled {} {} as {}",
            self.ctx.method, self.ctx.path, operation_id
        );
        let mut operation = Operation::new(operation_id, responses, parameters)?;
        operation.summary = summary;
        operation.description = description;
        operation.consumes = Some(consumes);
        operation.produces = Some(produces);
        operation.tags = tags;
        operation.security = self.overrides.security.clone();
        operation.deprecated = self.overrides.deprecated;
        Ok(operation)
    }

    pub fn consumes(&self) -> Vec<String> {
        consumes_of(self.ctx.parser_classes())
    }

    pub fn produces(&self) -> Vec<String> {
        produces_of(self.ctx.renderer_classes())
    }

    pub fn is_list_view(&self) -> bool {
        is_list_view(self.ctx.path, self.ctx.method, self.ctx.view)
    }

    /// List views answer GET with an array of objects.
    pub fn has_list_response(&self) -> bool {
        self.is_list_view() && self.ctx.method == HttpMethod::Get
    }

    fn should_filter(&self) -> bool {
        !self.ctx.view.filter_backends.is_empty()
            && matches!(self.ctx.method, HttpMethod::Get | HttpMethod::Delete)
            && self.is_list_view()
    }

    fn should_page(&self) -> bool {
        self.ctx.view.paginator.is_some() && self.has_list_response()
    }

    fn view_serializer(&self) -> Result<Option<Body<'a>>> {
        let catalog = self.ctx.catalog;
        let view: &'a ViewDef = self.ctx.view;
        match view.serializer.as_deref() {
            Some(name) => Ok(Some(Body::Serializer(catalog.serializer(name)?))),
            None => Ok(None),
        }
    }

    /// The request body of the operation, if it takes one.
    fn request_body(&self) -> Result<Option<Body<'a>>> {
        let body = match &self.overrides.request_body {
            None if self.ctx.method.has_implicit_body() => return self.view_serializer(),
            None | Some(BodyOverride::NoBody) => return Ok(None),
            Some(body) => body,
        };
        if !self.ctx.method.carries_body() {
            return Err(Error::generation(format!(
                "request_body can only be applied to ({}); are you looking for query_serializer or manual_parameters?",
                BODY_METHODS
            )));
        }
        let catalog = self.ctx.catalog;
        match body {
            BodyOverride::Serializer(name) => Ok(Some(Body::Serializer(catalog.serializer(name)?))),
            BodyOverride::Schema(value) => {
                Ok(Some(Body::Schema(SchemaOrRef::from_value(value.clone())?)))
            }
            BodyOverride::NoBody => Ok(None),
        }
    }

    fn body_schema(&mut self, body: Body<'a>) -> Result<Option<SchemaOrRef>> {
        match body {
            Body::Serializer(serializer) => self.ctx.serializer_to_schema(serializer),
            Body::Schema(schema) => Ok(Some(schema)),
        }
    }

    /// A single body parameter, or one formData parameter per field for form parsers.
    fn request_body_parameters(&mut self, consumes: &[String]) -> Result<Vec<Parameter>> {
        let Some(body) = self.request_body()? else {
            return Ok(Vec::new());
        };
        if consumes.iter().any(|media_type| is_form_media_type(media_type)) {
            return match body {
                Body::Schema(_) => Err(Error::generation("form request body cannot be a Schema")),
                Body::Serializer(serializer) => self
                    .ctx
                    .serializer_to_parameters(serializer, ParameterLocation::FormData),
            };
        }
        match self.body_schema(body)? {
            Some(schema) => Ok(vec![Parameter::body("data", schema)?]),
            None => Ok(Vec::new()),
        }
    }

    /// Filter and paginator parameters, then the fields of the query serializer.
    fn query_parameters(&mut self) -> Result<Vec<Parameter>> {
        let view: &'a ViewDef = self.ctx.view;
        let mut natural = Vec::new();
        if self.should_filter() {
            for backend in &view.filter_backends {
                natural.extend(self.ctx.filter_parameters(backend)?);
            }
        }
        if self.should_page() {
            if let Some(paginator) = &view.paginator {
                natural.extend(self.ctx.paginator_parameters(paginator)?);
            }
        }

        let Some(name) = self.overrides.query_serializer.clone() else {
            return Ok(natural);
        };
        let catalog = self.ctx.catalog;
        let serializer = catalog.serializer(&name)?;
        let from_serializer = self
            .ctx
            .serializer_to_parameters(serializer, ParameterLocation::Query)?;
        let conflict = from_serializer
            .iter()
            .any(|param| natural.iter().any(|n| n.key() == param.key()));
        if conflict {
            return Err(Error::generation(format!(
                "your query_serializer contains fields that conflict with the filter_backend or paginator_class on the view - {} {}",
                self.ctx.method, self.ctx.path
            )));
        }
        natural.extend(from_serializer);
        Ok(natural)
    }

    fn add_manual_parameters(
        &self,
        parameters: Vec<Parameter>,
        consumes: &[String],
    ) -> Result<Vec<Parameter>> {
        let manual = self
            .overrides
            .manual_parameters
            .iter()
            .map(|value| Parameter::from_value(value.clone()))
            .collect::<Result<Vec<_>>>()?;

        if manual.iter().any(|p| p.in_ == ParameterLocation::Body) {
            return Err(Error::generation(
                "specify the body parameter as a Schema or Serializer in request_body",
            ));
        }
        if manual.iter().any(|p| p.in_ == ParameterLocation::FormData) {
            let has_body = parameters.iter().any(|p| p.in_ == ParameterLocation::Body);
            let accepts_form = consumes.iter().any(|media_type| is_form_media_type(media_type));
            if has_body || !accepts_form {
                return Err(Error::generation(
                    "cannot add form parameters when the request has a request body; did you forget to set an appropriate parser class on the view?",
                ));
            }
            if !self.ctx.method.carries_body() {
                return Err(Error::generation(format!(
                    "form parameters can only be applied to ({}) HTTP methods",
                    BODY_METHODS
                )));
            }
        }
        merge_params(parameters, manual)
    }

    /// Summary and description from the overrides or the view docstring.
    ///
    /// A docstring whose first paragraph is short enough has that paragraph split off as
    /// the summary.
    fn summary_and_description(&self) -> (Option<String>, Option<String>) {
        let mut summary = self.overrides.summary.clone();
        let description = match &self.overrides.description {
            Some(description) => description.clone(),
            None => {
                let docstring = self
                    .ctx
                    .view
                    .description
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .replace('\r', "");
                if !docstring.is_empty() && summary.is_none() {
                    let (split, rest) = split_summary_from_description(docstring);
                    summary = split;
                    rest
                } else {
                    docstring
                }
            }
        };
        (summary, Some(description).filter(|d| !d.is_empty()))
    }

    /// The schema of the success response when none is given explicitly.
    fn default_response_schema(&mut self) -> Result<Option<SchemaOrRef>> {
        if !matches!(
            self.ctx.method,
            HttpMethod::Get | HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch
        ) {
            return Ok(None);
        }
        let body = match &self.overrides.request_body {
            None | Some(BodyOverride::NoBody) => self.view_serializer()?,
            Some(_) => self.request_body()?,
        };
        let Some(body) = body else {
            return Ok(None);
        };
        let Some(schema) = self.body_schema(body)? else {
            return Ok(None);
        };
        if !self.has_list_response() {
            return Ok(Some(schema));
        }

        let list = Schema::array(schema)?;
        let view: &'a ViewDef = self.ctx.view;
        if let Some(paginator) = view.paginator.as_ref().filter(|_| self.should_page()) {
            if let Some(paged) = self.ctx.paginated_response(paginator, &list)? {
                return Ok(Some(paged.into()));
            }
        }
        Ok(Some(list.into()))
    }

    fn responses(&mut self) -> Result<Responses> {
        let manual = self.overrides.responses.clone();
        let mut responses: IndexMap<String, Option<Response>> = IndexMap::new();

        let has_success = manual
            .keys()
            .filter(|status| status.as_str() != "default")
            .any(|status| is_success(status));
        if !has_success {
            let status = default_status(self.ctx.method);
            let schema = self.default_response_schema()?;
            responses.insert(status.to_string(), Some(Response::new("", schema)));
        }

        for (status, response) in manual {
            let response = match response {
                None => None,
                Some(response) => Some(self.manual_response(response)?),
            };
            responses.insert(status, response);
        }

        let mut result = Responses::new();
        for (status, response) in responses {
            if let Some(response) = response {
                result.insert(status, response);
            }
        }
        Ok(result)
    }

    fn manual_response(&mut self, response: ResponseOverride) -> Result<Response> {
        match response {
            ResponseOverride::Description(description) => Ok(Response::new(description, None)),
            ResponseOverride::Spec {
                description,
                serializer,
                many,
                schema,
                examples,
            } => {
                let schema = match (serializer, schema) {
                    (Some(name), _) => {
                        let catalog = self.ctx.catalog;
                        let serializer = catalog.serializer(&name)?;
                        let schema = self.ctx.serializer_to_schema(serializer)?;
                        match schema {
                            Some(schema) if many => Some(Schema::array(schema)?.into()),
                            other => other,
                        }
                    }
                    (None, Some(value)) => Some(SchemaOrRef::from_value(value)?),
                    (None, None) => None,
                };
                let response = Response::new(description.unwrap_or_default(), schema);
                Ok(match examples {
                    Some(examples) => response.with_examples(examples),
                    None => response,
                })
            }
        }
    }
}

/// Media types a view accepts. Form types only count when nothing else is accepted.
pub fn consumes_of(parsers: &[ContentHandlerDef]) -> Vec<String> {
    let media_types: Vec<String> = parsers.iter().map(|p| p.media_type.clone()).collect();
    let non_form: Vec<String> = media_types
        .iter()
        .filter(|media_type| !is_form_media_type(media_type))
        .cloned()
        .collect();
    if non_form.is_empty() {
        media_types
    } else {
        non_form
    }
}

/// Media types a view renders, leaving out browsable HTML and coreapi renderers.
pub fn produces_of(renderers: &[ContentHandlerDef]) -> Vec<String> {
    renderers
        .iter()
        .map(|r| r.media_type.clone())
        .filter(|media_type| !["html", "coreapi"].iter().any(|ex| media_type.contains(ex)))
        .collect()
}

pub fn is_form_media_type(media_type: &str) -> bool {
    let base = media_type.split(';').next().unwrap_or_default().trim();
    base == "application/x-www-form-urlencoded" || base == "multipart/form-data"
}

/// Whether the endpoint deals with a collection rather than a single object.
pub fn is_list_view(path: &str, method: HttpMethod, view: &ViewDef) -> bool {
    let action = view.action(method);
    if matches!(action, Some("list" | "create")) || view.detail == Some(false) {
        return true;
    }
    if matches!(
        action,
        Some("retrieve" | "update" | "partial_update" | "destroy")
    ) || view.detail == Some(true)
    {
        return false;
    }
    // a parameterized last segment addresses one object
    let last = path.trim_matches('/').rsplit('/').next().unwrap_or_default();
    !last.contains('{')
}

fn default_status(method: HttpMethod) -> u16 {
    match method {
        HttpMethod::Post => 201,
        HttpMethod::Delete => 204,
        _ => 200,
    }
}

fn is_success(status: &str) -> bool {
    status
        .parse::<u16>()
        .map_or(false, |code| (200..300).contains(&code))
}

fn split_summary_from_description(description: String) -> (Option<String>, String) {
    if let Some((first, rest)) = description.split_once("\n\n") {
        let first = first.trim();
        if first.chars().count() < SUMMARY_MAX_LEN {
            return (Some(first.to_string()), rest.trim().to_string());
        }
    }
    (None, description)
}

/// Merge `overrides` into `parameters` by `(name, in)`: matching entries are replaced in
/// place, new ones appended.
pub fn merge_params(parameters: Vec<Parameter>, overrides: Vec<Parameter>) -> Result<Vec<Parameter>> {
    let mut merged = param_list_to_map(parameters)?;
    for (key, parameter) in param_list_to_map(overrides)? {
        merged.insert(key, parameter);
    }
    Ok(merged.into_values().collect())
}

fn param_list_to_map(
    parameters: Vec<Parameter>,
) -> Result<IndexMap<(String, ParameterLocation), Parameter>> {
    let mut map = IndexMap::new();
    for parameter in parameters {
        let key = parameter.key();
        if map.contains_key(&key) {
            return Err(Error::generation(format!(
                "duplicate Parameters found: {} in {}",
                key.0, key.1
            )));
        }
        map.insert(key, parameter);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ApiDescription;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    const API: &str = r#"
serializers:
  - name: ArticleSerializer
    fields:
      id: {type: integer, read_only: true}
      title: {type: char, validators: [{kind: max_length, limit: 10}]}
      body: {type: char, required: false}
  - name: SearchSerializer
    fields:
      q: {type: char}
      ordering: {type: char, required: false}
views:
  - name: ArticleList
    description: "List articles.\n\nReturns every article visible to the caller."
    actions: {get: list, post: create}
    serializer: ArticleSerializer
    filter_backends:
      - name: OrderingFilter
        fields:
          - {name: ordering, description: Which field to use when ordering the results.}
    paginator: {style: page_number}
  - name: ArticleUpload
    serializer: ArticleSerializer
    parser_classes:
      - {name: MultiPartParser, media_type: multipart/form-data}
  - name: ArticleSearch
    serializer: ArticleSerializer
    filter_backends:
      - name: OrderingFilter
        fields:
          - {name: ordering}
    overrides:
      get:
        query_serializer: SearchSerializer
"#;

    fn assemble(
        api: &str,
        view: &str,
        path: &str,
        method: HttpMethod,
        edit: impl FnOnce(&mut ViewDef),
    ) -> Result<Value> {
        let api: ApiDescription = serde_yaml::from_str(api).unwrap();
        let catalog = TypeResolver::new(&api).unwrap();
        let settings = GeneratorSettings::default();
        let mut view = catalog.view(view).unwrap().clone();
        edit(&mut view);
        let mut components = ReferenceResolver::swagger();
        let keys = vec!["articles".to_string(), method.as_str().to_string()];
        let operation = SwaggerAutoSchema::new(
            &view,
            path,
            method,
            &mut components,
            &catalog,
            &settings,
        )?
        .get_operation(&keys)?;
        Ok(serde_json::to_value(operation).unwrap())
    }

    fn overrides(view: &mut ViewDef, method: HttpMethod, yaml: &str) {
        view.overrides
            .insert(method, serde_yaml::from_str(yaml).unwrap());
    }

    #[test]
    fn test_json_body_is_one_body_parameter() {
        let operation =
            assemble(API, "ArticleList", "/articles/", HttpMethod::Post, |_| {}).unwrap();
        assert_eq!(
            operation["parameters"],
            json!([{
                "name": "data",
                "in": "body",
                "required": true,
                "schema": {"$ref": "#/definitions/Article"}
            }])
        );
        assert_eq!(operation["consumes"], json!(["application/json"]));
        assert_eq!(operation["produces"], json!(["application/json"]));
        assert_eq!(
            operation["responses"]["201"],
            json!({"description": "", "schema": {"$ref": "#/definitions/Article"}})
        );
    }

    #[test]
    fn test_form_parsers_yield_form_parameters() {
        let operation =
            assemble(API, "ArticleUpload", "/articles/", HttpMethod::Post, |_| {}).unwrap();
        let parameters = operation["parameters"].as_array().unwrap();
        let names: Vec<&str> = parameters
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        // read-only fields are not accepted as input
        assert_eq!(names, vec!["title", "body"]);
        assert!(parameters.iter().all(|p| p["in"] == json!("formData")));
        assert_eq!(operation["consumes"], json!(["multipart/form-data"]));
    }

    #[test]
    fn test_form_body_cannot_be_a_schema() {
        let err = assemble(API, "ArticleUpload", "/articles/", HttpMethod::Post, |view| {
            overrides(view, HttpMethod::Post, "request_body: {schema: {type: object}}");
        })
        .err()
        .unwrap();
        assert_eq!(
            err.to_string(),
            "schema generation failed: form request body cannot be a Schema"
        );
    }

    #[test]
    fn test_request_body_on_get_is_rejected() {
        let err = assemble(API, "ArticleList", "/articles/", HttpMethod::Get, |view| {
            overrides(view, HttpMethod::Get, "request_body: {serializer: SearchSerializer}");
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("request_body can only be applied to"));
    }

    #[test]
    fn test_paginated_list() {
        let operation =
            assemble(API, "ArticleList", "/articles/", HttpMethod::Get, |_| {}).unwrap();
        let names: Vec<&str> = operation["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["ordering", "page"]);

        let schema = &operation["responses"]["200"]["schema"];
        assert_eq!(schema["type"], json!("object"));
        assert_eq!(schema["required"], json!(["count", "results"]));
        assert_eq!(
            schema["properties"]["results"],
            json!({"type": "array", "items": {"$ref": "#/definitions/Article"}})
        );
        assert_eq!(operation["operationId"], json!("articles_get"));
        assert_eq!(operation["tags"], json!(["articles"]));
        assert_eq!(operation["summary"], json!("List articles."));
        assert_eq!(
            operation["description"],
            json!("Returns every article visible to the caller.")
        );
    }

    #[test]
    fn test_detail_views_are_not_paged() {
        let operation = assemble(
            API,
            "ArticleList",
            "/articles/{id}/",
            HttpMethod::Get,
            |view| {
                view.actions.clear();
            },
        )
        .unwrap();
        assert!(operation.get("parameters").map_or(true, |p| p == &json!([])));
        assert_eq!(
            operation["responses"]["200"]["schema"],
            json!({"$ref": "#/definitions/Article"})
        );
    }

    #[test]
    fn test_query_serializer_conflicts_with_filters() {
        let err = assemble(API, "ArticleSearch", "/search/", HttpMethod::Get, |_| {})
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "schema generation failed: your query_serializer contains fields that conflict with the filter_backend or paginator_class on the view - GET /search/"
        );

        let operation = assemble(API, "ArticleSearch", "/search/", HttpMethod::Get, |view| {
            view.filter_backends.clear();
        })
        .unwrap();
        assert_eq!(operation["parameters"][0]["name"], json!("q"));
        assert_eq!(operation["parameters"][0]["in"], json!("query"));
        assert_eq!(operation["parameters"][0]["required"], json!(true));
    }

    #[test]
    fn test_manual_parameters_win() {
        let operation = assemble(API, "ArticleList", "/articles/", HttpMethod::Get, |view| {
            overrides(
                view,
                HttpMethod::Get,
                r#"
manual_parameters:
  - {name: page, in: query, type: integer, description: Page to show}
  - {name: X-Trace, in: header, type: string}
"#,
            );
        })
        .unwrap();
        let parameters = operation["parameters"].as_array().unwrap();
        assert_eq!(parameters.len(), 3);
        assert_eq!(parameters[1]["name"], json!("page"));
        assert_eq!(parameters[1]["description"], json!("Page to show"));
        assert_eq!(parameters[2]["name"], json!("X-Trace"));
    }

    #[test]
    fn test_manual_body_parameter_is_rejected() {
        let err = assemble(API, "ArticleList", "/articles/", HttpMethod::Post, |view| {
            overrides(
                view,
                HttpMethod::Post,
                "manual_parameters: [{name: data, in: body, schema: {type: object}}]",
            );
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("request_body"));

        let err = assemble(API, "ArticleList", "/articles/", HttpMethod::Post, |view| {
            overrides(
                view,
                HttpMethod::Post,
                "manual_parameters: [{name: upload, in: formData, type: file}]",
            );
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("cannot add form parameters"));
    }

    #[test]
    fn test_manual_success_response_replaces_default() {
        let operation = assemble(API, "ArticleList", "/articles/", HttpMethod::Post, |view| {
            overrides(
                view,
                HttpMethod::Post,
                r#"
responses:
  "202": Queued for review
  "400": {description: Invalid input, serializer: SearchSerializer}
"#,
            );
        })
        .unwrap();
        let responses = operation["responses"].as_object().unwrap();
        assert_eq!(responses.keys().collect::<Vec<_>>(), vec!["202", "400"]);
        assert_eq!(
            operation["responses"]["400"]["schema"],
            json!({"$ref": "#/definitions/Search"})
        );

        let operation = assemble(API, "ArticleList", "/articles/", HttpMethod::Delete, |view| {
            overrides(view, HttpMethod::Delete, "responses: {\"404\": Not found}");
        })
        .unwrap();
        assert_eq!(
            operation["responses"],
            json!({"204": {"description": ""}, "404": {"description": "Not found"}})
        );
    }

    #[test]
    fn test_null_response_removes_default() {
        let operation = assemble(API, "ArticleList", "/articles/", HttpMethod::Get, |view| {
            overrides(
                view,
                HttpMethod::Get,
                "responses: {\"200\": null, default: Unexpected error}",
            );
        })
        .unwrap();
        assert_eq!(
            operation["responses"],
            json!({"default": {"description": "Unexpected error"}})
        );
    }

    #[test]
    fn test_list_view_detection() {
        let mut view = ViewDef::new("Things");
        assert!(is_list_view("/things/", HttpMethod::Get, &view));
        assert!(!is_list_view("/things/{pk}/", HttpMethod::Get, &view));

        view.actions.insert(HttpMethod::Get, "retrieve".to_string());
        assert!(!is_list_view("/things/", HttpMethod::Get, &view));

        view.actions.insert(HttpMethod::Get, "recent".to_string());
        view.detail = Some(false);
        assert!(is_list_view("/things/{pk}/recent/", HttpMethod::Get, &view));
    }

    #[test]
    fn test_media_types() {
        let parsers = vec![
            ContentHandlerDef::new("JSONParser", "application/json"),
            ContentHandlerDef::new("FormParser", "application/x-www-form-urlencoded"),
        ];
        assert_eq!(consumes_of(&parsers), vec!["application/json"]);
        assert_eq!(
            consumes_of(&parsers[1..]),
            vec!["application/x-www-form-urlencoded"]
        );
        let renderers = vec![
            ContentHandlerDef::new("JSONRenderer", "application/json"),
            ContentHandlerDef::new("BrowsableAPIRenderer", "text/html"),
        ];
        assert_eq!(produces_of(&renderers), vec!["application/json"]);
        assert!(is_form_media_type("multipart/form-data; boundary=x"));
    }

    #[test]
    fn test_summary_split_needs_a_short_first_paragraph() {
        let long = format!("{}\n\nrest", "x".repeat(130));
        let (summary, description) = split_summary_from_description(long.clone());
        assert_eq!(summary, None);
        assert_eq!(description, long);
    }
}
