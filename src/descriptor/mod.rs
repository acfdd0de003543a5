//! Input descriptors: the API surface to document.
//!
//! Descriptor files (YAML or JSON) declare serializers, models, views and the endpoints
//! routing to them. Several files can be merged into one [`ApiDescription`].

pub mod field;

pub use field::{
    DefaultDef, FieldDef, FieldKind, ModelDef, ModelFieldDef, ModelFieldKind, SerializerDef,
    TypeHint, ValidatorDef,
};

use crate::error::{Error, Result};
use crate::openapi::Info;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// HTTP method of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Head => "head",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
        }
    }

    /// Methods that may carry a request body
    pub fn carries_body(&self) -> bool {
        matches!(
            self,
            HttpMethod::Put | HttpMethod::Patch | HttpMethod::Post | HttpMethod::Delete
        )
    }

    /// Methods that get a request body from the view serializer without being asked
    pub fn has_implicit_body(&self) -> bool {
        matches!(self, HttpMethod::Put | HttpMethod::Patch | HttpMethod::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "head" => Ok(HttpMethod::Head),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "patch" => Ok(HttpMethod::Patch),
            "delete" => Ok(HttpMethod::Delete),
            "options" => Ok(HttpMethod::Options),
            "trace" => Ok(HttpMethod::Trace),
            _ => Err(Error::InvalidArgument(format!("unknown HTTP method {}", s))),
        }
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A routed (path, method) pair handled by a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    /// Name of the view handling the endpoint
    pub view: String,
}

/// A request handler with its declared configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDef {
    pub name: String,
    /// Docstring of the view, split into summary and description
    #[serde(default)]
    pub description: Option<String>,
    /// Action names bound to each method (`list`, `retrieve`, custom actions)
    #[serde(default)]
    pub actions: IndexMap<HttpMethod, String>,
    /// Whether custom actions operate on a single object
    #[serde(default)]
    pub detail: Option<bool>,
    /// Default serializer of the view
    #[serde(default)]
    pub serializer: Option<String>,
    /// Model behind the queryset, used to type path parameters
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub filter_backends: Vec<FilterBackendDef>,
    #[serde(default)]
    pub paginator: Option<PaginatorDef>,
    /// Request parsers; the generator defaults apply when absent
    #[serde(default)]
    pub parser_classes: Option<Vec<ContentHandlerDef>>,
    /// Response renderers; the generator defaults apply when absent
    #[serde(default)]
    pub renderer_classes: Option<Vec<ContentHandlerDef>>,
    #[serde(default = "default_lookup_field")]
    pub lookup_field: String,
    #[serde(default)]
    pub lookup_value_regex: Option<String>,
    /// Permissions a caller needs to see this view in the document
    #[serde(default)]
    pub required_permissions: Vec<String>,
    #[serde(default)]
    pub exclude_from_schema: bool,
    /// Per-method schema overrides
    #[serde(default)]
    pub overrides: IndexMap<HttpMethod, Overrides>,
}

fn default_lookup_field() -> String {
    "pk".to_string()
}

impl ViewDef {
    pub fn new(name: impl Into<String>) -> Self {
        ViewDef {
            name: name.into(),
            description: None,
            actions: IndexMap::new(),
            detail: None,
            serializer: None,
            model: None,
            filter_backends: Vec::new(),
            paginator: None,
            parser_classes: None,
            renderer_classes: None,
            lookup_field: default_lookup_field(),
            lookup_value_regex: None,
            required_permissions: Vec::new(),
            exclude_from_schema: false,
            overrides: IndexMap::new(),
        }
    }

    pub fn action(&self, method: HttpMethod) -> Option<&str> {
        self.actions.get(&method).map(String::as_str)
    }

    pub fn overrides(&self, method: HttpMethod) -> Option<&Overrides> {
        self.overrides.get(&method)
    }
}

/// Parser or renderer declared on a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentHandlerDef {
    pub name: String,
    pub media_type: String,
}

impl ContentHandlerDef {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>) -> Self {
        ContentHandlerDef {
            name: name.into(),
            media_type: media_type.into(),
        }
    }
}

/// A filter backend contributing query parameters to list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterBackendDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<QueryFieldDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStyle {
    PageNumber,
    LimitOffset,
    Cursor,
    /// Unknown paginator; only its declared fields are used and responses are left as is
    Custom,
}

/// Pagination of list responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatorDef {
    #[serde(default)]
    pub name: Option<String>,
    pub style: PaginationStyle,
    /// Extra or replacement query fields; built-ins are derived from `style` when empty
    #[serde(default)]
    pub fields: Vec<QueryFieldDef>,
    /// Query parameter letting clients choose the page size
    #[serde(default)]
    pub page_size_query_param: Option<String>,
}

/// A query field declared by a filter backend or paginator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFieldDef {
    pub name: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw schema attributes (`type`, `format`, `enum`...)
    #[serde(flatten)]
    pub schema: IndexMap<String, Value>,
}

fn default_location() -> String {
    "query".to_string()
}

impl QueryFieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        QueryFieldDef {
            name: name.into(),
            location: default_location(),
            required: false,
            description: None,
            schema: IndexMap::new(),
        }
    }

    pub fn with_type(mut self, type_: &str) -> Self {
        self.schema
            .insert("type".to_string(), Value::String(type_.to_string()));
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Request body override of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyOverride {
    /// Force the operation to have no body
    NoBody,
    Serializer(String),
    /// Raw 2.0 schema object
    Schema(Value),
}

/// Response override of one status code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseOverride {
    /// Plain description, no schema
    Description(String),
    Spec {
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        serializer: Option<String>,
        #[serde(default)]
        many: bool,
        #[serde(default)]
        schema: Option<Value>,
        #[serde(default)]
        examples: Option<IndexMap<String, Value>>,
    },
}

/// Per-operation overrides declared on a view method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default)]
    pub request_body: Option<BodyOverride>,
    /// Serializer whose fields become query parameters
    #[serde(default)]
    pub query_serializer: Option<String>,
    /// Raw 2.0 parameter objects merged over the generated ones
    #[serde(default)]
    pub manual_parameters: Vec<Value>,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default, alias = "operation_summary")]
    pub summary: Option<String>,
    #[serde(default, alias = "operation_description")]
    pub description: Option<String>,
    #[serde(default)]
    pub security: Option<Vec<IndexMap<String, Vec<String>>>>,
    #[serde(default)]
    pub deprecated: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Status code to response; `null` removes a generated response
    #[serde(default)]
    pub responses: IndexMap<String, Option<ResponseOverride>>,
    /// Inspector names prepended to the generator-wide chains
    #[serde(default)]
    pub field_inspectors: Vec<String>,
    #[serde(default)]
    pub filter_inspectors: Vec<String>,
    #[serde(default)]
    pub paginator_inspectors: Vec<String>,
}

/// Everything the generator knows about an API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDescription {
    #[serde(default)]
    pub info: Option<Info>,
    #[serde(default)]
    pub serializers: Vec<SerializerDef>,
    #[serde(default)]
    pub models: Vec<ModelDef>,
    #[serde(default)]
    pub views: Vec<ViewDef>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl ApiDescription {
    /// Merge another description into this one.
    ///
    /// Named items must be unique across all merged files; endpoints are appended.
    pub fn merge(&mut self, other: ApiDescription) -> Result<()> {
        if other.info.is_some() {
            if self.info.is_some() {
                return Err(Error::configuration("info is declared more than once"));
            }
            self.info = other.info;
        }
        merge_named(&mut self.serializers, other.serializers, "serializer", |s| {
            &s.name
        })?;
        merge_named(&mut self.models, other.models, "model", |m| &m.name)?;
        merge_named(&mut self.views, other.views, "view", |v| &v.name)?;
        self.endpoints.extend(other.endpoints);
        Ok(())
    }
}

fn merge_named<T>(
    into: &mut Vec<T>,
    from: Vec<T>,
    what: &str,
    name: impl Fn(&T) -> &String,
) -> Result<()> {
    for item in from {
        if into.iter().any(|existing| name(existing) == name(&item)) {
            return Err(Error::configuration(format!(
                "duplicate {} {}",
                what,
                name(&item)
            )));
        }
        into.push(item);
    }
    Ok(())
}
