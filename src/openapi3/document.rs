//! Object model of OpenAPI 3.0 documents.

use crate::descriptor::HttpMethod;
use crate::error::{Error, Result};
use crate::openapi::{Info, Reference, ReferenceResolver, Referenceable, SecurityRequirement, SwaggerDict};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const OAS_VERSION: &str = "3.0.1";

/// Value types of the 3.0 dialect. Uploads are `string` with `binary` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    String,
    Number,
    Integer,
    Boolean,
    Array,
}

/// A schema or a reference into `#/components/schemas`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref(Reference),
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaOrRef::Schema(schema) => Some(schema),
            SchemaOrRef::Ref(_) => None,
        }
    }
}

impl From<Schema> for SchemaOrRef {
    fn from(schema: Schema) -> Self {
        SchemaOrRef::Schema(Box::new(schema))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "type")]
    pub type_: SchemaType,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl Schema {
    pub fn of_type(type_: SchemaType) -> Self {
        Schema {
            title: None,
            description: None,
            required: Vec::new(),
            type_,
            properties: IndexMap::new(),
            additional_properties: None,
            format: None,
            enum_: None,
            pattern: None,
            items: None,
            read_only: None,
            write_only: None,
            nullable: None,
            deprecated: None,
            default: None,
            example: None,
            maximum: None,
            minimum: None,
            max_length: None,
            min_length: None,
            max_items: None,
            min_items: None,
            unique_items: None,
            extensions: SwaggerDict::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        const OBJECT: &str = "Schema";
        if (!self.properties.is_empty() || self.additional_properties.is_some())
            && self.type_ != SchemaType::Object
        {
            return Err(Error::invalid(OBJECT, "only object Schema can have properties"));
        }
        let constrained = self.format.is_some()
            || self.enum_.as_ref().map_or(false, |e| !e.is_empty())
            || self.pattern.is_some();
        if constrained && matches!(self.type_, SchemaType::Object | SchemaType::Array) {
            return Err(Error::invalid(
                OBJECT,
                "[format, enum, pattern] can only be applied to primitive Schema",
            ));
        }
        if self.items.is_some() && self.type_ != SchemaType::Array {
            return Err(Error::invalid(OBJECT, "items can only be used when type is array"));
        }
        if self.pattern.is_some() && self.type_ != SchemaType::String {
            return Err(Error::invalid(OBJECT, "pattern can only be used when type is string"));
        }
        if self.read_only == Some(true) && self.write_only == Some(true) {
            return Err(Error::invalid(
                OBJECT,
                "Schema can be either read_only or write_only, not both",
            ));
        }
        Ok(())
    }

    pub fn remove_read_only(&mut self) {
        self.read_only = None;
    }
}

/// Describes one media type of a body or response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: SchemaOrRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<IndexMap<String, Value>>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl MediaType {
    pub fn new(schema: SchemaOrRef) -> Self {
        MediaType {
            schema,
            example: None,
            examples: None,
            extensions: SwaggerDict::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.example.is_some() && self.examples.is_some() {
            return Err(Error::invalid(
                "MediaType",
                "cannot use both `example` and `examples`",
            ));
        }
        Ok(())
    }
}

pub type Content = IndexMap<String, MediaType>;

/// Parameter locations of the 3.0 dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub in_: ParameterLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ParameterStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl Parameter {
    pub fn new(name: impl Into<String>, in_: ParameterLocation, schema: SchemaOrRef) -> Self {
        Parameter {
            name: name.into(),
            in_,
            description: None,
            required: None,
            deprecated: None,
            allow_empty_value: None,
            style: None,
            explode: None,
            allow_reserved: None,
            schema: Some(schema),
            content: None,
            example: None,
            extensions: SwaggerDict::new(),
        }
    }

    /// Checks the location rules and coerces path parameters to required.
    pub fn finish(mut self) -> Result<Self> {
        const OBJECT: &str = "Parameter";
        if self.allow_empty_value.is_some() && self.in_ != ParameterLocation::Query {
            return Err(Error::invalid(
                OBJECT,
                "allow_empty_value is only valid for query parameters",
            ));
        }
        if self.allow_reserved.is_some() && self.in_ != ParameterLocation::Query {
            return Err(Error::invalid(
                OBJECT,
                "allow_reserved is only valid for query parameters",
            ));
        }
        if self.in_ == ParameterLocation::Path {
            if self.required == Some(false) {
                return Err(Error::invalid(OBJECT, "path parameter cannot be optional"));
            }
            self.required = Some(true);
        }
        if self.content.is_some() == self.schema.is_some() {
            return Err(Error::invalid(OBJECT, "exactly one of (schema, content) is required"));
        }
        if let Some(content) = &self.content {
            if content.len() != 1 {
                return Err(Error::invalid(
                    OBJECT,
                    "Parameter content must contain exactly one media type",
                ));
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Responses {
    #[serde(flatten)]
    pub responses: IndexMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Response>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<String>>,
}

impl ServerVariable {
    pub fn new(default: impl Into<String>, enum_: Option<Vec<String>>) -> Result<Self> {
        let default = default.into();
        if let Some(values) = &enum_ {
            if !values.is_empty() && !values.contains(&default) {
                return Err(Error::invalid("ServerVariable", "default must respect enum!"));
            }
        }
        Ok(ServerVariable {
            default,
            description: None,
            enum_,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Server {
            url: url.into(),
            description: None,
            variables: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: Responses,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl PathItem {
    pub fn set_operation(&mut self, method: HttpMethod, operation: Operation) {
        let slot = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Trace => &mut self.trace,
        };
        *slot = Some(operation);
    }

    pub fn operations(&self) -> Vec<&Operation> {
        [
            &self.get,
            &self.head,
            &self.post,
            &self.put,
            &self.patch,
            &self.delete,
            &self.options,
            &self.trace,
        ]
        .into_iter()
        .filter_map(Option::as_ref)
        .collect()
    }
}

/// Authentication flavours of the 3.0 dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecuritySchemeType {
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    pub scopes: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub type_: SecuritySchemeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_: Option<ParameterLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl SecurityScheme {
    pub fn new(type_: SecuritySchemeType) -> Self {
        SecurityScheme {
            type_,
            description: None,
            name: None,
            in_: None,
            scheme: None,
            bearer_format: None,
            flows: None,
            open_id_connect_url: None,
            extensions: SwaggerDict::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        const OBJECT: &str = "SecurityScheme";
        match self.type_ {
            SecuritySchemeType::ApiKey => {
                if self.name.is_none() || self.in_.is_none() {
                    return Err(Error::invalid(
                        OBJECT,
                        "apiKey authentication requires the name and in properties",
                    ));
                }
                if self.in_ == Some(ParameterLocation::Path) {
                    return Err(Error::invalid(OBJECT, "apiKey parameter cannot be a path parameter"));
                }
            }
            SecuritySchemeType::Http if self.scheme.is_none() => {
                return Err(Error::invalid(
                    OBJECT,
                    "http authentication requires the scheme property",
                ))
            }
            SecuritySchemeType::OAuth2 if self.flows.is_none() => {
                return Err(Error::invalid(
                    OBJECT,
                    "oauth2 authentication requires the flows property",
                ))
            }
            SecuritySchemeType::OpenIdConnect if self.open_id_connect_url.is_none() => {
                return Err(Error::invalid(
                    OBJECT,
                    "openIdConnect authentication requires the openIdConnectUrl property",
                ))
            }
            _ => {}
        }
        Ok(())
    }
}

/// Objects stored in the 3.0 `components` registry
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Schema(Schema),
    Parameter(Parameter),
    Response(Response),
    RequestBody(RequestBody),
    SecurityScheme(SecurityScheme),
}

impl Referenceable for Component {
    fn type_name(&self) -> &'static str {
        match self {
            Component::Schema(_) => "Schema",
            Component::Parameter(_) => "Parameter",
            Component::Response(_) => "Response",
            Component::RequestBody(_) => "RequestBody",
            Component::SecurityScheme(_) => "SecurityScheme",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub request_bodies: IndexMap<String, RequestBody>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

impl Components {
    /// Drain a components registry into its output form.
    pub fn from_resolver(resolver: &mut ReferenceResolver<Component>) -> Result<Self> {
        use crate::openapi::Scope;
        let mut components = Components::default();
        for scope in resolver.scopes() {
            for (name, component) in resolver.take_scope(scope)? {
                match (scope, component) {
                    (Scope::Schemas, Component::Schema(schema)) => {
                        components.schemas.insert(name, schema);
                    }
                    (Scope::Responses, Component::Response(response)) => {
                        components.responses.insert(name, response);
                    }
                    (Scope::Parameters, Component::Parameter(parameter)) => {
                        components.parameters.insert(name, parameter);
                    }
                    (Scope::RequestBodies, Component::RequestBody(body)) => {
                        components.request_bodies.insert(name, body);
                    }
                    (Scope::SecuritySchemes, Component::SecurityScheme(scheme)) => {
                        components.security_schemes.insert(name, scheme);
                    }
                    (scope, component) => {
                        return Err(Error::reference(format!(
                            "a {} cannot be stored in {}",
                            component.type_name(),
                            scope
                        )))
                    }
                }
            }
        }
        Ok(components)
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.responses.is_empty()
            && self.parameters.is_empty()
            && self.request_bodies.is_empty()
            && self.security_schemes.is_empty()
    }
}

/// Root of an OpenAPI 3.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    pub paths: IndexMap<String, PathItem>,
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_schema_read_write_exclusive() {
        let mut schema = Schema::of_type(SchemaType::String);
        schema.read_only = Some(true);
        schema.write_only = Some(true);
        assert!(schema.validate().is_err());
        schema.write_only = None;
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_schema_properties_only_for_object() {
        let mut schema = Schema::of_type(SchemaType::Array);
        schema
            .properties
            .insert("a".into(), Schema::of_type(SchemaType::String).into());
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("only object Schema can have properties"));
    }

    #[test]
    fn test_parameter_rules() {
        let schema: SchemaOrRef = Schema::of_type(SchemaType::String).into();
        let path = Parameter::new("id", ParameterLocation::Path, schema.clone())
            .finish()
            .unwrap();
        assert_eq!(path.required, Some(true));

        let mut header = Parameter::new("X-Trace", ParameterLocation::Header, schema.clone());
        header.allow_empty_value = Some(true);
        assert!(header.finish().is_err());

        let mut both = Parameter::new("q", ParameterLocation::Query, schema.clone());
        both.content = Some(IndexMap::from([("text/plain".to_string(), MediaType::new(schema))]));
        let err = both.finish().unwrap_err();
        assert!(err.to_string().contains("exactly one of (schema, content)"));
    }

    #[test]
    fn test_server_variable_default_in_enum() {
        assert!(ServerVariable::new("v2", Some(vec!["v1".into()])).is_err());
        assert!(ServerVariable::new("v1", Some(vec!["v1".into()])).is_ok());
        assert!(ServerVariable::new("anything", None).is_ok());
    }

    #[test]
    fn test_security_scheme_rules() {
        let mut api_key = SecurityScheme::new(SecuritySchemeType::ApiKey);
        api_key.name = Some("token".into());
        api_key.in_ = Some(ParameterLocation::Path);
        assert!(api_key.validate().is_err());
        api_key.in_ = Some(ParameterLocation::Header);
        assert!(api_key.validate().is_ok());

        assert!(SecurityScheme::new(SecuritySchemeType::Http).validate().is_err());
        assert!(SecurityScheme::new(SecuritySchemeType::OAuth2).validate().is_err());
        assert!(SecurityScheme::new(SecuritySchemeType::OpenIdConnect)
            .validate()
            .is_err());
    }

    #[test]
    fn test_components_from_resolver() {
        let mut resolver = ReferenceResolver::components();
        resolver
            .set(
                crate::openapi::Scope::Schemas,
                "Pet",
                Component::Schema(Schema::of_type(SchemaType::Object)),
            )
            .unwrap();
        let components = Components::from_resolver(&mut resolver).unwrap();
        assert_eq!(
            serde_json::to_value(&components).unwrap(),
            json!({"schemas": {"Pet": {"type": "object"}}})
        );
    }
}
