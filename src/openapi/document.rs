use super::reference::{ReferenceResolver, Referenceable, Scope};
use super::schema::{Parameter, ParameterLocation, Schema, SchemaOrRef};
use super::swagger_dict::SwaggerDict;
use crate::descriptor::HttpMethod;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A security requirement: scheme name mapped to the scopes it needs
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Contact information for the exposed API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Contact {
    pub fn new(name: Option<String>, url: Option<String>, email: Option<String>) -> Result<Self> {
        let contact = Contact { name, url, email };
        contact.validate()?;
        Ok(contact)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_none() && self.url.is_none() && self.email.is_none() {
            return Err(Error::invalid(
                "Contact",
                "one of name, url or email is required for Contact object",
            ));
        }
        Ok(())
    }
}

/// License information for the exposed API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl License {
    pub fn new(name: impl Into<String>, url: Option<String>) -> Result<Self> {
        let license = License {
            name: name.into(),
            url,
        };
        license.validate()?;
        Ok(license)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid("License", "name is required for License object"));
        }
        Ok(())
    }
}

/// API metadata. Shared by both dialects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    pub version: String,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let info = Info {
            title: title.into(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            version: version.into(),
            extensions: SwaggerDict::new(),
        };
        info.validate()?;
        Ok(info)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() || self.version.is_empty() {
            return Err(Error::invalid(
                "Info",
                "title and version are required for Info object",
            ));
        }
        if let Some(contact) = &self.contact {
            contact.validate()?;
        }
        if let Some(license) = &self.license {
            license.validate()?;
        }
        Ok(())
    }
}

/// Authentication flavours of the 2.0 dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityType {
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "oauth2")]
    OAuth2,
}

/// OAuth2 flows of the 2.0 dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OAuth2Flow {
    Implicit,
    Password,
    Application,
    AccessCode,
}

/// An entry of `securityDefinitions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityDefinition {
    #[serde(rename = "type")]
    pub type_: SecurityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<OAuth2Flow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<IndexMap<String, String>>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl SecurityDefinition {
    pub fn basic() -> Self {
        SecurityDefinition {
            type_: SecurityType::Basic,
            description: None,
            name: None,
            in_: None,
            flow: None,
            authorization_url: None,
            token_url: None,
            scopes: None,
            extensions: SwaggerDict::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        const OBJECT: &str = "SecurityDefinition";
        match self.type_ {
            SecurityType::Basic => Ok(()),
            SecurityType::ApiKey => {
                if self.name.is_none() {
                    return Err(Error::invalid(OBJECT, "apiKey requires name"));
                }
                match self.in_.as_deref() {
                    Some("query") | Some("header") => Ok(()),
                    _ => Err(Error::invalid(OBJECT, "apiKey requires in to be query or header")),
                }
            }
            SecurityType::OAuth2 => {
                let flow = self
                    .flow
                    .ok_or_else(|| Error::invalid(OBJECT, "oauth2 requires flow"))?;
                let needs_authorization =
                    matches!(flow, OAuth2Flow::Implicit | OAuth2Flow::AccessCode);
                let needs_token = !matches!(flow, OAuth2Flow::Implicit);
                if needs_authorization && self.authorization_url.is_none() {
                    return Err(Error::invalid(OBJECT, "oauth2 flow requires authorizationUrl"));
                }
                if needs_token && self.token_url.is_none() {
                    return Err(Error::invalid(OBJECT, "oauth2 flow requires tokenUrl"));
                }
                Ok(())
            }
        }
    }
}

/// One response of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<IndexMap<String, Value>>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl Response {
    pub fn new(description: impl Into<String>, schema: Option<SchemaOrRef>) -> Self {
        let mut schema = schema;
        if let Some(SchemaOrRef::Schema(inline)) = &mut schema {
            inline.remove_read_only();
        }
        Response {
            description: description.into(),
            schema,
            examples: None,
            extensions: SwaggerDict::new(),
        }
    }

    pub fn with_examples(mut self, examples: IndexMap<String, Value>) -> Self {
        self.examples = Some(examples);
        self
    }
}

/// Responses of an operation keyed by status code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Responses {
    #[serde(flatten)]
    responses: IndexMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Response>,
}

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, status: impl Into<String>, response: Response) {
        let status = status.into();
        if status == "default" {
            self.default = Some(response);
        } else {
            self.responses.insert(status, response);
        }
    }

    pub fn get(&self, status: &str) -> Option<&Response> {
        if status == "default" {
            return self.default.as_ref();
        }
        self.responses.get(status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Response)> {
        self.responses.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Response)> {
        self.responses.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.responses.len() + usize::from(self.default.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single API operation (path + HTTP method)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    pub responses: Responses,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produces: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl Operation {
    pub fn new(
        operation_id: impl Into<String>,
        responses: Responses,
        parameters: Vec<Parameter>,
    ) -> Result<Self> {
        let operation = Operation {
            operation_id: operation_id.into(),
            summary: None,
            description: None,
            parameters,
            responses,
            consumes: None,
            produces: None,
            tags: None,
            security: None,
            deprecated: None,
            extensions: SwaggerDict::new(),
        };
        operation.validate()?;
        Ok(operation)
    }

    pub fn validate(&self) -> Result<()> {
        const OBJECT: &str = "Operation";
        if self.operation_id.is_empty() {
            return Err(Error::invalid(OBJECT, "operation_id is required"));
        }
        let mut seen = std::collections::HashSet::new();
        for parameter in &self.parameters {
            if !seen.insert(parameter.key()) {
                return Err(Error::invalid(
                    OBJECT,
                    format!(
                        "duplicate Parameters found: {} in {}",
                        parameter.name, parameter.in_
                    ),
                ));
            }
        }
        let has_body = self
            .parameters
            .iter()
            .any(|p| p.in_ == ParameterLocation::Body);
        let has_form = self
            .parameters
            .iter()
            .any(|p| p.in_ == ParameterLocation::FormData);
        if has_body && has_form {
            return Err(Error::invalid(
                OBJECT,
                "body and formData parameters are mutually exclusive",
            ));
        }
        Ok(())
    }
}

/// Operations available on one path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
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
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

impl PathItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the operation for `method`. `TRACE` has no slot in the 2.0 dialect.
    pub fn set_operation(&mut self, method: HttpMethod, operation: Operation) -> Result<()> {
        let slot = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Trace => {
                return Err(Error::invalid(
                    "PathItem",
                    "trace operations are not supported by Swagger 2.0",
                ))
            }
        };
        *slot = Some(operation);
        Ok(())
    }

    /// All operations of this path, in document order.
    pub fn operations(&self) -> Vec<(HttpMethod, &Operation)> {
        [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Head, &self.head),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Patch, &self.patch),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Options, &self.options),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
        .collect()
    }

    pub fn operations_mut(&mut self) -> Vec<&mut Operation> {
        [
            &mut self.get,
            &mut self.head,
            &mut self.post,
            &mut self.put,
            &mut self.patch,
            &mut self.delete,
            &mut self.options,
        ]
        .into_iter()
        .filter_map(Option::as_mut)
        .collect()
    }
}

/// All paths of the API, keyed by URL template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Paths {
    paths: IndexMap<String, PathItem>,
}

impl Paths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, item: PathItem) -> Result<()> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(Error::invalid(
                "Paths",
                format!("path {} must start with /", path),
            ));
        }
        self.paths.insert(path, item);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&PathItem> {
        self.paths.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PathItem)> {
        self.paths.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut PathItem)> {
        self.paths.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Objects stored in the 2.0 reference resolver
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Schema(Schema),
    Parameter(Parameter),
    Response(Response),
}

impl Component {
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Component::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn as_schema_mut(&mut self) -> Option<&mut Schema> {
        match self {
            Component::Schema(schema) => Some(schema),
            _ => None,
        }
    }
}

impl Referenceable for Component {
    fn type_name(&self) -> &'static str {
        match self {
            Component::Schema(_) => "Schema",
            Component::Parameter(_) => "Parameter",
            Component::Response(_) => "Response",
        }
    }
}

/// Everything needed to assemble a [`Swagger`] root object.
pub struct SwaggerParts {
    pub info: Info,
    /// Absolute API URL used for `host` and `schemes`
    pub url: Option<String>,
    /// Common prefix of all paths
    pub prefix: String,
    /// Mount point of the application
    pub script_prefix: String,
    /// Overrides `info.version` when set
    pub version: Option<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub security_definitions: IndexMap<String, SecurityDefinition>,
    pub security: Option<Vec<SecurityRequirement>>,
    pub paths: Paths,
    pub components: ReferenceResolver<Component>,
}

/// Root of a Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swagger {
    pub swagger: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemes: Option<Vec<String>>,
    pub base_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_definitions: IndexMap<String, SecurityDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    pub paths: Paths,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, Schema>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,
    #[serde(flatten)]
    pub extensions: SwaggerDict,
}

/// Split an absolute http(s) URL into `(host[:port], scheme)`.
pub fn split_api_url(api_url: &str) -> Result<(String, String)> {
    let invalid = || {
        Error::invalid(
            "Swagger",
            format!("if given, url must have both schema and netloc: {}", api_url),
        )
    };
    let parsed = url::Url::parse(api_url).map_err(|_| invalid())?;
    let host = parsed.host_str().ok_or_else(invalid)?;
    let netloc = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Ok((netloc, parsed.scheme().to_string()))
}

/// Join the application mount point and the common API prefix into a `basePath`
/// with a leading slash and no trailing slash.
pub fn get_base_path(script_prefix: &str, api_prefix: &str) -> String {
    let script_prefix = script_prefix.strip_suffix('/').unwrap_or(script_prefix);
    let api_prefix = if api_prefix.starts_with('/') {
        api_prefix.to_string()
    } else {
        format!("/{}", api_prefix)
    };
    let mut base_path = format!("{}{}", script_prefix, api_prefix);
    if base_path.ends_with('/') {
        base_path.pop();
    }
    if !base_path.starts_with('/') {
        base_path.insert(0, '/');
    }
    base_path
}

impl Swagger {
    pub fn new(parts: SwaggerParts) -> Result<Self> {
        let SwaggerParts {
            mut info,
            url,
            prefix,
            script_prefix,
            version,
            consumes,
            produces,
            security_definitions,
            security,
            paths,
            mut components,
        } = parts;

        if let Some(version) = version {
            info.version = version;
        }
        info.validate()?;

        let (host, schemes) = match url.as_deref() {
            Some(api_url) => {
                let (host, scheme) = split_api_url(api_url)?;
                (Some(host), Some(vec![scheme]))
            }
            None => (None, None),
        };
        for definition in security_definitions.values() {
            definition.validate()?;
        }

        let definitions = take_components(&mut components, Scope::Definitions, |c| match c {
            Component::Schema(schema) => Some(schema),
            _ => None,
        })?;
        let parameters = take_components(&mut components, Scope::Parameters, |c| match c {
            Component::Parameter(parameter) => Some(parameter),
            _ => None,
        })?;
        let responses = take_components(&mut components, Scope::Responses, |c| match c {
            Component::Response(response) => Some(response),
            _ => None,
        })?;

        let base_path = get_base_path(&script_prefix, &prefix);
        debug!(
            "Assembled Swagger root: basePath={}, {} paths, {} definitions",
            base_path,
            paths.len(),
            definitions.len()
        );

        Ok(Swagger {
            swagger: "2.0".to_string(),
            info,
            host,
            schemes,
            base_path,
            consumes,
            produces,
            security_definitions,
            security,
            paths,
            definitions,
            parameters,
            responses,
            extensions: SwaggerDict::new(),
        })
    }
}

fn take_components<T>(
    components: &mut ReferenceResolver<Component>,
    scope: Scope,
    unwrap: impl Fn(Component) -> Option<T>,
) -> Result<IndexMap<String, T>> {
    if !components.scopes().contains(&scope) {
        return Ok(IndexMap::new());
    }
    let mut taken = IndexMap::new();
    for (name, component) in components.take_scope(scope)? {
        let type_name = component.type_name();
        let value = unwrap(component).ok_or_else(|| {
            Error::reference(format!("#/{}/{} holds a {}", scope, name, type_name))
        })?;
        taken.insert(name, value);
    }
    Ok(taken)
}
