//! Lifts a finished 2.0 document into the 3.0 object family.

use super::document::{
    AdditionalProperties, Component, Components, Content, MediaType, OAuthFlow, OAuthFlows,
    OpenApi, Operation, Parameter, ParameterLocation, ParameterStyle, PathItem, RequestBody,
    Response, Responses, Schema, SchemaOrRef, SchemaType, SecurityScheme, SecuritySchemeType,
    Server, OAS_VERSION,
};
use crate::error::{Error, Result};
use crate::openapi::{self, check_references, Reference, ReferenceResolver, Scope};
use indexmap::IndexMap;
use log::debug;

const DEFAULT_BODY_MEDIA_TYPE: &str = "application/json";
const DEFAULT_FORM_MEDIA_TYPE: &str = "multipart/form-data";

/// Convert `swagger` into an equivalent OpenAPI 3.0 document.
///
/// Every rewritten `$ref` is checked against the `components` registry built along the way.
pub fn lift(swagger: openapi::Swagger) -> Result<OpenApi> {
    let mut lifter = Lifter {
        components: ReferenceResolver::components(),
        verify: false,
    };

    // Definitions may point at each other, so register all of them before verifying.
    let mut schemas = Vec::with_capacity(swagger.definitions.len());
    for (name, schema) in swagger.definitions {
        schemas.push((name, lifter.schema(schema)?));
    }
    for (name, schema) in schemas {
        lifter
            .components
            .set(Scope::Schemas, &name, Component::Schema(schema))?;
    }
    lifter.verify = true;

    for (name, parameter) in swagger.parameters {
        match parameter.in_ {
            openapi::ParameterLocation::Body | openapi::ParameterLocation::FormData => {
                let body = lifter.request_body(&[parameter], &swagger.consumes)?;
                lifter
                    .components
                    .set(Scope::RequestBodies, &name, Component::RequestBody(body))?;
            }
            _ => {
                let parameter = lifter.parameter(parameter)?;
                lifter
                    .components
                    .set(Scope::Parameters, &name, Component::Parameter(parameter))?;
            }
        }
    }
    for (name, response) in swagger.responses {
        let response = lifter.response(response, &swagger.produces)?;
        lifter
            .components
            .set(Scope::Responses, &name, Component::Response(response))?;
    }
    for (name, definition) in swagger.security_definitions {
        let scheme = security_scheme(definition)?;
        lifter
            .components
            .set(Scope::SecuritySchemes, &name, Component::SecurityScheme(scheme))?;
    }

    let mut paths = IndexMap::new();
    for (path, item) in swagger.paths.iter() {
        let mut lifted = PathItem::default();
        for parameter in &item.parameters {
            lifted.parameters.push(lifter.parameter(parameter.clone())?);
        }
        for (method, operation) in item.operations() {
            let operation = lifter.operation(operation.clone(), &swagger.consumes, &swagger.produces)?;
            lifted.set_operation(method, operation);
        }
        lifted.extensions = item.extensions.clone();
        paths.insert(path.clone(), lifted);
    }

    let origin = match (&swagger.host, swagger.schemes.as_ref().and_then(|s| s.first())) {
        (Some(host), Some(scheme)) => format!("{}://{}", scheme, host),
        _ => String::new(),
    };
    let servers = vec![Server::new(format!("{}{}", origin, swagger.base_path))];

    let components = Components::from_resolver(&mut lifter.components)?;
    let document = OpenApi {
        openapi: OAS_VERSION.to_string(),
        info: swagger.info,
        servers,
        paths,
        components,
        security: swagger.security.unwrap_or_default(),
        tags: Vec::new(),
        extensions: swagger.extensions,
    };
    check_references(&serde_json::to_value(&document)?)?;
    debug!(
        "Lifted document with {} paths and {} schemas",
        document.paths.len(),
        document.components.schemas.len()
    );
    Ok(document)
}

struct Lifter {
    components: ReferenceResolver<Component>,
    verify: bool,
}

impl Lifter {
    fn reference(&self, reference: &Reference) -> Result<Reference> {
        let (scope, name) = reference
            .target()
            .ok_or_else(|| Error::reference(format!("{} is not a valid reference", reference.pointer())))?;
        if scope != Scope::Definitions.as_str() {
            return Err(Error::reference(format!(
                "cannot lift reference {} into components",
                reference.pointer()
            )));
        }
        if self.verify {
            Reference::schema(&self.components, name, false)
        } else {
            Ok(Reference::from_pointer(
                self.components.pointer(Scope::Schemas, name),
            ))
        }
    }

    fn schema_or_ref(&self, schema: openapi::SchemaOrRef) -> Result<SchemaOrRef> {
        match schema {
            openapi::SchemaOrRef::Ref(reference) => Ok(SchemaOrRef::Ref(self.reference(&reference)?)),
            openapi::SchemaOrRef::Schema(schema) => Ok(self.schema(*schema)?.into()),
        }
    }

    fn schema(&self, schema: openapi::Schema) -> Result<Schema> {
        let (type_, format) = lift_type(schema.type_, schema.format);
        let mut extensions = schema.extensions;
        let nullable = extensions
            .remove("x_nullable")
            .and_then(|v| v.as_bool())
            .filter(|nullable| *nullable);
        let mut properties = IndexMap::new();
        for (name, property) in schema.properties {
            properties.insert(name, self.schema_or_ref(property)?);
        }
        let additional_properties = match schema.additional_properties {
            None => None,
            Some(openapi::AdditionalProperties::Bool(flag)) => Some(AdditionalProperties::Bool(flag)),
            Some(openapi::AdditionalProperties::Schema(extra)) => Some(
                AdditionalProperties::Schema(Box::new(self.schema_or_ref(*extra)?)),
            ),
        };
        let items = schema
            .items
            .map(|items| self.schema_or_ref(*items).map(Box::new))
            .transpose()?;
        let lifted = Schema {
            title: schema.title,
            description: schema.description,
            required: schema.required,
            type_,
            properties,
            additional_properties,
            format,
            enum_: schema.enum_,
            pattern: schema.pattern,
            items,
            read_only: schema.read_only,
            write_only: None,
            nullable,
            deprecated: None,
            default: schema.default,
            example: None,
            maximum: schema.maximum,
            minimum: schema.minimum,
            max_length: schema.max_length,
            min_length: schema.min_length,
            max_items: schema.max_items,
            min_items: schema.min_items,
            unique_items: schema.unique_items,
            extensions,
        };
        lifted.validate()?;
        Ok(lifted)
    }

    fn items(&self, items: openapi::Items) -> Result<Schema> {
        let (type_, format) = lift_type(items.type_, items.format);
        let mut schema = Schema::of_type(type_);
        schema.format = format;
        schema.enum_ = items.enum_;
        schema.pattern = items.pattern;
        schema.items = items
            .items
            .map(|inner| self.items(*inner).map(|s| Box::new(SchemaOrRef::from(s))))
            .transpose()?;
        schema.default = items.default;
        schema.maximum = items.maximum;
        schema.minimum = items.minimum;
        schema.max_length = items.max_length;
        schema.min_length = items.min_length;
        schema.max_items = items.max_items;
        schema.min_items = items.min_items;
        schema.unique_items = items.unique_items;
        schema.extensions = items.extensions;
        schema.validate()?;
        Ok(schema)
    }

    /// The schema of a typed (non-body) parameter.
    fn parameter_schema(&self, parameter: &openapi::Parameter) -> Result<Schema> {
        let type_ = parameter.type_.ok_or_else(|| {
            Error::invalid("Parameter", format!("{} has no type", parameter.name))
        })?;
        let (type_, format) = lift_type(type_, parameter.format.clone());
        let mut schema = Schema::of_type(type_);
        schema.format = format;
        schema.enum_ = parameter.enum_.clone();
        schema.pattern = parameter.pattern.clone();
        schema.items = parameter
            .items
            .clone()
            .map(|items| self.items(items).map(|s| Box::new(SchemaOrRef::from(s))))
            .transpose()?;
        schema.default = parameter.default.clone();
        schema.maximum = parameter.maximum.clone();
        schema.minimum = parameter.minimum.clone();
        schema.max_length = parameter.max_length;
        schema.min_length = parameter.min_length;
        schema.max_items = parameter.max_items;
        schema.min_items = parameter.min_items;
        schema.unique_items = parameter.unique_items;
        if parameter.extensions.get("x_nullable") == Some(&serde_json::Value::Bool(true)) {
            schema.nullable = Some(true);
        }
        schema.validate()?;
        Ok(schema)
    }

    fn parameter(&self, parameter: openapi::Parameter) -> Result<Parameter> {
        let in_ = match parameter.in_ {
            openapi::ParameterLocation::Path => ParameterLocation::Path,
            openapi::ParameterLocation::Query => ParameterLocation::Query,
            openapi::ParameterLocation::Header => ParameterLocation::Header,
            other => {
                return Err(Error::invalid(
                    "Parameter",
                    format!("{} parameters become part of the request body", other),
                ))
            }
        };
        let schema = self.parameter_schema(&parameter)?;
        let mut lifted = Parameter::new(parameter.name, in_, schema.into());
        lifted.description = parameter.description;
        lifted.required = parameter.required;
        match (parameter.collection_format, in_) {
            (Some(openapi::CollectionFormat::Multi), ParameterLocation::Query) => {
                lifted.style = Some(ParameterStyle::Form);
                lifted.explode = Some(true);
            }
            (Some(openapi::CollectionFormat::Csv), ParameterLocation::Query) => {
                lifted.style = Some(ParameterStyle::Form);
                lifted.explode = Some(false);
            }
            (Some(openapi::CollectionFormat::Ssv), ParameterLocation::Query) => {
                lifted.style = Some(ParameterStyle::SpaceDelimited);
            }
            (Some(openapi::CollectionFormat::Pipes), ParameterLocation::Query) => {
                lifted.style = Some(ParameterStyle::PipeDelimited);
            }
            _ => {}
        }
        let mut extensions = parameter.extensions;
        extensions.remove("x_nullable");
        lifted.extensions = extensions;
        lifted.finish()
    }

    /// Fold `body` or `formData` parameters into one request body.
    fn request_body(
        &self,
        parameters: &[openapi::Parameter],
        consumes: &[String],
    ) -> Result<RequestBody> {
        let is_form = parameters
            .iter()
            .any(|p| p.in_ == openapi::ParameterLocation::FormData);
        let (schema, description, required) = if is_form {
            let mut object = Schema::of_type(SchemaType::Object);
            for parameter in parameters {
                let mut property = self.parameter_schema(parameter)?;
                property.description = parameter.description.clone();
                object
                    .properties
                    .insert(parameter.name.clone(), property.into());
                if parameter.required == Some(true) {
                    object.required.push(parameter.name.clone());
                }
            }
            let required = !object.required.is_empty();
            (SchemaOrRef::from(object), None, required)
        } else {
            let body = parameters
                .first()
                .ok_or_else(|| Error::generation("request body without a body parameter"))?;
            let schema = body
                .schema
                .clone()
                .ok_or_else(|| Error::invalid("Parameter", "body parameter has no schema"))?;
            (
                self.schema_or_ref(schema)?,
                body.description.clone(),
                body.required.unwrap_or(false),
            )
        };

        let fallback = if is_form {
            DEFAULT_FORM_MEDIA_TYPE
        } else {
            DEFAULT_BODY_MEDIA_TYPE
        };
        let media_types: Vec<String> = if consumes.is_empty() {
            vec![fallback.to_string()]
        } else {
            consumes.to_vec()
        };
        let content: Content = media_types
            .into_iter()
            .map(|media_type| (media_type, MediaType::new(schema.clone())))
            .collect();
        Ok(RequestBody {
            content,
            description,
            required: Some(required),
            extensions: Default::default(),
        })
    }

    fn response(&self, response: openapi::Response, produces: &[String]) -> Result<Response> {
        let content = match response.schema {
            None => None,
            Some(schema) => {
                let schema = self.schema_or_ref(schema)?;
                let mut content = Content::new();
                for media_type in produces {
                    let mut lifted = MediaType::new(schema.clone());
                    lifted.example = response
                        .examples
                        .as_ref()
                        .and_then(|examples| examples.get(media_type).cloned());
                    content.insert(media_type.clone(), lifted);
                }
                Some(content)
            }
        };
        Ok(Response {
            description: response.description,
            content,
            extensions: response.extensions,
        })
    }

    fn operation(
        &self,
        operation: openapi::Operation,
        consumes: &[String],
        produces: &[String],
    ) -> Result<Operation> {
        let consumes = operation.consumes.as_deref().unwrap_or(consumes);
        let produces = operation.produces.as_deref().unwrap_or(produces);
        let (body, rest): (Vec<_>, Vec<_>) = operation.parameters.into_iter().partition(|p| {
            matches!(
                p.in_,
                openapi::ParameterLocation::Body | openapi::ParameterLocation::FormData
            )
        });
        let request_body = if body.is_empty() {
            None
        } else {
            Some(self.request_body(&body, consumes)?)
        };
        let parameters = rest
            .into_iter()
            .map(|p| self.parameter(p))
            .collect::<Result<Vec<_>>>()?;

        let mut responses = Responses::default();
        for (status, response) in operation.responses.iter() {
            responses
                .responses
                .insert(status.clone(), self.response(response.clone(), produces)?);
        }
        if let Some(default) = operation.responses.default {
            responses.default = Some(self.response(default, produces)?);
        }

        Ok(Operation {
            operation_id: operation.operation_id,
            summary: operation.summary,
            description: operation.description,
            tags: operation.tags,
            parameters,
            request_body,
            responses,
            deprecated: operation.deprecated,
            security: operation.security,
            servers: None,
            extensions: operation.extensions,
        })
    }
}

fn lift_type(type_: openapi::SchemaType, format: Option<String>) -> (SchemaType, Option<String>) {
    let lifted = match type_ {
        openapi::SchemaType::Object => SchemaType::Object,
        openapi::SchemaType::String => SchemaType::String,
        openapi::SchemaType::Number => SchemaType::Number,
        openapi::SchemaType::Integer => SchemaType::Integer,
        openapi::SchemaType::Boolean => SchemaType::Boolean,
        openapi::SchemaType::Array => SchemaType::Array,
        openapi::SchemaType::File => {
            return (
                SchemaType::String,
                Some(format.unwrap_or_else(|| openapi::schema::FORMAT_BINARY.to_string())),
            )
        }
    };
    (lifted, format)
}

fn security_scheme(definition: openapi::SecurityDefinition) -> Result<SecurityScheme> {
    let mut scheme = match definition.type_ {
        openapi::SecurityType::Basic => {
            let mut scheme = SecurityScheme::new(SecuritySchemeType::Http);
            scheme.scheme = Some("basic".to_string());
            scheme
        }
        openapi::SecurityType::ApiKey => {
            let mut scheme = SecurityScheme::new(SecuritySchemeType::ApiKey);
            scheme.name = definition.name;
            scheme.in_ = match definition.in_.as_deref() {
                Some("query") => Some(ParameterLocation::Query),
                Some("header") => Some(ParameterLocation::Header),
                Some("cookie") => Some(ParameterLocation::Cookie),
                _ => None,
            };
            scheme
        }
        openapi::SecurityType::OAuth2 => {
            let flow = OAuthFlow {
                authorization_url: definition.authorization_url,
                token_url: definition.token_url,
                refresh_url: None,
                scopes: definition.scopes.unwrap_or_default(),
            };
            let mut flows = OAuthFlows::default();
            match definition.flow {
                Some(openapi::OAuth2Flow::Implicit) => flows.implicit = Some(flow),
                Some(openapi::OAuth2Flow::Password) => flows.password = Some(flow),
                Some(openapi::OAuth2Flow::Application) => flows.client_credentials = Some(flow),
                Some(openapi::OAuth2Flow::AccessCode) => flows.authorization_code = Some(flow),
                None => return Err(Error::invalid("SecurityDefinition", "oauth2 requires flow")),
            }
            let mut scheme = SecurityScheme::new(SecuritySchemeType::OAuth2);
            scheme.flows = Some(flows);
            scheme
        }
    };
    scheme.description = definition.description;
    scheme.extensions = definition.extensions;
    scheme.validate()?;
    Ok(scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::HttpMethod;
    use crate::openapi::{
        Info, ParameterLocation as Location, Paths, SchemaType as Type, SecurityDefinition,
        SwaggerAttrs, SwaggerObject, SwaggerParts,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn swagger_with(operation: openapi::Operation, definitions: Vec<(&str, openapi::Schema)>) -> openapi::Swagger {
        let mut components = ReferenceResolver::swagger();
        for (name, schema) in definitions {
            components
                .set(Scope::Definitions, name, openapi::Component::Schema(schema))
                .unwrap();
        }
        let mut item = openapi::PathItem::new();
        item.set_operation(HttpMethod::Post, operation).unwrap();
        let mut paths = Paths::new();
        paths.insert("/pets/", item).unwrap();
        openapi::Swagger::new(SwaggerParts {
            info: Info::new("Pets", "v1").unwrap(),
            url: Some("https://pets.example.com".to_string()),
            prefix: "/api".to_string(),
            script_prefix: "/".to_string(),
            version: None,
            consumes: vec!["application/json".to_string()],
            produces: vec!["application/json".to_string()],
            security_definitions: IndexMap::from([("basic".to_string(), SecurityDefinition::basic())]),
            security: Some(vec![IndexMap::from([("basic".to_string(), vec![])])]),
            paths,
            components,
        })
        .unwrap()
    }

    fn pet_schema() -> openapi::Schema {
        let mut name = openapi::Schema::of_type(Type::String).unwrap();
        name.extensions.set("x_nullable", json!(true));
        openapi::Schema::new(
            SwaggerAttrs::of_type(Type::Object)
                .with_properties(IndexMap::from([("name".to_string(), name.into())])),
        )
        .unwrap()
    }

    #[test]
    fn test_body_parameter_becomes_request_body() {
        let body = openapi::Parameter::body(
            "data",
            openapi::SchemaOrRef::Ref(Reference::from_pointer("#/definitions/Pet")),
        )
        .unwrap();
        let mut responses = openapi::Responses::new();
        responses.insert(
            "201",
            openapi::Response::new(
                "",
                Some(openapi::SchemaOrRef::Ref(Reference::from_pointer("#/definitions/Pet"))),
            ),
        );
        let operation = openapi::Operation::new("pets_create", responses, vec![body]).unwrap();
        let document = lift(swagger_with(operation, vec![("Pet", pet_schema())])).unwrap();
        let value = serde_json::to_value(&document).unwrap();

        assert_eq!(value["openapi"], json!("3.0.1"));
        assert_eq!(value["servers"], json!([{"url": "https://pets.example.com/api"}]));
        let post = &value["paths"]["/pets/"]["post"];
        assert_eq!(
            post["requestBody"],
            json!({
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}},
                "required": true
            })
        );
        assert!(post.get("parameters").is_none());
        assert_eq!(
            post["responses"]["201"]["content"]["application/json"]["schema"],
            json!({"$ref": "#/components/schemas/Pet"})
        );
        assert_eq!(
            value["components"]["schemas"]["Pet"]["properties"]["name"],
            json!({"type": "string", "nullable": true})
        );
        assert_eq!(
            value["components"]["securitySchemes"]["basic"],
            json!({"type": "http", "scheme": "basic"})
        );
    }

    #[test]
    fn test_form_parameters_become_object_body() {
        let mut upload = SwaggerAttrs::of_type(Type::File).with_location("upload", Location::FormData);
        upload.required = Some(true);
        let title = SwaggerAttrs::of_type(Type::String).with_location("title", Location::FormData);
        let limit = SwaggerAttrs::of_type(Type::Integer).with_location("limit", Location::Query);
        let parameters = vec![
            openapi::Parameter::new(upload).unwrap(),
            openapi::Parameter::new(title).unwrap(),
            openapi::Parameter::new(limit).unwrap(),
        ];
        let mut operation =
            openapi::Operation::new("pets_upload", openapi::Responses::new(), parameters).unwrap();
        operation.consumes = Some(vec!["multipart/form-data".to_string()]);
        let document = lift(swagger_with(operation, vec![])).unwrap();
        let post = document.paths["/pets/"].post.as_ref().unwrap();

        assert_eq!(post.parameters.len(), 1);
        assert_eq!(post.parameters[0].name, "limit");
        let body = serde_json::to_value(post.request_body.as_ref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "content": {"multipart/form-data": {"schema": {
                    "required": ["upload"],
                    "type": "object",
                    "properties": {
                        "upload": {"type": "string", "format": "binary"},
                        "title": {"type": "string"}
                    }
                }}},
                "required": true
            })
        );
    }

    #[test]
    fn test_dangling_reference_is_rejected() {
        let body = openapi::Parameter::body(
            "data",
            openapi::SchemaOrRef::Ref(Reference::from_pointer("#/definitions/Missing")),
        )
        .unwrap();
        let operation =
            openapi::Operation::new("pets_create", openapi::Responses::new(), vec![body]).unwrap();
        let err = lift(swagger_with(operation, vec![])).unwrap_err();
        assert!(err.to_string().contains("#/components/schemas/Missing"), "{}", err);
    }

    #[test]
    fn test_array_query_parameter_style() {
        let items = SwaggerObject::Items(openapi::Items::new(SwaggerAttrs::of_type(Type::String)).unwrap());
        let mut attrs = SwaggerAttrs::of_type(Type::Array)
            .with_items(items)
            .with_location("tags", Location::Query);
        attrs.collection_format = Some(openapi::CollectionFormat::Multi);
        let lifter = Lifter {
            components: ReferenceResolver::components(),
            verify: true,
        };
        let lifted = lifter.parameter(openapi::Parameter::new(attrs).unwrap()).unwrap();
        assert_eq!(lifted.style, Some(ParameterStyle::Form));
        assert_eq!(lifted.explode, Some(true));
        assert_eq!(
            serde_json::to_value(lifted.schema.unwrap()).unwrap(),
            json!({"type": "array", "items": {"type": "string"}})
        );
    }
}
