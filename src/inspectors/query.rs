//! Filter backend and paginator inspectors.

use super::{BaseInspector, FilterInspector, InspectorContext, PaginatorInspector, Probe};
use crate::descriptor::{FilterBackendDef, PaginationStyle, PaginatorDef, QueryFieldDef};
use crate::error::{Error, Result};
use crate::openapi::schema::FORMAT_URI;
use crate::openapi::{Parameter, ParameterLocation, Schema, SchemaOrRef, SchemaType, SwaggerAttrs};
use indexmap::IndexMap;
use serde_json::Value;

// Descriptions of the query parameters each pagination style adds
const PAGE_DESCRIPTION: &str = "A page number within the paginated result set.";
const PAGE_SIZE_DESCRIPTION: &str = "Number of results to return per page.";
const OFFSET_DESCRIPTION: &str = "The initial index from which to return the results.";
const CURSOR_DESCRIPTION: &str = "The pagination cursor value.";

/// Turns the query fields declared by filter backends and paginators into parameters.
pub struct CoreAPICompatInspector;

impl BaseInspector for CoreAPICompatInspector {
    fn name(&self) -> &'static str {
        "CoreAPICompatInspector"
    }
}

impl FilterInspector for CoreAPICompatInspector {
    fn get_filter_parameters(
        &self,
        _ctx: &mut InspectorContext<'_>,
        backend: &FilterBackendDef,
    ) -> Result<Probe<Vec<Parameter>>> {
        let parameters = backend
            .fields
            .iter()
            .map(query_field_to_parameter)
            .collect::<Result<Vec<_>>>()?;
        Ok(Probe::Handled(parameters))
    }
}

impl PaginatorInspector for CoreAPICompatInspector {
    fn get_paginator_parameters(
        &self,
        _ctx: &mut InspectorContext<'_>,
        paginator: &PaginatorDef,
    ) -> Result<Probe<Vec<Parameter>>> {
        let parameters = paginator_fields(paginator)
            .iter()
            .map(query_field_to_parameter)
            .collect::<Result<Vec<_>>>()?;
        Ok(Probe::Handled(parameters))
    }
}

/// Convert one declared query field into a typed parameter.
pub fn query_field_to_parameter(field: &QueryFieldDef) -> Result<Parameter> {
    let in_ = match field.location.as_str() {
        "query" => ParameterLocation::Query,
        "path" => ParameterLocation::Path,
        "form" | "formData" | "body" => ParameterLocation::FormData,
        "header" => ParameterLocation::Header,
        other => {
            return Err(Error::configuration(format!(
                "query field {} has unknown location {}",
                field.name, other
            )))
        }
    };
    let mut attrs = SwaggerAttrs::of_type(SchemaType::String).with_location(&field.name, in_);
    attrs.required = Some(field.required);
    attrs.description = field.description.clone();
    for (key, value) in &field.schema {
        attrs.set(key, value.clone())?;
    }
    Parameter::new(attrs)
}

/// Declared fields of a paginator, or the standard ones of its style.
fn paginator_fields(paginator: &PaginatorDef) -> Vec<QueryFieldDef> {
    if !paginator.fields.is_empty() {
        return paginator.fields.clone();
    }
    let page_size = paginator.page_size_query_param.as_ref().map(|name| {
        QueryFieldDef::new(name.as_str())
            .with_type("integer")
            .with_description(PAGE_SIZE_DESCRIPTION)
    });
    match paginator.style {
        PaginationStyle::PageNumber => {
            let mut fields = vec![QueryFieldDef::new("page")
                .with_type("integer")
                .with_description(PAGE_DESCRIPTION)];
            fields.extend(page_size);
            fields
        }
        PaginationStyle::LimitOffset => vec![
            QueryFieldDef::new("limit")
                .with_type("integer")
                .with_description(PAGE_SIZE_DESCRIPTION),
            QueryFieldDef::new("offset")
                .with_type("integer")
                .with_description(OFFSET_DESCRIPTION),
        ],
        PaginationStyle::Cursor => {
            let mut fields = vec![QueryFieldDef::new("cursor")
                .with_type("string")
                .with_description(CURSOR_DESCRIPTION)];
            fields.extend(page_size);
            fields
        }
        PaginationStyle::Custom => Vec::new(),
    }
}

/// Wraps list responses in the `count`/`next`/`previous`/`results` envelope of the
/// built-in paginators.
pub struct DjangoRestResponsePagination;

impl BaseInspector for DjangoRestResponsePagination {
    fn name(&self) -> &'static str {
        "DjangoRestResponsePagination"
    }
}

impl PaginatorInspector for DjangoRestResponsePagination {
    fn get_paginated_response(
        &self,
        _ctx: &mut InspectorContext<'_>,
        paginator: &PaginatorDef,
        response_schema: &Schema,
    ) -> Result<Probe<Option<Schema>>> {
        if paginator.style == PaginationStyle::Custom {
            return Ok(Probe::Handled(None));
        }
        if response_schema.type_ != SchemaType::Array {
            return Err(Error::generation("array return expected for paged response"));
        }
        let has_count = paginator.style != PaginationStyle::Cursor;

        let mut properties = IndexMap::new();
        if has_count {
            properties.insert("count".to_string(), Schema::of_type(SchemaType::Integer)?.into());
        }
        properties.insert("next".to_string(), nullable_uri()?);
        properties.insert("previous".to_string(), nullable_uri()?);
        properties.insert(
            "results".to_string(),
            SchemaOrRef::from(response_schema.clone()),
        );

        let mut required = Vec::new();
        if has_count {
            required.push("count".to_string());
        }
        required.push("results".to_string());

        let attrs = SwaggerAttrs::of_type(SchemaType::Object)
            .with_properties(properties)
            .with_required_properties(required);
        Ok(Probe::Handled(Some(Schema::new(attrs)?)))
    }
}

fn nullable_uri() -> Result<SchemaOrRef> {
    let mut attrs = SwaggerAttrs::of_type(SchemaType::String).with_format(FORMAT_URI);
    attrs.extensions.set("x_nullable", Value::Bool(true));
    Ok(Schema::new(attrs)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ApiDescription, HttpMethod, ViewDef};
    use crate::openapi::{Component, ReferenceResolver};
    use crate::settings::GeneratorSettings;
    use crate::type_resolver::TypeResolver;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn with_context<T>(f: impl FnOnce(&mut InspectorContext<'_>) -> T) -> T {
        let catalog = TypeResolver::new(&ApiDescription::default()).unwrap();
        let settings = GeneratorSettings::default();
        let view = ViewDef::new("ListView");
        let mut components: ReferenceResolver<Component> = ReferenceResolver::swagger();
        let mut ctx = InspectorContext::new(
            &view,
            "/items/",
            HttpMethod::Get,
            &mut components,
            &catalog,
            &settings,
            None,
        )
        .unwrap();
        f(&mut ctx)
    }

    fn paginator(style: PaginationStyle) -> PaginatorDef {
        PaginatorDef {
            name: None,
            style,
            fields: Vec::new(),
            page_size_query_param: None,
        }
    }

    #[test]
    fn test_query_field_attributes() {
        let field: QueryFieldDef = serde_yaml::from_str(
            r#"
name: ordering
description: Which field to use when ordering the results.
enum: [name, -name]
"#,
        )
        .unwrap();
        let parameter = query_field_to_parameter(&field).unwrap();
        assert_eq!(
            serde_json::to_value(parameter).unwrap(),
            json!({
                "name": "ordering",
                "in": "query",
                "description": "Which field to use when ordering the results.",
                "required": false,
                "type": "string",
                "enum": ["name", "-name"]
            })
        );

        let mut cookie = QueryFieldDef::new("session");
        cookie.location = "cookie".to_string();
        assert!(matches!(
            query_field_to_parameter(&cookie),
            Err(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_builtin_paginator_parameters() {
        let mut page_number = paginator(PaginationStyle::PageNumber);
        page_number.page_size_query_param = Some("page_size".to_string());
        let names = |p: &PaginatorDef| -> Vec<String> {
            with_context(|ctx| ctx.paginator_parameters(p))
                .unwrap()
                .into_iter()
                .map(|param| param.name)
                .collect()
        };
        assert_eq!(names(&page_number), vec!["page", "page_size"]);
        assert_eq!(
            names(&paginator(PaginationStyle::LimitOffset)),
            vec!["limit", "offset"]
        );
        assert_eq!(names(&paginator(PaginationStyle::Cursor)), vec!["cursor"]);
        assert!(names(&paginator(PaginationStyle::Custom)).is_empty());

        let limit_offset = with_context(|ctx| {
            ctx.paginator_parameters(&paginator(PaginationStyle::LimitOffset))
        })
        .unwrap();
        let descriptions: Vec<Option<&str>> = limit_offset
            .iter()
            .map(|param| param.description.as_deref())
            .collect();
        assert_eq!(
            descriptions,
            vec![Some(PAGE_SIZE_DESCRIPTION), Some(OFFSET_DESCRIPTION)]
        );
    }

    #[test]
    fn test_paginated_envelope() {
        let results = Schema::array(Schema::of_type(SchemaType::String).unwrap().into()).unwrap();
        let envelope = with_context(|ctx| {
            ctx.paginated_response(&paginator(PaginationStyle::PageNumber), &results)
        })
        .unwrap()
        .unwrap();
        assert_eq!(
            serde_json::to_value(envelope).unwrap(),
            json!({
                "required": ["count", "results"],
                "type": "object",
                "properties": {
                    "count": {"type": "integer"},
                    "next": {"type": "string", "format": "uri", "x-nullable": true},
                    "previous": {"type": "string", "format": "uri", "x-nullable": true},
                    "results": {"type": "array", "items": {"type": "string"}}
                }
            })
        );

        let cursor = with_context(|ctx| {
            ctx.paginated_response(&paginator(PaginationStyle::Cursor), &results)
        })
        .unwrap()
        .unwrap();
        assert_eq!(cursor.required, vec!["results".to_string()]);
        assert!(!cursor.properties.contains_key("count"));
    }

    #[test]
    fn test_paged_response_must_be_an_array() {
        let object = Schema::of_type(SchemaType::Object).unwrap();
        let result = with_context(|ctx| {
            ctx.paginated_response(&paginator(PaginationStyle::LimitOffset), &object)
        });
        assert!(matches!(result, Err(Error::GenerationError(_))));

        let custom = with_context(|ctx| {
            ctx.paginated_response(&paginator(PaginationStyle::Custom), &object)
        })
        .unwrap();
        assert_eq!(custom, None);
    }
}
