//! Schema-shaped objects: [`Schema`], [`Parameter`], [`Items`] and the attribute bag
//! ([`SwaggerAttrs`]) they are constructed from.
//!
//! Every constructor validates the structural rules of its object type and fails with
//! [`Error::InvalidObject`](crate::error::Error::InvalidObject); there is no way to build
//! a partially valid object through these APIs.

use super::reference::Reference;
use super::swagger_dict::{make_swagger_name, SwaggerDict};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const FORMAT_DATE: &str = "date";
pub const FORMAT_DATETIME: &str = "date-time";
pub const FORMAT_PASSWORD: &str = "password";
pub const FORMAT_BINARY: &str = "binary";
pub const FORMAT_BASE64: &str = "bytes";
pub const FORMAT_FLOAT: &str = "float";
pub const FORMAT_DOUBLE: &str = "double";
pub const FORMAT_INT32: &str = "int32";
pub const FORMAT_INT64: &str = "int64";
pub const FORMAT_EMAIL: &str = "email";
pub const FORMAT_IPV4: &str = "ipv4";
pub const FORMAT_IPV6: &str = "ipv6";
pub const FORMAT_URI: &str = "uri";
pub const FORMAT_UUID: &str = "uuid";
pub const FORMAT_SLUG: &str = "slug";
pub const FORMAT_DECIMAL: &str = "decimal";

/// Value types of the 2.0 dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    String,
    Number,
    Integer,
    Boolean,
    Array,
    File,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::File => "file",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "object" => Some(SchemaType::Object),
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "array" => Some(SchemaType::Array),
            "file" => Some(SchemaType::File),
            _ => None,
        }
    }
}

/// Parameter locations of the 2.0 dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterLocation {
    #[serde(rename = "body")]
    Body,
    #[serde(rename = "path")]
    Path,
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "formData")]
    FormData,
    #[serde(rename = "header")]
    Header,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Body => "body",
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::FormData => "formData",
            ParameterLocation::Header => "header",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "body" => Some(ParameterLocation::Body),
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "formData" | "form" => Some(ParameterLocation::FormData),
            "header" => Some(ParameterLocation::Header),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialization style of array parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    Csv,
    Ssv,
    Tsv,
    Pipes,
    Multi,
}

impl CollectionFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "csv" => Some(CollectionFormat::Csv),
            "ssv" => Some(CollectionFormat::Ssv),
            "tsv" => Some(CollectionFormat::Tsv),
            "pipes" => Some(CollectionFormat::Pipes),
            "multi" => Some(CollectionFormat::Multi),
            _ => None,
        }
    }
}

/// The three object shapes a field can be converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectShape {
    Schema,
    Parameter,
    Items,
}

impl ObjectShape {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectShape::Schema => "Schema",
            ObjectShape::Parameter => "Parameter",
            ObjectShape::Items => "Items",
        }
    }
}

/// A schema or a reference to a named definition
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

    pub fn as_schema_mut(&mut self) -> Option<&mut Schema> {
        match self {
            SchemaOrRef::Schema(schema) => Some(schema),
            SchemaOrRef::Ref(_) => None,
        }
    }

    pub fn as_ref(&self) -> Option<&Reference> {
        match self {
            SchemaOrRef::Ref(reference) => Some(reference),
            SchemaOrRef::Schema(_) => None,
        }
    }

    /// Parse a schema or `$ref` object from its wire representation and validate it.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("$ref").is_some() {
            return Ok(SchemaOrRef::Ref(serde_json::from_value(value)?));
        }
        Ok(SchemaOrRef::Schema(Box::new(Schema::from_value(value)?)))
    }

    pub(crate) fn validate_tree(&self) -> Result<()> {
        match self {
            SchemaOrRef::Schema(schema) => schema.validate_tree(),
            SchemaOrRef::Ref(_) => Ok(()),
        }
    }
}

impl From<Schema> for SchemaOrRef {
    fn from(schema: Schema) -> Self {
        SchemaOrRef::Schema(Box::new(schema))
    }
}

impl From<Reference> for SchemaOrRef {
    fn from(reference: Reference) -> Self {
        SchemaOrRef::Ref(reference)
    }
}

/// Value of `additionalProperties`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

/// The result of converting a field into one of the three shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum SwaggerObject {
    Schema(SchemaOrRef),
    Parameter(Parameter),
    Items(Items),
}

impl SwaggerObject {
    pub fn shape(&self) -> ObjectShape {
        match self {
            SwaggerObject::Schema(_) => ObjectShape::Schema,
            SwaggerObject::Parameter(_) => ObjectShape::Parameter,
            SwaggerObject::Items(_) => ObjectShape::Items,
        }
    }

    pub fn into_schema(self) -> Result<SchemaOrRef> {
        match self {
            SwaggerObject::Schema(schema) => Ok(schema),
            other => Err(Error::invalid(
                "Schema",
                format!("expected a Schema, got {}", other.shape().name()),
            )),
        }
    }

    pub fn into_parameter(self) -> Result<Parameter> {
        match self {
            SwaggerObject::Parameter(parameter) => Ok(parameter),
            other => Err(Error::invalid(
                "Parameter",
                format!("expected a Parameter, got {}", other.shape().name()),
            )),
        }
    }

    pub fn into_items(self) -> Result<Items> {
        match self {
            SwaggerObject::Items(items) => Ok(items),
            other => Err(Error::invalid(
                "Items",
                format!("expected Items, got {}", other.shape().name()),
            )),
        }
    }

    pub fn as_schema(&self) -> Option<&SchemaOrRef> {
        match self {
            SwaggerObject::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    /// The value `type` of the object, if it is not a reference.
    pub fn type_(&self) -> Option<SchemaType> {
        match self {
            SwaggerObject::Schema(SchemaOrRef::Schema(schema)) => Some(schema.type_),
            SwaggerObject::Schema(SchemaOrRef::Ref(_)) => None,
            SwaggerObject::Parameter(parameter) => parameter.type_,
            SwaggerObject::Items(items) => Some(items.type_),
        }
    }
}

fn has_entries(values: &Option<Vec<Value>>) -> bool {
    values.as_ref().map_or(false, |v| !v.is_empty())
}

fn check_type(
    type_: Option<SchemaType>,
    format: &Option<String>,
    enum_: &Option<Vec<Value>>,
    pattern: &Option<String>,
    has_items: bool,
    object: &'static str,
) -> Result<()> {
    if has_items && type_ != Some(SchemaType::Array) {
        return Err(Error::invalid(object, "items can only be used when type is array"));
    }
    if type_ == Some(SchemaType::Array) && !has_items {
        return Err(Error::invalid(object, "TYPE_ARRAY requires the items attribute"));
    }
    if pattern.is_some() && type_ != Some(SchemaType::String) {
        return Err(Error::invalid(object, "pattern can only be used when type is string"));
    }
    let constrained = format.is_some() || has_entries(enum_) || pattern.is_some();
    if constrained && matches!(type_, None | Some(SchemaType::Object) | Some(SchemaType::Array)) {
        return Err(Error::invalid(
            object,
            format!("[format, enum, pattern] can only be applied to primitive {}", object),
        ));
    }
    Ok(())
}

fn reject(object: &'static str, present: bool, attribute: &str) -> Result<()> {
    if present {
        return Err(Error::invalid(
            object,
            format!("{} is not a valid {} attribute", attribute, object),
        ));
    }
    Ok(())
}

/// Keyword-style attribute bag shared by the [`Schema`], [`Parameter`] and [`Items`]
/// constructors.
///
/// Fields map one-to-one onto wire keys; [`SwaggerAttrs::set`] dispatches a semantic
/// attribute name onto the right field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwaggerAttrs {
    pub name: Option<String>,
    pub in_: Option<ParameterLocation>,
    /// Parameter-level `required` flag
    pub required: Option<bool>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub type_: Option<SchemaType>,
    pub format: Option<String>,
    pub enum_: Option<Vec<Value>>,
    pub pattern: Option<String>,
    pub items: Option<Box<SwaggerObject>>,
    pub properties: Option<IndexMap<String, SchemaOrRef>>,
    pub additional_properties: Option<AdditionalProperties>,
    /// Schema-level list of required property names
    pub required_properties: Option<Vec<String>>,
    pub read_only: Option<bool>,
    pub default: Option<Value>,
    pub schema: Option<SchemaOrRef>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: Option<bool>,
    pub collection_format: Option<CollectionFormat>,
    pub extensions: SwaggerDict,
}

macro_rules! overlay_fields {
    ($base:ident, $over:ident, $($field:ident),* $(,)?) => {
        $( if $over.$field.is_some() { $base.$field = $over.$field; } )*
    };
}

fn expect_string(attr: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(Error::invalid(
            "SwaggerAttrs",
            format!("{} must be a string, got {}", attr, other),
        )),
    }
}

fn expect_bool(attr: &str, value: Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        Error::invalid("SwaggerAttrs", format!("{} must be a boolean, got {}", attr, value))
    })
}

fn expect_u64(attr: &str, value: Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        Error::invalid(
            "SwaggerAttrs",
            format!("{} must be a non-negative integer, got {}", attr, value),
        )
    })
}

fn expect_number(attr: &str, value: Value) -> Result<Number> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(Error::invalid(
            "SwaggerAttrs",
            format!("{} must be a number, got {}", attr, other),
        )),
    }
}

impl SwaggerAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(type_: SchemaType) -> Self {
        Self {
            type_: Some(type_),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_items(mut self, items: SwaggerObject) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn with_properties(mut self, properties: IndexMap<String, SchemaOrRef>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_required_properties(mut self, required: Vec<String>) -> Self {
        self.required_properties = Some(required);
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_ = Some(values);
        self
    }

    pub fn with_location(mut self, name: impl Into<String>, in_: ParameterLocation) -> Self {
        self.name = Some(name.into());
        self.in_ = Some(in_);
        self
    }

    /// Returns `self` with every attribute present in `over` replaced by that value.
    pub fn overlay(mut self, over: SwaggerAttrs) -> SwaggerAttrs {
        let extensions = over.extensions.clone();
        overlay_fields!(
            self, over, name, in_, required, title, description, type_, format, enum_,
            pattern, items, properties, additional_properties, required_properties,
            read_only, default, schema, minimum, maximum, min_length, max_length,
            min_items, max_items, unique_items, collection_format,
        );
        let mut merged = extensions;
        merged.merge_missing(&self.extensions);
        self.extensions = merged;
        self
    }

    /// Set an attribute by its semantic name (or wire key). `null` clears it.
    ///
    /// Structured attributes (`items`, `properties`, `schema`) must be set through their
    /// typed fields.
    pub fn set(&mut self, attr: &str, value: Value) -> Result<()> {
        let key = make_swagger_name(attr);
        let value = if value.is_null() { None } else { Some(value) };
        match key.as_str() {
            "name" => self.name = value.map(|v| expect_string(attr, v)).transpose()?,
            "in" => {
                self.in_ = match value {
                    None => None,
                    Some(v) => {
                        let name = expect_string(attr, v)?;
                        Some(ParameterLocation::parse(&name).ok_or_else(|| {
                            Error::invalid("SwaggerAttrs", format!("unknown location {}", name))
                        })?)
                    }
                }
            }
            "required" => match value {
                None => {
                    self.required = None;
                    self.required_properties = None;
                }
                Some(Value::Bool(flag)) => self.required = Some(flag),
                Some(Value::Array(names)) => {
                    let names = names
                        .into_iter()
                        .map(|n| expect_string(attr, n))
                        .collect::<Result<Vec<_>>>()?;
                    self.required_properties = Some(names);
                }
                Some(other) => {
                    return Err(Error::invalid(
                        "SwaggerAttrs",
                        format!("required must be a boolean or a list, got {}", other),
                    ))
                }
            },
            "title" => self.title = value.map(|v| expect_string(attr, v)).transpose()?,
            "description" => {
                self.description = value.map(|v| expect_string(attr, v)).transpose()?
            }
            "type" => {
                self.type_ = match value {
                    None => None,
                    Some(v) => {
                        let name = expect_string(attr, v)?;
                        Some(SchemaType::parse(&name).ok_or_else(|| {
                            Error::invalid("SwaggerAttrs", format!("unknown type {}", name))
                        })?)
                    }
                }
            }
            "format" => self.format = value.map(|v| expect_string(attr, v)).transpose()?,
            "pattern" => self.pattern = value.map(|v| expect_string(attr, v)).transpose()?,
            "enum" => {
                self.enum_ = match value {
                    None => None,
                    Some(Value::Array(values)) => Some(values),
                    Some(other) => {
                        return Err(Error::invalid(
                            "SwaggerAttrs",
                            format!("enum must be a list, got {}", other),
                        ))
                    }
                }
            }
            "default" => self.default = value,
            "readOnly" => self.read_only = value.map(|v| expect_bool(attr, v)).transpose()?,
            "uniqueItems" => {
                self.unique_items = value.map(|v| expect_bool(attr, v)).transpose()?
            }
            "minimum" => self.minimum = value.map(|v| expect_number(attr, v)).transpose()?,
            "maximum" => self.maximum = value.map(|v| expect_number(attr, v)).transpose()?,
            "minLength" => self.min_length = value.map(|v| expect_u64(attr, v)).transpose()?,
            "maxLength" => self.max_length = value.map(|v| expect_u64(attr, v)).transpose()?,
            "minItems" => self.min_items = value.map(|v| expect_u64(attr, v)).transpose()?,
            "maxItems" => self.max_items = value.map(|v| expect_u64(attr, v)).transpose()?,
            "collectionFormat" => {
                self.collection_format = match value {
                    None => None,
                    Some(v) => {
                        let name = expect_string(attr, v)?;
                        Some(CollectionFormat::parse(&name).ok_or_else(|| {
                            Error::invalid(
                                "SwaggerAttrs",
                                format!("unknown collection format {}", name),
                            )
                        })?)
                    }
                }
            }
            "additionalProperties" => {
                self.additional_properties = match value {
                    None => None,
                    Some(Value::Bool(flag)) => Some(AdditionalProperties::Bool(flag)),
                    Some(other) => Some(AdditionalProperties::Schema(Box::new(
                        SchemaOrRef::from_value(other)?,
                    ))),
                }
            }
            "$ref" => return Err(Error::ReferenceImmutable),
            "items" | "properties" | "schema" => {
                return Err(Error::invalid(
                    "SwaggerAttrs",
                    format!("{} must be assigned through its typed field", key),
                ))
            }
            _ => self.extensions.set(attr, value),
        }
        Ok(())
    }

    /// Construct the object of the requested shape from these attributes.
    pub fn into_object(self, shape: ObjectShape) -> Result<SwaggerObject> {
        match shape {
            ObjectShape::Schema => Ok(SwaggerObject::Schema(Schema::new(self)?.into())),
            ObjectShape::Parameter => Ok(SwaggerObject::Parameter(Parameter::new(self)?)),
            ObjectShape::Items => Ok(SwaggerObject::Items(Items::new(self)?)),
        }
    }
}

/// Describes the elements of an array [`Parameter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Items {
    #[serde(rename = "type")]
    pub type_: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Items>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<CollectionFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
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

impl Items {
    pub fn new(attrs: SwaggerAttrs) -> Result<Self> {
        const OBJECT: &str = "Items";
        reject(OBJECT, attrs.name.is_some(), "name")?;
        reject(OBJECT, attrs.in_.is_some(), "in")?;
        reject(OBJECT, attrs.required.is_some(), "required")?;
        reject(OBJECT, attrs.title.is_some(), "title")?;
        reject(OBJECT, attrs.description.is_some(), "description")?;
        reject(OBJECT, attrs.read_only.is_some(), "readOnly")?;
        reject(OBJECT, attrs.schema.is_some(), "schema")?;
        reject(OBJECT, attrs.properties.is_some(), "properties")?;
        reject(OBJECT, attrs.additional_properties.is_some(), "additionalProperties")?;
        reject(OBJECT, attrs.required_properties.is_some(), "required")?;
        let type_ = attrs
            .type_
            .ok_or_else(|| Error::invalid(OBJECT, "type is required!"))?;
        let items = attrs
            .items
            .map(|items| items.into_items().map(Box::new))
            .transpose()?;
        let items = Items {
            type_,
            format: attrs.format,
            enum_: attrs.enum_,
            pattern: attrs.pattern,
            items,
            collection_format: attrs.collection_format,
            default: attrs.default,
            maximum: attrs.maximum,
            minimum: attrs.minimum,
            max_length: attrs.max_length,
            min_length: attrs.min_length,
            max_items: attrs.max_items,
            min_items: attrs.min_items,
            unique_items: attrs.unique_items,
            extensions: attrs.extensions,
        };
        items.validate()?;
        Ok(items)
    }

    pub fn validate(&self) -> Result<()> {
        check_type(
            Some(self.type_),
            &self.format,
            &self.enum_,
            &self.pattern,
            self.items.is_some(),
            "Items",
        )?;
        if let Some(items) = &self.items {
            items.validate()?;
        }
        Ok(())
    }
}

/// A parameter accepted by an operation, unique per `(name, in)`.
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
    pub schema: Option<SchemaOrRef>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<CollectionFormat>,
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

impl Parameter {
    pub fn new(attrs: SwaggerAttrs) -> Result<Self> {
        const OBJECT: &str = "Parameter";
        reject(OBJECT, attrs.title.is_some(), "title")?;
        reject(OBJECT, attrs.read_only.is_some(), "readOnly")?;
        reject(OBJECT, attrs.properties.is_some(), "properties")?;
        reject(OBJECT, attrs.additional_properties.is_some(), "additionalProperties")?;
        reject(OBJECT, attrs.required_properties.is_some(), "required list")?;
        let name = attrs
            .name
            .ok_or_else(|| Error::invalid(OBJECT, "name is required for Parameter"))?;
        let in_ = attrs
            .in_
            .ok_or_else(|| Error::invalid(OBJECT, "in is required for Parameter"))?;
        let items = attrs.items.map(|items| items.into_items()).transpose()?;
        Parameter {
            name,
            in_,
            description: attrs.description,
            required: attrs.required,
            schema: attrs.schema,
            type_: attrs.type_,
            format: attrs.format,
            enum_: attrs.enum_,
            pattern: attrs.pattern,
            items,
            default: attrs.default,
            collection_format: attrs.collection_format,
            maximum: attrs.maximum,
            minimum: attrs.minimum,
            max_length: attrs.max_length,
            min_length: attrs.min_length,
            max_items: attrs.max_items,
            min_items: attrs.min_items,
            unique_items: attrs.unique_items,
            extensions: attrs.extensions,
        }
        .finish()
    }

    /// A required `body` parameter wrapping `schema`.
    pub fn body(name: impl Into<String>, schema: SchemaOrRef) -> Result<Self> {
        let mut attrs = SwaggerAttrs::new().with_location(name, ParameterLocation::Body);
        attrs.required = Some(true);
        attrs.schema = Some(schema);
        Parameter::new(attrs)
    }

    /// Parse a parameter from its wire representation and validate it.
    pub fn from_value(value: Value) -> Result<Self> {
        let parameter: Parameter = serde_json::from_value(value)?;
        if let Some(schema) = &parameter.schema {
            schema.validate_tree()?;
        }
        parameter.finish()
    }

    /// The `(name, in)` pair identifying this parameter within an operation.
    pub fn key(&self) -> (String, ParameterLocation) {
        (self.name.clone(), self.in_)
    }

    fn finish(mut self) -> Result<Self> {
        const OBJECT: &str = "Parameter";
        if self.schema.is_some() == self.type_.is_some() {
            return Err(Error::invalid(
                OBJECT,
                "either schema or type are required for Parameter object (not both)!",
            ));
        }
        if let Some(SchemaOrRef::Schema(schema)) = &mut self.schema {
            schema.remove_read_only();
        }
        if self.in_ == ParameterLocation::Path {
            if self.required == Some(false) {
                return Err(Error::invalid(OBJECT, "path parameter cannot be optional"));
            }
            self.required = Some(true);
        }
        if self.in_ != ParameterLocation::Body && self.schema.is_some() {
            return Err(Error::invalid(
                OBJECT,
                format!("schema can only be applied to a body Parameter, not {}", self.in_),
            ));
        }
        if self.default.is_some() && self.type_.is_none() {
            return Err(Error::invalid(
                OBJECT,
                "default can only be applied to a non-body Parameter",
            ));
        }
        if self.type_ == Some(SchemaType::File) && self.in_ != ParameterLocation::FormData {
            return Err(Error::invalid(
                OBJECT,
                "file parameters can only be used in formData",
            ));
        }
        check_type(
            self.type_,
            &self.format,
            &self.enum_,
            &self.pattern,
            self.items.is_some(),
            OBJECT,
        )?;
        if let Some(items) = &self.items {
            items.validate()?;
        }
        Ok(self)
    }
}

/// A JSON-schema-like description of a value.
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
    pub default: Option<Value>,
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
    pub fn new(attrs: SwaggerAttrs) -> Result<Self> {
        const OBJECT: &str = "Schema";
        if attrs.required.is_some() {
            return Err(Error::invalid(
                OBJECT,
                "the `required` attribute of schema must be an array of required property names, not a boolean!",
            ));
        }
        reject(OBJECT, attrs.name.is_some(), "name")?;
        reject(OBJECT, attrs.in_.is_some(), "in")?;
        reject(OBJECT, attrs.schema.is_some(), "schema")?;
        reject(OBJECT, attrs.collection_format.is_some(), "collectionFormat")?;
        let type_ = attrs
            .type_
            .ok_or_else(|| Error::invalid(OBJECT, "type is required!"))?;
        let items = attrs
            .items
            .map(|items| items.into_schema().map(Box::new))
            .transpose()?;
        let schema = Schema {
            title: attrs.title,
            description: attrs.description,
            required: attrs.required_properties.unwrap_or_default(),
            type_,
            properties: attrs.properties.unwrap_or_default(),
            additional_properties: attrs.additional_properties,
            format: attrs.format,
            enum_: attrs.enum_,
            pattern: attrs.pattern,
            items,
            read_only: attrs.read_only,
            default: attrs.default,
            maximum: attrs.maximum,
            minimum: attrs.minimum,
            max_length: attrs.max_length,
            min_length: attrs.min_length,
            max_items: attrs.max_items,
            min_items: attrs.min_items,
            unique_items: attrs.unique_items,
            extensions: attrs.extensions,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Shorthand for a schema carrying only a type.
    pub fn of_type(type_: SchemaType) -> Result<Self> {
        Schema::new(SwaggerAttrs::of_type(type_))
    }

    /// An array schema with the given item schema.
    pub fn array(items: SchemaOrRef) -> Result<Self> {
        Schema::new(SwaggerAttrs::of_type(SchemaType::Array).with_items(SwaggerObject::Schema(items)))
    }

    /// Parse a schema from its wire representation and validate the whole tree.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("required").map_or(false, Value::is_boolean) {
            return Err(Error::invalid(
                "Schema",
                "the `required` attribute of schema must be an array of required property names, not a boolean!",
            ));
        }
        if value.get("type").is_none() {
            return Err(Error::invalid("Schema", "type is required!"));
        }
        let schema: Schema = serde_json::from_value(value)?;
        schema.validate_tree()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<()> {
        if (!self.properties.is_empty() || self.additional_properties.is_some())
            && self.type_ != SchemaType::Object
        {
            return Err(Error::invalid("Schema", "only object Schema can have properties"));
        }
        check_type(
            Some(self.type_),
            &self.format,
            &self.enum_,
            &self.pattern,
            self.items.is_some(),
            "Schema",
        )
    }

    pub(crate) fn validate_tree(&self) -> Result<()> {
        self.validate()?;
        for property in self.properties.values() {
            property.validate_tree()?;
        }
        if let Some(items) = &self.items {
            items.validate_tree()?;
        }
        if let Some(AdditionalProperties::Schema(extra)) = &self.additional_properties {
            extra.validate_tree()?;
        }
        Ok(())
    }

    /// `readOnly` only applies to schemas nested in another schema's properties.
    pub fn remove_read_only(&mut self) {
        self.read_only = None;
    }

    pub fn is_nullable(&self) -> bool {
        self.extensions.get("x_nullable") == Some(&Value::Bool(true))
    }
}
