//! Typed object model of Swagger 2.0 documents.

pub mod document;
pub mod reference;
pub mod schema;
pub mod swagger_dict;

pub use document::{
    get_base_path, Component, Contact, Info, License, OAuth2Flow, Operation, PathItem, Paths,
    Response, Responses, SecurityDefinition, SecurityRequirement, SecurityType, Swagger,
    SwaggerParts,
};
pub use reference::{
    check_references, Reference, ReferenceResolver, Referenceable, Scope, ScopedResolver,
};
pub use schema::{
    AdditionalProperties, CollectionFormat, Items, ObjectShape, Parameter, ParameterLocation,
    Schema, SchemaOrRef, SchemaType, SwaggerAttrs, SwaggerObject,
};
pub use swagger_dict::{make_swagger_name, SwaggerDict};
