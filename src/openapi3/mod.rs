//! OpenAPI 3.0 object model and the conversion from a 2.0 document.

pub mod convert;
pub mod document;

pub use convert::lift;
pub use document::{
    Component, Components, MediaType, OpenApi, Operation, Parameter, PathItem, RequestBody,
    Response, Responses, Schema, SchemaOrRef, SecurityScheme, Server, ServerVariable, Tag,
    OAS_VERSION,
};
