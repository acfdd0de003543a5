//! OpenAPI Inspect - Swagger 2.0 / OpenAPI 3.0 documents from REST API descriptors.
//!
//! The library reads a description of a REST API (serializers, models, views and the
//! endpoints routed to them) and derives a complete document from it: request bodies and
//! form parameters, filter and pagination query parameters, typed path parameters,
//! response schemas and shared definitions referenced through `$ref`.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively collects descriptor files from directories
//! 2. [`loader`] - Parses and merges descriptor files into an [`descriptor::ApiDescription`]
//! 3. [`type_resolver`] - Indexes serializers, models and views by name
//! 4. [`inspectors`] - Converts fields, filters, paginators and views through ordered
//!    inspector chains
//! 5. [`openapi`] - The Swagger 2.0 object model and the `$ref` registry
//! 6. [`openapi3`] - The OpenAPI 3.0 object model, lifted from a finished 2.0 document
//! 7. [`generator`] - Folds every endpoint into the root document
//! 8. [`serializer`] - Renders the document as YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_inspect::{
//!     generator::OpenApiSchemaGenerator,
//!     loader::DescriptorLoader,
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//!     settings::GeneratorSettings,
//! };
//! use std::path::PathBuf;
//!
//! let scan_result = FileScanner::new(PathBuf::from("./api")).scan().unwrap();
//! let api = DescriptorLoader::load_files(&scan_result.descriptor_files).unwrap();
//!
//! let settings = GeneratorSettings::default();
//! let generator = OpenApiSchemaGenerator::new(&api, &settings).unwrap();
//! let document = generator.get_schema(None, true).unwrap();
//!
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod cli;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod inspectors;
pub mod loader;
pub mod openapi;
pub mod openapi3;
pub mod scanner;
pub mod serializer;
pub mod settings;
pub mod type_resolver;
