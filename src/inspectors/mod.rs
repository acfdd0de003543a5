//! Inspector chains.
//!
//! An inspector converts one kind of descriptor (a field, a serializer, a filter backend,
//! a paginator) into schema objects. Inspectors are consulted in priority order; the
//! first one that returns [`Probe::Handled`] wins, and every inspector that was tried
//! then gets to post-process the result, last tried first.

pub mod field;
pub mod query;
pub mod view;

pub use view::SwaggerAutoSchema;

use crate::descriptor::{
    ContentHandlerDef, DefaultDef, FieldDef, FieldKind, FilterBackendDef, HttpMethod, Overrides,
    PaginatorDef, SerializerDef, ViewDef,
};
use crate::error::{Error, Result};
use crate::openapi::{
    Component, ObjectShape, Parameter, ParameterLocation, ReferenceResolver, Schema, SchemaOrRef,
    SchemaType, SwaggerAttrs, SwaggerObject,
};
use crate::settings::GeneratorSettings;
use crate::type_resolver::TypeResolver;
use log::{debug, warn};
use serde_json::{json, Number, Value};
use std::sync::Arc;

/// Outcome of asking one inspector to handle an object.
///
/// `Handled(None)` and `Handled(vec![])` are legitimate answers and stop the probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    Handled(T),
    NotHandled,
}

impl<T> Probe<T> {
    pub fn is_handled(&self) -> bool {
        matches!(self, Probe::Handled(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Probe::Handled(value) => Probe::Handled(f(value)),
            Probe::NotHandled => Probe::NotHandled,
        }
    }
}

pub trait BaseInspector: Send + Sync {
    /// Registry name of the inspector
    fn name(&self) -> &'static str;
}

/// Converts serializers and their fields.
pub trait FieldInspector: BaseInspector {
    /// Convert a field into an object of the requested shape.
    ///
    /// `Handled(None)` means the field is deliberately left out of the output.
    fn field_to_swagger_object(
        &self,
        _ctx: &mut InspectorContext<'_>,
        _field: FieldRef<'_>,
        _shape: ObjectShape,
        _use_references: bool,
        _overrides: &FieldOverrides,
    ) -> Result<Probe<Option<SwaggerObject>>> {
        Ok(Probe::NotHandled)
    }

    /// Convert a whole serializer into a request or response body schema.
    fn get_schema(
        &self,
        _ctx: &mut InspectorContext<'_>,
        _serializer: &SerializerDef,
    ) -> Result<Probe<Option<SchemaOrRef>>> {
        Ok(Probe::NotHandled)
    }

    /// Convert the writable fields of a serializer into parameters at `in_`.
    fn get_request_parameters(
        &self,
        _ctx: &mut InspectorContext<'_>,
        _serializer: &SerializerDef,
        _in_: ParameterLocation,
    ) -> Result<Probe<Vec<Parameter>>> {
        Ok(Probe::NotHandled)
    }

    /// Post-process the final result of a probe this inspector took part in.
    fn process_result(
        &self,
        _ctx: &mut InspectorContext<'_>,
        _output: FieldOutput<'_>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Contributes query parameters for filter backends.
pub trait FilterInspector: BaseInspector {
    fn get_filter_parameters(
        &self,
        _ctx: &mut InspectorContext<'_>,
        _backend: &FilterBackendDef,
    ) -> Result<Probe<Vec<Parameter>>> {
        Ok(Probe::NotHandled)
    }
}

/// Contributes query parameters and response envelopes for paginators.
pub trait PaginatorInspector: BaseInspector {
    fn get_paginator_parameters(
        &self,
        _ctx: &mut InspectorContext<'_>,
        _paginator: &PaginatorDef,
    ) -> Result<Probe<Vec<Parameter>>> {
        Ok(Probe::NotHandled)
    }

    /// Wrap an array response schema in the paginator's envelope.
    ///
    /// `Handled(None)` means the response is not wrapped.
    fn get_paginated_response(
        &self,
        _ctx: &mut InspectorContext<'_>,
        _paginator: &PaginatorDef,
        _response_schema: &Schema,
    ) -> Result<Probe<Option<Schema>>> {
        Ok(Probe::NotHandled)
    }
}

/// A field together with the name it is declared under.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'f> {
    pub name: &'f str,
    pub def: &'f FieldDef,
}

impl<'f> FieldRef<'f> {
    pub fn new(name: &'f str, def: &'f FieldDef) -> Self {
        Self { name, def }
    }
}

/// Attributes forced onto the converted object regardless of what the inspector built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOverrides {
    pub name: Option<String>,
    pub in_: Option<ParameterLocation>,
    pub read_only: Option<bool>,
}

impl FieldOverrides {
    pub fn parameter(name: impl Into<String>, in_: ParameterLocation) -> Self {
        Self {
            name: Some(name.into()),
            in_: Some(in_),
            read_only: None,
        }
    }

    /// `readOnly: true` for read-only properties, nothing otherwise.
    pub fn property(read_only: bool) -> Self {
        Self {
            read_only: read_only.then_some(true),
            ..Self::default()
        }
    }
}

/// Mutable view of a probe result handed to [`FieldInspector::process_result`].
pub enum FieldOutput<'r> {
    Object(&'r mut Option<SwaggerObject>),
    Schema(&'r mut Option<SchemaOrRef>),
    Parameters(&'r mut Vec<Parameter>),
}

/// Everything an inspector can see while converting one operation.
pub struct InspectorContext<'a> {
    pub view: &'a ViewDef,
    pub path: &'a str,
    pub method: HttpMethod,
    /// Named definitions of the document being generated
    pub components: &'a mut ReferenceResolver<Component>,
    pub catalog: &'a TypeResolver,
    pub settings: &'a GeneratorSettings,
    field_inspectors: Vec<Arc<dyn FieldInspector>>,
    filter_inspectors: Vec<Arc<dyn FilterInspector>>,
    paginator_inspectors: Vec<Arc<dyn PaginatorInspector>>,
    /// Serializers whose fields are being converted, innermost last
    parents: Vec<String>,
}

impl<'a> InspectorContext<'a> {
    /// Build the context of one operation. Inspector names listed in `overrides` are
    /// tried before the configured ones.
    pub fn new(
        view: &'a ViewDef,
        path: &'a str,
        method: HttpMethod,
        components: &'a mut ReferenceResolver<Component>,
        catalog: &'a TypeResolver,
        settings: &'a GeneratorSettings,
        overrides: Option<&Overrides>,
    ) -> Result<Self> {
        let empty = Vec::new();
        let (extra_field, extra_filter, extra_paginator) = match overrides {
            Some(o) => (
                &o.field_inspectors,
                &o.filter_inspectors,
                &o.paginator_inspectors,
            ),
            None => (&empty, &empty, &empty),
        };
        let field_inspectors = chain(extra_field, &settings.field_inspectors)
            .iter()
            .map(|name| field_inspector(name))
            .collect::<Result<Vec<_>>>()?;
        let filter_inspectors = chain(extra_filter, &settings.filter_inspectors)
            .iter()
            .map(|name| filter_inspector(name))
            .collect::<Result<Vec<_>>>()?;
        let paginator_inspectors = chain(extra_paginator, &settings.paginator_inspectors)
            .iter()
            .map(|name| paginator_inspector(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            view,
            path,
            method,
            components,
            catalog,
            settings,
            field_inspectors,
            filter_inspectors,
            paginator_inspectors,
            parents: Vec::new(),
        })
    }

    /// Parsers of the view, or the configured defaults.
    pub fn parser_classes(&self) -> &'a [ContentHandlerDef] {
        let (view, settings): (&'a ViewDef, &'a GeneratorSettings) = (self.view, self.settings);
        match &view.parser_classes {
            Some(parsers) => parsers,
            None => &settings.default_parser_classes,
        }
    }

    /// Renderers of the view, or the configured defaults.
    pub fn renderer_classes(&self) -> &'a [ContentHandlerDef] {
        let (view, settings): (&'a ViewDef, &'a GeneratorSettings) = (self.view, self.settings);
        match &view.renderer_classes {
            Some(renderers) => renderers,
            None => &settings.default_renderer_classes,
        }
    }

    /// The serializer whose fields are currently being converted.
    pub fn parent(&self) -> Option<&'a SerializerDef> {
        let catalog: &'a TypeResolver = self.catalog;
        self.parents
            .last()
            .and_then(|name| catalog.find_serializer(name))
    }

    pub fn is_converting(&self, serializer: &str) -> bool {
        self.parents.iter().any(|name| name == serializer)
    }

    /// Run `f` while `serializer` is the innermost parent.
    pub fn with_parent<T>(
        &mut self,
        serializer: &str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.parents.push(serializer.to_string());
        let result = f(self);
        self.parents.pop();
        result
    }

    /// Convert a field through the field inspector chain.
    pub fn probe_field(
        &mut self,
        field: FieldRef<'_>,
        shape: ObjectShape,
        use_references: bool,
        overrides: &FieldOverrides,
    ) -> Result<Option<SwaggerObject>> {
        let inspectors = self.field_inspectors.clone();
        probe_inspectors(
            self,
            &inspectors,
            "field_to_swagger_object",
            field.name,
            None,
            |inspector, ctx| {
                inspector.field_to_swagger_object(ctx, field, shape, use_references, overrides)
            },
            |inspector, ctx, result| inspector.process_result(ctx, FieldOutput::Object(result)),
        )
    }

    /// Convert a serializer into a body schema.
    pub fn serializer_to_schema(
        &mut self,
        serializer: &SerializerDef,
    ) -> Result<Option<SchemaOrRef>> {
        let inspectors = self.field_inspectors.clone();
        probe_inspectors(
            self,
            &inspectors,
            "get_schema",
            &serializer.name,
            None,
            |inspector, ctx| inspector.get_schema(ctx, serializer),
            |inspector, ctx, result| inspector.process_result(ctx, FieldOutput::Schema(result)),
        )
    }

    /// Convert a serializer into parameters at `in_`.
    pub fn serializer_to_parameters(
        &mut self,
        serializer: &SerializerDef,
        in_: ParameterLocation,
    ) -> Result<Vec<Parameter>> {
        let inspectors = self.field_inspectors.clone();
        probe_inspectors(
            self,
            &inspectors,
            "get_request_parameters",
            &serializer.name,
            Vec::new(),
            |inspector, ctx| inspector.get_request_parameters(ctx, serializer, in_),
            |inspector, ctx, result| {
                inspector.process_result(ctx, FieldOutput::Parameters(result))
            },
        )
    }

    pub fn filter_parameters(&mut self, backend: &FilterBackendDef) -> Result<Vec<Parameter>> {
        let inspectors = self.filter_inspectors.clone();
        probe_inspectors(
            self,
            &inspectors,
            "get_filter_parameters",
            &backend.name,
            Vec::new(),
            |inspector, ctx| inspector.get_filter_parameters(ctx, backend),
            |_, _, _| Ok(()),
        )
    }

    pub fn paginator_parameters(&mut self, paginator: &PaginatorDef) -> Result<Vec<Parameter>> {
        let inspectors = self.paginator_inspectors.clone();
        probe_inspectors(
            self,
            &inspectors,
            "get_paginator_parameters",
            paginator.name.as_deref().unwrap_or("paginator"),
            Vec::new(),
            |inspector, ctx| inspector.get_paginator_parameters(ctx, paginator),
            |_, _, _| Ok(()),
        )
    }

    pub fn paginated_response(
        &mut self,
        paginator: &PaginatorDef,
        response_schema: &Schema,
    ) -> Result<Option<Schema>> {
        let inspectors = self.paginator_inspectors.clone();
        probe_inspectors(
            self,
            &inspectors,
            "get_paginated_response",
            paginator.name.as_deref().unwrap_or("paginator"),
            None,
            |inspector, ctx| inspector.get_paginated_response(ctx, paginator, response_schema),
            |_, _, _| Ok(()),
        )
    }
}

/// Probe `inspectors` in order until one handles the object.
///
/// Falls back to `unhandled` (with a warning) when nobody does. Every inspector that was
/// tried then post-processes the result, in reverse order.
pub fn probe_inspectors<'a, I, T>(
    ctx: &mut InspectorContext<'a>,
    inspectors: &[Arc<I>],
    method: &str,
    subject: &str,
    unhandled: T,
    mut call: impl FnMut(&I, &mut InspectorContext<'a>) -> Result<Probe<T>>,
    mut process: impl FnMut(&I, &mut InspectorContext<'a>, &mut T) -> Result<()>,
) -> Result<T>
where
    I: ?Sized + BaseInspector,
{
    let mut tried = Vec::new();
    let mut handled = None;
    for inspector in inspectors {
        tried.push(inspector);
        if let Probe::Handled(value) = call(inspector, ctx)? {
            debug!("{} handled {} for {}", inspector.name(), method, subject);
            handled = Some(value);
            break;
        }
    }

    let mut result = match handled {
        Some(value) => value,
        None => {
            let names: Vec<&str> = inspectors.iter().map(|i| i.name()).collect();
            warn!(
                "{} ignored because no inspector in {:?} handled it (operation: {})",
                subject, names, method
            );
            unhandled
        }
    };

    for inspector in tried.iter().rev() {
        process(inspector, ctx, &mut result)?;
    }
    Ok(result)
}

fn chain(extra: &[String], defaults: &[String]) -> Vec<String> {
    let mut names = extra.to_vec();
    names.extend(defaults.iter().filter(|name| !extra.contains(name)).cloned());
    names
}

/// Look up a field inspector by its registry name.
pub fn field_inspector(name: &str) -> Result<Arc<dyn FieldInspector>> {
    use field::*;
    let inspector: Arc<dyn FieldInspector> = match name {
        "CamelCaseJSONFilter" => Arc::new(CamelCaseJSONFilter),
        "RecursiveFieldInspector" => Arc::new(RecursiveFieldInspector),
        "ReferencingSerializerInspector" => Arc::new(SerializerInspector::referencing()),
        "InlineSerializerInspector" => Arc::new(SerializerInspector::inline()),
        "RelatedFieldInspector" => Arc::new(RelatedFieldInspector),
        "ChoiceFieldInspector" => Arc::new(ChoiceFieldInspector),
        "FileFieldInspector" => Arc::new(FileFieldInspector),
        "DictFieldInspector" => Arc::new(DictFieldInspector),
        "JSONFieldInspector" => Arc::new(JSONFieldInspector),
        "HiddenFieldInspector" => Arc::new(HiddenFieldInspector),
        "SerializerMethodFieldInspector" => Arc::new(SerializerMethodFieldInspector),
        "SimpleFieldInspector" => Arc::new(SimpleFieldInspector),
        "StringDefaultFieldInspector" => Arc::new(StringDefaultFieldInspector),
        other => {
            return Err(Error::configuration(format!(
                "unknown field inspector {}",
                other
            )))
        }
    };
    Ok(inspector)
}

pub fn filter_inspector(name: &str) -> Result<Arc<dyn FilterInspector>> {
    match name {
        "CoreAPICompatInspector" => Ok(Arc::new(query::CoreAPICompatInspector)),
        other => Err(Error::configuration(format!(
            "unknown filter inspector {}",
            other
        ))),
    }
}

pub fn paginator_inspector(name: &str) -> Result<Arc<dyn PaginatorInspector>> {
    match name {
        "DjangoRestResponsePagination" => Ok(Arc::new(query::DjangoRestResponsePagination)),
        "CoreAPICompatInspector" => Ok(Arc::new(query::CoreAPICompatInspector)),
        other => Err(Error::configuration(format!(
            "unknown paginator inspector {}",
            other
        ))),
    }
}

/// Builds the object of the requested shape for one field, adding the attributes every
/// converted field shares: required flag, default, title, description and nullability.
#[derive(Clone, Copy)]
pub struct SwaggerType<'f> {
    field: FieldRef<'f>,
    shape: ObjectShape,
    overrides: &'f FieldOverrides,
    use_field_title: bool,
}

impl<'f> SwaggerType<'f> {
    pub fn new(field: FieldRef<'f>, shape: ObjectShape, overrides: &'f FieldOverrides) -> Self {
        Self {
            field,
            shape,
            overrides,
            use_field_title: true,
        }
    }

    /// Leave the field label out of the built object.
    pub fn without_title(mut self) -> Self {
        self.use_field_title = false;
        self
    }

    pub fn shape(&self) -> ObjectShape {
        self.shape
    }

    /// Shape of array elements: schemas nest schemas, parameters and items nest items.
    pub fn child_shape(&self) -> ObjectShape {
        match self.shape {
            ObjectShape::Schema => ObjectShape::Schema,
            ObjectShape::Parameter | ObjectShape::Items => ObjectShape::Items,
        }
    }

    pub fn build(&self, settings: &GeneratorSettings, attrs: SwaggerAttrs) -> Result<SwaggerObject> {
        let def = self.field.def;
        let mut base = SwaggerAttrs::new();
        if self.shape == ObjectShape::Parameter {
            base.required = Some(def.is_required());
        }
        if self.shape != ObjectShape::Items {
            base.default = compute_default(self.field, settings);
        }
        if self.use_field_title
            && self.shape == ObjectShape::Schema
            && attrs.type_ != Some(SchemaType::Array)
        {
            base.title = non_empty(&def.label);
        }
        if self.shape != ObjectShape::Items {
            base.description = non_empty(&def.help_text);
        }

        let mut attrs = base.overlay(attrs);
        if def.allow_null {
            attrs.extensions.set("x_nullable", Value::Bool(true));
        }
        if let Some(name) = &self.overrides.name {
            attrs.name = Some(name.clone());
        }
        if let Some(in_) = self.overrides.in_ {
            attrs.in_ = Some(in_);
        }
        if self.shape == ObjectShape::Schema && self.overrides.read_only.is_some() {
            attrs.read_only = self.overrides.read_only;
        }
        attrs.into_object(self.shape)
    }
}

fn non_empty(text: &Option<String>) -> Option<String> {
    text.as_ref().filter(|s| !s.is_empty()).cloned()
}

/// The wire representation of a field's declared default.
///
/// Returns `None` (and logs) when the default cannot be computed or represented.
pub fn compute_default(field: FieldRef<'_>, settings: &GeneratorSettings) -> Option<Value> {
    let value = match field.def.default.as_ref()? {
        DefaultDef::Callable { callable } => match callable.as_str() {
            "list" => json!([]),
            "dict" => json!({}),
            "str" => json!(""),
            "int" => json!(0),
            "float" => json!(0.0),
            "bool" => json!(false),
            other => {
                warn!(
                    "default for {} is callable but {} cannot be called; 'default' will not be set on schema",
                    field.name, other
                );
                return None;
            }
        },
        DefaultDef::Value(Value::Null) => return None,
        DefaultDef::Value(value) => value.clone(),
    };

    if let FieldKind::Decimal { coerce_to_string } = &field.def.kind {
        let coerce = coerce_to_string.unwrap_or(settings.coerce_decimal_to_string);
        return decimal_default(field.name, value, coerce);
    }
    Some(value)
}

fn decimal_default(name: &str, value: Value, coerce: bool) -> Option<Value> {
    match (value, coerce) {
        (Value::Number(n), true) => Some(Value::String(n.to_string())),
        (Value::String(s), false) => match s.parse::<f64>().ok().and_then(Number::from_f64) {
            Some(n) => Some(Value::Number(n)),
            None => {
                warn!(
                    "'default' on schema for {} will not be set because {:?} is not a decimal",
                    name, s
                );
                None
            }
        },
        (value, _) => Some(value),
    }
}
