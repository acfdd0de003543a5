//! Field inspectors and the type tables they share.

use super::{
    BaseInspector, FieldInspector, FieldOutput, FieldOverrides, FieldRef, InspectorContext, Probe,
    SwaggerType,
};
use crate::descriptor::{
    FieldDef, FieldKind, ModelFieldDef, ModelFieldKind, SerializerDef, TypeHint, ValidatorDef,
};
use crate::error::{Error, Result};
use crate::openapi::schema::{
    FORMAT_BINARY, FORMAT_DATE, FORMAT_DATETIME, FORMAT_DECIMAL, FORMAT_EMAIL, FORMAT_IPV4,
    FORMAT_IPV6, FORMAT_SLUG, FORMAT_URI, FORMAT_UUID,
};
use crate::openapi::{
    AdditionalProperties, CollectionFormat, Component, ObjectShape, Parameter, ParameterLocation,
    Reference, ReferenceResolver, Schema, SchemaOrRef, SchemaType, SwaggerAttrs, SwaggerObject,
};
use crate::settings::GeneratorSettings;
use heck::ToLowerCamelCase;
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::{Number, Value};
use std::collections::HashSet;

type Converted = Result<Probe<Option<SwaggerObject>>>;

/// Pattern Django attaches to slug fields
const SLUG_PATTERN: &str = r"^[-a-zA-Z0-9_]+\Z";

fn handled(object: SwaggerObject) -> Converted {
    Ok(Probe::Handled(Some(object)))
}

/// Rewrites property names to camelCase when the view speaks camelCase JSON.
///
/// Runs on the final result of every probe, so definitions reached through references are
/// rewritten in place as well.
pub struct CamelCaseJSONFilter;

impl CamelCaseJSONFilter {
    /// Whether any parser or renderer of the view is a camelCase one.
    pub fn is_camel_case(ctx: &InspectorContext<'_>) -> bool {
        ctx.parser_classes()
            .iter()
            .chain(ctx.renderer_classes())
            .any(|handler| handler.name.contains("CamelCase"))
    }
}

impl BaseInspector for CamelCaseJSONFilter {
    fn name(&self) -> &'static str {
        "CamelCaseJSONFilter"
    }
}

impl FieldInspector for CamelCaseJSONFilter {
    fn process_result(&self, ctx: &mut InspectorContext<'_>, output: FieldOutput<'_>) -> Result<()> {
        if !Self::is_camel_case(ctx) {
            return Ok(());
        }
        let schema = match output {
            FieldOutput::Object(Some(SwaggerObject::Schema(schema))) => schema,
            FieldOutput::Schema(Some(schema)) => schema,
            _ => return Ok(()),
        };
        camelize_schema(ctx.components, schema)
    }
}

/// Camelize property names and `required` lists of `schema` and of every committed
/// definition it reaches through its properties.
pub(crate) fn camelize_schema(
    components: &mut ReferenceResolver<Component>,
    schema: &mut SchemaOrRef,
) -> Result<()> {
    let scope = components.schema_scope()?;
    let mut pending = Vec::new();
    match schema {
        SchemaOrRef::Schema(inline) => camelize_properties(inline, &mut pending),
        SchemaOrRef::Ref(reference) => pending.extend(definition_name(reference)),
    }

    let mut visited = HashSet::new();
    while let Some(name) = pending.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        // definitions still under construction are rewritten once their probe finishes
        if !components.has(scope, &name)? {
            continue;
        }
        if let Some(definition) = components.get_mut(scope, &name)?.as_schema_mut() {
            camelize_properties(definition, &mut pending);
        }
    }
    Ok(())
}

fn definition_name(reference: &Reference) -> Option<String> {
    reference.target().map(|(_, name)| name.to_string())
}

fn camelize_properties(schema: &mut Schema, pending: &mut Vec<String>) {
    if schema.properties.is_empty() {
        return;
    }
    let properties = std::mem::take(&mut schema.properties);
    schema.properties = properties
        .into_iter()
        .map(|(key, mut value)| {
            match &mut value {
                SchemaOrRef::Schema(inner) => camelize_properties(inner, pending),
                SchemaOrRef::Ref(reference) => pending.extend(definition_name(reference)),
            }
            (camelize(&key), value)
        })
        .collect();
    schema.required = schema.required.iter().map(|name| camelize(name)).collect();
}

/// `first_name` becomes `firstName`; names without underscores are left alone.
pub fn camelize(name: &str) -> String {
    if name.contains('_') {
        name.to_lower_camel_case()
    } else {
        name.to_string()
    }
}

/// Proxies to a named serializer, which must be emitted as a definition.
pub struct RecursiveFieldInspector;

impl BaseInspector for RecursiveFieldInspector {
    fn name(&self) -> &'static str {
        "RecursiveFieldInspector"
    }
}

impl FieldInspector for RecursiveFieldInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        let FieldKind::Recursive { serializer, many } = &field.def.kind else {
            return Ok(Probe::NotHandled);
        };
        if shape != ObjectShape::Schema {
            return Ok(Probe::NotHandled);
        }
        if !use_references {
            return Err(Error::generation(
                "Can not create schema for RecursiveField when use_references is False",
            ));
        }
        let ref_name = ctx.catalog.serializer(serializer)?.ref_name().ok_or_else(|| {
            Error::generation(format!(
                "Can't create RecursiveField schema for inline {}",
                serializer
            ))
        })?;
        let reference: SchemaOrRef = Reference::schema(ctx.components, &ref_name, true)?.into();
        if !many {
            return handled(SwaggerObject::Schema(reference));
        }
        let attrs = SwaggerAttrs::of_type(SchemaType::Array).with_items(SwaggerObject::Schema(reference));
        handled(SwaggerType::new(field, shape, overrides).build(ctx.settings, attrs)?)
    }
}

/// Converts nested serializers and lists.
///
/// The referencing flavour registers every serializer that has a reference name as a
/// named definition; the inline flavour always nests the full schema.
pub struct SerializerInspector {
    use_definitions: bool,
}

impl SerializerInspector {
    pub fn referencing() -> Self {
        Self {
            use_definitions: true,
        }
    }

    pub fn inline() -> Self {
        Self {
            use_definitions: false,
        }
    }

    fn array_of(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        swagger_type: &SwaggerType<'_>,
        child: &FieldDef,
        use_references: bool,
    ) -> Converted {
        let items = ctx.probe_field(
            FieldRef::new(field.name, child),
            swagger_type.child_shape(),
            use_references,
            &FieldOverrides::default(),
        )?;
        let mut attrs = SwaggerAttrs::of_type(SchemaType::Array);
        attrs.items = items.map(Box::new);
        find_limits(field.def, ctx.settings).apply(&mut attrs);
        handled(swagger_type.build(ctx.settings, attrs)?)
    }

    fn nested(
        &self,
        ctx: &mut InspectorContext<'_>,
        swagger_type: &SwaggerType<'_>,
        serializer: &str,
        use_references: bool,
    ) -> Converted {
        let shape = swagger_type.shape();
        if shape != ObjectShape::Schema {
            return Err(Error::generation(format!(
                "cannot instantiate nested serializer as {}",
                shape.name()
            )));
        }
        let catalog = ctx.catalog;
        let target = catalog.serializer(serializer)?;
        let ref_name = target.ref_name().filter(|_| use_references);
        let Some(ref_name) = ref_name else {
            if ctx.is_converting(&target.name) {
                return Err(Error::generation(format!(
                    "serializer {} nests itself and cannot be rendered inline; give it a ref_name",
                    target.name
                )));
            }
            let attrs = object_attrs(ctx, target, use_references)?;
            return handled(swagger_type.without_title().build(ctx.settings, attrs)?);
        };
        let reference = register_definition(ctx, target, &ref_name, use_references)?;
        handled(SwaggerObject::Schema(reference.into()))
    }
}

impl BaseInspector for SerializerInspector {
    fn name(&self) -> &'static str {
        if self.use_definitions {
            "ReferencingSerializerInspector"
        } else {
            "InlineSerializerInspector"
        }
    }
}

impl FieldInspector for SerializerInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        let swagger_type = SwaggerType::new(field, shape, overrides);
        match &field.def.kind {
            FieldKind::List { child } => {
                self.array_of(ctx, field, &swagger_type, child, use_references)
            }
            FieldKind::Serializer {
                serializer,
                many: true,
            } => {
                let child = FieldDef::nested(serializer.clone(), false);
                self.array_of(ctx, field, &swagger_type, &child, use_references)
            }
            FieldKind::Serializer {
                serializer,
                many: false,
            } => self.nested(ctx, &swagger_type, serializer, use_references),
            _ => Ok(Probe::NotHandled),
        }
    }

    fn get_schema(
        &self,
        ctx: &mut InspectorContext<'_>,
        serializer: &SerializerDef,
    ) -> Result<Probe<Option<SchemaOrRef>>> {
        let body = FieldDef::nested(serializer.name.clone(), false);
        let object = ctx.probe_field(
            FieldRef::new(&serializer.name, &body),
            ObjectShape::Schema,
            self.use_definitions,
            &FieldOverrides::default(),
        )?;
        Ok(Probe::Handled(object.map(SwaggerObject::into_schema).transpose()?))
    }

    fn get_request_parameters(
        &self,
        ctx: &mut InspectorContext<'_>,
        serializer: &SerializerDef,
        in_: ParameterLocation,
    ) -> Result<Probe<Vec<Parameter>>> {
        let parameters = ctx.with_parent(&serializer.name, |ctx| {
            let mut parameters = Vec::new();
            for (name, child) in serializer.fields.iter().filter(|(_, f)| !f.read_only) {
                let overrides = FieldOverrides::parameter(name.clone(), in_);
                let object = ctx.probe_field(
                    FieldRef::new(name, child),
                    ObjectShape::Parameter,
                    false,
                    &overrides,
                )?;
                if let Some(object) = object {
                    parameters.push(object.into_parameter()?);
                }
            }
            Ok(parameters)
        })?;
        Ok(Probe::Handled(parameters))
    }
}

/// Properties and required list of the object schema of `serializer`.
fn object_attrs(
    ctx: &mut InspectorContext<'_>,
    serializer: &SerializerDef,
    use_references: bool,
) -> Result<SwaggerAttrs> {
    ctx.with_parent(&serializer.name, |ctx| {
        let mut properties = IndexMap::new();
        let mut required = Vec::new();
        for (name, child) in &serializer.fields {
            let overrides = FieldOverrides::property(child.read_only);
            let object = ctx.probe_field(
                FieldRef::new(name, child),
                ObjectShape::Schema,
                use_references,
                &overrides,
            )?;
            let Some(object) = object else {
                continue;
            };
            let schema = object.into_schema()?;
            let read_only = schema.as_schema().and_then(|s| s.read_only).unwrap_or(false);
            if child.is_required() && !read_only {
                required.push(name.clone());
            }
            properties.insert(name.clone(), schema);
        }
        let mut attrs = SwaggerAttrs::of_type(SchemaType::Object).with_properties(properties);
        if !required.is_empty() {
            attrs = attrs.with_required_properties(required);
        }
        Ok(attrs)
    })
}

/// Register `target` under `ref_name` unless it already is, and reference it.
fn register_definition(
    ctx: &mut InspectorContext<'_>,
    target: &SerializerDef,
    ref_name: &str,
    use_references: bool,
) -> Result<Reference> {
    let scope = ctx.components.schema_scope()?;
    if ctx.components.has(scope, ref_name)? || ctx.components.is_pending(scope, ref_name) {
        let owner = ctx.components.owner(scope, ref_name).map(str::to_string);
        if let Some(owner) = owner {
            if owner != target.name && !ctx.is_converting(&target.name) {
                check_same_definition(ctx, target, ref_name, &owner, use_references)?;
            }
        }
        return Reference::schema(ctx.components, ref_name, true);
    }

    ctx.components.reserve(scope, ref_name, Some(&target.name))?;
    debug!("Registering {} as definition {}", target.name, ref_name);
    match object_attrs(ctx, target, use_references).and_then(Schema::new) {
        Ok(mut schema) => {
            schema.remove_read_only();
            ctx.components
                .commit(scope, ref_name, Component::Schema(schema))?;
        }
        Err(err) => {
            ctx.components.release(scope, ref_name);
            return Err(err);
        }
    }
    Reference::schema(ctx.components, ref_name, false)
}

/// Two serializers may share a reference name only if they produce the same schema.
fn check_same_definition(
    ctx: &mut InspectorContext<'_>,
    target: &SerializerDef,
    ref_name: &str,
    owner: &str,
    use_references: bool,
) -> Result<()> {
    let scope = ctx.components.schema_scope()?;
    let conflict = || {
        Error::generation(format!(
            "Schema for {} would override distinct serializer {} because they share the same ref_name {}",
            target.name, owner, ref_name
        ))
    };
    if ctx.components.is_pending(scope, ref_name) {
        return Err(conflict());
    }

    let mut fresh = Schema::new(object_attrs(ctx, target, use_references)?)?;
    fresh.remove_read_only();
    let mut fresh = SchemaOrRef::from(fresh);
    if CamelCaseJSONFilter::is_camel_case(ctx) {
        camelize_schema(ctx.components, &mut fresh)?;
    }
    let existing = ctx.components.get(scope, ref_name)?.as_schema();
    if existing != fresh.as_schema() {
        return Err(conflict());
    }
    debug!(
        "{} and {} share definition {} with identical schemas",
        target.name, owner, ref_name
    );
    Ok(())
}

/// Relations: primary keys, slugs, hyperlinks and lists of them.
pub struct RelatedFieldInspector;

impl BaseInspector for RelatedFieldInspector {
    fn name(&self) -> &'static str {
        "RelatedFieldInspector"
    }
}

impl FieldInspector for RelatedFieldInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        let swagger_type = SwaggerType::new(field, shape, overrides);
        let def = field.def;
        let attrs = match &def.kind {
            FieldKind::ManyRelated { child } => {
                let mut child = (**child).clone();
                if child.source.is_none() {
                    child.source = def.source.clone();
                }
                let items = ctx.probe_field(
                    FieldRef::new(field.name, &child),
                    swagger_type.child_shape(),
                    use_references,
                    &FieldOverrides::default(),
                )?;
                let mut attrs = SwaggerAttrs::of_type(SchemaType::Array);
                attrs.items = items.map(Box::new);
                attrs.unique_items = Some(true);
                attrs
            }
            FieldKind::PrimaryKeyRelated {
                pk_field: Some(pk_field),
                ..
            } => {
                let merged = with_related_attrs(pk_field, def);
                let object = ctx.probe_field(
                    FieldRef::new(field.name, &merged),
                    shape,
                    use_references,
                    overrides,
                )?;
                return Ok(Probe::Handled(object));
            }
            FieldKind::PrimaryKeyRelated { .. } | FieldKind::SlugRelated { .. } => {
                let catalog = ctx.catalog;
                let view_model = ctx.view.model.as_deref();
                let resolved =
                    catalog.resolve_related_field(def, field.name, ctx.parent(), view_model);
                match resolved.and_then(|r| model_type_info(r.field, ctx.settings)) {
                    Some(attrs) => attrs,
                    None => {
                        debug!(
                            "Could not resolve the target of related field {}, assuming string",
                            field.name
                        );
                        SwaggerAttrs::of_type(SchemaType::String)
                    }
                }
            }
            FieldKind::HyperlinkedRelated | FieldKind::HyperlinkedIdentity => {
                SwaggerAttrs::of_type(SchemaType::String).with_format(FORMAT_URI)
            }
            FieldKind::Related => SwaggerAttrs::of_type(SchemaType::String),
            _ => return Ok(Probe::NotHandled),
        };
        handled(swagger_type.build(ctx.settings, attrs)?)
    }
}

/// The `pk_field` of a relation, carrying the relation's own presentation attributes.
fn with_related_attrs(pk_field: &FieldDef, related: &FieldDef) -> FieldDef {
    let mut merged = pk_field.clone();
    merged.label = related.label.clone();
    merged.help_text = related.help_text.clone();
    merged.required = Some(related.is_required());
    merged.read_only = related.read_only;
    merged.default = related.default.clone();
    merged.allow_null = related.allow_null;
    merged.source = related.source.clone();
    merged
}

pub struct ChoiceFieldInspector;

impl BaseInspector for ChoiceFieldInspector {
    fn name(&self) -> &'static str {
        "ChoiceFieldInspector"
    }
}

impl FieldInspector for ChoiceFieldInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        _use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        let (choices, multiple) = match &field.def.kind {
            FieldKind::Choice { choices } => (choices, false),
            FieldKind::MultipleChoice { choices } => (choices, true),
            _ => return Ok(Probe::NotHandled),
        };
        let swagger_type = SwaggerType::new(field, shape, overrides);
        let enum_type = choice_type(ctx, field, choices);

        if !multiple {
            let attrs = SwaggerAttrs::of_type(enum_type).with_enum(choices.clone());
            return handled(swagger_type.build(ctx.settings, attrs)?);
        }
        let items = SwaggerAttrs::of_type(enum_type)
            .with_enum(choices.clone())
            .into_object(swagger_type.child_shape())?;
        let mut attrs = SwaggerAttrs::of_type(SchemaType::Array).with_items(items);
        if shape == ObjectShape::Parameter
            && matches!(
                overrides.in_,
                Some(ParameterLocation::FormData | ParameterLocation::Query)
            )
        {
            attrs.collection_format = Some(CollectionFormat::Multi);
        }
        handled(swagger_type.build(ctx.settings, attrs)?)
    }
}

/// Type of the enum values of a choice field.
///
/// Model serializers take it from the backing model field; otherwise it is inferred from
/// the choices themselves, falling back to string when they are mixed.
fn choice_type(ctx: &InspectorContext<'_>, field: FieldRef<'_>, choices: &[Value]) -> SchemaType {
    let catalog = ctx.catalog;
    if let Some(model) = ctx.parent().and_then(|p| p.model.as_deref()) {
        let source = field.def.source.as_deref().unwrap_or(field.name);
        let model_field = catalog
            .find_model(model)
            .and_then(|m| m.field(source))
            .map(|f| f.base_field.as_deref().unwrap_or(f));
        if let Some(type_) = model_field
            .and_then(|f| model_type_info(f, ctx.settings))
            .and_then(|attrs| attrs.type_)
        {
            return type_;
        }
        return SchemaType::String;
    }

    let mut types = choices.iter().map(value_type);
    match types.next() {
        Some(Some(first)) if types.all(|t| t == Some(first)) => first,
        _ => SchemaType::String,
    }
}

fn value_type(value: &Value) -> Option<SchemaType> {
    match value {
        Value::Bool(_) => Some(SchemaType::Boolean),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(SchemaType::Integer),
        Value::Number(_) => Some(SchemaType::Number),
        Value::String(_) => Some(SchemaType::String),
        _ => None,
    }
}

pub struct FileFieldInspector;

impl BaseInspector for FileFieldInspector {
    fn name(&self) -> &'static str {
        "FileFieldInspector"
    }
}

impl FieldInspector for FileFieldInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        _use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        let use_url = match &field.def.kind {
            FieldKind::File { use_url } | FieldKind::Image { use_url } => {
                use_url.unwrap_or(ctx.settings.uploaded_files_use_url)
            }
            _ => return Ok(Probe::NotHandled),
        };
        let unsupported = || {
            Error::generation("FileField is supported only in a formData Parameter or response Schema")
        };
        let swagger_type = SwaggerType::new(field, shape, overrides);
        match shape {
            ObjectShape::Schema => {
                let mut attrs = SwaggerAttrs::of_type(SchemaType::String);
                attrs.read_only = Some(true);
                if use_url {
                    attrs.format = Some(FORMAT_URI.to_string());
                }
                handled(swagger_type.build(ctx.settings, attrs)?)
            }
            ObjectShape::Parameter if overrides.in_ == Some(ParameterLocation::FormData) => {
                handled(swagger_type.build(ctx.settings, SwaggerAttrs::of_type(SchemaType::File))?)
            }
            _ => Err(unsupported()),
        }
    }
}

pub struct DictFieldInspector;

impl BaseInspector for DictFieldInspector {
    fn name(&self) -> &'static str {
        "DictFieldInspector"
    }
}

impl FieldInspector for DictFieldInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        let FieldKind::Dict { child } = &field.def.kind else {
            return Ok(Probe::NotHandled);
        };
        if shape != ObjectShape::Schema {
            return Ok(Probe::NotHandled);
        }
        let any = FieldDef::new(FieldKind::Other { class: None });
        let child = child.as_deref().unwrap_or(&any);
        let values = ctx.probe_field(
            FieldRef::new(field.name, child),
            ObjectShape::Schema,
            use_references,
            &FieldOverrides::default(),
        )?;
        let mut attrs = SwaggerAttrs::of_type(SchemaType::Object);
        attrs.additional_properties = values
            .map(|v| v.into_schema().map(|s| AdditionalProperties::Schema(Box::new(s))))
            .transpose()?;
        handled(SwaggerType::new(field, shape, overrides).build(ctx.settings, attrs)?)
    }
}

pub struct JSONFieldInspector;

impl BaseInspector for JSONFieldInspector {
    fn name(&self) -> &'static str {
        "JSONFieldInspector"
    }
}

impl FieldInspector for JSONFieldInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        _use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        if !matches!(field.def.kind, FieldKind::Json) || shape != ObjectShape::Schema {
            return Ok(Probe::NotHandled);
        }
        let attrs = SwaggerAttrs::of_type(SchemaType::Object);
        handled(SwaggerType::new(field, shape, overrides).build(ctx.settings, attrs)?)
    }
}

/// Hidden fields never appear in the document.
pub struct HiddenFieldInspector;

impl BaseInspector for HiddenFieldInspector {
    fn name(&self) -> &'static str {
        "HiddenFieldInspector"
    }
}

impl FieldInspector for HiddenFieldInspector {
    fn field_to_swagger_object(
        &self,
        _ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        _shape: ObjectShape,
        _use_references: bool,
        _overrides: &FieldOverrides,
    ) -> Converted {
        if matches!(field.def.kind, FieldKind::Hidden) {
            return Ok(Probe::Handled(None));
        }
        Ok(Probe::NotHandled)
    }
}

/// Method fields, typed by their declared serializer or return type hint.
pub struct SerializerMethodFieldInspector;

impl BaseInspector for SerializerMethodFieldInspector {
    fn name(&self) -> &'static str {
        "SerializerMethodFieldInspector"
    }
}

impl FieldInspector for SerializerMethodFieldInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        let FieldKind::Method {
            returns,
            serializer,
            many,
            doc,
        } = &field.def.kind
        else {
            return Ok(Probe::NotHandled);
        };

        if let Some(serializer) = serializer {
            let mut nested = FieldDef::nested(serializer.clone(), *many);
            nested.help_text = field.def.help_text.clone().or_else(|| doc.clone());
            nested.label = field.def.label.clone();
            nested.read_only = true;
            let mut overrides = overrides.clone();
            overrides.read_only = Some(true);
            let object = ctx.probe_field(
                FieldRef::new(field.name, &nested),
                shape,
                use_references,
                &overrides,
            )?;
            return Ok(Probe::Handled(object));
        }

        let Some(hint) = returns else {
            return Ok(Probe::NotHandled);
        };
        let swagger_type = SwaggerType::new(field, shape, overrides);
        let mut attrs = hint_type_info(hint, swagger_type.child_shape(), ctx.settings)?;
        if shape == ObjectShape::Schema {
            attrs.read_only = Some(true);
        }
        handled(swagger_type.build(ctx.settings, attrs)?)
    }
}

fn decimal_type(coerce_to_string: Option<bool>, settings: &GeneratorSettings) -> SchemaType {
    if coerce_to_string.unwrap_or(settings.coerce_decimal_to_string) {
        SchemaType::String
    } else {
        SchemaType::Number
    }
}

/// Attributes of the value described by a return type hint.
fn hint_type_info(
    hint: &TypeHint,
    child_shape: ObjectShape,
    settings: &GeneratorSettings,
) -> Result<SwaggerAttrs> {
    let attrs = match hint {
        TypeHint::Str => SwaggerAttrs::of_type(SchemaType::String),
        TypeHint::Int => SwaggerAttrs::of_type(SchemaType::Integer),
        TypeHint::Float => SwaggerAttrs::of_type(SchemaType::Number),
        TypeHint::Decimal => {
            SwaggerAttrs::of_type(decimal_type(None, settings)).with_format(FORMAT_DECIMAL)
        }
        TypeHint::Bool => SwaggerAttrs::of_type(SchemaType::Boolean),
        TypeHint::Date => SwaggerAttrs::of_type(SchemaType::String).with_format(FORMAT_DATE),
        TypeHint::DateTime => {
            SwaggerAttrs::of_type(SchemaType::String).with_format(FORMAT_DATETIME)
        }
        TypeHint::Uuid => SwaggerAttrs::of_type(SchemaType::String).with_format(FORMAT_UUID),
        TypeHint::Dict => SwaggerAttrs::of_type(SchemaType::Object),
        TypeHint::Optional(inner) => {
            let mut attrs = hint_type_info(inner, child_shape, settings)?;
            attrs.extensions.set("x_nullable", Value::Bool(true));
            attrs
        }
        TypeHint::List(inner) => {
            let items = hint_type_info(inner, child_shape, settings)?.into_object(child_shape)?;
            SwaggerAttrs::of_type(SchemaType::Array).with_items(items)
        }
    };
    Ok(attrs)
}

/// Scalar fields.
pub struct SimpleFieldInspector;

impl BaseInspector for SimpleFieldInspector {
    fn name(&self) -> &'static str {
        "SimpleFieldInspector"
    }
}

impl FieldInspector for SimpleFieldInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        _use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        match basic_type_info(field.def, ctx.settings) {
            Some(attrs) => {
                handled(SwaggerType::new(field, shape, overrides).build(ctx.settings, attrs)?)
            }
            None => Ok(Probe::NotHandled),
        }
    }
}

/// Last resort: anything left over is a string.
pub struct StringDefaultFieldInspector;

impl BaseInspector for StringDefaultFieldInspector {
    fn name(&self) -> &'static str {
        "StringDefaultFieldInspector"
    }
}

impl FieldInspector for StringDefaultFieldInspector {
    fn field_to_swagger_object(
        &self,
        ctx: &mut InspectorContext<'_>,
        field: FieldRef<'_>,
        shape: ObjectShape,
        _use_references: bool,
        overrides: &FieldOverrides,
    ) -> Converted {
        let attrs = SwaggerAttrs::of_type(SchemaType::String);
        handled(SwaggerType::new(field, shape, overrides).build(ctx.settings, attrs)?)
    }
}

/// Type, format, pattern and limits of a scalar serializer field.
pub fn basic_type_info(def: &FieldDef, settings: &GeneratorSettings) -> Option<SwaggerAttrs> {
    let (type_, format) = match &def.kind {
        FieldKind::Email => (SchemaType::String, Some(FORMAT_EMAIL)),
        FieldKind::Slug => (SchemaType::String, Some(FORMAT_SLUG)),
        FieldKind::Url => (SchemaType::String, Some(FORMAT_URI)),
        FieldKind::IpAddress { protocol } => {
            let ipv6 = protocol
                .as_deref()
                .map_or(false, |p| p.eq_ignore_ascii_case("ipv6"));
            (SchemaType::String, Some(if ipv6 { FORMAT_IPV6 } else { FORMAT_IPV4 }))
        }
        FieldKind::Uuid => (SchemaType::String, Some(FORMAT_UUID)),
        FieldKind::Regex { .. } | FieldKind::Char => (SchemaType::String, None),
        FieldKind::Boolean | FieldKind::NullBoolean => (SchemaType::Boolean, None),
        FieldKind::Integer => (SchemaType::Integer, None),
        FieldKind::Float => (SchemaType::Number, None),
        FieldKind::Decimal { coerce_to_string } => {
            (decimal_type(*coerce_to_string, settings), Some(FORMAT_DECIMAL))
        }
        FieldKind::Duration | FieldKind::Time => (SchemaType::String, None),
        FieldKind::Date => (SchemaType::String, Some(FORMAT_DATE)),
        FieldKind::DateTime => (SchemaType::String, Some(FORMAT_DATETIME)),
        FieldKind::ModelField => (SchemaType::String, None),
        _ => return None,
    };

    let mut attrs = SwaggerAttrs::of_type(type_);
    attrs.format = format.map(str::to_string);
    if type_ == SchemaType::String && matches!(format, None | Some(FORMAT_SLUG)) {
        attrs.pattern = find_regex(def);
    }
    find_limits(def, settings).apply(&mut attrs);
    Some(attrs)
}

/// Type, format and pattern of the value stored by a model field.
///
/// Relations, files and array fields have no scalar type and yield `None`.
pub fn model_type_info(field: &ModelFieldDef, settings: &GeneratorSettings) -> Option<SwaggerAttrs> {
    use ModelFieldKind::*;
    let (type_, format) = match field.kind {
        Auto | BigAuto | Integer => (SchemaType::Integer, None),
        Binary => (SchemaType::String, Some(FORMAT_BINARY)),
        Boolean => (SchemaType::Boolean, None),
        DateTime => (SchemaType::String, Some(FORMAT_DATETIME)),
        Date => (SchemaType::String, Some(FORMAT_DATE)),
        Decimal => (decimal_type(None, settings), Some(FORMAT_DECIMAL)),
        Duration | Text | Time | Char | Email | Url => (SchemaType::String, None),
        Float => (SchemaType::Number, None),
        IpAddress => (SchemaType::String, Some(FORMAT_IPV4)),
        GenericIpAddress => (SchemaType::String, Some(FORMAT_IPV6)),
        Slug => (SchemaType::String, Some(FORMAT_SLUG)),
        Uuid => (SchemaType::String, Some(FORMAT_UUID)),
        File | ForeignKey | OneToOne | ManyToMany | Array => return None,
    };

    let mut attrs = SwaggerAttrs::of_type(type_);
    attrs.format = format.map(str::to_string);
    if type_ == SchemaType::String && matches!(format, None | Some(FORMAT_SLUG)) {
        let implied = (field.kind == Slug).then(|| SLUG_PATTERN.to_string());
        attrs.pattern = single_pattern(implied.into_iter().chain(regex_validators(&field.validators)));
    }
    Some(attrs)
}

fn regex_validators(validators: &[ValidatorDef]) -> impl Iterator<Item = String> + '_ {
    validators.iter().filter_map(|v| match v {
        ValidatorDef::Regex { pattern } => Some(pattern.clone()),
        _ => None,
    })
}

/// The single regex constraining a string field, in ECMA syntax.
///
/// URL, IPv4 and email validators carry regexes too complex to be useful and are ignored.
/// Several distinct patterns cannot be expressed at once, so none is returned.
pub fn find_regex(def: &FieldDef) -> Option<String> {
    let implied = match &def.kind {
        FieldKind::Regex { regex } => Some(regex.clone()),
        FieldKind::Slug => Some(SLUG_PATTERN.to_string()),
        _ => None,
    };
    single_pattern(implied.into_iter().chain(regex_validators(&def.validators)))
}

fn single_pattern(patterns: impl Iterator<Item = String>) -> Option<String> {
    let mut found: Vec<String> = Vec::new();
    for pattern in patterns {
        if !found.contains(&pattern) {
            found.push(pattern);
        }
    }
    if found.len() > 1 {
        warn!(
            "Found multiple regex patterns ({}), none will be used",
            found.join(", ")
        );
        return None;
    }
    found.pop().map(to_ecma)
}

/// End-of-string anchors `\Z` and `\z` have no ECMA equivalent but `$`.
fn to_ecma(pattern: String) -> String {
    match pattern
        .strip_suffix(r"\Z")
        .or_else(|| pattern.strip_suffix(r"\z"))
    {
        Some(stripped) => format!("{}$", stripped),
        None => pattern,
    }
}

/// Numeric, length and item-count bounds derived from a field's validators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Limits {
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

impl Limits {
    pub fn apply(self, attrs: &mut SwaggerAttrs) {
        attrs.minimum = self.minimum.or(attrs.minimum.take());
        attrs.maximum = self.maximum.or(attrs.maximum.take());
        attrs.min_length = self.min_length.or(attrs.min_length);
        attrs.max_length = self.max_length.or(attrs.max_length);
        attrs.min_items = self.min_items.or(attrs.min_items);
        attrs.max_items = self.max_items.or(attrs.max_items);
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Bounded {
    Value,
    Length,
    Items,
}

/// Collect the tightest bounds of `def`: the largest minimum and the smallest maximum.
pub fn find_limits(def: &FieldDef, settings: &GeneratorSettings) -> Limits {
    let mut limits = Limits::default();
    let bounded = match &def.kind {
        FieldKind::Integer | FieldKind::Float => Bounded::Value,
        FieldKind::Decimal { coerce_to_string } => {
            if decimal_type(*coerce_to_string, settings) == SchemaType::String {
                return limits;
            }
            Bounded::Value
        }
        FieldKind::Char
        | FieldKind::Email
        | FieldKind::Slug
        | FieldKind::Url
        | FieldKind::Regex { .. }
        | FieldKind::IpAddress { .. } => Bounded::Length,
        FieldKind::List { .. } | FieldKind::Serializer { many: true, .. } => Bounded::Items,
        _ => return limits,
    };

    for validator in &def.validators {
        match (bounded, validator) {
            (Bounded::Value, ValidatorDef::MinValue { limit }) => {
                if limits.minimum.as_ref().map_or(true, |m| as_f64(limit) > as_f64(m)) {
                    limits.minimum = Some(limit.clone());
                }
            }
            (Bounded::Value, ValidatorDef::MaxValue { limit }) => {
                if limits.maximum.as_ref().map_or(true, |m| as_f64(limit) < as_f64(m)) {
                    limits.maximum = Some(limit.clone());
                }
            }
            (Bounded::Length, ValidatorDef::MinLength { limit }) => {
                limits.min_length = Some(limits.min_length.map_or(*limit, |m| m.max(*limit)));
            }
            (Bounded::Length, ValidatorDef::MaxLength { limit }) => {
                limits.max_length = Some(limits.max_length.map_or(*limit, |m| m.min(*limit)));
            }
            (Bounded::Items, ValidatorDef::MinLength { limit }) => {
                limits.min_items = Some(limits.min_items.map_or(*limit, |m| m.max(*limit)));
            }
            (Bounded::Items, ValidatorDef::MaxLength { limit }) => {
                limits.max_items = Some(limits.max_items.map_or(*limit, |m| m.min(*limit)));
            }
            _ => {}
        }
    }

    if bounded == Bounded::Length && !def.allow_blank && limits.min_length.unwrap_or(0) < 1 {
        limits.min_length = Some(1);
    }
    limits
}

fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ApiDescription, ContentHandlerDef, HttpMethod, ViewDef};
    use crate::type_resolver::TypeResolver;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn catalog(yaml: &str) -> TypeResolver {
        let api: ApiDescription = serde_yaml::from_str(yaml).unwrap();
        TypeResolver::new(&api).unwrap()
    }

    /// Run `f` in the context of a GET on a view, returning its result and the definitions.
    fn convert<T>(
        catalog: &TypeResolver,
        view: &ViewDef,
        f: impl FnOnce(&mut InspectorContext<'_>) -> Result<T>,
    ) -> (Result<T>, ReferenceResolver<Component>) {
        let settings = GeneratorSettings::default();
        let mut components = ReferenceResolver::swagger();
        let result = {
            let mut ctx = InspectorContext::new(
                view,
                "/things/",
                HttpMethod::Get,
                &mut components,
                catalog,
                &settings,
                None,
            )
            .unwrap();
            f(&mut ctx)
        };
        (result, components)
    }

    fn schema_json(catalog: &TypeResolver, serializer: &str) -> (Value, Value) {
        let view = ViewDef::new("View");
        let (schema, mut components) = convert(catalog, &view, |ctx| {
            let serializer = ctx.catalog.serializer(serializer)?;
            ctx.serializer_to_schema(serializer)
        });
        let schema = serde_json::to_value(schema.unwrap()).unwrap();
        (schema, definitions_json(&mut components))
    }

    fn definitions_json(components: &mut ReferenceResolver<Component>) -> Value {
        let scope = components.schema_scope().unwrap();
        let definitions: IndexMap<String, Schema> = components
            .take_scope(scope)
            .unwrap()
            .into_iter()
            .filter_map(|(name, c)| c.as_schema().cloned().map(|s| (name, s)))
            .collect();
        serde_json::to_value(definitions).unwrap()
    }

    fn field(kind: FieldKind) -> FieldDef {
        FieldDef::new(kind)
    }

    #[test]
    fn test_self_referencing_serializer_yields_one_definition() {
        let catalog = catalog(
            r#"
serializers:
  - name: CategorySerializer
    fields:
      name: {type: char}
      children: {type: serializer, serializer: CategorySerializer, many: true, read_only: true}
"#,
        );
        let (schema, definitions) = schema_json(&catalog, "CategorySerializer");
        assert_eq!(schema, json!({"$ref": "#/definitions/Category"}));
        assert_eq!(
            definitions,
            json!({
                "Category": {
                    "required": ["name"],
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "minLength": 1},
                        "children": {
                            "type": "array",
                            "items": {"$ref": "#/definitions/Category"},
                            "readOnly": true
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_recursive_field_requires_references() {
        let catalog = catalog(
            r#"
serializers:
  - name: NodeSerializer
    fields:
      parent: {type: recursive, serializer: NodeSerializer, required: false}
"#,
        );
        let (schema, definitions) = schema_json(&catalog, "NodeSerializer");
        assert_eq!(schema, json!({"$ref": "#/definitions/Node"}));
        assert_eq!(
            definitions["Node"]["properties"]["parent"],
            json!({"$ref": "#/definitions/Node"})
        );

        let view = ViewDef::new("View");
        let recursive = field(FieldKind::Recursive {
            serializer: "NodeSerializer".to_string(),
            many: false,
        });
        let (result, _) = convert(&catalog, &view, |ctx| {
            ctx.probe_field(
                FieldRef::new("parent", &recursive),
                ObjectShape::Schema,
                false,
                &FieldOverrides::default(),
            )
        });
        assert!(matches!(result, Err(Error::GenerationError(_))));
    }

    #[test]
    fn test_inline_cycle_is_an_error() {
        let catalog = catalog(
            r#"
serializers:
  - name: LoopSerializer
    ref_name: null
    fields:
      next: {type: serializer, serializer: LoopSerializer}
"#,
        );
        let view = ViewDef::new("View");
        let (result, _) = convert(&catalog, &view, |ctx| {
            let serializer = ctx.catalog.serializer("LoopSerializer")?;
            ctx.serializer_to_schema(serializer)
        });
        let err = result.err().unwrap();
        assert!(err.to_string().contains("nests itself"), "{}", err);
    }

    #[test]
    fn test_shared_ref_name_must_produce_identical_schemas() {
        let catalog = catalog(
            r#"
serializers:
  - name: a.UserSerializer
    fields:
      name: {type: char}
  - name: b.UserSerializer
    fields:
      name: {type: char}
  - name: c.UserSerializer
    fields:
      email: {type: email}
  - name: PairSerializer
    fields:
      first: {type: serializer, serializer: a.UserSerializer}
      second: {type: serializer, serializer: b.UserSerializer}
  - name: ClashSerializer
    fields:
      first: {type: serializer, serializer: a.UserSerializer}
      second: {type: serializer, serializer: c.UserSerializer}
"#,
        );
        let (_, definitions) = schema_json(&catalog, "PairSerializer");
        assert_eq!(
            definitions["Pair"]["properties"]["second"],
            json!({"$ref": "#/definitions/User"})
        );

        let view = ViewDef::new("View");
        let (result, _) = convert(&catalog, &view, |ctx| {
            let serializer = ctx.catalog.serializer("ClashSerializer")?;
            ctx.serializer_to_schema(serializer)
        });
        let err = result.err().unwrap();
        assert!(
            err.to_string()
                .contains("would override distinct serializer a.UserSerializer"),
            "{}",
            err
        );
    }

    #[test]
    fn test_nested_serializer_cannot_be_a_parameter() {
        let catalog = catalog(
            r#"
serializers:
  - name: InnerSerializer
    fields:
      x: {type: integer}
  - name: OuterSerializer
    fields:
      inner: {type: serializer, serializer: InnerSerializer}
"#,
        );
        let view = ViewDef::new("View");
        let (result, _) = convert(&catalog, &view, |ctx| {
            let serializer = ctx.catalog.serializer("OuterSerializer")?;
            ctx.serializer_to_parameters(serializer, ParameterLocation::FormData)
        });
        let err = result.err().unwrap();
        assert_eq!(
            err.to_string(),
            "schema generation failed: cannot instantiate nested serializer as Parameter"
        );
    }

    #[test]
    fn test_camel_case_views_rename_properties() {
        let catalog = catalog(
            r#"
serializers:
  - name: ProfileSerializer
    fields:
      first_name: {type: char}
      address: {type: serializer, serializer: AddressSerializer}
  - name: AddressSerializer
    fields:
      street_line: {type: char}
"#,
        );
        let mut view = ViewDef::new("View");
        view.renderer_classes = Some(vec![ContentHandlerDef::new(
            "CamelCaseJSONRenderer",
            "application/json",
        )]);
        let (schema, mut components) = convert(&catalog, &view, |ctx| {
            let serializer = ctx.catalog.serializer("ProfileSerializer")?;
            ctx.serializer_to_schema(serializer)
        });
        assert!(schema.is_ok());
        let definitions = definitions_json(&mut components);
        assert_eq!(definitions["Profile"]["required"], json!(["firstName", "address"]));
        assert!(definitions["Profile"]["properties"].get("firstName").is_some());
        assert_eq!(definitions["Address"]["required"], json!(["streetLine"]));
    }

    #[test]
    fn test_choice_types() {
        let catalog = catalog("{}");
        let view = ViewDef::new("View");
        let probe = |kind: FieldKind, shape: ObjectShape, overrides: FieldOverrides| {
            let def = field(kind);
            let (object, _) = convert(&catalog, &view, |ctx| {
                ctx.probe_field(FieldRef::new("pick", &def), shape, true, &overrides)
            });
            let object = object.unwrap().unwrap();
            match object {
                SwaggerObject::Schema(schema) => serde_json::to_value(schema).unwrap(),
                SwaggerObject::Parameter(parameter) => serde_json::to_value(parameter).unwrap(),
                SwaggerObject::Items(items) => serde_json::to_value(items).unwrap(),
            }
        };

        let ints = probe(
            FieldKind::Choice { choices: vec![json!(1), json!(2)] },
            ObjectShape::Schema,
            FieldOverrides::default(),
        );
        assert_eq!(ints, json!({"type": "integer", "enum": [1, 2]}));

        let mixed = probe(
            FieldKind::Choice { choices: vec![json!(1), json!("two")] },
            ObjectShape::Schema,
            FieldOverrides::default(),
        );
        assert_eq!(mixed["type"], json!("string"));

        let multi = probe(
            FieldKind::MultipleChoice { choices: vec![json!("a"), json!("b")] },
            ObjectShape::Parameter,
            FieldOverrides::parameter("pick", ParameterLocation::Query),
        );
        assert_eq!(
            multi,
            json!({
                "name": "pick",
                "in": "query",
                "required": true,
                "type": "array",
                "items": {"type": "string", "enum": ["a", "b"]},
                "collectionFormat": "multi"
            })
        );
    }

    #[test]
    fn test_file_fields_only_in_form_data_or_schema() {
        let catalog = catalog("{}");
        let view = ViewDef::new("View");
        let upload = field(FieldKind::File { use_url: None });

        let (schema, _) = convert(&catalog, &view, |ctx| {
            ctx.probe_field(
                FieldRef::new("upload", &upload),
                ObjectShape::Schema,
                true,
                &FieldOverrides::default(),
            )
        });
        let schema = schema.unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(schema.as_schema().unwrap()).unwrap(),
            json!({"type": "string", "format": "uri", "readOnly": true})
        );

        let (form, _) = convert(&catalog, &view, |ctx| {
            ctx.probe_field(
                FieldRef::new("upload", &upload),
                ObjectShape::Parameter,
                true,
                &FieldOverrides::parameter("upload", ParameterLocation::FormData),
            )
        });
        assert_eq!(form.unwrap().unwrap().type_(), Some(SchemaType::File));

        let (query, _) = convert(&catalog, &view, |ctx| {
            ctx.probe_field(
                FieldRef::new("upload", &upload),
                ObjectShape::Parameter,
                true,
                &FieldOverrides::parameter("upload", ParameterLocation::Query),
            )
        });
        assert!(matches!(query, Err(Error::GenerationError(_))));
    }

    #[test]
    fn test_hidden_fields_are_dropped() {
        let catalog = catalog(
            r#"
serializers:
  - name: SecretSerializer
    fields:
      owner: {type: hidden}
      note: {type: char, required: false}
"#,
        );
        let (_, definitions) = schema_json(&catalog, "SecretSerializer");
        let properties = definitions["Secret"]["properties"].as_object().unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["note"]);
        assert!(definitions["Secret"].get("required").is_none());
    }

    #[test]
    fn test_method_field_type_hints() {
        let settings = GeneratorSettings::default();
        let attrs = hint_type_info(
            &TypeHint::Optional(Box::new(TypeHint::List(Box::new(TypeHint::Int)))),
            ObjectShape::Schema,
            &settings,
        )
        .unwrap();
        let schema = Schema::new(attrs).unwrap();
        assert_eq!(
            serde_json::to_value(schema).unwrap(),
            json!({"type": "array", "items": {"type": "integer"}, "x-nullable": true})
        );
    }

    #[test]
    fn test_regex_patterns() {
        let mut slug = field(FieldKind::Slug);
        assert_eq!(find_regex(&slug).as_deref(), Some("^[-a-zA-Z0-9_]+$"));

        // the same pattern declared twice is not a conflict
        slug.validators.push(ValidatorDef::Regex {
            pattern: SLUG_PATTERN.to_string(),
        });
        assert_eq!(find_regex(&slug).as_deref(), Some("^[-a-zA-Z0-9_]+$"));

        let mut code = field(FieldKind::Regex {
            regex: r"^[A-Z]{3}\z".to_string(),
        });
        code.validators.push(ValidatorDef::Url);
        assert_eq!(find_regex(&code).as_deref(), Some("^[A-Z]{3}$"));

        code.validators.push(ValidatorDef::Regex {
            pattern: "^[a-z]+$".to_string(),
        });
        assert_eq!(find_regex(&code), None);
    }

    #[test]
    fn test_tightest_limits_win() {
        let settings = GeneratorSettings::default();
        let mut count = field(FieldKind::Integer);
        count.validators = vec![
            ValidatorDef::MinValue { limit: 1.into() },
            ValidatorDef::MinValue { limit: 5.into() },
            ValidatorDef::MaxValue { limit: 100.into() },
            ValidatorDef::MaxValue { limit: 10.into() },
        ];
        let limits = find_limits(&count, &settings);
        assert_eq!(limits.minimum, Some(5.into()));
        assert_eq!(limits.maximum, Some(10.into()));

        let mut name = field(FieldKind::Char);
        name.validators = vec![
            ValidatorDef::MaxLength { limit: 64 },
            ValidatorDef::MaxLength { limit: 32 },
        ];
        let limits = find_limits(&name, &settings);
        assert_eq!(limits.min_length, Some(1));
        assert_eq!(limits.max_length, Some(32));

        name.allow_blank = true;
        assert_eq!(find_limits(&name, &settings).min_length, None);

        let mut tags = field(FieldKind::List {
            child: Box::new(field(FieldKind::Char)),
        });
        tags.validators = vec![ValidatorDef::MinLength { limit: 2 }];
        assert_eq!(find_limits(&tags, &settings).min_items, Some(2));
    }

    #[test]
    fn test_decimal_follows_coercion_setting() {
        let mut settings = GeneratorSettings::default();
        let price = field(FieldKind::Decimal {
            coerce_to_string: None,
        });
        let attrs = basic_type_info(&price, &settings).unwrap();
        assert_eq!(attrs.type_, Some(SchemaType::String));
        assert_eq!(attrs.format.as_deref(), Some(FORMAT_DECIMAL));

        settings.coerce_decimal_to_string = false;
        let attrs = basic_type_info(&price, &settings).unwrap();
        assert_eq!(attrs.type_, Some(SchemaType::Number));
    }

    #[test]
    fn test_related_fields_follow_the_model() {
        let catalog = catalog(
            r#"
models:
  - name: Author
    pk: uuid
    fields:
      uuid: {kind: uuid}
      handle: {kind: slug}
  - name: Book
    fields:
      id: {kind: auto}
      author: {kind: foreign_key, to: Author}
serializers:
  - name: BookSerializer
    model: Book
    fields:
      author: {type: primary_key_related}
      author_handle: {type: slug_related, slug_field: handle, source: author}
      link: {type: hyperlinked_identity, read_only: true}
"#,
        );
        let (_, definitions) = schema_json(&catalog, "BookSerializer");
        let properties = &definitions["Book"]["properties"];
        assert_eq!(properties["author"], json!({"type": "string", "format": "uuid"}));
        assert_eq!(
            properties["author_handle"],
            json!({"type": "string", "format": "slug", "pattern": "^[-a-zA-Z0-9_]+$"})
        );
        assert_eq!(
            properties["link"],
            json!({"type": "string", "format": "uri", "readOnly": true})
        );
    }

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("first_name"), "firstName");
        assert_eq!(camelize("alreadyCamel"), "alreadyCamel");
        assert_eq!(camelize("id"), "id");
    }
}
