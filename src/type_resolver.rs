use crate::descriptor::{
    ApiDescription, FieldDef, FieldKind, ModelDef, ModelFieldDef, SerializerDef, ViewDef,
};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::HashSet;

/// Type resolver - looks up serializer, model and view definitions by name
pub struct TypeResolver {
    /// Serializers indexed by their full name
    serializers: IndexMap<String, SerializerDef>,
    /// Models indexed by name
    models: IndexMap<String, ModelDef>,
    /// Views indexed by name
    views: IndexMap<String, ViewDef>,
}

/// A model field reached through a relation
#[derive(Debug, Clone, Copy)]
pub struct ResolvedField<'a> {
    /// The model owning the field
    pub model: &'a ModelDef,
    /// The field itself
    pub field: &'a ModelFieldDef,
    /// Whether the field is the model's primary key
    pub primary_key: bool,
}

impl TypeResolver {
    /// Create a new TypeResolver from a merged description
    pub fn new(api: &ApiDescription) -> Result<Self> {
        debug!(
            "Initializing TypeResolver with {} serializers, {} models, {} views",
            api.serializers.len(),
            api.models.len(),
            api.views.len()
        );
        let mut resolver = Self {
            serializers: IndexMap::new(),
            models: IndexMap::new(),
            views: IndexMap::new(),
        };
        for serializer in &api.serializers {
            insert_unique(&mut resolver.serializers, &serializer.name, serializer, "serializer")?;
        }
        for model in &api.models {
            insert_unique(&mut resolver.models, &model.name, model, "model")?;
        }
        for view in &api.views {
            insert_unique(&mut resolver.views, &view.name, view, "view")?;
        }
        resolver.check_names()?;
        Ok(resolver)
    }

    /// Find a serializer by name, failing if it was never declared
    pub fn serializer(&self, name: &str) -> Result<&SerializerDef> {
        self.find_serializer(name)
            .ok_or_else(|| Error::configuration(format!("unknown serializer {}", name)))
    }

    /// Find a serializer by name
    pub fn find_serializer(&self, name: &str) -> Option<&SerializerDef> {
        debug!("Searching for serializer definition: {}", name);
        let found = self.serializers.get(name);
        if found.is_none() {
            debug!("Serializer {} not found", name);
        }
        found
    }

    pub fn model(&self, name: &str) -> Result<&ModelDef> {
        self.find_model(name)
            .ok_or_else(|| Error::configuration(format!("unknown model {}", name)))
    }

    /// Find a model by name
    pub fn find_model(&self, name: &str) -> Option<&ModelDef> {
        debug!("Searching for model definition: {}", name);
        let found = self.models.get(name);
        if found.is_none() {
            debug!("Model {} not found", name);
        }
        found
    }

    pub fn view(&self, name: &str) -> Result<&ViewDef> {
        self.views
            .get(name)
            .ok_or_else(|| Error::configuration(format!("unknown view {}", name)))
    }

    pub fn views(&self) -> impl Iterator<Item = &ViewDef> {
        self.views.values()
    }

    /// Look up a field of `model`; `pk` resolves to the primary key
    pub fn model_field<'a>(&'a self, model: &'a ModelDef, name: &str) -> Option<ResolvedField<'a>> {
        let field = model.field(name)?;
        let primary_key = name == "pk" || name == model.pk;
        Some(ResolvedField {
            model,
            field,
            primary_key,
        })
    }

    /// The model on the other side of the relation `source` of `model`
    pub fn related_model(&self, model: &ModelDef, source: &str) -> Option<&ModelDef> {
        let field = model.field(source)?;
        if !field.kind.is_relation() {
            debug!("{}.{} is not a relation", model.name, source);
            return None;
        }
        let target = field.to.as_deref()?;
        self.find_model(target)
    }

    /// Resolve the model field a relation ultimately stores.
    ///
    /// Follows primary keys that are themselves relations (one-to-one parents) until a
    /// concrete field is reached.
    pub fn relation_target<'a>(
        &'a self,
        model: &'a ModelDef,
        target_field: &str,
    ) -> Option<ResolvedField<'a>> {
        let mut resolving_stack = HashSet::new();
        let mut current = self.model_field(model, target_field)?;
        while current.field.kind.is_relation() {
            if !resolving_stack.insert(current.model.name.clone()) {
                warn!(
                    "Circular relation detected while resolving {}.{}",
                    model.name, target_field
                );
                return None;
            }
            let next = current.field.to.as_deref().and_then(|to| self.find_model(to))?;
            current = self.model_field(next, "pk")?;
        }
        Some(current)
    }

    /// Resolve the model field behind a related serializer field.
    ///
    /// The related model comes from the field's declared queryset model or, failing that,
    /// from the relation `source` on the model of `parent`.
    pub fn resolve_related_field<'a>(
        &'a self,
        field: &FieldDef,
        field_name: &str,
        parent: Option<&SerializerDef>,
        view_model: Option<&str>,
    ) -> Option<ResolvedField<'a>> {
        let (queryset_model, target_field) = match &field.kind {
            FieldKind::PrimaryKeyRelated { queryset_model, .. } => (queryset_model, "pk"),
            FieldKind::SlugRelated {
                queryset_model,
                slug_field,
            } => (queryset_model, slug_field.as_str()),
            _ => return None,
        };
        let model = match queryset_model {
            Some(name) => self.find_model(name)?,
            None => {
                let this_model = parent
                    .and_then(|p| p.model.as_deref())
                    .or(view_model)
                    .and_then(|name| self.find_model(name))?;
                let source = field.source.as_deref().unwrap_or(field_name);
                self.related_model(this_model, source)?
            }
        };
        self.relation_target(model, target_field)
    }

    fn check_names(&self) -> Result<()> {
        for serializer in self.serializers.values() {
            for (name, field) in &serializer.fields {
                if let Some(target) = nested_serializer(field) {
                    if !self.serializers.contains_key(target) {
                        return Err(Error::configuration(format!(
                            "field {}.{} refers to unknown serializer {}",
                            serializer.name, name, target
                        )));
                    }
                }
            }
            if let Some(model) = &serializer.model {
                if !self.models.contains_key(model) {
                    warn!("Serializer {} uses undeclared model {}", serializer.name, model);
                }
            }
        }
        for view in self.views.values() {
            let mut names: Vec<&String> = view.serializer.iter().collect();
            for overrides in view.overrides.values() {
                names.extend(overrides.query_serializer.iter());
            }
            for name in names {
                if !self.serializers.contains_key(name) {
                    return Err(Error::configuration(format!(
                        "view {} refers to unknown serializer {}",
                        view.name, name
                    )));
                }
            }
        }
        Ok(())
    }
}

fn nested_serializer(field: &FieldDef) -> Option<&str> {
    match &field.kind {
        FieldKind::Serializer { serializer, .. } | FieldKind::Recursive { serializer, .. } => {
            Some(serializer)
        }
        FieldKind::Method {
            serializer: Some(serializer),
            ..
        } => Some(serializer),
        FieldKind::List { child } | FieldKind::ManyRelated { child } => nested_serializer(child),
        FieldKind::Dict { child: Some(child) } => nested_serializer(child),
        _ => None,
    }
}

fn insert_unique<T: Clone>(
    into: &mut IndexMap<String, T>,
    name: &str,
    item: &T,
    what: &str,
) -> Result<()> {
    if into.contains_key(name) {
        return Err(Error::configuration(format!("duplicate {} {}", what, name)));
    }
    into.insert(name.to_string(), item.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ModelFieldKind;

    fn create_resolver_from_yaml(yaml: &str) -> TypeResolver {
        let api: ApiDescription = serde_yaml::from_str(yaml).unwrap();
        TypeResolver::new(&api).unwrap()
    }

    const SHOP: &str = r#"
models:
  - name: Category
    fields:
      id: {kind: auto}
      slug: {kind: slug}
  - name: Product
    pk: sku
    fields:
      sku: {kind: char}
      category: {kind: foreign_key, to: Category}
  - name: Special
    pk: product
    fields:
      product: {kind: one_to_one, to: Product}
serializers:
  - name: ProductSerializer
    model: Product
    fields:
      category:
        type: primary_key_related
      category_slug:
        type: slug_related
        slug_field: slug
        source: category
  - name: SpecialSerializer
    fields:
      special:
        type: primary_key_related
        queryset_model: Special
views:
  - name: ProductViewSet
    serializer: ProductSerializer
"#;

    #[test]
    fn test_lookup_by_name() {
        let resolver = create_resolver_from_yaml(SHOP);
        assert!(resolver.serializer("ProductSerializer").is_ok());
        assert!(resolver.view("ProductViewSet").is_ok());
        let err = resolver.serializer("Missing").unwrap_err();
        assert_eq!(err.to_string(), "configuration error: unknown serializer Missing");
        assert!(resolver.find_model("Nope").is_none());
    }

    #[test]
    fn test_resolve_pk_through_parent_model() {
        let resolver = create_resolver_from_yaml(SHOP);
        let serializer = resolver.serializer("ProductSerializer").unwrap();
        let field = &serializer.fields["category"];
        let resolved = resolver
            .resolve_related_field(field, "category", Some(serializer), None)
            .unwrap();
        assert_eq!(resolved.model.name, "Category");
        assert_eq!(resolved.field.kind, ModelFieldKind::Auto);
        assert!(resolved.primary_key);
    }

    #[test]
    fn test_resolve_slug_through_source() {
        let resolver = create_resolver_from_yaml(SHOP);
        let serializer = resolver.serializer("ProductSerializer").unwrap();
        let field = &serializer.fields["category_slug"];
        let resolved = resolver
            .resolve_related_field(field, "category_slug", Some(serializer), None)
            .unwrap();
        assert_eq!(resolved.field.kind, ModelFieldKind::Slug);
        assert!(!resolved.primary_key);
    }

    #[test]
    fn test_resolve_pk_that_is_a_relation() {
        let resolver = create_resolver_from_yaml(SHOP);
        let serializer = resolver.serializer("SpecialSerializer").unwrap();
        let field = &serializer.fields["special"];
        let resolved = resolver
            .resolve_related_field(field, "special", Some(serializer), None)
            .unwrap();
        assert_eq!(resolved.model.name, "Product");
        assert_eq!(resolved.field.kind, ModelFieldKind::Char);
    }

    #[test]
    fn test_circular_relation_detection() {
        let resolver = create_resolver_from_yaml(
            r#"
models:
  - name: A
    pk: b
    fields:
      b: {kind: one_to_one, to: B}
  - name: B
    pk: a
    fields:
      a: {kind: one_to_one, to: A}
"#,
        );
        let a = resolver.model("A").unwrap();
        assert!(resolver.relation_target(a, "pk").is_none());
    }

    #[test]
    fn test_unknown_nested_serializer_is_rejected() {
        let api: ApiDescription = serde_yaml::from_str(
            r#"
serializers:
  - name: OrderSerializer
    fields:
      lines:
        type: list
        child: {type: serializer, serializer: LineSerializer}
"#,
        )
        .unwrap();
        let err = TypeResolver::new(&api).err().unwrap();
        assert!(err.to_string().contains("unknown serializer LineSerializer"));
    }
}
