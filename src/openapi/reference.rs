//! `$ref` objects and the write-once registry of named components they point into.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Pointer prefix of 2.0 documents (`#/definitions/Name`)
pub const SWAGGER_REF_PREFIX: &str = "#/";
/// Pointer prefix of 3.0 documents (`#/components/schemas/Name`)
pub const COMPONENTS_REF_PREFIX: &str = "#/components/";

/// Named storage scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Definitions,
    Parameters,
    Responses,
    Schemas,
    Examples,
    RequestBodies,
    Headers,
    SecuritySchemes,
    Links,
    Callbacks,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Definitions => "definitions",
            Scope::Parameters => "parameters",
            Scope::Responses => "responses",
            Scope::Schemas => "schemas",
            Scope::Examples => "examples",
            Scope::RequestBodies => "requestBodies",
            Scope::Headers => "headers",
            Scope::SecuritySchemes => "securitySchemes",
            Scope::Links => "links",
            Scope::Callbacks => "callbacks",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "definitions" => Some(Scope::Definitions),
            "parameters" => Some(Scope::Parameters),
            "responses" => Some(Scope::Responses),
            "schemas" => Some(Scope::Schemas),
            "examples" => Some(Scope::Examples),
            "requestBodies" => Some(Scope::RequestBodies),
            "headers" => Some(Scope::Headers),
            "securitySchemes" => Some(Scope::SecuritySchemes),
            "links" => Some(Scope::Links),
            "callbacks" => Some(Scope::Callbacks),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Objects that can be stored in a [`ReferenceResolver`] and pointed at by a [`Reference`].
pub trait Referenceable {
    /// Type name used when a reference points at the wrong kind of object
    fn type_name(&self) -> &'static str;
}

fn ref_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#/(?P<scope>.+)/(?P<name>[^/]+)$").expect("reference pattern is valid")
    })
}

/// A JSON reference. Its only content is the `$ref` pointer, which cannot be changed
/// once the object exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pointer: String,
}

impl Reference {
    /// Create a reference to `name` in `scope`.
    ///
    /// Unless `ignore_unresolved` is set, the target must already be registered and be of
    /// `expected_type`. Names reserved through [`ReferenceResolver::reserve`] but not yet
    /// committed count as unresolved.
    pub fn new<T: Referenceable>(
        resolver: &ReferenceResolver<T>,
        scope: Scope,
        name: &str,
        expected_type: &'static str,
        ignore_unresolved: bool,
    ) -> Result<Self> {
        let pointer = resolver.pointer(scope, name);
        if !ignore_unresolved {
            let target = resolver.get(scope, name)?;
            if target.type_name() != expected_type {
                return Err(Error::reference(format!(
                    "{} is a {}, not a {}",
                    pointer,
                    target.type_name(),
                    expected_type
                )));
            }
        }
        Ok(Self { pointer })
    }

    /// Reference to a named schema in the resolver's schema scope.
    pub fn schema<T: Referenceable>(
        resolver: &ReferenceResolver<T>,
        name: &str,
        ignore_unresolved: bool,
    ) -> Result<Self> {
        let scope = resolver.schema_scope()?;
        Reference::new(resolver, scope, name, "Schema", ignore_unresolved)
    }

    /// Wrap an already formed pointer without checking it against any resolver.
    pub fn from_pointer(pointer: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
        }
    }

    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Split the pointer into its `(scope path, name)` parts.
    pub fn target(&self) -> Option<(&str, &str)> {
        let captures = ref_name_re().captures(&self.pointer)?;
        let scope = captures.name("scope")?.as_str();
        let name = captures.name("name")?.as_str();
        Some((scope, name))
    }

    /// Look up the referenced object.
    pub fn resolve<'r, T: Referenceable>(&self, resolver: &'r ReferenceResolver<T>) -> Result<&'r T> {
        let (scope, name) = resolver.parse_pointer(&self.pointer)?;
        resolver.get(scope, &name)
    }

    /// Reference objects carry nothing but `$ref`, and `$ref` is fixed at construction.
    pub fn set(&mut self, attr: &str, _value: serde_json::Value) -> Result<()> {
        debug!("Rejected attempt to set {} on {}", attr, self.pointer);
        Err(Error::ReferenceImmutable)
    }

    pub fn remove(&mut self, attr: &str) -> Result<()> {
        debug!("Rejected attempt to delete {} from {}", attr, self.pointer);
        Err(Error::ReferenceImmutable)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReference {
    #[serde(rename = "$ref")]
    pointer: String,
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RawReference {
            pointer: self.pointer.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Reference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawReference::deserialize(deserializer)?;
        Ok(Reference::from_pointer(raw.pointer))
    }
}

/// Registry of named objects, grouped by [`Scope`].
///
/// Names are write-once. A name can be reserved before its object exists so that
/// recursive structures can point at themselves while they are being built; the owner
/// recorded with the reservation identifies what produced the definition.
#[derive(Debug, Clone)]
pub struct ReferenceResolver<T> {
    prefix: &'static str,
    objects: IndexMap<Scope, IndexMap<String, T>>,
    pending: HashMap<(Scope, String), Option<String>>,
    owners: HashMap<(Scope, String), String>,
}

impl<T: Referenceable> ReferenceResolver<T> {
    pub fn new(prefix: &'static str, scopes: &[Scope]) -> Self {
        let mut objects = IndexMap::new();
        for scope in scopes {
            objects.entry(*scope).or_insert_with(IndexMap::new);
        }
        Self {
            prefix,
            objects,
            pending: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// A resolver laid out like a 2.0 document root.
    pub fn swagger() -> Self {
        Self::new(
            SWAGGER_REF_PREFIX,
            &[Scope::Definitions, Scope::Parameters, Scope::Responses],
        )
    }

    /// A resolver laid out like 3.0 `components`.
    pub fn components() -> Self {
        Self::new(
            COMPONENTS_REF_PREFIX,
            &[
                Scope::Schemas,
                Scope::Responses,
                Scope::Parameters,
                Scope::Examples,
                Scope::RequestBodies,
                Scope::Headers,
                Scope::SecuritySchemes,
                Scope::Links,
                Scope::Callbacks,
            ],
        )
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// The scope that named schemas live in.
    pub fn schema_scope(&self) -> Result<Scope> {
        [Scope::Definitions, Scope::Schemas]
            .into_iter()
            .find(|scope| self.objects.contains_key(scope))
            .ok_or_else(|| Error::reference("resolver has no schema scope"))
    }

    pub fn scopes(&self) -> Vec<Scope> {
        self.objects.keys().copied().collect()
    }

    pub fn pointer(&self, scope: Scope, name: &str) -> String {
        format!("{}{}/{}", self.prefix, scope, name)
    }

    /// Parse a pointer produced by this resolver back into scope and name.
    pub fn parse_pointer(&self, pointer: &str) -> Result<(Scope, String)> {
        let invalid = || Error::reference(format!("{} is not a valid reference", pointer));
        let captures = ref_name_re().captures(pointer).ok_or_else(invalid)?;
        let scope_path = captures.name("scope").ok_or_else(invalid)?.as_str();
        let name = captures.name("name").ok_or_else(invalid)?.as_str();
        let scope_name = format!("#/{}/", scope_path)
            .strip_prefix(self.prefix)
            .map(|s| s.trim_end_matches('/').to_string())
            .ok_or_else(invalid)?;
        let scope = Scope::parse(&scope_name).ok_or_else(invalid)?;
        Ok((scope, name.to_string()))
    }

    fn scope_map(&self, scope: Scope) -> Result<&IndexMap<String, T>> {
        self.objects
            .get(&scope)
            .ok_or_else(|| Error::reference(format!("invalid scope {}", scope)))
    }

    fn scope_map_mut(&mut self, scope: Scope) -> Result<&mut IndexMap<String, T>> {
        self.objects
            .get_mut(&scope)
            .ok_or_else(|| Error::reference(format!("invalid scope {}", scope)))
    }

    /// Bind this resolver to one scope.
    pub fn with_scope(&mut self, scope: Scope) -> Result<ScopedResolver<'_, T>> {
        if !self.objects.contains_key(&scope) {
            return Err(Error::reference(format!("unknown scope {}", scope)));
        }
        Ok(ScopedResolver {
            resolver: self,
            scope,
        })
    }

    /// Store `obj` under `name`; fails if the name is already taken.
    pub fn set(&mut self, scope: Scope, name: &str, obj: T) -> Result<()> {
        let pointer = self.pointer(scope, name);
        let objects = self.scope_map_mut(scope)?;
        if objects.contains_key(name) {
            return Err(Error::reference(format!("{} already exists", pointer)));
        }
        objects.insert(name.to_string(), obj);
        Ok(())
    }

    /// Fetch an object; fails if it was never registered.
    pub fn get(&self, scope: Scope, name: &str) -> Result<&T> {
        self.scope_map(scope)?
            .get(name)
            .ok_or_else(|| Error::reference(format!("{} is not defined", self.pointer(scope, name))))
    }

    pub(crate) fn get_mut(&mut self, scope: Scope, name: &str) -> Result<&mut T> {
        let pointer = self.pointer(scope, name);
        self.scope_map_mut(scope)?
            .get_mut(name)
            .ok_or_else(|| Error::reference(format!("{} is not defined", pointer)))
    }

    /// Fetch an object, or `None` when it does not exist.
    pub fn get_or_none(&self, scope: Scope, name: &str) -> Result<Option<&T>> {
        Ok(self.scope_map(scope)?.get(name))
    }

    pub fn has(&self, scope: Scope, name: &str) -> Result<bool> {
        Ok(self.scope_map(scope)?.contains_key(name))
    }

    /// Names registered in `scope`, in registration order.
    pub fn keys(&self, scope: Scope) -> Result<Vec<&str>> {
        Ok(self.scope_map(scope)?.keys().map(String::as_str).collect())
    }

    pub fn iter_scope(&self, scope: Scope) -> Result<impl Iterator<Item = (&String, &T)>> {
        Ok(self.scope_map(scope)?.iter())
    }

    /// Reserve `name` for an object that is still being built.
    ///
    /// Returns `false` without reserving if the name is already registered or reserved.
    pub fn reserve(&mut self, scope: Scope, name: &str, owner: Option<&str>) -> Result<bool> {
        if self.has(scope, name)? || self.is_pending(scope, name) {
            return Ok(false);
        }
        debug!("Reserved {}", self.pointer(scope, name));
        self.pending
            .insert((scope, name.to_string()), owner.map(str::to_string));
        Ok(true)
    }

    /// Store the object for a reserved name.
    pub fn commit(&mut self, scope: Scope, name: &str, obj: T) -> Result<()> {
        let key = (scope, name.to_string());
        let owner = self.pending.remove(&key).ok_or_else(|| {
            Error::reference(format!("{} was not reserved", self.pointer(scope, name)))
        })?;
        self.set(scope, name, obj)?;
        if let Some(owner) = owner {
            self.owners.insert(key, owner);
        }
        Ok(())
    }

    /// Drop a reservation whose object could not be built.
    pub fn release(&mut self, scope: Scope, name: &str) {
        self.pending.remove(&(scope, name.to_string()));
    }

    pub fn is_pending(&self, scope: Scope, name: &str) -> bool {
        self.pending.contains_key(&(scope, name.to_string()))
    }

    /// What produced the object registered (or reserved) under `name`, if recorded.
    pub fn owner(&self, scope: Scope, name: &str) -> Option<&str> {
        let key = (scope, name.to_string());
        match self.pending.get(&key) {
            Some(owner) => owner.as_deref(),
            None => self.owners.get(&key).map(String::as_str),
        }
    }

    /// Take every object out of `scope`, leaving it empty.
    pub fn take_scope(&mut self, scope: Scope) -> Result<IndexMap<String, T>> {
        Ok(std::mem::take(self.scope_map_mut(scope)?))
    }
}

/// A [`ReferenceResolver`] bound to one scope.
pub struct ScopedResolver<'r, T> {
    resolver: &'r mut ReferenceResolver<T>,
    scope: Scope,
}

impl<'r, T: Referenceable> ScopedResolver<'r, T> {
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Checks an explicitly requested scope against the bound one.
    pub fn check_scope(&self, scope: Option<Scope>) -> Result<Scope> {
        match scope {
            Some(requested) if requested != self.scope => Err(Error::reference(format!(
                "cannot override forced scope {} with {}",
                self.scope, requested
            ))),
            _ => Ok(self.scope),
        }
    }

    pub fn set(&mut self, name: &str, obj: T) -> Result<()> {
        self.resolver.set(self.scope, name, obj)
    }

    pub fn get(&self, name: &str) -> Result<&T> {
        self.resolver.get(self.scope, name)
    }

    pub fn get_or_none(&self, name: &str) -> Result<Option<&T>> {
        self.resolver.get_or_none(self.scope, name)
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        self.resolver.has(self.scope, name)
    }

    pub fn keys(&self) -> Result<Vec<&str>> {
        self.resolver.keys(self.scope)
    }

    pub fn reserve(&mut self, name: &str, owner: Option<&str>) -> Result<bool> {
        self.resolver.reserve(self.scope, name, owner)
    }

    pub fn commit(&mut self, name: &str, obj: T) -> Result<()> {
        self.resolver.commit(self.scope, name, obj)
    }

    pub fn release(&mut self, name: &str) {
        self.resolver.release(self.scope, name)
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.resolver.is_pending(self.scope, name)
    }

    pub fn owner(&self, name: &str) -> Option<&str> {
        self.resolver.owner(self.scope, name)
    }

    pub fn resolver(&self) -> &ReferenceResolver<T> {
        self.resolver
    }
}

fn collect_pointers<'v>(value: &'v serde_json::Value, out: &mut Vec<&'v str>) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(pointer)) = map.get("$ref") {
                out.push(pointer);
            }
            for (key, child) in map {
                if key != "$ref" {
                    collect_pointers(child, out);
                }
            }
        }
        serde_json::Value::Array(values) => {
            for child in values {
                collect_pointers(child, out);
            }
        }
        _ => {}
    }
}

/// Checks that every `$ref` in a serialized document points at a value inside it.
pub fn check_references(document: &serde_json::Value) -> Result<()> {
    let mut pointers = Vec::new();
    collect_pointers(document, &mut pointers);
    for pointer in &pointers {
        let local = pointer.strip_prefix('#').ok_or_else(|| {
            Error::reference(format!("{} is not a document-local reference", pointer))
        })?;
        if document.pointer(local).is_none() {
            return Err(Error::reference(format!("dangling reference {}", pointer)));
        }
    }
    debug!("Checked {} references", pointers.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    enum Thing {
        Schema(&'static str),
        Parameter(&'static str),
    }

    impl Referenceable for Thing {
        fn type_name(&self) -> &'static str {
            match self {
                Thing::Schema(_) => "Schema",
                Thing::Parameter(_) => "Parameter",
            }
        }
    }

    #[test]
    fn test_scoped_set_and_get() {
        let mut resolver = ReferenceResolver::<Thing>::swagger();
        {
            let mut definitions = resolver.with_scope(Scope::Definitions).unwrap();
            definitions.set("Article", Thing::Schema("article")).unwrap();
            assert!(definitions.has("Article").unwrap());
            assert_eq!(definitions.get("Article").unwrap(), &Thing::Schema("article"));
        }
        assert_eq!(resolver.keys(Scope::Definitions).unwrap(), vec!["Article"]);
        assert!(resolver.keys(Scope::Parameters).unwrap().is_empty());
    }

    #[test]
    fn test_set_is_write_once() {
        let mut resolver = ReferenceResolver::<Thing>::swagger();
        resolver.set(Scope::Definitions, "A", Thing::Schema("a")).unwrap();
        let err = resolver
            .set(Scope::Definitions, "A", Thing::Schema("b"))
            .unwrap_err();
        assert!(err.to_string().contains("#/definitions/A already exists"), "{}", err);
        assert_eq!(resolver.get(Scope::Definitions, "A").unwrap(), &Thing::Schema("a"));
    }

    #[test]
    fn test_get_missing_is_error_and_get_or_none_is_not() {
        let resolver = ReferenceResolver::<Thing>::swagger();
        let err = resolver.get(Scope::Definitions, "Nope").unwrap_err();
        assert!(err.to_string().contains("#/definitions/Nope is not defined"));
        assert_eq!(resolver.get_or_none(Scope::Definitions, "Nope").unwrap(), None);
    }

    #[test]
    fn test_unknown_scope_is_error() {
        let mut resolver = ReferenceResolver::<Thing>::swagger();
        assert!(resolver.with_scope(Scope::Schemas).is_err());
        assert!(resolver.has(Scope::Callbacks, "x").is_err());
    }

    #[test]
    fn test_scoped_resolver_rejects_other_scope() {
        let mut resolver = ReferenceResolver::<Thing>::swagger();
        let scoped = resolver.with_scope(Scope::Definitions).unwrap();
        assert_eq!(scoped.check_scope(None).unwrap(), Scope::Definitions);
        assert_eq!(
            scoped.check_scope(Some(Scope::Definitions)).unwrap(),
            Scope::Definitions
        );
        let err = scoped.check_scope(Some(Scope::Parameters)).unwrap_err();
        assert!(err.to_string().contains("cannot override forced scope"));
    }

    #[test]
    fn test_reference_requires_existing_target() {
        let mut resolver = ReferenceResolver::<Thing>::swagger();
        assert!(Reference::schema(&resolver, "User", false).is_err());

        let forward = Reference::schema(&resolver, "User", true).unwrap();
        assert_eq!(forward.pointer(), "#/definitions/User");

        resolver.set(Scope::Definitions, "User", Thing::Schema("user")).unwrap();
        let reference = Reference::schema(&resolver, "User", false).unwrap();
        assert_eq!(reference.resolve(&resolver).unwrap(), &Thing::Schema("user"));
        assert_eq!(reference.target(), Some(("definitions", "User")));
    }

    #[test]
    fn test_reference_checks_target_type() {
        let mut resolver = ReferenceResolver::<Thing>::swagger();
        resolver.set(Scope::Definitions, "P", Thing::Parameter("p")).unwrap();
        let err = Reference::schema(&resolver, "P", false).unwrap_err();
        assert!(err.to_string().contains("is a Parameter, not a Schema"), "{}", err);
    }

    #[test]
    fn test_reference_is_immutable() {
        let mut reference = Reference::from_pointer("#/definitions/User");
        assert!(matches!(
            reference.set("description", serde_json::json!("x")),
            Err(Error::ReferenceImmutable)
        ));
        assert!(matches!(reference.remove("$ref"), Err(Error::ReferenceImmutable)));
        assert_eq!(reference.pointer(), "#/definitions/User");
    }

    #[test]
    fn test_reference_serde() {
        let reference = Reference::from_pointer("#/definitions/User");
        let value = serde_json::to_value(&reference).unwrap();
        assert_eq!(value, serde_json::json!({"$ref": "#/definitions/User"}));
        let back: Reference = serde_json::from_value(value).unwrap();
        assert_eq!(back, reference);
        assert!(serde_json::from_value::<Reference>(
            serde_json::json!({"$ref": "#/definitions/User", "description": "x"})
        )
        .is_err());
    }

    #[test]
    fn test_components_pointers() {
        let mut components = ReferenceResolver::<Thing>::components();
        components.set(Scope::Schemas, "Pet", Thing::Schema("pet")).unwrap();
        let reference = Reference::schema(&components, "Pet", false).unwrap();
        assert_eq!(reference.pointer(), "#/components/schemas/Pet");
        assert_eq!(
            components.parse_pointer("#/components/schemas/Pet").unwrap(),
            (Scope::Schemas, "Pet".to_string())
        );
        assert!(components.parse_pointer("#/definitions/Pet").is_err());
    }

    #[test]
    fn test_reserve_commit_cycle() {
        let mut resolver = ReferenceResolver::<Thing>::swagger();
        assert!(resolver
            .reserve(Scope::Definitions, "Category", Some("CategorySerializer"))
            .unwrap());
        assert!(resolver.is_pending(Scope::Definitions, "Category"));
        assert!(!resolver.reserve(Scope::Definitions, "Category", None).unwrap());
        assert_eq!(
            resolver.owner(Scope::Definitions, "Category"),
            Some("CategorySerializer")
        );

        resolver
            .commit(Scope::Definitions, "Category", Thing::Schema("category"))
            .unwrap();
        assert!(!resolver.is_pending(Scope::Definitions, "Category"));
        assert!(resolver.has(Scope::Definitions, "Category").unwrap());
        assert_eq!(
            resolver.owner(Scope::Definitions, "Category"),
            Some("CategorySerializer")
        );
        assert!(resolver
            .commit(Scope::Definitions, "Category", Thing::Schema("again"))
            .is_err());
    }

    #[test]
    fn test_check_references() {
        let document = serde_json::json!({
            "paths": {"/a/": {"get": {"schema": {"$ref": "#/definitions/A"}}}},
            "definitions": {"A": {"type": "object", "properties": {
                "self": {"$ref": "#/definitions/A"}
            }}}
        });
        assert!(check_references(&document).is_ok());

        let dangling = serde_json::json!({
            "paths": {"/a/": {"get": {"schema": {"$ref": "#/definitions/B"}}}},
            "definitions": {}
        });
        let err = check_references(&dangling).unwrap_err();
        assert!(err.to_string().contains("dangling reference #/definitions/B"));
    }
}
