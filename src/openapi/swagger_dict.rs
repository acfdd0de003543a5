//! Attribute-name canonicalization and the free-form key map carried by every schema object.
//!
//! Declared attributes of the typed objects are mapped to their wire keys at compile time
//! through serde renames. Anything else (vendor extensions, attributes the typed structs do
//! not declare) lives in a [`SwaggerDict`], which applies [`make_swagger_name`] on every access.

use heck::ToLowerCamelCase;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Convert a semantic attribute name into its wire-format key.
///
/// * `ref` becomes `$ref`
/// * `x_vendor_name` becomes `x-vendorName`
/// * names already in wire form (`$ref`, `x-...`) are returned unchanged
/// * everything else is camelCased, with trailing underscores stripped (`in_` -> `in`)
pub fn make_swagger_name(attribute_name: &str) -> String {
    if attribute_name == "ref" || attribute_name == "$ref" {
        return "$ref".to_string();
    }
    if attribute_name.starts_with("x-") {
        return attribute_name.to_string();
    }
    if let Some(rest) = attribute_name.strip_prefix("x_") {
        return format!("x-{}", rest.to_lower_camel_case());
    }
    attribute_name.trim_end_matches('_').to_lower_camel_case()
}

/// Ordered attribute map used for extension and undeclared keys.
///
/// Keys set through [`SwaggerDict::set`] are canonicalized. Attribute names starting
/// with `_` are private state: they can be read back but never reach the output, and
/// they do not take part in equality.
#[derive(Debug, Clone, Default)]
pub struct SwaggerDict {
    entries: IndexMap<String, Value>,
    private: IndexMap<String, Value>,
}

impl SwaggerDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dict from `(attribute, value)` pairs, inserted in sorted attribute order.
    pub fn from_attrs<I, K>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut pairs: Vec<(String, Value)> =
            attrs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let mut dict = Self::new();
        for (attr, value) in pairs {
            dict.set(&attr, Some(value));
        }
        dict
    }

    /// Set an attribute. `None` (or JSON `null`) removes the key instead.
    pub fn set(&mut self, attr: &str, value: impl Into<Option<Value>>) {
        let value = value.into().filter(|v| !v.is_null());
        if attr.starts_with('_') {
            match value {
                Some(v) => self.private.insert(attr.to_string(), v),
                None => self.private.shift_remove(attr),
            };
            return;
        }
        let key = make_swagger_name(attr);
        match value {
            Some(v) => {
                self.entries.insert(key, v);
            }
            None => {
                if self.entries.shift_remove(&key).is_some() {
                    debug!("Removed attribute {} ({})", attr, key);
                }
            }
        }
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        if attr.starts_with('_') {
            return self.private.get(attr);
        }
        self.entries.get(&make_swagger_name(attr))
    }

    pub fn remove(&mut self, attr: &str) -> Option<Value> {
        if attr.starts_with('_') {
            return self.private.shift_remove(attr);
        }
        self.entries.shift_remove(&make_swagger_name(attr))
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.get(attr).is_some()
    }

    /// Public `(wire key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every public entry of `other` that is not already present.
    pub fn merge_missing(&mut self, other: &SwaggerDict) {
        for (key, value) in other.iter() {
            if !self.entries.contains_key(key) {
                self.entries.insert(key.clone(), value.clone());
            }
        }
    }
}

impl PartialEq for SwaggerDict {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for SwaggerDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SwaggerDict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut dict = SwaggerDict::new();
        for (key, value) in raw {
            dict.set(&key, Some(value));
        }
        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_make_swagger_name() {
        assert_eq!(make_swagger_name("ref"), "$ref");
        assert_eq!(make_swagger_name("x_vendor_ext"), "x-vendorExt");
        assert_eq!(make_swagger_name("x_nullable"), "x-nullable");
        assert_eq!(make_swagger_name("in_"), "in");
        assert_eq!(make_swagger_name("additional_properties"), "additionalProperties");
        assert_eq!(make_swagger_name("terms_of_service"), "termsOfService");
        assert_eq!(make_swagger_name("open_id_connect_url"), "openIdConnectUrl");
        assert_eq!(make_swagger_name("title"), "title");
    }

    #[test]
    fn test_make_swagger_name_is_idempotent_on_wire_keys() {
        for key in ["$ref", "x-nullable", "additionalProperties", "readOnly", "in"] {
            assert_eq!(make_swagger_name(key), key, "wire key {} changed", key);
        }
    }

    #[test]
    fn test_set_none_removes_key() {
        let mut dict = SwaggerDict::new();
        dict.set("x_foo", Some(json!(1)));
        assert_eq!(dict.get("x_foo"), Some(&json!(1)));
        assert!(dict.contains("x-foo"));

        dict.set("x_foo", None);
        assert!(dict.is_empty());

        dict.set("x_bar", Some(Value::Null));
        assert!(dict.is_empty(), "null values must not create keys");
    }

    #[test]
    fn test_private_attributes_are_not_serialized() {
        let mut dict = SwaggerDict::new();
        dict.set("_owner", Some(json!("UserSerializer")));
        dict.set("x_visible", Some(json!(true)));

        assert_eq!(dict.get("_owner"), Some(&json!("UserSerializer")));
        assert_eq!(serde_json::to_value(&dict).unwrap(), json!({"x-visible": true}));

        let mut other = SwaggerDict::new();
        other.set("x_visible", Some(json!(true)));
        assert_eq!(dict, other, "private state must not affect equality");
    }

    #[test]
    fn test_from_attrs_sorts_keys() {
        let dict = SwaggerDict::from_attrs(vec![
            ("x_zeta", json!(1)),
            ("x_alpha", json!(2)),
            ("x_mid", json!(3)),
        ]);
        let keys: Vec<&String> = dict.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x-alpha", "x-mid", "x-zeta"]);
    }

    #[test]
    fn test_deserialize_keeps_wire_keys() {
        let dict: SwaggerDict =
            serde_json::from_value(json!({"x-logo": {"url": "a.png"}, "x-tag-group": 1}))
                .unwrap();
        assert_eq!(dict.get("x-logo"), Some(&json!({"url": "a.png"})));
        assert_eq!(dict.len(), 2);
    }
}
