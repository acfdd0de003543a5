//! Serializer, field and model descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A composite type: named, ordered fields converted into an object schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializerDef {
    /// Unique name, may be dotted (`shop.ProductSerializer`)
    pub name: String,
    /// Explicit reference name. An explicit `null` forces the serializer inline.
    #[serde(default, with = "explicit_option", skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<Option<String>>,
    /// Model backing the serializer, used to type relations and choices
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDef>,
}

impl SerializerDef {
    /// The definition name of this serializer.
    ///
    /// An explicit `ref_name` wins; otherwise the last dotted segment of the name with a
    /// trailing `Serializer` stripped. `None` means the serializer must be inlined.
    pub fn ref_name(&self) -> Option<String> {
        match &self.ref_name {
            Some(explicit) => explicit.clone(),
            None => {
                let short = self.name.rsplit('.').next().unwrap_or(&self.name);
                let stripped = short.strip_suffix("Serializer").unwrap_or(short);
                if stripped.is_empty() {
                    None
                } else {
                    Some(stripped.to_string())
                }
            }
        }
    }

    /// Whether the reference name was set explicitly.
    pub fn has_explicit_ref_name(&self) -> bool {
        self.ref_name.is_some()
    }
}

mod explicit_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<String>>, D::Error> {
        Ok(Some(Option::<String>::deserialize(deserializer)?))
    }

    pub fn serialize<S: Serializer>(
        value: &Option<Option<String>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }
}

/// One field of a serializer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Defaults to `true` unless the field is read-only or declares a default
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub allow_null: bool,
    /// String fields reject blank input unless this is set
    #[serde(default)]
    pub allow_blank: bool,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub validators: Vec<ValidatorDef>,
    #[serde(default)]
    pub default: Option<DefaultDef>,
    /// Attribute of the model this field reads from, when it differs from the field name
    #[serde(default)]
    pub source: Option<String>,
}

impl FieldDef {
    pub fn new(kind: FieldKind) -> Self {
        FieldDef {
            kind,
            required: None,
            read_only: false,
            allow_null: false,
            allow_blank: false,
            help_text: None,
            label: None,
            validators: Vec::new(),
            default: None,
            source: None,
        }
    }

    /// A field standing for a whole serializer, as used for request and response bodies.
    pub fn nested(serializer: impl Into<String>, many: bool) -> Self {
        FieldDef::new(FieldKind::Serializer {
            serializer: serializer.into(),
            many,
        })
    }

    pub fn is_required(&self) -> bool {
        self.required
            .unwrap_or(!self.read_only && self.default.is_none())
    }

    /// Whether the field accepts the `allow_blank` flag at all.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Char
                | FieldKind::Email
                | FieldKind::Slug
                | FieldKind::Url
                | FieldKind::IpAddress { .. }
                | FieldKind::Uuid
                | FieldKind::Regex { .. }
                | FieldKind::Choice { .. }
                | FieldKind::MultipleChoice { .. }
        )
    }
}

/// Field categories, tagged by `type` in descriptor files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Homogeneous list of `child`
    List { child: Box<FieldDef> },
    /// Nested composite; `many` wraps it in a list
    Serializer {
        serializer: String,
        #[serde(default)]
        many: bool,
    },
    /// List of related objects
    ManyRelated { child: Box<FieldDef> },
    PrimaryKeyRelated {
        /// Model of the related objects, when known
        #[serde(default)]
        queryset_model: Option<String>,
        /// Field converting the primary key, overriding the model's pk type
        #[serde(default)]
        pk_field: Option<Box<FieldDef>>,
    },
    SlugRelated {
        slug_field: String,
        #[serde(default)]
        queryset_model: Option<String>,
    },
    HyperlinkedRelated,
    HyperlinkedIdentity,
    Related,
    Choice { choices: Vec<Value> },
    MultipleChoice { choices: Vec<Value> },
    Boolean,
    NullBoolean,
    Integer,
    Float,
    Decimal {
        /// Overrides the global decimal coercion setting
        #[serde(default)]
        coerce_to_string: Option<bool>,
    },
    Email,
    Slug,
    Url,
    IpAddress {
        #[serde(default)]
        protocol: Option<String>,
    },
    Uuid,
    Regex { regex: String },
    Char,
    Date,
    DateTime,
    Time,
    Duration,
    File {
        #[serde(default)]
        use_url: Option<bool>,
    },
    Image {
        #[serde(default)]
        use_url: Option<bool>,
    },
    /// Map of string keys to `child` values
    Dict {
        #[serde(default)]
        child: Option<Box<FieldDef>>,
    },
    Json,
    Hidden,
    /// Read-only value computed by a serializer method
    Method {
        #[serde(default)]
        returns: Option<TypeHint>,
        #[serde(default)]
        serializer: Option<String>,
        #[serde(default)]
        many: bool,
        /// Docstring of the method
        #[serde(default)]
        doc: Option<String>,
    },
    /// Proxy to a named serializer, usually the enclosing one
    Recursive {
        serializer: String,
        #[serde(default)]
        many: bool,
    },
    ModelField,
    Other {
        #[serde(default)]
        class: Option<String>,
    },
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::List { .. } => "list",
            FieldKind::Serializer { .. } => "serializer",
            FieldKind::ManyRelated { .. } => "many_related",
            FieldKind::PrimaryKeyRelated { .. } => "primary_key_related",
            FieldKind::SlugRelated { .. } => "slug_related",
            FieldKind::HyperlinkedRelated => "hyperlinked_related",
            FieldKind::HyperlinkedIdentity => "hyperlinked_identity",
            FieldKind::Related => "related",
            FieldKind::Choice { .. } => "choice",
            FieldKind::MultipleChoice { .. } => "multiple_choice",
            FieldKind::Boolean => "boolean",
            FieldKind::NullBoolean => "null_boolean",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Decimal { .. } => "decimal",
            FieldKind::Email => "email",
            FieldKind::Slug => "slug",
            FieldKind::Url => "url",
            FieldKind::IpAddress { .. } => "ip_address",
            FieldKind::Uuid => "uuid",
            FieldKind::Regex { .. } => "regex",
            FieldKind::Char => "char",
            FieldKind::Date => "date",
            FieldKind::DateTime => "date_time",
            FieldKind::Time => "time",
            FieldKind::Duration => "duration",
            FieldKind::File { .. } => "file",
            FieldKind::Image { .. } => "image",
            FieldKind::Dict { .. } => "dict",
            FieldKind::Json => "json",
            FieldKind::Hidden => "hidden",
            FieldKind::Method { .. } => "method",
            FieldKind::Recursive { .. } => "recursive",
            FieldKind::ModelField => "model_field",
            FieldKind::Other { .. } => "other",
        }
    }
}

/// Validators attached to a field or model field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorDef {
    MinValue { limit: Number },
    MaxValue { limit: Number },
    MinLength { limit: u64 },
    MaxLength { limit: u64 },
    Regex { pattern: String },
    /// URL validation; its regex is never exported
    Url,
    /// IPv4 validation; its regex is never exported
    Ipv4,
    Email,
    Other {
        #[serde(default)]
        name: Option<String>,
    },
}

/// Declared default of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultDef {
    /// A callable producing the default, e.g. `{callable: list}`
    Callable { callable: String },
    Value(Value),
}

/// Return type hint of a method field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeHint {
    Str,
    Int,
    Float,
    Decimal,
    Bool,
    Date,
    DateTime,
    Uuid,
    Dict,
    /// `Optional[...]`: the inner hint, nullable
    Optional(Box<TypeHint>),
    /// `List[...]` and other collections
    List(Box<TypeHint>),
}

/// A persistence model, used for relation and path parameter typing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    pub name: String,
    #[serde(default)]
    pub verbose_name: Option<String>,
    /// Name of the primary key field
    #[serde(default = "default_pk")]
    pub pk: String,
    #[serde(default)]
    pub fields: IndexMap<String, ModelFieldDef>,
}

fn default_pk() -> String {
    "id".to_string()
}

impl ModelDef {
    /// Look up a field by name; `pk` resolves to the primary key.
    pub fn field(&self, name: &str) -> Option<&ModelFieldDef> {
        let name = if name == "pk" { self.pk.as_str() } else { name };
        self.fields.get(name)
    }

    pub fn verbose_name(&self) -> String {
        self.verbose_name
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFieldDef {
    pub kind: ModelFieldKind,
    /// Target model of relations
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub validators: Vec<ValidatorDef>,
    /// Base field of array-like model fields, used for choice typing
    #[serde(default)]
    pub base_field: Option<Box<ModelFieldDef>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFieldKind {
    Auto,
    BigAuto,
    Integer,
    Float,
    Decimal,
    Boolean,
    Char,
    Text,
    Slug,
    Email,
    Url,
    Uuid,
    Date,
    DateTime,
    Time,
    Duration,
    IpAddress,
    GenericIpAddress,
    Binary,
    File,
    ForeignKey,
    OneToOne,
    ManyToMany,
    Array,
}

impl ModelFieldKind {
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            ModelFieldKind::ForeignKey | ModelFieldKind::OneToOne | ModelFieldKind::ManyToMany
        )
    }
}
