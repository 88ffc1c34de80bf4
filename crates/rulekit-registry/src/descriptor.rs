//! TypeDescriptor - everything the registry knows about one type.
//!
//! A descriptor bundles a type's identity with the optional capabilities an
//! extension provides for it:
//!
//! - [`Parser`]: text → value, and value → display text
//! - [`Serializer`]: value ↔ [`Fields`] (or a serialize-as redirection)
//! - [`Changer`]: mutation handler
//! - [`Arithmetic`]: relative math for range-like types
//!
//! Each capability can be set at most once. Setting one twice is recorded and
//! reported when the descriptor is registered, so builder chains stay
//! infallible.

use std::fmt;
use std::sync::Arc;

use rulekit_core::{Fields, FieldsError, NativeType, RegistrationError, TypeHash, Value};

use crate::Changer;

/// Where a piece of text being parsed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseContext {
    /// A literal inside a script.
    #[default]
    Default,
    /// A command argument typed by a user.
    Command,
    /// An event-specific expression.
    Event,
    /// A value read from a configuration entry.
    Config,
}

/// Text parsing and stringification for one type.
pub trait Parser: Send + Sync {
    /// Parse `text`, or `None` if it isn't a value of this type.
    fn parse(&self, text: &str, context: ParseContext) -> Option<Value>;

    /// Whether this parser may be used in `context`.
    fn can_parse(&self, context: ParseContext) -> bool {
        let _ = context;
        true
    }

    /// Text shown to users.
    fn to_display_string(&self, value: &Value) -> String;

    /// Text used when the value becomes part of a variable name.
    fn to_variable_name(&self, value: &Value) -> String {
        self.to_display_string(value)
    }
}

/// Persistence for one type.
pub trait Serializer: Send + Sync {
    /// Turn a value into storable fields. `None` if the value can't be stored.
    fn serialize(&self, value: &Value) -> Option<Fields>;

    /// Rebuild a value from stored fields.
    fn deserialize(&self, fields: &Fields) -> Result<Value, FieldsError>;
}

/// Relative math ("difference", "plus", "minus") for types usable as ranges.
pub trait Arithmetic: Send + Sync {
    /// Type of the difference between two values (e.g. a timespan for dates).
    fn relative_type(&self) -> TypeHash;

    /// Distance between two values.
    fn difference(&self, first: &Value, second: &Value) -> Option<Value>;

    /// `value + delta`, with `delta` of the relative type.
    fn add(&self, value: &Value, delta: &Value) -> Option<Value>;

    /// `value - delta`, with `delta` of the relative type.
    fn subtract(&self, value: &Value, delta: &Value) -> Option<Value>;
}

/// Registry entry for one type.
pub struct TypeDescriptor {
    code_name: String,
    type_hash: TypeHash,
    supertypes: Vec<TypeHash>,
    parser: Option<Arc<dyn Parser>>,
    serializer: Option<Arc<dyn Serializer>>,
    serialize_as: Option<TypeHash>,
    changer: Option<Arc<dyn Changer>>,
    arithmetic: Option<Arc<dyn Arithmetic>>,
    before: Vec<String>,
    after: Vec<String>,
    name: Option<String>,
    description: Option<String>,
    usage: Vec<String>,
    defect: Option<RegistrationError>,
}

impl TypeDescriptor {
    /// Create a descriptor for the type with this code name.
    ///
    /// The type hash is `TypeHash::from_name(code_name)`.
    pub fn new(code_name: impl Into<String>) -> Self {
        let code_name = code_name.into();
        Self {
            type_hash: TypeHash::from_name(&code_name),
            code_name,
            supertypes: Vec::new(),
            parser: None,
            serializer: None,
            serialize_as: None,
            changer: None,
            arithmetic: None,
            before: Vec::new(),
            after: Vec::new(),
            name: None,
            description: None,
            usage: Vec::new(),
            defect: None,
        }
    }

    /// Create a descriptor for a native Rust type.
    pub fn of<T: NativeType>() -> Self {
        let mut descriptor = Self::new(T::type_name());
        descriptor.type_hash = T::type_hash();
        descriptor
    }

    fn record_duplicate(&mut self, component: &'static str) {
        if self.defect.is_none() {
            self.defect = Some(RegistrationError::DuplicateComponent {
                type_name: self.code_name.clone(),
                component,
            });
        }
    }

    // === Builder ===

    /// Declare a direct supertype.
    pub fn supertype(mut self, supertype: TypeHash) -> Self {
        if !self.supertypes.contains(&supertype) {
            self.supertypes.push(supertype);
        }
        self
    }

    pub fn parser(mut self, parser: impl Parser + 'static) -> Self {
        if self.parser.is_some() {
            self.record_duplicate("parser");
        } else {
            self.parser = Some(Arc::new(parser));
        }
        self
    }

    pub fn serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        if self.serializer.is_some() {
            self.record_duplicate("serializer");
        } else {
            self.serializer = Some(Arc::new(serializer));
        }
        self
    }

    /// Persist values of this type as values of another registered type.
    pub fn serialize_as(mut self, target: TypeHash) -> Self {
        if self.serialize_as.is_some() {
            self.record_duplicate("serialize-as type");
        } else {
            self.serialize_as = Some(target);
        }
        self
    }

    pub fn changer(mut self, changer: impl Changer + 'static) -> Self {
        if self.changer.is_some() {
            self.record_duplicate("changer");
        } else {
            self.changer = Some(Arc::new(changer));
        }
        self
    }

    pub fn arithmetic(mut self, arithmetic: impl Arithmetic + 'static) -> Self {
        if self.arithmetic.is_some() {
            self.record_duplicate("arithmetic");
        } else {
            self.arithmetic = Some(Arc::new(arithmetic));
        }
        self
    }

    /// Try this type's parser before the named types when parsing untyped
    /// literals.
    pub fn before<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before.extend(names.into_iter().map(Into::into));
        self
    }

    /// Try this type's parser after the named types.
    pub fn after<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(names.into_iter().map(Into::into));
        self
    }

    /// User-facing name ("whole number").
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage.push(usage.into());
        self
    }

    // === Accessors ===

    pub fn code_name(&self) -> &str {
        &self.code_name
    }

    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    pub fn supertypes(&self) -> &[TypeHash] {
        &self.supertypes
    }

    pub fn get_parser(&self) -> Option<&Arc<dyn Parser>> {
        self.parser.as_ref()
    }

    pub fn get_serializer(&self) -> Option<&Arc<dyn Serializer>> {
        self.serializer.as_ref()
    }

    pub fn get_serialize_as(&self) -> Option<TypeHash> {
        self.serialize_as
    }

    pub fn get_changer(&self) -> Option<&Arc<dyn Changer>> {
        self.changer.as_ref()
    }

    pub fn get_arithmetic(&self) -> Option<&Arc<dyn Arithmetic>> {
        self.arithmetic.as_ref()
    }

    pub fn before_hints(&self) -> &[String] {
        &self.before
    }

    pub fn after_hints(&self) -> &[String] {
        &self.after
    }

    /// User-facing name, falling back to the code name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code_name)
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn get_usage(&self) -> &[String] {
        &self.usage
    }

    /// Check the descriptor for defects recorded while building it.
    pub(crate) fn validate(&self) -> Result<(), RegistrationError> {
        if !is_valid_code_name(&self.code_name) {
            return Err(RegistrationError::InvalidCodeName(self.code_name.clone()));
        }
        if let Some(defect) = &self.defect {
            return Err(defect.clone());
        }
        if self.serializer.is_some() && self.serialize_as.is_some() {
            return Err(RegistrationError::ConflictingSerializer(self.code_name.clone()));
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("code_name", &self.code_name)
            .field("type_hash", &self.type_hash)
            .field("supertypes", &self.supertypes)
            .field("parser", &self.parser.is_some())
            .field("serializer", &self.serializer.is_some())
            .field("serialize_as", &self.serialize_as)
            .field("changer", &self.changer.is_some())
            .field("arithmetic", &self.arithmetic.is_some())
            .finish()
    }
}

/// Code names are lowercase ASCII letters and digits, in dash-separated
/// segments: `integer`, `living-entity`, `item2`.
pub fn is_valid_code_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}
