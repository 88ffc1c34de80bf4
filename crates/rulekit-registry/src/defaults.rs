//! Built-in types: `object`, `integer`, `number`, `boolean` and `text`.
//!
//! Enabled by the `defaults` feature. Registers descriptors with parsers,
//! serializers and changers, the integer/number converters, and comparators
//! for each built-in type.

use rulekit_core::{
    AcceptedType, ChangeError, ChangeMode, FieldValue, Fields, FieldsError, RegistrationError,
    Relation, TypeHash, Value, builtins,
};

use crate::{
    Arithmetic, Changer, ConverterFlags, FnComparator, ParseContext, Parser, Registry,
    Serializer, TypeDescriptor,
};

impl Registry {
    /// Create a registry with the built-in types registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register_defaults()
            .expect("built-in registrations are consistent");
        registry
    }

    /// Register the built-in types, converters and comparators.
    pub fn register_defaults(&mut self) -> Result<(), RegistrationError> {
        self.register_type(
            TypeDescriptor::new("object")
                .name("object")
                .description("Any value."),
        )?;
        self.register_type(
            TypeDescriptor::of::<i64>()
                .name("integer")
                .description("A whole number.")
                .usage("1, -20, 300")
                .parser(IntegerParser)
                .serializer(ValueField)
                .changer(NumericChanger::INTEGER)
                .arithmetic(NumericArithmetic::INTEGER)
                .before(["number"]),
        )?;
        self.register_type(
            TypeDescriptor::of::<f64>()
                .name("number")
                .description("A number, possibly with decimals.")
                .usage("1.5, -0.25, 3")
                .parser(NumberParser)
                .serializer(ValueField)
                .changer(NumericChanger::NUMBER)
                .arithmetic(NumericArithmetic::NUMBER),
        )?;
        self.register_type(
            TypeDescriptor::of::<bool>()
                .name("boolean")
                .usage("true/yes/on, false/no/off")
                .parser(BooleanParser)
                .serializer(ValueField),
        )?;
        self.register_type(
            TypeDescriptor::of::<String>()
                .name("text")
                .usage("\"hello\"")
                .parser(TextParser)
                .serializer(ValueField)
                .changer(TextChanger)
                .after(["boolean"]),
        )?;

        self.register_converter_typed::<i64, f64, _>(ConverterFlags::empty(), |&i| Some(i as f64))?;
        self.register_converter_typed::<f64, i64, _>(ConverterFlags::empty(), |&n| {
            truncate(n)
        })?;

        // Numbers first, so mixed numeric comparisons coerce to number.
        self.register_comparator_typed::<f64, f64, _>(true, |a, b| Relation::from_floats(*a, *b))?;
        self.register_comparator_typed::<i64, i64, _>(true, |a, b| {
            Relation::from_ordering(a.cmp(b))
        })?;
        self.register_comparator(
            builtins::TEXT,
            builtins::TEXT,
            FnComparator::typed::<String, String, _>(false, |a, b| {
                Relation::from_bool(a.to_lowercase() == b.to_lowercase())
            }),
        )?;
        self.register_comparator_typed::<bool, bool, _>(false, |a, b| Relation::from_bool(a == b))?;

        tracing::debug!(types = self.types().len(), "registered built-in types");
        Ok(())
    }
}

/// `n` truncated toward zero, if it fits an `i64`.
fn truncate(n: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    (n.is_finite() && n.trunc() >= -LIMIT && n.trunc() < LIMIT).then(|| n.trunc() as i64)
}

/// Integer or number payload as `f64`.
fn numeric(value: &Value) -> Option<f64> {
    value
        .as_number()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

// ============================================================================
// Parsers
// ============================================================================

struct IntegerParser;

impl Parser for IntegerParser {
    fn parse(&self, text: &str, _context: ParseContext) -> Option<Value> {
        text.trim().parse::<i64>().ok().map(Value::from)
    }

    fn to_display_string(&self, value: &Value) -> String {
        value.as_integer().map(|i| i.to_string()).unwrap_or_default()
    }
}

struct NumberParser;

impl Parser for NumberParser {
    fn parse(&self, text: &str, _context: ParseContext) -> Option<Value> {
        let text = text.trim();
        // Rust also accepts "inf" and "NaN", which are not script literals.
        if !text.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
            return None;
        }
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::from)
    }

    fn to_display_string(&self, value: &Value) -> String {
        value.as_number().map(|n| n.to_string()).unwrap_or_default()
    }
}

struct BooleanParser;

impl Parser for BooleanParser {
    fn parse(&self, text: &str, _context: ParseContext) -> Option<Value> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Some(Value::from(true)),
            "false" | "no" | "off" => Some(Value::from(false)),
            _ => None,
        }
    }

    fn to_display_string(&self, value: &Value) -> String {
        value.as_boolean().map(|b| b.to_string()).unwrap_or_default()
    }
}

/// Quoted text, with `""` as an escaped quote. Command arguments are taken
/// verbatim.
struct TextParser;

impl Parser for TextParser {
    fn parse(&self, text: &str, context: ParseContext) -> Option<Value> {
        if context == ParseContext::Command {
            return Some(Value::from(text));
        }
        let inner = text.strip_prefix('"')?.strip_suffix('"')?;
        let unescaped = inner.replace("\"\"", "\"");
        // A lone quote inside the literal ends it early.
        if unescaped.matches('"').count() * 2 != inner.matches('"').count() {
            return None;
        }
        Some(Value::from(unescaped))
    }

    fn to_display_string(&self, value: &Value) -> String {
        value.as_text().unwrap_or_default().to_string()
    }
}

// ============================================================================
// Serialization
// ============================================================================

/// Stores a built-in value in a single `value` field.
struct ValueField;

impl Serializer for ValueField {
    fn serialize(&self, value: &Value) -> Option<Fields> {
        let field = if let Some(i) = value.as_integer() {
            FieldValue::Int(i)
        } else if let Some(n) = value.as_number() {
            FieldValue::Float(n)
        } else if let Some(b) = value.as_boolean() {
            FieldValue::Bool(b)
        } else {
            FieldValue::Text(value.as_text()?.to_string())
        };
        Some(Fields::new().with("value", field))
    }

    fn deserialize(&self, fields: &Fields) -> Result<Value, FieldsError> {
        match fields.get("value") {
            Some(FieldValue::Int(i)) => Ok(Value::from(*i)),
            Some(FieldValue::Float(n)) => Ok(Value::from(*n)),
            Some(FieldValue::Bool(b)) => Ok(Value::from(*b)),
            Some(FieldValue::Text(s)) => Ok(Value::from(s.as_str())),
            Some(FieldValue::Nested(_)) => Err(FieldsError::Mismatch {
                field: "value".into(),
                expected: "a primitive",
                found: "nested fields",
            }),
            None => Err(FieldsError::Missing("value".into())),
        }
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

struct NumericArithmetic {
    ty: TypeHash,
}

impl NumericArithmetic {
    const INTEGER: Self = Self {
        ty: builtins::INTEGER,
    };
    const NUMBER: Self = Self {
        ty: builtins::NUMBER,
    };

    /// Whole results stay integers for the integer type; fractions promote
    /// to number.
    fn wrap(&self, n: f64) -> Option<Value> {
        if self.ty == builtins::INTEGER && n.fract() == 0.0 {
            truncate(n).map(Value::from)
        } else {
            n.is_finite().then(|| Value::from(n))
        }
    }
}

impl Arithmetic for NumericArithmetic {
    fn relative_type(&self) -> TypeHash {
        self.ty
    }

    fn difference(&self, first: &Value, second: &Value) -> Option<Value> {
        if let (Some(a), Some(b)) = (first.as_integer(), second.as_integer()) {
            return a.checked_sub(b).map(|d| Value::from(d.abs()));
        }
        self.wrap((numeric(first)? - numeric(second)?).abs())
    }

    fn add(&self, value: &Value, delta: &Value) -> Option<Value> {
        if let (Some(a), Some(b)) = (value.as_integer(), delta.as_integer()) {
            return a.checked_add(b).map(Value::from);
        }
        self.wrap(numeric(value)? + numeric(delta)?)
    }

    fn subtract(&self, value: &Value, delta: &Value) -> Option<Value> {
        if let (Some(a), Some(b)) = (value.as_integer(), delta.as_integer()) {
            return a.checked_sub(b).map(Value::from);
        }
        self.wrap(numeric(value)? - numeric(delta)?)
    }
}

// ============================================================================
// Changers
// ============================================================================

/// ADD/REMOVE of numbers, RESET to zero.
struct NumericChanger {
    ty: TypeHash,
}

impl NumericChanger {
    const INTEGER: Self = Self {
        ty: builtins::INTEGER,
    };
    const NUMBER: Self = Self {
        ty: builtins::NUMBER,
    };
}

impl Changer for NumericChanger {
    fn accept_change(&self, mode: ChangeMode) -> Option<Vec<AcceptedType>> {
        match mode {
            ChangeMode::Add | ChangeMode::Remove => Some(vec![AcceptedType::Sequence(self.ty)]),
            ChangeMode::Reset => Some(Vec::new()),
            _ => None,
        }
    }

    fn change(
        &self,
        what: &mut [Value],
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<(), ChangeError> {
        let arithmetic = NumericArithmetic { ty: self.ty };
        let zero = || {
            if self.ty == builtins::INTEGER {
                Value::from(0i64)
            } else {
                Value::from(0.0)
            }
        };

        match mode {
            ChangeMode::Reset => what.iter_mut().for_each(|value| *value = zero()),
            ChangeMode::Add | ChangeMode::Remove => {
                let delta = delta.ok_or(ChangeError::MissingDelta { mode })?;
                for value in what.iter_mut() {
                    let mut current = value.clone();
                    for d in delta {
                        let next = if mode == ChangeMode::Add {
                            arithmetic.add(&current, d)
                        } else {
                            arithmetic.subtract(&current, d)
                        };
                        // Overflowing or non-numeric deltas leave the value as is.
                        if let Some(next) = next {
                            current = next;
                        }
                    }
                    *value = current;
                }
            }
            _ => {
                return Err(ChangeError::Unsupported {
                    mode,
                    type_name: if self.ty == builtins::INTEGER {
                        "integer".into()
                    } else {
                        "number".into()
                    },
                });
            }
        }
        Ok(())
    }
}

/// ADD appends, REMOVE deletes occurrences, RESET empties.
struct TextChanger;

impl Changer for TextChanger {
    fn accept_change(&self, mode: ChangeMode) -> Option<Vec<AcceptedType>> {
        match mode {
            ChangeMode::Add | ChangeMode::Remove => {
                Some(vec![AcceptedType::Sequence(builtins::TEXT)])
            }
            ChangeMode::Reset => Some(Vec::new()),
            _ => None,
        }
    }

    fn change(
        &self,
        what: &mut [Value],
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<(), ChangeError> {
        let pieces: Vec<&str> = delta.unwrap_or_default().iter().filter_map(Value::as_text).collect();
        for value in what.iter_mut() {
            let current = value.as_text().unwrap_or_default();
            let changed = match mode {
                ChangeMode::Add => {
                    if delta.is_none() {
                        return Err(ChangeError::MissingDelta { mode });
                    }
                    let mut out = current.to_string();
                    pieces.iter().for_each(|p| out.push_str(p));
                    out
                }
                ChangeMode::Remove => pieces
                    .iter()
                    .filter(|p| !p.is_empty())
                    .fold(current.to_string(), |acc, p| acc.replace(p, "")),
                ChangeMode::Reset => String::new(),
                _ => {
                    return Err(ChangeError::Unsupported {
                        mode,
                        type_name: "text".into(),
                    });
                }
            };
            *value = Value::from(changed);
        }
        Ok(())
    }
}
