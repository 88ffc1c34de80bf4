//! Registry - the facade over types, converters and comparators.
//!
//! [`Registry`] owns the type hierarchy and the three registries and offers
//! the queries the expression layer and the host's parsing and persistence
//! layers need.
//!
//! # Phases
//!
//! Registration takes `&mut Registry` and happens once, while extensions
//! load. Afterwards the registry is only read: every lookup, conversion and
//! comparison takes `&Registry`, so a loaded registry can be shared behind
//! an `Arc`.
//!
//! Converter chains are synthesized when a converter is registered, against
//! the hierarchy as it is at that moment. Declare supertypes before
//! registering converters that should chain through them.
//!
//! # Example
//!
//! ```
//! use rulekit_core::{Relation, Value, builtins};
//! use rulekit_registry::Registry;
//!
//! let registry = Registry::with_defaults();
//!
//! let three = registry.parse_untyped("3", Default::default()).unwrap();
//! assert_eq!(three.type_hash(), builtins::INTEGER);
//! assert_eq!(registry.compare(&three, &Value::from(4.5)), Some(Relation::Smaller));
//! ```

use std::sync::Arc;

use rulekit_core::{
    AcceptedType, ChangeMode, Fields, FieldsError, NativeType, RegistrationError,
    ResolutionError, Relation, TypeHash, Value,
};

use crate::resolution::{self, ComparisonQuery, ResolutionContext, ResolvedComparison};
use crate::{
    Arithmetic, Changer, ComparatorInfo, ComparatorRegistry, Comparator, ConverterFlags,
    ConverterInfo, ConverterRegistry, FnComparator, ParseContext, ResolvedConverter,
    TypeDescriptor, TypeHierarchy, TypeRegistry,
};

/// Upper bound on serialize-as redirections followed for one value.
const MAX_SERIALIZE_REDIRECTS: usize = 8;

/// Type, converter and comparator registry.
#[derive(Debug, Default)]
pub struct Registry {
    hierarchy: TypeHierarchy,
    types: TypeRegistry,
    converters: ConverterRegistry,
    comparators: ComparatorRegistry,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn comparators(&self) -> &ComparatorRegistry {
        &self.comparators
    }

    /// Code name of a type, or its hash if it has no descriptor.
    pub fn type_name(&self, ty: TypeHash) -> String {
        self.types.name_of(ty)
    }

    #[inline]
    pub fn is_assignable(&self, from: TypeHash, to: TypeHash) -> bool {
        self.hierarchy.is_assignable(from, to)
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Register a type descriptor and its supertype links.
    ///
    /// Nothing is stored if any check fails.
    pub fn register_type(&mut self, descriptor: TypeDescriptor) -> Result<(), RegistrationError> {
        let ty = descriptor.type_hash();
        if let Some(&supertype) = descriptor
            .supertypes()
            .iter()
            .find(|&&sup| !self.hierarchy.can_link(ty, sup))
        {
            return Err(RegistrationError::HierarchyCycle {
                subtype: descriptor.code_name().to_string(),
                supertype: self.type_name(supertype),
            });
        }

        let supertypes = descriptor.supertypes().to_vec();
        let code_name = descriptor.code_name().to_string();
        self.types.register(descriptor)?;

        self.hierarchy.declare(ty);
        for supertype in supertypes {
            self.hierarchy.add_supertype(ty, supertype);
        }

        tracing::debug!(type_name = %code_name, hash = %ty, "registered type");
        Ok(())
    }

    /// Declare `supertype` as a direct supertype of `subtype`.
    pub fn declare_supertype(
        &mut self,
        subtype: TypeHash,
        supertype: TypeHash,
    ) -> Result<(), RegistrationError> {
        if !self.hierarchy.add_supertype(subtype, supertype) {
            return Err(RegistrationError::HierarchyCycle {
                subtype: self.type_name(subtype),
                supertype: self.type_name(supertype),
            });
        }
        Ok(())
    }

    /// Descriptor with this code name.
    pub fn type_by_name(&self, code_name: &str) -> Option<&TypeDescriptor> {
        self.types.get_by_name(code_name)
    }

    /// Descriptor registered for exactly `ty`.
    pub fn type_exact(&self, ty: TypeHash) -> Option<&TypeDescriptor> {
        self.types.get_exact(ty)
    }

    /// Most specific descriptor describing `ty` (itself or a supertype).
    pub fn type_for(&self, ty: TypeHash) -> Option<&TypeDescriptor> {
        self.types.get_most_specific(&self.hierarchy, ty)
    }

    /// Default changer for values of `ty`.
    pub fn changer_for(&self, ty: TypeHash) -> Option<&Arc<dyn Changer>> {
        self.type_for(ty).and_then(TypeDescriptor::get_changer)
    }

    /// Relative math for values of `ty`.
    pub fn arithmetic_for(&self, ty: TypeHash) -> Option<&Arc<dyn Arithmetic>> {
        self.type_for(ty).and_then(TypeDescriptor::get_arithmetic)
    }

    /// Accepted delta types of `ty`'s default changer for `mode`.
    pub fn accepted_changes(&self, ty: TypeHash, mode: ChangeMode) -> Option<Vec<AcceptedType>> {
        self.changer_for(ty)?.accept_change(mode)
    }

    // ==========================================================================
    // Converters
    // ==========================================================================

    /// Register a converter. Chains through it are synthesized immediately.
    pub fn register_converter<F>(
        &mut self,
        from: TypeHash,
        to: TypeHash,
        flags: ConverterFlags,
        function: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        let info = ConverterInfo::new(from, to, flags, function);
        let chained = self.converters
            .register(&self.hierarchy, info, |ty| self.types.name_of(ty))?;
        tracing::debug!(
            from = %self.type_name(from),
            to = %self.type_name(to),
            chained,
            "registered converter"
        );
        Ok(())
    }

    /// Register a converter between two native types.
    pub fn register_converter_typed<A, B, F>(
        &mut self,
        flags: ConverterFlags,
        function: F,
    ) -> Result<(), RegistrationError>
    where
        A: NativeType,
        B: NativeType,
        F: Fn(&A) -> Option<B> + Send + Sync + 'static,
    {
        self.register_converter(A::type_hash(), B::type_hash(), flags, move |value| {
            value.downcast_ref::<A>().and_then(&function).map(Value::new)
        })
    }

    /// Find a converter for a declared source type.
    pub fn converter(&self, from: TypeHash, to: TypeHash) -> Option<ResolvedConverter> {
        self.converters
            .resolve(&self.hierarchy, from, to, ConverterFlags::empty())
    }

    /// Find a converter usable for command arguments.
    pub fn command_converter(&self, from: TypeHash, to: TypeHash) -> Option<ResolvedConverter> {
        self.converters
            .resolve(&self.hierarchy, from, to, ConverterFlags::NO_COMMAND_ARGUMENTS)
    }

    /// Convert one value using its runtime type.
    ///
    /// A value already assignable to `to` is returned unchanged.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn convert(&self, value: &Value, to: TypeHash) -> Option<Value> {
        self.converter(value.type_hash(), to)?
            .convert(&self.hierarchy, value)
    }

    /// Convert every value, dropping those without a result. Order is kept.
    pub fn convert_all(&self, values: &[Value], to: TypeHash) -> Vec<Value> {
        values
            .iter()
            .filter_map(|value| {
                let converted = self.convert(value, to);
                if converted.is_none() {
                    tracing::trace!(?value, to = %self.type_name(to), "conversion dropped element");
                }
                converted
            })
            .collect()
    }

    /// Map every value through `function`, dropping `None` results.
    pub fn convert_with<F>(values: &[Value], function: F) -> Vec<Value>
    where
        F: Fn(&Value) -> Option<Value>,
    {
        values.iter().filter_map(function).collect()
    }

    /// Convert to the first of `targets` that succeeds.
    pub fn convert_to_any(&self, value: &Value, targets: &[TypeHash]) -> Option<Value> {
        targets.iter().find_map(|&to| self.convert(value, to))
    }

    // ==========================================================================
    // Comparators
    // ==========================================================================

    /// Register a comparator for `(first, second)`.
    pub fn register_comparator(
        &mut self,
        first: TypeHash,
        second: TypeHash,
        comparator: impl Comparator + 'static,
    ) -> Result<(), RegistrationError> {
        let info = ComparatorInfo::new(first, second, comparator);
        self.comparators
            .register(info, |ty| self.types.name_of(ty))?;
        tracing::debug!(
            first = %self.type_name(first),
            second = %self.type_name(second),
            "registered comparator"
        );
        Ok(())
    }

    /// Register a comparator between two native types.
    pub fn register_comparator_typed<A, B, F>(
        &mut self,
        ordering: bool,
        function: F,
    ) -> Result<(), RegistrationError>
    where
        A: NativeType,
        B: NativeType,
        F: Fn(&A, &B) -> Relation + Send + Sync + 'static,
    {
        self.register_comparator(
            A::type_hash(),
            B::type_hash(),
            FnComparator::typed::<A, B, F>(ordering, function),
        )
    }

    fn resolution_context(&self) -> ResolutionContext<'_> {
        ResolutionContext {
            hierarchy: &self.hierarchy,
            converters: &self.converters,
            comparators: &self.comparators,
        }
    }

    /// Find a comparator for declared operand types, or `None`.
    pub fn comparison(&self, query: &ComparisonQuery) -> Option<ResolvedComparison> {
        resolution::resolve_comparison(&self.resolution_context(), query)
    }

    /// Find a comparator for declared operand types.
    pub fn resolve_comparison(
        &self,
        query: &ComparisonQuery,
    ) -> Result<ResolvedComparison, ResolutionError> {
        match self.comparison(query) {
            Some(resolved) => {
                tracing::debug!(
                    first = %self.type_name(query.first),
                    second = %self.type_name(query.second),
                    step = ?resolved.step(),
                    reversed = resolved.is_reversed(),
                    "resolved comparator"
                );
                Ok(resolved)
            }
            None => Err(ResolutionError::Incomparable {
                first: self.type_name(query.first),
                second: self.type_name(query.second),
                third: query.third.map(|t| self.type_name(t)),
            }),
        }
    }

    /// Compare two values by their runtime types.
    ///
    /// `None` if no comparator relates them or a conversion has no result.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compare(&self, first: &Value, second: &Value) -> Option<Relation> {
        let query = ComparisonQuery::binary(first.type_hash(), second.type_hash());
        self.comparison(&query)?
            .compare(&self.hierarchy, first, second)
    }

    // ==========================================================================
    // Parsing and stringification
    // ==========================================================================

    /// Parse `text` as a value of type `to`.
    ///
    /// Tries the type's own parser first, then every other parser in parse
    /// order whose result converts to `to`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(&self, text: &str, to: TypeHash, context: ParseContext) -> Option<Value> {
        let own = self
            .type_exact(to)
            .and_then(TypeDescriptor::get_parser)
            .filter(|parser| parser.can_parse(context))
            .and_then(|parser| parser.parse(text, context));
        if own.is_some() {
            return own;
        }

        let exclude = match context {
            ParseContext::Command => ConverterFlags::NO_COMMAND_ARGUMENTS,
            _ => ConverterFlags::empty(),
        };

        self.types
            .in_parse_order()
            .filter(|d| d.type_hash() != to)
            .find_map(|descriptor| {
                let parser = descriptor.get_parser()?;
                if !parser.can_parse(context) {
                    return None;
                }
                let converter =
                    self.converters
                        .resolve(&self.hierarchy, descriptor.type_hash(), to, exclude)?;
                let value = parser.parse(text, context)?;
                converter.convert(&self.hierarchy, &value)
            })
    }

    /// Parse `text` with the first parser, in parse order, that accepts it.
    pub fn parse_untyped(&self, text: &str, context: ParseContext) -> Option<Value> {
        self.types.in_parse_order().find_map(|descriptor| {
            let parser = descriptor.get_parser()?;
            if parser.can_parse(context) {
                parser.parse(text, context)
            } else {
                None
            }
        })
    }

    /// Text shown to users for `value`.
    pub fn to_display_string(&self, value: &Value) -> String {
        match self.type_for(value.type_hash()) {
            Some(descriptor) => match descriptor.get_parser() {
                Some(parser) => parser.to_display_string(value),
                None => descriptor.code_name().to_string(),
            },
            None => value.type_hash().to_string(),
        }
    }

    /// Text used when `value` becomes part of a variable name.
    pub fn to_variable_name(&self, value: &Value) -> String {
        match self.type_for(value.type_hash()) {
            Some(descriptor) => match descriptor.get_parser() {
                Some(parser) => parser.to_variable_name(value),
                None => descriptor.code_name().to_string(),
            },
            None => value.type_hash().to_string(),
        }
    }

    /// Comma-separated display text for several values, joined with `and`
    /// or `or` before the last one.
    pub fn join_display(&self, values: &[Value], and: bool) -> String {
        let parts: Vec<String> = values.iter().map(|v| self.to_display_string(v)).collect();
        match parts.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [init @ .., last] => {
                let joiner = if and { "and" } else { "or" };
                format!("{} {} {}", init.join(", "), joiner, last)
            }
        }
    }

    // ==========================================================================
    // Serialization
    // ==========================================================================

    /// Serialize a value into `(code_name, fields)`.
    ///
    /// Follows serialize-as redirections, converting the value on each hop.
    /// `None` if the value's type (or redirect target) cannot be stored.
    pub fn serialize(&self, value: &Value) -> Option<(String, Fields)> {
        let mut current = value.clone();
        for _ in 0..=MAX_SERIALIZE_REDIRECTS {
            let descriptor = self.type_for(current.type_hash())?;
            if let Some(serializer) = descriptor.get_serializer() {
                let fields = serializer.serialize(&current)?;
                return Some((descriptor.code_name().to_string(), fields));
            }
            let target = descriptor.get_serialize_as()?;
            current = self.convert(&current, target)?;
        }
        tracing::debug!(?value, "serialize-as redirections did not terminate");
        None
    }

    /// Rebuild a value persisted under `code_name`.
    ///
    /// `Ok(None)` if the type is unknown or has no serializer.
    pub fn deserialize(&self, code_name: &str, fields: &Fields) -> Result<Option<Value>, FieldsError> {
        let Some(serializer) = self
            .type_by_name(code_name)
            .and_then(TypeDescriptor::get_serializer)
        else {
            tracing::debug!(code_name, "no serializer for persisted type");
            return Ok(None);
        };
        serializer.deserialize(fields).map(Some)
    }
}
