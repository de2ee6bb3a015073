//! Abstract Program Model
//!
//! The program tree produced by the parser and annotated by the resolver. Declared
//! symbols and scopes are stored in per-kind arenas owned by [`Program`] and are
//! addressed by copyable handles; a scope's parent is a handle, never an owner.

pub mod dump;
pub mod intrinsic;
pub mod nodes;
pub mod scope;

pub use intrinsic::Intrinsic;
pub use nodes::*;
pub use scope::{LookupValue, OverloadedIdentity, Scope};

use crate::types::Pattern;
use crate::utils::Span;

// ==================== Handles ====================

macro_rules! define_handles {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    )*};
}

define_handles! {
    /// Unique identifier for a scope
    ScopeId,
    VariableId,
    NativeId,
    EnumId,
    EnumValueId,
    EntityId,
    StateId,
    FunctionId,
}

// ==================== Program ====================

/// How far resolution has progressed over the whole program
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Unresolved,
    SignaturesResolved,
    Resolved,
}

/// Root of the model; owns the global scope and every declaration arena
#[derive(Debug, Clone)]
pub struct Program {
    pub global_scope: ScopeId,
    pub(crate) phase: Phase,
    scopes: Vec<Scope>,
    variables: Vec<Variable>,
    natives: Vec<NativeType>,
    enums: Vec<EnumType>,
    enum_values: Vec<EnumValue>,
    entities: Vec<Entity>,
    states: Vec<StateProperty>,
    functions: Vec<FunctionProperty>,
}

macro_rules! arena_accessors {
    ($($field:ident: $id:ident => $ty:ty, $get:ident, $get_mut:ident;)*) => {
        impl Program {$(
            pub fn $get(&self, id: $id) -> &$ty {
                &self.$field[id.0]
            }

            pub fn $get_mut(&mut self, id: $id) -> &mut $ty {
                &mut self.$field[id.0]
            }
        )*}
    };
}

arena_accessors! {
    scopes: ScopeId => Scope, scope, scope_mut;
    variables: VariableId => Variable, variable, variable_mut;
    natives: NativeId => NativeType, native, native_mut;
    enums: EnumId => EnumType, enum_type, enum_type_mut;
    enum_values: EnumValueId => EnumValue, enum_value, enum_value_mut;
    entities: EntityId => Entity, entity, entity_mut;
    states: StateId => StateProperty, state, state_mut;
    functions: FunctionId => FunctionProperty, function, function_mut;
}

impl Program {
    /// Create an empty program whose global scope holds the intrinsic types
    pub fn new() -> Self {
        let mut program = Self {
            global_scope: ScopeId(0),
            phase: Phase::Unresolved,
            scopes: vec![Scope::new(None)],
            variables: Vec::new(),
            natives: Vec::new(),
            enums: Vec::new(),
            enum_values: Vec::new(),
            entities: Vec::new(),
            states: Vec::new(),
            functions: Vec::new(),
        };
        let global = program.global_scope;
        for (identity, host_identity) in Intrinsic::TYPES {
            program.declare_native(global, identity, host_identity);
        }
        debug_assert_eq!(program.natives.len(), Intrinsic::TYPES.len());
        program
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Create a new scope nested in `parent`
    pub fn add_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(parent));
        id
    }

    // ========== Declarations ==========
    //
    // `add_*` stores a fully built node and binds it in `scope`. The `declare_*`
    // helpers build the node first. A conflicting name is recorded on the scope
    // and reported later by the resolver.

    pub fn add_native(&mut self, scope: ScopeId, native: NativeType) -> NativeId {
        let id = NativeId(self.natives.len());
        self.natives.push(native);
        self.declare(scope, LookupValue::NativeType(id));
        id
    }

    pub fn declare_native(
        &mut self,
        scope: ScopeId,
        identity: &str,
        host_identity: &str,
    ) -> NativeId {
        self.add_native(
            scope,
            NativeType {
                identity: identity.to_string(),
                host_identity: host_identity.to_string(),
                span: Span::dummy(),
            },
        )
    }

    /// Store an enum and its ordered values, each with its own span
    pub fn add_enum(
        &mut self,
        scope: ScopeId,
        identity: &str,
        span: Span,
        values: &[(&str, Span)],
    ) -> EnumId {
        let id = EnumId(self.enums.len());
        let values = values
            .iter()
            .map(|(value, value_span)| {
                let value_id = EnumValueId(self.enum_values.len());
                self.enum_values.push(EnumValue {
                    identity: value.to_string(),
                    owner: id,
                    span: *value_span,
                });
                value_id
            })
            .collect();
        self.enums.push(EnumType {
            identity: identity.to_string(),
            values,
            span,
        });
        self.declare(scope, LookupValue::EnumType(id));
        id
    }

    pub fn declare_enum(&mut self, scope: ScopeId, identity: &str, values: &[&str]) -> EnumId {
        let values: Vec<(&str, Span)> =
            values.iter().map(|value| (*value, Span::dummy())).collect();
        self.add_enum(scope, identity, Span::dummy(), &values)
    }

    pub fn add_entity(&mut self, scope: ScopeId, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        self.entities.push(entity);
        self.declare(scope, LookupValue::Entity(id));
        id
    }

    pub fn declare_entity(&mut self, scope: ScopeId, identity: &str) -> EntityId {
        self.add_entity(
            scope,
            Entity {
                identity: identity.to_string(),
                span: Span::dummy(),
            },
        )
    }

    pub fn add_variable(&mut self, scope: ScopeId, variable: Variable) -> VariableId {
        let id = VariableId(self.variables.len());
        self.variables.push(variable);
        self.declare(scope, LookupValue::Variable(id));
        id
    }

    pub fn declare_variable(
        &mut self,
        scope: ScopeId,
        identity: &str,
        pattern: Pattern,
    ) -> VariableId {
        self.add_variable(
            scope,
            Variable {
                identity: identity.to_string(),
                pattern,
                span: Span::dummy(),
            },
        )
    }

    /// Create a property scope under `scope` and declare the parameters in it
    fn declare_parameters(
        &mut self,
        scope: ScopeId,
        parameters: &[(&str, Pattern)],
    ) -> (ScopeId, Vec<VariableId>) {
        let property_scope = self.add_scope(Some(scope));
        let parameters = parameters
            .iter()
            .map(|(identity, pattern)| {
                self.declare_variable(property_scope, identity, pattern.clone())
            })
            .collect();
        (property_scope, parameters)
    }

    pub fn add_state(&mut self, scope: ScopeId, state: StateProperty) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(state);
        self.declare(scope, LookupValue::StateProperty(id));
        id
    }

    pub fn declare_state(
        &mut self,
        scope: ScopeId,
        identity: &str,
        parameters: &[(&str, Pattern)],
        pattern: Pattern,
        initial_value: Option<Expression>,
    ) -> StateId {
        let (property_scope, parameters) = self.declare_parameters(scope, parameters);
        self.add_state(
            scope,
            StateProperty {
                identity: identity.to_string(),
                pattern,
                scope: property_scope,
                parameters,
                initial_value,
                span: Span::dummy(),
            },
        )
    }

    pub fn add_function(&mut self, scope: ScopeId, function: FunctionProperty) -> FunctionId {
        let id = FunctionId(self.functions.len());
        self.functions.push(function);
        self.declare(scope, LookupValue::FunctionProperty(id));
        id
    }

    /// Declare a function without a body. The body's scope must be nested in the
    /// function's own scope, so it is attached afterwards with [`Program::set_body`].
    pub fn declare_function(
        &mut self,
        scope: ScopeId,
        identity: &str,
        parameters: &[(&str, Pattern)],
        pattern: Pattern,
    ) -> FunctionId {
        let (property_scope, parameters) = self.declare_parameters(scope, parameters);
        self.add_function(
            scope,
            FunctionProperty {
                identity: identity.to_string(),
                pattern,
                scope: property_scope,
                parameters,
                body: None,
                span: Span::dummy(),
            },
        )
    }

    pub fn set_body(&mut self, function: FunctionId, body: CodeBlock) {
        self.functions[function.0].body = Some(body);
    }

    // ========== Queries ==========

    /// Find a value of `enum_id` by name
    pub fn enum_value_named(&self, enum_id: EnumId, identity: &str) -> Option<EnumValueId> {
        self.enums[enum_id.0]
            .values
            .iter()
            .copied()
            .find(|value| self.enum_values[value.0].identity == identity)
    }

    /// Human-readable name of a pattern, for diagnostics
    pub fn describe_pattern(&self, pattern: &Pattern) -> String {
        match pattern {
            Pattern::Unresolved(unresolved) => unresolved.identity.clone(),
            Pattern::Optional(inner) => format!("{}?", self.describe_pattern(inner)),
            Pattern::Invalid => "<invalid>".to_string(),
            Pattern::Enum(id) => self.enum_type(*id).identity.clone(),
            Pattern::Entity(id) => self.entity(*id).identity.clone(),
            Pattern::Native(id) => self.native(*id).identity.clone(),
        }
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsics_are_declared_first() {
        let program = Program::new();
        assert_eq!(program.native(Intrinsic::NONE).identity, "none");
        assert_eq!(program.native(Intrinsic::BOOL).identity, "bool");
        assert_eq!(program.native(Intrinsic::INT).identity, "int");
        assert_eq!(program.native(Intrinsic::NUMBER).identity, "number");
        assert_eq!(program.native(Intrinsic::STRING).identity, "string");
        assert!(matches!(
            program.fetch(program.global_scope, "int"),
            Some(LookupValue::NativeType(id)) if *id == Intrinsic::INT
        ));
        assert_eq!(program.phase(), Phase::Unresolved);
    }

    #[test]
    fn test_declare_enum_values_keep_order_and_owner() {
        let mut program = Program::new();
        let global = program.global_scope;
        let color = program.declare_enum(global, "Color", &["Red", "Green", "Blue"]);

        let names: Vec<&str> = program
            .enum_type(color)
            .values
            .iter()
            .map(|id| program.enum_value(*id).identity.as_str())
            .collect();
        assert_eq!(names, vec!["Red", "Green", "Blue"]);

        let green = program.enum_value_named(color, "Green").unwrap();
        assert_eq!(program.enum_value(green).owner, color);
        assert!(program.enum_value_named(color, "Purple").is_none());
    }

    #[test]
    fn test_add_enum_keeps_spans() {
        let mut program = Program::new();
        let global = program.global_scope;
        let color = program.add_enum(
            global,
            "Color",
            Span::new(0, 5, 1, 6),
            &[("Red", Span::new(8, 11, 1, 14)), ("Blue", Span::new(13, 17, 1, 19))],
        );

        assert_eq!(program.enum_type(color).span, Span::new(0, 5, 1, 6));
        let blue = program.enum_value_named(color, "Blue").unwrap();
        assert_eq!(program.enum_value(blue).span, Span::new(13, 17, 1, 19));
    }

    #[test]
    fn test_property_parameters_live_in_property_scope() {
        let mut program = Program::new();
        let global = program.global_scope;
        let int = Pattern::Native(Intrinsic::INT);
        let heal = program.declare_function(global, "heal", &[("amount", int.clone())], int);

        let function = program.function(heal);
        assert_eq!(program.scope(function.scope).parent, Some(global));
        assert!(program.directly_declared_in_scope(function.scope, "amount"));
        assert!(!program.directly_declared_in_scope(global, "amount"));
    }

    #[test]
    fn test_describe_pattern() {
        let mut program = Program::new();
        let global = program.global_scope;
        let player = program.declare_entity(global, "Player");
        let optional = Pattern::optional(Pattern::Entity(player));
        assert_eq!(program.describe_pattern(&optional), "Player?");
        assert_eq!(program.describe_pattern(&Pattern::Invalid), "<invalid>");
    }
}
