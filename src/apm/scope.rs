//! Scopes and the symbol table
//!
//! A scope maps identities to lookup values and points at its parent by handle.
//! Lookups walk the parent chain, so a nearer binding shadows an outer one.

use std::collections::BTreeMap;

use crate::apm::{
    EntityId, EnumId, EnumValueId, FunctionId, NativeId, Program, ScopeId, StateId, VariableId,
};

// ==================== Lookup Values ====================

/// Anything a name can be bound to
#[derive(Debug, Clone, PartialEq)]
pub enum LookupValue {
    Variable(VariableId),
    NativeType(NativeId),
    EnumType(EnumId),
    Entity(EntityId),
    StateProperty(StateId),
    FunctionProperty(FunctionId),
    Overloaded(OverloadedIdentity),
}

/// Two or more overloadable declarations sharing one identity
#[derive(Debug, Clone, PartialEq)]
pub struct OverloadedIdentity {
    pub identity: String,
    pub overloads: Vec<LookupValue>,
}

impl LookupValue {
    /// Name of the kind of declaration, for messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Variable(_) => "variable",
            Self::NativeType(_) => "native type",
            Self::EnumType(_) => "enum type",
            Self::Entity(_) => "entity",
            Self::StateProperty(_) => "state property",
            Self::FunctionProperty(_) => "function property",
            Self::Overloaded(_) => "overloaded function property",
        }
    }

    /// Only function-like properties may share a name
    pub fn is_overloadable(&self) -> bool {
        matches!(self, Self::FunctionProperty(_) | Self::Overloaded(_))
    }

    pub fn is_property(&self) -> bool {
        matches!(
            self,
            Self::StateProperty(_) | Self::FunctionProperty(_) | Self::Overloaded(_)
        )
    }

    /// The flattened overload set; a single element for anything not overloaded
    pub fn overloads(&self) -> Vec<LookupValue> {
        match self {
            Self::Overloaded(overloaded) => overloaded
                .overloads
                .iter()
                .flat_map(|overload| overload.overloads())
                .collect(),
            other => vec![other.clone()],
        }
    }
}

// ==================== Scope ====================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    /// Enclosing scope; `None` only for the global scope
    pub parent: Option<ScopeId>,
    pub lookup: BTreeMap<String, LookupValue>,
    /// Declarations rejected because their name was already bound here
    pub redeclarations: Vec<LookupValue>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            lookup: BTreeMap::new(),
            redeclarations: Vec::new(),
        }
    }
}

// ==================== Symbol Table ====================

impl Program {
    /// The identity a lookup value is bound under
    pub fn identity_of<'p>(&'p self, value: &'p LookupValue) -> &'p str {
        match value {
            LookupValue::Variable(id) => &self.variable(*id).identity,
            LookupValue::NativeType(id) => &self.native(*id).identity,
            LookupValue::EnumType(id) => &self.enum_type(*id).identity,
            LookupValue::Entity(id) => &self.entity(*id).identity,
            LookupValue::StateProperty(id) => &self.state(*id).identity,
            LookupValue::FunctionProperty(id) => &self.function(*id).identity,
            LookupValue::Overloaded(overloaded) => &overloaded.identity,
        }
    }

    /// Bind `value` in `scope`. Overloadable values sharing a name are grouped into an
    /// [`OverloadedIdentity`]. Any other clash keeps the existing binding, records the
    /// rejected value on the scope and returns `false`.
    pub fn declare(&mut self, scope: ScopeId, value: LookupValue) -> bool {
        let identity = self.identity_of(&value).to_string();
        let scope = self.scope_mut(scope);

        let Some(existing) = scope.lookup.get_mut(&identity) else {
            scope.lookup.insert(identity, value);
            return true;
        };

        if !existing.is_overloadable() || !value.is_overloadable() {
            log::trace!("rejected redeclaration of `{}`", identity);
            scope.redeclarations.push(value);
            return false;
        }

        if let LookupValue::Overloaded(overloaded) = existing {
            overloaded.overloads.extend(value.overloads());
        } else {
            let mut overloads = existing.overloads();
            overloads.extend(value.overloads());
            *existing = LookupValue::Overloaded(OverloadedIdentity { identity, overloads });
        }
        true
    }

    /// Check only the given scope, ignoring its parents
    pub fn directly_declared_in_scope(&self, scope: ScopeId, identity: &str) -> bool {
        self.scope(scope).lookup.contains_key(identity)
    }

    pub fn declared_in_scope(&self, scope: ScopeId, identity: &str) -> bool {
        self.fetch(scope, identity).is_some()
    }

    /// Look up a name, searching from `scope` outward to the global scope
    pub fn fetch(&self, scope: ScopeId, identity: &str) -> Option<&LookupValue> {
        let mut scope_id = Some(scope);
        while let Some(id) = scope_id {
            let scope = self.scope(id);
            if let Some(value) = scope.lookup.get(identity) {
                return Some(value);
            }
            scope_id = scope.parent;
        }
        None
    }

    /// Every overload bound to the nearest declaration of `identity`; empty when unresolved
    pub fn fetch_all_overloads(&self, scope: ScopeId, identity: &str) -> Vec<LookupValue> {
        self.fetch(scope, identity)
            .map(LookupValue::overloads)
            .unwrap_or_default()
    }

    /// The overloads of the nearest property bound to `identity`. Bindings that are not
    /// properties, such as a parameter with the same name, are skipped.
    pub fn fetch_property(&self, scope: ScopeId, identity: &str) -> Vec<LookupValue> {
        let mut scope_id = Some(scope);
        while let Some(id) = scope_id {
            let scope = self.scope(id);
            if let Some(value) = scope.lookup.get(identity) {
                if value.is_property() {
                    return value.overloads();
                }
            }
            scope_id = scope.parent;
        }
        Vec::new()
    }

    /// Enum values named `identity` belonging to any enum visible from `scope`
    pub fn enum_values_in_reach(&self, scope: ScopeId, identity: &str) -> Vec<EnumValueId> {
        let mut found = Vec::new();
        let mut scope_id = Some(scope);
        while let Some(id) = scope_id {
            for value in self.scope(id).lookup.values() {
                let LookupValue::EnumType(enum_id) = value else {
                    continue;
                };
                // Skip enums hidden by a nearer binding of their name
                if self.fetch(scope, &self.enum_type(*enum_id).identity) == Some(value) {
                    found.extend(self.enum_value_named(*enum_id, identity));
                }
            }
            scope_id = self.scope(id).parent;
        }
        found
    }
}
