//! Name resolution
//!
//! Turns the parser's unresolved tree into a fully bound one in two passes:
//! - the signature pass resolves the declared pattern of every variable and property
//!   in a scope, without looking at initializers or bodies, so signatures may refer to
//!   declarations that come later;
//! - the body pass resolves initializers, function bodies and every expression inside
//!   them, carrying an optional pattern hint down from the context.
//!
//! A failure never stops the walk. The failing node becomes an invalid sentinel, a
//! diagnostic is recorded, and resolution carries on with the siblings.

use crate::apm::*;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::types::{determine_expression_pattern, does_instance_list_match_parameters, Pattern};
use crate::utils::Span;

/// Resolve a whole program, returning the diagnostics found on the way
pub fn resolve(program: &mut Program) -> Diagnostics {
    let mut resolver = Resolver::new(program);
    resolver.resolve();
    resolver.into_diagnostics()
}

pub struct Resolver<'a> {
    program: &'a mut Program,
    diagnostics: Diagnostics,
}

impl<'a> Resolver<'a> {
    pub fn new(program: &'a mut Program) -> Self {
        Self {
            program,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Run both passes over the program
    pub fn resolve(&mut self) {
        self.run_signature_pass();
        self.run_body_pass();
    }

    /// Resolve every signature reachable from the global scope
    pub fn run_signature_pass(&mut self) {
        log::debug!("resolver: signature pass");
        let global = self.program.global_scope;
        self.resolve_scope_signatures(global);
        self.program.phase = self.program.phase.max(Phase::SignaturesResolved);
    }

    /// Resolve every initializer and body reachable from the global scope
    pub fn run_body_pass(&mut self) {
        log::debug!("resolver: body pass");
        let global = self.program.global_scope;
        self.resolve_scope_bodies(global);
        self.program.phase = Phase::Resolved;
    }

    // ==================== Scopes ====================

    /// Both passes over one scope, used for the scopes of code blocks
    fn resolve_scope(&mut self, scope: ScopeId) {
        self.resolve_scope_signatures(scope);
        self.resolve_scope_bodies(scope);
    }

    fn lookup_values(&self, scope: ScopeId) -> Vec<LookupValue> {
        self.program.scope(scope).lookup.values().cloned().collect()
    }

    fn resolve_scope_signatures(&mut self, scope: ScopeId) {
        self.report_redeclarations(scope);
        for value in self.lookup_values(scope) {
            self.resolve_lookup_value_signature(&value, scope);
        }
    }

    fn resolve_scope_bodies(&mut self, scope: ScopeId) {
        for value in self.lookup_values(scope) {
            self.resolve_lookup_value_body(&value);
        }
    }

    /// Each rejected declaration is reported once and then dropped
    fn report_redeclarations(&mut self, scope: ScopeId) {
        let rejected = std::mem::take(&mut self.program.scope_mut(scope).redeclarations);
        for value in rejected {
            let identity = self.program.identity_of(&value).to_string();
            let span = self.declaration_span(&value);
            self.diagnostics.error(
                DiagnosticKind::Redeclaration,
                format!("`{}` is already declared in this scope.", identity),
                span,
            );
        }
    }

    fn declaration_span(&self, value: &LookupValue) -> Span {
        match value {
            LookupValue::Variable(id) => self.program.variable(*id).span,
            LookupValue::NativeType(id) => self.program.native(*id).span,
            LookupValue::EnumType(id) => self.program.enum_type(*id).span,
            LookupValue::Entity(id) => self.program.entity(*id).span,
            LookupValue::StateProperty(id) => self.program.state(*id).span,
            LookupValue::FunctionProperty(id) => self.program.function(*id).span,
            LookupValue::Overloaded(_) => Span::dummy(),
        }
    }

    // ==================== Signature Pass ====================

    fn resolve_lookup_value_signature(&mut self, value: &LookupValue, scope: ScopeId) {
        match value {
            LookupValue::Variable(id) => {
                let mut pattern = self.program.variable(*id).pattern.clone();
                self.resolve_pattern(&mut pattern, scope);
                self.program.variable_mut(*id).pattern = pattern;
            }
            LookupValue::StateProperty(id) => {
                log::trace!("resolving signature of state `{}`", self.program.state(*id).identity);
                let mut pattern = self.program.state(*id).pattern.clone();
                self.resolve_pattern(&mut pattern, scope);
                self.program.state_mut(*id).pattern = pattern;

                let property_scope = self.program.state(*id).scope;
                self.resolve_scope_signatures(property_scope);
            }
            LookupValue::FunctionProperty(id) => {
                let identity = &self.program.function(*id).identity;
                log::trace!("resolving signature of function `{}`", identity);
                let mut pattern = self.program.function(*id).pattern.clone();
                self.resolve_pattern(&mut pattern, scope);
                self.program.function_mut(*id).pattern = pattern;

                let property_scope = self.program.function(*id).scope;
                self.resolve_scope_signatures(property_scope);
            }
            LookupValue::Overloaded(overloaded) => {
                for overload in &overloaded.overloads {
                    self.resolve_lookup_value_signature(overload, scope);
                }
            }
            LookupValue::NativeType(_) | LookupValue::EnumType(_) | LookupValue::Entity(_) => {}
        }
    }

    /// Replace unresolved identities inside a pattern with the declared type they name
    fn resolve_pattern(&mut self, pattern: &mut Pattern, scope: ScopeId) {
        let resolved = match pattern {
            Pattern::Optional(inner) => {
                self.resolve_pattern(inner, scope);
                return;
            }
            Pattern::Unresolved(unresolved) => self.lookup_pattern(unresolved, scope),
            Pattern::Invalid | Pattern::Enum(_) | Pattern::Entity(_) | Pattern::Native(_) => return,
        };
        *pattern = resolved;
    }

    fn lookup_pattern(&mut self, unresolved: &UnresolvedIdentity, scope: ScopeId) -> Pattern {
        match self.program.fetch(scope, &unresolved.identity).cloned() {
            Some(LookupValue::EnumType(id)) => Pattern::Enum(id),
            Some(LookupValue::Entity(id)) => Pattern::Entity(id),
            Some(LookupValue::NativeType(id)) => Pattern::Native(id),
            Some(other) => {
                self.diagnostics.error(
                    DiagnosticKind::NotAPattern,
                    format!("`{}` is a {}, not a pattern.", unresolved.identity, other.kind_name()),
                    unresolved.span,
                );
                Pattern::Invalid
            }
            None => {
                self.diagnostics.error(
                    DiagnosticKind::UnresolvedIdentity,
                    format!("Unable to resolve pattern `{}`.", unresolved.identity),
                    unresolved.span,
                );
                Pattern::Invalid
            }
        }
    }

    // ==================== Body Pass ====================

    fn resolve_lookup_value_body(&mut self, value: &LookupValue) {
        match value {
            LookupValue::StateProperty(id) => {
                let property_scope = self.program.state(*id).scope;
                self.resolve_scope_bodies(property_scope);

                if let Some(mut initial_value) = self.program.state_mut(*id).initial_value.take() {
                    let hint = self.program.state(*id).pattern.clone();
                    self.resolve_expression(&mut initial_value, property_scope, Some(&hint));
                    self.program.state_mut(*id).initial_value = Some(initial_value);
                }
            }
            LookupValue::FunctionProperty(id) => {
                let property_scope = self.program.function(*id).scope;
                self.resolve_scope_bodies(property_scope);

                if let Some(mut body) = self.program.function_mut(*id).body.take() {
                    let hint = self.program.function(*id).pattern.clone();
                    self.resolve_code_block(&mut body, Some(&hint));
                    self.program.function_mut(*id).body = Some(body);
                }
            }
            LookupValue::Overloaded(overloaded) => {
                for overload in &overloaded.overloads {
                    self.resolve_lookup_value_body(overload);
                }
            }
            LookupValue::Variable(_)
            | LookupValue::NativeType(_)
            | LookupValue::EnumType(_)
            | LookupValue::Entity(_) => {}
        }
    }

    /// Resolve a block. Only the result of a singleton block receives the hint.
    fn resolve_code_block(&mut self, block: &mut CodeBlock, hint: Option<&Pattern>) {
        self.resolve_scope(block.scope);

        let last = block.statements.len().saturating_sub(1);
        let singleton = block.singleton;
        for (index, statement) in block.statements.iter_mut().enumerate() {
            let statement_hint = if singleton && index == last { hint } else { None };
            self.resolve_statement(statement, block.scope, statement_hint);
        }
    }

    fn resolve_statement(
        &mut self,
        statement: &mut Statement,
        scope: ScopeId,
        hint: Option<&Pattern>,
    ) {
        match statement {
            Statement::Expression(expr) => self.resolve_expression(expr, scope, hint),
            Statement::Block(block) => self.resolve_code_block(block, None),
            Statement::If(stmt) => {
                for rule in &mut stmt.rules {
                    self.resolve_expression(&mut rule.condition, scope, Some(&Pattern::BOOL));
                    self.resolve_code_block(&mut rule.code_block, None);
                }
                if let Some(block) = &mut stmt.else_block {
                    self.resolve_code_block(block, None);
                }
            }
            Statement::For(stmt) => {
                self.resolve_expression(&mut stmt.range, scope, None);
                self.resolve_code_block(&mut stmt.body, None);
            }
            Statement::Assignment(stmt) => {
                self.resolve_expression(&mut stmt.subject, scope, None);
                let subject_pattern = determine_expression_pattern(self.program, &stmt.subject);
                self.resolve_expression(&mut stmt.value, scope, Some(&subject_pattern));
            }
            Statement::VariableDeclaration(stmt) => {
                if let Some(value) = &mut stmt.value {
                    let variable_pattern = self.program.variable(stmt.variable).pattern.clone();
                    self.resolve_expression(value, scope, Some(&variable_pattern));
                }
            }
        }
    }

    // ==================== Expressions ====================

    /// Resolve an expression in place. Already resolved nodes are left untouched, so
    /// running this again over a resolved tree changes nothing.
    pub fn resolve_expression(
        &mut self,
        expr: &mut Expression,
        scope: ScopeId,
        hint: Option<&Pattern>,
    ) {
        let span = expr.span;
        let replacement = match &mut expr.kind {
            ExprKind::Unresolved(unresolved) => {
                Some(self.resolve_value_identity(&unresolved.identity.clone(), span, scope, hint))
            }
            ExprKind::Variable(_) | ExprKind::EnumValue(_) | ExprKind::Invalid => None,
            ExprKind::Literal(literal) => coerce_literal(literal, hint).map(ExprKind::Literal),
            ExprKind::List(values) => {
                for value in values {
                    self.resolve_expression(value, scope, None);
                }
                None
            }
            ExprKind::InstanceList(list) => {
                for value in &mut list.values {
                    self.resolve_expression(value, scope, None);
                }
                None
            }
            ExprKind::Unary { op: UnaryOp::Not, value } => {
                self.resolve_expression(value, scope, Some(&Pattern::BOOL));
                None
            }
            ExprKind::Unary { op: UnaryOp::Negate, value } => {
                self.resolve_expression(value, scope, hint);
                None
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.resolve_binary(*op, lhs, rhs, scope, hint);
                None
            }
            ExprKind::PropertyIndex { expr: subject, property } => {
                self.resolve_property_index(subject, property, span, scope)
            }
            ExprKind::Match { subject, rules } => {
                self.resolve_expression(subject, scope, None);
                let subject_pattern = determine_expression_pattern(self.program, subject);
                for rule in rules {
                    self.resolve_expression(&mut rule.pattern, scope, Some(&subject_pattern));
                    self.resolve_expression(&mut rule.result, scope, hint);
                }
                None
            }
            ExprKind::Call { callee, arguments } => {
                self.resolve_call(callee, arguments, span, scope)
            }
            ExprKind::If { rules, otherwise } => {
                for rule in rules {
                    self.resolve_expression(&mut rule.condition, scope, Some(&Pattern::BOOL));
                    self.resolve_expression(&mut rule.result, scope, hint);
                }
                if let Some(otherwise) = otherwise {
                    self.resolve_expression(otherwise, scope, hint);
                }
                None
            }
            ExprKind::Index { subject, index } => {
                self.resolve_expression(subject, scope, None);
                self.resolve_expression(index, scope, Some(&Pattern::INT));
                None
            }
        };

        if let Some(kind) = replacement {
            expr.kind = kind;
        }
    }

    fn resolve_binary(
        &mut self,
        op: BinaryOp,
        lhs: &mut Expression,
        rhs: &mut Expression,
        scope: ScopeId,
        hint: Option<&Pattern>,
    ) {
        if op.is_arithmetic() {
            self.resolve_expression(lhs, scope, hint);
            self.resolve_expression(rhs, scope, hint);
        } else if op.is_logical() {
            self.resolve_expression(lhs, scope, Some(&Pattern::BOOL));
            self.resolve_expression(rhs, scope, Some(&Pattern::BOOL));
        } else {
            // Comparisons: the right side is read in terms of the left side
            self.resolve_expression(lhs, scope, None);
            let lhs_pattern = determine_expression_pattern(self.program, lhs);
            self.resolve_expression(rhs, scope, Some(&lhs_pattern));
        }
    }

    /// Resolve a bare name in value position
    fn resolve_value_identity(
        &mut self,
        identity: &str,
        span: Span,
        scope: ScopeId,
        hint: Option<&Pattern>,
    ) -> ExprKind {
        let nearest = self.program.fetch(scope, identity).cloned();
        if let Some(LookupValue::Variable(id)) = nearest {
            return ExprKind::Variable(id);
        }

        // A hinted enum claims its value names over any binding that is not a variable
        if let Some(enum_id) = hint.and_then(Pattern::as_enum) {
            if let Some(value) = self.program.enum_value_named(enum_id, identity) {
                return ExprKind::EnumValue(value);
            }
        }

        match nearest {
            Some(other) => {
                self.diagnostics.error(
                    DiagnosticKind::NotAValue,
                    format!("`{}` is a {}, not a value.", identity, other.kind_name()),
                    span,
                );
                ExprKind::Invalid
            }
            None => {
                let candidates = self.program.enum_values_in_reach(scope, identity);
                match candidates.as_slice() {
                    [value] => ExprKind::EnumValue(*value),
                    [] => {
                        self.diagnostics.error(
                            DiagnosticKind::UnresolvedIdentity,
                            format!("Unable to resolve `{}`.", identity),
                            span,
                        );
                        ExprKind::Invalid
                    }
                    _ => {
                        self.diagnostics.error(
                            DiagnosticKind::AmbiguousIdentity,
                            format!(
                                "`{}` is a value of {} different enums; \
                                 qualify it with the enum name.",
                                identity,
                                candidates.len()
                            ),
                            span,
                        );
                        ExprKind::Invalid
                    }
                }
            }
        }
    }

    /// Resolve `subject.property`. Returns a replacement when the whole index collapses
    /// into another node: an enum value for `Enum.Value`, or an invalid value.
    fn resolve_property_index(
        &mut self,
        subject: &mut Expression,
        property: &mut PropertyRef,
        span: Span,
        scope: ScopeId,
    ) -> Option<ExprKind> {
        let PropertyRef::Unresolved(unresolved) = property else {
            self.resolve_expression(subject, scope, None);
            return None;
        };
        let name = unresolved.identity.clone();

        if let ExprKind::Unresolved(qualifier) = &subject.kind {
            let qualifier_value = self.program.fetch(scope, &qualifier.identity);
            if let Some(LookupValue::EnumType(enum_id)) = qualifier_value {
                let enum_id = *enum_id;
                if let Some(value) = self.program.enum_value_named(enum_id, &name) {
                    return Some(ExprKind::EnumValue(value));
                }
                self.diagnostics.error(
                    DiagnosticKind::UnknownProperty,
                    format!("Enum `{}` has no value `{}`.", qualifier.identity, name),
                    span,
                );
                return Some(ExprKind::Invalid);
            }
        }

        self.resolve_expression(subject, scope, None);

        let candidates = self.program.fetch_property(scope, &name);
        if candidates.is_empty() {
            match self.program.fetch(scope, &name).map(LookupValue::kind_name) {
                Some(kind) => self.diagnostics.error(
                    DiagnosticKind::UnknownProperty,
                    format!("`{}` is a {}, not a property.", name, kind),
                    span,
                ),
                None => self.diagnostics.error(
                    DiagnosticKind::UnresolvedIdentity,
                    format!("Unable to resolve property `{}`.", name),
                    span,
                ),
            }
            return Some(ExprKind::Invalid);
        }

        let state = candidates.iter().find_map(|candidate| match candidate {
            LookupValue::StateProperty(id) => Some(*id),
            _ => None,
        });
        if let Some(id) = state {
            *property = PropertyRef::State(id);
            return None;
        }

        let functions: Vec<FunctionId> = candidates
            .iter()
            .filter_map(|candidate| match candidate {
                LookupValue::FunctionProperty(id) => Some(*id),
                _ => None,
            })
            .collect();

        // An index takes no arguments, so only a parameterless overload fits
        match functions
            .iter()
            .copied()
            .find(|id| self.program.function(*id).parameters.is_empty())
        {
            Some(id) => {
                *property = PropertyRef::Function(id);
                None
            }
            None => {
                self.diagnostics.error(
                    DiagnosticKind::NoMatchingOverload,
                    format!("No overload of `{}` can be indexed without arguments.", name),
                    span,
                );
                Some(ExprKind::Invalid)
            }
        }
    }

    /// Resolve a call by picking the first overload whose parameters accept the
    /// arguments positionally
    fn resolve_call(
        &mut self,
        callee: &mut Callee,
        arguments: &mut InstanceList,
        span: Span,
        scope: ScopeId,
    ) -> Option<ExprKind> {
        for argument in &mut arguments.values {
            self.resolve_expression(argument, scope, None);
        }

        let Callee::Unresolved(unresolved) = callee else {
            return None;
        };
        let name = unresolved.identity.clone();

        let candidates = self.program.fetch_all_overloads(scope, &name);
        if candidates.is_empty() {
            self.diagnostics.error(
                DiagnosticKind::UnresolvedIdentity,
                format!("Unable to resolve function `{}`.", name),
                span,
            );
            return Some(ExprKind::Invalid);
        }

        let functions: Vec<FunctionId> = candidates
            .iter()
            .filter_map(|candidate| match candidate {
                LookupValue::FunctionProperty(id) => Some(*id),
                _ => None,
            })
            .collect();
        if functions.is_empty() {
            self.diagnostics.error(
                DiagnosticKind::NotCallable,
                format!("`{}` is a {}, not a function.", name, candidates[0].kind_name()),
                span,
            );
            return Some(ExprKind::Invalid);
        }

        // Each overload reads the arguments in terms of its own parameter patterns
        for id in functions {
            let parameters = self.program.function(id).parameters.clone();
            log::trace!(
                "considering overload of `{}` with {} parameter(s)",
                name,
                parameters.len()
            );
            let mut candidate = arguments.clone();
            for (argument, parameter) in candidate.values.iter_mut().zip(&parameters) {
                let pattern = self.program.variable(*parameter).pattern.clone();
                coerce_expression(argument, &pattern);
            }
            if does_instance_list_match_parameters(self.program, &candidate, &parameters) {
                *arguments = candidate;
                *callee = Callee::Function(id);
                return None;
            }
        }

        self.diagnostics.error(
            DiagnosticKind::NoMatchingOverload,
            format!(
                "No overload of `{}` accepts these {} argument(s).",
                name,
                arguments.values.len()
            ),
            span,
        );
        Some(ExprKind::Invalid)
    }
}

/// Apply a pattern hint to a literal; integers read as numbers where a number is expected
fn coerce_literal(literal: &Literal, hint: Option<&Pattern>) -> Option<Literal> {
    match (literal, hint.map(Pattern::core)) {
        (Literal::Integer(value), Some(Pattern::Native(id))) if *id == Intrinsic::NUMBER => {
            Some(Literal::Number(*value as f64))
        }
        _ => None,
    }
}

/// Push a hint into an already resolved expression, reaching the literals that
/// `resolve_expression` would have coerced under the same hint
fn coerce_expression(expr: &mut Expression, hint: &Pattern) {
    match &mut expr.kind {
        ExprKind::Literal(literal) => {
            if let Some(coerced) = coerce_literal(literal, Some(hint)) {
                *literal = coerced;
            }
        }
        ExprKind::Unary { op: UnaryOp::Negate, value } => coerce_expression(value, hint),
        ExprKind::Binary { op, lhs, rhs } => {
            if op.is_arithmetic() {
                coerce_expression(lhs, hint);
                coerce_expression(rhs, hint);
            }
        }
        ExprKind::Match { rules, .. } => {
            for rule in rules {
                coerce_expression(&mut rule.result, hint);
            }
        }
        ExprKind::If { rules, otherwise } => {
            for rule in rules {
                coerce_expression(&mut rule.result, hint);
            }
            if let Some(otherwise) = otherwise {
                coerce_expression(otherwise, hint);
            }
        }
        _ => {}
    }
}
