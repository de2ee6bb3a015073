//! Checker
//!
//! Read-only verification of a resolved program. User mistakes become diagnostics;
//! an identity that survived resolution is an internal error and aborts the check.

use crate::apm::*;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::types::algebra::unify_all;
use crate::types::{
    determine_expression_pattern, do_patterns_overlap, is_pattern_optional,
    is_pattern_subset_of_superset, Pattern,
};
use crate::utils::{CompilerError, Result, Span};

/// Check a resolved program
pub fn check(program: &Program) -> Result<Diagnostics> {
    let mut checker = Checker::new(program);
    checker.check()?;
    Ok(checker.into_diagnostics())
}

pub struct Checker<'a> {
    program: &'a Program,
    diagnostics: Diagnostics,
}

impl<'a> Checker<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn check(&mut self) -> Result<()> {
        log::debug!("checker: starting at the global scope");
        self.check_scope(self.program.global_scope)
    }

    fn check_scope(&mut self, scope: ScopeId) -> Result<()> {
        let program = self.program;
        for value in program.scope(scope).lookup.values() {
            self.check_lookup_value(value)?;
        }
        Ok(())
    }

    fn check_lookup_value(&mut self, value: &LookupValue) -> Result<()> {
        let program = self.program;
        match value {
            LookupValue::Variable(id) => {
                let variable = program.variable(*id);
                ensure_pattern_resolved(&variable.pattern)
            }
            LookupValue::StateProperty(id) => self.check_state(program.state(*id)),
            LookupValue::FunctionProperty(id) => self.check_function(program.function(*id)),
            LookupValue::Overloaded(overloaded) => {
                for overload in &overloaded.overloads {
                    if !matches!(overload, LookupValue::FunctionProperty(_)) {
                        return Err(CompilerError::MalformedOverloadSet {
                            identity: overloaded.identity.clone(),
                            found: overload.kind_name(),
                        });
                    }
                    self.check_lookup_value(overload)?;
                }
                Ok(())
            }
            LookupValue::NativeType(_) | LookupValue::EnumType(_) | LookupValue::Entity(_) => {
                Ok(())
            }
        }
    }

    fn check_state(&mut self, state: &StateProperty) -> Result<()> {
        log::trace!("checking state `{}`", state.identity);
        ensure_pattern_resolved(&state.pattern)?;
        self.check_scope(state.scope)?;

        if let Some(initial_value) = &state.initial_value {
            self.check_expression(initial_value)?;
            let value_pattern = determine_expression_pattern(self.program, initial_value);
            if !is_pattern_subset_of_superset(&value_pattern, &state.pattern) {
                self.diagnostics.error(
                    DiagnosticKind::IncorrectType,
                    format!("Default value for state `{}` is the incorrect type.", state.identity),
                    initial_value.span,
                );
            }
        }
        Ok(())
    }

    fn check_function(&mut self, function: &FunctionProperty) -> Result<()> {
        log::trace!("checking function `{}`", function.identity);
        ensure_pattern_resolved(&function.pattern)?;
        self.check_scope(function.scope)?;

        let Some(body) = &function.body else {
            return Ok(());
        };
        self.check_code_block(body)?;

        if let Some(result) = body.result() {
            let result_pattern = determine_expression_pattern(self.program, result);
            if !is_pattern_subset_of_superset(&result_pattern, &function.pattern) {
                self.diagnostics.error(
                    DiagnosticKind::IncorrectType,
                    format!(
                        "Function `{}` produces {} but is declared as {}.",
                        function.identity,
                        self.program.describe_pattern(&result_pattern),
                        self.program.describe_pattern(&function.pattern)
                    ),
                    result.span,
                );
            }
        }
        Ok(())
    }

    fn check_code_block(&mut self, block: &CodeBlock) -> Result<()> {
        self.check_scope(block.scope)?;
        for statement in &block.statements {
            self.check_statement(statement)?;
        }
        Ok(())
    }

    fn check_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Expression(expr) => self.check_expression(expr),
            Statement::Block(block) => self.check_code_block(block),
            Statement::If(stmt) => {
                for rule in &stmt.rules {
                    self.check_condition(&rule.condition)?;
                    self.check_code_block(&rule.code_block)?;
                }
                if let Some(block) = &stmt.else_block {
                    self.check_code_block(block)?;
                }
                Ok(())
            }
            Statement::For(stmt) => {
                self.check_expression(&stmt.range)?;
                self.check_code_block(&stmt.body)
            }
            Statement::Assignment(stmt) => {
                self.check_expression(&stmt.subject)?;
                self.check_expression(&stmt.value)?;
                let expected = determine_expression_pattern(self.program, &stmt.subject);
                let message = "Assigned value is the incorrect type.";
                self.check_assignable(&stmt.value, &expected, message, stmt.span);
                Ok(())
            }
            Statement::VariableDeclaration(stmt) => {
                let variable = self.program.variable(stmt.variable);
                ensure_pattern_resolved(&variable.pattern)?;
                if let Some(value) = &stmt.value {
                    self.check_expression(value)?;
                    let message =
                        format!("Initial value of `{}` is the incorrect type.", variable.identity);
                    self.check_assignable(value, &variable.pattern, &message, stmt.span);
                }
                Ok(())
            }
        }
    }

    /// Mismatches are reported at the whole statement
    fn check_assignable(
        &mut self,
        value: &Expression,
        expected: &Pattern,
        message: &str,
        span: Span,
    ) {
        let found = determine_expression_pattern(self.program, value);
        if !is_pattern_subset_of_superset(&found, expected) {
            self.diagnostics.error(DiagnosticKind::IncorrectType, message, span);
        }
    }

    /// A condition is boolean, or optional and thereby possibly none
    fn check_condition(&mut self, condition: &Expression) -> Result<()> {
        self.check_expression(condition)?;

        let pattern = determine_expression_pattern(self.program, condition);
        let boolean = is_pattern_subset_of_superset(&pattern, &Pattern::BOOL);
        if !boolean && !is_pattern_optional(&pattern) {
            self.diagnostics.error(
                DiagnosticKind::InvalidCondition,
                "Condition must evaluate either to true or false, or potentially to none. \
                 This condition will never be true, false, or none.",
                condition.span,
            );
        }
        Ok(())
    }

    fn check_expression(&mut self, expr: &Expression) -> Result<()> {
        match &expr.kind {
            ExprKind::Unresolved(unresolved) => Err(unresolved_error("identity", unresolved)),
            ExprKind::Variable(_)
            | ExprKind::EnumValue(_)
            | ExprKind::Literal(_)
            | ExprKind::Invalid => Ok(()),
            ExprKind::List(values) => self.check_expressions(values),
            ExprKind::InstanceList(list) => self.check_expressions(&list.values),
            ExprKind::Unary { value, .. } => self.check_expression(value),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.check_expression(lhs)?;
                self.check_expression(rhs)
            }
            ExprKind::PropertyIndex { expr: subject, property } => {
                if let PropertyRef::Unresolved(unresolved) = property {
                    return Err(unresolved_error("property", unresolved));
                }
                self.check_expression(subject)
            }
            ExprKind::Call { callee, arguments } => {
                if let Callee::Unresolved(unresolved) = callee {
                    return Err(unresolved_error("function", unresolved));
                }
                self.check_expressions(&arguments.values)
            }
            ExprKind::If { rules, otherwise } => {
                for rule in rules {
                    self.check_condition(&rule.condition)?;
                    self.check_expression(&rule.result)?;
                }
                if let Some(otherwise) = otherwise {
                    self.check_expression(otherwise)?;
                }
                Ok(())
            }
            ExprKind::Match { subject, rules } => self.check_match(subject, rules, expr.span),
            ExprKind::Index { subject, index } => {
                self.check_expression(subject)?;
                self.check_expression(index)
            }
        }
    }

    fn check_expressions(&mut self, exprs: &[Expression]) -> Result<()> {
        for expr in exprs {
            self.check_expression(expr)?;
        }
        Ok(())
    }

    fn check_match(&mut self, subject: &Expression, rules: &[MatchRule], span: Span) -> Result<()> {
        self.check_expression(subject)?;
        let subject_pattern = determine_expression_pattern(self.program, subject);

        for rule in rules {
            self.check_expression(&rule.pattern)?;
            self.check_expression(&rule.result)?;

            let rule_pattern = determine_expression_pattern(self.program, &rule.pattern);
            if !do_patterns_overlap(&rule_pattern, &subject_pattern) {
                self.diagnostics.error(
                    DiagnosticKind::UnreachableRule,
                    "This rule's pattern will never match.",
                    rule.pattern.span,
                );
            }
        }

        let results = rules
            .iter()
            .map(|rule| determine_expression_pattern(self.program, &rule.result));
        if !rules.is_empty() && unify_all(results).is_none() {
            self.diagnostics.error(
                DiagnosticKind::InconsistentRules,
                "The results of this match's rules have incompatible patterns.",
                span,
            );
        }
        Ok(())
    }
}

fn unresolved_error(node: &'static str, unresolved: &UnresolvedIdentity) -> CompilerError {
    CompilerError::UnresolvedInChecker {
        node,
        identity: unresolved.identity.clone(),
        span: unresolved.span,
    }
}

fn ensure_pattern_resolved(pattern: &Pattern) -> Result<()> {
    match pattern.unresolved_identity() {
        Some(unresolved) => Err(unresolved_error("pattern", unresolved)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span(line: usize) -> Span {
        Span::new(line * 10, line * 10 + 5, line, 1)
    }

    fn state(program: &mut Program, identity: &str, pattern: Pattern, value: Expression) {
        let global = program.global_scope;
        program.declare_state(global, identity, &[], pattern, Some(value));
    }

    fn function_body_scope(program: &mut Program, identity: &str) -> (FunctionId, ScopeId) {
        let global = program.global_scope;
        let function = program.declare_function(global, identity, &[], Pattern::NONE);
        let function_scope = program.function(function).scope;
        (function, program.add_scope(Some(function_scope)))
    }

    #[test]
    fn test_clean_program_has_no_diagnostics() {
        let mut program = Program::new();
        state(&mut program, "hp", Pattern::INT, Expression::integer(10, span(1)));
        let maybe_int = Pattern::optional(Pattern::INT);
        state(&mut program, "target", maybe_int, Expression::none(span(2)));

        let diagnostics = check(&program).unwrap();
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_state_default_of_wrong_type() {
        let mut program = Program::new();
        state(&mut program, "hp", Pattern::INT, Expression::boolean(true, span(3)));

        let diagnostics = check(&program).unwrap().into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::IncorrectType);
        assert_eq!(diagnostics[0].span, span(3));
        assert_eq!(
            diagnostics[0].message,
            "Default value for state `hp` is the incorrect type."
        );
    }

    #[test]
    fn test_invalid_values_do_not_cascade() {
        let mut program = Program::new();
        state(&mut program, "hp", Pattern::INT, Expression::invalid(span(1)));
        state(&mut program, "mp", Pattern::Invalid, Expression::boolean(true, span(2)));

        assert!(check(&program).unwrap().is_empty());
    }

    #[test]
    fn test_optional_and_boolean_conditions() {
        let mut program = Program::new();
        let global = program.global_scope;
        let flag = program.declare_variable(global, "flag", Pattern::optional(Pattern::INT));
        let function = program.declare_function(global, "tick", &[], Pattern::NONE);
        let function_scope = program.function(function).scope;
        let body_scope = program.add_scope(Some(function_scope));
        let rule = |condition: Expression, program: &mut Program| IfStatementRule {
            span: condition.span,
            condition,
            code_block: CodeBlock::new(program.add_scope(Some(body_scope)), vec![]),
        };
        let rules = vec![
            rule(Expression::boolean(true, span(1)), &mut program),
            rule(Expression::new(ExprKind::Variable(flag), span(2)), &mut program),
            rule(Expression::none(span(3)), &mut program),
        ];
        program.set_body(
            function,
            CodeBlock::new(
                body_scope,
                vec![Statement::If(IfStatement {
                    rules,
                    else_block: None,
                    span: span(1),
                })],
            ),
        );

        let diagnostics = check(&program).unwrap().into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::InvalidCondition);
        assert_eq!(diagnostics[0].span, span(3));
    }

    #[test]
    fn test_variable_declaration_and_assignment_types() {
        let mut program = Program::new();
        let (function, body_scope) = function_body_scope(&mut program, "run");
        let count = program.declare_variable(body_scope, "count", Pattern::INT);
        let subject = |line| Expression::new(ExprKind::Variable(count), span(line));
        program.set_body(
            function,
            CodeBlock::new(
                body_scope,
                vec![
                    Statement::VariableDeclaration(VariableDeclaration {
                        variable: count,
                        value: Some(Expression::boolean(false, span(11))),
                        span: span(1),
                    }),
                    Statement::Assignment(Assignment {
                        subject: subject(2),
                        value: Expression::integer(4, span(12)),
                        span: span(2),
                    }),
                    Statement::Assignment(Assignment {
                        subject: subject(3),
                        value: Expression::none(span(13)),
                        span: span(3),
                    }),
                ],
            ),
        );

        // Reported at the statements, not at the values
        let diagnostics = check(&program).unwrap().into_vec();
        let spans: Vec<Span> = diagnostics.iter().map(|d| d.span).collect();
        assert_eq!(spans, vec![span(1), span(3)]);
        assert!(diagnostics.iter().all(|d| d.kind == DiagnosticKind::IncorrectType));
    }

    #[test]
    fn test_singleton_body_result_against_function_pattern() {
        let mut program = Program::new();
        let global = program.global_scope;
        let function = program.declare_function(global, "alive", &[], Pattern::BOOL);
        let function_scope = program.function(function).scope;
        let body_scope = program.add_scope(Some(function_scope));
        let body = CodeBlock::singleton(body_scope, Expression::integer(1, span(4)));
        program.set_body(function, body);

        let diagnostics = check(&program).unwrap().into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::IncorrectType);
        assert_eq!(
            diagnostics[0].message,
            "Function `alive` produces int but is declared as bool."
        );
    }

    #[test]
    fn test_if_expression_with_invalid_condition() {
        let mut program = Program::new();
        let value = Expression::new(
            ExprKind::If {
                rules: vec![IfRule {
                    condition: Expression::integer(2, span(2)),
                    result: Expression::integer(1, span(3)),
                    span: span(2),
                }],
                otherwise: Some(Box::new(Expression::integer(0, span(4)))),
            },
            span(1),
        );
        state(&mut program, "hp", Pattern::INT, value);

        let diagnostics = check(&program).unwrap().into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::InvalidCondition);
        assert_eq!(diagnostics[0].span, span(2));
    }

    #[test]
    fn test_for_loop_body_and_nested_block() {
        let mut program = Program::new();
        let (function, body_scope) = function_body_scope(&mut program, "count");
        let loop_scope = program.add_scope(Some(body_scope));
        let inner_scope = program.add_scope(Some(loop_scope));
        let each = program.declare_variable(loop_scope, "each", Pattern::INT);
        let flag = program.declare_variable(inner_scope, "flag", Pattern::BOOL);

        let nested = CodeBlock::new(
            inner_scope,
            vec![Statement::VariableDeclaration(VariableDeclaration {
                variable: flag,
                value: Some(Expression::new(ExprKind::Variable(each), span(13))),
                span: span(3),
            })],
        );
        let range = vec![Expression::integer(1, span(1)), Expression::integer(2, span(1))];
        let for_loop = ForStatement {
            variable: each,
            range: Expression::new(ExprKind::List(range), span(1)),
            body: CodeBlock::new(loop_scope, vec![Statement::Block(nested)]),
            span: span(1),
        };
        program.set_body(function, CodeBlock::new(body_scope, vec![Statement::For(for_loop)]));

        let diagnostics = check(&program).unwrap().into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::IncorrectType);
        assert_eq!(diagnostics[0].span, span(3));
        assert_eq!(diagnostics[0].message, "Initial value of `flag` is the incorrect type.");
    }

    #[test]
    fn test_for_loop_with_unresolved_range_is_an_internal_error() {
        let mut program = Program::new();
        let (function, body_scope) = function_body_scope(&mut program, "count");
        let loop_scope = program.add_scope(Some(body_scope));
        let each = program.declare_variable(loop_scope, "each", Pattern::INT);
        let for_loop = ForStatement {
            variable: each,
            range: Expression::unresolved("items", span(1)),
            body: CodeBlock::new(loop_scope, vec![]),
            span: span(1),
        };
        program.set_body(function, CodeBlock::new(body_scope, vec![Statement::For(for_loop)]));

        let error = check(&program).unwrap_err();
        assert!(matches!(error, CompilerError::UnresolvedInChecker { node: "identity", .. }));
    }

    #[test]
    fn test_negate_and_index_inference() {
        let mut program = Program::new();
        let global = program.global_scope;
        let items = program.declare_variable(global, "items", Pattern::Invalid);
        let negated = |value: Expression| Expression::unary(UnaryOp::Negate, value, span(1));
        let first = Expression::new(
            ExprKind::Index {
                subject: Box::new(Expression::new(ExprKind::Variable(items), span(3))),
                index: Box::new(Expression::integer(0, span(3))),
            },
            span(3),
        );
        state(&mut program, "drain", Pattern::INT, negated(Expression::integer(2, span(1))));
        state(&mut program, "hp", Pattern::INT, negated(Expression::boolean(true, span(2))));
        state(&mut program, "first", Pattern::INT, first);

        // `-true` stays bool; an index has no pattern and is accepted
        let diagnostics = check(&program).unwrap().into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::IncorrectType);
        assert_eq!(
            diagnostics[0].message,
            "Default value for state `hp` is the incorrect type."
        );
    }

    #[test]
    fn test_match_with_inconsistent_results() {
        let mut program = Program::new();
        let global = program.global_scope;
        let color = program.declare_enum(global, "Color", &["Red", "Blue"]);
        let red = program.enum_value_named(color, "Red").unwrap();
        let blue = program.enum_value_named(color, "Blue").unwrap();
        let subject = program.declare_variable(global, "c", Pattern::Enum(color));
        let value = Expression::match_on(
            Expression::new(ExprKind::Variable(subject), span(1)),
            vec![
                MatchRule {
                    pattern: Expression::new(ExprKind::EnumValue(red), span(2)),
                    result: Expression::integer(1, span(2)),
                },
                MatchRule {
                    pattern: Expression::new(ExprKind::EnumValue(blue), span(3)),
                    result: Expression::boolean(true, span(3)),
                },
            ],
            span(1),
        );
        program.declare_state(global, "x", &[], Pattern::Invalid, Some(value));

        let diagnostics = check(&program).unwrap().into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::InconsistentRules);
        assert_eq!(diagnostics[0].span, span(1));
    }

    #[test]
    fn test_unresolved_tree_is_an_internal_error() {
        let mut program = Program::new();
        state(&mut program, "hp", Pattern::INT, Expression::unresolved("ghost", span(5)));

        let error = check(&program).unwrap_err();
        assert_eq!(
            error,
            CompilerError::UnresolvedInChecker {
                node: "identity",
                identity: "ghost".to_string(),
                span: span(5),
            }
        );
        assert_eq!(error.span(), Some(span(5)));
    }

    #[test]
    fn test_unresolved_pattern_is_an_internal_error() {
        let mut program = Program::new();
        let global = program.global_scope;
        let pattern = Pattern::optional(Pattern::unresolved("Color", span(2)));
        program.declare_variable(global, "x", pattern);

        let error = check(&program).unwrap_err();
        assert!(matches!(error, CompilerError::UnresolvedInChecker { node: "pattern", .. }));
        assert!(error.to_string().contains("`Color`"));
    }

    #[test]
    fn test_overload_set_with_non_function_member() {
        let mut program = Program::new();
        let global = program.global_scope;
        let entity = program.declare_entity(global, "Player");
        let function = program.declare_function(global, "attack", &[], Pattern::INT);
        program.scope_mut(global).lookup.insert(
            "attack".to_string(),
            LookupValue::Overloaded(OverloadedIdentity {
                identity: "attack".to_string(),
                overloads: vec![
                    LookupValue::FunctionProperty(function),
                    LookupValue::Entity(entity),
                ],
            }),
        );

        let error = check(&program).unwrap_err();
        assert_eq!(
            error,
            CompilerError::MalformedOverloadSet {
                identity: "attack".to_string(),
                found: "entity",
            }
        );
    }
}
