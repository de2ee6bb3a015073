//! Debug dump of the program model
//!
//! Produces a tree-shaped JSON value for offline inspection. Declared symbols used as
//! patterns or values are written by name only, so shared declarations are not
//! repeated at every use site.

use serde_json::{json, Map, Value};

use crate::apm::*;
use crate::types::Pattern;

/// Dump a program as a JSON value
pub fn to_json(program: &Program) -> Value {
    let dumper = Dumper { program };
    json!({
        "node": "Program",
        "phase": format!("{:?}", program.phase()),
        "global_scope": dumper.scope(program.global_scope),
    })
}

/// Dump a program as pretty-printed JSON text
pub fn to_json_string(program: &Program) -> String {
    serde_json::to_string_pretty(&to_json(program)).unwrap_or_else(|_| "{}".to_string())
}

struct Dumper<'a> {
    program: &'a Program,
}

impl<'a> Dumper<'a> {
    fn scope(&self, id: ScopeId) -> Value {
        let scope = self.program.scope(id);
        let lookup: Map<String, Value> = scope
            .lookup
            .iter()
            .map(|(identity, value)| (identity.clone(), self.lookup_value(value)))
            .collect();
        json!({ "node": "Scope", "lookup": lookup })
    }

    fn lookup_value(&self, value: &LookupValue) -> Value {
        let program = self.program;
        match value {
            LookupValue::Variable(id) => self.variable(*id),
            LookupValue::NativeType(id) => {
                let native = program.native(*id);
                json!({
                    "node": "NativeType",
                    "identity": native.identity,
                    "host_identity": native.host_identity,
                })
            }
            LookupValue::EnumType(id) => {
                let enum_type = program.enum_type(*id);
                let values: Vec<Value> = enum_type
                    .values
                    .iter()
                    .map(|value| self.enum_value(*value))
                    .collect();
                json!({
                    "node": "EnumType",
                    "identity": enum_type.identity,
                    "values": values,
                })
            }
            LookupValue::Entity(id) => json!({
                "node": "Entity",
                "identity": program.entity(*id).identity,
            }),
            LookupValue::StateProperty(id) => {
                let state = program.state(*id);
                json!({
                    "node": "StateProperty",
                    "identity": state.identity,
                    "pattern": self.pattern(&state.pattern),
                    "parameters": self.parameters(&state.parameters),
                    "initial_value": state
                        .initial_value
                        .as_ref()
                        .map(|value| self.expression(value)),
                })
            }
            LookupValue::FunctionProperty(id) => {
                let function = program.function(*id);
                json!({
                    "node": "FunctionProperty",
                    "identity": function.identity,
                    "pattern": self.pattern(&function.pattern),
                    "parameters": self.parameters(&function.parameters),
                    "body": function.body.as_ref().map(|body| self.code_block(body)),
                })
            }
            LookupValue::Overloaded(overloaded) => {
                let overloads: Vec<Value> = overloaded
                    .overloads
                    .iter()
                    .map(|overload| self.lookup_value(overload))
                    .collect();
                json!({
                    "node": "OverloadedIdentity",
                    "identity": overloaded.identity,
                    "overloads": overloads,
                })
            }
        }
    }

    fn variable(&self, id: VariableId) -> Value {
        let variable = self.program.variable(id);
        json!({
            "node": "Variable",
            "identity": variable.identity,
            "pattern": self.pattern(&variable.pattern),
        })
    }

    fn parameters(&self, parameters: &[VariableId]) -> Value {
        Value::Array(parameters.iter().map(|id| self.variable(*id)).collect())
    }

    fn enum_value(&self, id: EnumValueId) -> Value {
        let value = self.program.enum_value(id);
        json!({
            "node": "EnumValue",
            "identity": value.identity,
            "enum": self.program.enum_type(value.owner).identity,
        })
    }

    fn pattern(&self, pattern: &Pattern) -> Value {
        match pattern {
            Pattern::Unresolved(unresolved) => json!({
                "node": "UnresolvedIdentity",
                "identity": unresolved.identity,
            }),
            Pattern::Optional(inner) => json!({
                "node": "OptionalPattern",
                "pattern": self.pattern(inner),
            }),
            Pattern::Invalid => json!({ "node": "InvalidPattern" }),
            Pattern::Enum(id) => json!({
                "node": "EnumType",
                "identity": self.program.enum_type(*id).identity,
            }),
            Pattern::Entity(id) => json!({
                "node": "Entity",
                "identity": self.program.entity(*id).identity,
            }),
            Pattern::Native(id) => json!({
                "node": "NativeType",
                "identity": self.program.native(*id).identity,
            }),
        }
    }

    fn code_block(&self, block: &CodeBlock) -> Value {
        let statements: Vec<Value> = block
            .statements
            .iter()
            .map(|statement| self.statement(statement))
            .collect();
        json!({
            "node": "CodeBlock",
            "singleton": block.singleton,
            "scope": self.scope(block.scope),
            "statements": statements,
        })
    }

    fn statement(&self, statement: &Statement) -> Value {
        match statement {
            Statement::Expression(expr) => self.expression(expr),
            Statement::Block(block) => self.code_block(block),
            Statement::If(stmt) => {
                let rules: Vec<Value> = stmt
                    .rules
                    .iter()
                    .map(|rule| {
                        json!({
                            "condition": self.expression(&rule.condition),
                            "code_block": self.code_block(&rule.code_block),
                        })
                    })
                    .collect();
                json!({
                    "node": "IfStatement",
                    "rules": rules,
                    "else_block": stmt.else_block.as_ref().map(|block| self.code_block(block)),
                })
            }
            Statement::For(stmt) => json!({
                "node": "ForStatement",
                "variable": self.variable(stmt.variable),
                "range": self.expression(&stmt.range),
                "body": self.code_block(&stmt.body),
            }),
            Statement::Assignment(stmt) => json!({
                "node": "Assignment",
                "subject": self.expression(&stmt.subject),
                "value": self.expression(&stmt.value),
            }),
            Statement::VariableDeclaration(stmt) => json!({
                "node": "VariableDeclaration",
                "variable": self.variable(stmt.variable),
                "value": stmt.value.as_ref().map(|value| self.expression(value)),
            }),
        }
    }

    fn expressions(&self, exprs: &[Expression]) -> Value {
        Value::Array(exprs.iter().map(|expr| self.expression(expr)).collect())
    }

    fn expression(&self, expr: &Expression) -> Value {
        let program = self.program;
        match &expr.kind {
            ExprKind::Unresolved(unresolved) => json!({
                "node": "UnresolvedIdentity",
                "identity": unresolved.identity,
            }),
            ExprKind::Variable(id) => json!({
                "node": "Variable",
                "identity": program.variable(*id).identity,
            }),
            ExprKind::EnumValue(id) => self.enum_value(*id),
            ExprKind::Literal(literal) => {
                let value = match literal {
                    Literal::None => Value::Null,
                    Literal::Boolean(b) => json!(b),
                    Literal::Integer(i) => json!(i),
                    Literal::Number(n) => json!(n),
                    Literal::String(s) => json!(s),
                };
                json!({ "node": "Literal", "value": value })
            }
            ExprKind::List(values) => json!({
                "node": "ListValue",
                "values": self.expressions(values),
            }),
            ExprKind::InstanceList(list) => json!({
                "node": "InstanceList",
                "values": self.expressions(&list.values),
            }),
            ExprKind::Unary { op, value } => json!({
                "node": "Unary",
                "op": op.symbol(),
                "value": self.expression(value),
            }),
            ExprKind::Binary { op, lhs, rhs } => json!({
                "node": "Binary",
                "op": op.symbol(),
                "lhs": self.expression(lhs),
                "rhs": self.expression(rhs),
            }),
            ExprKind::PropertyIndex { expr, property } => {
                let property = match property {
                    PropertyRef::Unresolved(unresolved) => json!({
                        "node": "UnresolvedIdentity",
                        "identity": unresolved.identity,
                    }),
                    PropertyRef::State(id) => json!({
                        "node": "StateProperty",
                        "identity": program.state(*id).identity,
                    }),
                    PropertyRef::Function(id) => json!({
                        "node": "FunctionProperty",
                        "identity": program.function(*id).identity,
                    }),
                };
                json!({
                    "node": "PropertyIndex",
                    "expr": self.expression(expr),
                    "property": property,
                })
            }
            ExprKind::Match { subject, rules } => {
                let rules: Vec<Value> = rules
                    .iter()
                    .map(|rule| {
                        json!({
                            "pattern": self.expression(&rule.pattern),
                            "result": self.expression(&rule.result),
                        })
                    })
                    .collect();
                json!({
                    "node": "Match",
                    "subject": self.expression(subject),
                    "rules": rules,
                })
            }
            ExprKind::Call { callee, arguments } => {
                let callee = match callee {
                    Callee::Unresolved(unresolved) => json!({
                        "node": "UnresolvedIdentity",
                        "identity": unresolved.identity,
                    }),
                    Callee::Function(id) => json!({
                        "node": "FunctionProperty",
                        "identity": program.function(*id).identity,
                        "arity": program.function(*id).parameters.len(),
                    }),
                };
                json!({
                    "node": "Call",
                    "callee": callee,
                    "arguments": self.expressions(&arguments.values),
                })
            }
            ExprKind::If { rules, otherwise } => {
                let rules: Vec<Value> = rules
                    .iter()
                    .map(|rule| {
                        json!({
                            "condition": self.expression(&rule.condition),
                            "result": self.expression(&rule.result),
                        })
                    })
                    .collect();
                json!({
                    "node": "IfExpression",
                    "rules": rules,
                    "otherwise": otherwise.as_ref().map(|value| self.expression(value)),
                })
            }
            ExprKind::Index { subject, index } => json!({
                "node": "ExpressionIndex",
                "subject": self.expression(subject),
                "index": self.expression(index),
            }),
            ExprKind::Invalid => json!({ "node": "InvalidValue" }),
        }
    }
}
