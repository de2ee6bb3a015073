//! Abstract Program Model node definitions
//!
//! Named declarations live in the `Program` arenas and are referenced by handle.
//! Structural nodes (blocks, statements, expressions) are owned by their parent.

use crate::apm::{EntityId, EnumId, EnumValueId, FunctionId, NativeId, ScopeId, StateId, VariableId};
use crate::types::Pattern;
use crate::utils::Span;

// ==================== Unresolved Identity ====================

/// A raw name the parser could not bind yet. Must not survive resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedIdentity {
    pub identity: String,
    pub span: Span,
}

impl UnresolvedIdentity {
    pub fn new(identity: impl Into<String>, span: Span) -> Self {
        Self {
            identity: identity.into(),
            span,
        }
    }
}

// ==================== Declarations ====================

/// A named value with a pattern (locals, parameters, loop variables)
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub identity: String,
    pub pattern: Pattern,
    pub span: Span,
}

/// Enum declaration; its values are ordered
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub identity: String,
    pub values: Vec<EnumValueId>,
    pub span: Span,
}

/// A constant belonging to exactly one enum, compared by identity
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub identity: String,
    pub owner: EnumId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub identity: String,
    pub span: Span,
}

/// A type provided by the host. `host_identity` only matters to code generation.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeType {
    pub identity: String,
    pub host_identity: String,
    pub span: Span,
}

/// Typed state of an entity, optionally parameterised and initialised
#[derive(Debug, Clone, PartialEq)]
pub struct StateProperty {
    pub identity: String,
    pub pattern: Pattern,
    /// Scope holding the parameters; its parent is the declaring scope
    pub scope: ScopeId,
    pub parameters: Vec<VariableId>,
    pub initial_value: Option<Expression>,
    pub span: Span,
}

/// Behavior of an entity. Overloadable by parameter signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProperty {
    pub identity: String,
    /// Pattern of the value the function produces
    pub pattern: Pattern,
    pub scope: ScopeId,
    pub parameters: Vec<VariableId>,
    pub body: Option<CodeBlock>,
    pub span: Span,
}

// ==================== Code Blocks & Statements ====================

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Single implicit-return expression form
    pub singleton: bool,
    pub scope: ScopeId,
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl CodeBlock {
    pub fn new(scope: ScopeId, statements: Vec<Statement>) -> Self {
        Self {
            singleton: false,
            scope,
            statements,
            span: Span::dummy(),
        }
    }

    /// A block whose only statement is its result
    pub fn singleton(scope: ScopeId, result: Expression) -> Self {
        Self {
            singleton: true,
            scope,
            span: result.span,
            statements: vec![Statement::Expression(result)],
        }
    }

    /// The implicit result of a singleton block
    pub fn result(&self) -> Option<&Expression> {
        if !self.singleton {
            return None;
        }
        match self.statements.last() {
            Some(Statement::Expression(expr)) => Some(expr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Evaluated for effect
    Expression(Expression),
    Block(CodeBlock),
    If(IfStatement),
    For(ForStatement),
    Assignment(Assignment),
    VariableDeclaration(VariableDeclaration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub rules: Vec<IfStatementRule>,
    pub else_block: Option<CodeBlock>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatementRule {
    pub condition: Expression,
    pub code_block: CodeBlock,
    pub span: Span,
}

/// `for variable in range { body }`; the variable is declared in the body's scope
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub variable: VariableId,
    pub range: Expression,
    pub body: CodeBlock,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub subject: Expression,
    pub value: Expression,
    pub span: Span,
}

/// The variable itself is declared in the enclosing block's scope
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub variable: VariableId,
    pub value: Option<Expression>,
    pub span: Span,
}

// ==================== Expressions ====================

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Unresolved(UnresolvedIdentity),
    Variable(VariableId),
    EnumValue(EnumValueId),
    Literal(Literal),
    /// Ordinary homogeneous list value
    List(Vec<Expression>),
    /// Values positionally matching a parameter list
    InstanceList(InstanceList),
    Unary {
        op: UnaryOp,
        value: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    PropertyIndex {
        expr: Box<Expression>,
        property: PropertyRef,
    },
    Match {
        subject: Box<Expression>,
        rules: Vec<MatchRule>,
    },
    Call {
        callee: Callee,
        arguments: InstanceList,
    },
    If {
        rules: Vec<IfRule>,
        otherwise: Option<Box<Expression>>,
    },
    /// `subject[index]`
    Index {
        subject: Box<Expression>,
        index: Box<Expression>,
    },
    /// Error already reported here; compatible with everything
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceList {
    pub values: Vec<Expression>,
}

impl InstanceList {
    pub fn new(values: Vec<Expression>) -> Self {
        Self { values }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Negate => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyRef {
    Unresolved(UnresolvedIdentity),
    State(StateId),
    Function(FunctionId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Unresolved(UnresolvedIdentity),
    Function(FunctionId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRule {
    pub pattern: Expression,
    pub result: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfRule {
    pub condition: Expression,
    pub result: Expression,
    pub span: Span,
}

// ==================== Constructors ====================

impl Expression {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn unresolved(identity: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Unresolved(UnresolvedIdentity::new(identity, span)), span)
    }

    pub fn literal(literal: Literal, span: Span) -> Self {
        Self::new(ExprKind::Literal(literal), span)
    }

    pub fn integer(value: i64, span: Span) -> Self {
        Self::literal(Literal::Integer(value), span)
    }

    pub fn boolean(value: bool, span: Span) -> Self {
        Self::literal(Literal::Boolean(value), span)
    }

    pub fn none(span: Span) -> Self {
        Self::literal(Literal::None, span)
    }

    pub fn unary(op: UnaryOp, value: Expression, span: Span) -> Self {
        Self::new(ExprKind::Unary { op, value: Box::new(value) }, span)
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        let span = lhs.span.merge(&rhs.span);
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    /// `expr.property`, with the property still unresolved
    pub fn property_index(expr: Expression, property: impl Into<String>, span: Span) -> Self {
        Self::new(
            ExprKind::PropertyIndex {
                expr: Box::new(expr),
                property: PropertyRef::Unresolved(UnresolvedIdentity::new(property, span)),
            },
            span,
        )
    }

    pub fn call(callee: impl Into<String>, arguments: Vec<Expression>, span: Span) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Callee::Unresolved(UnresolvedIdentity::new(callee, span)),
                arguments: InstanceList::new(arguments),
            },
            span,
        )
    }

    pub fn match_on(subject: Expression, rules: Vec<MatchRule>, span: Span) -> Self {
        Self::new(
            ExprKind::Match {
                subject: Box::new(subject),
                rules,
            },
            span,
        )
    }

    pub fn invalid(span: Span) -> Self {
        Self::new(ExprKind::Invalid, span)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.kind, ExprKind::Invalid)
    }
}
