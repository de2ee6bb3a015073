//! Pattern algebra
//!
//! Pure functions over patterns: inference, subset, optionality and overlap.
//! Invalid patterns are poison: they are compatible with everything so that one
//! reported error does not cascade.

use crate::apm::{
    Callee, ExprKind, Expression, InstanceList, Intrinsic, Literal, Program, PropertyRef,
    UnaryOp, VariableId,
};
use crate::types::Pattern;

/// Infer the pattern of an expression
pub fn determine_expression_pattern(program: &Program, expr: &Expression) -> Pattern {
    match &expr.kind {
        ExprKind::Literal(literal) => literal_pattern(literal),
        ExprKind::Variable(id) => program.variable(*id).pattern.clone(),
        ExprKind::EnumValue(id) => Pattern::Enum(program.enum_value(*id).owner),
        ExprKind::Unary { op: UnaryOp::Not, .. } => Pattern::BOOL,
        ExprKind::Unary { op: UnaryOp::Negate, value } => {
            determine_expression_pattern(program, value)
        }
        ExprKind::Binary { op, lhs, .. } => {
            if op.is_arithmetic() {
                determine_expression_pattern(program, lhs)
            } else {
                Pattern::BOOL
            }
        }
        ExprKind::PropertyIndex { property, .. } => match property {
            PropertyRef::State(id) => program.state(*id).pattern.clone(),
            PropertyRef::Function(id) => program.function(*id).pattern.clone(),
            PropertyRef::Unresolved(_) => Pattern::Invalid,
        },
        ExprKind::Call { callee, .. } => match callee {
            Callee::Function(id) => program.function(*id).pattern.clone(),
            Callee::Unresolved(_) => Pattern::Invalid,
        },
        ExprKind::Match { rules, .. } => {
            let results = rules
                .iter()
                .map(|rule| determine_expression_pattern(program, &rule.result));
            unify_all(results).unwrap_or(Pattern::Invalid)
        }
        ExprKind::If { rules, otherwise } => {
            let results = rules
                .iter()
                .map(|rule| &rule.result)
                .chain(otherwise.as_deref())
                .map(|result| determine_expression_pattern(program, result));
            match unify_all(results) {
                Some(pattern) if otherwise.is_none() => Pattern::optional(pattern),
                Some(pattern) => pattern,
                None => Pattern::Invalid,
            }
        }
        // No list patterns exist, so lists and indexing cannot be typed further
        ExprKind::List(_)
        | ExprKind::InstanceList(_)
        | ExprKind::Index { .. }
        | ExprKind::Unresolved(_)
        | ExprKind::Invalid => Pattern::Invalid,
    }
}

fn literal_pattern(literal: &Literal) -> Pattern {
    match literal {
        Literal::None => Pattern::NONE,
        Literal::Boolean(_) => Pattern::BOOL,
        Literal::Integer(_) => Pattern::INT,
        Literal::Number(_) => Pattern::NUMBER,
        Literal::String(_) => Pattern::STRING,
    }
}

/// True iff the outermost layer is optional
pub fn is_pattern_optional(pattern: &Pattern) -> bool {
    matches!(pattern, Pattern::Optional(_))
}

fn is_none(pattern: &Pattern) -> bool {
    matches!(pattern, Pattern::Native(id) if *id == Intrinsic::NONE)
}

/// Same declaration, compared by handle
fn same_nominal(a: &Pattern, b: &Pattern) -> bool {
    match (a, b) {
        (Pattern::Enum(x), Pattern::Enum(y)) => x == y,
        (Pattern::Entity(x), Pattern::Entity(y)) => x == y,
        (Pattern::Native(x), Pattern::Native(y)) => x == y,
        (Pattern::Unresolved(x), Pattern::Unresolved(y)) => x.identity == y.identity,
        _ => false,
    }
}

/// Can every value of `subset` be used where `superset` is expected?
///
/// Not symmetric: a required value widens into an optional, an optional never
/// narrows into a required value.
pub fn is_pattern_subset_of_superset(subset: &Pattern, superset: &Pattern) -> bool {
    if subset.is_invalid() || superset.is_invalid() {
        return true;
    }

    let sub = subset.core();
    let sup = superset.core();
    match (is_pattern_optional(subset), is_pattern_optional(superset)) {
        (true, false) => false,
        (false, true) => is_none(sub) || same_nominal(sub, sup),
        _ => same_nominal(sub, sup),
    }
}

/// Could a value of `subject` match `candidate`?
///
/// Conservative: anything not provably disjoint overlaps.
pub fn do_patterns_overlap(candidate: &Pattern, subject: &Pattern) -> bool {
    if candidate.is_invalid() || subject.is_invalid() {
        return true;
    }
    if candidate.is_unresolved() || subject.is_unresolved() {
        return true;
    }

    let candidate_core = candidate.core();
    let subject_core = subject.core();
    if is_pattern_optional(subject) && is_none(candidate_core) {
        return true;
    }
    if is_pattern_optional(candidate) && is_none(subject_core) {
        return true;
    }
    same_nominal(candidate_core, subject_core)
}

/// The narrowest pattern both `a` and `b` fit in, if there is one
pub fn unify_patterns(a: &Pattern, b: &Pattern) -> Option<Pattern> {
    if is_pattern_subset_of_superset(a, b) {
        Some(b.clone())
    } else if is_pattern_subset_of_superset(b, a) {
        Some(a.clone())
    } else if is_none(a) {
        Some(Pattern::optional(b.clone()))
    } else if is_none(b) {
        Some(Pattern::optional(a.clone()))
    } else {
        None
    }
}

/// Unify a sequence; `None` if it is empty or two members cannot be unified
pub(crate) fn unify_all(patterns: impl IntoIterator<Item = Pattern>) -> Option<Pattern> {
    let mut patterns = patterns.into_iter();
    let first = patterns.next()?;
    patterns.try_fold(first, |unified, next| unify_patterns(&unified, &next))
}

/// Does every argument fit its parameter, positionally and with equal arity?
pub fn does_instance_list_match_parameters(
    program: &Program,
    instance_list: &InstanceList,
    parameters: &[VariableId],
) -> bool {
    instance_list.values.len() == parameters.len()
        && instance_list
            .values
            .iter()
            .zip(parameters)
            .all(|(argument, parameter)| {
                let argument_pattern = determine_expression_pattern(program, argument);
                let parameter_pattern = &program.variable(*parameter).pattern;
                is_pattern_subset_of_superset(&argument_pattern, parameter_pattern)
            })
}
