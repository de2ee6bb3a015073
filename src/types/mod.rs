//! Patterns and the pattern algebra

pub mod algebra;
pub mod pattern;

pub use algebra::{
    determine_expression_pattern, do_patterns_overlap, does_instance_list_match_parameters,
    is_pattern_optional, is_pattern_subset_of_superset, unify_patterns,
};
pub use pattern::Pattern;
