//! Intrinsic native types
//!
//! Every `Program` declares these in its global scope before anything else, so their
//! handles are the same in every program.

use crate::apm::NativeId;

pub struct Intrinsic;

impl Intrinsic {
    pub const NONE: NativeId = NativeId(0);
    pub const BOOL: NativeId = NativeId(1);
    pub const INT: NativeId = NativeId(2);
    pub const NUMBER: NativeId = NativeId(3);
    pub const STRING: NativeId = NativeId(4);

    /// (identity, host identity), in handle order
    pub(crate) const TYPES: [(&'static str, &'static str); 5] = [
        ("none", "unit"),
        ("bool", "bool"),
        ("int", "i64"),
        ("number", "f64"),
        ("string", "str"),
    ];
}
