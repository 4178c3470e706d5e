//! The closed set of value types the resolver reasons about.
//!
//! `DataType` carries no behavior of its own beyond the classification and
//! promotion rules of the language. Reference types are collapsed to
//! `String`, `Object` and the type of `null`; class-level detail lives in the
//! external declared-type catalog.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Object,
    /// The type of the `null` literal.
    Null,
    /// Placeholder for an expression whose type could not be resolved.
    /// Operators applied to it stay silent so one mistake yields one
    /// diagnostic.
    Error,
}

impl DataType {
    pub fn name(self) -> &'static str {
        match self {
            DataType::Void => "void",
            DataType::Boolean => "boolean",
            DataType::Byte => "byte",
            DataType::Char => "char",
            DataType::Short => "short",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "String",
            DataType::Object => "Object",
            DataType::Null => "null",
            DataType::Error => "<error>",
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            DataType::Byte | DataType::Char | DataType::Short | DataType::Int | DataType::Long
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral() || matches!(self, DataType::Float | DataType::Double)
    }

    pub fn is_reference(self) -> bool {
        matches!(self, DataType::String | DataType::Object | DataType::Null)
    }

    pub fn is_error(self) -> bool {
        self == DataType::Error
    }

    /// Unary numeric promotion: `byte`, `short` and `char` widen to `int`.
    pub fn unary_promotion(self) -> DataType {
        match self {
            DataType::Byte | DataType::Short | DataType::Char => DataType::Int,
            other => other,
        }
    }

    /// Binary numeric promotion, or `None` if either side is not numeric.
    pub fn binary_promotion(left: DataType, right: DataType) -> Option<DataType> {
        if !left.is_numeric() || !right.is_numeric() {
            return None;
        }
        let either = |ty| left == ty || right == ty;
        Some(if either(DataType::Double) {
            DataType::Double
        } else if either(DataType::Float) {
            DataType::Float
        } else if either(DataType::Long) {
            DataType::Long
        } else {
            DataType::Int
        })
    }

    /// Promotion for integral-only operators (`&`, `|`, `^` on numbers).
    ///
    /// Both sides widen to `long` if either is `long`, otherwise to `int`.
    pub fn integral_promotion(left: DataType, right: DataType) -> Option<DataType> {
        if !left.is_integral() || !right.is_integral() {
            return None;
        }
        if left == DataType::Long || right == DataType::Long {
            Some(DataType::Long)
        } else {
            Some(DataType::Int)
        }
    }

    /// Whether `self` widens to `target` by a primitive widening conversion
    /// (or is identical to it).
    pub fn widens_to(self, target: DataType) -> bool {
        use DataType::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => target == Double,
            _ => false,
        }
    }

    /// Whether a value of type `source` may be stored into a `self`
    /// variable without a cast.
    ///
    /// `Error` is assignable both ways so an unresolved operand never causes
    /// a second diagnostic.
    pub fn is_assignable_from(self, source: DataType) -> bool {
        if self.is_error() || source.is_error() {
            return true;
        }
        if self.is_numeric() && source.is_numeric() {
            return source.widens_to(self);
        }
        match (self, source) {
            (a, b) if a == b => a != DataType::Void,
            (DataType::String | DataType::Object, DataType::Null) => true,
            (DataType::Object, DataType::String) => true,
            _ => false,
        }
    }

    /// Whether the `int` constant `value` fits `self` when assigned
    /// (implicit narrowing of constants to `byte`, `short`, `char`).
    pub fn fits_constant(self, value: i32) -> bool {
        match self {
            DataType::Byte => i8::try_from(value).is_ok(),
            DataType::Short => i16::try_from(value).is_ok(),
            DataType::Char => u16::try_from(value).is_ok(),
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
