//! Compile-time constant values.

use core::fmt;

use crate::syntax::LiteralValue;
use crate::types::DataType;

/// The value of a literal or of a folded expression.
///
/// Folded values are always stored in the expression's resolved type, so a
/// folded `3 & 7L` is `Long(3)`, never `Int(3)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant<'a> {
    Boolean(bool),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(&'a str),
    Null,
}

impl<'a> Constant<'a> {
    pub fn from_literal(value: LiteralValue<'a>) -> Self {
        match value {
            LiteralValue::Boolean(b) => Constant::Boolean(b),
            LiteralValue::Int(i) => Constant::Int(i),
            LiteralValue::Long(l) => Constant::Long(l),
            LiteralValue::Float(f) => Constant::Float(f),
            LiteralValue::Double(d) => Constant::Double(d),
            LiteralValue::Char(c) => Constant::Char(c),
            LiteralValue::Str(s) => Constant::Str(s),
            LiteralValue::Null => Constant::Null,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Constant::Boolean(_) => DataType::Boolean,
            Constant::Char(_) => DataType::Char,
            Constant::Int(_) => DataType::Int,
            Constant::Long(_) => DataType::Long,
            Constant::Float(_) => DataType::Float,
            Constant::Double(_) => DataType::Double,
            Constant::Str(_) => DataType::String,
            Constant::Null => DataType::Null,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Constant::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// The value as an `int`, for `int`-like constants (`char` included).
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Constant::Int(i) => Some(i),
            Constant::Char(c) => Some(c as i32),
            _ => None,
        }
    }

    /// Convert a numeric constant to another numeric type.
    ///
    /// Returns `None` for non-numeric constants or targets. Identity
    /// conversions always succeed.
    pub fn convert(self, to: DataType) -> Option<Constant<'a>> {
        if self.data_type() == to {
            return Some(self);
        }
        let c = match (self, to) {
            (Constant::Char(c), _) => return Constant::Int(c as i32).convert(to),
            (Constant::Int(i), DataType::Long) => Constant::Long(i as i64),
            (Constant::Int(i), DataType::Float) => Constant::Float(i as f32),
            (Constant::Int(i), DataType::Double) => Constant::Double(i as f64),
            (Constant::Int(i), DataType::Char) => Constant::Char(i as u16),
            (Constant::Long(l), DataType::Int) => Constant::Int(l as i32),
            (Constant::Long(l), DataType::Float) => Constant::Float(l as f32),
            (Constant::Long(l), DataType::Double) => Constant::Double(l as f64),
            (Constant::Float(f), DataType::Int) => Constant::Int(f as i32),
            (Constant::Float(f), DataType::Long) => Constant::Long(f as i64),
            (Constant::Float(f), DataType::Double) => Constant::Double(f as f64),
            (Constant::Double(d), DataType::Int) => Constant::Int(d as i32),
            (Constant::Double(d), DataType::Long) => Constant::Long(d as i64),
            (Constant::Double(d), DataType::Float) => Constant::Float(d as f32),
            _ => return None,
        };
        Some(c)
    }
}

impl fmt::Display for Constant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Boolean(b) => write!(f, "{}", b),
            Constant::Char(c) => match char::from_u32(*c as u32) {
                Some(ch) => write!(f, "'{}'", ch.escape_default()),
                None => write!(f, "'\\u{:04x}'", c),
            },
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Long(l) => write!(f, "{}L", l),
            Constant::Float(x) => write!(f, "{}f", x),
            Constant::Double(d) => write!(f, "{}", d),
            Constant::Str(s) => write!(f, "{:?}", s),
            Constant::Null => f.write_str("null"),
        }
    }
}
