//! The instruction set of the target stack machine.
//!
//! Instructions are generic over the branch target: the generator emits
//! `Instruction<Label>` and finalization rewrites every target into an
//! `Instruction<usize>` holding the offset of the instruction it jumps to.

use core::fmt;

use smallvec::SmallVec;

use super::code::Label;
use crate::types::DataType;
use crate::{String, Vec};

/// The machine representation of a value on the stack or in a slot.
///
/// `boolean`, `byte`, `char` and `short` are all carried as `Int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Ref,
}

impl ValueKind {
    /// `None` for `void` and the error type.
    pub fn of(ty: DataType) -> Option<ValueKind> {
        match ty {
            DataType::Boolean
            | DataType::Byte
            | DataType::Char
            | DataType::Short
            | DataType::Int => Some(ValueKind::Int),
            DataType::Long => Some(ValueKind::Long),
            DataType::Float => Some(ValueKind::Float),
            DataType::Double => Some(ValueKind::Double),
            DataType::String | DataType::Object | DataType::Null => Some(ValueKind::Ref),
            DataType::Void | DataType::Error => None,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ValueKind::Int => "i",
            ValueKind::Long => "l",
            ValueKind::Float => "f",
            ValueKind::Double => "d",
            ValueKind::Ref => "a",
        }
    }
}

/// Branch condition, tested against zero (`If`) or between two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl Cond {
    pub fn negate(self) -> Cond {
        match self {
            Cond::Eq => Cond::Ne,
            Cond::Ne => Cond::Eq,
            Cond::Lt => Cond::Ge,
            Cond::Ge => Cond::Lt,
            Cond::Gt => Cond::Le,
            Cond::Le => Cond::Gt,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Lt => "lt",
            Cond::Ge => "ge",
            Cond::Gt => "gt",
            Cond::Le => "le",
        }
    }
}

/// Result of a floating-point compare when either operand is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NanBias {
    /// NaN compares as less (`-1`).
    Less,
    /// NaN compares as greater (`1`).
    Greater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
}

impl NumOp {
    fn mnemonic(self) -> &'static str {
        match self {
            NumOp::Add => "add",
            NumOp::Sub => "sub",
            NumOp::Mul => "mul",
            NumOp::Div => "div",
            NumOp::Rem => "rem",
            NumOp::And => "and",
            NumOp::Or => "or",
            NumOp::Xor => "xor",
            NumOp::Shl => "shl",
            NumOp::Shr => "shr",
            NumOp::Ushr => "ushr",
        }
    }
}

/// Narrowing of an `int` to a smaller integral type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Narrow {
    Byte,
    Char,
    Short,
}

impl Narrow {
    pub fn of(ty: DataType) -> Option<Narrow> {
        match ty {
            DataType::Byte => Some(Narrow::Byte),
            DataType::Char => Some(Narrow::Char),
            DataType::Short => Some(Narrow::Short),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction<T = Label> {
    Nop,

    // === Constants and slots ===
    PushNull,
    PushInt(i32),
    PushLong(i64),
    PushFloat(f32),
    PushDouble(f64),
    PushString(String),
    Load(ValueKind, u16),
    Store(ValueKind, u16),
    Pop,
    Dup,

    // === Arithmetic and conversion ===
    Arith(ValueKind, NumOp),
    Neg(ValueKind),
    /// Widening (or float/int) conversion between machine kinds.
    Convert(ValueKind, ValueKind),
    Narrow(Narrow),
    /// Compare two longs, floats or doubles, pushing `-1`, `0` or `1`.
    Compare(ValueKind, NanBias),

    // === Branches ===
    /// Pop an int and branch if it satisfies the condition against zero.
    If(Cond, T),
    /// Pop two ints and branch if `left cond right`.
    IfCmp(Cond, T),
    /// Pop two references and branch on identity (`Eq`/`Ne` only).
    IfRefCmp(Cond, T),
    Goto(T),
    /// Call a local subroutine, pushing the return address at the target.
    Jsr(T),
    /// Return from a local subroutine to the address held in the slot.
    Ret(u16),
    LookupSwitch {
        default: T,
        /// Sorted by key.
        cases: Vec<(i32, T)>,
    },

    // === Calls and exits ===
    Invoke {
        owner: String,
        name: String,
        argc: u16,
        returns: bool,
    },
    Return(Option<ValueKind>),
    Throw,
    MonitorEnter,
    MonitorExit,
}

impl<T> Instruction<T> {
    /// Net change of the operand stack depth.
    ///
    /// A `Jsr` is neutral at the call site: the return address it pushes is
    /// consumed by the subroutine.
    pub fn stack_effect(&self) -> i32 {
        match self {
            Instruction::Nop
            | Instruction::Neg(_)
            | Instruction::Convert(..)
            | Instruction::Narrow(_)
            | Instruction::Goto(_)
            | Instruction::Jsr(_)
            | Instruction::Ret(_)
            | Instruction::Return(None) => 0,
            Instruction::PushNull
            | Instruction::PushInt(_)
            | Instruction::PushLong(_)
            | Instruction::PushFloat(_)
            | Instruction::PushDouble(_)
            | Instruction::PushString(_)
            | Instruction::Load(..)
            | Instruction::Dup => 1,
            Instruction::Store(..)
            | Instruction::Pop
            | Instruction::Arith(..)
            | Instruction::Compare(..)
            | Instruction::If(..)
            | Instruction::LookupSwitch { .. }
            | Instruction::Return(Some(_))
            | Instruction::Throw
            | Instruction::MonitorEnter
            | Instruction::MonitorExit => -1,
            Instruction::IfCmp(..) | Instruction::IfRefCmp(..) => -2,
            Instruction::Invoke { argc, returns, .. } => *returns as i32 - *argc as i32,
        }
    }

    /// Whether control never falls through to the next instruction.
    pub fn is_unconditional(&self) -> bool {
        matches!(
            self,
            Instruction::Goto(_)
                | Instruction::Ret(_)
                | Instruction::LookupSwitch { .. }
                | Instruction::Return(_)
                | Instruction::Throw
        )
    }

    pub fn targets(&self) -> SmallVec<[&T; 2]> {
        let mut out = SmallVec::new();
        match self {
            Instruction::If(_, t)
            | Instruction::IfCmp(_, t)
            | Instruction::IfRefCmp(_, t)
            | Instruction::Goto(t)
            | Instruction::Jsr(t) => out.push(t),
            Instruction::LookupSwitch { default, cases } => {
                out.push(default);
                out.extend(cases.iter().map(|(_, t)| t));
            }
            _ => {}
        }
        out
    }

    /// Rewrite every branch target, failing on the first target `f` rejects.
    pub fn map_targets<U, E>(
        self,
        mut f: impl FnMut(T) -> Result<U, E>,
    ) -> Result<Instruction<U>, E> {
        Ok(match self {
            Instruction::If(c, t) => Instruction::If(c, f(t)?),
            Instruction::IfCmp(c, t) => Instruction::IfCmp(c, f(t)?),
            Instruction::IfRefCmp(c, t) => Instruction::IfRefCmp(c, f(t)?),
            Instruction::Goto(t) => Instruction::Goto(f(t)?),
            Instruction::Jsr(t) => Instruction::Jsr(f(t)?),
            Instruction::LookupSwitch { default, cases } => Instruction::LookupSwitch {
                default: f(default)?,
                cases: cases
                    .into_iter()
                    .map(|(k, t)| Ok((k, f(t)?)))
                    .collect::<Result<_, E>>()?,
            },
            Instruction::Nop => Instruction::Nop,
            Instruction::PushNull => Instruction::PushNull,
            Instruction::PushInt(v) => Instruction::PushInt(v),
            Instruction::PushLong(v) => Instruction::PushLong(v),
            Instruction::PushFloat(v) => Instruction::PushFloat(v),
            Instruction::PushDouble(v) => Instruction::PushDouble(v),
            Instruction::PushString(s) => Instruction::PushString(s),
            Instruction::Load(k, slot) => Instruction::Load(k, slot),
            Instruction::Store(k, slot) => Instruction::Store(k, slot),
            Instruction::Pop => Instruction::Pop,
            Instruction::Dup => Instruction::Dup,
            Instruction::Arith(k, op) => Instruction::Arith(k, op),
            Instruction::Neg(k) => Instruction::Neg(k),
            Instruction::Convert(from, to) => Instruction::Convert(from, to),
            Instruction::Narrow(n) => Instruction::Narrow(n),
            Instruction::Compare(k, nan) => Instruction::Compare(k, nan),
            Instruction::Ret(slot) => Instruction::Ret(slot),
            Instruction::Invoke {
                owner,
                name,
                argc,
                returns,
            } => Instruction::Invoke {
                owner,
                name,
                argc,
                returns,
            },
            Instruction::Return(k) => Instruction::Return(k),
            Instruction::Throw => Instruction::Throw,
            Instruction::MonitorEnter => Instruction::MonitorEnter,
            Instruction::MonitorExit => Instruction::MonitorExit,
        })
    }
}

impl<T: fmt::Display> fmt::Display for Instruction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Nop => f.write_str("nop"),
            Instruction::PushNull => f.write_str("aconst_null"),
            Instruction::PushInt(v) => write!(f, "ipush {}", v),
            Instruction::PushLong(v) => write!(f, "lpush {}", v),
            Instruction::PushFloat(v) => write!(f, "fpush {}", v),
            Instruction::PushDouble(v) => write!(f, "dpush {}", v),
            Instruction::PushString(s) => write!(f, "ldc {:?}", s),
            Instruction::Load(k, slot) => write!(f, "{}load {}", k.prefix(), slot),
            Instruction::Store(k, slot) => write!(f, "{}store {}", k.prefix(), slot),
            Instruction::Pop => f.write_str("pop"),
            Instruction::Dup => f.write_str("dup"),
            Instruction::Arith(k, op) => write!(f, "{}{}", k.prefix(), op.mnemonic()),
            Instruction::Neg(k) => write!(f, "{}neg", k.prefix()),
            Instruction::Convert(from, to) => write!(f, "{}2{}", from.prefix(), to.prefix()),
            Instruction::Narrow(Narrow::Byte) => f.write_str("i2b"),
            Instruction::Narrow(Narrow::Char) => f.write_str("i2c"),
            Instruction::Narrow(Narrow::Short) => f.write_str("i2s"),
            Instruction::Compare(ValueKind::Long, _) => f.write_str("lcmp"),
            Instruction::Compare(k, NanBias::Less) => write!(f, "{}cmpl", k.prefix()),
            Instruction::Compare(k, NanBias::Greater) => write!(f, "{}cmpg", k.prefix()),
            Instruction::If(c, t) => write!(f, "if{} {}", c.suffix(), t),
            Instruction::IfCmp(c, t) => write!(f, "if_icmp{} {}", c.suffix(), t),
            Instruction::IfRefCmp(c, t) => write!(f, "if_acmp{} {}", c.suffix(), t),
            Instruction::Goto(t) => write!(f, "goto {}", t),
            Instruction::Jsr(t) => write!(f, "jsr {}", t),
            Instruction::Ret(slot) => write!(f, "ret {}", slot),
            Instruction::LookupSwitch { default, cases } => {
                f.write_str("lookupswitch {")?;
                for (key, t) in cases {
                    write!(f, " {}: {},", key, t)?;
                }
                write!(f, " default: {} }}", default)
            }
            Instruction::Invoke {
                owner, name, argc, ..
            } => write!(f, "invoke {}.{}/{}", owner, name, argc),
            Instruction::Return(None) => f.write_str("return"),
            Instruction::Return(Some(k)) => write!(f, "{}return", k.prefix()),
            Instruction::Throw => f.write_str("athrow"),
            Instruction::MonitorEnter => f.write_str("monitorenter"),
            Instruction::MonitorExit => f.write_str("monitorexit"),
        }
    }
}
