//! Binary operators z = f(x, y)

use std::fmt;
use std::sync::Arc;

use super::scalar::Scalar;

/// Identifies a binary operator independently of its element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    First,
    Second,
    Pair,
    Any,
    Plus,
    Minus,
    Times,
    Div,
    Min,
    Max,
    Lor,
    Land,
    Lxor,
    User,
}

/// A user-defined binary operator
#[derive(Clone)]
pub struct UserOp<T> {
    name: String,
    func: Arc<dyn Fn(T, T) -> T + Send + Sync>,
}

impl<T> fmt::Debug for UserOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserOp({})", self.name)
    }
}

/// A binary operator over one element type
///
/// Built-in operators are resolved to specialized kernels by the dispatch
/// table; user operators always run through the generic path.
#[derive(Clone, Debug)]
pub enum BinaryOp<T> {
    /// z = x
    First,
    /// z = y
    Second,
    /// z = 1
    Pair,
    /// z = x or y, whichever is at hand
    Any,
    Plus,
    Minus,
    Times,
    Div,
    Min,
    Max,
    /// z = (x != 0) || (y != 0)
    Lor,
    /// z = (x != 0) && (y != 0)
    Land,
    /// z = (x != 0) != (y != 0)
    Lxor,
    User(UserOp<T>),
}

impl<T: Scalar> BinaryOp<T> {
    /// Creates a user-defined operator
    pub fn user<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        BinaryOp::User(UserOp {
            name: name.into(),
            func: Arc::new(func),
        })
    }

    /// The opcode of this operator
    pub fn opcode(&self) -> Opcode {
        match self {
            BinaryOp::First => Opcode::First,
            BinaryOp::Second => Opcode::Second,
            BinaryOp::Pair => Opcode::Pair,
            BinaryOp::Any => Opcode::Any,
            BinaryOp::Plus => Opcode::Plus,
            BinaryOp::Minus => Opcode::Minus,
            BinaryOp::Times => Opcode::Times,
            BinaryOp::Div => Opcode::Div,
            BinaryOp::Min => Opcode::Min,
            BinaryOp::Max => Opcode::Max,
            BinaryOp::Lor => Opcode::Lor,
            BinaryOp::Land => Opcode::Land,
            BinaryOp::Lxor => Opcode::Lxor,
            BinaryOp::User(_) => Opcode::User,
        }
    }

    /// Name of the operator, for diagnostics
    pub fn name(&self) -> &str {
        match self {
            BinaryOp::First => "first",
            BinaryOp::Second => "second",
            BinaryOp::Pair => "pair",
            BinaryOp::Any => "any",
            BinaryOp::Plus => "plus",
            BinaryOp::Minus => "minus",
            BinaryOp::Times => "times",
            BinaryOp::Div => "div",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::Lor => "lor",
            BinaryOp::Land => "land",
            BinaryOp::Lxor => "lxor",
            BinaryOp::User(u) => &u.name,
        }
    }

    /// Applies the operator through the generic (type-erased) path
    #[inline]
    pub fn apply(&self, x: T, y: T) -> T {
        match self {
            BinaryOp::First => x,
            BinaryOp::Second => y,
            BinaryOp::Pair => T::one(),
            BinaryOp::Any => x,
            BinaryOp::Plus => x.plus(y),
            BinaryOp::Minus => x.minus(y),
            BinaryOp::Times => x.times(y),
            BinaryOp::Div => x.safe_div(y),
            BinaryOp::Min => {
                if y < x {
                    y
                } else {
                    x
                }
            }
            BinaryOp::Max => {
                if y > x {
                    y
                } else {
                    x
                }
            }
            BinaryOp::Lor => T::from_bool(x.as_bool() || y.as_bool()),
            BinaryOp::Land => T::from_bool(x.as_bool() && y.as_bool()),
            BinaryOp::Lxor => T::from_bool(x.as_bool() != y.as_bool()),
            BinaryOp::User(u) => (u.func)(x, y),
        }
    }

    /// True if op(x, y) never reads y
    pub fn ignores_second(&self) -> bool {
        matches!(self, BinaryOp::First | BinaryOp::Pair)
    }

    /// True if op(x, y) never reads x
    pub fn ignores_first(&self) -> bool {
        matches!(self, BinaryOp::Second | BinaryOp::Pair)
    }

    /// True if op(v, v) == v for every v
    pub fn is_idempotent(&self) -> bool {
        matches!(
            self,
            BinaryOp::First | BinaryOp::Second | BinaryOp::Any | BinaryOp::Min | BinaryOp::Max
        )
    }

    /// True if both operators are the same built-in, or the same user function
    pub fn same_as(&self, other: &BinaryOp<T>) -> bool {
        match (self, other) {
            (BinaryOp::User(a), BinaryOp::User(b)) => Arc::ptr_eq(&a.func, &b.func),
            _ => self.opcode() == other.opcode(),
        }
    }
}
