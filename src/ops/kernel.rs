//! Kernel dispatch table
//!
//! Built-in operators on built-in types resolve to plain function pointers
//! that the compiler can inline into the monomorphized loops. Anything the
//! table does not cover (user operators, integer division) runs through the
//! generic [`BinaryOp::apply`] path instead.

use super::binary::{BinaryOp, Opcode};
use super::scalar::{Scalar, TypeCode};
use super::semiring::Semiring;

/// A specialized binary kernel
pub type BinaryFn<T> = fn(T, T) -> T;

fn first<T: Scalar>(x: T, _y: T) -> T {
    x
}

fn second<T: Scalar>(_x: T, y: T) -> T {
    y
}

fn pair<T: Scalar>(_x: T, _y: T) -> T {
    T::one()
}

fn plus<T: Scalar>(x: T, y: T) -> T {
    x.plus(y)
}

fn minus<T: Scalar>(x: T, y: T) -> T {
    x.minus(y)
}

fn times<T: Scalar>(x: T, y: T) -> T {
    x.times(y)
}

fn div<T: Scalar>(x: T, y: T) -> T {
    x.safe_div(y)
}

fn min<T: Scalar>(x: T, y: T) -> T {
    if y < x {
        y
    } else {
        x
    }
}

fn max<T: Scalar>(x: T, y: T) -> T {
    if y > x {
        y
    } else {
        x
    }
}

fn lor<T: Scalar>(x: T, y: T) -> T {
    T::from_bool(x.as_bool() || y.as_bool())
}

fn land<T: Scalar>(x: T, y: T) -> T {
    T::from_bool(x.as_bool() && y.as_bool())
}

fn lxor<T: Scalar>(x: T, y: T) -> T {
    T::from_bool(x.as_bool() != y.as_bool())
}

/// Looks up the specialized kernel for an operator on a type
///
/// Returns `None` when no specialized kernel exists, or when `code` is not
/// the type code of `T`.
pub fn lookup<T: Scalar>(opcode: Opcode, code: TypeCode) -> Option<BinaryFn<T>> {
    if code != T::CODE {
        return None;
    }
    let f: BinaryFn<T> = match opcode {
        Opcode::First => first::<T> as BinaryFn<T>,
        // ANY keeps whichever operand is at hand, which is x
        Opcode::Any => first::<T>,
        Opcode::Second => second::<T>,
        Opcode::Pair => pair::<T>,
        Opcode::Plus => plus::<T>,
        Opcode::Minus => minus::<T>,
        Opcode::Times => times::<T>,
        Opcode::Div if code.is_float() => div::<T>,
        Opcode::Min => min::<T>,
        Opcode::Max => max::<T>,
        Opcode::Lor => lor::<T>,
        Opcode::Land => land::<T>,
        Opcode::Lxor => lxor::<T>,
        Opcode::Div | Opcode::User => return None,
    };
    Some(f)
}

/// A binary operator resolved through the dispatch table
#[derive(Clone, Debug)]
pub enum Kernel<T> {
    /// Specialized function from the table
    Factory(BinaryFn<T>),
    /// Type-erased fallback
    Generic(BinaryOp<T>),
}

impl<T: Scalar> Kernel<T> {
    pub fn resolve(op: &BinaryOp<T>) -> Self {
        match lookup::<T>(op.opcode(), T::CODE) {
            Some(f) => Kernel::Factory(f),
            None => Kernel::Generic(op.clone()),
        }
    }

    #[inline]
    pub fn call(&self, x: T, y: T) -> T {
        match self {
            Kernel::Factory(f) => f(x, y),
            Kernel::Generic(op) => op.apply(x, y),
        }
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, Kernel::Factory(_))
    }
}

/// Everything a multiply kernel needs from a semiring, resolved once per call
#[derive(Clone, Debug)]
pub struct SemiringKernel<T> {
    pub(crate) add: Kernel<T>,
    pub(crate) mult: Kernel<T>,
    pub(crate) flip: bool,
    pub(crate) terminal: Option<T>,
    pub(crate) any: bool,
}

impl<T: Scalar> SemiringKernel<T> {
    /// Resolves a semiring; `flip` swaps the operands of the multiply
    pub fn new(semiring: &Semiring<T>, flip: bool) -> Self {
        let monoid = semiring.add();
        Self {
            add: Kernel::resolve(monoid.op()),
            mult: Kernel::resolve(semiring.mult()),
            flip,
            terminal: monoid.terminal(),
            any: monoid.is_any(),
        }
    }

    /// mult(x, y), or mult(y, x) when flipped
    #[inline]
    pub fn multiply(&self, x: T, y: T) -> T {
        if self.flip {
            self.mult.call(y, x)
        } else {
            self.mult.call(x, y)
        }
    }

    #[inline]
    pub fn add(&self, x: T, y: T) -> T {
        self.add.call(x, y)
    }

    /// True once a running sum can no longer change
    #[inline]
    pub fn is_terminal(&self, v: T) -> bool {
        self.any || self.terminal == Some(v)
    }

    /// True if both the monoid and the multiply have table entries
    pub fn is_builtin(&self) -> bool {
        self.add.is_factory() && self.mult.is_factory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_builtin() {
        let f = lookup::<f64>(Opcode::Plus, TypeCode::Fp64).unwrap();
        assert_eq!(f(1.0, 2.0), 3.0);
        let f = lookup::<f64>(Opcode::Div, TypeCode::Fp64).unwrap();
        assert_eq!(f(1.0, 4.0), 0.25);
    }

    #[test]
    fn test_lookup_misses() {
        assert!(lookup::<i32>(Opcode::Div, TypeCode::Int32).is_none());
        assert!(lookup::<i32>(Opcode::User, TypeCode::Int32).is_none());
        assert!(lookup::<i32>(Opcode::Plus, TypeCode::Fp64).is_none());
    }

    #[test]
    fn test_generic_fallback() {
        let op = BinaryOp::<i32>::user("rsub", |x, y| y - x);
        let k = Kernel::resolve(&op);
        assert!(!k.is_factory());
        assert_eq!(k.call(1, 5), 4);
        assert!(!Kernel::resolve(&BinaryOp::<i32>::Div).is_factory());
    }

    #[test]
    fn test_semiring_kernel_flip() {
        let s = Semiring::new(crate::ops::Monoid::plus(), BinaryOp::<i32>::Minus);
        let k = SemiringKernel::new(&s, false);
        assert_eq!(k.multiply(5, 3), 2);
        let k = SemiringKernel::new(&s, true);
        assert_eq!(k.multiply(5, 3), -2);
        assert!(k.is_builtin());
        assert!(!k.is_terminal(0));
    }
}
