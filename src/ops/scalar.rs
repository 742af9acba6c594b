//! Element types that can be stored in a matrix

use num_traits::Num;
use std::fmt::Debug;

/// Runtime tag for each built-in element type
///
/// The kernel dispatch table is keyed on this code together with the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Fp32,
    Fp64,
}

impl TypeCode {
    /// True for the floating-point types
    pub fn is_float(self) -> bool {
        matches!(self, TypeCode::Fp32 | TypeCode::Fp64)
    }

    /// Size of one element in bytes
    pub fn size(self) -> usize {
        match self {
            TypeCode::Int8 | TypeCode::UInt8 => 1,
            TypeCode::Int16 | TypeCode::UInt16 => 2,
            TypeCode::Int32 | TypeCode::UInt32 | TypeCode::Fp32 => 4,
            TypeCode::Int64 | TypeCode::UInt64 | TypeCode::Fp64 => 8,
        }
    }
}

/// An element type of a matrix
///
/// Integer arithmetic wraps on overflow and integer division by zero
/// saturates instead of panicking, so every built-in operator is total.
pub trait Scalar:
    Copy + Send + Sync + Debug + Default + PartialOrd + Num + 'static
{
    /// Type tag used by the kernel dispatch table
    const CODE: TypeCode;
    /// Largest value (+inf for floats), the identity of MIN
    const UPPER: Self;
    /// Smallest value (-inf for floats), the identity of MAX
    const LOWER: Self;

    /// x + y, wrapping for integers
    fn plus(self, rhs: Self) -> Self;
    /// x - y, wrapping for integers
    fn minus(self, rhs: Self) -> Self;
    /// x * y, wrapping for integers
    fn times(self, rhs: Self) -> Self;
    /// x / y, defined for a zero divisor
    fn safe_div(self, rhs: Self) -> Self;

    /// Logical value of the element (nonzero is true)
    #[inline]
    fn as_bool(self) -> bool {
        !self.is_zero()
    }

    /// Converts a boolean into one or zero
    #[inline]
    fn from_bool(b: bool) -> Self {
        if b {
            Self::one()
        } else {
            Self::zero()
        }
    }
}

macro_rules! impl_signed {
    ($t:ty, $code:ident) => {
        impl Scalar for $t {
            const CODE: TypeCode = TypeCode::$code;
            const UPPER: Self = <$t>::MAX;
            const LOWER: Self = <$t>::MIN;

            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn minus(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline]
            fn times(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }

            #[inline]
            fn safe_div(self, rhs: Self) -> Self {
                if rhs == 0 {
                    if self == 0 {
                        0
                    } else if self > 0 {
                        <$t>::MAX
                    } else {
                        <$t>::MIN
                    }
                } else if rhs == -1 {
                    self.wrapping_neg()
                } else {
                    self / rhs
                }
            }
        }
    };
}

macro_rules! impl_unsigned {
    ($t:ty, $code:ident) => {
        impl Scalar for $t {
            const CODE: TypeCode = TypeCode::$code;
            const UPPER: Self = <$t>::MAX;
            const LOWER: Self = <$t>::MIN;

            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn minus(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline]
            fn times(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }

            #[inline]
            fn safe_div(self, rhs: Self) -> Self {
                if rhs == 0 {
                    if self == 0 {
                        0
                    } else {
                        <$t>::MAX
                    }
                } else {
                    self / rhs
                }
            }
        }
    };
}

macro_rules! impl_float {
    ($t:ty, $code:ident) => {
        impl Scalar for $t {
            const CODE: TypeCode = TypeCode::$code;
            const UPPER: Self = <$t>::INFINITY;
            const LOWER: Self = <$t>::NEG_INFINITY;

            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn minus(self, rhs: Self) -> Self {
                self - rhs
            }

            #[inline]
            fn times(self, rhs: Self) -> Self {
                self * rhs
            }

            #[inline]
            fn safe_div(self, rhs: Self) -> Self {
                self / rhs
            }
        }
    };
}

impl_signed!(i8, Int8);
impl_signed!(i16, Int16);
impl_signed!(i32, Int32);
impl_signed!(i64, Int64);
impl_unsigned!(u8, UInt8);
impl_unsigned!(u16, UInt16);
impl_unsigned!(u32, UInt32);
impl_unsigned!(u64, UInt64);
impl_float!(f32, Fp32);
impl_float!(f64, Fp64);
