//! Semirings for generalized matrix multiplication
//!
//! A semiring pairs a multiply operator with an additive monoid:
//! `C(i,j) = add_k mult(A(i,k), B(k,j))`. Besides the conventional
//! (+, ×) semiring, graph algorithms rely on:
//!
//! - `min_plus` / `max_plus`: shortest and longest paths
//! - `max_min` / `min_max`: bottleneck capacities and fuzzy relations
//! - `lor_land`: boolean reachability
//! - `any_pair` / `plus_pair`: structure only (BFS, triangle counting)

use super::binary::BinaryOp;
use super::monoid::Monoid;
use super::scalar::Scalar;

/// A semiring: additive monoid plus multiplicative operator
#[derive(Clone, Debug)]
pub struct Semiring<T> {
    add: Monoid<T>,
    mult: BinaryOp<T>,
}

impl<T: Scalar> Semiring<T> {
    pub fn new(add: Monoid<T>, mult: BinaryOp<T>) -> Self {
        Self { add, mult }
    }

    pub fn add(&self) -> &Monoid<T> {
        &self.add
    }

    pub fn mult(&self) -> &BinaryOp<T> {
        &self.mult
    }

    /// Conventional (+, ×)
    pub fn plus_times() -> Self {
        Self::new(Monoid::plus(), BinaryOp::Times)
    }

    /// Counts the number of paths: (+, 1)
    pub fn plus_pair() -> Self {
        Self::new(Monoid::plus(), BinaryOp::Pair)
    }

    pub fn plus_first() -> Self {
        Self::new(Monoid::plus(), BinaryOp::First)
    }

    pub fn plus_second() -> Self {
        Self::new(Monoid::plus(), BinaryOp::Second)
    }

    /// Tropical (min, +)
    pub fn min_plus() -> Self {
        Self::new(Monoid::min(), BinaryOp::Plus)
    }

    /// (max, +)
    pub fn max_plus() -> Self {
        Self::new(Monoid::max(), BinaryOp::Plus)
    }

    /// (max, min)
    pub fn max_min() -> Self {
        Self::new(Monoid::max(), BinaryOp::Min)
    }

    /// (min, max)
    pub fn min_max() -> Self {
        Self::new(Monoid::min(), BinaryOp::Max)
    }

    pub fn min_first() -> Self {
        Self::new(Monoid::min(), BinaryOp::First)
    }

    /// Structural (any, 1)
    pub fn any_pair() -> Self {
        Self::new(Monoid::any(), BinaryOp::Pair)
    }

    pub fn any_first() -> Self {
        Self::new(Monoid::any(), BinaryOp::First)
    }

    pub fn any_second() -> Self {
        Self::new(Monoid::any(), BinaryOp::Second)
    }

    /// Boolean (or, and)
    pub fn lor_land() -> Self {
        Self::new(Monoid::lor(), BinaryOp::Land)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_semirings() {
        let s = Semiring::<f64>::min_plus();
        assert_eq!(s.add().identity(), f64::INFINITY);
        assert_eq!(s.mult().apply(1.5, 2.0), 3.5);

        let s = Semiring::<i64>::any_pair();
        assert!(s.add().is_any());
        assert_eq!(s.mult().apply(7, 9), 1);
    }
}
