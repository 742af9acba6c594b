//! Monoids: associative, commutative operators with an identity

use super::binary::BinaryOp;
use super::scalar::Scalar;
use crate::error::{Error, Result};

/// A monoid (op, identity), with an optional terminal value
///
/// Once a reduction reaches the terminal value no further input can change
/// it, so reductions may stop early.
#[derive(Clone, Debug)]
pub struct Monoid<T> {
    op: BinaryOp<T>,
    identity: T,
    terminal: Option<T>,
}

impl<T: Scalar> Monoid<T> {
    /// Creates a monoid from an operator and its identity
    ///
    /// MINUS and DIV are rejected since they are not associative.
    pub fn new(op: BinaryOp<T>, identity: T) -> Result<Self> {
        match op {
            BinaryOp::Minus | BinaryOp::Div => Err(Error::DomainMismatch(format!(
                "operator {} cannot be used as a monoid",
                op.name()
            ))),
            _ => Ok(Self {
                op,
                identity,
                terminal: None,
            }),
        }
    }

    /// Sets the terminal value of the monoid
    pub fn with_terminal(mut self, terminal: T) -> Self {
        self.terminal = Some(terminal);
        self
    }

    fn builtin(op: BinaryOp<T>, identity: T, terminal: Option<T>) -> Self {
        Self {
            op,
            identity,
            terminal,
        }
    }

    /// PLUS monoid, identity 0
    pub fn plus() -> Self {
        Self::builtin(BinaryOp::Plus, T::zero(), None)
    }

    /// TIMES monoid, identity 1; integers terminate at 0
    pub fn times() -> Self {
        let terminal = if T::CODE.is_float() {
            None
        } else {
            Some(T::zero())
        };
        Self::builtin(BinaryOp::Times, T::one(), terminal)
    }

    /// MIN monoid, identity is the largest value
    pub fn min() -> Self {
        Self::builtin(BinaryOp::Min, T::UPPER, Some(T::LOWER))
    }

    /// MAX monoid, identity is the smallest value
    pub fn max() -> Self {
        Self::builtin(BinaryOp::Max, T::LOWER, Some(T::UPPER))
    }

    /// ANY monoid: the result is any one of the inputs
    pub fn any() -> Self {
        Self::builtin(BinaryOp::Any, T::zero(), None)
    }

    /// Logical OR, terminal at 1
    pub fn lor() -> Self {
        Self::builtin(BinaryOp::Lor, T::zero(), Some(T::one()))
    }

    /// Logical AND, terminal at 0
    pub fn land() -> Self {
        Self::builtin(BinaryOp::Land, T::one(), Some(T::zero()))
    }

    /// Logical XOR
    pub fn lxor() -> Self {
        Self::builtin(BinaryOp::Lxor, T::zero(), None)
    }

    pub fn op(&self) -> &BinaryOp<T> {
        &self.op
    }

    pub fn identity(&self) -> T {
        self.identity
    }

    pub fn terminal(&self) -> Option<T> {
        self.terminal
    }

    /// True for the ANY monoid, which has no meaningful accumulation
    pub fn is_any(&self) -> bool {
        matches!(self.op, BinaryOp::Any)
    }

    /// Reduces a sequence of values, stopping at the terminal value
    pub fn reduce<I: IntoIterator<Item = T>>(&self, values: I) -> T {
        let mut acc = self.identity;
        for (n, v) in values.into_iter().enumerate() {
            acc = if n == 0 { v } else { self.op.apply(acc, v) };
            if self.is_any() || self.terminal == Some(acc) {
                break;
            }
        }
        acc
    }
}
