//! Iso-valued matrices
//!
//! An iso matrix stores one value shared by all of its entries.

use crate::error::Result;
use crate::matrix::Matrix;
use crate::ops::Scalar;
use crate::utils::try_vec;

impl<T: Scalar> Matrix<T> {
    /// The shared value of an iso matrix
    pub fn iso_value(&self) -> Option<T> {
        if self.iso {
            self.x.first().copied()
        } else {
            None
        }
    }

    /// Compresses the values to one if all present entries are equal
    ///
    /// Returns true if the matrix is iso afterwards.
    pub fn iso_check(&mut self) -> Result<bool> {
        self.ensure_valid()?;
        if self.iso {
            return Ok(true);
        }
        if self.pending.is_some() || self.nzombies > 0 {
            self.wait()?;
        }
        let mut first = None;
        for p in 0..self.nnz_slots() {
            if !self.present_at(p) {
                continue;
            }
            let v = self.x[p];
            match first {
                None => first = Some(v),
                Some(f) if f == v => {}
                Some(_) => return Ok(false),
            }
        }
        match first {
            Some(v) => {
                self.x = vec![v];
                self.iso = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Gives every entry its own value slot
    pub fn expand_iso(&mut self) -> Result<()> {
        self.ensure_valid()?;
        if !self.iso {
            return Ok(());
        }
        let v = self.x.first().copied().unwrap_or_else(T::zero);
        self.x = try_vec(self.nnz_slots(), v)?;
        self.iso = false;
        Ok(())
    }
}
