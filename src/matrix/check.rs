//! Exhaustive structural validation

use crate::error::{Error, Result};
use crate::mask::MarkWorkspace;
use crate::matrix::{is_zombie, Context, Matrix, Structure};
use crate::ops::Scalar;

impl<T: Scalar> Matrix<T> {
    /// Validates every structural invariant of the matrix
    ///
    /// Fails with [`Error::InvalidObject`] describing the first violation.
    /// Zombies, pending tuples and jumbled vectors are finished on a private
    /// copy first, so `self` is left as it is; explicit zeros are ordinary
    /// entries.
    pub fn check(&self) -> Result<()> {
        let clean = self.finalized(&Context::default())?;
        clean.check_structure(false)
    }

    /// Validates the arrays; with `allow_jumbled` vectors may be unsorted
    pub(crate) fn check_structure(&self, allow_jumbled: bool) -> Result<()> {
        let slots = match &self.structure {
            Structure::Hypersparse { p, h, i } => {
                self.check_hyperlist(p, h)?;
                self.check_vectors(p, i, allow_jumbled)?;
                i.len()
            }
            Structure::Sparse { p, i } => {
                if p.len() != self.vdim + 1 {
                    return Err(Error::invalid_object(format!(
                        "pointer array has length {}, expected {}",
                        p.len(),
                        self.vdim + 1
                    )));
                }
                self.check_vectors(p, i, allow_jumbled)?;
                i.len()
            }
            Structure::Bitmap { b, nvals } => {
                let n = self
                    .dense_extent()
                    .ok_or_else(|| Error::invalid_object("bitmap extent overflows"))?;
                if b.len() != n {
                    return Err(Error::invalid_object(format!(
                        "bitmap has length {}, expected {n}",
                        b.len()
                    )));
                }
                if let Some(q) = b.iter().position(|&bit| bit > 1) {
                    return Err(Error::invalid_object(format!(
                        "bitmap entry {q} is {}",
                        b[q]
                    )));
                }
                let count = b.iter().filter(|&&bit| bit == 1).count();
                if count != *nvals {
                    return Err(Error::invalid_object(format!(
                        "bitmap holds {count} entries but records {nvals}"
                    )));
                }
                n
            }
            Structure::Full => self
                .dense_extent()
                .ok_or_else(|| Error::invalid_object("full extent overflows"))?,
        };

        let ok = if self.iso {
            self.x.len() == 1 || (slots == 0 && self.x.is_empty())
        } else {
            self.x.len() == slots
        };
        if !ok {
            return Err(Error::invalid_object(format!(
                "value array has length {} for {slots} slots{}",
                self.x.len(),
                if self.iso { " (iso)" } else { "" }
            )));
        }
        Ok(())
    }

    fn check_hyperlist(&self, p: &[usize], h: &[usize]) -> Result<()> {
        if p.len() != h.len() + 1 {
            return Err(Error::invalid_object(format!(
                "hypersparse pointer array has length {}, expected {}",
                p.len(),
                h.len() + 1
            )));
        }
        if h.len() > self.vdim {
            return Err(Error::invalid_object("hyperlist longer than the vector dimension"));
        }
        for (k, w) in h.windows(2).enumerate() {
            if w[0] >= w[1] {
                return Err(Error::invalid_object(format!(
                    "hyperlist not strictly ascending at position {}",
                    k + 1
                )));
            }
        }
        if let Some(&last) = h.last() {
            if last >= self.vdim {
                return Err(Error::invalid_object(format!(
                    "hyperlist entry {last} out of range {}",
                    self.vdim
                )));
            }
        }
        Ok(())
    }

    fn check_vectors(&self, p: &[usize], i: &[usize], allow_jumbled: bool) -> Result<()> {
        if p[0] != 0 {
            return Err(Error::invalid_object(format!("p[0] is {}, expected 0", p[0])));
        }
        let nnz = p[p.len() - 1];
        if nnz != i.len() {
            return Err(Error::invalid_object(format!(
                "p[nvec] is {nnz} but the index array has length {}",
                i.len()
            )));
        }
        for (k, w) in p.windows(2).enumerate() {
            if w[0] > w[1] {
                return Err(Error::invalid_object(format!(
                    "pointer array decreases at vector {k}"
                )));
            }
        }

        let mut seen = if allow_jumbled {
            Some(MarkWorkspace::new(self.vlen, u32::MAX)?)
        } else {
            None
        };
        for (k, w) in p.windows(2).enumerate() {
            let vector = &i[w[0]..w[1]];
            if let Some(seen) = seen.as_mut() {
                let mark = seen.next_pass(1);
                for &idx in vector {
                    if is_zombie(idx) || idx >= self.vlen {
                        return Err(Error::invalid_object(format!(
                            "index {idx} out of range {} in vector {k}",
                            self.vlen
                        )));
                    }
                    if seen.get(idx) == mark {
                        return Err(Error::invalid_object(format!(
                            "duplicate index {idx} in vector {k}"
                        )));
                    }
                    seen.set(idx, mark);
                }
            } else {
                for (q, &idx) in vector.iter().enumerate() {
                    if is_zombie(idx) || idx >= self.vlen {
                        return Err(Error::invalid_object(format!(
                            "index {idx} out of range {} in vector {k}",
                            self.vlen
                        )));
                    }
                    if q > 0 && vector[q - 1] >= idx {
                        return Err(Error::invalid_object(format!(
                            "indices of vector {k} are not strictly ascending"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Sparsity, SparsityControl};

    #[test]
    fn test_explicit_zero_is_an_entry() {
        // vector 0 empty, vector 1 holds two entries, one of them zero
        let m = Matrix::<f64>::from_sparse(3, 2, true, vec![0, 0, 2], None, vec![0, 2], vec![0.0, 5.0], false);
        assert!(m.check().is_ok());
        assert_eq!(m.nvals(), 2);

        let z = Matrix::<f64>::from_sparse(1, 1, true, vec![0, 1], None, vec![0], vec![0.0], false);
        assert!(z.check().is_ok());
        assert_eq!(z.nvals(), 1);
        assert_eq!(z.get(0, 0), Some(0.0));
    }

    #[test]
    fn test_deferred_work_is_finished_before_checking() {
        let mut m = Matrix::build(3, 3, &[0, 1, 2], &[0, 1, 2], &[1i32, 2, 3], None).unwrap();
        m.set_sparsity_control(SparsityControl::SPARSE);
        m.convert_to(Sparsity::Sparse).unwrap();
        m.remove_element(1, 1).unwrap();
        m.set_element(2, 0, 4).unwrap();
        m.jumbled = true;
        assert_eq!(m.nzombies(), 1);
        assert_eq!(m.npending(), 1);
        assert!(m.check().is_ok());
        // the copy was finished, not the matrix
        assert_eq!(m.nzombies(), 1);
        assert_eq!(m.npending(), 1);
        assert_eq!(m.tuples().unwrap(), vec![(0, 0, 1), (2, 0, 4), (2, 2, 3)]);
    }

    #[test]
    fn test_rejects_unsorted_and_duplicates() {
        // a vector with indices out of order but no jumbled flag
        let m = Matrix::<f64>::from_sparse(3, 1, true, vec![0, 2], None, vec![1, 0], vec![1.0, 2.0], false);
        assert!(matches!(m.check(), Err(Error::InvalidObject(_))));
        assert!(m.check_structure(true).is_ok());

        let d = Matrix::<f64>::from_sparse(3, 1, true, vec![0, 2], None, vec![1, 1], vec![1.0, 2.0], false);
        assert!(d.check_structure(true).is_err());
        assert!(d.check().is_err());
    }

    #[test]
    fn test_rejects_bad_pointers_and_hyperlist() {
        let m = Matrix::<f64>::from_sparse(3, 2, true, vec![0, 2, 1], None, vec![0, 1], vec![1.0, 2.0], false);
        assert!(m.check().is_err());

        let h = Matrix::<f64>::from_sparse(3, 4, true, vec![0, 1, 2], Some(vec![2, 2]), vec![0, 1], vec![1.0, 2.0], false);
        assert!(h.check().is_err());

        let out = Matrix::<f64>::from_sparse(3, 1, true, vec![0, 1], None, vec![3], vec![1.0], false);
        assert!(out.check().is_err());
    }

    #[test]
    fn test_rejects_wrong_value_length() {
        let m = Matrix::<f64>::from_sparse(3, 1, true, vec![0, 2], None, vec![0, 1], vec![1.0], false);
        assert!(m.check().is_err());
        let iso = Matrix::<f64>::from_sparse(3, 1, true, vec![0, 2], None, vec![0, 1], vec![1.0], true);
        assert!(iso.check().is_ok());
    }

    #[test]
    fn test_bitmap_count_must_match() {
        let m = Matrix::<i32>::from_bitmap(2, 1, true, vec![1, 0], vec![4, 0], 2, false);
        assert!(m.check().is_err());
        let m = Matrix::<i32>::from_bitmap(2, 1, true, vec![1, 0], vec![4, 0], 1, false);
        assert!(m.check().is_ok());
    }
}
