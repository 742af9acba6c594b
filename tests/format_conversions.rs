//! Integration tests for storage formats and conversions with external libraries

use gbsparse::{
    from_dense, from_sprs, mxm, to_dense, to_sprs, Context, Descriptor, Matrix, Semiring, Sparsity,
    SparsityControl,
};
use ndarray::Array2;
use sprs::TriMat;

/// A 5x5 test matrix
///
/// ```text
/// [ 1  0  2  0  0 ]
/// [ 0  3  0  0  4 ]
/// [ 0  0  5  0  0 ]
/// [ 6  0  0  7  0 ]
/// [ 0  0  8  0  9 ]
/// ```
fn create_test_matrix() -> Matrix<f64> {
    Matrix::build(
        5,
        5,
        &[0, 0, 1, 1, 2, 3, 3, 4, 4],
        &[0, 2, 1, 4, 2, 0, 3, 2, 4],
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        None,
    )
    .unwrap()
}

fn create_tridiagonal(n: usize) -> Matrix<f64> {
    let mut tri = TriMat::new((n, n));
    for i in 0..n {
        if i > 0 {
            tri.add_triplet(i, i - 1, 1.0);
        }
        tri.add_triplet(i, i, 2.0);
        if i + 1 < n {
            tri.add_triplet(i, i + 1, 1.0);
        }
    }
    from_sprs(tri.to_csr()).unwrap()
}

#[test]
fn test_every_format_keeps_entries() {
    let original = create_test_matrix();
    let expected = original.tuples().unwrap();
    for sparsity in [Sparsity::Hypersparse, Sparsity::Bitmap, Sparsity::Sparse] {
        let mut m = original.clone();
        m.convert_to(sparsity).unwrap();
        assert_eq!(m.sparsity(), sparsity);
        assert!(m.check().is_ok());
        assert_eq!(m.tuples().unwrap(), expected);
    }
    let mut m = original.clone();
    assert!(m.convert_to(Sparsity::Full).is_err());
}

#[test]
fn test_sparsity_control_limits_conform() {
    let mut m = create_test_matrix();
    m.set_sparsity_control(SparsityControl::BITMAP);
    m.conform().unwrap();
    assert_eq!(m.sparsity(), Sparsity::Bitmap);
    assert_eq!(m.nvals(), 9);
}

#[test]
fn test_sprs_product_matches_mxm() {
    let a = create_tridiagonal(50);
    let b = create_test_matrix();
    let big_b = {
        let mut tri = TriMat::new((50, 50));
        for (i, j, v) in b.tuples().unwrap() {
            tri.add_triplet(i * 7, j * 9, v);
        }
        from_sprs(tri.to_csc()).unwrap()
    };
    assert!(big_b.by_col());

    let sa = to_sprs(&a).unwrap();
    let sb = to_sprs(&big_b).unwrap();
    let product = &sa * &sb.to_csr();
    let want = from_sprs(product).unwrap();

    let mut c = Matrix::new(50, 50);
    mxm(&mut c, None, None, &Semiring::plus_times(), &a, &big_b, &Descriptor::new(), &Context::default()).unwrap();
    assert_eq!(c.tuples().unwrap(), want.tuples().unwrap());
}

#[test]
fn test_dense_conversion() {
    let m = create_test_matrix();
    let d = to_dense(&m, 0.0).unwrap();
    assert_eq!(d.dim(), (5, 5));
    assert_eq!(d[[3, 3]], 7.0);
    assert_eq!(d[[0, 1]], 0.0);

    let full = from_dense(&d);
    assert_eq!(full.sparsity(), Sparsity::Full);
    assert_eq!(full.nvals(), 25);
    assert_eq!(full.get(4, 2), Some(8.0));

    let ones = Array2::from_elem((3, 4), 1i32);
    let m = from_dense(&ones);
    assert_eq!((m.nrows(), m.ncols()), (3, 4));
    assert_eq!(to_dense(&m, 0).unwrap(), ones);
}
