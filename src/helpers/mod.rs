
/// This module implements the dense linear algebra routines used to solve
/// least-squares problems. We made the choice not to use a BLAS/LAPACK
/// subroutine since it introduces unsafe code and a significantly larger
/// bundle size, and the problems solved here only have a handful of columns.
pub mod linalg {
    use crate::Float;
    use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum LinalgError {
        #[error("system with {n_rows} rows and {n_columns} columns is underdetermined")]
        Underdetermined { n_rows: usize, n_columns: usize },
        #[error("matrix is rank deficient (numerical rank {rank} < {n_columns})")]
        RankDeficient { rank: usize, n_columns: usize },
        #[error("right-hand side has {found} entries, expected {expected}")]
        DimensionMismatch { expected: usize, found: usize },
    }

    /// Householder QR factorization of a tall matrix `A` (n_rows >= n_columns),
    /// applied in place to a right-hand side.
    ///
    /// Returns the upper-triangular factor `R` (n_columns x n_columns) together
    /// with `Q^T b` truncated to its first n_columns entries. `Q` itself is never
    /// formed. Column norms are accumulated with `hypot`, but the reflectors
    /// still square their entries: inputs close to the overflow threshold should
    /// be equilibrated first, as [`lstsq_qr`] does.
    pub fn householder_qr<F: 'static + Float>(
        A: ArrayView2<F>,
        b: ArrayView1<F>,
    ) -> Result<(Array2<F>, Array1<F>), LinalgError> {
        let (n_rows, n_columns) = A.dim();
        if b.len() != n_rows {
            return Err(LinalgError::DimensionMismatch {
                expected: n_rows,
                found: b.len(),
            });
        }
        if n_rows < n_columns {
            return Err(LinalgError::Underdetermined { n_rows, n_columns });
        }

        let mut R = A.to_owned();
        let mut qtb = b.to_owned();
        let two = F::cast(2.);

        for k in 0..n_columns {
            let norm = R.slice(s![k.., k]).fold(F::zero(), |acc, &x| acc.hypot(x));
            if norm == F::zero() {
                continue;
            }

            // Reflect onto -sign(R[k, k]) * e_k to avoid cancellation.
            let alpha = if R[[k, k]] >= F::zero() { -norm } else { norm };
            let mut v = R.slice(s![k.., k]).to_owned();
            v[0] -= alpha;
            let v_norm_sq = v.dot(&v);
            if v_norm_sq == F::zero() {
                continue;
            }

            for j in (k + 1)..n_columns {
                let scale = two * v.dot(&R.slice(s![k.., j])) / v_norm_sq;
                R.slice_mut(s![k.., j]).scaled_add(-scale, &v);
            }
            let scale = two * v.dot(&qtb.slice(s![k..])) / v_norm_sq;
            qtb.slice_mut(s![k..]).scaled_add(-scale, &v);

            // The reflected column is alpha * e_k, written exactly.
            R.slice_mut(s![k.., k]).fill(F::zero());
            R[[k, k]] = alpha;
        }

        Ok((
            R.slice(s![..n_columns, ..]).to_owned(),
            qtb.slice(s![..n_columns]).to_owned(),
        ))
    }

    /// Numerical rank of an upper-triangular factor: the number of diagonal
    /// entries whose magnitude exceeds `tolerance * max_i |R[i, i]|`.
    pub fn numerical_rank<F: 'static + Float>(R: ArrayView2<F>, tolerance: F) -> usize {
        let diag = R.diag();
        let max_diag = diag.fold(F::zero(), |max_val, &x| max_val.max(x.abs()));
        if max_diag == F::zero() {
            return 0;
        }
        diag.iter()
            .filter(|&&x| x.abs() > tolerance * max_diag)
            .count()
    }

    /// This function solves an upper-triangular linear system `R x = b` by
    /// backward substitution.
    pub fn back_substitution<F: 'static + Float>(
        R: ArrayView2<F>,
        b: ArrayView1<F>,
    ) -> Result<Array1<F>, LinalgError> {
        let size = b.len();
        if R.nrows() != size || R.ncols() != size {
            return Err(LinalgError::DimensionMismatch {
                expected: R.nrows(),
                found: size,
            });
        }

        let mut x = Array1::<F>::zeros(size);
        for i in (0..size).rev() {
            if R[[i, i]] == F::zero() {
                return Err(LinalgError::RankDeficient {
                    rank: i,
                    n_columns: size,
                });
            }
            let tail = R.slice(s![i, i + 1..]).dot(&x.slice(s![i + 1..]));
            x[i] = (b[i] - tail) / R[[i, i]];
        }
        Ok(x)
    }

    /// Solves `min_x ||A x - b||_2` with a Householder QR factorization of `A`.
    ///
    /// The normal equations are never formed, so the conditioning of the
    /// problem is that of `A` rather than `A^T A`. Every column of `A`, and `b`,
    /// is first divided by its largest absolute entry: any finite input is
    /// factored without overflow, and the rank test does not depend on the
    /// units of each column. A factor whose numerical rank (see
    /// [`numerical_rank`]) is below the number of columns is reported as
    /// [`LinalgError::RankDeficient`] instead of returning one of infinitely
    /// many minimizers.
    pub fn lstsq_qr<F: 'static + Float>(
        A: ArrayView2<F>,
        b: ArrayView1<F>,
        rank_tolerance: F,
    ) -> Result<Array1<F>, LinalgError> {
        let n_columns = A.ncols();
        let column_scales = A.map_axis(Axis(0), |column| max_abs_or_one(column));
        let target_scale = max_abs_or_one(b);

        let A_scaled = &A / &column_scales;
        let b_scaled = &b / target_scale;
        let (R, qtb) = householder_qr(A_scaled.view(), b_scaled.view())?;

        let rank = numerical_rank(R.view(), rank_tolerance);
        if rank < n_columns {
            return Err(LinalgError::RankDeficient { rank, n_columns });
        }

        let x_scaled = back_substitution(R.view(), qtb.view())?;
        Ok(&x_scaled / &column_scales * target_scale)
    }

    /// Largest absolute entry, or `1` for an all-zero vector.
    fn max_abs_or_one<F: Float>(x: ArrayView1<F>) -> F {
        let max_abs = x.fold(F::zero(), |max_val, &xi| max_val.max(xi.abs()));
        if max_abs > F::zero() {
            max_abs
        } else {
            F::one()
        }
    }
}

/// This module contains small array utilities shared by the estimators.
pub mod helpers {
    use crate::Float;
    use ndarray::{ArrayView1, ArrayView2};

    /// Returns the `(row, column)` position of the first non-finite entry of a
    /// matrix, scanning in row-major order.
    pub fn first_non_finite_2d<F: Float>(X: ArrayView2<F>) -> Option<(usize, usize)> {
        X.indexed_iter()
            .find(|(_, x)| !x.is_finite())
            .map(|(idx, _)| idx)
    }

    /// Returns the index of the first non-finite entry of a vector.
    pub fn first_non_finite<F: Float>(x: ArrayView1<F>) -> Option<usize> {
        x.iter().position(|x| !x.is_finite())
    }

    /// Adds a leading column of ones to a design matrix.
    pub fn with_intercept_column<F: Float>(X: ArrayView2<F>) -> ndarray::Array2<F> {
        let (n_samples, n_features) = X.dim();
        let mut design = ndarray::Array2::<F>::ones((n_samples, n_features + 1));
        design.slice_mut(ndarray::s![.., 1..]).assign(&X);
        design
    }
}

/// This module contains helpers functions to efficiently write tests.
pub mod test_helpers {
    use crate::Float;
    use approx::AbsDiffEq;
    use ndarray::{Array1, Array2, ArrayView1};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal, Uniform};

    pub fn assert_array_all_close<F>(x: ArrayView1<F>, y: ArrayView1<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.len(), y.len());
        for i in 0..x.len() {
            if x[i].abs_diff_ne(&y[i], delta) {
                panic!("x: {}, y: {} ; with precision level {}", x[i], y[i], delta);
            }
        }
    }

    /// Generates `n_samples` sensor readings drawn uniformly inside the
    /// physical ranges of the calibration rig, laid out as
    /// `[raw_value, ambient_temp, humidity]`.
    pub fn generate_sensor_readings(n_samples: usize, seed: u64) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let raw = Uniform::new(80., 120.);
        let temp = Uniform::new(15., 45.);
        let humidity = Uniform::new(0., 100.);

        let mut data = Vec::with_capacity(n_samples * 3);
        for _ in 0..n_samples {
            data.push(raw.sample(&mut rng));
            data.push(temp.sample(&mut rng));
            data.push(humidity.sample(&mut rng));
        }
        Array2::from_shape_vec((n_samples, 3), data).unwrap()
    }

    /// Generates a linear regression problem `y = X w + b + noise` with
    /// standard normal features and Gaussian noise of standard deviation
    /// `noise_std`. Returns the design matrix, the targets and the true
    /// coefficients (intercept excluded).
    pub fn generate_random_data(
        n_samples: usize,
        n_features: usize,
        intercept: f64,
        noise_std: f64,
    ) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(42);
        let normal = Normal::new(0., 1.).unwrap();

        let X = Array2::from_shape_simple_fn((n_samples, n_features), || normal.sample(&mut rng));
        let true_w = Array1::from_shape_simple_fn(n_features, || normal.sample(&mut rng));
        let noise = Array1::from_shape_simple_fn(n_samples, || noise_std * normal.sample(&mut rng));
        let y = X.dot(&true_w) + noise + intercept;

        (X, y, true_w)
    }
}
