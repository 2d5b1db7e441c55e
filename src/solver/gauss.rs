//! Dense Gaussian elimination with scaled partial pivoting.
//!
//! MNA systems mix stamps of wildly different magnitudes (a 10 MΩ voltmeter
//! next to a 0.1 Ω shunt), so pivot choice is normalized by each row's
//! largest coefficient. A scaled pivot below [`super::PIVOT_EPSILON`] marks
//! the system singular; callers treat that as "no sensible reading" for the
//! subcircuit rather than an abort.

use crate::error::{BreadboardError, Result};

use super::PIVOT_EPSILON;

/// Solve the dense row-major `n×n` system `a · x = z` in place.
///
/// Both `a` and `z` are consumed as scratch space. Returns the solution
/// vector, or [`BreadboardError::SingularMatrix`] when elimination cannot
/// find a usable pivot.
pub fn solve_dense(a: &mut [f64], z: &mut [f64], n: usize) -> Result<Vec<f64>> {
    debug_assert_eq!(a.len(), n * n);
    debug_assert_eq!(z.len(), n);

    if n == 0 {
        return Ok(Vec::new());
    }

    // Per-row scale factors, computed once up front.
    let mut scale = vec![0.0f64; n];
    for (row, s) in scale.iter_mut().enumerate() {
        *s = a[row * n..(row + 1) * n]
            .iter()
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        if *s < PIVOT_EPSILON {
            // A row of zeros can never be eliminated.
            return Err(BreadboardError::SingularMatrix);
        }
    }

    for k in 0..n {
        // Pick the row with the largest scaled pivot.
        let mut best = k;
        let mut best_ratio = a[k * n + k].abs() / scale[k];
        for row in (k + 1)..n {
            let ratio = a[row * n + k].abs() / scale[row];
            if ratio > best_ratio {
                best_ratio = ratio;
                best = row;
            }
        }

        if best_ratio < PIVOT_EPSILON {
            return Err(BreadboardError::SingularMatrix);
        }

        if best != k {
            for col in 0..n {
                a.swap(k * n + col, best * n + col);
            }
            z.swap(k, best);
            scale.swap(k, best);
        }

        let pivot = a[k * n + k];
        for row in (k + 1)..n {
            let factor = a[row * n + k] / pivot;
            if factor == 0.0 {
                continue;
            }
            a[row * n + k] = 0.0;
            for col in (k + 1)..n {
                a[row * n + col] -= factor * a[k * n + col];
            }
            z[row] -= factor * z[k];
        }
    }

    // Back substitution.
    let mut x = vec![0.0f64; n];
    for row in (0..n).rev() {
        let mut acc = z[row];
        for col in (row + 1)..n {
            acc -= a[row * n + col] * x[col];
        }
        x[row] = acc / a[row * n + row];
    }

    Ok(x)
}
