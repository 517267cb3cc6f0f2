//! LU decomposition with partial (row) pivoting for banded matrices.
//!
//! Only the band is stored: row i keeps the columns i - kl ..= i + kl + ku,
//! the extra kl columns on the right hold the fill-in created by row swaps.
//! Factorization costs O(N kl (kl + ku)) and storage O(N (2 kl + ku + 1)),
//! instead of O(N^3) and O(N^2) for the dense `lu()`.
use nalgebra::{DMatrix, DVector};

/// Square banded matrix with `kl` sub-diagonals and `ku` super-diagonals
#[derive(Debug, Clone)]
pub struct BandMatrix {
    n: usize,
    kl: usize,
    ku: usize,
    /// n x (2 kl + ku + 1), entry (i, j) at column j + kl - i
    band: DMatrix<f64>,
}

impl BandMatrix {
    pub fn zeros(n: usize, kl: usize, ku: usize) -> Self {
        BandMatrix {
            n,
            kl,
            ku,
            band: DMatrix::zeros(n, 2 * kl + ku + 1),
        }
    }

    pub fn nrows(&self) -> usize {
        self.n
    }

    /// (kl, ku)
    pub fn bandwidths(&self) -> (usize, usize) {
        (self.kl, self.ku)
    }

    fn in_storage(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && j + self.kl >= i && j <= i + self.kl + self.ku
    }

    fn in_band(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && j + self.kl >= i && j <= i + self.ku
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        if self.in_storage(i, j) {
            self.band[(i, j + self.kl - i)]
        } else {
            0.0
        }
    }

    /// set entry (i, j); returns false if it lies outside the band
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> bool {
        if !self.in_band(i, j) {
            return false;
        }
        self.band[(i, j + self.kl - i)] = value;
        true
    }

    fn at(&mut self, i: usize, j: usize) -> &mut f64 {
        &mut self.band[(i, j + self.kl - i)]
    }

    /// Gaussian elimination with partial pivoting restricted to the band.
    /// Returns None when a pivot column is zero (singular matrix).
    pub fn lu(mut self) -> Option<BandLU> {
        let n = self.n;
        let (kl, ku) = (self.kl, self.ku);
        let mut pivots = Vec::with_capacity(n);
        for k in 0..n {
            let last_row = (k + kl).min(n - 1);
            let last_col = (k + kl + ku).min(n - 1);
            let piv = (k..=last_row)
                .max_by(|&a, &b| self.get(a, k).abs().total_cmp(&self.get(b, k).abs()))
                .unwrap_or(k);
            let diag = self.get(piv, k);
            if diag == 0.0 || !diag.is_finite() {
                return None;
            }
            if piv != k {
                for c in k..=last_col {
                    let (upper, lower) = (self.get(k, c), self.get(piv, c));
                    *self.at(k, c) = lower;
                    *self.at(piv, c) = upper;
                }
            }
            pivots.push(piv);
            for i in k + 1..=last_row {
                let m = self.get(i, k) / diag;
                *self.at(i, k) = m;
                if m == 0.0 {
                    continue;
                }
                for c in k + 1..=last_col {
                    let u = self.get(k, c);
                    *self.at(i, c) -= m * u;
                }
            }
        }
        Some(BandLU {
            factors: self,
            pivots,
        })
    }
}

/// Packed L and U factors plus the row swap made at every elimination step
#[derive(Debug, Clone)]
pub struct BandLU {
    factors: BandMatrix,
    pivots: Vec<usize>,
}

impl BandLU {
    /// solve A x = b
    pub fn solve(&self, b: &DVector<f64>) -> Option<DVector<f64>> {
        let a = &self.factors;
        let n = a.n;
        if b.len() != n {
            return None;
        }
        let (kl, ku) = (a.kl, a.ku);
        let mut x = b.clone();
        // forward: swaps and unit lower factor in elimination order
        for k in 0..n {
            x.swap_rows(k, self.pivots[k]);
            let xk = x[k];
            for i in k + 1..=(k + kl).min(n - 1) {
                x[i] -= a.get(i, k) * xk;
            }
        }
        // backward: upper factor with bandwidth kl + ku
        for k in (0..n).rev() {
            let s: f64 = (k + 1..=(k + kl + ku).min(n - 1))
                .map(|c| a.get(k, c) * x[c])
                .sum();
            x[k] = (x[k] - s) / a.get(k, k);
        }
        Some(x)
    }
}
