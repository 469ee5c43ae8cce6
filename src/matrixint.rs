// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Exact linear algebra over the ring of integers.
//!
//! Entries of cat matrices grow multiplicatively with each extension
//! step so floating-point determinants are unreliable even for moderate
//! dimensions, and so is any fixed integer width: a Laplace matrix of
//! dimension 10 already has entries of several thousand bits.
//! All routines here use arbitrary-precision integers.

use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{Error, Result};
use crate::Int;

/// Dense row-major integer matrix.
pub type Rows = Vec<Vec<Int>>;

pub fn from_i64<R: AsRef<[i64]>>(rows: &[R]) -> Rows {
    rows.iter()
        .map(|r| r.as_ref().iter().map(|&x| Int::from(x)).collect())
        .collect()
}

pub fn is_square(rows: &[Vec<Int>]) -> bool {
    let n = rows.len();
    rows.iter().all(|r| r.len() == n)
}

/// Determinant using fraction-free Gaussian elimination (Bareiss).
///
/// Every intermediate value is a minor of the input matrix, so
/// their size is bounded by Hadamard's inequality.
pub fn det(rows: &[Vec<Int>]) -> Result<Int> {
    if !is_square(rows) {
        return Err(Error::InvalidMatrix);
    }
    let n = rows.len();
    if n == 0 {
        return Ok(Int::one());
    }
    let mut m: Rows = rows.to_vec();
    let mut negate = false;
    let mut prev = Int::one();
    for k in 0..n - 1 {
        if m[k][k].is_zero() {
            match (k + 1..n).find(|&i| !m[i][k].is_zero()) {
                Some(i) => {
                    m.swap(k, i);
                    negate = !negate;
                }
                None => return Ok(Int::zero()),
            }
        }
        let (top, bottom) = m.split_at_mut(k + 1);
        let pivot_row = &top[k];
        let pivot = &pivot_row[k];
        for row in bottom.iter_mut() {
            let lead = std::mem::take(&mut row[k]);
            for j in k + 1..n {
                let x = &row[j] * pivot - &lead * &pivot_row[j];
                // Division is exact.
                row[j] = x.div_floor(&prev);
            }
        }
        prev = pivot.clone();
    }
    let d = m[n - 1].pop().unwrap_or_default();
    Ok(if negate { -d } else { d })
}

/// The matrix without row i and column j.
pub fn minor(rows: &[Vec<Int>], i: usize, j: usize) -> Rows {
    rows.iter()
        .enumerate()
        .filter(|&(r, _)| r != i)
        .map(|(_, row)| {
            row.iter()
                .enumerate()
                .filter(|&(c, _)| c != j)
                .map(|(_, x)| x.clone())
                .collect()
        })
        .collect()
}

/// Signed minor (-1)^(i+j) det(M_ij).
pub fn cofactor(rows: &[Vec<Int>], i: usize, j: usize) -> Result<Int> {
    let d = det(&minor(rows, i, j))?;
    Ok(if (i + j) % 2 == 1 { -d } else { d })
}

/// Partial Laplace expansion of the determinant along column c,
/// skipping the term of row r:
///
/// sum(M[i][c] * cofactor(M, i, c) for i != r)
pub fn cofactor_sum(rows: &[Vec<Int>], r: usize, c: usize) -> Result<Int> {
    let mut sum = Int::zero();
    for i in 0..rows.len() {
        if i == r || rows[i][c].is_zero() {
            continue;
        }
        sum += &rows[i][c] * cofactor(rows, i, c)?;
    }
    Ok(sum)
}

/// Whether the matrix is a non-empty square matrix of determinant 1.
pub fn is_cat(rows: &[Vec<Int>]) -> bool {
    if rows.is_empty() || !is_square(rows) {
        return false;
    }
    matches!(det(rows), Ok(d) if d.is_one())
}

/// Same as is_cat for floating-point input.
///
/// Entries must be integers up to the usual floating-point tolerance
/// (absolute 1e-8, relative 1e-5) and fit in 64 bits. The determinant
/// itself is computed exactly after rounding.
pub fn is_cat_f64<R: AsRef<[f64]>>(rows: &[R]) -> bool {
    let mut ints = Vec::with_capacity(rows.len());
    for r in rows {
        let mut v = Vec::with_capacity(r.as_ref().len());
        for &x in r.as_ref() {
            let rx = x.round();
            if !((x - rx).abs() <= 1e-8 + 1e-5 * rx.abs()) {
                return false;
            }
            match rx.to_i64() {
                Some(n) => v.push(Int::from(n)),
                None => return false,
            }
        }
        ints.push(v);
    }
    is_cat(&ints)
}

/// Largest bit length of entry absolute values.
pub fn max_bits(rows: &[Vec<Int>]) -> u64 {
    rows.iter()
        .flatten()
        .map(|x| x.abs().bits())
        .max()
        .unwrap_or(0)
}
