// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Construction of cat matrices using Laplace expansions.
//!
//! Each step inserts a new row and column, at arbitrary positions, in
//! a cat matrix of size n. All new entries are parameters except the
//! one at the intersection, which is solved for using the Laplace
//! expansion of the determinant along the new column:
//!
//! det = x C(r,c) + S  where  C(r,c) = (-1)^(r+c) det(M) = (-1)^(r+c)
//!
//! so x = (-1)^(r+c) (1 - S) gives determinant 1 whatever the other values.
//!
//! Reference:
//! Y. Wu, Z. Hua, Y. Zhou, n-Dimensional Discrete Cat Map Generation
//! Using Laplace Expansions (IEEE Transactions on Cybernetics, 2015)

use rand::Rng;

use crate::error::{Error, Result};
use crate::matrixint::{self, Rows};
use crate::params::{laplace_iterations, laplace_required_size, laplace_rows_size};
use num_traits::{One, Zero};

use crate::{Int, Verbosity};

/// Parameters of a full construction. Step i (extending a matrix
/// of size i+1) uses vectors of length i+1 and positions in [0, i+1].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    /// Values of the inserted columns, split at the row position.
    pub rows: Vec<Vec<i64>>,
    /// Values of the inserted rows, split at the column position.
    pub cols: Vec<Vec<i64>>,
    pub rows_loc: Vec<usize>,
    pub cols_loc: Vec<usize>,
}

impl Params {
    pub fn len(&self) -> usize {
        let vecs: usize = self.rows.iter().chain(&self.cols).map(|v| v.len()).sum();
        vecs + self.rows_loc.len() + self.cols_loc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat representation, in the order expected by split_sequence.
    pub fn to_sequence(&self) -> Vec<i64> {
        let mut seq: Vec<i64> = self.rows.iter().chain(&self.cols).flatten().copied().collect();
        seq.extend(self.rows_loc.iter().map(|&l| l as i64));
        seq.extend(self.cols_loc.iter().map(|&l| l as i64));
        seq
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub row: Vec<i64>,
    pub col: Vec<i64>,
    pub row_loc: usize,
    pub col_loc: usize,
}

/// Returns the number of extension steps for the given dimension.
pub fn check_parameters(dim: usize, params: &Params) -> Result<usize> {
    let iterations = laplace_iterations(dim)?;
    let required = laplace_required_size(dim)?;
    let actual = params.len();
    if required != actual {
        return Err(Error::SizeMismatch { required, actual });
    }
    for (required, actual) in [
        (iterations, params.rows.len()),
        (iterations, params.cols.len()),
        (iterations, params.rows_loc.len()),
    ] {
        if required != actual {
            return Err(Error::SizeMismatch { required, actual });
        }
    }
    for (i, (r, c)) in params.rows.iter().zip(&params.cols).enumerate() {
        for v in [r, c] {
            if v.len() != i + 1 {
                return Err(Error::SizeMismatch {
                    required: i + 1,
                    actual: v.len(),
                });
            }
        }
    }
    Ok(iterations)
}

pub fn create(dim: usize, params: &Params, verbosity: Verbosity) -> Result<Rows> {
    let iterations = check_parameters(dim, params)?;
    let mut cat = vec![vec![Int::one()]];
    for i in 0..iterations {
        let (r, c) = (params.rows_loc[i], params.cols_loc[i]);
        cat = insert(&cat, &params.rows[i], &params.cols[i], r, c)?;
        if verbosity >= Verbosity::Debug {
            eprintln!(
                "Laplace step {i}: inserted at ({r}, {c}) pivot {} (max {} bits)",
                cat[r][c],
                matrixint::max_bits(&cat)
            );
        }
    }
    Ok(cat)
}

/// Extends a matrix of size n to size n+1.
pub fn extend(matrix: &[Vec<Int>], step: &Step) -> Result<Rows> {
    insert(matrix, &step.row, &step.col, step.row_loc, step.col_loc)
}

fn insert(
    matrix: &[Vec<Int>],
    row: &[i64],
    col: &[i64],
    row_loc: usize,
    col_loc: usize,
) -> Result<Rows> {
    let n = matrix.len();
    if n == 0 || !matrixint::is_square(matrix) {
        return Err(Error::InvalidMatrix);
    }
    for v in [row, col] {
        if v.len() != n {
            return Err(Error::SizeMismatch {
                required: n,
                actual: v.len(),
            });
        }
    }
    for loc in [row_loc, col_loc] {
        if loc > n {
            return Err(Error::InvalidPosition {
                position: loc as i64,
                bound: n,
            });
        }
    }
    // Layout:
    // [ D1     row[..r]  O1    ]
    // [ col[..c]   0   col[c..]]
    // [ O2     row[r..]  D2    ]
    let mut cat: Rows = Vec::with_capacity(n + 1);
    for i in 0..=n {
        if i == row_loc {
            let mut r: Vec<Int> = col[..col_loc].iter().map(|&x| Int::from(x)).collect();
            r.push(Int::zero());
            r.extend(col[col_loc..].iter().map(|&x| Int::from(x)));
            cat.push(r);
        } else {
            let src = if i < row_loc { i } else { i - 1 };
            let mut r = Vec::with_capacity(n + 1);
            r.extend_from_slice(&matrix[src][..col_loc]);
            r.push(Int::from(row[src]));
            r.extend_from_slice(&matrix[src][col_loc..]);
            cat.push(r);
        }
    }
    let s = matrixint::cofactor_sum(&cat, row_loc, col_loc)?;
    let x = Int::one() - s;
    cat[row_loc][col_loc] = if (row_loc + col_loc) % 2 == 0 { x } else { -x };
    Ok(cat)
}

/// Draws uniform values in [low, high) and uniform insertion positions.
pub fn random_params<R: Rng>(dim: usize, low: i64, high: i64, rng: &mut R) -> Result<Params> {
    laplace_iterations(dim)?;
    if low >= high {
        return Err(Error::InvalidRange { low, high });
    }
    let rows = (1..dim)
        .map(|i| (0..i).map(|_| rng.gen_range(low..high)).collect())
        .collect();
    let cols = (1..dim)
        .map(|i| (0..i).map(|_| rng.gen_range(low..high)).collect())
        .collect();
    let rows_loc = (1..dim).map(|i| rng.gen_range(0..=i)).collect();
    let cols_loc = (1..dim).map(|i| rng.gen_range(0..=i)).collect();
    Ok(Params {
        rows,
        cols,
        rows_loc,
        cols_loc,
    })
}

pub fn random(dim: usize, low: i64, high: i64) -> Result<Rows> {
    let params = random_params(dim, low, high, &mut rand::thread_rng())?;
    create(dim, &params, Verbosity::Silent)
}

/// Splits a flat sequence into (rows, cols, rows_loc, cols_loc).
///
/// Rows and columns are cut into vectors of lengths 1, 2, ..., dim-1.
pub fn split_sequence(dim: usize, data: &[i64]) -> Result<Params> {
    let iterations = laplace_iterations(dim)?;
    let required = laplace_required_size(dim)?;
    if data.len() != required {
        return Err(Error::SizeMismatch {
            required,
            actual: data.len(),
        });
    }
    let rows_size = laplace_rows_size(dim);
    let (rows, rest) = data.split_at(rows_size);
    let (cols, locs) = rest.split_at(rows_size);
    let (rows_loc, cols_loc) = locs.split_at(iterations);
    Ok(Params {
        rows: triangular(rows),
        cols: triangular(cols),
        rows_loc: positions(rows_loc)?,
        cols_loc: positions(cols_loc)?,
    })
}

// Cuts 1 + 2 + ... + k values into k vectors.
fn triangular(flat: &[i64]) -> Vec<Vec<i64>> {
    let mut vecs = vec![];
    let mut rest = flat;
    let mut len = 1;
    while !rest.is_empty() {
        let (v, r) = rest.split_at(len);
        vecs.push(v.to_vec());
        rest = r;
        len += 1;
    }
    vecs
}

// Position i must lie in [0, i+1].
fn positions(locs: &[i64]) -> Result<Vec<usize>> {
    locs.iter()
        .enumerate()
        .map(|(i, &l)| {
            if l < 0 || l as usize > i + 1 {
                Err(Error::InvalidPosition {
                    position: l,
                    bound: i + 1,
                })
            } else {
                Ok(l as usize)
            }
        })
        .collect()
}
