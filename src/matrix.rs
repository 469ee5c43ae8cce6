// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Validated cat matrices.
//!
//! A cat matrix is a square integer matrix with determinant 1.
//! The wrapper can only hold matrices satisfying this condition:
//! every constructor and mutation checks it and leaves the previous
//! value untouched on failure.

use std::fmt;

use crate::error::{Error, Result};
use crate::matrixint::{self, Rows};
use crate::{Int, Params, Preferences, Step};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CatMatrix {
    rows: Rows,
}

impl CatMatrix {
    pub fn new(rows: Rows) -> Result<Self> {
        if Self::is_cat(&rows) {
            Ok(CatMatrix { rows })
        } else {
            Err(Error::InvalidMatrix)
        }
    }

    pub fn from_i64<R: AsRef<[i64]>>(rows: &[R]) -> Result<Self> {
        Self::new(matrixint::from_i64(rows))
    }

    pub fn is_cat(rows: &[Vec<Int>]) -> bool {
        matrixint::is_cat(rows)
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Int>] {
        &self.rows
    }

    pub fn get(&self, i: usize, j: usize) -> &Int {
        &self.rows[i][j]
    }

    pub fn into_rows(self) -> Rows {
        self.rows
    }

    /// Replaces the matrix, which must be a cat matrix.
    pub fn set_matrix(&mut self, rows: Rows) -> Result<()> {
        if !Self::is_cat(&rows) {
            return Err(Error::InvalidMatrix);
        }
        self.rows = rows;
        Ok(())
    }

    pub fn create(dim: usize, algo: &str, params: &Params) -> Result<Self> {
        Self::new(crate::create(dim, algo, params, &Preferences::default())?)
    }

    /// A random cat matrix with parameters drawn from [low, high).
    pub fn random(dim: usize, algo: &str, low: i64, high: i64) -> Result<Self> {
        Self::new(crate::random(dim, algo, low, high)?)
    }

    /// Grows the matrix in place using the selected algorithm.
    pub fn extend(&mut self, algo: &str, step: &Step) -> Result<()> {
        let rows = crate::extend(algo, &self.rows, step)?;
        self.set_matrix(rows)
    }
}

impl fmt::Display for CatMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same layout as numpy: right-aligned columns of equal width.
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|x| x.to_string()).collect())
            .collect();
        let width = cells.iter().flatten().map(|s| s.len()).max().unwrap_or(0);
        for (i, row) in cells.iter().enumerate() {
            write!(f, "{}", if i == 0 { "[[" } else { " [" })?;
            for (j, s) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{s:>width$}")?;
            }
            write!(f, "]")?;
            if i + 1 < cells.len() {
                writeln!(f)?;
            }
        }
        write!(f, "]")
    }
}
