// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Construction of n-dimensional cat matrices (square integer matrices
//! of determinant 1) and periods of the associated discrete cat maps.
//!
//! Two construction algorithms are available:
//! - `block` grows a matrix by 2 rows/columns per step using 2x2
//!   determinant-1 diagonal blocks and a zero off-diagonal corner
//! - `laplace` grows a matrix by 1 row/column per step, solving for
//!   the inserted pivot by cofactor expansion

pub mod block;
pub mod error;
pub mod laplace;
pub mod map;
pub mod matrix;
pub mod matrixint;
pub mod params;

use std::fmt;
use std::str::FromStr;

pub use error::{Error, Result};
pub use map::CatMap;
pub use matrix::CatMatrix;
pub use params::{Preferences, Verbosity};

use matrixint::Rows;

// Entries of extended matrices grow without bound: Laplace extension
// roughly doubles their bit length at each step.
pub type Int = num_bigint::BigInt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algo {
    Block,
    Laplace,
}

impl FromStr for Algo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "block" => Ok(Algo::Block),
            "laplace" => Ok(Algo::Laplace),
            _ => Err(Error::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Construction parameters for a full matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Params {
    Block(block::Params),
    Laplace(laplace::Params),
}

impl Params {
    pub fn algo(&self) -> Algo {
        match self {
            Params::Block(_) => Algo::Block,
            Params::Laplace(_) => Algo::Laplace,
        }
    }

    /// Flat sequence such that split_sequence gives back the parameters.
    pub fn to_sequence(&self) -> Vec<i64> {
        match self {
            Params::Block(p) => p.to_sequence(),
            Params::Laplace(p) => p.to_sequence(),
        }
    }
}

/// Parameters of a single extension step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Block(block::Step),
    Laplace(laplace::Step),
}

impl Step {
    pub fn algo(&self) -> Algo {
        match self {
            Step::Block(_) => Algo::Block,
            Step::Laplace(_) => Algo::Laplace,
        }
    }
}

impl Algo {
    pub fn name(&self) -> &'static str {
        match self {
            Algo::Block => "block",
            Algo::Laplace => "laplace",
        }
    }

    fn mismatch(&self, other: Algo) -> Error {
        Error::AlgorithmMismatch {
            algo: self.name(),
            params: other.name(),
        }
    }

    /// Number of extension steps needed to reach dim.
    pub fn iterations(&self, dim: usize) -> Result<usize> {
        match self {
            Algo::Block => params::block_iterations(dim),
            Algo::Laplace => params::laplace_iterations(dim),
        }
    }

    /// Length of the flat parameter sequence for dim.
    pub fn required_size(&self, dim: usize) -> Result<usize> {
        match self {
            Algo::Block => params::block_required_size(dim),
            Algo::Laplace => params::laplace_required_size(dim),
        }
    }

    pub fn check_parameters(&self, dim: usize, params: &Params) -> Result<usize> {
        match (self, params) {
            (Algo::Block, Params::Block(p)) => block::check_parameters(dim, p),
            (Algo::Laplace, Params::Laplace(p)) => laplace::check_parameters(dim, p),
            _ => Err(self.mismatch(params.algo())),
        }
    }

    pub fn create(&self, dim: usize, params: &Params, prefs: &Preferences) -> Result<Rows> {
        if prefs.verbose(Verbosity::Verbose) {
            eprintln!(
                "Creating {dim}x{dim} cat matrix using {self} algorithm ({} parameters)",
                params.to_sequence().len()
            );
        }
        let m = match (self, params) {
            (Algo::Block, Params::Block(p)) => block::create(dim, p, prefs.verbosity)?,
            (Algo::Laplace, Params::Laplace(p)) => laplace::create(dim, p, prefs.verbosity)?,
            _ => return Err(self.mismatch(params.algo())),
        };
        if prefs.verbose(Verbosity::Verbose) {
            eprintln!("Largest entry has {} bits", matrixint::max_bits(&m));
        }
        Ok(m)
    }

    pub fn extend(&self, matrix: &[Vec<Int>], step: &Step) -> Result<Rows> {
        match (self, step) {
            (Algo::Block, Step::Block(s)) => block::extend(matrix, s),
            (Algo::Laplace, Step::Laplace(s)) => laplace::extend(matrix, s),
            _ => Err(self.mismatch(step.algo())),
        }
    }

    pub fn random_params<R: rand::Rng>(
        &self,
        dim: usize,
        low: i64,
        high: i64,
        rng: &mut R,
    ) -> Result<Params> {
        Ok(match self {
            Algo::Block => Params::Block(block::random_params(dim, low, high, rng)?),
            Algo::Laplace => Params::Laplace(laplace::random_params(dim, low, high, rng)?),
        })
    }

    pub fn split_sequence(&self, dim: usize, data: &[i64]) -> Result<Params> {
        Ok(match self {
            Algo::Block => Params::Block(block::split_sequence(dim, data)?),
            Algo::Laplace => Params::Laplace(laplace::split_sequence(dim, data)?),
        })
    }
}

/// Builds a dim x dim cat matrix with the named algorithm.
pub fn create(dim: usize, algo: &str, params: &Params, prefs: &Preferences) -> Result<Rows> {
    Algo::from_str(algo)?.create(dim, params, prefs)
}

/// Grows a matrix by one step of the named algorithm.
pub fn extend(algo: &str, matrix: &[Vec<Int>], step: &Step) -> Result<Rows> {
    Algo::from_str(algo)?.extend(matrix, step)
}

pub fn split_sequence(dim: usize, algo: &str, data: &[i64]) -> Result<Params> {
    Algo::from_str(algo)?.split_sequence(dim, data)
}

/// A random cat matrix with parameters drawn uniformly from [low, high).
pub fn random(dim: usize, algo: &str, low: i64, high: i64) -> Result<Rows> {
    let algo = Algo::from_str(algo)?;
    let params = algo.random_params(dim, low, high, &mut rand::thread_rng())?;
    algo.create(dim, &params, &Preferences::default())
}
