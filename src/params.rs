// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Parameter sizes of the extension algorithms and user preferences.
//!
//! The element counts below are the exact number of degrees of freedom
//! consumed by each algorithm for a given dimension. A caller that
//! serializes parameters into a flat stream (for example from a secret
//! key) must produce exactly that many values.

use std::str::FromStr;

use crate::error::{Error, Result};

/// Number of extension steps of the block algorithm.
///
/// Each step adds 2 dimensions to a seed of size 1 (odd dimension)
/// or 2 (even dimension).
pub fn block_iterations(dim: usize) -> Result<usize> {
    if dim <= 1 {
        return Err(Error::InvalidDimension(dim));
    }
    Ok((dim - 1) / 2)
}

/// Dimension of the seed matrix of the block algorithm.
pub fn block_seed_dim(dim: usize) -> usize {
    (dim + 1) % 2 + 1
}

/// Number of diagonal block values (2 per 2x2 block).
pub fn block_diag_size(dim: usize) -> usize {
    (dim / 2) * 2
}

/// Number of off-diagonal coupling values.
pub fn block_off_diag_size(dim: usize) -> usize {
    dim * dim / 2 - block_diag_size(dim)
}

/// Total number of values (including swap flags) consumed
/// by the block algorithm.
pub fn block_required_size(dim: usize) -> Result<usize> {
    let iterations = block_iterations(dim)?;
    Ok(iterations * 2 + dim * dim / 2)
}

/// Number of extension steps of the Laplace algorithm.
pub fn laplace_iterations(dim: usize) -> Result<usize> {
    if dim <= 1 {
        return Err(Error::InvalidDimension(dim));
    }
    Ok(dim - 1)
}

/// Number of values in all inserted columns (equivalently rows):
/// 1 + 2 + ... + (dim-1).
pub fn laplace_rows_size(dim: usize) -> usize {
    (dim - 1) * dim / 2
}

/// Total number of values consumed by the Laplace algorithm:
/// inserted rows and columns plus 2 insertion positions per step.
pub fn laplace_required_size(dim: usize) -> Result<usize> {
    let iterations = laplace_iterations(dim)?;
    Ok(iterations * dim + 2 * iterations)
}

/// Default ceiling on the number of points of a coordinate grid.
/// Each point uses `dim` 64-bit words, twice during period search.
pub const MAX_GRID_POINTS: usize = 1 << 24;

#[derive(Clone, Debug)]
pub struct Preferences {
    pub verbosity: Verbosity,
    pub threads: Option<usize>,
    /// Period computation refuses grids with more points.
    pub max_grid_points: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            verbosity: Verbosity::Silent,
            threads: None,
            max_grid_points: MAX_GRID_POINTS,
        }
    }
}

impl Preferences {
    pub fn verbose(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    /// Thread pool for data-parallel period search, if requested.
    pub fn thread_pool(&self) -> Option<rayon::ThreadPool> {
        match self.threads {
            None | Some(0) | Some(1) => None,
            Some(t) => {
                if self.verbose(Verbosity::Verbose) {
                    eprintln!("Using a pool of {t} threads");
                }
                match rayon::ThreadPoolBuilder::new().num_threads(t).build() {
                    Ok(pool) => Some(pool),
                    Err(e) => {
                        if self.verbose(Verbosity::Verbose) {
                            eprintln!("Cannot create thread pool ({e}), using a single thread");
                        }
                        None
                    }
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent,
    Info,
    Verbose,
    Debug,
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "silent" => Ok(Verbosity::Silent),
            "info" => Ok(Verbosity::Info),
            "verbose" => Ok(Verbosity::Verbose),
            "debug" => Ok(Verbosity::Debug),
            _ => Err(format!("invalid verbosity level {s:?}")),
        }
    }
}

#[test]
fn test_block_sizes() {
    // dim=2: a single 2x2 block, no extension step.
    assert_eq!(block_iterations(2), Ok(0));
    assert_eq!(block_required_size(2), Ok(2));
    assert_eq!(block_seed_dim(2), 2);
    // dim=3: seed [[1]] and one step of size 2.
    assert_eq!(block_seed_dim(3), 1);
    assert_eq!(block_required_size(3), Ok(2 + 4));
    assert_eq!(block_diag_size(3), 2);
    assert_eq!(block_off_diag_size(3), 2);
    for dim in 2..20 {
        let it = block_iterations(dim).unwrap();
        assert_eq!(block_seed_dim(dim) + 2 * it, dim);
        // Seed block (even) plus one block per step.
        let blocks = it + (block_seed_dim(dim) == 2) as usize;
        assert_eq!(block_diag_size(dim), 2 * blocks);
        // Each step of size n consumes 2n coupling values.
        let off: usize = (0..it).map(|i| 2 * (2 * i + block_seed_dim(dim))).sum();
        assert_eq!(block_off_diag_size(dim), off);
        assert_eq!(
            block_required_size(dim).unwrap(),
            block_diag_size(dim) + block_off_diag_size(dim) + 2 * it
        );
    }
    assert_eq!(block_iterations(1), Err(Error::InvalidDimension(1)));
    assert_eq!(block_required_size(0), Err(Error::InvalidDimension(0)));
}

#[test]
fn test_laplace_sizes() {
    assert_eq!(laplace_iterations(3), Ok(2));
    assert_eq!(laplace_required_size(3), Ok(10));
    assert_eq!(laplace_rows_size(3), 3);
    for dim in 2..20 {
        assert_eq!(
            laplace_required_size(dim).unwrap(),
            2 * laplace_rows_size(dim) + 2 * (dim - 1)
        );
    }
    assert_eq!(laplace_iterations(1), Err(Error::InvalidDimension(1)));
}

#[test]
fn test_verbosity() {
    assert_eq!(Verbosity::from_str("debug"), Ok(Verbosity::Debug));
    assert_eq!(
        Verbosity::from_str("loud"),
        Err("invalid verbosity level \"loud\"".to_string())
    );
    let mut prefs = Preferences::default();
    assert!(!prefs.verbose(Verbosity::Info));
    prefs.verbosity = Verbosity::Verbose;
    assert!(prefs.verbose(Verbosity::Info));
    assert!(!prefs.verbose(Verbosity::Debug));
    assert!(prefs.thread_pool().is_none());
}

#[test]
fn test_thread_pool() {
    let mut prefs = Preferences::default();
    for t in [0, 1] {
        prefs.threads = Some(t);
        assert!(prefs.thread_pool().is_none());
    }
    prefs.threads = Some(3);
    prefs.verbosity = Verbosity::Verbose;
    let pool = prefs.thread_pool().unwrap();
    assert_eq!(pool.current_num_threads(), 3);
}
