// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Dimension must be greater than 1 (got {0})")]
    InvalidDimension(usize),

    #[error("Input data does not match required size. Required size: {required}, Actual size: {actual}")]
    SizeMismatch { required: usize, actual: usize },

    #[error("Input matrix is not a cat matrix")]
    InvalidMatrix,

    #[error("Invalid algorithm {0:?}")]
    UnknownAlgorithm(String),

    #[error("Algorithm {algo} cannot use {params} parameters")]
    AlgorithmMismatch {
        algo: &'static str,
        params: &'static str,
    },

    #[error("Insertion position {position} is outside [0, {bound}]")]
    InvalidPosition { position: i64, bound: usize },

    #[error("Empty sampling range [{low}, {high})")]
    InvalidRange { low: i64, high: i64 },

    #[error("Modulus must be positive")]
    InvalidModulus,

    #[error("Coordinate buffer of length {len} is not a multiple of dimension {dim}")]
    InvalidCoordinates { len: usize, dim: usize },

    #[error("Coordinate grid {size}^{dim} exceeds limit of {limit} points")]
    GridTooLarge { dim: usize, size: u64, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
