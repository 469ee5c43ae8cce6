// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Construction of cat matrices by block matrix combination.
//!
//! Each step combines the current cat matrix A (size n) with a fresh
//! 2x2 cat matrix B as the diagonal blocks of a matrix of size n+2.
//! One off-diagonal block is filled with arbitrary parameters and the
//! other one is zero, so the result is block triangular with
//! determinant det(A) det(B) = 1.
//!
//! Swap flags select which of A and B is the top-left block and which
//! off-diagonal block carries the parameters.
//!
//! Reference:
//! Zhongyun Hua et al., Designing Hyperchaotic Cat Maps With Any Desired
//! Number of Positive Lyapunov Exponents
//! (IEEE Transactions on Cybernetics 48.2, 2018)

use rand::Rng;

use crate::error::{Error, Result};
use crate::matrixint::{self, Rows};
use crate::params::{
    block_diag_size, block_iterations, block_off_diag_size, block_required_size, block_seed_dim,
};
use num_traits::{One, Zero};

use crate::{Int, Verbosity};

/// Parameters of a full construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    /// Pairs (p, q) of diagonal blocks, seed block first (even dimensions).
    pub diag: Vec<i64>,
    /// Coupling values, 2n for a step extending a matrix of size n.
    pub off_diag: Vec<i64>,
    pub swap_diag: Vec<bool>,
    pub swap_off_diag: Vec<bool>,
}

impl Params {
    pub fn len(&self) -> usize {
        self.diag.len() + self.off_diag.len() + self.swap_diag.len() + self.swap_off_diag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat representation, in the order expected by split_sequence.
    pub fn to_sequence(&self) -> Vec<i64> {
        let mut seq = Vec::with_capacity(self.len());
        seq.extend_from_slice(&self.diag);
        seq.extend_from_slice(&self.off_diag);
        seq.extend(self.swap_diag.iter().map(|&b| b as i64));
        seq.extend(self.swap_off_diag.iter().map(|&b| b as i64));
        seq
    }
}

/// Parameters of a single extension step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub diag: [i64; 2],
    pub off_diag: Vec<i64>,
    pub swap_diag: bool,
    pub swap_off_diag: bool,
}

/// Returns the number of extension steps for the given dimension.
pub fn check_parameters(dim: usize, params: &Params) -> Result<usize> {
    let iterations = block_iterations(dim)?;
    let required = block_required_size(dim)?;
    let actual = params.len();
    if required != actual {
        return Err(Error::SizeMismatch { required, actual });
    }
    // Also check how values are distributed.
    for (required, actual) in [
        (block_diag_size(dim), params.diag.len()),
        (iterations, params.swap_diag.len()),
        (iterations, params.swap_off_diag.len()),
    ] {
        if required != actual {
            return Err(Error::SizeMismatch { required, actual });
        }
    }
    Ok(iterations)
}

/// The 2x2 cat matrix [[pq+1, p], [q, 1]].
///
/// If p or q is zero, it would be triangular with ones on the diagonal,
/// so a fixed non-trivial matrix is used instead.
pub fn diagonal_block(p: i64, q: i64) -> Rows {
    if p == 0 || q == 0 {
        return matrixint::from_i64(&[[1_i64, 1], [1, 2]]);
    }
    let (p, q) = (Int::from(p), Int::from(q));
    vec![vec![&p * &q + 1, p], vec![q, Int::one()]]
}

pub fn create(dim: usize, params: &Params, verbosity: Verbosity) -> Result<Rows> {
    let iterations = check_parameters(dim, params)?;
    let seed = block_seed_dim(dim);
    let (mut cat, mut diag) = if seed == 1 {
        (vec![vec![Int::one()]], &params.diag[..])
    } else {
        let d = &params.diag;
        (diagonal_block(d[0], d[1]), &d[2..])
    };
    let mut off_diag = &params.off_diag[..];
    for i in 0..iterations {
        let size = 2 * i + seed;
        let (off, rest) = off_diag.split_at(2 * size);
        cat = combine(
            &cat,
            [diag[0], diag[1]],
            off,
            params.swap_diag[i],
            params.swap_off_diag[i],
        )?;
        if verbosity >= Verbosity::Debug {
            eprintln!(
                "Block step {i}: size {size} => {} (max {} bits)",
                cat.len(),
                matrixint::max_bits(&cat)
            );
        }
        diag = &diag[2..];
        off_diag = rest;
    }
    debug_assert!(diag.is_empty() && off_diag.is_empty());
    Ok(cat)
}

/// Extends a matrix of size n to size n+2.
pub fn extend(matrix: &[Vec<Int>], step: &Step) -> Result<Rows> {
    combine(
        matrix,
        step.diag,
        &step.off_diag,
        step.swap_diag,
        step.swap_off_diag,
    )
}

fn combine(
    matrix: &[Vec<Int>],
    diag: [i64; 2],
    off_diag: &[i64],
    swap_diag: bool,
    swap_off_diag: bool,
) -> Result<Rows> {
    let n = matrix.len();
    if n == 0 || !matrixint::is_square(matrix) {
        return Err(Error::InvalidMatrix);
    }
    if off_diag.len() != 2 * n {
        return Err(Error::SizeMismatch {
            required: 2 * n,
            actual: off_diag.len(),
        });
    }
    let block = diagonal_block(diag[0], diag[1]);
    let (top_left, bottom_right) = if swap_diag {
        (matrix.to_vec(), block)
    } else {
        (block, matrix.to_vec())
    };
    let coupling: Vec<Int> = off_diag.iter().map(|&x| Int::from(x)).collect();
    let zeros = vec![Int::zero(); 2 * n];
    let (upper, lower) = if swap_off_diag {
        (zeros, coupling)
    } else {
        (coupling, zeros)
    };
    // upper is k x m and lower is m x k (row-major)
    let (k, m) = (top_left.len(), bottom_right.len());
    let mut cat = Vec::with_capacity(n + 2);
    for (i, mut row) in top_left.into_iter().enumerate() {
        row.extend_from_slice(&upper[i * m..(i + 1) * m]);
        cat.push(row);
    }
    for (i, row) in bottom_right.into_iter().enumerate() {
        let mut r = lower[i * k..(i + 1) * k].to_vec();
        r.extend(row);
        cat.push(r);
    }
    Ok(cat)
}

/// Draws uniform parameters in [low, high) and random swap flags.
pub fn random_params<R: Rng>(
    dim: usize,
    low: i64,
    high: i64,
    rng: &mut R,
) -> Result<Params> {
    let iterations = block_iterations(dim)?;
    if low >= high {
        return Err(Error::InvalidRange { low, high });
    }
    let mut draw = |n: usize| -> Vec<i64> { (0..n).map(|_| rng.gen_range(low..high)).collect() };
    let diag = draw(block_diag_size(dim));
    let off_diag = draw(block_off_diag_size(dim));
    let swap_diag = (0..iterations).map(|_| rng.gen::<bool>()).collect();
    let swap_off_diag = (0..iterations).map(|_| rng.gen::<bool>()).collect();
    Ok(Params {
        diag,
        off_diag,
        swap_diag,
        swap_off_diag,
    })
}

pub fn random(dim: usize, low: i64, high: i64) -> Result<Rows> {
    let params = random_params(dim, low, high, &mut rand::thread_rng())?;
    create(dim, &params, Verbosity::Silent)
}

/// Splits a flat sequence into (diag, off_diag, swap_diag, swap_off_diag).
/// Swap flags are nonzero values.
pub fn split_sequence(dim: usize, data: &[i64]) -> Result<Params> {
    let iterations = block_iterations(dim)?;
    let required = block_required_size(dim)?;
    if data.len() != required {
        return Err(Error::SizeMismatch {
            required,
            actual: data.len(),
        });
    }
    let (diag, rest) = data.split_at(block_diag_size(dim));
    let (off_diag, swaps) = rest.split_at(block_off_diag_size(dim));
    let (swap_diag, swap_off_diag) = swaps.split_at(iterations);
    Ok(Params {
        diag: diag.to_vec(),
        off_diag: off_diag.to_vec(),
        swap_diag: swap_diag.iter().map(|&x| x != 0).collect(),
        swap_off_diag: swap_off_diag.iter().map(|&x| x != 0).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrixint::{from_i64, is_cat};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_check_parameters() {
        let p = Params {
            diag: vec![3, 5],
            ..Params::default()
        };
        assert_eq!(check_parameters(2, &p), Ok(0));
        assert!(!p.is_empty() && Params::default().is_empty());
        let p = Params {
            diag: vec![3, 5, 7],
            ..Params::default()
        };
        let err = check_parameters(2, &p).unwrap_err();
        assert_eq!(
            err,
            Error::SizeMismatch {
                required: 2,
                actual: 3
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("Required size: 2") && msg.contains("Actual size: 3"));
        assert_eq!(check_parameters(1, &p), Err(Error::InvalidDimension(1)));
        // Right total but diagonal values moved to the coupling part.
        let p = Params {
            diag: vec![],
            off_diag: vec![1, 2, 3, 4],
            swap_diag: vec![false],
            swap_off_diag: vec![true],
        };
        assert!(matches!(
            check_parameters(3, &p),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_diagonal_block() {
        assert_eq!(diagonal_block(0, 7), from_i64(&[[1_i64, 1], [1, 2]]));
        assert_eq!(diagonal_block(2, 3), from_i64(&[[7_i64, 2], [3, 1]]));
        assert_eq!(diagonal_block(-2, 3), from_i64(&[[-5_i64, -2], [3, 1]]));
        for p in -5..5 {
            for q in -5..5 {
                assert!(is_cat(&diagonal_block(p, q)));
            }
        }
        // No overflow for extreme values.
        assert!(is_cat(&diagonal_block(i64::MAX, i64::MIN)));
    }

    #[test]
    fn test_create_small() {
        let p = Params {
            diag: vec![1, 2],
            off_diag: vec![3, 4],
            swap_diag: vec![false],
            swap_off_diag: vec![false],
        };
        let m = create(3, &p, Verbosity::Silent).unwrap();
        assert_eq!(m, from_i64(&[[3_i64, 1, 3], [2, 1, 4], [0, 0, 1]]));

        let p = Params {
            swap_diag: vec![true],
            ..p
        };
        let m = create(3, &p, Verbosity::Silent).unwrap();
        assert_eq!(m, from_i64(&[[1_i64, 3, 4], [0, 3, 1], [0, 2, 1]]));

        let p = Params {
            swap_off_diag: vec![true],
            ..p
        };
        let m = create(3, &p, Verbosity::Silent).unwrap();
        assert_eq!(m, from_i64(&[[1_i64, 0, 0], [3, 3, 1], [4, 2, 1]]));

        // Even dimension starts with a 2x2 block.
        let p = Params {
            diag: vec![2, 3],
            ..Params::default()
        };
        let m = create(2, &p, Verbosity::Silent).unwrap();
        assert_eq!(m, from_i64(&[[7_i64, 2], [3, 1]]));
    }

    #[test]
    fn test_create_random() {
        let mut rng = StdRng::seed_from_u64(0x1337);
        for dim in 2..=12 {
            for _ in 0..5 {
                let p = random_params(dim, -50, 256, &mut rng).unwrap();
                let m = create(dim, &p, Verbosity::Silent).unwrap();
                assert_eq!(m.len(), dim);
                assert!(is_cat(&m), "dim={dim} params={p:?}");
            }
        }
    }

    #[test]
    fn test_swap_flags() {
        // dim=7 has 3 steps: try all 64 flag combinations.
        let mut rng = StdRng::seed_from_u64(42);
        let base = random_params(7, 0, 100, &mut rng).unwrap();
        for mask in 0..64_u32 {
            let p = Params {
                swap_diag: (0..3).map(|i| mask >> i & 1 == 1).collect(),
                swap_off_diag: (0..3).map(|i| mask >> (3 + i) & 1 == 1).collect(),
                ..base.clone()
            };
            let m = create(7, &p, Verbosity::Silent).unwrap();
            assert!(is_cat(&m), "mask={mask}");
        }
    }

    #[test]
    fn test_extend() {
        let m = from_i64(&[[1_i64, 1], [1, 2]]);
        let step = Step {
            diag: [1, 1],
            off_diag: vec![1, 2, 3, 4],
            swap_diag: true,
            swap_off_diag: false,
        };
        let e = extend(&m, &step).unwrap();
        assert_eq!(
            e,
            from_i64(&[[1_i64, 1, 1, 2], [1, 2, 3, 4], [0, 0, 2, 1], [0, 0, 1, 1]])
        );
        assert!(is_cat(&e));
        let bad = Step {
            off_diag: vec![1, 2, 3],
            ..step
        };
        assert_eq!(
            extend(&m, &bad),
            Err(Error::SizeMismatch {
                required: 4,
                actual: 3
            })
        );
        assert_eq!(
            extend(&from_i64(&[[1_i64, 2]]), &bad),
            Err(Error::InvalidMatrix)
        );
    }

    #[test]
    fn test_split_sequence() {
        let mut rng = StdRng::seed_from_u64(7);
        for dim in 2..10 {
            let p = random_params(dim, 0, 256, &mut rng).unwrap();
            let seq = p.to_sequence();
            assert_eq!(seq.len(), block_required_size(dim).unwrap());
            assert_eq!(split_sequence(dim, &seq), Ok(p));
        }
        // dim=2 has no swap flags at all.
        let p = split_sequence(2, &[4, 5]).unwrap();
        assert_eq!(p.diag, vec![4, 5]);
        assert!(p.swap_diag.is_empty() && p.swap_off_diag.is_empty());
        assert!(matches!(
            split_sequence(3, &[1, 2, 3]),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_random_range() {
        assert_eq!(
            random(4, 5, 5),
            Err(Error::InvalidRange { low: 5, high: 5 })
        );
        assert!(is_cat(&random(5, 0, 256).unwrap()));
    }
}
