// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Discrete cat maps on the torus (Z/size)^dim.
//!
//! A cat matrix acts bijectively on the finite grid [0, size)^dim since it
//! is invertible modulo any size. The period of the map is the smallest
//! k such that A^k fixes every point of the grid.
//!
//! # Cost
//!
//! The period search enumerates the whole grid: both time and memory
//! are O(size^dim * dim) and the number of points is bounded by
//! Preferences::max_grid_points. For example dim=3, size=256 already
//! uses 16M points (384MB with the image buffer).
//!
//! The single-threaded search iterates the map on the whole grid
//! until it is equal to the original grid. The multi-threaded search
//! computes the orbit length of each point independently: the period
//! is their least common multiple.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use num_integer::Integer;
use num_traits::ToPrimitive;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::matrix::CatMatrix;
use crate::matrixint::Rows;
use crate::params::MAX_GRID_POINTS;
use crate::{Int, Preferences, Step, Verbosity};

/// Number of points of [0, size)^dim, if it fits in usize.
pub fn grid_points(dim: usize, size: u64) -> Option<usize> {
    let size = usize::try_from(size).ok()?;
    size.checked_pow(u32::try_from(dim).ok()?)
}

/// All points of [0, size)^dim, each point stored as dim consecutive
/// coordinates, in lexicographic order.
///
/// Grids with more than MAX_GRID_POINTS points are refused.
pub fn cube_coord(dim: usize, size: u64) -> Result<Vec<u64>> {
    cube_coord_limit(dim, size, MAX_GRID_POINTS)
}

/// Same as cube_coord with an explicit ceiling on the number of points.
pub fn cube_coord_limit(dim: usize, size: u64, limit: usize) -> Result<Vec<u64>> {
    if size == 0 {
        return Err(Error::InvalidModulus);
    }
    let too_large = Error::GridTooLarge { dim, size, limit };
    let npoints = match grid_points(dim, size) {
        Some(n) if n <= limit => n,
        _ => return Err(too_large),
    };
    let len = npoints.checked_mul(dim).ok_or_else(|| too_large.clone())?;
    let mut coords = Vec::new();
    coords.try_reserve_exact(len).map_err(|_| too_large)?;
    let mut point = vec![0u64; dim];
    for _ in 0..npoints {
        coords.extend_from_slice(&point);
        // Increment, last coordinate first.
        for x in point.iter_mut().rev() {
            *x += 1;
            if *x < size {
                break;
            }
            *x = 0;
        }
    }
    Ok(coords)
}

/// A cat matrix reduced modulo size.
pub struct ModMatrix {
    dim: usize,
    size: u64,
    // Row-major, values in [0, size)
    entries: Vec<u64>,
}

impl ModMatrix {
    pub fn new(matrix: &CatMatrix, size: u64) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidModulus);
        }
        let m = Int::from(size);
        // mod_floor is in [0, size) so it always fits.
        let entries = matrix
            .rows()
            .iter()
            .flatten()
            .map(|x| x.mod_floor(&m).to_u64().unwrap_or_default())
            .collect();
        Ok(ModMatrix {
            dim: matrix.dim(),
            size,
            entries,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    fn apply_point(&self, x: &[u64], y: &mut [u64]) {
        let n = self.size as u128;
        for (i, yi) in y.iter_mut().enumerate() {
            let row = &self.entries[i * self.dim..(i + 1) * self.dim];
            let mut acc: u128 = 0;
            for (&a, &xj) in row.iter().zip(x) {
                acc = (acc + a as u128 * (xj % self.size) as u128) % n;
            }
            *yi = acc as u64;
        }
    }

    /// Maps every point of src into dst.
    /// Both buffers have the same length, a multiple of dim.
    pub fn apply_into(&self, src: &[u64], dst: &mut [u64]) {
        debug_assert_eq!(src.len(), dst.len());
        for (x, y) in src.chunks_exact(self.dim).zip(dst.chunks_exact_mut(self.dim)) {
            self.apply_point(x, y);
        }
    }

    /// Maps every point of data, overwriting it.
    pub fn apply_in_place(&self, data: &mut [u64]) {
        let mut tmp = vec![0; self.dim];
        for x in data.chunks_exact_mut(self.dim) {
            self.apply_point(x, &mut tmp);
            x.copy_from_slice(&tmp);
        }
    }

    /// Number of iterations for a reduced point to return to itself.
    pub fn orbit_length(&self, point: &[u64]) -> u64 {
        let mut cur = point.to_vec();
        let mut next = vec![0; self.dim];
        let mut k = 1;
        loop {
            self.apply_point(&cur, &mut next);
            if next == point {
                return k;
            }
            std::mem::swap(&mut cur, &mut next);
            k += 1;
        }
    }
}

/// Computes the period of the cat map modulo size (without memoization).
///
/// The grid size is checked against prefs.max_grid_points before
/// any allocation.
pub fn period(
    matrix: &CatMatrix,
    size: u64,
    prefs: &Preferences,
    tpool: Option<&rayon::ThreadPool>,
) -> Result<u64> {
    let start = Instant::now();
    let m = ModMatrix::new(matrix, size)?;
    let dim = matrix.dim();
    let npoints = match grid_points(dim, size) {
        Some(n) if n <= prefs.max_grid_points => n,
        _ => {
            return Err(Error::GridTooLarge {
                dim,
                size,
                limit: prefs.max_grid_points,
            })
        }
    };
    if prefs.verbose(Verbosity::Verbose) {
        let mb = (2 * npoints * dim * 8) as f64 / 1e6;
        eprintln!("Coordinate grid {size}^{dim} has {npoints} points ({mb:.1}MB)");
    }
    let grid = cube_coord_limit(dim, size, prefs.max_grid_points)?;
    let p = match tpool {
        Some(pool) => pool.install(|| {
            grid.par_chunks(dim)
                .map(|pt| m.orbit_length(pt))
                .reduce(|| 1, |a, b| a.lcm(&b))
        }),
        None => period_grid(&m, &grid),
    };
    if prefs.verbose(Verbosity::Info) {
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        eprintln!("Period modulo {size} is {p} ({ms:.1}ms)");
    }
    Ok(p)
}

// Iterates on the whole grid until every point is back in place.
fn period_grid(m: &ModMatrix, grid: &[u64]) -> u64 {
    let mut image = vec![0; grid.len()];
    m.apply_into(grid, &mut image);
    let mut period = 1;
    while image != grid {
        m.apply_in_place(&mut image);
        period += 1;
    }
    period
}

/// A cat matrix acting on coordinates, with memoized periods.
///
/// The period cache is only valid for the current matrix: it is
/// cleared whenever the matrix is replaced.
#[derive(Clone, Debug)]
pub struct CatMap {
    matrix: CatMatrix,
    prefs: Preferences,
    periods: HashMap<u64, u64>,
}

impl CatMap {
    pub fn new(matrix: CatMatrix) -> Self {
        Self::with_preferences(matrix, Preferences::default())
    }

    pub fn with_preferences(matrix: CatMatrix, prefs: Preferences) -> Self {
        CatMap {
            matrix,
            prefs,
            periods: HashMap::new(),
        }
    }

    pub fn from_rows(rows: Rows) -> Result<Self> {
        Ok(Self::new(CatMatrix::new(rows)?))
    }

    pub fn random(dim: usize, algo: &str, low: i64, high: i64) -> Result<Self> {
        Ok(Self::new(CatMatrix::random(dim, algo, low, high)?))
    }

    pub fn matrix(&self) -> &CatMatrix {
        &self.matrix
    }

    pub fn dim(&self) -> usize {
        self.matrix.dim()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn set_matrix(&mut self, rows: Rows) -> Result<()> {
        self.matrix.set_matrix(rows)?;
        self.periods.clear();
        Ok(())
    }

    pub fn extend(&mut self, algo: &str, step: &Step) -> Result<()> {
        self.matrix.extend(algo, step)?;
        self.periods.clear();
        Ok(())
    }

    /// Period of the map modulo size. Results are cached per modulus.
    pub fn period(&mut self, size: u64) -> Result<u64> {
        if let Some(&p) = self.periods.get(&size) {
            return Ok(p);
        }
        let tpool = self.prefs.thread_pool();
        let p = period(&self.matrix, size, &self.prefs, tpool.as_ref())?;
        self.periods.insert(size, p);
        Ok(p)
    }

    pub fn cached_period(&self, size: u64) -> Option<u64> {
        self.periods.get(&size).copied()
    }

    /// Maps points (dim consecutive coordinates each) modulo size.
    pub fn mapping(&self, coords: &[u64], size: u64) -> Result<Vec<u64>> {
        let mut out = vec![0; coords.len()];
        self.mapping_into(coords, size, &mut out)?;
        Ok(out)
    }

    /// Same as mapping, writing into a caller-owned buffer.
    pub fn mapping_into(&self, coords: &[u64], size: u64, out: &mut [u64]) -> Result<()> {
        self.check_coords(coords)?;
        if out.len() != coords.len() {
            return Err(Error::SizeMismatch {
                required: coords.len(),
                actual: out.len(),
            });
        }
        ModMatrix::new(&self.matrix, size)?.apply_into(coords, out);
        Ok(())
    }

    pub fn mapping_in_place(&self, data: &mut [u64], size: u64) -> Result<()> {
        self.check_coords(data)?;
        ModMatrix::new(&self.matrix, size)?.apply_in_place(data);
        Ok(())
    }

    fn check_coords(&self, coords: &[u64]) -> Result<()> {
        let dim = self.dim();
        if coords.len() % dim != 0 {
            return Err(Error::InvalidCoordinates {
                len: coords.len(),
                dim,
            });
        }
        Ok(())
    }
}

impl fmt::Display for CatMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.matrix, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block, laplace};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn arnold() -> CatMap {
        CatMap::new(CatMatrix::from_i64(&[[1_i64, 1], [1, 2]]).unwrap())
    }

    #[test]
    fn test_cube_coord() {
        let g = cube_coord(2, 3).unwrap();
        assert_eq!(g, vec![0, 0, 0, 1, 0, 2, 1, 0, 1, 1, 1, 2, 2, 0, 2, 1, 2, 2]);
        assert_eq!(cube_coord(3, 4).unwrap().len(), 64 * 3);
        assert_eq!(cube_coord(1, 1).unwrap(), vec![0]);
        assert_eq!(cube_coord(2, 0), Err(Error::InvalidModulus));
        // Huge grids are refused before allocating.
        assert_eq!(
            cube_coord(2, 1 << 31),
            Err(Error::GridTooLarge {
                dim: 2,
                size: 1 << 31,
                limit: MAX_GRID_POINTS
            })
        );
        assert!(matches!(
            cube_coord_limit(2, 1 << 31, usize::MAX),
            Err(Error::GridTooLarge { .. })
        ));
        assert!(matches!(
            cube_coord(64, u64::MAX),
            Err(Error::GridTooLarge { .. })
        ));
        assert_eq!(cube_coord_limit(2, 10, 100).unwrap().len(), 200);
        assert!(cube_coord_limit(2, 11, 100).is_err());
        assert_eq!(grid_points(3, 10), Some(1000));
        assert_eq!(grid_points(40, 1 << 20), None);
    }

    #[test]
    fn test_arnold_period() {
        let mut m = arnold();
        assert_eq!(m.period(5), Ok(10));
        // Orders of the square of the Fibonacci matrix.
        for (size, p) in [(1, 1), (2, 3), (3, 4), (4, 3), (7, 8), (10, 30)] {
            assert_eq!(m.period(size), Ok(p), "size={size}");
        }
    }

    #[test]
    fn test_mapping() {
        let m = arnold();
        assert_eq!(m.mapping(&[2, 3], 5), Ok(vec![0, 3]));
        // Several points at once, unreduced input.
        assert_eq!(m.mapping(&[2, 3, 7, 8, 0, 0], 5), Ok(vec![0, 3, 0, 3, 0, 0]));
        let mut out = vec![9; 4];
        m.mapping_into(&[1, 0, 0, 1], 5, &mut out).unwrap();
        assert_eq!(out, vec![1, 1, 1, 2]);
        m.mapping_in_place(&mut out, 5).unwrap();
        assert_eq!(out, vec![2, 3, 3, 0]);
        assert_eq!(
            m.mapping(&[1, 2, 3], 5),
            Err(Error::InvalidCoordinates { len: 3, dim: 2 })
        );
        assert_eq!(
            m.mapping_into(&[1, 2], 5, &mut [0; 4]),
            Err(Error::SizeMismatch {
                required: 2,
                actual: 4
            })
        );
        assert_eq!(m.mapping(&[1, 2], 0), Err(Error::InvalidModulus));
    }

    #[test]
    fn test_negative_entries() {
        let m = CatMap::new(CatMatrix::from_i64(&[[1_i64, 0], [-3, 1]]).unwrap());
        assert_eq!(m.mapping(&[1, 1], 5), Ok(vec![1, 3]));
        let mut m = m;
        // Shear of order 5 modulo 5.
        assert_eq!(m.period(5), Ok(5));
    }

    #[test]
    fn test_bijection() {
        let mut rng = StdRng::seed_from_u64(5);
        for (algo, dim) in [("block", 3), ("laplace", 3), ("block", 4)] {
            let params = match algo {
                "block" => crate::Params::Block(block::random_params(dim, 0, 256, &mut rng).unwrap()),
                _ => crate::Params::Laplace(laplace::random_params(dim, 0, 256, &mut rng).unwrap()),
            };
            let m = CatMap::new(CatMatrix::create(dim, algo, &params).unwrap());
            for size in [1, 2, 5, 6] {
                let grid = cube_coord(dim, size).unwrap();
                let image = m.mapping(&grid, size).unwrap();
                let mut points: Vec<&[u64]> = image.chunks(dim).collect();
                points.sort();
                points.dedup();
                assert_eq!(points.len(), grid.len() / dim);
                assert!(image.iter().all(|&x| x < size));
            }
        }
    }

    #[test]
    fn test_period_divides_group_order() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            let p = block::random_params(2, 0, 100, &mut rng).unwrap();
            let m = CatMatrix::create(2, "block", &crate::Params::Block(p)).unwrap();
            let mut map = CatMap::new(m);
            for q in [2u64, 3, 5, 7, 11] {
                // Order of SL(2, Z/q)
                let order = q * (q * q - 1);
                let per = map.period(q).unwrap();
                assert_eq!(order % per, 0, "period {per} modulo {q}");
            }
        }
    }

    #[test]
    fn test_parallel_period() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap();
        let prefs = Preferences::default();
        for algo in ["block", "laplace"] {
            for _ in 0..3 {
                let m = CatMatrix::random(3, algo, 0, 64).unwrap();
                for size in [4, 5, 6] {
                    let seq = period(&m, size, &prefs, None).unwrap();
                    let par = period(&m, size, &prefs, Some(&pool)).unwrap();
                    assert_eq!(seq, par, "matrix {m} modulo {size}");
                }
            }
        }
    }

    #[test]
    fn test_memoization() {
        let mut m = arnold();
        assert_eq!(m.cached_period(5), None);
        let p = m.period(5).unwrap();
        assert_eq!(m.cached_period(5), Some(p));
        assert_eq!(m.period(5), Ok(p));
        let fresh = period(m.matrix(), 5, &Preferences::default(), None).unwrap();
        assert_eq!(fresh, p);
        // Replacing the matrix invalidates the cache.
        m.set_matrix(crate::matrixint::from_i64(&[[1_i64, 0], [0, 1]]))
            .unwrap();
        assert_eq!(m.cached_period(5), None);
        assert_eq!(m.period(5), Ok(1));
        m.extend(
            "laplace",
            &Step::Laplace(laplace::Step {
                row: vec![1, 1],
                col: vec![1, 1],
                row_loc: 0,
                col_loc: 0,
            }),
        )
        .unwrap();
        assert_eq!(m.cached_period(5), None);
        assert_eq!(m.dim(), 3);
    }

    #[test]
    fn test_grid_limit() {
        let prefs = Preferences {
            max_grid_points: 100,
            ..Preferences::default()
        };
        let mut m = CatMap::with_preferences(
            CatMatrix::from_i64(&[[1_i64, 1, 0], [1, 2, 0], [0, 0, 1]]).unwrap(),
            prefs,
        );
        assert_eq!(m.period(4), Ok(3));
        assert_eq!(
            m.period(5),
            Err(Error::GridTooLarge {
                dim: 3,
                size: 5,
                limit: 100
            })
        );
        assert_eq!(m.cached_period(5), None);
        assert_eq!(m.period(0), Err(Error::InvalidModulus));
    }
}
