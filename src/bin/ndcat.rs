// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::str::FromStr;
use std::time::Instant;

use ndcat::{Algo, CatMap, CatMatrix, Preferences, Verbosity};

fn main() {
    let arg = arguments::parse(std::env::args()).unwrap();
    if arg.get::<bool>("help").is_some() || arg.orphans.len() != 1 {
        eprintln!("Usage: ndcat [OPTIONS] DIM");
        eprintln!("");
        eprintln!("Options:");
        eprintln!("  --help                    show this help");
        eprintln!("  --verbose silent|info|verbose|debug");
        eprintln!("  --algo block|laplace:     construction algorithm (default block)");
        eprintln!("  --low L --high H:         random parameter range [L, H) (default [0, 256))");
        eprintln!("  --sequence a,b,...:       build from a flat parameter sequence");
        eprintln!("  --period N:               compute the period modulo N");
        eprintln!("  --map x,y,...:            map a point modulo N (requires --period)");
        eprintln!("  --threads N:              enable up to N computation threads");
        return;
    }
    let algo = arg.get::<String>("algo").unwrap_or("block".into());
    let low = arg.get::<i64>("low").unwrap_or(0);
    let high = arg.get::<i64>("high").unwrap_or(256);
    let seq = arg.get::<String>("sequence");
    let size = arg.get::<u64>("period");
    let point = arg.get::<String>("map");
    let v = arg.get::<String>("verbose").unwrap_or("info".into());
    let dim = usize::from_str(&arg.orphans[0]).expect("could not read dimension");

    let mut prefs = Preferences::default();
    prefs.threads = arg.get::<usize>("threads");
    prefs.verbosity = Verbosity::from_str(&v).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(2)
    });

    let algo = Algo::from_str(&algo).unwrap_or_else(|e| exit(e));
    let start = Instant::now();
    let rows = match seq {
        Some(s) => {
            let data = parse_list::<i64>(&s);
            algo.split_sequence(dim, &data)
                .and_then(|p| algo.create(dim, &p, &prefs))
        }
        None => algo
            .random_params(dim, low, high, &mut rand::thread_rng())
            .and_then(|p| algo.create(dim, &p, &prefs)),
    };
    let matrix = rows.and_then(CatMatrix::new).unwrap_or_else(|e| exit(e));
    if prefs.verbose(Verbosity::Info) {
        eprintln!(
            "Created {dim}x{dim} cat matrix in {:.3}s",
            start.elapsed().as_secs_f64()
        );
    }
    println!("{matrix}");

    let Some(size) = size else { return };
    let mut map = CatMap::with_preferences(matrix, prefs);
    let p = map.period(size).unwrap_or_else(|e| exit(e));
    println!("period modulo {size} = {p}");
    if let Some(point) = point {
        let coords = parse_list::<u64>(&point);
        let image = map.mapping(&coords, size).unwrap_or_else(|e| exit(e));
        println!("{coords:?} -> {image:?}");
    }
}

fn parse_list<T: FromStr>(s: &str) -> Vec<T> {
    s.split(',')
        .map(|x| {
            T::from_str(x.trim()).unwrap_or_else(|_| {
                eprintln!("invalid list element {x:?}");
                std::process::exit(2)
            })
        })
        .collect()
}

fn exit(e: ndcat::Error) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1)
}
