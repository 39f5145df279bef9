//! Readers and writers sharing one engine

use crate::common::*;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_reads_share_cache() {
    let env = TestEnv::new();
    let (ee, _) = simple_experiment(&env, 50, 4);
    env.engine.compute_processed_vectors(ee).unwrap();
    let genes: Vec<GeneId> = (1..=50).map(g).collect();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let engine = Arc::clone(&env.engine);
            let barrier = Arc::clone(&barrier);
            let genes = genes.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..20 {
                    let views = engine.get_processed_vectors(&[ee.into()], &genes).unwrap();
                    assert_eq!(views.len(), 50);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stats = env.engine.cache_stats();
    assert_eq!(stats.cached_entries, 50);
    assert!(stats.hits > stats.misses);
}

#[test]
fn recompute_many_experiments_while_reading() {
    let env = TestEnv::new();
    let experiments: Vec<ExperimentId> = (0..4).map(|_| simple_experiment(&env, 10, 3).0).collect();
    for &ee in &experiments {
        env.engine.compute_processed_vectors(ee).unwrap();
    }
    let sets: Vec<BioAssaySet> = experiments.iter().map(|&e| e.into()).collect();

    let barrier = Arc::new(Barrier::new(experiments.len() + 1));
    let mut handles = Vec::new();
    for &ee in &experiments {
        let engine = Arc::clone(&env.engine);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..5 {
                engine.compute_processed_vectors(ee).unwrap();
            }
        }));
    }
    let reader = {
        let engine = Arc::clone(&env.engine);
        let barrier = Arc::clone(&barrier);
        let sets = sets.clone();
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..50 {
                let views = engine.get_processed_vectors(&sets, &[g(3), g(7)]).unwrap();
                assert_eq!(views.len(), 8);
            }
        })
    };
    for h in handles {
        h.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(env.engine.metrics().generations_installed, 24);
    for &ee in &experiments {
        assert_eq!(env.store.processed_vector_count(ee), 10);
    }
}
