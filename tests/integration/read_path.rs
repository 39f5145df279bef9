//! Gene and probe reads across experiments and subsets

use crate::common::*;
use std::collections::BTreeSet;

#[test]
fn one_to_many_probe_gene_mapping() {
    let env = TestEnv::new();
    let (ee, _) = simple_experiment(&env, 4, 3);
    // probe 2 also measures gene 1; probe 4 measures nothing requested
    env.map(2, &[1, 2]);
    env.engine.compute_processed_vectors(ee).unwrap();

    let views = env.engine.get_processed_vectors(&[ee.into()], &[g(1), g(2)]).unwrap();
    let probes: Vec<DesignElementId> = views.iter().map(|v| v.design_element).collect();
    assert_eq!(probes, vec![p(1), p(2)]);
    let genes: BTreeSet<GeneId> = [g(1), g(2)].into_iter().collect();
    assert_eq!(views[1].genes, genes);

    // Gene 1 alone still returns probe 2
    let views = env.engine.get_processed_vectors(&[ee.into()], &[g(1)]).unwrap();
    assert_eq!(views.len(), 2);
}

#[test]
fn several_experiments_in_one_read() {
    let env = TestEnv::new();
    let (a, _) = simple_experiment(&env, 2, 3);
    let (b, _) = simple_experiment(&env, 2, 4);
    env.engine.compute_processed_vectors(a).unwrap();
    env.engine.compute_processed_vectors(b).unwrap();

    let views = env
        .engine
        .get_processed_vectors(&[a.into(), b.into(), a.into()], &[g(2)])
        .unwrap();
    assert_eq!(views.len(), 2);
    let lengths: BTreeSet<usize> = views.iter().map(|v| v.len()).collect();
    assert_eq!(lengths, [3, 4].into_iter().collect());
}

#[test]
fn experiment_without_processed_data_returns_nothing() {
    let env = TestEnv::new();
    let (ee, _) = simple_experiment(&env, 2, 3);
    assert!(env
        .engine
        .get_processed_vectors(&[ee.into()], &[g(1)])
        .unwrap()
        .is_empty());
}

#[test]
fn unknown_gene_cached_as_empty() {
    let env = TestEnv::new();
    let (ee, _) = simple_experiment(&env, 2, 3);
    env.engine.compute_processed_vectors(ee).unwrap();
    let sets = [BioAssaySet::from(ee)];

    assert!(env.engine.get_processed_vectors(&sets, &[g(404)]).unwrap().is_empty());
    let fetches = env.store.stats().processed_fetches;
    assert!(env.engine.get_processed_vectors(&sets, &[g(404)]).unwrap().is_empty());
    assert_eq!(env.store.stats().processed_fetches, fetches);
    assert_eq!(env.engine.cache_stats().hits, 1);
}

#[test]
fn partial_cache_hits_fetch_only_misses() {
    let env = TestEnv::new();
    let (ee, _) = simple_experiment(&env, 3, 2);
    env.engine.compute_processed_vectors(ee).unwrap();
    let sets = [BioAssaySet::from(ee)];

    env.engine.get_processed_vectors(&sets, &[g(1)]).unwrap();
    let returned = env.store.stats().processed_vectors_returned;
    let views = env.engine.get_processed_vectors(&sets, &[g(1), g(2)]).unwrap();
    assert_eq!(views.len(), 2);
    // only probe 2 came from the store
    assert_eq!(env.store.stats().processed_vectors_returned, returned + 1);
}

#[test]
fn subset_and_parent_are_both_served() {
    let env = TestEnv::new();
    let (ee, dim) = simple_experiment(&env, 2, 4);
    env.engine.compute_processed_vectors(ee).unwrap();
    let subset = env.subset(5, ee, &dim, &[3, 0]);

    let views = env
        .engine
        .get_processed_vectors(&[subset.clone(), ee.into()], &[g(1), g(2)])
        .unwrap();
    assert_eq!(views.len(), 4);
    for view in views.iter().filter(|v| v.sliced) {
        assert_eq!(view.owner, subset.owner());
        assert_eq!(view.len(), 2);
        assert!(view.dimension.is_subset);
        assert_eq!(view.dimension.source_dimension, dim.id);
    }
    let p1 = views
        .iter()
        .find(|v| v.sliced && v.design_element == p(1))
        .unwrap();
    // probe 1 holds 1.0 * (sample + 1)
    assert_eq!(p1.data, vec![4.0, 1.0]);

    // Reads for a subset reuse the parent's cache entries
    let stats = env.engine.cache_stats();
    assert_eq!(stats.cached_experiments, 1);
}

#[test]
fn probe_reads_do_not_touch_cache() {
    let env = TestEnv::new();
    let (ee, dim) = simple_experiment(&env, 3, 3);
    env.engine.compute_processed_vectors(ee).unwrap();
    let subset = env.subset(1, ee, &dim, &[2]);

    let views = env
        .engine
        .get_processed_vectors_by_probe(&[subset, ee.into()], &[p(3), p(1), p(3)])
        .unwrap();
    assert_eq!(views.len(), 4);
    let stats = env.engine.cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.insertions), (0, 0, 0));
}

#[test]
fn all_vectors_for_subset() {
    let env = TestEnv::new();
    let (ee, dim) = simple_experiment(&env, 5, 3);
    env.engine.compute_processed_vectors(ee).unwrap();
    let subset = env.subset(2, ee, &dim, &[0]);

    let all = env.engine.get_all_processed_vectors(&subset, None).unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.iter().all(|v| v.len() == 1 && v.sliced));
    // genes are resolved for bulk reads too
    assert!(all.iter().all(|v| v.genes.len() == 1));

    let window = env.engine.get_all_processed_vectors(&ee.into(), Some(2)).unwrap();
    assert_eq!(window.len(), 2);
}

#[test]
fn clear_cache_forces_refetch() {
    let env = TestEnv::new();
    let (a, _) = simple_experiment(&env, 1, 2);
    let (b, _) = simple_experiment(&env, 1, 2);
    env.engine.compute_processed_vectors(a).unwrap();
    env.engine.compute_processed_vectors(b).unwrap();
    let sets = [BioAssaySet::from(a), BioAssaySet::from(b)];
    env.engine.get_processed_vectors(&sets, &[g(1)]).unwrap();
    assert_eq!(env.engine.cache_stats().cached_entries, 2);

    env.engine.clear_cache(Some(a));
    assert_eq!(env.engine.cache_stats().cached_entries, 1);
    env.engine.clear_cache(None);
    assert_eq!(env.engine.cache_stats().cached_entries, 0);

    env.engine.get_processed_vectors(&sets, &[g(1)]).unwrap();
    assert_eq!(env.engine.cache_stats().misses, 4);
}

#[test]
fn cache_hit_matches_direct_fetch() {
    let env = TestEnv::new();
    let (ee, _) = simple_experiment(&env, 6, 3);
    env.map(5, &[2]);
    env.map(6, &[2, 3]);
    env.engine.compute_processed_vectors(ee).unwrap();
    let sets = [BioAssaySet::from(ee)];

    env.engine.get_processed_vectors(&sets, &[g(2)]).unwrap();
    let hit = env.engine.get_processed_vectors(&sets, &[g(2)]).unwrap();
    assert_eq!(env.engine.cache_stats().hits, 1);

    let direct = env
        .engine
        .get_processed_vectors_by_probe(&sets, &[p(2), p(5), p(6)])
        .unwrap();
    assert_eq!(hit, direct);
}

mod properties {
    use crate::common::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Reading a subset equals slicing the parent read by sample
        #[test]
        fn subset_read_matches_parent(
            (samples, picks) in (1usize..8).prop_flat_map(|n| (Just(n), prop::collection::vec(0..n, 1..n + 1)))
        ) {
            let env = TestEnv::new();
            let (ee, dim) = simple_experiment(&env, 2, samples);
            env.engine.compute_processed_vectors(ee).unwrap();
            let mut picks = picks;
            picks.dedup();
            let subset = env.subset(1, ee, &dim, &picks);

            let parent = env.engine.get_processed_vectors(&[ee.into()], &[g(1), g(2)]).unwrap();
            let sliced = env.engine.get_processed_vectors(&[subset], &[g(1), g(2)]).unwrap();
            prop_assert_eq!(parent.len(), sliced.len());
            for (full, part) in parent.iter().zip(&sliced) {
                let expected: Vec<f64> = picks.iter().map(|&i| full.data[i]).collect();
                prop_assert_eq!(&part.data, &expected);
            }
        }
    }
}
