//! Reference scenarios for recomputation and the read path

use crate::common::*;
use exprvec::{align_to_dimension, views_for_set};

/// Two probes, four samples, no calls, below the normalization threshold
#[test]
fn processed_vectors_equal_raw_when_nothing_applies() {
    let env = TestEnv::new();
    let ee = env.experiment(TechnologyType::OneColor);
    let dim = env.dimension(ee, "main", &env.samples(4), None);
    let qt = env.preferred_type(ee);
    env.raw(ee, 1, &qt, &dim, vec![1.0, 2.0, 3.0, 4.0]);
    env.raw(ee, 2, &qt, &dim, vec![5.0, 6.0, 7.0, 8.0]);

    let summary = env.engine.compute_processed_vectors(ee).unwrap();
    assert_eq!(summary.vector_count, 2);
    assert!(summary.quantitation_type.is_masked_preferred);
    assert!(!summary.quantitation_type.is_preferred);
    assert!(!summary.normalization.applied());

    let views = env
        .engine
        .get_processed_vectors_by_probe(&[ee.into()], &[p(1), p(2)])
        .unwrap();
    assert_eq!(views.len(), 2);
    assert!(views.iter().all(|v| v.masked));
    assert_eq!(views[0].data, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(views[1].data, vec![5.0, 6.0, 7.0, 8.0]);
}

/// An absent call turns the value at that position into NaN
#[test]
fn absent_call_masks_position() {
    let env = TestEnv::new();
    let ee = env.experiment(TechnologyType::TwoColor);
    let dim = env.dimension(ee, "main", &env.samples(4), None);
    let qt = env.preferred_type(ee);
    let calls = env.calls_type(ee);
    env.raw(ee, 1, &qt, &dim, vec![1.0, 2.0, 3.0, 4.0]);
    env.raw(ee, 2, &qt, &dim, vec![5.0, 6.0, 7.0, 8.0]);
    env.calls(ee, 1, &calls, &dim, vec![true, false, true, true]);

    let summary = env.engine.compute_processed_vectors(ee).unwrap();
    assert!(summary.masking_applied);

    let views = env
        .engine
        .get_processed_vectors_by_probe(&[ee.into()], &[p(1)])
        .unwrap();
    assert_data_eq(&views[0].data, &[1.0, f64::NAN, 3.0, 4.0]);
}

/// A vector on a 3-sample dimension is padded onto the 5-sample one
#[test]
fn shorter_dimension_padded_by_sample() {
    let env = TestEnv::new();
    let ee = env.experiment_on(vec![
        ArrayDesign::new(ArrayDesignId::new(1), "GPL1", TechnologyType::OneColor),
        ArrayDesign::new(ArrayDesignId::new(2), "GPL2", TechnologyType::OneColor),
    ]);
    let s = env.samples(5);
    let d1 = env.dimension(ee, "D1", &s[..3], Some(ArrayDesignId::new(1)));
    let d2 = env.dimension(ee, "D2", &s, Some(ArrayDesignId::new(2)));
    let qt = env.preferred_type(ee);
    env.raw(ee, 1, &qt, &d1, vec![1.0, 2.0, 3.0]);
    env.raw(ee, 2, &qt, &d2, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    env.map(1, &[7]);
    env.map(2, &[7]);

    let summary = env.engine.compute_processed_vectors(ee).unwrap();
    assert!(!summary.normalization.applied());

    let views = env.engine.get_processed_vectors(&[ee.into()], &[g(7)]).unwrap();
    assert_eq!(views.len(), 2);
    let short = views.iter().find(|v| v.design_element == p(1)).unwrap();
    assert_data_eq(&short.data, &[1.0, 2.0, 3.0, f64::NAN, f64::NAN]);
    assert!(short.reorganized);
    assert_eq!(short.dimension.name, "Expanded bioassay dimension based on D1");
    let placeholder = &short.dimension.bio_assays[3];
    assert!(placeholder.is_placeholder());
    assert_eq!(placeholder.sample, s[3]);
    assert_eq!(placeholder.array_design, Some(ArrayDesignId::new(1)));

    let long = views.iter().find(|v| v.design_element == p(2)).unwrap();
    assert!(!long.reorganized);
    assert_eq!(long.data.len(), 5);

    // Same result through the aligner directly
    let mut plain = short.clone();
    plain.dimension = d1.clone();
    plain.data = vec![1.0, 2.0, 3.0];
    let aligned = align_to_dimension(plain, &d2);
    assert_data_eq(&aligned.data, &short.data);
}

/// Recomputing invalidates cached entries; the next read is a miss
#[test]
fn recompute_invalidates_cache() {
    let env = TestEnv::new();
    let (ee, _) = simple_experiment(&env, 3, 4);
    env.engine.compute_processed_vectors(ee).unwrap();
    let sets = [BioAssaySet::from(ee)];

    env.engine.get_processed_vectors(&sets, &[g(1)]).unwrap();
    env.engine.get_processed_vectors(&sets, &[g(1)]).unwrap();
    let warm = env.engine.cache_stats();
    assert_eq!(warm.hits, 1);
    assert_eq!(warm.misses, 1);

    env.engine.compute_processed_vectors(ee).unwrap();
    let fetches = env.store.stats().processed_fetches;
    env.engine.get_processed_vectors(&sets, &[g(1)]).unwrap();

    let after = env.engine.cache_stats();
    assert_eq!(after.hits, 1);
    assert_eq!(after.misses, 2);
    assert_eq!(env.store.stats().processed_fetches, fetches + 1);
}

/// A subset of samples 2 and 4 picks positions 1 and 3
#[test]
fn subset_slices_positions() {
    let env = TestEnv::new();
    let (ee, dim) = simple_experiment(&env, 1, 5);
    env.engine.compute_processed_vectors(ee).unwrap();
    let subset = env.subset(1, ee, &dim, &[1, 3]);

    let full = env.engine.get_processed_vectors(&[ee.into()], &[g(1)]).unwrap();
    let sliced = env
        .engine
        .get_processed_vectors(&[subset.clone()], &[g(1)])
        .unwrap();
    assert_eq!(sliced.len(), 1);
    assert_eq!(sliced[0].data, vec![full[0].data[1], full[0].data[3]]);
    assert_eq!(sliced[0].source_vector_id, full[0].id);
    assert!(sliced[0].is_sliced());
    assert_eq!(sliced[0].owner, subset.owner());

    // And through the slicer directly
    let direct = views_for_set(&subset, &full);
    assert_eq!(direct[0].data, sliced[0].data);
}
