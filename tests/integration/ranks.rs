//! Rank accessors over persisted ranks

use crate::common::*;

fn ranked(env: &TestEnv) -> ExperimentId {
    let (ee, _) = simple_experiment(env, 3, 2);
    env.map(3, &[1]);
    env.engine.compute_processed_vectors(ee).unwrap();
    env.store.set_ranks(ee, p(1), Some(0.25), Some(0.5)).unwrap();
    env.store.set_ranks(ee, p(3), Some(0.75), Some(1.0)).unwrap();
    ee
}

#[test]
fn ranks_by_gene_in_probe_order() {
    let env = TestEnv::new();
    let ee = ranked(&env);
    let ranks = env.engine.get_ranks(ee, &[g(1), g(2)], RankMethod::Mean).unwrap();
    assert_eq!(ranks[&g(1)], vec![0.25, 0.75]);
    assert_eq!(ranks[&g(2)].len(), 1);
    assert!(ranks[&g(2)][0].is_nan());
}

#[test]
fn probe_ranks_cover_every_vector() {
    let env = TestEnv::new();
    let ee = ranked(&env);
    let ranks = env.engine.get_probe_ranks(ee, RankMethod::Max).unwrap();
    assert_eq!(ranks.len(), 3);
    assert_eq!(ranks[&p(3)], 1.0);
    assert!(ranks[&p(2)].is_nan());
}

#[test]
fn ranks_by_probe_across_experiments() {
    let env = TestEnv::new();
    let a = ranked(&env);
    let b = ranked(&env);
    env.store.set_ranks(b, p(1), None, None).unwrap();

    let ranks = env.engine.get_ranks_by_probe(&[a, b], &[g(1)]).unwrap();
    assert_eq!(ranks[&a][&g(1)].len(), 2);
    assert_eq!(ranks[&b][&g(1)].len(), 1);
    assert_eq!(ranks[&b][&g(1)][&p(3)].rank_by_mean, 0.75);

    let by_experiment = env
        .engine
        .get_ranks_for_experiments(&[a, b], &[g(1)], RankMethod::Max)
        .unwrap();
    assert_eq!(by_experiment[&a][&g(1)], vec![0.5, 1.0]);
}
