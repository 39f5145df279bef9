//! Store failures and how they surface

use crate::common::*;

#[test]
fn unavailable_store_fails_recompute() {
    let env = TestEnv::new();
    let (ee, _) = simple_experiment(&env, 2, 2);
    env.store.set_unavailable(true);
    let err = env.engine.compute_processed_vectors(ee).unwrap_err();
    assert!(err.is_store_error());
    env.store.set_unavailable(false);
    assert_eq!(env.store.processed_vector_count(ee), 0);
}

#[test]
fn unavailable_store_fails_cold_reads_only() {
    let env = TestEnv::new();
    let (ee, _) = simple_experiment(&env, 2, 2);
    env.engine.compute_processed_vectors(ee).unwrap();
    let sets = [BioAssaySet::from(ee)];
    let warm = env.engine.get_processed_vectors(&sets, &[g(1)]).unwrap();

    env.store.set_unavailable(true);
    assert_eq!(env.engine.get_processed_vectors(&sets, &[g(1)]).unwrap(), warm);
    let err = env.engine.get_processed_vectors(&sets, &[g(2)]).unwrap_err();
    assert!(err.is_store_error());
    assert!(env
        .engine
        .get_processed_vectors_by_probe(&sets, &[p(1)])
        .is_err());
}

#[test]
fn unknown_experiment_is_store_error() {
    let env = TestEnv::new();
    let err = env
        .engine
        .compute_processed_vectors(ExperimentId::new(9_999))
        .unwrap_err();
    assert!(err.is_store_error());
}

#[test]
fn platform_without_technology_type() {
    let env = TestEnv::new();
    let ee = env.experiment_on(vec![ArrayDesign {
        id: ArrayDesignId::new(3),
        name: "unclassified".to_string(),
        technology_type: None,
    }]);
    let err = env.engine.compute_processed_vectors(ee).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingTechnologyType { array_design, .. } if array_design == ArrayDesignId::new(3)
    ));
}

#[test]
fn caller_supplied_generation_is_validated() {
    let env = TestEnv::new();
    let (ee, dim) = simple_experiment(&env, 1, 2);
    let qt = QuantitationType::preferred("VALUE", ScaleType::Log2).derive_processed();

    let err = env
        .engine
        .replace_processed_vectors(ee, vec![], qt.clone())
        .unwrap_err();
    assert!(matches!(err, Error::EmptyVectorSet { .. }));

    let v = exprvec::ProcessedVector::new(p(1), dim.clone(), vec![1.0, 2.0]);
    let err = env
        .engine
        .replace_processed_vectors(ee, vec![v.clone(), v.clone()], qt.clone())
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateDesignElement { .. }));

    let persisted = env.engine.replace_processed_vectors(ee, vec![v], qt).unwrap();
    assert_eq!(persisted.vector_count, 1);
    assert_eq!(env.store.processed_vector_count(ee), 1);
}
