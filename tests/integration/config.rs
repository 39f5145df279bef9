//! Configuration files driving the engine

use crate::common::*;
use exprvec::CONFIG_FILE_NAME;

#[test]
fn default_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    EngineConfig::write_default_if_missing(&path).unwrap();
    assert_eq!(EngineConfig::from_file(&path).unwrap(), EngineConfig::default());
}

#[test]
fn file_settings_reach_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "fetch_batch_size = 1\ncache_enabled = false\n").unwrap();

    let config = EngineConfig::from_file(&path).unwrap();
    assert_eq!(config.min_size_for_renormalization, 4000);
    let env = TestEnv::with_config(config);
    let (ee, _) = simple_experiment(&env, 3, 2);
    env.map(2, &[1]);
    env.map(3, &[1]);
    env.engine.compute_processed_vectors(ee).unwrap();

    let views = env.engine.get_processed_vectors(&[ee.into()], &[g(1)]).unwrap();
    assert_eq!(views.len(), 3);
    // one probe per fetch, nothing cached
    assert_eq!(env.store.stats().processed_fetches, 3);
    assert_eq!(env.engine.cache_stats().insertions, 0);
}

#[test]
fn invalid_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    std::fs::write(&path, "fetch_batch_size = 0\n").unwrap();
    assert!(matches!(EngineConfig::from_file(&path), Err(Error::Config(_))));

    std::fs::write(&path, "no_such_setting = true\n").unwrap();
    assert!(matches!(EngineConfig::from_file(&path), Err(Error::Config(_))));
}

#[test]
fn low_threshold_enables_normalization() {
    let env = TestEnv::with_config(EngineConfig {
        min_size_for_renormalization: 2,
        ..EngineConfig::default()
    });
    let (ee, _) = simple_experiment(&env, 3, 3);
    let summary = env.engine.compute_processed_vectors(ee).unwrap();
    assert_eq!(summary.normalization, NormalizationDecision::Applied);
}
