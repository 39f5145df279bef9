//! Shared test utilities for the integration suite.
//!
//! Import via `mod common;` from the test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::{Arc, Once};

pub use exprvec::{
    ArrayDesign, ArrayDesignId, BioAssay, BioAssayDimension, BioAssaySet, BioMaterialId,
    DerivedVectorView, DesignElementId, EngineConfig, Error, ExperimentId, ExperimentSubset,
    GeneId, InMemoryVectorStore, NormalizationDecision, Payload, ProcessedVectorEngine,
    QuantitationType, RankMethod, ScaleType, ShardedVectorCache, SubsetId, TechnologyType,
    VectorStore,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route engine logs to the test harness (shown with --nocapture)
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn p(id: u64) -> DesignElementId {
    DesignElementId::new(id)
}

pub fn g(id: u64) -> GeneId {
    GeneId::new(id)
}

/// Data equality where NaN equals NaN
pub fn assert_data_eq(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length: {:?} vs {:?}", actual, expected);
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a.is_nan() && e.is_nan()) || a == e,
            "position {}: {:?} vs {:?}",
            i,
            actual,
            expected
        );
    }
}

// ============================================================================
// TestEnv - store plus engine
// ============================================================================

/// An in-memory store with an engine on top
pub struct TestEnv {
    pub store: Arc<InMemoryVectorStore>,
    pub engine: Arc<ProcessedVectorEngine>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        init_tracing();
        let store = Arc::new(InMemoryVectorStore::new());
        let dyn_store: Arc<dyn VectorStore> = store.clone();
        let engine = ProcessedVectorEngine::new(dyn_store, Arc::new(ShardedVectorCache::new()), config)
            .expect("valid test config");
        Self {
            store,
            engine: Arc::new(engine),
        }
    }

    /// A new experiment on one platform of the given technology
    pub fn experiment(&self, technology: TechnologyType) -> ExperimentId {
        self.store
            .add_experiment(vec![ArrayDesign::new(ArrayDesignId::new(1), "GPL1", technology)])
    }

    /// A new experiment on several platforms
    pub fn experiment_on(&self, platforms: Vec<ArrayDesign>) -> ExperimentId {
        self.store.add_experiment(platforms)
    }

    /// `n` fresh biomaterials
    pub fn samples(&self, n: usize) -> Vec<BioMaterialId> {
        (0..n).map(|_| self.store.new_bio_material()).collect()
    }

    /// A dimension with one new bioassay per sample
    pub fn dimension(
        &self,
        experiment: ExperimentId,
        name: &str,
        samples: &[BioMaterialId],
        platform: Option<ArrayDesignId>,
    ) -> Arc<BioAssayDimension> {
        let assays = samples
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let ba = self.store.new_bio_assay(format!("{}-{}", name, i), s);
                match platform {
                    Some(ad) => ba.on_platform(ad),
                    None => ba,
                }
            })
            .collect();
        self.store
            .add_dimension(experiment, name, assays)
            .expect("experiment exists")
    }

    pub fn preferred_type(&self, experiment: ExperimentId) -> Arc<QuantitationType> {
        self.store
            .add_quantitation_type(experiment, QuantitationType::preferred("VALUE", ScaleType::Log2))
            .expect("experiment exists")
    }

    pub fn calls_type(&self, experiment: ExperimentId) -> Arc<QuantitationType> {
        self.store
            .add_quantitation_type(experiment, QuantitationType::present_absent("ABS_CALL"))
            .expect("experiment exists")
    }

    pub fn raw(
        &self,
        experiment: ExperimentId,
        probe: u64,
        qt: &QuantitationType,
        dim: &BioAssayDimension,
        data: Vec<f64>,
    ) {
        self.store
            .add_raw_vector(experiment, p(probe), qt, dim, Payload::Doubles(data))
            .expect("registered type and dimension");
    }

    pub fn calls(
        &self,
        experiment: ExperimentId,
        probe: u64,
        qt: &QuantitationType,
        dim: &BioAssayDimension,
        present: Vec<bool>,
    ) {
        self.store
            .add_raw_vector(experiment, p(probe), qt, dim, Payload::Booleans(present))
            .expect("registered type and dimension");
    }

    pub fn map(&self, probe: u64, genes: &[u64]) {
        self.store
            .map_probe_to_genes(p(probe), genes.iter().map(|&id| g(id)));
    }

    /// A subset of `experiment` holding the dimension's bioassays at `positions`
    pub fn subset(
        &self,
        id: u64,
        experiment: ExperimentId,
        dim: &BioAssayDimension,
        positions: &[usize],
    ) -> BioAssaySet {
        let assays = positions.iter().map(|&i| dim.bio_assays[i].clone()).collect();
        BioAssaySet::Subset(Arc::new(ExperimentSubset::new(
            SubsetId::new(id),
            format!("subset {}", id),
            experiment,
            assays,
        )))
    }
}

// ============================================================================
// Canned experiments
// ============================================================================

/// One experiment, one dimension of `samples`, `probes` probes; probe k maps
/// to gene k and holds `k * (sample + 1)`
pub fn simple_experiment(env: &TestEnv, probes: u64, samples: usize) -> (ExperimentId, Arc<BioAssayDimension>) {
    let ee = env.experiment(TechnologyType::OneColor);
    let dim = env.dimension(ee, "main", &env.samples(samples), None);
    let qt = env.preferred_type(ee);
    for k in 1..=probes {
        let data = (0..samples).map(|s| (k * (s as u64 + 1)) as f64).collect();
        env.raw(ee, k, &qt, &dim, data);
        env.map(k, &[k]);
    }
    (ee, dim)
}
