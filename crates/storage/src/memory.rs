//! In-memory reference vector store
//!
//! `InMemoryVectorStore` implements the full [`VectorStore`] contract over
//! a `RwLock<BTreeMap>` of experiment records. Payloads are kept byte-packed
//! through [`PayloadCodec`] and decoded on every fetch, so readers always
//! receive fresh, fully materialized vectors.
//!
//! Writes to one experiment happen under a single write lock, which makes
//! `replace_processed_vectors` atomic: readers see either the previous
//! processed generation or the new one, never a mix.
//!
//! The loader methods (`add_experiment`, `add_dimension`, ...) stand in for
//! the upstream data loaders and are what tests and benchmarks use to set
//! up fixtures.

use crate::codec::PayloadCodec;
use exprvec_core::{
    ArrayDesign, BioAssay, BioAssayDimension, BioAssayId, BioMaterialId, DataVector,
    DesignElementId, DimensionId, Error, ExperimentId, GeneId, Payload, PersistedGeneration,
    ProbeGeneMap, ProcessedVector, QuantitationType, QuantitationTypeId, Result, VectorId,
    VectorKind, VectorStore,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone)]
struct StoredVector {
    id: VectorId,
    design_element: DesignElementId,
    quantitation_type: QuantitationTypeId,
    dimension: DimensionId,
    kind: VectorKind,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct ExperimentRecord {
    array_designs: Vec<ArrayDesign>,
    quantitation_types: BTreeMap<QuantitationTypeId, Arc<QuantitationType>>,
    dimensions: BTreeMap<DimensionId, Arc<BioAssayDimension>>,
    raw_vectors: Vec<StoredVector>,
    processed_vectors: Vec<StoredVector>,
    processed_type: Option<QuantitationTypeId>,
}

impl ExperimentRecord {
    fn design_elements(&self) -> BTreeSet<DesignElementId> {
        self.raw_vectors
            .iter()
            .chain(self.processed_vectors.iter())
            .map(|v| v.design_element)
            .collect()
    }
}

/// Counters of store calls, used to observe cache effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// `fetch_preferred_raw_vectors` calls
    pub preferred_fetches: u64,
    /// `fetch_missing_value_vectors` calls
    pub missing_value_fetches: u64,
    /// `fetch_processed_vectors` and `fetch_all_processed_vectors` calls
    pub processed_fetches: u64,
    /// Processed vectors returned by those calls
    pub processed_vectors_returned: u64,
    /// `resolve_probes_to_genes` calls
    pub gene_resolutions: u64,
    /// Processed generations written
    pub generations_written: u64,
    /// Processed generations deleted (including by replacement)
    pub generations_deleted: u64,
}

#[derive(Debug, Default)]
struct StoreCounters {
    preferred_fetches: AtomicU64,
    missing_value_fetches: AtomicU64,
    processed_fetches: AtomicU64,
    processed_vectors_returned: AtomicU64,
    gene_resolutions: AtomicU64,
    generations_written: AtomicU64,
    generations_deleted: AtomicU64,
}

// ============================================================================
// Store
// ============================================================================

/// Thread-safe in-memory [`VectorStore`]
#[derive(Debug)]
pub struct InMemoryVectorStore {
    experiments: RwLock<BTreeMap<ExperimentId, ExperimentRecord>>,
    probe_genes: RwLock<FxHashMap<DesignElementId, BTreeSet<GeneId>>>,
    next_id: AtomicU64,
    codec: PayloadCodec,
    unavailable: AtomicBool,
    fail_writes: AtomicBool,
    counters: StoreCounters,
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVectorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            experiments: RwLock::new(BTreeMap::new()),
            probe_genes: RwLock::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
            codec: PayloadCodec::new(),
            unavailable: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            counters: StoreCounters::default(),
        }
    }

    fn allocate(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(Error::store("vector store is unavailable"));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        self.check_available()?;
        if self.fail_writes.load(Ordering::Acquire) {
            return Err(Error::store("vector store rejected the write"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Loader API
    // ------------------------------------------------------------------------

    /// Register an experiment run on the given platforms
    pub fn add_experiment(&self, array_designs: Vec<ArrayDesign>) -> ExperimentId {
        let id = ExperimentId::new(self.allocate());
        let record = ExperimentRecord {
            array_designs,
            ..ExperimentRecord::default()
        };
        self.experiments.write().insert(id, record);
        id
    }

    /// Create a bioassay with a fresh id
    pub fn new_bio_assay(&self, name: impl Into<String>, sample: BioMaterialId) -> BioAssay {
        BioAssay::new(BioAssayId::new(self.allocate()), name, sample)
    }

    /// Create a biomaterial id
    pub fn new_bio_material(&self) -> BioMaterialId {
        BioMaterialId::new(self.allocate())
    }

    /// Register a bioassay dimension for the experiment
    pub fn add_dimension(
        &self,
        experiment: ExperimentId,
        name: impl Into<String>,
        bio_assays: Vec<BioAssay>,
    ) -> Result<Arc<BioAssayDimension>> {
        let mut experiments = self.experiments.write();
        let record = record_mut(&mut experiments, experiment)?;
        let id = DimensionId::new(self.allocate());
        let dimension = Arc::new(BioAssayDimension::new(id, name, bio_assays));
        record.dimensions.insert(id, Arc::clone(&dimension));
        Ok(dimension)
    }

    /// Register a quantitation type for the experiment, assigning its id
    pub fn add_quantitation_type(
        &self,
        experiment: ExperimentId,
        mut quantitation_type: QuantitationType,
    ) -> Result<Arc<QuantitationType>> {
        let mut experiments = self.experiments.write();
        let record = record_mut(&mut experiments, experiment)?;
        let id = QuantitationTypeId::new(self.allocate());
        quantitation_type.id = Some(id);
        let qt = Arc::new(quantitation_type);
        record.quantitation_types.insert(id, Arc::clone(&qt));
        Ok(qt)
    }

    /// Add a raw vector
    ///
    /// The payload is stored as given; its length is checked against the
    /// dimension when the vector is read back.
    pub fn add_raw_vector(
        &self,
        experiment: ExperimentId,
        design_element: DesignElementId,
        quantitation_type: &QuantitationType,
        dimension: &BioAssayDimension,
        payload: Payload,
    ) -> Result<VectorId> {
        let mut experiments = self.experiments.write();
        let record = record_mut(&mut experiments, experiment)?;
        let qt = registered_type(record, quantitation_type)?;
        let dim = registered_dimension(record, dimension)?;
        let id = VectorId::new(self.allocate());
        record.raw_vectors.push(StoredVector {
            id,
            design_element,
            quantitation_type: qt,
            dimension: dim,
            kind: VectorKind::Raw,
            bytes: self.codec.encode(&payload),
        });
        Ok(id)
    }

    /// Associate a probe with genes (replacing earlier associations)
    pub fn map_probe_to_genes(
        &self,
        design_element: DesignElementId,
        genes: impl IntoIterator<Item = GeneId>,
    ) {
        self.probe_genes
            .write()
            .insert(design_element, genes.into_iter().collect());
    }

    /// Set the rank statistics of a processed vector
    ///
    /// Returns `false` if the experiment has no processed vector for the probe.
    pub fn set_ranks(
        &self,
        experiment: ExperimentId,
        design_element: DesignElementId,
        rank_by_mean: Option<f64>,
        rank_by_max: Option<f64>,
    ) -> Result<bool> {
        let mut experiments = self.experiments.write();
        let record = record_mut(&mut experiments, experiment)?;
        let mut found = false;
        for vector in record
            .processed_vectors
            .iter_mut()
            .filter(|v| v.design_element == design_element)
        {
            vector.kind = VectorKind::Processed {
                rank_by_mean,
                rank_by_max,
            };
            found = true;
        }
        Ok(found)
    }

    /// Make every call fail with a store error (or recover)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    /// Make every write fail with a store error (or recover)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Release);
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Number of processed vectors currently stored for the experiment
    pub fn processed_vector_count(&self, experiment: ExperimentId) -> usize {
        self.experiments
            .read()
            .get(&experiment)
            .map(|r| r.processed_vectors.len())
            .unwrap_or(0)
    }

    /// The quantitation type of the current processed generation
    pub fn processed_quantitation_type(
        &self,
        experiment: ExperimentId,
    ) -> Option<Arc<QuantitationType>> {
        let experiments = self.experiments.read();
        let record = experiments.get(&experiment)?;
        let id = record.processed_type?;
        record.quantitation_types.get(&id).cloned()
    }

    /// Every quantitation type attached to the experiment
    pub fn quantitation_types(&self, experiment: ExperimentId) -> Vec<Arc<QuantitationType>> {
        self.experiments
            .read()
            .get(&experiment)
            .map(|r| r.quantitation_types.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Current call counters
    pub fn stats(&self) -> StoreStats {
        let c = &self.counters;
        StoreStats {
            preferred_fetches: c.preferred_fetches.load(Ordering::Relaxed),
            missing_value_fetches: c.missing_value_fetches.load(Ordering::Relaxed),
            processed_fetches: c.processed_fetches.load(Ordering::Relaxed),
            processed_vectors_returned: c.processed_vectors_returned.load(Ordering::Relaxed),
            gene_resolutions: c.gene_resolutions.load(Ordering::Relaxed),
            generations_written: c.generations_written.load(Ordering::Relaxed),
            generations_deleted: c.generations_deleted.load(Ordering::Relaxed),
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn decode(
        &self,
        experiment: ExperimentId,
        record: &ExperimentRecord,
        stored: &StoredVector,
    ) -> Result<DataVector> {
        let quantitation_type = record
            .quantitation_types
            .get(&stored.quantitation_type)
            .cloned()
            .ok_or_else(|| {
                Error::Corruption(format!(
                    "{} references unknown {}",
                    stored.id, stored.quantitation_type
                ))
            })?;
        let dimension = record.dimensions.get(&stored.dimension).cloned().ok_or_else(|| {
            Error::Corruption(format!("{} references unknown {}", stored.id, stored.dimension))
        })?;
        let payload = self
            .codec
            .decode(&stored.bytes, quantitation_type.representation)?;
        Ok(DataVector {
            id: stored.id,
            experiment,
            design_element: stored.design_element,
            quantitation_type,
            dimension,
            kind: stored.kind,
            payload,
        })
    }

    fn decode_raw_where(
        &self,
        experiment: ExperimentId,
        keep: impl Fn(&QuantitationType) -> bool,
    ) -> Result<Vec<DataVector>> {
        let experiments = self.experiments.read();
        let record = record_ref(&experiments, experiment)?;
        record
            .raw_vectors
            .iter()
            .filter(|v| {
                record
                    .quantitation_types
                    .get(&v.quantitation_type)
                    .map(|qt| keep(qt.as_ref()))
                    .unwrap_or(false)
            })
            .map(|v| self.decode(experiment, record, v))
            .collect()
    }

    fn delete_locked(record: &mut ExperimentRecord) -> usize {
        let removed = record.processed_vectors.len();
        record.processed_vectors.clear();
        if let Some(qt) = record.processed_type.take() {
            record.quantitation_types.remove(&qt);
        }
        removed
    }

    fn persist_locked(
        &self,
        record: &mut ExperimentRecord,
        vectors: Vec<ProcessedVector>,
        mut quantitation_type: QuantitationType,
    ) -> PersistedGeneration {
        let qt_id = QuantitationTypeId::new(self.allocate());
        quantitation_type.id = Some(qt_id);
        let qt = Arc::new(quantitation_type);
        record.quantitation_types.insert(qt_id, Arc::clone(&qt));
        record.processed_type = Some(qt_id);

        let vector_count = vectors.len();
        for vector in vectors {
            let dimension = self.register_dimension(record, &vector.dimension);
            record.processed_vectors.push(StoredVector {
                id: VectorId::new(self.allocate()),
                design_element: vector.design_element,
                quantitation_type: qt_id,
                dimension,
                kind: VectorKind::Processed {
                    rank_by_mean: vector.rank_by_mean,
                    rank_by_max: vector.rank_by_max,
                },
                bytes: self.codec.encode(&Payload::Doubles(vector.data)),
            });
        }
        PersistedGeneration {
            quantitation_type: qt,
            vector_count,
        }
    }

    /// Id of a persisted dimension, persisting transient ones on first use
    fn register_dimension(
        &self,
        record: &mut ExperimentRecord,
        dimension: &BioAssayDimension,
    ) -> DimensionId {
        if let Some(id) = dimension.id {
            record
                .dimensions
                .entry(id)
                .or_insert_with(|| Arc::new(dimension.clone()));
            return id;
        }
        if let Some((id, _)) = record
            .dimensions
            .iter()
            .find(|(_, existing)| existing.bio_assays == dimension.bio_assays)
        {
            return *id;
        }
        let id = DimensionId::new(self.allocate());
        let mut persisted = dimension.clone();
        persisted.id = Some(id);
        record.dimensions.insert(id, Arc::new(persisted));
        id
    }
}

fn record_ref(
    experiments: &BTreeMap<ExperimentId, ExperimentRecord>,
    experiment: ExperimentId,
) -> Result<&ExperimentRecord> {
    experiments
        .get(&experiment)
        .ok_or_else(|| Error::store(format!("{} is not in the store", experiment)))
}

fn record_mut(
    experiments: &mut BTreeMap<ExperimentId, ExperimentRecord>,
    experiment: ExperimentId,
) -> Result<&mut ExperimentRecord> {
    experiments
        .get_mut(&experiment)
        .ok_or_else(|| Error::store(format!("{} is not in the store", experiment)))
}

fn registered_type(
    record: &ExperimentRecord,
    quantitation_type: &QuantitationType,
) -> Result<QuantitationTypeId> {
    quantitation_type
        .id
        .filter(|id| record.quantitation_types.contains_key(id))
        .ok_or_else(|| {
            Error::store(format!(
                "quantitation type '{}' is not registered",
                quantitation_type.name
            ))
        })
}

fn registered_dimension(
    record: &ExperimentRecord,
    dimension: &BioAssayDimension,
) -> Result<DimensionId> {
    dimension
        .id
        .filter(|id| record.dimensions.contains_key(id))
        .ok_or_else(|| Error::store(format!("dimension '{}' is not registered", dimension.name)))
}

// ============================================================================
// VectorStore
// ============================================================================

impl VectorStore for InMemoryVectorStore {
    fn fetch_preferred_raw_vectors(&self, experiment: ExperimentId) -> Result<Vec<DataVector>> {
        self.check_available()?;
        self.counters.preferred_fetches.fetch_add(1, Ordering::Relaxed);
        self.decode_raw_where(experiment, |qt| qt.is_preferred)
    }

    fn fetch_missing_value_vectors(&self, experiment: ExperimentId) -> Result<Vec<DataVector>> {
        self.check_available()?;
        self.counters
            .missing_value_fetches
            .fetch_add(1, Ordering::Relaxed);
        self.decode_raw_where(experiment, |qt| qt.is_present_absent())
    }

    fn fetch_bio_assay_dimensions(
        &self,
        experiment: ExperimentId,
    ) -> Result<Vec<Arc<BioAssayDimension>>> {
        self.check_available()?;
        let experiments = self.experiments.read();
        let record = record_ref(&experiments, experiment)?;
        let used: BTreeSet<DimensionId> = record
            .raw_vectors
            .iter()
            .chain(record.processed_vectors.iter())
            .map(|v| v.dimension)
            .collect();
        Ok(used
            .iter()
            .filter_map(|id| record.dimensions.get(id).cloned())
            .collect())
    }

    fn array_designs_used(&self, experiment: ExperimentId) -> Result<Vec<ArrayDesign>> {
        self.check_available()?;
        let experiments = self.experiments.read();
        Ok(record_ref(&experiments, experiment)?.array_designs.clone())
    }

    fn resolve_probes_to_genes(&self, probes: &[DesignElementId]) -> Result<ProbeGeneMap> {
        self.check_available()?;
        self.counters.gene_resolutions.fetch_add(1, Ordering::Relaxed);
        let probe_genes = self.probe_genes.read();
        Ok(probes
            .iter()
            .filter_map(|p| probe_genes.get(p).map(|genes| (*p, genes.clone())))
            .collect())
    }

    fn probes_for_genes(
        &self,
        experiment: ExperimentId,
        genes: &[GeneId],
    ) -> Result<Vec<DesignElementId>> {
        self.check_available()?;
        let wanted: BTreeSet<GeneId> = genes.iter().copied().collect();
        let experiments = self.experiments.read();
        let record = record_ref(&experiments, experiment)?;
        let probe_genes = self.probe_genes.read();
        Ok(record
            .design_elements()
            .into_iter()
            .filter(|p| {
                probe_genes
                    .get(p)
                    .map(|gs| !gs.is_disjoint(&wanted))
                    .unwrap_or(false)
            })
            .collect())
    }

    fn fetch_processed_vectors(
        &self,
        experiment: ExperimentId,
        probes: &[DesignElementId],
    ) -> Result<Vec<DataVector>> {
        self.check_available()?;
        let wanted: BTreeSet<DesignElementId> = probes.iter().copied().collect();
        let experiments = self.experiments.read();
        let record = record_ref(&experiments, experiment)?;
        let vectors = record
            .processed_vectors
            .iter()
            .filter(|v| wanted.contains(&v.design_element))
            .map(|v| self.decode(experiment, record, v))
            .collect::<Result<Vec<_>>>()?;
        self.counters.processed_fetches.fetch_add(1, Ordering::Relaxed);
        self.counters
            .processed_vectors_returned
            .fetch_add(vectors.len() as u64, Ordering::Relaxed);
        Ok(vectors)
    }

    fn fetch_all_processed_vectors(&self, experiment: ExperimentId) -> Result<Vec<DataVector>> {
        self.check_available()?;
        let experiments = self.experiments.read();
        let record = record_ref(&experiments, experiment)?;
        let vectors = record
            .processed_vectors
            .iter()
            .map(|v| self.decode(experiment, record, v))
            .collect::<Result<Vec<_>>>()?;
        self.counters.processed_fetches.fetch_add(1, Ordering::Relaxed);
        self.counters
            .processed_vectors_returned
            .fetch_add(vectors.len() as u64, Ordering::Relaxed);
        Ok(vectors)
    }

    fn persist_processed_vectors(
        &self,
        experiment: ExperimentId,
        vectors: Vec<ProcessedVector>,
        quantitation_type: QuantitationType,
    ) -> Result<PersistedGeneration> {
        self.check_writable()?;
        let mut experiments = self.experiments.write();
        let record = record_mut(&mut experiments, experiment)?;
        let generation = self.persist_locked(record, vectors, quantitation_type);
        self.counters
            .generations_written
            .fetch_add(1, Ordering::Relaxed);
        debug!(%experiment, vectors = generation.vector_count, "Persisted processed vectors");
        Ok(generation)
    }

    fn delete_processed_vectors(&self, experiment: ExperimentId) -> Result<usize> {
        self.check_writable()?;
        let mut experiments = self.experiments.write();
        let record = record_mut(&mut experiments, experiment)?;
        let removed = Self::delete_locked(record);
        if removed > 0 {
            self.counters
                .generations_deleted
                .fetch_add(1, Ordering::Relaxed);
        }
        debug!(%experiment, removed, "Deleted processed vectors");
        Ok(removed)
    }

    fn replace_processed_vectors(
        &self,
        experiment: ExperimentId,
        vectors: Vec<ProcessedVector>,
        quantitation_type: QuantitationType,
    ) -> Result<PersistedGeneration> {
        self.check_writable()?;
        let mut experiments = self.experiments.write();
        let record = record_mut(&mut experiments, experiment)?;
        let removed = Self::delete_locked(record);
        let generation = self.persist_locked(record, vectors, quantitation_type);
        if removed > 0 {
            self.counters
                .generations_deleted
                .fetch_add(1, Ordering::Relaxed);
        }
        self.counters
            .generations_written
            .fetch_add(1, Ordering::Relaxed);
        debug!(
            %experiment,
            removed,
            vectors = generation.vector_count,
            "Replaced processed vectors"
        );
        Ok(generation)
    }
}
