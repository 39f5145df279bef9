//! The read path
//!
//! Reads are served per source experiment: subsets are resolved to the
//! experiment they were cut from, that experiment's views are assembled
//! (from the cache where possible), and subsets are sliced at the end. The
//! cache only ever holds whole-experiment views.

use super::ProcessedVectorEngine;
use crate::align::{longest_dimension, DimensionAligner};
use crate::slice::views_for_set;
use exprvec_core::{
    BioAssaySet, DataVector, DerivedVectorView, DesignElementId, ExperimentId, GeneId, Result,
    ViewKey,
};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Sets grouped by the experiment backing them
fn group_by_experiment(sets: &[BioAssaySet]) -> BTreeMap<ExperimentId, Vec<&BioAssaySet>> {
    let mut grouped: BTreeMap<ExperimentId, Vec<&BioAssaySet>> = BTreeMap::new();
    for set in sets {
        grouped.entry(set.source_experiment()).or_default().push(set);
    }
    grouped
}

/// Slice `views` for each set and merge, dropping repeats
fn serve(
    sets: &[&BioAssaySet],
    views: &[DerivedVectorView],
    out: &mut BTreeMap<ViewKey, DerivedVectorView>,
) {
    for set in sets {
        for view in views_for_set(set, views) {
            out.entry(view.key()).or_insert(view);
        }
    }
}

impl ProcessedVectorEngine {
    /// Processed vectors for the given genes across the given sets
    ///
    /// Each set contributes the vectors of every probe associated with any
    /// requested gene. Vectors of an experiment using several dimensions
    /// are aligned onto its longest one; subsets are sliced to their own
    /// bioassays. The result holds each (owner, vector) once, ordered by
    /// that key. Empty `sets` or `genes` return an empty result without
    /// touching the store.
    ///
    /// Results per (experiment, gene) are cached when caching is enabled,
    /// including genes with no vectors at all.
    pub fn get_processed_vectors(
        &self,
        sets: &[BioAssaySet],
        genes: &[GeneId],
    ) -> Result<Vec<DerivedVectorView>> {
        let genes: BTreeSet<GeneId> = genes.iter().copied().collect();
        if sets.is_empty() || genes.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = BTreeMap::new();
        for (experiment, experiment_sets) in group_by_experiment(sets) {
            let views = self.experiment_views_for_genes(experiment, &genes)?;
            serve(&experiment_sets, &views, &mut out);
        }
        Ok(out.into_values().collect())
    }

    /// Whole-experiment views for `genes`, through the cache
    fn experiment_views_for_genes(
        &self,
        experiment: ExperimentId,
        genes: &BTreeSet<GeneId>,
    ) -> Result<Vec<DerivedVectorView>> {
        if !self.config.cache_enabled {
            let wanted: Vec<GeneId> = genes.iter().copied().collect();
            let probes = self.store.probes_for_genes(experiment, &wanted)?;
            return self.fetch_views(experiment, &probes);
        }

        let mut found: BTreeMap<ViewKey, DerivedVectorView> = BTreeMap::new();
        let mut misses = Vec::new();
        for gene in genes {
            match self.cache.get(experiment, *gene) {
                Some(views) => {
                    for view in views {
                        found.entry(view.key()).or_insert(view);
                    }
                }
                None => misses.push(*gene),
            }
        }
        debug!(
            %experiment,
            hits = genes.len() - misses.len(),
            misses = misses.len(),
            "Processed vector cache lookup"
        );

        if !misses.is_empty() {
            // Taken before reading so an invalidation during the fetch
            // rejects the insert below.
            let token = self.cache.token(experiment);
            let probes = self.store.probes_for_genes(experiment, &misses)?;
            let fetched = self.fetch_views(experiment, &probes)?;

            for gene in &misses {
                let for_gene: Vec<DerivedVectorView> = fetched
                    .iter()
                    .filter(|v| v.genes.contains(gene))
                    .cloned()
                    .collect();
                self.cache.put(token, *gene, for_gene);
            }
            for view in fetched {
                found.entry(view.key()).or_insert(view);
            }
        }

        Ok(found.into_values().collect())
    }

    /// Processed vectors for specific probes across the given sets
    ///
    /// Same shaping as [`Self::get_processed_vectors`], but reads the store
    /// directly; the cache is neither consulted nor filled. Probes the
    /// experiment does not measure are ignored.
    pub fn get_processed_vectors_by_probe(
        &self,
        sets: &[BioAssaySet],
        probes: &[DesignElementId],
    ) -> Result<Vec<DerivedVectorView>> {
        let probes: Vec<DesignElementId> = probes
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if sets.is_empty() || probes.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = BTreeMap::new();
        for (experiment, experiment_sets) in group_by_experiment(sets) {
            let views = self.fetch_views(experiment, &probes)?;
            serve(&experiment_sets, &views, &mut out);
        }
        Ok(out.into_values().collect())
    }

    /// Every processed vector of a set, or a random window of `limit`
    ///
    /// With a limit smaller than the number of vectors, a contiguous run of
    /// `limit` vectors (in probe order) is taken from a random offset. The
    /// cache is not used.
    pub fn get_all_processed_vectors(
        &self,
        set: &BioAssaySet,
        limit: Option<usize>,
    ) -> Result<Vec<DerivedVectorView>> {
        let experiment = set.source_experiment();
        let mut vectors = self.store.fetch_all_processed_vectors(experiment)?;
        vectors.sort_by_key(|v| v.design_element);

        if let Some(limit) = limit {
            if limit < vectors.len() {
                let offset = rand::thread_rng().gen_range(0..=vectors.len() - limit);
                debug!(%experiment, limit, offset, total = vectors.len(), "Sampling processed vectors");
                vectors = vectors.drain(offset..offset + limit).collect();
            }
        }

        let views = self.unpack(experiment, &vectors)?;
        Ok(views_for_set(set, &views))
    }

    /// Fetch `probes` in batches, annotate with genes and align
    fn fetch_views(
        &self,
        experiment: ExperimentId,
        probes: &[DesignElementId],
    ) -> Result<Vec<DerivedVectorView>> {
        let mut vectors = Vec::new();
        for batch in probes.chunks(self.config.fetch_batch_size) {
            vectors.extend(self.store.fetch_processed_vectors(experiment, batch)?);
        }
        debug!(
            %experiment,
            probes = probes.len(),
            vectors = vectors.len(),
            "Fetched processed vectors"
        );
        self.unpack(experiment, &vectors)
    }

    /// Turn stored vectors into views aligned for the experiment
    fn unpack(
        &self,
        experiment: ExperimentId,
        vectors: &[DataVector],
    ) -> Result<Vec<DerivedVectorView>> {
        if vectors.is_empty() {
            return Ok(Vec::new());
        }

        let mut views = Vec::with_capacity(vectors.len());
        for batch in vectors.chunks(self.config.fetch_batch_size) {
            let probes: Vec<DesignElementId> = batch.iter().map(|v| v.design_element).collect();
            let mut gene_map = self.store.resolve_probes_to_genes(&probes)?;
            for vector in batch {
                let genes = gene_map.remove(&vector.design_element).unwrap_or_default();
                views.push(DerivedVectorView::from_data_vector(vector, genes)?);
            }
        }

        // Ragged experiments are aligned against every dimension they use,
        // not just the ones in this batch, so cached and fresh views agree.
        let dimensions = self.store.fetch_bio_assay_dimensions(experiment)?;
        let ragged = match dimensions.split_first() {
            Some((first, rest)) => rest.iter().any(|d| !d.same_as(first)),
            None => false,
        };
        if ragged {
            if let Some(target) = longest_dimension(&dimensions) {
                let mut aligner = DimensionAligner::new(target);
                views = aligner.align_all(views);
            }
        }
        Ok(views)
    }
}
