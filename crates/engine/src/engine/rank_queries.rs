use super::ProcessedVectorEngine;
use crate::ranks::{
    ranks_by_design_element, ranks_by_gene, ranks_by_gene_and_probe, ProbeRanks, RankMethod,
};
use exprvec_core::{BioAssaySet, DerivedVectorView, DesignElementId, ExperimentId, GeneId, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Per-gene rank lists keyed by experiment
pub type RanksByExperiment = BTreeMap<ExperimentId, BTreeMap<GeneId, Vec<f64>>>;

/// Per-gene, per-probe ranks keyed by experiment
pub type ProbeRanksByExperiment =
    BTreeMap<ExperimentId, BTreeMap<GeneId, BTreeMap<DesignElementId, ProbeRanks>>>;

fn by_experiment(views: Vec<DerivedVectorView>) -> BTreeMap<ExperimentId, Vec<DerivedVectorView>> {
    let mut grouped: BTreeMap<ExperimentId, Vec<DerivedVectorView>> = BTreeMap::new();
    for view in views {
        grouped.entry(view.experiment).or_default().push(view);
    }
    grouped
}

impl ProcessedVectorEngine {
    /// Ranks of the genes' probes in one experiment
    ///
    /// Each gene maps to one rank per associated probe, in probe order, NaN
    /// where the rank is unassigned. Genes with no vectors are absent.
    pub fn get_ranks(
        &self,
        experiment: ExperimentId,
        genes: &[GeneId],
        method: RankMethod,
    ) -> Result<BTreeMap<GeneId, Vec<f64>>> {
        let wanted: BTreeSet<GeneId> = genes.iter().copied().collect();
        let views = self.get_processed_vectors(&[BioAssaySet::Experiment(experiment)], genes)?;
        Ok(ranks_by_gene(&views, &wanted, method))
    }

    /// [`Self::get_ranks`] for several experiments in one read
    ///
    /// Experiments with no vectors for any of the genes are absent.
    pub fn get_ranks_for_experiments(
        &self,
        experiments: &[ExperimentId],
        genes: &[GeneId],
        method: RankMethod,
    ) -> Result<RanksByExperiment> {
        let wanted: BTreeSet<GeneId> = genes.iter().copied().collect();
        let sets: Vec<BioAssaySet> = experiments.iter().map(|&e| BioAssaySet::Experiment(e)).collect();
        let views = self.get_processed_vectors(&sets, genes)?;
        Ok(by_experiment(views)
            .into_iter()
            .map(|(experiment, views)| (experiment, ranks_by_gene(&views, &wanted, method)))
            .collect())
    }

    /// Rank of every probe in the experiment
    pub fn get_probe_ranks(
        &self,
        experiment: ExperimentId,
        method: RankMethod,
    ) -> Result<BTreeMap<DesignElementId, f64>> {
        let views = self.get_all_processed_vectors(&BioAssaySet::Experiment(experiment), None)?;
        Ok(ranks_by_design_element(&views, method))
    }

    /// Both ranks per gene and probe, per experiment
    ///
    /// Probes missing either rank are left out.
    pub fn get_ranks_by_probe(
        &self,
        experiments: &[ExperimentId],
        genes: &[GeneId],
    ) -> Result<ProbeRanksByExperiment> {
        let wanted: BTreeSet<GeneId> = genes.iter().copied().collect();
        let sets: Vec<BioAssaySet> = experiments.iter().map(|&e| BioAssaySet::Experiment(e)).collect();
        let views = self.get_processed_vectors(&sets, genes)?;
        Ok(by_experiment(views)
            .into_iter()
            .map(|(experiment, views)| (experiment, ranks_by_gene_and_probe(&views, &wanted)))
            .collect())
    }
}
