//! Rank projections
//!
//! Processed vectors may carry two precomputed statistics: the rank of the
//! vector's mean and of its maximum expression within the experiment. These
//! functions only project them; ranks are assigned when vectors are
//! written.

use exprvec_core::{DerivedVectorView, DesignElementId, GeneId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which rank statistic to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMethod {
    /// Rank by mean expression
    Mean,
    /// Rank by maximum expression
    Max,
}

impl RankMethod {
    /// The view's rank for this method, if assigned
    pub fn rank_of(&self, view: &DerivedVectorView) -> Option<f64> {
        match self {
            RankMethod::Mean => view.rank_by_mean,
            RankMethod::Max => view.rank_by_max,
        }
    }
}

impl fmt::Display for RankMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankMethod::Mean => write!(f, "mean"),
            RankMethod::Max => write!(f, "max"),
        }
    }
}

/// Both ranks of one probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeRanks {
    /// Rank by mean
    pub rank_by_mean: f64,
    /// Rank by max
    pub rank_by_max: f64,
}

/// Ranks grouped by gene
///
/// A view contributes one value to every requested gene it is associated
/// with. Unassigned ranks are reported as NaN. Genes without views are
/// absent from the result.
pub fn ranks_by_gene(
    views: &[DerivedVectorView],
    genes: &BTreeSet<GeneId>,
    method: RankMethod,
) -> BTreeMap<GeneId, Vec<f64>> {
    let mut sorted: Vec<&DerivedVectorView> = views.iter().collect();
    sorted.sort_by_key(|v| v.design_element);

    let mut result: BTreeMap<GeneId, Vec<f64>> = BTreeMap::new();
    for view in sorted {
        let rank = method.rank_of(view).unwrap_or(f64::NAN);
        for gene in view.genes.intersection(genes) {
            result.entry(*gene).or_default().push(rank);
        }
    }
    result
}

/// Rank of every view's probe; unassigned ranks are NaN
pub fn ranks_by_design_element(
    views: &[DerivedVectorView],
    method: RankMethod,
) -> BTreeMap<DesignElementId, f64> {
    views
        .iter()
        .map(|v| (v.design_element, method.rank_of(v).unwrap_or(f64::NAN)))
        .collect()
}

/// Both ranks per gene and probe
///
/// Probes missing either rank are skipped.
pub fn ranks_by_gene_and_probe(
    views: &[DerivedVectorView],
    genes: &BTreeSet<GeneId>,
) -> BTreeMap<GeneId, BTreeMap<DesignElementId, ProbeRanks>> {
    let mut result: BTreeMap<GeneId, BTreeMap<DesignElementId, ProbeRanks>> = BTreeMap::new();
    for view in views {
        let (Some(rank_by_mean), Some(rank_by_max)) = (view.rank_by_mean, view.rank_by_max) else {
            continue;
        };
        for gene in view.genes.intersection(genes) {
            result.entry(*gene).or_default().insert(
                view.design_element,
                ProbeRanks {
                    rank_by_mean,
                    rank_by_max,
                },
            );
        }
    }
    result
}
