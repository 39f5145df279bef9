//! Subset slicing
//!
//! An experiment subset selects some of its source experiment's bioassays,
//! possibly reordered. Slicing keeps only the values at those bioassays, in
//! the subset's order. A bioassay the vector's dimension does not contain
//! is dropped rather than padded, so a slice is never longer than the
//! subset.
//!
//! Positions are matched by bioassay id first. Vectors that went through
//! alignment can hold a different bioassay of the same biomaterial (or a
//! placeholder), so unmatched bioassays fall back to matching by
//! biomaterial.

use exprvec_core::{BioAssayDimension, BioAssaySet, DerivedVectorView, ExperimentSubset, VectorOwner};
use std::sync::Arc;

#[derive(Debug)]
struct SliceLayout {
    source: Arc<BioAssayDimension>,
    sliced: Arc<BioAssayDimension>,
    positions: Vec<usize>,
}

impl SliceLayout {
    fn new(subset: &ExperimentSubset, source: &Arc<BioAssayDimension>) -> Self {
        let by_id = source.bio_assay_positions();
        let by_sample = source.sample_positions();

        let positions: Vec<usize> = subset
            .bio_assays
            .iter()
            .filter_map(|ba| {
                ba.id
                    .and_then(|id| by_id.get(&id))
                    .or_else(|| by_sample.get(&ba.sample))
                    .copied()
            })
            .collect();

        let mut sliced = BioAssayDimension::transient(
            format!("Subset of {}", source.name),
            positions.iter().map(|&i| source.bio_assays[i].clone()).collect(),
        );
        sliced.is_subset = true;
        sliced.source_dimension = source.id;

        Self {
            source: Arc::clone(source),
            sliced: Arc::new(sliced),
            positions,
        }
    }
}

/// Slices views of a source experiment down to one subset
///
/// Layouts are computed once per source dimension.
#[derive(Debug)]
pub struct SubsetSlicer {
    subset: Arc<ExperimentSubset>,
    layouts: Vec<SliceLayout>,
}

impl SubsetSlicer {
    /// Slicer for `subset`
    pub fn new(subset: Arc<ExperimentSubset>) -> Self {
        Self {
            subset,
            layouts: Vec::new(),
        }
    }

    /// The subset being sliced to
    pub fn subset(&self) -> &ExperimentSubset {
        &self.subset
    }

    /// Slice one view
    ///
    /// The result has no id of its own; `source_vector_id` points at the
    /// persisted vector the values came from.
    pub fn slice(&mut self, view: &DerivedVectorView) -> DerivedVectorView {
        let index = match self.layouts.iter().position(|l| {
            Arc::ptr_eq(&l.source, &view.dimension) || l.source.same_as(&view.dimension)
        }) {
            Some(i) => i,
            None => {
                self.layouts.push(SliceLayout::new(&self.subset, &view.dimension));
                self.layouts.len() - 1
            }
        };
        let layout = &self.layouts[index];

        DerivedVectorView {
            id: None,
            source_vector_id: view.id.or(view.source_vector_id),
            owner: VectorOwner::Subset(self.subset.id),
            experiment: view.experiment,
            design_element: view.design_element,
            quantitation_type: Arc::clone(&view.quantitation_type),
            dimension: Arc::clone(&layout.sliced),
            data: layout
                .positions
                .iter()
                .map(|&i| view.data.get(i).copied().unwrap_or(f64::NAN))
                .collect(),
            genes: view.genes.clone(),
            rank_by_mean: view.rank_by_mean,
            rank_by_max: view.rank_by_max,
            masked: view.masked,
            reorganized: view.reorganized,
            sliced: true,
        }
    }

    /// Slice every view
    pub fn slice_all<'a, I>(&mut self, views: I) -> Vec<DerivedVectorView>
    where
        I: IntoIterator<Item = &'a DerivedVectorView>,
    {
        views.into_iter().map(|v| self.slice(v)).collect()
    }
}

/// Slice one view for `subset`
pub fn slice(subset: &Arc<ExperimentSubset>, view: &DerivedVectorView) -> DerivedVectorView {
    SubsetSlicer::new(Arc::clone(subset)).slice(view)
}

/// Views of the source experiment as served for `set`
///
/// Experiments get the views unchanged; subsets get slices.
pub fn views_for_set(set: &BioAssaySet, views: &[DerivedVectorView]) -> Vec<DerivedVectorView> {
    match set {
        BioAssaySet::Experiment(_) => views.to_vec(),
        BioAssaySet::Subset(subset) => SubsetSlicer::new(Arc::clone(subset)).slice_all(views),
    }
}
