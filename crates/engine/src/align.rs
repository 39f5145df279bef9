//! Dimension alignment
//!
//! Vectors of one experiment can reference different bioassay dimensions,
//! typically when samples were run on more than one platform. Before such
//! vectors can be compared position by position they are re-expressed
//! against the longest dimension: every biomaterial of the target gets a
//! position, filled from the vector when it measured that biomaterial and
//! NaN otherwise.
//!
//! Alignment pads, it never truncates: values for biomaterials the target
//! does not contain are dropped, and the output length is always the
//! target's length.

use exprvec_core::{BioAssay, BioAssayDimension, DerivedVectorView};
use std::sync::Arc;
use tracing::debug;

/// The dimension with the most bioassays
///
/// Ties go to the first one seen. Returns `None` for empty input.
pub fn longest_dimension<'a, I>(dimensions: I) -> Option<Arc<BioAssayDimension>>
where
    I: IntoIterator<Item = &'a Arc<BioAssayDimension>>,
{
    let mut longest: Option<&Arc<BioAssayDimension>> = None;
    for dim in dimensions {
        if longest.map_or(true, |l| dim.len() > l.len()) {
            longest = Some(dim);
        }
    }
    longest.cloned()
}

/// Whether the views use more than one distinct dimension
pub fn is_ragged(views: &[DerivedVectorView]) -> bool {
    match views.split_first() {
        None => false,
        Some((first, rest)) => rest.iter().any(|v| !v.dimension.same_as(&first.dimension)),
    }
}

/// A source dimension re-expressed against a target
#[derive(Debug, Clone)]
struct Expansion {
    source: Arc<BioAssayDimension>,
    expanded: Arc<BioAssayDimension>,
    /// For each target position, the source position holding that biomaterial
    positions: Vec<Option<usize>>,
}

impl Expansion {
    fn new(source: &Arc<BioAssayDimension>, target: &BioAssayDimension) -> Self {
        let by_sample = source.sample_positions();
        let platform = source.bio_assays.iter().find_map(|ba| ba.array_design);

        let mut positions = Vec::with_capacity(target.len());
        let mut bio_assays = Vec::with_capacity(target.len());
        for target_ba in &target.bio_assays {
            match by_sample.get(&target_ba.sample) {
                Some(&i) => {
                    positions.push(Some(i));
                    bio_assays.push(source.bio_assays[i].clone());
                }
                None => {
                    positions.push(None);
                    bio_assays.push(BioAssay::placeholder(target_ba.sample, platform));
                }
            }
        }

        let expanded = BioAssayDimension::transient(
            format!("Expanded bioassay dimension based on {}", source.name),
            bio_assays,
        );
        Self {
            source: Arc::clone(source),
            expanded: Arc::new(expanded),
            positions,
        }
    }

    fn apply(&self, data: &[f64]) -> Vec<f64> {
        self.positions
            .iter()
            .map(|p| p.and_then(|i| data.get(i).copied()).unwrap_or(f64::NAN))
            .collect()
    }
}

/// Re-expresses views against one target dimension
///
/// Expanded dimensions are built once per source dimension and shared by
/// every view aligned from it.
#[derive(Debug)]
pub struct DimensionAligner {
    target: Arc<BioAssayDimension>,
    expansions: Vec<Expansion>,
}

impl DimensionAligner {
    /// Aligner onto `target`
    pub fn new(target: Arc<BioAssayDimension>) -> Self {
        Self {
            target,
            expansions: Vec::new(),
        }
    }

    /// Aligner onto the longest of the views' dimensions
    ///
    /// Returns `None` when the views share one dimension (or there are
    /// none), in which case nothing needs aligning.
    pub fn for_views(views: &[DerivedVectorView]) -> Option<Self> {
        if !is_ragged(views) {
            return None;
        }
        longest_dimension(views.iter().map(|v| &v.dimension)).map(Self::new)
    }

    /// The target dimension
    pub fn target(&self) -> &Arc<BioAssayDimension> {
        &self.target
    }

    /// Align one view; views already on the target are returned unchanged
    pub fn align(&mut self, mut view: DerivedVectorView) -> DerivedVectorView {
        if view.dimension.same_as(&self.target) {
            return view;
        }
        let index = match self
            .expansions
            .iter()
            .position(|e| Arc::ptr_eq(&e.source, &view.dimension) || e.source.same_as(&view.dimension))
        {
            Some(i) => i,
            None => {
                self.expansions.push(Expansion::new(&view.dimension, &self.target));
                self.expansions.len() - 1
            }
        };
        let expansion = &self.expansions[index];
        view.data = expansion.apply(&view.data);
        view.dimension = Arc::clone(&expansion.expanded);
        view.reorganized = true;
        view
    }

    /// Align every view
    pub fn align_all(&mut self, views: Vec<DerivedVectorView>) -> Vec<DerivedVectorView> {
        let aligned: Vec<_> = views.into_iter().map(|v| self.align(v)).collect();
        debug!(
            target_dimension = %self.target.name,
            expanded_dimensions = self.expansions.len(),
            "Aligned ragged vectors"
        );
        aligned
    }
}

/// Align `views` onto their longest dimension if they are ragged
pub fn align_ragged(views: Vec<DerivedVectorView>) -> Vec<DerivedVectorView> {
    match DimensionAligner::for_views(&views) {
        Some(mut aligner) => aligner.align_all(views),
        None => views,
    }
}

/// Align a single view onto `target`
pub fn align_to_dimension(
    view: DerivedVectorView,
    target: &Arc<BioAssayDimension>,
) -> DerivedVectorView {
    DimensionAligner::new(Arc::clone(target)).align(view)
}
