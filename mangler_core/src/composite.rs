use crate::error::MutationError;
use crate::mutator::{Mutator, entropy_rng};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use tracing::{debug, trace};

/// A `Mutator` that chains a random selection of child mutators.
///
/// Each call decides how many child invocations to make, then picks each child
/// uniformly from the whole pool (repetition allowed) and feeds the previous
/// output into it. The first step consumes the original input.
///
/// The number of invocations is exactly one when `max_transforms == 1`, and
/// otherwise uniform in `[0, max_transforms - 1]`. A composite with no children
/// returns a copy of its input.
pub struct CompositeMutator<R = ChaCha8Rng> {
    children: Vec<Box<dyn Mutator>>,
    max_transforms: usize,
    rng: R,
}

impl CompositeMutator<ChaCha8Rng> {
    /// Creates a composite over `children`, bounded by the number of children.
    pub fn new(children: Vec<Box<dyn Mutator>>) -> Result<Self, MutationError> {
        let max_transforms = children.len();
        Ok(Self::with_rng(children, max_transforms, entropy_rng()?))
    }

    pub fn seeded(children: Vec<Box<dyn Mutator>>, max_transforms: usize, seed: u64) -> Self {
        Self::with_rng(children, max_transforms, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> CompositeMutator<R> {
    pub fn with_rng(children: Vec<Box<dyn Mutator>>, max_transforms: usize, rng: R) -> Self {
        Self {
            children,
            max_transforms,
            rng,
        }
    }

    pub fn max_transforms(&self) -> usize {
        self.max_transforms
    }

    /// Names of the child mutators, in pool order.
    pub fn child_names(&self) -> Vec<&'static str> {
        self.children.iter().map(|child| child.name()).collect()
    }

    fn draw_count(&mut self) -> usize {
        if self.children.is_empty() {
            return 0;
        }
        match self.max_transforms {
            0 => 0,
            1 => 1,
            bound => self.rng.random_range(0..bound),
        }
    }
}

impl<R: Rng + Send> Mutator for CompositeMutator<R> {
    fn name(&self) -> &'static str {
        "CompositeMutator"
    }

    /// Chains the children over a private copy, so a failing step leaves no
    /// partial mutation behind for `transform_in_place` callers.
    fn transform(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
        let count = self.draw_count();
        let mut buffer = input.to_vec();
        for step in 0..count {
            let index = self.rng.random_range(0..self.children.len());
            let child = &mut self.children[index];
            trace!(step, child = child.name(), len = buffer.len(), "applying child");
            child.transform_in_place(&mut buffer)?;
        }
        debug!(
            mutator = self.name(),
            transforms = count,
            input_len = input.len(),
            output_len = buffer.len(),
            "transform complete"
        );
        Ok(buffer)
    }
}

impl<R> std::fmt::Debug for CompositeMutator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeMutator")
            .field(
                "children",
                &self.children.iter().map(|child| child.name()).collect::<Vec<_>>(),
            )
            .field("max_transforms", &self.max_transforms)
            .finish_non_exhaustive()
    }
}
