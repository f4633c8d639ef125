use crate::error::{MutationError, check_probability, check_span_bound};
use crate::mutator::{Mutator, entropy_rng};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use tracing::{debug, trace};

/// Default fraction of input length used as the number of swaps.
pub const DEFAULT_SWAP_PROBABILITY: f64 = 0.1;
/// Default exclusive upper bound on the candidate length of a swapped span.
pub const DEFAULT_MAX_SPAN_LENGTH: usize = 10_000;

/// Exchanges `[src_start, src_start + len)` and `[targ_start, targ_start + len)`
/// inside `buffer`, returning the length actually used.
///
/// `len` is clamped so both ranges stay inside the buffer; a start offset past the
/// end clamps it to zero. The destination range is first saved into a landing zone,
/// then the source is moved onto the destination with memmove semantics, then the
/// landing zone is written back over the source. When the ranges overlap, the later
/// write wins on the shared bytes, exactly as a memmove-based exchange would.
/// Equal start offsets leave the buffer unchanged.
pub fn swap_spans(buffer: &mut [u8], src_start: usize, targ_start: usize, len: usize) -> usize {
    let len = len.min(buffer.len().saturating_sub(src_start.max(targ_start)));
    if len == 0 || src_start == targ_start {
        return len;
    }

    let landing_zone = buffer[targ_start..targ_start + len].to_vec();
    buffer.copy_within(src_start..src_start + len, targ_start);
    buffer[src_start..src_start + len].copy_from_slice(&landing_zone);
    len
}

/// Repeatedly swaps two random, possibly overlapping spans of the input.
///
/// The number of swaps is `floor(swap_probability * input.len())`, and each swap
/// operates on the result of the previous one. The output always has the same
/// length as the input.
#[derive(Debug)]
pub struct SpanSwapper<R = ChaCha8Rng> {
    swap_probability: f64,
    max_span_length: usize,
    rng: R,
}

impl SpanSwapper<ChaCha8Rng> {
    pub fn new(swap_probability: f64, max_span_length: usize) -> Result<Self, MutationError> {
        Self::with_rng(swap_probability, max_span_length, entropy_rng()?)
    }

    pub fn seeded(
        swap_probability: f64,
        max_span_length: usize,
        seed: u64,
    ) -> Result<Self, MutationError> {
        Self::with_rng(swap_probability, max_span_length, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> SpanSwapper<R> {
    pub fn with_rng(
        swap_probability: f64,
        max_span_length: usize,
        rng: R,
    ) -> Result<Self, MutationError> {
        Ok(Self {
            swap_probability: check_probability("swap_probability", swap_probability)?,
            max_span_length: check_span_bound("max_span_length", max_span_length)?,
            rng,
        })
    }

    pub fn swap_probability(&self) -> f64 {
        self.swap_probability
    }

    pub fn max_span_length(&self) -> usize {
        self.max_span_length
    }

    /// Returns the number of swaps performed.
    fn swap_all(&mut self, buffer: &mut [u8]) -> usize {
        let len = buffer.len();
        let num_swaps = (self.swap_probability * len as f64).floor() as usize;

        for _ in 0..num_swaps {
            let src_start = self.rng.random_range(0..len);
            let targ_start = self.rng.random_range(0..len);
            let candidate = self.rng.random_range(0..self.max_span_length);
            let applied = swap_spans(buffer, src_start, targ_start, candidate);
            trace!(src_start, targ_start, len = applied, "swapped spans");
        }
        num_swaps
    }
}

impl<R: Rng + Send> Mutator for SpanSwapper<R> {
    fn name(&self) -> &'static str {
        "SpanSwapper"
    }

    fn transform(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
        let mut output = input.to_vec();
        self.transform_in_place(&mut output)?;
        Ok(output)
    }

    fn transform_in_place(&mut self, buffer: &mut Vec<u8>) -> Result<(), MutationError> {
        let swaps = self.swap_all(buffer);
        debug!(mutator = self.name(), len = buffer.len(), swaps, "transform complete");
        Ok(())
    }
}
