use crate::error::{MutationError, check_probability, check_span_bound};
use crate::mutator::{Mutator, entropy_rng};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use tracing::{debug, trace};

/// Default fraction of input length used as the number of injected spans.
pub const DEFAULT_INJECTION_FREQUENCY: f64 = 0.1;
/// Default upper bound (inclusive) on the length of a single injected span.
pub const DEFAULT_MAX_SPAN: usize = 100;

/// One span inserted by the injector: `len` random bytes placed right after
/// the original byte at index `after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InjectedSpan {
    pub after: usize,
    pub len: usize,
}

/// Inserts spans of random bytes at random offsets of the input.
///
/// The number of spans is `floor(injection_frequency * input.len())`. Each span
/// is placed after an original byte drawn from `[0, len - 1)`, so a span never
/// precedes the first byte nor follows the last one. Several spans may land on
/// the same offset. Every original byte survives in its original order.
#[derive(Debug)]
pub struct ByteInjector<R = ChaCha8Rng> {
    injection_frequency: f64,
    max_span: usize,
    rng: R,
}

impl ByteInjector<ChaCha8Rng> {
    /// Creates an injector backed by an entropy-seeded generator.
    pub fn new(injection_frequency: f64, max_span: usize) -> Result<Self, MutationError> {
        Self::with_rng(injection_frequency, max_span, entropy_rng()?)
    }

    /// Creates an injector whose output is fully determined by `seed`.
    pub fn seeded(
        injection_frequency: f64,
        max_span: usize,
        seed: u64,
    ) -> Result<Self, MutationError> {
        Self::with_rng(injection_frequency, max_span, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> ByteInjector<R> {
    /// Creates an injector that draws from the supplied generator.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `injection_frequency` is outside `[0, 1]` or
    /// `max_span` is zero.
    pub fn with_rng(
        injection_frequency: f64,
        max_span: usize,
        rng: R,
    ) -> Result<Self, MutationError> {
        Ok(Self {
            injection_frequency: check_probability("injection_frequency", injection_frequency)?,
            max_span: check_span_bound("max_span", max_span)?,
            rng,
        })
    }

    pub fn injection_frequency(&self) -> f64 {
        self.injection_frequency
    }

    pub fn max_span(&self) -> usize {
        self.max_span
    }

    /// Runs one injection pass and returns the output together with the spans
    /// that were inserted, in output order.
    ///
    /// # Errors
    /// `InvalidInputLength` for inputs of length 0 or 1 with a positive frequency,
    /// `Allocation` if a drawn span cannot be allocated (possible when `max_span`
    /// is close to `usize::MAX`).
    pub(crate) fn inject(
        &mut self,
        input: &[u8],
    ) -> Result<(Vec<u8>, Vec<InjectedSpan>), MutationError> {
        if input.len() <= 1 && self.injection_frequency > 0.0 {
            return Err(MutationError::InvalidInputLength {
                strategy: "ByteInjector",
                len: input.len(),
            });
        }

        let num_injections = (self.injection_frequency * input.len() as f64).floor() as usize;
        if num_injections == 0 {
            return Ok((input.to_vec(), Vec::new()));
        }

        let mut offsets: Vec<usize> = (0..num_injections)
            .map(|_| self.rng.random_range(0..input.len() - 1))
            .collect();
        offsets.sort_unstable();

        let mut output = Vec::with_capacity(input.len() + num_injections);
        let mut spans = Vec::with_capacity(num_injections);
        let mut pending = offsets.into_iter().peekable();

        for (index, &byte) in input.iter().enumerate() {
            output.push(byte);
            while pending.next_if_eq(&index).is_some() {
                let span_len = self.rng.random_range(0..=self.max_span);
                let start = output.len();
                output
                    .try_reserve(span_len)
                    .map_err(|_| MutationError::Allocation { requested: span_len })?;
                output.resize(start + span_len, 0);
                self.rng.fill(&mut output[start..]);
                trace!(after = index, len = span_len, "injected span");
                spans.push(InjectedSpan {
                    after: index,
                    len: span_len,
                });
            }
        }

        Ok((output, spans))
    }
}

impl<R: Rng + Send> Mutator for ByteInjector<R> {
    fn name(&self) -> &'static str {
        "ByteInjector"
    }

    fn transform(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
        let (output, spans) = self.inject(input)?;
        debug!(
            mutator = self.name(),
            input_len = input.len(),
            output_len = output.len(),
            spans = spans.len(),
            "transform complete"
        );
        Ok(output)
    }
}
