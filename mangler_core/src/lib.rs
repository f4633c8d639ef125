//! Randomized byte-stream corruption for robustness testing of parsers.
//!
//! Every mutator implements [`Mutator::transform`], a `bytes -> bytes` function
//! that never inspects content. [`ByteInjector`] grows the buffer with random
//! spans, [`SpanSwapper`] moves spans around in place, and
//! [`CompositeMutator`] chains a random selection of other mutators.

pub mod composite;
pub mod config;
pub mod error;
pub mod injector;
pub mod mutator;
pub mod swapper;

pub use composite::CompositeMutator;
pub use config::ManglerConfig;
pub use error::MutationError;
pub use injector::ByteInjector;
pub use mutator::{Mutator, entropy_rng};
pub use swapper::{SpanSwapper, swap_spans};
