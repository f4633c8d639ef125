use crate::error::MutationError;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

/// A `Mutator` transforms a byte buffer into a new, corrupted byte buffer.
///
/// Mutators are the core of input generation: a fuzz driver hands each one a
/// seed input and feeds the result to the parser under test. The shape of a
/// mutation (how many edits, which bounds) is fixed by the mutator's
/// configuration; the content (offsets, lengths, byte values) comes from the
/// generator the mutator owns.
///
/// Each instance owns its own generator and keeps no other state between calls,
/// so one instance per worker thread needs no synchronization.
pub trait Mutator: Send {
    /// A short static identifier, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Produces a mutated copy of `input`. The caller's buffer is left untouched.
    ///
    /// # Arguments
    /// * `input`: Any byte sequence, including the empty one.
    ///
    /// # Returns
    /// `Result<Vec<u8>, MutationError>`:
    ///   - `Ok(output)`: The mutated buffer.
    ///   - `Err(error)`: If the input is too short for this mutator or a resource
    ///     failure occurred. Content is never a reason to fail.
    fn transform(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError>;

    /// Mutates `buffer` in place. This is the explicit opt-in for callers that
    /// do not need the original bytes afterwards.
    ///
    /// On error `buffer` is left as it was.
    fn transform_in_place(&mut self, buffer: &mut Vec<u8>) -> Result<(), MutationError> {
        let output = self.transform(buffer)?;
        *buffer = output;
        Ok(())
    }
}

impl<M: Mutator + ?Sized> Mutator for Box<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn transform(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
        (**self).transform(input)
    }

    fn transform_in_place(&mut self, buffer: &mut Vec<u8>) -> Result<(), MutationError> {
        (**self).transform_in_place(buffer)
    }
}

/// Creates a fresh ChaCha8 generator seeded from operating system entropy.
///
/// This is the default generator for every mutator constructed without an
/// explicit seed.
pub fn entropy_rng() -> Result<ChaCha8Rng, MutationError> {
    ChaCha8Rng::try_from_os_rng().map_err(|e| MutationError::Entropy(e.to_string()))
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Appends `tag` to the buffer and counts its invocations through a shared counter,
    /// so the count stays observable after the mutator is boxed into a composite.
    #[derive(Debug, Clone)]
    pub struct CountingMutator {
        pub tag: u8,
        pub calls: Arc<AtomicUsize>,
    }

    impl CountingMutator {
        pub fn new(tag: u8) -> Self {
            Self {
                tag,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Mutator for CountingMutator {
        fn name(&self) -> &'static str {
            "CountingMutator"
        }

        fn transform(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut output = input.to_vec();
            output.push(self.tag);
            Ok(output)
        }
    }

    /// Always fails, to check error propagation.
    #[derive(Debug, Default)]
    pub struct FailingMutator;

    impl Mutator for FailingMutator {
        fn name(&self) -> &'static str {
            "FailingMutator"
        }

        fn transform(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
            Err(MutationError::InvalidInputLength {
                strategy: self.name(),
                len: input.len(),
            })
        }
    }
}
