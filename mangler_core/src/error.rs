use thiserror::Error;

/// Errors that can occur while constructing or running a mutator.
///
/// Malformed input content is never an error: arbitrary bytes are the expected
/// input domain. Only bad parameters, buffers too short for the requested
/// operation, and resource failures are reported.
#[derive(Error, Debug)]
pub enum MutationError {
    /// A construction parameter was out of range (a probability outside `[0, 1]`
    /// or a zero span bound).
    #[error("Invalid configuration for `{parameter}`: {reason}")]
    InvalidConfiguration {
        parameter: &'static str,
        reason: String,
    },

    /// The input buffer is too short for the mutator to pick any valid offset.
    #[error("{strategy} cannot mutate an input of length {len}")]
    InvalidInputLength { strategy: &'static str, len: usize },

    /// The operating system entropy source could not seed a generator.
    #[error("Failed to seed generator from OS entropy: {0}")]
    Entropy(String),

    /// A configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The output buffer could not grow by the requested number of bytes.
    #[error("Failed to allocate {requested} more bytes for mutation output")]
    Allocation { requested: usize },

    #[error("Mutation I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepts `value` only if it lies in `[0, 1]`. NaN is rejected.
pub(crate) fn check_probability(
    parameter: &'static str,
    value: f64,
) -> Result<f64, MutationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(MutationError::InvalidConfiguration {
            parameter,
            reason: format!("expected a fraction in [0, 1], got {value}"),
        })
    }
}

pub(crate) fn check_span_bound(
    parameter: &'static str,
    value: usize,
) -> Result<usize, MutationError> {
    if value == 0 {
        return Err(MutationError::InvalidConfiguration {
            parameter,
            reason: "span bound must be positive".to_string(),
        });
    }
    Ok(value)
}
