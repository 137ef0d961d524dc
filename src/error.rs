use thiserror::Error;

/// Failure to build an automaton.
///
/// Any byte string is a valid pattern, so the only failures are running out
/// of identifier space for states or patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("automaton needs more than {limit} states")]
    StateOverflow { limit: u64 },

    #[error("too many patterns: at most {limit} are supported")]
    PatternOverflow { limit: u64 },
}
