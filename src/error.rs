use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlpError {
    #[error("Malformed instance: {0}")]
    MalformedInstance(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pair ({first}, {second}) fits no precedence class")]
    UnclassifiedPair { first: usize, second: usize },

    #[error("Master problem infeasible after {iterations} iterations")]
    MasterInfeasible { iterations: usize },

    #[error("Stopped after {iterations} iterations without a feasible schedule")]
    IterationLimitExceeded { iterations: usize },

    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    #[error("Cannot linearise an implication over an unbounded expression")]
    UnboundedImplication,

    #[error("Solver backend failure: {0}")]
    Backend(String),
}
