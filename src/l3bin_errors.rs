use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum L3binError {
    #[error("Unknown variable name: {0}")]
    UnknownVariable(String),

    #[error("Duplicate variable name in context: {0}")]
    DuplicateVariable(String),

    #[error("Weight coefficient must be >= 0, got: {0}")]
    InvalidWeightCoefficient(f64),

    #[error("Percentage must be within [0, 100], got: {0}")]
    InvalidPercentage(i32),

    #[error("At least one variable name is required for aggregator: {0}")]
    EmptyVariableList(String),

    #[error("Unknown aggregator name: {0}")]
    UnknownAggregator(String),

    #[error("Aggregator config `{config}` does not match descriptor `{descriptor}`")]
    MismatchedConfig {
        config: String,
        descriptor: String,
    },
}
