use crate::shape::ShapeViolation;
use thiserror::Error;

/// Classified failure of a single step.
#[derive(Error, Debug)]
pub enum StepError {
    /// Caller input is missing a required field or carries an invalid value.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("generation call failed: {0}")]
    Upstream(#[source] Box<crate::Error>),

    #[error("generation returned no usable result")]
    EmptyResult,

    #[error("result does not match the expected shape at {0}")]
    ShapeMismatch(ShapeViolation),

    #[error("cancelled before completion")]
    Cancelled,

    /// A projection asked for an earlier output that is absent or of another type.
    #[error("step input unavailable: {0}")]
    Dependency(String),
}

impl StepError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StepError::Validation(_))
    }

    /// Offending field path for shape mismatches.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            StepError::ShapeMismatch(violation) => Some(&violation.path),
            _ => None,
        }
    }
}

/// First failure of a pipeline run, tagged with the step that produced it.
#[derive(Error, Debug)]
#[error("step '{step}' failed: {error}")]
pub struct PipelineError {
    pub step: String,
    #[source]
    pub error: StepError,
    /// Steps that finished successfully before the failure, in order.
    pub completed: Vec<String>,
}
