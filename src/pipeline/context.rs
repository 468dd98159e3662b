use super::StepError;
use std::any::Any;
use std::fmt;

type Output = Box<dyn Any + Send + Sync>;

/// Per-run record of the pipeline input and every finished step's output.
///
/// Projections only ever see `&PipelineContext`, and the pipeline inserts each
/// step name at most once, so earlier outputs are never overwritten.
pub struct PipelineContext<In> {
    input: In,
    outputs: Vec<(String, Output)>,
}

impl<In> PipelineContext<In> {
    pub(crate) fn new(input: In) -> Self {
        Self {
            input,
            outputs: Vec::new(),
        }
    }

    pub fn input(&self) -> &In {
        &self.input
    }

    /// Typed output of an earlier step.
    pub fn get<T: 'static>(&self, step: &str) -> Result<&T, StepError> {
        self.entry(step)?
            .downcast_ref::<T>()
            .ok_or_else(|| Self::wrong_type::<T>(step))
    }

    pub fn contains(&self, step: &str) -> bool {
        self.outputs.iter().any(|(name, _)| name == step)
    }

    /// Names of the steps that have produced output, in execution order.
    pub fn step_names(&self) -> Vec<String> {
        self.outputs.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Move one step's output out of a finished run.
    pub fn take<T: 'static>(&mut self, step: &str) -> Result<T, StepError> {
        let position = self
            .outputs
            .iter()
            .position(|(name, _)| name == step)
            .ok_or_else(|| Self::missing(step))?;

        if !self.outputs[position].1.is::<T>() {
            return Err(Self::wrong_type::<T>(step));
        }

        let (_, output) = self.outputs.remove(position);
        output
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| Self::wrong_type::<T>(step))
    }

    pub fn into_input(self) -> In {
        self.input
    }

    pub(crate) fn insert(&mut self, step: &str, output: Output) -> Result<(), StepError> {
        if self.contains(step) {
            return Err(StepError::Dependency(format!(
                "output for step '{}' already recorded",
                step
            )));
        }
        self.outputs.push((step.to_string(), output));
        Ok(())
    }

    fn entry(&self, step: &str) -> Result<&Output, StepError> {
        self.outputs
            .iter()
            .find(|(name, _)| name == step)
            .map(|(_, output)| output)
            .ok_or_else(|| Self::missing(step))
    }

    fn missing(step: &str) -> StepError {
        StepError::Dependency(format!("no output recorded for step '{}'", step))
    }

    fn wrong_type<T>(step: &str) -> StepError {
        StepError::Dependency(format!(
            "output of step '{}' is not a {}",
            step,
            std::any::type_name::<T>()
        ))
    }
}

impl<In: fmt::Debug> fmt::Debug for PipelineContext<In> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("input", &self.input)
            .field("steps", &self.step_names())
            .finish()
    }
}
