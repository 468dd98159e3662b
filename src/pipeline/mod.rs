//! Sequential composition of generation steps
//!
//! A [`Pipeline`] is an ordered list of named stages. Each stage projects its
//! input out of the [`PipelineContext`] (the original input plus every earlier
//! output), runs one [`Step`], and records the result under its name. The
//! first failure ends the run; later stages are never started.

mod context;
mod error;
mod step;

pub use context::PipelineContext;
pub use error::{PipelineError, StepError};
pub use step::Step;

use crate::ai::GenerationClient;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Step name used when the pipeline input itself is rejected.
pub const INPUT_STEP: &str = "input";

type InputValidator<In> = Box<dyn Fn(&In) -> std::result::Result<(), String> + Send + Sync>;
type Projection<In, I> = Box<dyn Fn(&PipelineContext<In>) -> std::result::Result<I, StepError> + Send + Sync>;

#[async_trait]
trait Stage<In>: Send + Sync {
    fn name(&self) -> &str;

    async fn run(
        &self,
        client: &dyn GenerationClient,
        ctx: &PipelineContext<In>,
    ) -> std::result::Result<Box<dyn Any + Send + Sync>, StepError>;
}

struct BoundStep<In, I, O> {
    name: String,
    step: Step<I, O>,
    project: Projection<In, I>,
}

#[async_trait]
impl<In, I, O> Stage<In> for BoundStep<In, I, O>
where
    In: Send + Sync + 'static,
    I: Send + Sync + 'static,
    O: DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        client: &dyn GenerationClient,
        ctx: &PipelineContext<In>,
    ) -> std::result::Result<Box<dyn Any + Send + Sync>, StepError> {
        let input = (self.project)(ctx)?;
        let output = self.step.execute(client, &input).await?;
        Ok(Box::new(output))
    }
}

pub struct Pipeline<In> {
    name: String,
    client: Arc<dyn GenerationClient>,
    validate_input: Option<InputValidator<In>>,
    stages: Vec<Box<dyn Stage<In>>>,
}

impl<In> Pipeline<In>
where
    In: Send + Sync + 'static,
{
    pub fn builder(name: &str, client: Arc<dyn GenerationClient>) -> PipelineBuilder<In> {
        PipelineBuilder {
            name: name.to_string(),
            client,
            validate_input: None,
            stages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, input: In) -> std::result::Result<PipelineContext<In>, PipelineError> {
        self.run_until(input, std::future::pending()).await
    }

    pub async fn run_with_timeout(
        &self,
        input: In,
        timeout: Duration,
    ) -> std::result::Result<PipelineContext<In>, PipelineError> {
        self.run_until(input, tokio::time::sleep(timeout)).await
    }

    /// Run every stage in order unless `cancel` resolves first.
    ///
    /// A cancelled run drops the in-flight provider call and reports
    /// [`StepError::Cancelled`] against the step that was running.
    pub async fn run_until<C>(
        &self,
        input: In,
        cancel: C,
    ) -> std::result::Result<PipelineContext<In>, PipelineError>
    where
        C: Future<Output = ()> + Send,
    {
        if let Some(validate) = &self.validate_input {
            if let Err(message) = validate(&input) {
                warn!(pipeline = %self.name, "Rejected input: {}", message);
                return Err(PipelineError {
                    step: INPUT_STEP.to_string(),
                    error: StepError::Validation(message),
                    completed: Vec::new(),
                });
            }
        }

        let run_started = Instant::now();
        let mut ctx = PipelineContext::new(input);
        tokio::pin!(cancel);

        for stage in &self.stages {
            let started = Instant::now();
            info!(pipeline = %self.name, step = stage.name(), "Running step");

            let outcome = tokio::select! {
                biased;
                _ = &mut cancel => Err(StepError::Cancelled),
                result = stage.run(self.client.as_ref(), &ctx) => result,
            };

            let recorded = outcome.and_then(|output| ctx.insert(stage.name(), output));
            if let Err(error) = recorded {
                warn!(
                    pipeline = %self.name,
                    step = stage.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Step failed: {}",
                    error
                );
                return Err(PipelineError {
                    step: stage.name().to_string(),
                    error,
                    completed: ctx.step_names(),
                });
            }

            info!(
                pipeline = %self.name,
                step = stage.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Step completed"
            );
        }

        info!(
            pipeline = %self.name,
            elapsed_ms = run_started.elapsed().as_millis() as u64,
            "Pipeline completed"
        );
        Ok(ctx)
    }
}

pub struct PipelineBuilder<In> {
    name: String,
    client: Arc<dyn GenerationClient>,
    validate_input: Option<InputValidator<In>>,
    stages: Vec<Box<dyn Stage<In>>>,
}

impl<In> PipelineBuilder<In>
where
    In: Send + Sync + 'static,
{
    /// Reject the input before any step runs; failures surface as
    /// [`StepError::Validation`] on the [`INPUT_STEP`].
    pub fn validate_input<F>(mut self, validate: F) -> Self
    where
        F: Fn(&In) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validate_input = Some(Box::new(validate));
        self
    }

    /// Append a stage. `project` builds the step input from the run so far;
    /// it can only see the pipeline input and stages added before this one.
    pub fn stage<I, O, P>(mut self, name: &str, step: Step<I, O>, project: P) -> Self
    where
        I: Send + Sync + 'static,
        O: DeserializeOwned + Send + Sync + 'static,
        P: Fn(&PipelineContext<In>) -> std::result::Result<I, StepError> + Send + Sync + 'static,
    {
        self.stages.push(Box::new(BoundStep {
            name: name.to_string(),
            step,
            project: Box::new(project),
        }));
        self
    }

    pub fn build(self) -> Result<Pipeline<In>> {
        if self.stages.is_empty() {
            return Err(Error::Invariant(format!(
                "Pipeline '{}' has no steps",
                self.name
            )));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let name = stage.name();
            if name.trim().is_empty() || name == INPUT_STEP {
                return Err(Error::Invariant(format!(
                    "Pipeline '{}' has an invalid step name '{}'",
                    self.name, name
                )));
            }
            if seen.contains(&name) {
                return Err(Error::Invariant(format!(
                    "Pipeline '{}' has duplicate step '{}'",
                    self.name, name
                )));
            }
            seen.push(name);
        }

        Ok(Pipeline {
            name: self.name,
            client: self.client,
            validate_input: self.validate_input,
            stages: self.stages,
        })
    }
}
