use super::StepError;
use crate::ai::{GenerationClient, GenerationRequest};
use crate::shape::{ExpectedShape, ShapeViolation, ViolationReason, ROOT_PATH};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

type PromptFn<I> = Box<dyn Fn(&I) -> GenerationRequest + Send + Sync>;
type NormalizeFn<I, O> = Box<dyn Fn(&I, O) -> O + Send + Sync>;

/// One generation call: build a request from `I`, validate the reply against
/// the expected shape and decode it into `O`.
pub struct Step<I, O> {
    shape: ExpectedShape,
    prompt: PromptFn<I>,
    normalize: Option<NormalizeFn<I, O>>,
    _output: PhantomData<fn() -> O>,
}

impl<I, O> Step<I, O>
where
    O: DeserializeOwned,
{
    pub fn new<F>(shape: ExpectedShape, prompt: F) -> Self
    where
        F: Fn(&I) -> GenerationRequest + Send + Sync + 'static,
    {
        Self {
            shape,
            prompt: Box::new(prompt),
            normalize: None,
            _output: PhantomData,
        }
    }

    /// Post-process a validated output, e.g. fill fields the model left blank.
    pub fn with_normalizer<F>(mut self, normalize: F) -> Self
    where
        F: Fn(&I, O) -> O + Send + Sync + 'static,
    {
        self.normalize = Some(Box::new(normalize));
        self
    }

    pub fn shape(&self) -> &ExpectedShape {
        &self.shape
    }

    pub fn request_for(&self, input: &I) -> GenerationRequest {
        (self.prompt)(input)
    }

    /// Run the step: exactly one call to `client`, no retries.
    pub async fn execute(&self, client: &dyn GenerationClient, input: &I) -> Result<O, StepError> {
        let request = self.request_for(input);

        let value = client
            .generate(&request, &self.shape)
            .await
            .map_err(|e| StepError::Upstream(Box::new(e)))?
            .filter(|v| !v.is_null())
            .ok_or(StepError::EmptyResult)?;

        let output = self.decode(value)?;

        Ok(match &self.normalize {
            Some(normalize) => normalize(input, output),
            None => output,
        })
    }

    fn decode(&self, value: Value) -> Result<O, StepError> {
        self.shape.validate(&value).map_err(StepError::ShapeMismatch)?;

        serde_json::from_value(value).map_err(|e| {
            StepError::ShapeMismatch(ShapeViolation::new(
                ROOT_PATH,
                ViolationReason::Undecodable(e.to_string()),
            ))
        })
    }
}
