//! Application orchestration for recipe and menu generation.

use crate::ai::{GeminiClient, GenerationClient, OpenAiClient, RetryPolicy};
use crate::flows::{menu_pipeline, recipe_pipeline, CARD_STEP, DESIGN_STEP, MENU_STEP, RECIPE_STEP};
use crate::image::{FileImageStore, ImageStore};
use crate::models::{
    AiProvider, Config, GeneratedImage, Menu, MenuDesign, MenuRequest, MenuResult, Recipe,
    RecipeRequest,
};
use crate::pipeline::{Pipeline, PipelineContext, StepError};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Owns the generation pipelines and the image store, and runs requests
/// through them with a per-request timeout.
pub struct App {
    recipe: Pipeline<RecipeRequest>,
    menu: Pipeline<MenuRequest>,
    menu_with_card: Pipeline<MenuRequest>,
    images: Box<dyn ImageStore>,
    request_timeout: Duration,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub client: Arc<dyn GenerationClient>,
    pub images: Box<dyn ImageStore>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            recipe: recipe_pipeline(services.client.clone())?,
            menu: menu_pipeline(services.client.clone(), false)?,
            menu_with_card: menu_pipeline(services.client, true)?,
            images: services.images,
            request_timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let services = AppServices {
            client: Self::build_ai_client(config),
            images: Box::new(FileImageStore::new(&config.output_dir)),
        };
        info!("Menu card images go to {}", config.output_dir.display());

        Self::with_services(services, config.request_timeout)
    }

    fn build_ai_client(config: &Config) -> Arc<dyn GenerationClient> {
        let retry = RetryPolicy::new(config.max_retries);
        // Reuse one HTTP connection pool across text and image calls.
        let http_client = reqwest::Client::new();

        match config.provider {
            AiProvider::Gemini => {
                info!(
                    "AI provider: Gemini (text: {}, image: {})",
                    config.text_model, config.image_model
                );
                Arc::new(GeminiClient::new_with_client(
                    config.api_key.clone(),
                    config.text_model.clone(),
                    config.image_model.clone(),
                    retry,
                    http_client,
                ))
            }
            AiProvider::OpenAi => {
                info!(
                    "AI provider: OpenAI (text: {}, image: {})",
                    config.text_model, config.image_model
                );
                Arc::new(OpenAiClient::new_with_client(
                    config.api_key.clone(),
                    config.text_model.clone(),
                    config.image_model.clone(),
                    retry,
                    http_client,
                ))
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub async fn generate_recipe(&self, request: RecipeRequest) -> Result<Recipe> {
        info!("Generating recipe for '{}'", request.food_name.trim());
        let mut ctx = self
            .recipe
            .run_with_timeout(request, self.request_timeout)
            .await?;

        take_output(&mut ctx, RECIPE_STEP)
    }

    /// Run the menu pipeline; with `include_card` the generated card image is
    /// saved and its path reported in the result.
    pub async fn generate_menu(&self, request: MenuRequest, include_card: bool) -> Result<MenuResult> {
        info!(
            "Generating menu for '{}' (card image: {})",
            request.name.trim(),
            include_card
        );
        let pipeline = if include_card {
            &self.menu_with_card
        } else {
            &self.menu
        };
        let mut ctx = pipeline
            .run_with_timeout(request, self.request_timeout)
            .await?;

        let menu: Menu = take_output(&mut ctx, MENU_STEP)?;
        let design: MenuDesign = take_output(&mut ctx, DESIGN_STEP)?;

        let mut result = MenuResult {
            menu,
            design,
            card_image_path: None,
            card_image_error: None,
        };

        if include_card {
            let card: GeneratedImage = take_output(&mut ctx, CARD_STEP)?;
            match self.images.save(&result.menu.name, &card).await {
                Ok(path) => result.card_image_path = Some(path.to_string_lossy().into_owned()),
                // The menu and design are still returned; the caller sees why the card is missing.
                Err(e) => {
                    warn!("Failed to save menu card for '{}': {}", result.menu.name, e);
                    result.card_image_error = Some(format!("Failed to save menu card: {}", e));
                }
            }
        }

        Ok(result)
    }
}

fn take_output<In, T: 'static>(ctx: &mut PipelineContext<In>, step: &str) -> Result<T> {
    ctx.take::<T>(step)
        .map_err(|e: StepError| Error::Invariant(format!("Finished run is missing output: {}", e)))
}
