use crate::ai::{GenerationClient, GenerationRequest};
use crate::models::{Recipe, RecipeRequest};
use crate::pipeline::{Pipeline, Step};
use crate::shape::ExpectedShape;
use crate::{prompts, Result};
use std::sync::Arc;

pub const RECIPE_STEP: &str = "recipe";

pub fn recipe_shape() -> ExpectedShape {
    ExpectedShape::new("recipe")
        .string("name")
        .string("description")
        .string("difficulty")
        .string("prepTime")
        .string("cookTime")
        .string("totalTime")
        .integer("servings")
        .string_list("ingredients")
        .string_list("instructions")
        .optional_string_list("tips")
        .optional_string("nutrition")
}

pub fn recipe_request(input: &RecipeRequest) -> GenerationRequest {
    let servings = input.servings_or_default().to_string();
    let prompt = prompts::render(
        prompts::RECIPE_USER,
        &[
            ("food", input.food_name.trim()),
            ("difficulty", input.difficulty_or_default()),
            ("servings", &servings),
            ("dietary", input.dietary_restrictions_or_default()),
        ],
    );

    GenerationRequest::text(prompt).with_system(prompts::RECIPE_SYSTEM)
}

/// The model may leave the name blank or servings at zero; fall back to what
/// was asked for.
fn fill_requested_fields(input: &RecipeRequest, mut recipe: Recipe) -> Recipe {
    if recipe.name.trim().is_empty() {
        recipe.name = input.food_name.trim().to_string();
    }
    if recipe.servings == 0 {
        recipe.servings = input.servings_or_default();
    }
    recipe
}

pub fn recipe_step() -> Step<RecipeRequest, Recipe> {
    Step::new(recipe_shape(), recipe_request).with_normalizer(fill_requested_fields)
}

pub fn recipe_pipeline(client: Arc<dyn GenerationClient>) -> Result<Pipeline<RecipeRequest>> {
    Pipeline::<RecipeRequest>::builder("recipe", client)
        .validate_input(RecipeRequest::validate)
        .stage(RECIPE_STEP, recipe_step(), |ctx| Ok(ctx.input().clone()))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockGenerationClient;
    use crate::pipeline::StepError;
    use serde_json::json;

    fn carbonara() -> serde_json::Value {
        json!({
            "name": "Pasta Carbonara",
            "description": "Roman pasta with egg and guanciale",
            "difficulty": "medium",
            "prepTime": "10 minutes",
            "cookTime": "15 minutes",
            "totalTime": "25 minutes",
            "servings": 4,
            "ingredients": ["400g spaghetti", "150g guanciale", "4 egg yolks"],
            "instructions": ["Boil pasta", "Crisp guanciale", "Toss with yolks"],
            "tips": ["Work off the heat"]
        })
    }

    #[test]
    fn test_recipe_request_renders_defaults() {
        let request = recipe_request(&RecipeRequest::new("Pasta Carbonara"));

        assert!(request.prompt().contains("\"Pasta Carbonara\""));
        assert!(request.prompt().contains("Difficulty level: medium"));
        assert!(request.prompt().contains("Servings: 4"));
        assert!(request.prompt().contains("Dietary restrictions: none"));
        assert_eq!(request.system(), Some(prompts::RECIPE_SYSTEM));
    }

    #[tokio::test]
    async fn test_recipe_pipeline_returns_recipe() {
        let client = MockGenerationClient::new().with_response(carbonara());
        let pipeline = recipe_pipeline(Arc::new(client)).unwrap();

        let mut ctx = pipeline.run(RecipeRequest::new("Pasta Carbonara")).await.unwrap();
        let recipe: Recipe = ctx.take(RECIPE_STEP).unwrap();

        assert_eq!(recipe.ingredients.len(), 3);
        assert_eq!(recipe.tips, Some(vec!["Work off the heat".to_string()]));
        assert_eq!(recipe.nutrition, None);
    }

    #[tokio::test]
    async fn test_recipe_pipeline_fills_blank_name_and_servings() {
        let mut reply = carbonara();
        reply["name"] = json!("");
        reply["servings"] = json!(0);
        let client = MockGenerationClient::new().with_response(reply);
        let pipeline = recipe_pipeline(Arc::new(client)).unwrap();

        let mut request = RecipeRequest::new("Chicken Tikka Masala");
        request.serving_size = Some(6);
        let mut ctx = pipeline.run(request).await.unwrap();
        let recipe: Recipe = ctx.take(RECIPE_STEP).unwrap();

        assert_eq!(recipe.name, "Chicken Tikka Masala");
        assert_eq!(recipe.servings, 6);
    }

    #[tokio::test]
    async fn test_recipe_pipeline_rejects_blank_food_name() {
        let client = MockGenerationClient::new().with_response(carbonara());
        let probe = client.clone();
        let pipeline = recipe_pipeline(Arc::new(client)).unwrap();

        let err = pipeline.run(RecipeRequest::new(" ")).await.unwrap_err();

        assert!(matches!(err.error, StepError::Validation(_)));
        assert_eq!(probe.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_recipe_pipeline_reports_missing_instructions() {
        let mut reply = carbonara();
        reply.as_object_mut().unwrap().remove("instructions");
        let client = MockGenerationClient::new().with_response(reply);
        let pipeline = recipe_pipeline(Arc::new(client)).unwrap();

        let err = pipeline
            .run(RecipeRequest::new("Pasta Carbonara"))
            .await
            .unwrap_err();

        assert_eq!(err.step, RECIPE_STEP);
        assert_eq!(err.error.field_path(), Some("instructions"));
    }
}
