use menu_forge::{
    ai::{GenerationClient, MockGenerationClient},
    app::{App, AppServices},
    flows::{
        menu::{menu_shape, menu_step},
        menu_pipeline, MENU_STEP,
    },
    image::FileImageStore,
    models::{Menu, MenuRequest},
    pipeline::{Pipeline, StepError},
    shape::ViolationReason,
    Error,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn zen_garden_request() -> MenuRequest {
    MenuRequest {
        name: "Zen Garden Bistro".to_string(),
        theme: "minimalist zen garden".to_string(),
        cuisine_type: "Japanese fusion".to_string(),
        price_range: Some("fine-dining".to_string()),
        atmosphere: Some("peaceful and serene".to_string()),
        special_feature: None,
    }
}

fn item(name: &str, description: &str, price: &str) -> Value {
    json!({ "name": name, "description": description, "price": price })
}

fn zen_garden_menu() -> Value {
    json!({
        "name": "Zen Garden Bistro",
        "tagline": "Where every plate is a quiet garden",
        "description": "Refined Japanese fusion served among raked stone and bamboo.",
        "priceRange": "fine-dining",
        "appetizers": [
            item("Moss Garden Edamame", "Charred edamame with matcha salt", "$14"),
            item("Koi Pond Crudo", "Hamachi, yuzu and shiso", "$22")
        ],
        "mainCourses": [
            item("Stone Path Black Cod", "Miso-glazed cod on pebbles of rice", "$48"),
            item("Bamboo Grove Wagyu", "A5 wagyu with bamboo shoot puree", "$95")
        ],
        "desserts": [
            item("Raked Sand Parfait", "Black sesame and white chocolate", "$16")
        ],
        "beverages": [
            item("Ceremonial Matcha", "Whisked tableside", "$12")
        ],
        "specialFeature": "Seasonal omakase in the tea room",
        "chefNote": "Our menu follows the garden through the seasons."
    })
}

fn zen_garden_design() -> Value {
    json!({
        "style": "wabi-sabi minimalism",
        "layout": "tri-fold",
        "colorPalette": {
            "primary": "#3A4A3F",
            "secondary": "#A3B18A",
            "accent": "#C9A227",
            "background": "#F4F1EA"
        },
        "typography": { "headingFont": "Shippori Mincho", "bodyFont": "Noto Sans" },
        "decorativeElements": ["ink-brush enso", "raked sand lines"],
        "imagePrompt": "A tri-fold washi paper menu with an ink enso"
    })
}

/// The `menu` step on its own, as a one-step pipeline.
fn one_step_menu_pipeline(client: Arc<dyn GenerationClient>) -> Pipeline<MenuRequest> {
    Pipeline::<MenuRequest>::builder("menu-only", client)
        .validate_input(MenuRequest::validate)
        .stage(MENU_STEP, menu_step(), |ctx| Ok(ctx.input().clone()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_one_step_pipeline_returns_stub_payload_unchanged() {
    let client = MockGenerationClient::new().with_response(zen_garden_menu());
    let pipeline = one_step_menu_pipeline(Arc::new(client));

    let mut ctx = pipeline.run(zen_garden_request()).await.unwrap();
    let menu: Menu = ctx.take(MENU_STEP).unwrap();

    assert_eq!(serde_json::to_value(&menu).unwrap(), zen_garden_menu());
}

#[tokio::test]
async fn test_missing_tagline_is_shape_mismatch_without_context_entry() {
    let mut reply = zen_garden_menu();
    reply.as_object_mut().unwrap().remove("tagline");
    let client = MockGenerationClient::new().with_response(reply);
    let pipeline = one_step_menu_pipeline(Arc::new(client));

    let err = pipeline.run(zen_garden_request()).await.unwrap_err();

    assert_eq!(err.step, MENU_STEP);
    match &err.error {
        StepError::ShapeMismatch(violation) => {
            assert_eq!(violation.path, "tagline");
            assert_eq!(violation.reason, ViolationReason::Missing);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!err.completed.iter().any(|step| step == MENU_STEP));
}

#[tokio::test]
async fn test_price_range_enum_is_case_sensitive() {
    let mut reply = zen_garden_menu();
    reply["priceRange"] = json!("Budget");
    let client = MockGenerationClient::new().with_response(reply);
    let pipeline = one_step_menu_pipeline(Arc::new(client));

    let err = pipeline.run(zen_garden_request()).await.unwrap_err();

    assert_eq!(err.error.field_path(), Some("priceRange"));
}

#[test]
fn test_appetizer_missing_price_reports_index() {
    let mut reply = zen_garden_menu();
    reply["appetizers"][1].as_object_mut().unwrap().remove("price");

    let violation = menu_shape().validate(&reply).unwrap_err();

    assert_eq!(violation.path, "appetizers[1].price");
}

#[tokio::test]
async fn test_three_step_menu_cancelled_during_design_never_renders_card() {
    let client = MockGenerationClient::new()
        .with_response(zen_garden_menu())
        .with_hang()
        .with_response(json!({ "mimeType": "image/png", "data": "iVBORw==" }));
    let probe = client.clone();
    let pipeline = menu_pipeline(Arc::new(client), true).unwrap();

    let err = pipeline
        .run_until(
            zen_garden_request(),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    assert_eq!(err.step, "design");
    assert!(matches!(err.error, StepError::Cancelled));
    assert_eq!(err.completed, vec![MENU_STEP.to_string()]);
    assert_eq!(probe.get_call_count(), 2);
}

#[tokio::test]
async fn test_full_menu_workflow_writes_card_image() {
    let client = MockGenerationClient::new()
        .with_response(zen_garden_menu())
        .with_response(zen_garden_design())
        .with_response(json!({ "mimeType": "image/jpeg", "data": "/9j/4A==" }));
    let dir = tempfile::tempdir().unwrap();
    let app = App::with_services(
        AppServices {
            client: Arc::new(client),
            images: Box::new(FileImageStore::new(dir.path())),
        },
        Duration::from_secs(5),
    )
    .unwrap();

    let result = app.generate_menu(zen_garden_request(), true).await.unwrap();

    assert_eq!(result.design.layout, "tri-fold");
    let path = result.card_image_path.expect("card image path");
    assert!(path.ends_with(".jpg"));
    assert!(path.contains("zen_garden_bistro_"));
    assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
}

#[tokio::test]
async fn test_invalid_request_is_rejected_before_generation() {
    let client = MockGenerationClient::new().with_response(zen_garden_menu());
    let probe = client.clone();
    let app = App::with_services(
        AppServices {
            client: Arc::new(client),
            images: Box::new(FileImageStore::new(&std::env::temp_dir())),
        },
        Duration::from_secs(5),
    )
    .unwrap();

    let mut request = zen_garden_request();
    request.theme = "  ".to_string();
    let err = app.generate_menu(request, false).await.unwrap_err();

    match err {
        Error::Pipeline(e) => assert!(e.error.is_validation()),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(probe.get_call_count(), 0);
}
