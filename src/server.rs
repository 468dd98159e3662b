//! HTTP API over the recipe and menu pipelines.
//!
//! Endpoints:
//! - GET /            - API documentation
//! - GET /health      - Health check
//! - POST /api/recipe - Generate a recipe
//! - POST /api/menu   - Generate a themed menu and its design

use crate::app::App;
use crate::models::{MenuRequest, RecipeRequest};
use crate::{Error, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "Menu Forge API";

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// `POST /api/menu` body: a [`MenuRequest`] plus whether to render the card.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuApiRequest {
    #[serde(flatten)]
    request: MenuRequest,
    #[serde(default)]
    generate_image: bool,
}

struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn invalid_json(e: serde_json::Error) -> Self {
        warn!("Rejected request body: {}", e);
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: "Invalid JSON".to_string(),
                message: format!("Please provide valid JSON input: {}", e),
            },
        }
    }

    /// Input validation failures are the caller's fault; everything else is ours.
    fn generation_failed(failure: &str, err: Error) -> Self {
        match &err {
            Error::Pipeline(e) if e.error.is_validation() => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorResponse {
                    error: "Invalid Request".to_string(),
                    message: e.error.to_string(),
                },
            },
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: ErrorResponse {
                    error: failure.to_string(),
                    message: err.to_string(),
                },
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> std::result::Result<T, ApiError> {
    serde_json::from_slice(body).map_err(ApiError::invalid_json)
}

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/", get(api_docs))
        .route("/health", get(health_check))
        .route("/api/recipe", post(create_recipe).options(preflight))
        .route("/api/menu", post(create_menu).options(preflight))
        .layer(middleware::map_response(add_cors_headers))
        .with_state(app)
}

/// Bind `0.0.0.0:port` and serve until the process is stopped.
pub async fn serve(app: Arc<App>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("{} listening on http://{}", SERVICE_NAME, listener.local_addr()?);
    info!("API documentation: GET http://localhost:{}/", port);

    axum::serve(listener, router(app)).await?;
    Ok(())
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

async fn api_docs() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/recipe": {
                "description": "Generate a recipe for a given food name",
                "input": {
                    "foodName": "Name of the food (required)",
                    "dietaryRestrictions": "Optional dietary restrictions",
                    "difficulty": "Optional difficulty level (easy, medium, hard)",
                    "servingSize": "Optional number of servings"
                }
            },
            "POST /api/menu": {
                "description": "Generate a themed restaurant menu and its visual design",
                "input": {
                    "name": "Restaurant name (required)",
                    "theme": "Restaurant theme (required)",
                    "cuisineType": "Cuisine type (required)",
                    "priceRange": "Optional: budget, mid-range, upscale or fine-dining",
                    "atmosphere": "Optional atmosphere description",
                    "specialFeature": "Optional special feature",
                    "generateImage": "Optional, render and save a menu card image"
                }
            },
            "GET /health": "Health check endpoint"
        },
        "example_request": {
            "foodName": "Chicken Tikka Masala",
            "dietaryRestrictions": "gluten-free",
            "difficulty": "medium",
            "servingSize": 6
        }
    }))
}

async fn create_recipe(State(app): State<Arc<App>>, body: Bytes) -> Response {
    let request: RecipeRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    match app.generate_recipe(request).await {
        Ok(recipe) => Json(recipe).into_response(),
        Err(e) => ApiError::generation_failed("Recipe Generation Failed", e).into_response(),
    }
}

async fn create_menu(State(app): State<Arc<App>>, body: Bytes) -> Response {
    let MenuApiRequest {
        request,
        generate_image,
    } = match parse_body(&body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    match app.generate_menu(request, generate_image).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => ApiError::generation_failed("Menu Generation Failed", e).into_response(),
    }
}
