//! Data models and structures
//!
//! Request and result types for the recipe and menu flows, plus runtime
//! configuration loaded from the environment.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DIFFICULTY: &str = "medium";
pub const DEFAULT_SERVINGS: u32 = 4;
pub const DEFAULT_DIETARY_RESTRICTIONS: &str = "none";

pub const PRICE_RANGES: &[&str] = &["budget", "mid-range", "upscale", "fine-dining"];
pub const DEFAULT_PRICE_RANGE: &str = "mid-range";
pub const DEFAULT_ATMOSPHERE: &str = "welcoming and comfortable";

pub const MENU_LAYOUTS: &[&str] = &["single-page", "bi-fold", "tri-fold", "chalkboard"];

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !is_blank(v))
}

// Recipe flow

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    #[serde(default)]
    pub food_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<u32>,
}

impl RecipeRequest {
    pub fn new(food_name: &str) -> Self {
        Self {
            food_name: food_name.to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if is_blank(&self.food_name) {
            return Err("foodName is required".to_string());
        }
        Ok(())
    }

    pub fn difficulty_or_default(&self) -> &str {
        non_blank(&self.difficulty).unwrap_or(DEFAULT_DIFFICULTY)
    }

    pub fn servings_or_default(&self) -> u32 {
        self.serving_size.filter(|s| *s > 0).unwrap_or(DEFAULT_SERVINGS)
    }

    pub fn dietary_restrictions_or_default(&self) -> &str {
        non_blank(&self.dietary_restrictions).unwrap_or(DEFAULT_DIETARY_RESTRICTIONS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub prep_time: String,
    pub cook_time: String,
    pub total_time: String,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<String>,
}

// Menu flow

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub cuisine_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atmosphere: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_feature: Option<String>,
}

impl MenuRequest {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("name", &self.name),
            ("theme", &self.theme),
            ("cuisineType", &self.cuisine_type),
        ] {
            if is_blank(value) {
                return Err(format!("{} is required", field));
            }
        }

        if let Some(price_range) = non_blank(&self.price_range) {
            if !PRICE_RANGES.contains(&price_range) {
                return Err(format!(
                    "priceRange must be one of: {}",
                    PRICE_RANGES.join(", ")
                ));
            }
        }
        Ok(())
    }

    pub fn price_range_or_default(&self) -> &str {
        non_blank(&self.price_range).unwrap_or(DEFAULT_PRICE_RANGE)
    }

    pub fn atmosphere_or_default(&self) -> &str {
        non_blank(&self.atmosphere).unwrap_or(DEFAULT_ATMOSPHERE)
    }

    pub fn special_feature(&self) -> Option<&str> {
        non_blank(&self.special_feature)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub price_range: String,
    pub appetizers: Vec<MenuItem>,
    pub main_courses: Vec<MenuItem>,
    pub desserts: Vec<MenuItem>,
    pub beverages: Vec<MenuItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_feature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chef_note: Option<String>,
}

impl Menu {
    pub fn dish_names(&self) -> Vec<&str> {
        self.appetizers
            .iter()
            .chain(&self.main_courses)
            .chain(&self.desserts)
            .map(|item| item.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuDesign {
    pub style: String,
    pub layout: String,
    pub color_palette: ColorPalette,
    pub typography: Typography,
    pub decorative_elements: Vec<String>,
    pub image_prompt: String,
}

/// Decoded image bytes from an image-generation step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub mime_type: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuResult {
    pub menu: Menu,
    pub design: MenuDesign,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_image_path: Option<String>,
    /// Set when a card image was requested but could not be saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_image_error: Option<String>,
}

mod base64_bytes {
    use super::*;
    use base64::Engine as _;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}

// Configuration

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Gemini,
    OpenAi,
}

impl AiProvider {
    pub fn default_text_model(self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini-2.0-flash",
            AiProvider::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn default_image_model(self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini-2.0-flash-preview-image-generation",
            AiProvider::OpenAi => "gpt-image-1",
        }
    }

    pub fn api_key_var(self) -> &'static str {
        match self {
            AiProvider::Gemini => "GEMINI_API_KEY",
            AiProvider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl FromStr for AiProvider {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" | "googleai" => Ok(AiProvider::Gemini),
            "openai" => Ok(AiProvider::OpenAi),
            other => Err(crate::Error::Config(format!(
                "Unknown AI_PROVIDER '{}'. Expected 'gemini' or 'openai'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: AiProvider,
    pub api_key: String,
    pub text_model: String,
    pub image_model: String,
    pub output_dir: PathBuf,
    pub port: u16,
    pub request_timeout: Duration,
    pub max_retries: usize,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !is_blank(v));

        let provider = match var("AI_PROVIDER") {
            Some(value) => value.parse()?,
            None => AiProvider::Gemini,
        };

        let api_key = var(provider.api_key_var()).ok_or_else(|| {
            crate::Error::Config(format!("{} not set", provider.api_key_var()))
        })?;

        Ok(Self {
            provider,
            api_key,
            text_model: var("TEXT_MODEL")
                .unwrap_or_else(|| provider.default_text_model().to_string()),
            image_model: var("IMAGE_MODEL")
                .unwrap_or_else(|| provider.default_image_model().to_string()),
            output_dir: PathBuf::from(var("OUTPUT_DIR").unwrap_or_else(|| "output".to_string())),
            port: parse_var(&var, "PORT", 8080)?,
            request_timeout: Duration::from_secs(parse_var(&var, "REQUEST_TIMEOUT_SECS", 120)?),
            max_retries: parse_var(&var, "AI_MAX_RETRIES", 2)?,
        })
    }
}

fn parse_var<T, F>(var: &F, key: &str, default: T) -> crate::Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| crate::Error::Config(format!("Invalid value for {}: '{}'", key, raw))),
        None => Ok(default),
    }
}
