//! Recipe and menu flows built on the shared pipeline core
//!
//! Each flow declares its output shapes, prompt builders and projections; the
//! pipeline does the sequencing.

pub mod menu;
pub mod recipe;

pub use menu::{menu_pipeline, CARD_STEP, DESIGN_STEP, MENU_STEP};
pub use recipe::{recipe_pipeline, RECIPE_STEP};
