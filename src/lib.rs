//! Menu Forge - structured recipe and restaurant menu generation
//!
//! Chains AI generation calls into typed pipelines: every step's reply is
//! checked against an expected shape before later steps may read it. Served
//! over HTTP or driven from the command line.

pub mod ai;
pub mod app;
pub mod error;
pub mod flows;
pub mod image;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod shape;

pub use error::{Error, Result};
