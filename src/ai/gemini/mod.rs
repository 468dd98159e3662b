mod client;
mod generation;
mod types;

pub use client::GeminiHttpClient;
pub use generation::GeminiClient;
