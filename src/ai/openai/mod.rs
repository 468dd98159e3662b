mod client;
mod generation;
mod types;

pub use client::OpenAiHttpClient;
pub use generation::OpenAiClient;
