//! Persistence of generated images
//!
//! Menu card images come back from the provider as bytes; an [`ImageStore`]
//! writes them somewhere durable and reports where.

pub mod mock;
pub mod store;

pub use mock::MockImageStore;
pub use store::FileImageStore;

use crate::models::GeneratedImage;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Save `image` under a name derived from `subject`; returns the path written.
    async fn save(&self, subject: &str, image: &GeneratedImage) -> Result<PathBuf>;
}
