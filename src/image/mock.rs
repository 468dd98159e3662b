use super::ImageStore;
use crate::models::GeneratedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// In-memory [`ImageStore`] that records what it was asked to save.
#[derive(Clone)]
pub struct MockImageStore {
    saved: Arc<Mutex<Vec<(String, GeneratedImage)>>>,
    base_path: PathBuf,
    should_fail: bool,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            base_path: PathBuf::from("/tmp"),
            should_fail: false,
        }
    }

    pub fn with_failure(mut self, should_fail: bool) -> Self {
        self.should_fail = should_fail;
        self
    }

    pub fn get_save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn get_saved(&self) -> Vec<(String, GeneratedImage)> {
        self.saved.lock().unwrap().clone()
    }
}

impl Default for MockImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn save(&self, subject: &str, image: &GeneratedImage) -> Result<PathBuf> {
        if self.should_fail {
            return Err(Error::Io(std::io::Error::other("Mock failure")));
        }

        let mut saved = self.saved.lock().unwrap();
        saved.push((subject.to_string(), image.clone()));
        Ok(self.base_path.join(format!("{}_{}.img", subject, saved.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_saves() {
        let store = MockImageStore::new();
        let probe = store.clone();
        let image = GeneratedImage {
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        };

        let path = store.save("card", &image).await.unwrap();

        assert_eq!(path, PathBuf::from("/tmp/card_1.img"));
        assert_eq!(probe.get_save_count(), 1);
        assert_eq!(probe.get_saved()[0].1, image);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let store = MockImageStore::new().with_failure(true);
        let image = GeneratedImage {
            mime_type: "image/png".to_string(),
            data: vec![1],
        };

        assert!(store.save("card", &image).await.is_err());
        assert_eq!(store.get_save_count(), 0);
    }
}
