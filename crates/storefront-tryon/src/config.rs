//! Try-on configuration.

use serde::{Deserialize, Serialize};

use crate::input::Category;

/// Queue app running the try-on model.
pub const DEFAULT_APP_ID: &str = "fashn/tryon";

/// Garment used when the product has none configured.
pub const DEFAULT_GARMENT_IMAGE: &str = "https://i.ibb.co/w6qrDXB/dress.png";

/// Queue base URL.
pub const DEFAULT_QUEUE_URL: &str = "https://queue.fal.run";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TryOnConfig {
    pub app_id: String,
    pub garment_image: String,
    pub category: Category,
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            garment_image: DEFAULT_GARMENT_IMAGE.to_string(),
            category: Category::OnePieces,
        }
    }
}
