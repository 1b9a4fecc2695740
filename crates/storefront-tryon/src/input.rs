//! Job input and output documents.

use serde::{Deserialize, Serialize};

/// Garment category understood by the try-on model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Tops,
    Bottoms,
    #[default]
    OnePieces,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tops => "tops",
            Category::Bottoms => "bottoms",
            Category::OnePieces => "one-pieces",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "tops" => Some(Category::Tops),
            "bottoms" => Some(Category::Bottoms),
            "one-pieces" => Some(Category::OnePieces),
            _ => None,
        }
    }
}

/// Input submitted to the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryOnInput {
    /// Shopper photo as a data URL.
    pub model_image: String,
    /// URL of the garment to put on.
    pub garment_image: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputImage {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Output of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TryOnOutput {
    #[serde(default)]
    pub images: Vec<OutputImage>,
}

impl TryOnOutput {
    /// The image shown as the try-on result.
    pub fn first_image_url(&self) -> Option<&str> {
        self.images.first().map(|image| image.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_wire_shape() {
        let input = TryOnInput {
            model_image: "data:image/png;base64,AA==".to_string(),
            garment_image: "https://i.ibb.co/w6qrDXB/dress.png".to_string(),
            category: Category::OnePieces,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["category"], "one-pieces");
        assert_eq!(json["model_image"], "data:image/png;base64,AA==");
    }

    #[test]
    fn test_output_first_image() {
        let output: TryOnOutput = serde_json::from_str(
            r#"{"images":[{"url":"https://v3.fal.media/a.png","content_type":"image/png"},{"url":"b"}]}"#,
        )
        .unwrap();
        assert_eq!(output.first_image_url(), Some("https://v3.fal.media/a.png"));
        assert_eq!(TryOnOutput::default().first_image_url(), None);
    }

    #[test]
    fn test_category_names_match_serde() {
        for category in [Category::Tops, Category::Bottoms, Category::OnePieces] {
            assert_eq!(Category::parse(category.as_str()), Some(category));
            assert_eq!(serde_json::to_value(category).unwrap(), category.as_str());
        }
    }
}
