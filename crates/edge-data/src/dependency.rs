//! Dependency tagging for semantic categorization.

/// Outbound dependency categories.
///
/// Each tag carries a default retry budget and criticality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyTag {
    /// Commerce storefront GraphQL API.
    Storefront,
    /// Product reviews provider.
    Reviews,
    /// Hosted image inference queue.
    Inference,
    /// Custom dependency with name.
    Custom(&'static str),
}

impl DependencyTag {
    /// Default max retries for this dependency type.
    pub fn default_max_retries(&self) -> u32 {
        match self {
            Self::Storefront => 1,
            // Queue submissions are not idempotent.
            Self::Inference => 0,
            Self::Reviews | Self::Custom(_) => 0,
        }
    }

    /// Whether a failure of this dependency fails the page.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Storefront)
    }

    /// Name of this dependency.
    pub fn name(&self) -> &str {
        match self {
            Self::Storefront => "storefront",
            Self::Reviews => "reviews",
            Self::Inference => "inference",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
