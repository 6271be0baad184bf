// Content moderation provider
//
// The adapter normalizes the service's response into ModerationAnalysis at
// the boundary; stage logic only ever sees the canonical shape.

pub mod content_safety;

use async_trait::async_trait;

use crate::config::ModerationConfig;
use crate::error::Result;

/// Severity reported for one moderation category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySeverity {
    pub name: String,
    pub severity: u8,
}

/// Normalized moderation verdict for one text.
#[derive(Debug, Clone, Default)]
pub struct ModerationAnalysis {
    pub categories: Vec<CategorySeverity>,
}

impl ModerationAnalysis {
    /// The first category whose severity exceeds the floor, if any.
    pub fn flagged_above(&self, floor: u8) -> Option<&CategorySeverity> {
        self.categories.iter().find(|c| c.severity > floor)
    }
}

/// Main trait for content moderation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Analyze text and return per-category severities
    async fn analyze_text(&self, text: &str) -> Result<ModerationAnalysis>;
}

/// Factory for creating moderator instances
pub struct ModeratorFactory;

impl ModeratorFactory {
    pub fn create(config: ModerationConfig) -> Result<Box<dyn Moderator>> {
        Ok(Box::new(content_safety::ContentSafetyModerator::new(config)?))
    }
}
