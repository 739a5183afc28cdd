//! Status and classification enums.
//!
//! All enums are persisted as UPPER_SNAKE text and parsed leniently on read:
//! unknown or missing values fall back to a safe default rather than failing
//! the whole row.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Content classification chosen by the uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    Text,
    Comic,
    News,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "TEXT",
            ContentKind::Comic => "COMIC",
            ContentKind::News => "NEWS",
        }
    }

    /// Parse a persisted value; unknown values default to `Text`.
    pub fn parse(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "COMIC" => ContentKind::Comic,
            "NEWS" => ContentKind::News,
            _ => ContentKind::Text,
        }
    }

    /// Parse a request value; unknown values are rejected.
    pub fn try_parse(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "TEXT" => Some(ContentKind::Text),
            "COMIC" => Some(ContentKind::Comic),
            "NEWS" => Some(ContentKind::News),
            _ => None,
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Who can see the upload once a story is built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Private,
    Unlisted,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
            Visibility::Unlisted => "UNLISTED",
        }
    }

    /// Parse a persisted value; unknown values default to `Public`.
    pub fn parse(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "PRIVATE" => Visibility::Private,
            "UNLISTED" => Visibility::Unlisted,
            _ => Visibility::Public,
        }
    }

    /// Parse a request value; unknown values are rejected.
    pub fn try_parse(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "PUBLIC" => Some(Visibility::Public),
            "PRIVATE" => Some(Visibility::Private),
            "UNLISTED" => Some(Visibility::Unlisted),
            _ => None,
        }
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Story-facing lifecycle of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryStatus {
    Draft,
    OcrInProgress,
    Ready,
    Published,
    Failed,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Draft => "DRAFT",
            StoryStatus::OcrInProgress => "OCR_IN_PROGRESS",
            StoryStatus::Ready => "READY",
            StoryStatus::Published => "PUBLISHED",
            StoryStatus::Failed => "FAILED",
        }
    }

    /// Parse a persisted value; unknown values default to `Draft`.
    pub fn parse(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "OCR_IN_PROGRESS" => StoryStatus::OcrInProgress,
            "READY" => StoryStatus::Ready,
            "PUBLISHED" => StoryStatus::Published,
            "FAILED" => StoryStatus::Failed,
            _ => StoryStatus::Draft,
        }
    }
}

impl Display for StoryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Processing lifecycle of an upload or one of its images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "PENDING",
            ProcessingStatus::Processing => "PROCESSING",
            ProcessingStatus::Completed => "COMPLETED",
            ProcessingStatus::Failed => "FAILED",
        }
    }

    /// Parse a persisted value; unknown values default to `Pending`.
    pub fn parse(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "PROCESSING" => ProcessingStatus::Processing,
            "COMPLETED" => ProcessingStatus::Completed,
            "FAILED" => ProcessingStatus::Failed,
            _ => ProcessingStatus::Pending,
        }
    }

    /// Terminal means no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ProcessingStatus::parse("completed"), ProcessingStatus::Completed);
        assert_eq!(StoryStatus::parse("ocr_in_progress"), StoryStatus::OcrInProgress);
        assert_eq!(Visibility::parse("unlisted"), Visibility::Unlisted);
        assert_eq!(ContentKind::parse("comic"), ContentKind::Comic);
    }

    #[test]
    fn parse_defaults_on_unknown() {
        assert_eq!(ProcessingStatus::parse("bogus"), ProcessingStatus::Pending);
        assert_eq!(StoryStatus::parse(""), StoryStatus::Draft);
        assert_eq!(Visibility::parse("?"), Visibility::Public);
        assert_eq!(ContentKind::parse("unknown"), ContentKind::Text);
    }

    #[test]
    fn try_parse_rejects_unknown_request_values() {
        assert_eq!(ContentKind::try_parse("COMIC"), Some(ContentKind::Comic));
        assert_eq!(ContentKind::try_parse("VIDEO"), None);
        assert_eq!(Visibility::try_parse("public"), Some(Visibility::Public));
        assert_eq!(Visibility::try_parse("SECRET"), None);
    }

    #[test]
    fn serde_uses_upper_snake() {
        let json = serde_json::to_string(&StoryStatus::OcrInProgress).unwrap();
        assert_eq!(json, "\"OCR_IN_PROGRESS\"");
        let back: StoryStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StoryStatus::OcrInProgress);
    }

    #[test]
    fn terminal_statuses() {
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
        assert!(!ProcessingStatus::Pending.is_terminal());
        assert!(!ProcessingStatus::Processing.is_terminal());
    }
}
