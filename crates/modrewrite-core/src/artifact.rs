//! Artifact coordinates, version selectors and removal patterns

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing artifact references
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("Artifact reference '{text}' needs between {min} and {max} ':'-separated segments")]
    SegmentCount { text: String, min: usize, max: usize },

    #[error("Artifact reference '{0}' has an empty groupId or artifactId")]
    EmptySegment(String),
}

/// An artifact resource of a module descriptor
///
/// Textual form is `group:artifact[:version[:classifier]]`, optionally wrapped
/// in `${...}` when the descriptor leaves the version to be resolved later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub classifier: Option<String>,
    /// Written as `${...}` in the descriptor
    pub expression: bool,
}

impl ArtifactCoordinate {
    /// `group:artifact[:version[:classifier]]` without any `${}` wrapper
    pub fn coordinates(&self) -> String {
        let mut text = format!("{}:{}", self.group_id, self.artifact_id);
        match (&self.version, &self.classifier) {
            (Some(v), Some(c)) => text.push_str(&format!(":{}:{}", v, c)),
            (Some(v), None) => text.push_str(&format!(":{}", v)),
            (None, Some(c)) => text.push_str(&format!("::{}", c)),
            (None, None) => {}
        }
        text
    }

    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            classifier: None,
            expression: false,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn parse(text: &str) -> Result<Self, CoordinateError> {
        let trimmed = text.trim();
        let (body, expression) = match trimmed.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
            Some(inner) => (inner, true),
            None => (trimmed, false),
        };

        let parts = split_segments(body, text, 4)?;
        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: optional_segment(&parts, 2),
            classifier: optional_segment(&parts, 3),
            expression,
        })
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.coordinates();
        if self.expression {
            write!(f, "${{{}}}", text)
        } else {
            f.write_str(&text)
        }
    }
}

impl TryFrom<String> for ArtifactCoordinate {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArtifactCoordinate> for String {
    fn from(value: ArtifactCoordinate) -> Self {
        value.to_string()
    }
}

/// Selects the artifacts whose version `force-artifact-version:` overrides
///
/// Textual form is `groupId:artifactId[:type[:classifier]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactSelector {
    pub group_id: String,
    pub artifact_id: String,
    /// Recorded for display; descriptor artifacts carry no packaging
    pub packaging: Option<String>,
    pub classifier: Option<String>,
}

impl ArtifactSelector {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            packaging: None,
            classifier: None,
        }
    }

    pub fn parse(text: &str) -> Result<Self, CoordinateError> {
        let parts = split_segments(text.trim(), text, 4)?;
        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            packaging: optional_segment(&parts, 2),
            classifier: optional_segment(&parts, 3),
        })
    }

    /// Check whether an artifact resource is the one this selector names
    pub fn matches(&self, artifact: &ArtifactCoordinate) -> bool {
        if self.group_id != artifact.group_id || self.artifact_id != artifact.artifact_id {
            return false;
        }
        match &self.classifier {
            Some(classifier) => artifact.classifier.as_deref() == Some(classifier.as_str()),
            None => true,
        }
    }
}

impl fmt::Display for ArtifactSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        match (&self.packaging, &self.classifier) {
            (Some(p), Some(c)) => write!(f, ":{}:{}", p, c),
            (Some(p), None) => write!(f, ":{}", p),
            (None, Some(c)) => write!(f, "::{}", c),
            (None, None) => Ok(()),
        }
    }
}

/// Pattern naming resources to drop from a descriptor
///
/// Interpreted as a glob when the text is a valid glob, otherwise compared
/// literally.
#[derive(Debug, Clone)]
pub struct ArtifactPattern {
    raw: String,
    glob: Option<glob::Pattern>,
}

impl ArtifactPattern {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let glob = glob::Pattern::new(&raw).ok();
        Self { raw, glob }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.raw == text {
            return true;
        }
        self.glob.as_ref().is_some_and(|g| g.matches(text))
    }
}

impl PartialEq for ArtifactPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ArtifactPattern {}

impl fmt::Display for ArtifactPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_segments<'a>(body: &'a str, original: &str, max: usize) -> Result<Vec<&'a str>, CoordinateError> {
    let parts: Vec<&str> = body.split(':').map(str::trim).collect();
    if parts.len() < 2 || parts.len() > max {
        return Err(CoordinateError::SegmentCount {
            text: original.trim().to_string(),
            min: 2,
            max,
        });
    }
    if parts[0].is_empty() || parts[1].is_empty() {
        return Err(CoordinateError::EmptySegment(original.trim().to_string()));
    }
    Ok(parts)
}

fn optional_segment(parts: &[&str], index: usize) -> Option<String> {
    parts
        .get(index)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
