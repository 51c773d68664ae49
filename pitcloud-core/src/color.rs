//! Coloring and classification-filter configuration

use serde::{Deserialize, Serialize};

/// How points are colored.
///
/// The serde representation matches the mode tokens of the engine API, so a
/// dashboard config file round-trips through the same strings the engine
/// consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// Captured sensor color
    #[serde(rename = "rgb")]
    OriginalColor,
    /// Elevation gradient
    #[serde(rename = "height")]
    Elevation,
    /// Return-intensity gradient
    #[serde(rename = "intensity")]
    Intensity,
    /// LAS classification palette
    #[serde(rename = "classification")]
    Classification,
    /// Crack-severity analysis view over the classification channel
    #[serde(rename = "cracking")]
    CrackSeverity,
}

impl ColorMode {
    /// Engine-side token for this mode.
    pub fn as_token(&self) -> &'static str {
        match self {
            ColorMode::OriginalColor => "rgb",
            ColorMode::Elevation => "height",
            ColorMode::Intensity => "intensity",
            ColorMode::Classification => "classification",
            ColorMode::CrackSeverity => "cracking",
        }
    }

    /// Parse an engine-side token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "rgb" => Some(ColorMode::OriginalColor),
            "height" => Some(ColorMode::Elevation),
            "intensity" => Some(ColorMode::Intensity),
            "classification" => Some(ColorMode::Classification),
            "cracking" => Some(ColorMode::CrackSeverity),
            _ => None,
        }
    }
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::OriginalColor
    }
}

/// Numeric min/max reinterpretation of the classification channel.
///
/// Different analysis views (crack severity, micro-movement severity) map
/// the same underlying field through different bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRange {
    pub min: f32,
    pub max: f32,
}

impl ClassificationRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Which classification values are visible.
///
/// Filtering is expressed to the optimizer as size-zero rendering of
/// excluded points, never as geometry removal, so point indices stay stable
/// across filter toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationFilter {
    /// No restriction
    All,
    /// Only the listed class values are rendered
    Only(Vec<u8>),
}

impl ClassificationFilter {
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, ClassificationFilter::All)
    }

    /// Whether a class value passes the filter.
    pub fn allows(&self, class: u8) -> bool {
        match self {
            ClassificationFilter::All => true,
            ClassificationFilter::Only(classes) => classes.contains(&class),
        }
    }

    /// The visible class values, or `None` when unrestricted.
    pub fn visible_classes(&self) -> Option<&[u8]> {
        match self {
            ClassificationFilter::All => None,
            ClassificationFilter::Only(classes) => Some(classes),
        }
    }
}

impl Default for ClassificationFilter {
    fn default() -> Self {
        ClassificationFilter::All
    }
}

/// Complete coloring configuration for a session.
///
/// Mutated only through the session's synchronization protocol; the render
/// loop never writes to it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColoringConfig {
    pub mode: ColorMode,
    pub classification_range: Option<ClassificationRange>,
    pub classification_filter: ClassificationFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_mapping_round_trips() {
        for mode in [
            ColorMode::OriginalColor,
            ColorMode::Elevation,
            ColorMode::Intensity,
            ColorMode::Classification,
            ColorMode::CrackSeverity,
        ] {
            assert_eq!(ColorMode::from_token(mode.as_token()), Some(mode));
        }
        assert_eq!(ColorMode::OriginalColor.as_token(), "rgb");
        assert_eq!(ColorMode::Elevation.as_token(), "height");
        assert_eq!(ColorMode::CrackSeverity.as_token(), "cracking");
        assert_eq!(ColorMode::from_token("morton"), None);
    }

    #[test]
    fn test_filter_allows() {
        let all = ClassificationFilter::All;
        assert!(all.allows(7));
        assert!(all.visible_classes().is_none());

        let only = ClassificationFilter::Only(vec![2, 3]);
        assert!(only.allows(2));
        assert!(!only.allows(4));
        assert_eq!(only.visible_classes(), Some(&[2, 3][..]));
    }
}
