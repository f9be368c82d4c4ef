//! Embeddable widget theme and its constraint table

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

/// Payloads the widget must never render verbatim
static UNSAFE_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<\s*/?\s*script|javascript\s*:|expression\s*\(|url\s*\(|\bon[a-z]+\s*=|<\s*[a-z]+[^>]*>)")
        .expect("valid regex")
});

static FONT_FAMILY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[A-Za-z0-9 ,'"\-]+$"#).expect("valid regex"));

/// Inclusive numeric bounds for one theme field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeConstraint {
    pub field: &'static str,
    pub min: u32,
    pub max: u32,
}

impl ThemeConstraint {
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn clamp(&self, value: u32) -> u32 {
        value.clamp(self.min, self.max)
    }
}

pub const BORDER_RADIUS: ThemeConstraint = ThemeConstraint { field: "borderRadius", min: 0, max: 24 };
pub const WIDTH: ThemeConstraint = ThemeConstraint { field: "width", min: 280, max: 600 };
pub const HEIGHT: ThemeConstraint = ThemeConstraint { field: "height", min: 400, max: 900 };
pub const FONT_SIZE: ThemeConstraint = ThemeConstraint { field: "fontSize", min: 12, max: 20 };

pub const THEME_CONSTRAINTS: [ThemeConstraint; 4] = [BORDER_RADIUS, WIDTH, HEIGHT, FONT_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetPosition {
    BottomRight,
    BottomLeft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetTheme {
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub bot_bubble_color: String,
    pub user_bubble_color: String,
    pub position: WidgetPosition,
    pub border_radius: u32,
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub font_size: u32,
}

impl Default for WidgetTheme {
    fn default() -> Self {
        Self {
            primary_color: "#6366f1".to_string(),
            background_color: "#ffffff".to_string(),
            text_color: "#1f2937".to_string(),
            bot_bubble_color: "#f3f4f6".to_string(),
            user_bubble_color: "#6366f1".to_string(),
            position: WidgetPosition::BottomRight,
            border_radius: 16,
            width: 380,
            height: 600,
            font_family: "Inter, sans-serif".to_string(),
            font_size: 14,
        }
    }
}

/// A single constraint or safety violation found on a theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeViolation {
    OutOfRange { field: &'static str, value: u32, min: u32, max: u32 },
    InvalidColor { field: &'static str, value: String },
    UnsafeValue { field: &'static str, value: String },
}

impl std::fmt::Display for ThemeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeViolation::OutOfRange { field, value, min, max } => {
                write!(f, "{} = {} outside [{}, {}]", field, value, min, max)
            }
            ThemeViolation::InvalidColor { field, value } => {
                write!(f, "{} = {:?} is not a hex color", field, value)
            }
            ThemeViolation::UnsafeValue { field, value } => {
                write!(f, "{} = {:?} contains an unsafe payload", field, value)
            }
        }
    }
}

/// Whether a string carries script or CSS-function injection.
pub fn is_unsafe_value(value: &str) -> bool {
    UNSAFE_VALUE.is_match(value)
}

pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

impl WidgetTheme {
    fn colors(&self) -> [(&'static str, &String); 5] {
        [
            ("primaryColor", &self.primary_color),
            ("backgroundColor", &self.background_color),
            ("textColor", &self.text_color),
            ("botBubbleColor", &self.bot_bubble_color),
            ("userBubbleColor", &self.user_bubble_color),
        ]
    }

    fn numeric(&self) -> [(ThemeConstraint, u32); 4] {
        [
            (BORDER_RADIUS, self.border_radius),
            (WIDTH, self.width),
            (HEIGHT, self.height),
            (FONT_SIZE, self.font_size),
        ]
    }

    /// Every violation on this theme; empty when the theme is valid.
    pub fn validate(&self) -> Vec<ThemeViolation> {
        let mut violations = Vec::new();

        for (constraint, value) in self.numeric() {
            if !constraint.contains(value) {
                violations.push(ThemeViolation::OutOfRange {
                    field: constraint.field,
                    value,
                    min: constraint.min,
                    max: constraint.max,
                });
            }
        }

        for (field, value) in self.colors() {
            if is_unsafe_value(value) {
                violations.push(ThemeViolation::UnsafeValue { field, value: value.clone() });
            } else if !is_hex_color(value) {
                violations.push(ThemeViolation::InvalidColor { field, value: value.clone() });
            }
        }

        if is_unsafe_value(&self.font_family) || !FONT_FAMILY.is_match(&self.font_family) {
            violations.push(ThemeViolation::UnsafeValue {
                field: "fontFamily",
                value: self.font_family.clone(),
            });
        }

        violations
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Clamp numeric fields into range and replace unsafe or malformed strings with defaults.
    pub fn sanitize(&self) -> WidgetTheme {
        let defaults = WidgetTheme::default();
        let color = |value: &String, fallback: &String| {
            if is_hex_color(value) {
                value.clone()
            } else {
                fallback.clone()
            }
        };

        let font_family = if is_unsafe_value(&self.font_family) || !FONT_FAMILY.is_match(&self.font_family) {
            defaults.font_family.clone()
        } else {
            self.font_family.clone()
        };

        WidgetTheme {
            primary_color: color(&self.primary_color, &defaults.primary_color),
            background_color: color(&self.background_color, &defaults.background_color),
            text_color: color(&self.text_color, &defaults.text_color),
            bot_bubble_color: color(&self.bot_bubble_color, &defaults.bot_bubble_color),
            user_bubble_color: color(&self.user_bubble_color, &defaults.user_bubble_color),
            position: self.position,
            border_radius: BORDER_RADIUS.clamp(self.border_radius),
            width: WIDTH.clamp(self.width),
            height: HEIGHT.clamp(self.height),
            font_family,
            font_size: FONT_SIZE.clamp(self.font_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme_is_valid() {
        assert!(WidgetTheme::default().is_valid());
    }

    #[test]
    fn test_out_of_bounds_reported_per_field() {
        let theme = WidgetTheme {
            border_radius: 99,
            width: 100,
            ..Default::default()
        };
        let violations = theme.validate();
        assert_eq!(violations.len(), 2);
        assert!(matches!(violations[0], ThemeViolation::OutOfRange { field: "borderRadius", .. }));
        assert!(matches!(violations[1], ThemeViolation::OutOfRange { field: "width", .. }));
    }

    #[test]
    fn test_sanitize_strips_injection() {
        let theme = WidgetTheme {
            primary_color: "<script>alert(1)</script>".to_string(),
            background_color: "url(javascript:alert(1))".to_string(),
            font_family: "expression(alert(1))".to_string(),
            font_size: 4,
            ..Default::default()
        };
        assert!(!theme.is_valid());

        let clean = theme.sanitize();
        assert!(clean.is_valid(), "{:?}", clean.validate());
        assert_eq!(clean.primary_color, "#6366f1");
        assert_eq!(clean.font_family, "Inter, sans-serif");
        assert_eq!(clean.font_size, 12);
    }

    #[test]
    fn test_unsafe_value_patterns() {
        assert!(is_unsafe_value("<img src=x onerror=alert(1)>"));
        assert!(is_unsafe_value("JavaScript:void(0)"));
        assert!(is_unsafe_value("red; background: url(http://evil)"));
        assert!(!is_unsafe_value("#ff00aa"));
        assert!(!is_unsafe_value("Helvetica Neue, Arial"));
    }

    #[test]
    fn test_theme_serializes_camel_case() {
        let json = serde_json::to_value(WidgetTheme::default()).unwrap();
        assert_eq!(json["borderRadius"], 16);
        assert_eq!(json["position"], "bottom-right");
    }
}
