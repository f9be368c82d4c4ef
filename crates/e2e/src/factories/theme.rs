//! Widget theme factory and its boundary / hostile variants

use shopbot_common::theme::{WidgetPosition, BORDER_RADIUS, FONT_SIZE, HEIGHT, WIDTH};
use shopbot_common::WidgetTheme;

use super::FactoryRng;

const FONT_FAMILIES: &[&str] = &[
    "Inter, sans-serif",
    "Roboto, sans-serif",
    "Georgia, serif",
    "Helvetica Neue, Arial, sans-serif",
];

#[derive(Debug, Clone, Default)]
pub struct ThemeFactory {
    primary_color: Option<String>,
    background_color: Option<String>,
    text_color: Option<String>,
    position: Option<WidgetPosition>,
    border_radius: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    font_family: Option<String>,
    font_size: Option<u32>,
}

impl ThemeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary_color(mut self, color: impl Into<String>) -> Self {
        self.primary_color = Some(color.into());
        self
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn with_text_color(mut self, color: impl Into<String>) -> Self {
        self.text_color = Some(color.into());
        self
    }

    pub fn with_position(mut self, position: WidgetPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_border_radius(mut self, radius: u32) -> Self {
        self.border_radius = Some(radius);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size: u32) -> Self {
        self.font_family = Some(family.into());
        self.font_size = Some(size);
        self
    }

    /// Valid theme; unspecified fields fall inside `THEME_CONSTRAINTS`.
    pub fn build(&self, rng: &mut FactoryRng) -> WidgetTheme {
        let primary = self.primary_color.clone().unwrap_or_else(|| rng.hex_color());
        WidgetTheme {
            user_bubble_color: primary.clone(),
            primary_color: primary,
            background_color: self
                .background_color
                .clone()
                .unwrap_or_else(|| "#ffffff".to_string()),
            text_color: self.text_color.clone().unwrap_or_else(|| "#1f2937".to_string()),
            bot_bubble_color: "#f3f4f6".to_string(),
            position: self.position.unwrap_or_else(|| {
                rng.pick(&[WidgetPosition::BottomRight, WidgetPosition::BottomLeft])
            }),
            border_radius: self
                .border_radius
                .unwrap_or_else(|| rng.range_u32(BORDER_RADIUS.min, BORDER_RADIUS.max)),
            width: self.width.unwrap_or_else(|| rng.range_u32(WIDTH.min, WIDTH.max)),
            height: self.height.unwrap_or_else(|| rng.range_u32(HEIGHT.min, HEIGHT.max)),
            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| rng.pick(FONT_FAMILIES).to_string()),
            font_size: self
                .font_size
                .unwrap_or_else(|| rng.range_u32(FONT_SIZE.min, FONT_SIZE.max)),
        }
    }
}

/// Which end of the constraint table a boundary theme sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

/// Every numeric field exactly on its declared limit.
pub fn boundary_theme(rng: &mut FactoryRng, bound: Bound) -> WidgetTheme {
    let pick = |c: shopbot_common::ThemeConstraint| match bound {
        Bound::Min => c.min,
        Bound::Max => c.max,
    };
    ThemeFactory::new()
        .with_border_radius(pick(BORDER_RADIUS))
        .with_size(pick(WIDTH), pick(HEIGHT))
        .with_font("Inter, sans-serif", pick(FONT_SIZE))
        .build(rng)
}

/// Every numeric field one step past its maximum.
pub fn out_of_bounds_theme(rng: &mut FactoryRng) -> WidgetTheme {
    ThemeFactory::new()
        .with_border_radius(BORDER_RADIUS.max + 1)
        .with_size(WIDTH.max + 1, HEIGHT.max + 1)
        .with_font("Inter, sans-serif", FONT_SIZE.max + 1)
        .build(rng)
}

pub fn invalid_color_theme(rng: &mut FactoryRng) -> WidgetTheme {
    ThemeFactory::new()
        .with_primary_color("not-a-color")
        .with_background_color("#gggggg")
        .with_text_color("rgb(300, 0, 0)")
        .build(rng)
}

/// Script and CSS-function payloads in every free-text field.
pub fn xss_theme(rng: &mut FactoryRng) -> WidgetTheme {
    ThemeFactory::new()
        .with_primary_color("<script>alert('xss')</script>")
        .with_background_color("url(javascript:alert(1))")
        .with_text_color("expression(alert(document.cookie))")
        .with_font("\"><img src=x onerror=alert(1)>", 14)
        .build(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopbot_common::ThemeViolation;

    #[test]
    fn test_default_theme_satisfies_constraints() {
        let mut rng = FactoryRng::from_entropy();
        for _ in 0..200 {
            let theme = ThemeFactory::new().build(&mut rng);
            assert!(theme.is_valid(), "{:?}", theme.validate());
        }
    }

    #[test]
    fn test_boundary_themes_are_valid() {
        let mut rng = FactoryRng::seeded(1);
        assert!(boundary_theme(&mut rng, Bound::Min).is_valid());
        assert!(boundary_theme(&mut rng, Bound::Max).is_valid());
    }

    #[test]
    fn test_out_of_bounds_flags_every_numeric_field() {
        let mut rng = FactoryRng::seeded(1);
        let violations = out_of_bounds_theme(&mut rng).validate();
        let out_of_range = violations
            .iter()
            .filter(|v| matches!(v, ThemeViolation::OutOfRange { .. }))
            .count();
        assert_eq!(out_of_range, 4);
    }

    #[test]
    fn test_hostile_themes_sanitize_clean() {
        let mut rng = FactoryRng::seeded(1);
        for theme in [invalid_color_theme(&mut rng), xss_theme(&mut rng)] {
            assert!(!theme.is_valid());
            assert!(theme.sanitize().is_valid());
        }
    }
}
