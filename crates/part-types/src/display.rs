use serde::{Deserialize, Serialize};

/// Errors from display metadata validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DisplayError {
    #[error("opacity {value} outside [0, 1]")]
    OpacityOutOfRange { value: f64 },
}

/// Color of a part: a viewer color name or an RGB triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Named(String),
    Rgb([u8; 3]),
}

impl Color {
    pub fn named(name: impl Into<String>) -> Self {
        Color::Named(name.into())
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb([r, g, b])
    }

    /// RGB value for triples and for the few names the bundled parts use.
    pub fn to_rgb(&self) -> Option<[u8; 3]> {
        match self {
            Color::Rgb(rgb) => Some(*rgb),
            Color::Named(name) => match name.to_ascii_lowercase().as_str() {
                "lightgray" | "lightgrey" => Some([211, 211, 211]),
                "gray" | "grey" => Some([128, 128, 128]),
                "yellow" => Some([255, 255, 0]),
                "red" => Some([255, 0, 0]),
                "green" => Some([0, 128, 0]),
                "blue" => Some([0, 0, 255]),
                "black" => Some([0, 0, 0]),
                "white" => Some([255, 255, 255]),
                _ => None,
            },
        }
    }
}

/// Display metadata attached to a finished part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub color: Color,
    /// 0 is fully transparent, 1 fully opaque.
    opacity: f64,
}

impl DisplayOptions {
    pub fn new(color: Color, opacity: f64) -> Result<Self, DisplayError> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(DisplayError::OpacityOutOfRange { value: opacity });
        }
        Ok(Self { color, opacity })
    }

    /// Fully opaque part of the given color.
    pub fn opaque(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
        }
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn with_opacity(self, opacity: f64) -> Result<Self, DisplayError> {
        Self::new(self.color, opacity)
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self::opaque(Color::named("lightgray"))
    }
}
