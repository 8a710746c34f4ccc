//! Formatting vocabulary: fonts, colors, fills, borders, alignment,
//! number formats.

use std::fmt;

/// Color representation.
///
/// Covers the forms found in spreadsheet files: RGB, ARGB, theme
/// references, and the legacy indexed palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Automatic/default color
    #[default]
    Auto,
    /// RGB color (no alpha)
    Rgb { r: u8, g: u8, b: u8 },
    /// ARGB color with alpha channel
    Argb { a: u8, r: u8, g: u8, b: u8 },
    /// Theme color with tint stored as an i8 percentage
    Theme { index: u8, tint: i8 },
    /// Indexed color (legacy palette)
    Indexed(u8),
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color::Argb { a, r, g, b }
    }

    /// Parse "#FF0000", "FF0000", or 8-digit ARGB hex.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::Rgb { r, g, b })
            }
            8 => {
                let a = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let r = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let g = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let b = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Color::Argb { a, r, g, b })
            }
            _ => None,
        }
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
}

/// Font settings for a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub name: String,
    /// Size in points
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: Underline,
    pub strikethrough: bool,
    pub color: Color,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size: 11.0,
            bold: false,
            italic: false,
            underline: Underline::None,
            strikethrough: false,
            color: Color::Auto,
        }
    }
}

impl Font {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl std::hash::Hash for Font {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        // f64 hashed via bit pattern
        self.size.to_bits().hash(state);
        self.bold.hash(state);
        self.italic.hash(state);
        self.underline.hash(state);
        self.strikethrough.hash(state);
        self.color.hash(state);
    }
}

impl Eq for Font {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    /// Single underline extending to cell width
    SingleAccounting,
    DoubleAccounting,
}

/// Cell background fill.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Fill {
    #[default]
    None,
    Solid {
        color: Color,
    },
    Pattern {
        pattern: PatternType,
        foreground: Color,
        background: Color,
    },
}

/// Fill pattern types from the file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternType {
    None,
    Solid,
    MediumGray,
    DarkGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    DarkDown,
    DarkUp,
    DarkGrid,
    DarkTrellis,
    LightHorizontal,
    LightVertical,
    LightDown,
    LightUp,
    LightGrid,
    LightTrellis,
    Gray125,
    Gray0625,
}

/// One edge of a cell border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorderEdge {
    pub style: LineStyle,
    pub color: Color,
}

impl BorderEdge {
    pub fn new(style: LineStyle) -> Self {
        Self {
            style,
            color: Color::Auto,
        }
    }

    pub fn thin() -> Self {
        Self::new(LineStyle::Thin)
    }
}

/// Border line styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

/// Diagonal border direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiagonalDirection {
    #[default]
    None,
    Down,
    Up,
    Both,
}

/// Borders on all edges of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Border {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
    pub diagonal: Option<BorderEdge>,
    pub diagonal_direction: DiagonalDirection,
}

impl Border {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same edge on all four sides.
    pub fn all(edge: BorderEdge) -> Self {
        Self {
            left: Some(edge),
            right: Some(edge),
            top: Some(edge),
            bottom: Some(edge),
            diagonal: None,
            diagonal_direction: DiagonalDirection::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    Top,
    Center,
    #[default]
    Bottom,
    Justify,
    Distributed,
}

/// Text alignment within a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub wrap_text: bool,
    pub shrink_to_fit: bool,
    pub indent: u8,
    /// Text rotation in degrees (-90..=90, or 255 for vertical)
    pub rotation: i16,
}

/// Number format for a cell.
///
/// Built-in formats are referenced by their well-known ids (14 is the
/// locale short date, 44 accounting); anything else travels as a custom
/// format code string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    #[default]
    General,
    BuiltIn(u32),
    Custom(String),
}

impl NumberFormat {
    /// Locale short date (built-in id 14).
    pub fn short_date() -> Self {
        NumberFormat::BuiltIn(14)
    }
}

impl fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberFormat::General => write!(f, "General"),
            NumberFormat::BuiltIn(id) => write!(f, "builtin:{}", id),
            NumberFormat::Custom(code) => write!(f, "{}", code),
        }
    }
}
