//! Cell styling
//!
//! A [`Style`] bundles font, fill, border, alignment, number format, and
//! protection. Sheets deduplicate styles through a [`StylePool`] and cells
//! carry pool indices.

mod format;
mod pool;

pub use format::{
    Alignment, Border, BorderEdge, Color, DiagonalDirection, Fill, Font, HorizontalAlignment,
    LineStyle, NumberFormat, PatternType, Underline, VerticalAlignment,
};
pub use pool::StylePool;

/// Complete cell style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub font: Font,
    pub fill: Fill,
    pub border: Border,
    pub alignment: Alignment,
    pub number_format: NumberFormat,
    pub protection: Protection,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = size;
        self
    }

    pub fn font_name<S: Into<String>>(mut self, name: S) -> Self {
        self.font.name = name.into();
        self
    }

    pub fn font_color(mut self, color: Color) -> Self {
        self.font.color = color;
        self
    }

    /// Solid background fill.
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = Fill::Solid { color };
        self
    }

    pub fn number_format<S: Into<String>>(mut self, format: S) -> Self {
        self.number_format = NumberFormat::Custom(format.into());
        self
    }

    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.alignment.horizontal = align;
        self
    }

    pub fn vertical_alignment(mut self, align: VerticalAlignment) -> Self {
        self.alignment.vertical = align;
        self
    }

    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.alignment.wrap_text = wrap;
        self
    }

    pub fn border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }
}

/// Cell protection flags, meaningful when sheet protection is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Protection {
    pub locked: bool,
    pub hidden: bool,
}

impl std::hash::Hash for Style {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.font.hash(state);
        self.fill.hash(state);
        self.border.hash(state);
        self.alignment.hash(state);
        self.number_format.hash(state);
        self.protection.hash(state);
    }
}

impl Eq for Style {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_composes() {
        let style = Style::new()
            .bold(true)
            .font_size(14.0)
            .fill_color(Color::rgb(230, 230, 250))
            .horizontal_alignment(HorizontalAlignment::Center);

        assert!(style.font.bold);
        assert_eq!(style.font.size, 14.0);
        assert_eq!(
            style.fill,
            Fill::Solid {
                color: Color::rgb(230, 230, 250)
            }
        );
        assert_eq!(style.alignment.horizontal, HorizontalAlignment::Center);
    }

    #[test]
    fn default_style_is_empty() {
        let style = Style::default();
        assert_eq!(style.fill, Fill::None);
        assert_eq!(style.number_format, NumberFormat::General);
        assert_eq!(style.border, Border::default());
    }
}
