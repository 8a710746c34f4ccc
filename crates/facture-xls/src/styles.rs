//! BIFF8 style record parsing.
//!
//! Parses FONT, FORMAT, XF, and PALETTE records from the workbook globals
//! stream and resolves them into `facture_core::Style` objects.

use std::collections::HashMap;

use facture_core::style::{
    Alignment, Border, BorderEdge, Color, DiagonalDirection, Fill, Font, HorizontalAlignment,
    LineStyle, NumberFormat, PatternType, Protection, Style, Underline, VerticalAlignment,
};

use crate::biff::parser::{read_u16, read_u32};
use crate::biff::strings::{read_short_string, read_unicode_string};
use crate::error::{XlsError, XlsResult};

/// The standard BIFF8 color palette. Indices 8–63 in the workbook map to
/// entries 0–55 here; a PALETTE record can override individual entries.
pub(crate) const DEFAULT_PALETTE: [(u8, u8, u8); 56] = [
    (0, 0, 0),       //  8: Black
    (255, 255, 255), //  9: White
    (255, 0, 0),     // 10: Red
    (0, 255, 0),     // 11: Bright Green
    (0, 0, 255),     // 12: Blue
    (255, 255, 0),   // 13: Yellow
    (255, 0, 255),   // 14: Pink
    (0, 255, 255),   // 15: Turquoise
    (128, 0, 0),     // 16: Dark Red
    (0, 128, 0),     // 17: Green
    (0, 0, 128),     // 18: Dark Blue
    (128, 128, 0),   // 19: Dark Yellow
    (128, 0, 128),   // 20: Violet
    (0, 128, 128),   // 21: Teal
    (192, 192, 192), // 22: Silver (25% Gray)
    (128, 128, 128), // 23: Gray (50% Gray)
    (153, 153, 255), // 24: Periwinkle
    (153, 51, 102),  // 25: Plum
    (255, 255, 204), // 26: Ivory
    (204, 255, 255), // 27: Light Turquoise
    (102, 0, 102),   // 28: Dark Purple
    (255, 128, 128), // 29: Coral
    (0, 102, 204),   // 30: Ocean Blue
    (204, 204, 255), // 31: Ice Blue
    (0, 0, 128),     // 32: Dark Blue (dup)
    (255, 0, 255),   // 33: Pink (dup)
    (255, 255, 0),   // 34: Yellow (dup)
    (0, 255, 255),   // 35: Turquoise (dup)
    (128, 0, 128),   // 36: Violet (dup)
    (128, 0, 0),     // 37: Dark Red (dup)
    (0, 128, 128),   // 38: Teal (dup)
    (0, 0, 255),     // 39: Blue (dup)
    (0, 204, 255),   // 40: Sky Blue
    (204, 255, 255), // 41: Light Turquoise (dup)
    (204, 255, 204), // 42: Light Green
    (255, 255, 153), // 43: Light Yellow
    (153, 204, 255), // 44: Pale Blue
    (255, 153, 204), // 45: Rose
    (204, 153, 255), // 46: Lavender
    (255, 204, 153), // 47: Tan
    (51, 102, 255),  // 48: Light Blue
    (51, 204, 204),  // 49: Aqua
    (153, 204, 0),   // 50: Lime
    (255, 204, 0),   // 51: Gold
    (255, 153, 0),   // 52: Light Orange
    (255, 102, 0),   // 53: Orange
    (102, 102, 153), // 54: Blue-Gray
    (150, 150, 150), // 55: 40% Gray
    (0, 51, 102),    // 56: Dark Teal
    (51, 153, 102),  // 57: Sea Green
    (0, 51, 0),      // 58: Dark Green
    (51, 51, 0),     // 59: Olive Green
    (153, 51, 0),    // 60: Brown
    (153, 51, 51),   // 61: Dark Rose
    (51, 51, 153),   // 62: Indigo
    (51, 51, 51),    // 63: 80% Gray
];

/// Parsed FONT record data.
#[derive(Debug, Clone)]
pub(crate) struct BiffFont {
    /// Font height in twips (1/20 of a point).
    pub height_twips: u16,
    pub bold: bool,
    pub italic: bool,
    pub underline: u8,
    pub strikethrough: bool,
    /// Palette color index for the font.
    pub color_index: u16,
    pub name: String,
}

/// Parsed XF record data (20 bytes in BIFF8).
#[derive(Debug, Clone)]
pub(crate) struct BiffXf {
    pub font_index: u16,
    pub format_index: u16,
    pub locked: bool,
    pub hidden: bool,
    // Alignment
    pub hor_align: u8,
    pub vert_align: u8,
    pub wrap_text: bool,
    pub shrink_to_fit: bool,
    pub indent: u8,
    pub rotation: u8,
    // Borders, as line style codes (0–13)
    pub border_left: u8,
    pub border_right: u8,
    pub border_top: u8,
    pub border_bottom: u8,
    pub border_diag: u8,
    // Border color indices
    pub icv_left: u16,
    pub icv_right: u16,
    pub icv_top: u16,
    pub icv_bottom: u16,
    pub icv_diag: u16,
    pub diagonal_dir: u8,
    // Fill
    pub fill_pattern: u8,
    pub icv_fore: u16,
    pub icv_back: u16,
}

/// All style data collected from the workbook globals stream.
pub(crate) struct StyleContext {
    pub fonts: Vec<BiffFont>,
    pub formats: HashMap<u16, String>,
    pub xfs: Vec<BiffXf>,
    pub palette: [(u8, u8, u8); 56],
}

impl StyleContext {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            formats: HashMap::new(),
            xfs: Vec::new(),
            palette: DEFAULT_PALETTE,
        }
    }

    /// Build the resolved style table (one `Style` per XF record).
    pub fn build_style_table(&self) -> Vec<Style> {
        self.xfs.iter().map(|xf| self.resolve_xf(xf)).collect()
    }

    fn resolve_xf(&self, xf: &BiffXf) -> Style {
        Style {
            font: self.resolve_font(xf.font_index),
            fill: self.resolve_fill(xf),
            border: self.resolve_border(xf),
            alignment: self.resolve_alignment(xf),
            number_format: self.resolve_number_format(xf.format_index),
            protection: Protection {
                locked: xf.locked,
                hidden: xf.hidden,
            },
        }
    }

    fn resolve_font(&self, font_index: u16) -> Font {
        // BIFF8 quirk: font index 4 is skipped in the file, so index 5
        // refers to fonts[4], index 6 to fonts[5], and so on.
        let actual = if font_index >= 5 {
            (font_index - 1) as usize
        } else {
            font_index as usize
        };

        let bf = match self.fonts.get(actual) {
            Some(f) => f,
            None => return Font::default(),
        };

        Font {
            name: bf.name.clone(),
            size: bf.height_twips as f64 / 20.0,
            bold: bf.bold,
            italic: bf.italic,
            underline: match bf.underline {
                0x01 => Underline::Single,
                0x02 => Underline::Double,
                0x21 => Underline::SingleAccounting,
                0x22 => Underline::DoubleAccounting,
                _ => Underline::None,
            },
            strikethrough: bf.strikethrough,
            color: self.resolve_color(bf.color_index),
        }
    }

    fn resolve_fill(&self, xf: &BiffXf) -> Fill {
        let pat = pattern_from_biff(xf.fill_pattern);

        match pat {
            PatternType::None => Fill::None,
            PatternType::Solid => {
                // Solid fill uses the foreground color slot
                let color = self.resolve_color(xf.icv_fore);
                if color == Color::Auto {
                    Fill::None
                } else {
                    Fill::Solid { color }
                }
            }
            _ => Fill::Pattern {
                pattern: pat,
                foreground: self.resolve_color(xf.icv_fore),
                background: self.resolve_color(xf.icv_back),
            },
        }
    }

    fn resolve_border(&self, xf: &BiffXf) -> Border {
        let make_edge = |line_code: u8, icv: u16| -> Option<BorderEdge> {
            let style = line_style_from_biff(line_code);
            if matches!(style, LineStyle::None) {
                None
            } else {
                Some(BorderEdge {
                    style,
                    color: self.resolve_color(icv),
                })
            }
        };

        Border {
            left: make_edge(xf.border_left, xf.icv_left),
            right: make_edge(xf.border_right, xf.icv_right),
            top: make_edge(xf.border_top, xf.icv_top),
            bottom: make_edge(xf.border_bottom, xf.icv_bottom),
            diagonal: make_edge(xf.border_diag, xf.icv_diag),
            diagonal_direction: match xf.diagonal_dir {
                1 => DiagonalDirection::Down,
                2 => DiagonalDirection::Up,
                3 => DiagonalDirection::Both,
                _ => DiagonalDirection::None,
            },
        }
    }

    pub(crate) fn resolve_alignment(&self, xf: &BiffXf) -> Alignment {
        let horizontal = match xf.hor_align {
            1 => HorizontalAlignment::Left,
            2 => HorizontalAlignment::Center,
            3 => HorizontalAlignment::Right,
            4 => HorizontalAlignment::Fill,
            5 => HorizontalAlignment::Justify,
            6 => HorizontalAlignment::CenterContinuous,
            7 => HorizontalAlignment::Distributed,
            _ => HorizontalAlignment::General,
        };

        let vertical = match xf.vert_align {
            0 => VerticalAlignment::Top,
            1 => VerticalAlignment::Center,
            3 => VerticalAlignment::Justify,
            4 => VerticalAlignment::Distributed,
            _ => VerticalAlignment::Bottom,
        };

        // BIFF rotation: 0 = none, 1–90 = CCW degrees, 91–180 = CW stored
        // as value-90, 255 = vertical text.
        let rotation = match xf.rotation {
            r @ 1..=90 => r as i16,
            r @ 91..=180 => -((r as i16) - 90),
            255 => 255,
            _ => 0,
        };

        Alignment {
            horizontal,
            vertical,
            wrap_text: xf.wrap_text,
            shrink_to_fit: xf.shrink_to_fit,
            indent: xf.indent,
            rotation,
        }
    }

    fn resolve_number_format(&self, fmt_id: u16) -> NumberFormat {
        if fmt_id == 0 {
            return NumberFormat::General;
        }
        if let Some(code) = self.formats.get(&fmt_id) {
            return NumberFormat::Custom(code.clone());
        }
        NumberFormat::BuiltIn(fmt_id as u32)
    }

    pub(crate) fn resolve_color(&self, icv: u16) -> Color {
        match icv {
            8..=63 => {
                let (r, g, b) = self.palette[(icv - 8) as usize];
                Color::Rgb { r, g, b }
            }
            // System window text and window background
            0x0040 => Color::BLACK,
            0x0041 => Color::WHITE,
            0x7FFF => Color::Auto,
            // Indices 0–7 are the EGA colors; some writers still use them
            0..=7 => {
                let ega: [(u8, u8, u8); 8] = [
                    (0, 0, 0),
                    (255, 255, 255),
                    (255, 0, 0),
                    (0, 255, 0),
                    (0, 0, 255),
                    (255, 255, 0),
                    (255, 0, 255),
                    (0, 255, 255),
                ];
                let (r, g, b) = ega[icv as usize];
                Color::Rgb { r, g, b }
            }
            _ => Color::Auto,
        }
    }
}

/// Parse a FONT record (0x0031).
///
/// Layout:
///   0  u16  dyHeight   - font height in twips (1/20 pt)
///   2  u16  grbit      - flags (bit 1 = italic, bit 3 = strikethrough)
///   4  u16  icv        - color index
///   6  u16  bls        - bold weight (400 = normal, 700 = bold)
///   8  u16  sss        - super/subscript (ignored)
///  10  u8   uls        - underline type
///  11  u8   bFamily    - font family (ignored)
///  12  u8   bCharSet   - character set (ignored)
///  13  u8   reserved
///  14  ...  font name  - short string (1-byte length prefix)
pub(crate) fn parse_font(data: &[u8]) -> XlsResult<BiffFont> {
    if data.len() < 15 {
        return Err(XlsError::Parse("FONT record too short".into()));
    }

    let mut off = 0;
    let height = read_u16(data, &mut off)?;
    let grbit = read_u16(data, &mut off)?;
    let icv = read_u16(data, &mut off)?;
    let bls = read_u16(data, &mut off)?;
    let _sss = read_u16(data, &mut off)?;
    let uls = data[off];
    off += 4; // uls + family + charset + reserved

    let name = if off < data.len() {
        read_short_string(data, &mut off).unwrap_or_default()
    } else {
        String::new()
    };

    Ok(BiffFont {
        height_twips: height,
        italic: (grbit & 0x0002) != 0,
        strikethrough: (grbit & 0x0008) != 0,
        bold: bls >= 700,
        underline: uls,
        color_index: icv,
        name,
    })
}

/// Parse a FORMAT record (0x041E): u16 format index + unicode string.
pub(crate) fn parse_format(data: &[u8]) -> XlsResult<(u16, String)> {
    let mut off = 0;
    let ifmt = read_u16(data, &mut off)?;
    let code = read_unicode_string(data, &mut off)?;
    Ok((ifmt, code))
}

/// Parse an XF record (0x00E0, always 20 bytes in BIFF8).
///
/// Layout (see [MS-XLS] §2.4.353):
///   0   u16  ifnt          - font index
///   2   u16  ifmt          - format index
///   4   u16  type/protect  - bits 0-1 lock/hidden, bit 2 style-xf
///   6   u8   alignment1    - bits 0-2 halign, bit 3 wrap, bits 4-6 valign
///   7   u8   trot          - text rotation
///   8   u8   alignment2    - bits 0-3 indent, bit 4 shrink
///   9   u8   used_attribs  - (ignored)
///  10   u32  border lines/colors 1
///  14   u32  border lines/colors 2 + fill pattern
///  18   u16  fill colors
pub(crate) fn parse_xf(data: &[u8]) -> XlsResult<BiffXf> {
    if data.len() < 20 {
        return Err(XlsError::Parse(format!(
            "XF record too short: {} bytes (expected 20)",
            data.len()
        )));
    }

    let mut off = 0;
    let ifnt = read_u16(data, &mut off)?;
    let ifmt = read_u16(data, &mut off)?;
    let type_prot = read_u16(data, &mut off)?;

    let align1 = data[off];
    let rotation = data[off + 1];
    let align2 = data[off + 2];
    off += 4; // align1 + trot + align2 + used_attribs

    let border1 = read_u32(data, &mut off)?;
    let border2 = read_u32(data, &mut off)?;
    let fill_colors = read_u16(data, &mut off)?;

    Ok(BiffXf {
        font_index: ifnt,
        format_index: ifmt,
        locked: (type_prot & 0x0001) != 0,
        hidden: (type_prot & 0x0002) != 0,
        hor_align: align1 & 0x07,
        wrap_text: (align1 & 0x08) != 0,
        vert_align: (align1 >> 4) & 0x07,
        rotation,
        indent: align2 & 0x0F,
        shrink_to_fit: (align2 & 0x10) != 0,
        border_left: (border1 & 0x0F) as u8,
        border_right: ((border1 >> 4) & 0x0F) as u8,
        border_top: ((border1 >> 8) & 0x0F) as u8,
        border_bottom: ((border1 >> 12) & 0x0F) as u8,
        icv_left: ((border1 >> 16) & 0x7F) as u16,
        icv_right: ((border1 >> 23) & 0x7F) as u16,
        diagonal_dir: ((border1 >> 30) & 0x03) as u8,
        icv_top: (border2 & 0x7F) as u16,
        icv_bottom: ((border2 >> 7) & 0x7F) as u16,
        icv_diag: ((border2 >> 14) & 0x7F) as u16,
        border_diag: ((border2 >> 21) & 0x0F) as u8,
        fill_pattern: ((border2 >> 26) & 0x3F) as u8,
        icv_fore: fill_colors & 0x7F,
        icv_back: (fill_colors >> 7) & 0x7F,
    })
}

/// Apply a PALETTE record: u16 color count + count × (R, G, B, 0x00).
pub(crate) fn apply_palette(data: &[u8], palette: &mut [(u8, u8, u8); 56]) -> XlsResult<()> {
    if data.len() < 2 {
        return Err(XlsError::Parse("PALETTE record too short".into()));
    }

    let mut off = 0;
    let count = read_u16(data, &mut off)? as usize;

    for entry in palette.iter_mut().take(count) {
        if off + 4 > data.len() {
            break;
        }
        *entry = (data[off], data[off + 1], data[off + 2]);
        off += 4;
    }

    Ok(())
}

/// Map a BIFF border line code (0–13) to a `LineStyle`.
fn line_style_from_biff(code: u8) -> LineStyle {
    match code {
        1 => LineStyle::Thin,
        2 => LineStyle::Medium,
        3 => LineStyle::Dashed,
        4 => LineStyle::Dotted,
        5 => LineStyle::Thick,
        6 => LineStyle::Double,
        7 => LineStyle::Hair,
        8 => LineStyle::MediumDashed,
        9 => LineStyle::DashDot,
        10 => LineStyle::MediumDashDot,
        11 => LineStyle::DashDotDot,
        12 => LineStyle::MediumDashDotDot,
        13 => LineStyle::SlantDashDot,
        _ => LineStyle::None,
    }
}

/// Map a BIFF fill pattern code (0–18) to a `PatternType`.
fn pattern_from_biff(code: u8) -> PatternType {
    match code {
        1 => PatternType::Solid,
        2 => PatternType::MediumGray,
        3 => PatternType::DarkGray,
        4 => PatternType::LightGray,
        5 => PatternType::DarkHorizontal,
        6 => PatternType::DarkVertical,
        7 => PatternType::DarkDown,
        8 => PatternType::DarkUp,
        9 => PatternType::DarkGrid,
        10 => PatternType::DarkTrellis,
        11 => PatternType::LightHorizontal,
        12 => PatternType::LightVertical,
        13 => PatternType::LightDown,
        14 => PatternType::LightUp,
        15 => PatternType::LightGrid,
        16 => PatternType::LightTrellis,
        17 => PatternType::Gray125,
        18 => PatternType::Gray0625,
        _ => PatternType::None,
    }
}
