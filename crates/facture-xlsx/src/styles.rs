//! styles.xml read/write helpers

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use facture_core::style::{
    Alignment, Border, BorderEdge, Color, DiagonalDirection, Fill, Font, HorizontalAlignment,
    LineStyle, NumberFormat, PatternType, Protection, Style, Underline, VerticalAlignment,
};
use facture_core::Workbook;

// === Writing ===

/// Workbook-wide style table built from the per-sheet pools.
///
/// Sheets deduplicate styles locally; the file format wants one global
/// cellXfs list, so this maps each sheet's local indices onto global ids.
#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// Deduplicated styles; the vector index is the cellXfs xf id.
    styles: Vec<Style>,
    /// Per-sheet mapping: local style index -> global xf id.
    sheet_maps: Vec<HashMap<u32, u32>>,
}

#[derive(Debug, Clone, Copy)]
struct ResolvedXfIds {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    num_fmt_id: u32,
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut styles: Vec<Style> = Vec::new();
        let mut style_to_xf: HashMap<Style, u32> = HashMap::new();

        // Index 0 is always the default style
        let default = Style::default();
        styles.push(default.clone());
        style_to_xf.insert(default, 0);

        let mut sheet_maps: Vec<HashMap<u32, u32>> = Vec::with_capacity(workbook.sheet_count());

        for sheet in workbook.worksheets() {
            let mut map: HashMap<u32, u32> = HashMap::new();
            map.insert(0, 0);

            for (_row, _col, cell) in sheet.iter_cells() {
                let local_idx = cell.style_index;
                if local_idx == 0 || map.contains_key(&local_idx) {
                    continue;
                }

                let style = sheet
                    .style_by_index(local_idx)
                    .cloned()
                    .unwrap_or_default();

                let xf_id = match style_to_xf.get(&style) {
                    Some(&id) => id,
                    None => {
                        let id = styles.len() as u32;
                        styles.push(style.clone());
                        style_to_xf.insert(style, id);
                        id
                    }
                };

                map.insert(local_idx, xf_id);
            }

            sheet_maps.push(map);
        }

        Self { styles, sheet_maps }
    }

    pub(crate) fn xf_id_for(&self, sheet_index: usize, local_style_index: u32) -> u32 {
        self.sheet_maps
            .get(sheet_index)
            .and_then(|m| m.get(&local_style_index).copied())
            .unwrap_or(0)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut font_ids: HashMap<Font, u32> = HashMap::new();
        let mut fonts: Vec<Font> = Vec::new();
        let default_font = Font::default();
        fonts.push(default_font.clone());
        font_ids.insert(default_font, 0);

        let mut fill_ids: HashMap<Fill, u32> = HashMap::new();
        let mut fills: Vec<Fill> = Vec::new();
        // The file format requires the first two fills to be none and gray125
        fills.push(Fill::None);
        fills.push(Fill::Pattern {
            pattern: PatternType::Gray125,
            foreground: Color::Auto,
            background: Color::Auto,
        });
        fill_ids.insert(Fill::None, 0);

        let mut border_ids: HashMap<Border, u32> = HashMap::new();
        let mut borders: Vec<Border> = Vec::new();
        let default_border = Border::default();
        borders.push(default_border.clone());
        border_ids.insert(default_border, 0);

        // Custom number formats get ids from 164 up
        let mut numfmt_ids: HashMap<String, u32> = HashMap::new();
        let mut numfmts: Vec<(u32, String)> = Vec::new();
        let mut next_numfmt_id: u32 = 164;

        let mut resolved: Vec<ResolvedXfIds> = Vec::with_capacity(self.styles.len());

        for style in &self.styles {
            let font_id = match font_ids.get(&style.font) {
                Some(&id) => id,
                None => {
                    let id = fonts.len() as u32;
                    fonts.push(style.font.clone());
                    font_ids.insert(style.font.clone(), id);
                    id
                }
            };

            let fill_id = match &style.fill {
                Fill::None => 0,
                other => {
                    if let Some(&id) = fill_ids.get(other) {
                        id
                    } else {
                        let id = fills.len() as u32;
                        fills.push(other.clone());
                        fill_ids.insert(other.clone(), id);
                        id
                    }
                }
            };

            let border_id = match border_ids.get(&style.border) {
                Some(&id) => id,
                None => {
                    let id = borders.len() as u32;
                    borders.push(style.border.clone());
                    border_ids.insert(style.border.clone(), id);
                    id
                }
            };

            let num_fmt_id = match &style.number_format {
                NumberFormat::General => 0,
                NumberFormat::BuiltIn(id) => *id,
                NumberFormat::Custom(code) => {
                    if let Some(&id) = numfmt_ids.get(code) {
                        id
                    } else {
                        let id = next_numfmt_id;
                        next_numfmt_id += 1;
                        numfmt_ids.insert(code.clone(), id);
                        numfmts.push((id, code.clone()));
                        id
                    }
                }
            };

            resolved.push(ResolvedXfIds {
                font_id,
                fill_id,
                border_id,
                num_fmt_id,
            });
        }

        let mut xml = String::new();
        xml.push_str(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !numfmts.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", numfmts.len()));
            for (id, code) in &numfmts {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml_attr(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        xml.push_str(&format!("\n  <fonts count=\"{}\">", fonts.len()));
        for font in &fonts {
            xml.push_str("\n    ");
            xml.push_str(&write_font(font));
        }
        xml.push_str("\n  </fonts>");

        xml.push_str(&format!("\n  <fills count=\"{}\">", fills.len()));
        for fill in &fills {
            xml.push_str("\n    ");
            xml.push_str(&write_fill(fill));
        }
        xml.push_str("\n  </fills>");

        xml.push_str(&format!("\n  <borders count=\"{}\">", borders.len()));
        for border in &borders {
            xml.push_str("\n    ");
            xml.push_str(&write_border(border));
        }
        xml.push_str("\n  </borders>");

        xml.push_str(
            r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", self.styles.len()));
        for (i, ids) in resolved.iter().enumerate() {
            let style = &self.styles[i];
            xml.push_str("\n    ");
            xml.push_str(&write_xf(style, *ids));
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>"#,
        );

        xml.push_str("\n</styleSheet>");
        xml
    }
}

fn escape_xml_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn color_attrs(color: &Color) -> String {
    match color {
        Color::Auto => " indexed=\"64\"".to_string(),
        Color::Rgb { r, g, b } => format!(" rgb=\"FF{:02X}{:02X}{:02X}\"", r, g, b),
        Color::Argb { a, r, g, b } => {
            format!(" rgb=\"{:02X}{:02X}{:02X}{:02X}\"", a, r, g, b)
        }
        Color::Indexed(i) => format!(" indexed=\"{}\"", i),
        Color::Theme { index, tint } => {
            if *tint == 0 {
                format!(" theme=\"{}\"", index)
            } else {
                format!(" theme=\"{}\" tint=\"{}\"", index, (*tint as f64) / 100.0)
            }
        }
    }
}

fn write_color(tag: &str, color: &Color) -> String {
    format!("<{}{}/>", tag, color_attrs(color))
}

fn write_font(font: &Font) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    match font.underline {
        Underline::None => {}
        Underline::Single => s.push_str("<u/>"),
        Underline::Double => s.push_str("<u val=\"double\"/>"),
        Underline::SingleAccounting => s.push_str("<u val=\"singleAccounting\"/>"),
        Underline::DoubleAccounting => s.push_str("<u val=\"doubleAccounting\"/>"),
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if !matches!(font.color, Color::Auto) {
        s.push_str(&write_color("color", &font.color));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape_xml_attr(&font.name)));
    s.push_str("</font>");
    s
}

fn pattern_type_to_str(p: PatternType) -> &'static str {
    match p {
        PatternType::None => "none",
        PatternType::Solid => "solid",
        PatternType::MediumGray => "mediumGray",
        PatternType::DarkGray => "darkGray",
        PatternType::LightGray => "lightGray",
        PatternType::DarkHorizontal => "darkHorizontal",
        PatternType::DarkVertical => "darkVertical",
        PatternType::DarkDown => "darkDown",
        PatternType::DarkUp => "darkUp",
        PatternType::DarkGrid => "darkGrid",
        PatternType::DarkTrellis => "darkTrellis",
        PatternType::LightHorizontal => "lightHorizontal",
        PatternType::LightVertical => "lightVertical",
        PatternType::LightDown => "lightDown",
        PatternType::LightUp => "lightUp",
        PatternType::LightGrid => "lightGrid",
        PatternType::LightTrellis => "lightTrellis",
        PatternType::Gray125 => "gray125",
        PatternType::Gray0625 => "gray0625",
    }
}

fn write_fill(fill: &Fill) -> String {
    match fill {
        Fill::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        Fill::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\">{}<bgColor indexed=\"64\"/></patternFill></fill>",
            write_color("fgColor", color)
        ),
        Fill::Pattern {
            pattern,
            foreground,
            background,
        } => format!(
            "<fill><patternFill patternType=\"{}\">{}{}</patternFill></fill>",
            pattern_type_to_str(*pattern),
            write_color("fgColor", foreground),
            write_color("bgColor", background)
        ),
    }
}

fn line_style_to_str(s: LineStyle) -> Option<&'static str> {
    match s {
        LineStyle::None => None,
        LineStyle::Thin => Some("thin"),
        LineStyle::Medium => Some("medium"),
        LineStyle::Thick => Some("thick"),
        LineStyle::Dashed => Some("dashed"),
        LineStyle::Dotted => Some("dotted"),
        LineStyle::Double => Some("double"),
        LineStyle::Hair => Some("hair"),
        LineStyle::MediumDashed => Some("mediumDashed"),
        LineStyle::DashDot => Some("dashDot"),
        LineStyle::MediumDashDot => Some("mediumDashDot"),
        LineStyle::DashDotDot => Some("dashDotDot"),
        LineStyle::MediumDashDotDot => Some("mediumDashDotDot"),
        LineStyle::SlantDashDot => Some("slantDashDot"),
    }
}

fn write_border_edge(tag: &str, edge: &Option<BorderEdge>) -> String {
    match edge {
        None => format!("<{tag}/>"),
        Some(e) => match line_style_to_str(e.style) {
            None => format!("<{tag}/>"),
            Some(style) => format!(
                "<{tag} style=\"{}\">{}</{tag}>",
                style,
                write_color("color", &e.color)
            ),
        },
    }
}

fn write_border(border: &Border) -> String {
    let mut attrs = String::new();
    match border.diagonal_direction {
        DiagonalDirection::None => {}
        DiagonalDirection::Down => attrs.push_str(" diagonalDown=\"1\""),
        DiagonalDirection::Up => attrs.push_str(" diagonalUp=\"1\""),
        DiagonalDirection::Both => attrs.push_str(" diagonalDown=\"1\" diagonalUp=\"1\""),
    }

    let mut s = format!("<border{}>", attrs);
    s.push_str(&write_border_edge("left", &border.left));
    s.push_str(&write_border_edge("right", &border.right));
    s.push_str(&write_border_edge("top", &border.top));
    s.push_str(&write_border_edge("bottom", &border.bottom));
    s.push_str(&write_border_edge("diagonal", &border.diagonal));
    s.push_str("</border>");
    s
}

fn horiz_to_str(h: HorizontalAlignment) -> &'static str {
    match h {
        HorizontalAlignment::General => "general",
        HorizontalAlignment::Left => "left",
        HorizontalAlignment::Center => "center",
        HorizontalAlignment::Right => "right",
        HorizontalAlignment::Fill => "fill",
        HorizontalAlignment::Justify => "justify",
        HorizontalAlignment::CenterContinuous => "centerContinuous",
        HorizontalAlignment::Distributed => "distributed",
    }
}

fn vert_to_str(v: VerticalAlignment) -> &'static str {
    match v {
        VerticalAlignment::Top => "top",
        VerticalAlignment::Center => "center",
        VerticalAlignment::Bottom => "bottom",
        VerticalAlignment::Justify => "justify",
        VerticalAlignment::Distributed => "distributed",
    }
}

fn write_alignment(al: &Alignment) -> String {
    let default = Alignment::default();
    if al == &default {
        return String::new();
    }

    let mut s = String::from("<alignment");
    if al.horizontal != default.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", horiz_to_str(al.horizontal)));
    }
    if al.vertical != default.vertical {
        s.push_str(&format!(" vertical=\"{}\"", vert_to_str(al.vertical)));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", al.rotation));
    }
    s.push_str("/>");
    s
}

fn write_protection(p: &Protection) -> String {
    let default = Protection::default();
    if p == &default {
        return String::new();
    }
    let mut s = String::from("<protection");
    if p.locked != default.locked {
        s.push_str(&format!(" locked=\"{}\"", if p.locked { 1 } else { 0 }));
    }
    if p.hidden != default.hidden {
        s.push_str(&format!(" hidden=\"{}\"", if p.hidden { 1 } else { 0 }));
    }
    s.push_str("/>");
    s
}

fn write_xf(style: &Style, ids: ResolvedXfIds) -> String {
    let mut attrs = String::new();
    if ids.num_fmt_id != 0 {
        attrs.push_str(" applyNumberFormat=\"1\"");
    }
    if style.font != Font::default() {
        attrs.push_str(" applyFont=\"1\"");
    }
    if style.fill != Fill::None {
        attrs.push_str(" applyFill=\"1\"");
    }
    if style.border != Border::default() {
        attrs.push_str(" applyBorder=\"1\"");
    }
    if style.alignment != Alignment::default() {
        attrs.push_str(" applyAlignment=\"1\"");
    }
    if style.protection != Protection::default() {
        attrs.push_str(" applyProtection=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        ids.num_fmt_id, ids.font_id, ids.fill_id, ids.border_id, attrs
    );

    let alignment_xml = write_alignment(&style.alignment);
    let protection_xml = write_protection(&style.protection);
    if alignment_xml.is_empty() && protection_xml.is_empty() {
        s.push_str("/>");
        return s;
    }

    s.push('>');
    s.push_str(&alignment_xml);
    s.push_str(&protection_xml);
    s.push_str("</xf>");
    s
}

// === Reading ===

pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<Style>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();

    let mut numfmts: HashMap<u32, String> = HashMap::new();
    let mut fonts: Vec<Font> = Vec::new();
    let mut fills: Vec<Fill> = Vec::new();
    let mut borders: Vec<Border> = Vec::new();
    let mut cell_xfs: Vec<Style> = Vec::new();

    let mut current_font: Option<Font> = None;
    let mut in_fill = false;
    let mut current_fill_pattern: Option<PatternType> = None;
    let mut current_fill_fg: Color = Color::Auto;
    let mut current_fill_bg: Color = Color::Auto;

    let mut current_border: Option<Border> = None;
    let mut current_border_edge: Option<&'static str> = None;

    let mut current_xf: Option<(u32, u32, u32, u32, Alignment, Protection)> = None;
    let mut in_cell_xfs = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"cellXfs" => {
                    in_cell_xfs = true;
                }

                b"font" => {
                    current_font = Some(Font::default());
                }

                b"fill" => {
                    in_fill = true;
                    current_fill_pattern = None;
                    current_fill_fg = Color::Auto;
                    current_fill_bg = Color::Auto;
                }

                b"patternFill" if in_fill => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"patternType" {
                            if let Ok(v) = attr.unescape_value() {
                                current_fill_pattern = str_to_pattern_type(&v);
                            }
                        }
                    }
                }

                b"border" => {
                    current_border = Some(parse_border_attrs(&e));
                }

                b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => {
                    if let Some(border) = current_border.as_mut() {
                        let edge_name = match e.name().as_ref() {
                            b"left" => "left",
                            b"right" => "right",
                            b"top" => "top",
                            b"bottom" => "bottom",
                            _ => "diagonal",
                        };
                        current_border_edge = Some(edge_name);

                        let mut style: Option<LineStyle> = None;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"style" {
                                if let Ok(v) = attr.unescape_value() {
                                    style = str_to_line_style(&v);
                                }
                            }
                        }
                        // Color may be overwritten by a nested <color>
                        if let Some(st) = style {
                            if st != LineStyle::None {
                                set_border_edge(
                                    border,
                                    edge_name,
                                    Some(BorderEdge {
                                        style: st,
                                        color: Color::Auto,
                                    }),
                                );
                            }
                        }
                    }
                }

                b"xf" if in_cell_xfs => {
                    current_xf = Some(parse_xf_attrs(&e));
                }

                b"alignment" => {
                    if let Some((_, _, _, _, align, _)) = current_xf.as_mut() {
                        apply_alignment_attrs(align, &e);
                    }
                }

                b"protection" => {
                    if let Some((_, _, _, _, _, prot)) = current_xf.as_mut() {
                        apply_protection_attrs(prot, &e);
                    }
                }

                b"sz" => {
                    if let Some(font) = current_font.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"val" {
                                if let Ok(v) = attr.unescape_value() {
                                    font.size = v.parse::<f64>().unwrap_or(font.size);
                                }
                            }
                        }
                    }
                }
                b"name" => {
                    if let Some(font) = current_font.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"val" {
                                if let Ok(v) = attr.unescape_value() {
                                    font.name = v.to_string();
                                }
                            }
                        }
                    }
                }
                b"b" => {
                    if let Some(font) = current_font.as_mut() {
                        font.bold = true;
                    }
                }
                b"i" => {
                    if let Some(font) = current_font.as_mut() {
                        font.italic = true;
                    }
                }
                b"strike" => {
                    if let Some(font) = current_font.as_mut() {
                        font.strikethrough = true;
                    }
                }
                b"u" => {
                    if let Some(font) = current_font.as_mut() {
                        font.underline = parse_underline_attrs(&e);
                    }
                }
                b"color" => {
                    apply_color(
                        parse_color_attrs(&e),
                        current_font.as_mut(),
                        current_border.as_mut(),
                        current_border_edge,
                    );
                }
                b"fgColor" if in_fill => {
                    current_fill_fg = parse_color_attrs(&e);
                }
                b"bgColor" if in_fill => {
                    current_fill_bg = parse_color_attrs(&e);
                }

                _ => {}
            },

            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"numFmt" => {
                    let mut id = None;
                    let mut code = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"numFmtId" => {
                                id = attr.unescape_value().ok().and_then(|s| s.parse().ok())
                            }
                            b"formatCode" => {
                                code = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(code)) = (id, code) {
                        numfmts.insert(id, code);
                    }
                }

                b"b" => {
                    if let Some(font) = current_font.as_mut() {
                        font.bold = true;
                    }
                }
                b"i" => {
                    if let Some(font) = current_font.as_mut() {
                        font.italic = true;
                    }
                }
                b"strike" => {
                    if let Some(font) = current_font.as_mut() {
                        font.strikethrough = true;
                    }
                }
                b"u" => {
                    if let Some(font) = current_font.as_mut() {
                        font.underline = parse_underline_attrs(&e);
                    }
                }
                b"sz" => {
                    if let Some(font) = current_font.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"val" {
                                if let Ok(v) = attr.unescape_value() {
                                    font.size = v.parse::<f64>().unwrap_or(font.size);
                                }
                            }
                        }
                    }
                }
                b"name" => {
                    if let Some(font) = current_font.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"val" {
                                if let Ok(v) = attr.unescape_value() {
                                    font.name = v.to_string();
                                }
                            }
                        }
                    }
                }
                b"color" => {
                    apply_color(
                        parse_color_attrs(&e),
                        current_font.as_mut(),
                        current_border.as_mut(),
                        current_border_edge,
                    );
                }
                b"fgColor" if in_fill => {
                    current_fill_fg = parse_color_attrs(&e);
                }
                b"bgColor" if in_fill => {
                    current_fill_bg = parse_color_attrs(&e);
                }

                b"alignment" => {
                    if let Some((_, _, _, _, align, _)) = current_xf.as_mut() {
                        apply_alignment_attrs(align, &e);
                    }
                }
                b"protection" => {
                    if let Some((_, _, _, _, _, prot)) = current_xf.as_mut() {
                        apply_protection_attrs(prot, &e);
                    }
                }

                b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => {
                    // Self-closing edge with no line style: empty edge
                    if current_border.is_some() {
                        let edge_name = match e.name().as_ref() {
                            b"left" => "left",
                            b"right" => "right",
                            b"top" => "top",
                            b"bottom" => "bottom",
                            _ => "diagonal",
                        };
                        let mut style: Option<LineStyle> = None;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"style" {
                                if let Ok(v) = attr.unescape_value() {
                                    style = str_to_line_style(&v);
                                }
                            }
                        }
                        if let (Some(border), Some(st)) = (current_border.as_mut(), style) {
                            if st != LineStyle::None {
                                set_border_edge(
                                    border,
                                    edge_name,
                                    Some(BorderEdge {
                                        style: st,
                                        color: Color::Auto,
                                    }),
                                );
                            }
                        }
                    }
                }

                b"xf" if in_cell_xfs => {
                    let (num_fmt_id, font_id, fill_id, border_id, align, prot) =
                        parse_xf_attrs(&e);
                    cell_xfs.push(resolve_style(
                        num_fmt_id, font_id, fill_id, border_id, align, prot, &numfmts, &fonts,
                        &fills, &borders,
                    ));
                }

                _ => {}
            },

            Ok(Event::End(e)) => match e.name().as_ref() {
                b"font" => {
                    if let Some(f) = current_font.take() {
                        fonts.push(f);
                    }
                }
                b"fill" => {
                    if in_fill {
                        fills.push(finalize_fill(
                            current_fill_pattern,
                            current_fill_fg,
                            current_fill_bg,
                        ));
                        in_fill = false;
                        current_fill_pattern = None;
                    }
                }
                b"border" => {
                    if let Some(b) = current_border.take() {
                        borders.push(b);
                    }
                    current_border_edge = None;
                }
                b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => {
                    current_border_edge = None;
                }
                b"xf" => {
                    if let Some((num_fmt_id, font_id, fill_id, border_id, align, prot)) =
                        current_xf.take()
                    {
                        cell_xfs.push(resolve_style(
                            num_fmt_id, font_id, fill_id, border_id, align, prot, &numfmts,
                            &fonts, &fills, &borders,
                        ));
                    }
                }
                b"cellXfs" => {
                    in_cell_xfs = false;
                }
                _ => {}
            },

            Ok(Event::Eof) => break,
            Err(e) => return Err(crate::error::XlsxError::Xml(e)),
            _ => {}
        }

        buf.clear();
    }

    if cell_xfs.is_empty() {
        cell_xfs.push(Style::default());
    }

    Ok(cell_xfs)
}

#[allow(clippy::too_many_arguments)]
fn resolve_style(
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Alignment,
    protection: Protection,
    numfmts: &HashMap<u32, String>,
    fonts: &[Font],
    fills: &[Fill],
    borders: &[Border],
) -> Style {
    let number_format = if num_fmt_id == 0 {
        NumberFormat::General
    } else if let Some(code) = numfmts.get(&num_fmt_id) {
        NumberFormat::Custom(code.clone())
    } else {
        NumberFormat::BuiltIn(num_fmt_id)
    };

    Style {
        font: fonts.get(font_id as usize).cloned().unwrap_or_default(),
        fill: fills.get(fill_id as usize).cloned().unwrap_or_default(),
        border: borders.get(border_id as usize).cloned().unwrap_or_default(),
        alignment,
        number_format,
        protection,
    }
}

fn parse_xf_attrs(
    e: &quick_xml::events::BytesStart<'_>,
) -> (u32, u32, u32, u32, Alignment, Protection) {
    let mut num_fmt_id = 0u32;
    let mut font_id = 0u32;
    let mut fill_id = 0u32;
    let mut border_id = 0u32;
    for attr in e.attributes().flatten() {
        let val = match attr.unescape_value() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match attr.key.as_ref() {
            b"numFmtId" => num_fmt_id = val.parse().unwrap_or(0),
            b"fontId" => font_id = val.parse().unwrap_or(0),
            b"fillId" => fill_id = val.parse().unwrap_or(0),
            b"borderId" => border_id = val.parse().unwrap_or(0),
            _ => {}
        }
    }
    (
        num_fmt_id,
        font_id,
        fill_id,
        border_id,
        Alignment::default(),
        Protection::default(),
    )
}

fn parse_border_attrs(e: &quick_xml::events::BytesStart<'_>) -> Border {
    let mut border = Border::default();
    let mut up = false;
    let mut down = false;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"diagonalUp" => up = attr.unescape_value().ok().as_deref() == Some("1"),
            b"diagonalDown" => down = attr.unescape_value().ok().as_deref() == Some("1"),
            _ => {}
        }
    }
    border.diagonal_direction = match (down, up) {
        (false, false) => DiagonalDirection::None,
        (true, false) => DiagonalDirection::Down,
        (false, true) => DiagonalDirection::Up,
        (true, true) => DiagonalDirection::Both,
    };
    border
}

fn apply_alignment_attrs(align: &mut Alignment, e: &quick_xml::events::BytesStart<'_>) {
    for attr in e.attributes().flatten() {
        let val = match attr.unescape_value() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match attr.key.as_ref() {
            b"horizontal" => {
                if let Some(h) = str_to_horizontal(&val) {
                    align.horizontal = h;
                }
            }
            b"vertical" => {
                if let Some(v) = str_to_vertical(&val) {
                    align.vertical = v;
                }
            }
            b"wrapText" => align.wrap_text = val.as_ref() == "1",
            b"shrinkToFit" => align.shrink_to_fit = val.as_ref() == "1",
            b"indent" => align.indent = val.parse::<u8>().unwrap_or(0),
            b"textRotation" => align.rotation = val.parse::<i16>().unwrap_or(0),
            _ => {}
        }
    }
}

fn apply_protection_attrs(prot: &mut Protection, e: &quick_xml::events::BytesStart<'_>) {
    for attr in e.attributes().flatten() {
        let val = match attr.unescape_value() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match attr.key.as_ref() {
            b"locked" => prot.locked = val.as_ref() == "1",
            b"hidden" => prot.hidden = val.as_ref() == "1",
            _ => {}
        }
    }
}

fn apply_color(
    color: Color,
    font: Option<&mut Font>,
    border: Option<&mut Border>,
    border_edge: Option<&'static str>,
) {
    // Inside a <font> the color is the font color; inside a border edge
    // it belongs to the edge currently open.
    if let Some(font) = font {
        font.color = color;
    } else if let (Some(border), Some(edge_name)) = (border, border_edge) {
        let edge_opt = *get_border_edge(border, edge_name);
        if let Some(mut edge) = edge_opt {
            edge.color = color;
            set_border_edge(border, edge_name, Some(edge));
        }
    }
}

fn finalize_fill(pattern: Option<PatternType>, fg: Color, bg: Color) -> Fill {
    match pattern.unwrap_or(PatternType::None) {
        PatternType::None => Fill::None,
        PatternType::Solid => Fill::Solid { color: fg },
        PatternType::Gray125 => Fill::None,
        p => Fill::Pattern {
            pattern: p,
            foreground: fg,
            background: bg,
        },
    }
}

fn parse_underline_attrs(e: &quick_xml::events::BytesStart<'_>) -> Underline {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"val" {
            if let Ok(v) = attr.unescape_value() {
                return match v.as_ref() {
                    "double" => Underline::Double,
                    "singleAccounting" => Underline::SingleAccounting,
                    "doubleAccounting" => Underline::DoubleAccounting,
                    "none" => Underline::None,
                    _ => Underline::Single,
                };
            }
        }
    }
    Underline::Single
}

pub(crate) fn parse_color_attrs(e: &quick_xml::events::BytesStart<'_>) -> Color {
    let mut rgb: Option<String> = None;
    let mut theme: Option<u8> = None;
    let mut tint: Option<f64> = None;
    let mut indexed: Option<u8> = None;

    for attr in e.attributes().flatten() {
        let val = match attr.unescape_value() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match attr.key.as_ref() {
            b"rgb" => rgb = Some(val.to_string()),
            b"theme" => theme = val.parse::<u8>().ok(),
            b"tint" => tint = val.parse::<f64>().ok(),
            b"indexed" => indexed = val.parse::<u8>().ok(),
            _ => {}
        }
    }

    if let Some(rgb) = rgb {
        if let Some(color) = Color::from_hex(&rgb) {
            return color;
        }
    }
    if let Some(index) = theme {
        let tint_i8 = tint.map(|t| (t * 100.0).round() as i8).unwrap_or(0);
        return Color::Theme {
            index,
            tint: tint_i8,
        };
    }
    if let Some(i) = indexed {
        return Color::Indexed(i);
    }
    Color::Auto
}

fn str_to_pattern_type(s: &str) -> Option<PatternType> {
    Some(match s {
        "none" => PatternType::None,
        "solid" => PatternType::Solid,
        "mediumGray" => PatternType::MediumGray,
        "darkGray" => PatternType::DarkGray,
        "lightGray" => PatternType::LightGray,
        "darkHorizontal" => PatternType::DarkHorizontal,
        "darkVertical" => PatternType::DarkVertical,
        "darkDown" => PatternType::DarkDown,
        "darkUp" => PatternType::DarkUp,
        "darkGrid" => PatternType::DarkGrid,
        "darkTrellis" => PatternType::DarkTrellis,
        "lightHorizontal" => PatternType::LightHorizontal,
        "lightVertical" => PatternType::LightVertical,
        "lightDown" => PatternType::LightDown,
        "lightUp" => PatternType::LightUp,
        "lightGrid" => PatternType::LightGrid,
        "lightTrellis" => PatternType::LightTrellis,
        "gray125" => PatternType::Gray125,
        "gray0625" => PatternType::Gray0625,
        _ => return None,
    })
}

fn str_to_line_style(s: &str) -> Option<LineStyle> {
    Some(match s {
        "thin" => LineStyle::Thin,
        "medium" => LineStyle::Medium,
        "thick" => LineStyle::Thick,
        "dashed" => LineStyle::Dashed,
        "dotted" => LineStyle::Dotted,
        "double" => LineStyle::Double,
        "hair" => LineStyle::Hair,
        "mediumDashed" => LineStyle::MediumDashed,
        "dashDot" => LineStyle::DashDot,
        "mediumDashDot" => LineStyle::MediumDashDot,
        "dashDotDot" => LineStyle::DashDotDot,
        "mediumDashDotDot" => LineStyle::MediumDashDotDot,
        "slantDashDot" => LineStyle::SlantDashDot,
        _ => return None,
    })
}

fn str_to_horizontal(s: &str) -> Option<HorizontalAlignment> {
    Some(match s {
        "general" => HorizontalAlignment::General,
        "left" => HorizontalAlignment::Left,
        "center" => HorizontalAlignment::Center,
        "right" => HorizontalAlignment::Right,
        "fill" => HorizontalAlignment::Fill,
        "justify" => HorizontalAlignment::Justify,
        "centerContinuous" => HorizontalAlignment::CenterContinuous,
        "distributed" => HorizontalAlignment::Distributed,
        _ => return None,
    })
}

fn str_to_vertical(s: &str) -> Option<VerticalAlignment> {
    Some(match s {
        "top" => VerticalAlignment::Top,
        "center" => VerticalAlignment::Center,
        "bottom" => VerticalAlignment::Bottom,
        "justify" => VerticalAlignment::Justify,
        "distributed" => VerticalAlignment::Distributed,
        _ => return None,
    })
}

fn get_border_edge<'a>(border: &'a Border, edge: &str) -> &'a Option<BorderEdge> {
    match edge {
        "left" => &border.left,
        "right" => &border.right,
        "top" => &border.top,
        "bottom" => &border.bottom,
        _ => &border.diagonal,
    }
}

fn set_border_edge(border: &mut Border, edge: &str, val: Option<BorderEdge>) {
    match edge {
        "left" => border.left = val,
        "right" => border.right = val,
        "top" => border.top = val,
        "bottom" => border.bottom = val,
        _ => border.diagonal = val,
    }
}
