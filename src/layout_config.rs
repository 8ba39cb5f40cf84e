//! Layout config – the frozen page-by-page description handed to the PDF
//! painter. Everything here is in PDF points with a top-left origin.

use crate::brand::DOCUMENT_TITLE;

/// A complete document layout ready for rendering.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,
    /// Solid bar along the top edge, drawn over the border.
    pub accent: Option<BorderStyle>,

    /// Content (mutually exclusive in practice)
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    pub line_height: f32,
    pub align: Align,
    pub underline: bool,
    /// List bullet/number drawn in the gutter (e.g. "•" or "1.")
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    /// Offset from the box's left edge, alignment included.
    pub x_offset: f32,
    /// Offset from the box's top edge to the top of the line.
    pub y_offset: f32,
    /// Measured advance, used for underlines.
    pub width: f32,
}

#[derive(Debug, Clone)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// An empty A4 portrait layout.
    pub fn a4() -> Self {
        Self {
            title: DOCUMENT_TITLE.to_string(),
            // 210mm × 297mm
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            pages: Vec::new(),
        }
    }

    /// Total number of text lines across all pages.
    pub fn line_count(&self) -> usize {
        fn count(b: &LayoutBox) -> usize {
            b.text.as_ref().map_or(0, |t| t.lines.len()) + b.children.iter().map(count).sum::<usize>()
        }
        self.pages
            .iter()
            .flat_map(|p| p.boxes.iter())
            .map(count)
            .sum()
    }

    /// All text drawn on `page`, in paint order.
    pub fn page_text(&self, page: usize) -> Vec<String> {
        fn collect(b: &LayoutBox, out: &mut Vec<String>) {
            if let Some(t) = &b.text {
                out.extend(t.lines.iter().map(|l| l.text.clone()));
            }
            for child in &b.children {
                collect(child, out);
            }
        }
        let mut out = Vec::new();
        if let Some(p) = self.pages.get(page) {
            for b in &p.boxes {
                collect(b, &mut out);
            }
        }
        out
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            accent: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }
}
