//! Pagination – splits positioned boxes into pages and converts them from
//! CSS px to PDF points.
//!
//! Handles:
//! - A4 page boundaries in either orientation
//! - Page-break-before / page-break-after hints
//! - `break-inside: avoid` boxes (moved whole to the next page)
//! - Headings kept on the same page as the block that follows them
//! - Splitting containers between their children when they overflow

use crate::fonts::FontManager;
use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::style;

/// Page margin in points (20 CSS px).
pub const PAGE_MARGIN_PT: f32 = 15.0;

/// Overflow below this many px is treated as a fit (float noise).
const FIT_EPSILON: f32 = 0.5;

/// Physical page plus the CSS viewport it is laid out for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_pt: f32,
    pub height_pt: f32,
    pub margin_pt: f32,
    /// Points per CSS px; the viewport spans the full page width.
    pub px_to_pt: f32,
}

impl PageGeometry {
    pub fn new(width_pt: f32, height_pt: f32, margin_pt: f32, viewport_px: f32) -> Self {
        Self {
            width_pt,
            height_pt,
            margin_pt,
            px_to_pt: width_pt / viewport_px,
        }
    }

    pub fn width_px(&self) -> f32 {
        self.width_pt / self.px_to_pt
    }

    pub fn margin_px(&self) -> f32 {
        self.margin_pt / self.px_to_pt
    }

    /// Usable height of one page in CSS px.
    pub fn content_height_px(&self) -> f32 {
        (self.height_pt - 2.0 * self.margin_pt) / self.px_to_pt
    }
}

/// Convert positioned boxes into a paginated LayoutConfig.
pub fn paginate(boxes: &[PositionedBox], geometry: &PageGeometry, fonts: &FontManager) -> LayoutConfig {
    let mut paginator = Paginator {
        geometry: *geometry,
        fonts,
        content_height: geometry.content_height_px(),
        pages: Vec::new(),
        current: PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        },
        page_start: 0.0,
    };
    paginator.place_all(boxes);

    let mut pages = paginator.pages;
    if !paginator.current.boxes.is_empty() || pages.is_empty() {
        pages.push(paginator.current);
    }

    LayoutConfig {
        page_width_pt: geometry.width_pt,
        page_height_pt: geometry.height_pt,
        pages,
        ..LayoutConfig::a4()
    }
}

struct Paginator<'a> {
    geometry: PageGeometry,
    fonts: &'a FontManager,
    content_height: f32,
    pages: Vec<PageLayout>,
    current: PageLayout,
    /// Document-space y (px) at which the current page begins.
    page_start: f32,
}

impl Paginator<'_> {
    fn new_page(&mut self, start_y: f32) {
        let next = PageLayout {
            page_index: self.pages.len() + 1,
            boxes: Vec::new(),
        };
        let finished = std::mem::replace(&mut self.current, next);
        self.pages.push(finished);
        self.page_start = start_y;
    }

    fn bottom_on_page(&self, pbox: &PositionedBox) -> f32 {
        pbox.y + pbox.height - self.page_start
    }

    fn place_all(&mut self, boxes: &[PositionedBox]) {
        for (i, pbox) in boxes.iter().enumerate() {
            if pbox.keep_with_next && !self.current.boxes.is_empty() {
                if let Some(next) = boxes.get(i + 1) {
                    let lead_bottom = next.y + next.leading_height();
                    let stranded = lead_bottom - self.page_start > self.content_height + FIT_EPSILON;
                    let fits_together = lead_bottom - pbox.y <= self.content_height;
                    if stranded && fits_together {
                        self.new_page(pbox.y);
                    }
                }
            }
            self.place(pbox);
        }
    }

    fn place(&mut self, pbox: &PositionedBox) {
        if pbox.page_break_before && !self.current.boxes.is_empty() {
            self.new_page(pbox.y);
        }

        if pbox.is_splittable() && pbox.contains_forced_break() {
            self.split(pbox);
            return;
        }

        if self.bottom_on_page(pbox) > self.content_height + FIT_EPSILON {
            let fits_fresh_page = pbox.height <= self.content_height + FIT_EPSILON;
            if pbox.is_splittable() && (!pbox.keeps_together() || !fits_fresh_page) {
                self.split(pbox);
                return;
            }
            if self.current.boxes.is_empty() {
                self.page_start = self.page_start.max(pbox.y);
            } else {
                self.new_page(pbox.y);
            }
        }

        let y_on_page = (pbox.y - self.page_start).max(0.0);
        let abs_y = self.geometry.margin_pt + y_on_page * self.geometry.px_to_pt;
        let layout_box = self.build_layout_box(pbox, abs_y);
        self.current.boxes.push(layout_box);

        if pbox.page_break_after {
            self.new_page(pbox.y + pbox.height);
        }
    }

    /// Place the children of `pbox` one by one instead of the box itself.
    fn split(&mut self, pbox: &PositionedBox) {
        self.place_all(&pbox.children);
        if pbox.page_break_after {
            self.new_page(pbox.y + pbox.height);
        }
    }

    /// Recursively build a LayoutBox tree in page-absolute points.
    /// Children keep their offset from the parent:
    /// `child_abs_y = parent_abs_y + (child.y − parent.y) · scale`.
    fn build_layout_box(&self, pbox: &PositionedBox, abs_y: f32) -> LayoutBox {
        let scale = self.geometry.px_to_pt;
        let s = &pbox.style;
        let mut lb = LayoutBox::new(pbox.x * scale, abs_y, pbox.width * scale, pbox.height * scale);

        if !s.background_color.is_transparent() {
            lb.background_color = Some(rgba(s.background_color));
        }
        if s.border_width > 0.0 {
            lb.border = Some(BorderStyle {
                width: s.border_width * scale,
                color: rgba(s.border_color),
            });
        }
        if s.border_top_width > 0.0 {
            lb.accent = Some(BorderStyle {
                width: s.border_top_width * scale,
                color: rgba(s.border_color),
            });
        }

        let bold = s.font_weight == style::FontWeight::Bold;
        let line_height = self.fonts.line_height_px(s.font_size, s.line_height);
        match &pbox.content {
            BoxContent::Text { lines, .. } => {
                let inset_left = s.padding_left + s.border_width;
                let inset_top = s.padding_top + s.border_width.max(s.border_top_width);
                let inner_width =
                    pbox.width - s.padding_left - s.padding_right - 2.0 * s.border_width;
                let align = match s.text_align {
                    style::TextAlign::Left => Align::Left,
                    style::TextAlign::Center => Align::Center,
                    style::TextAlign::Right => Align::Right,
                };
                let text_lines = lines
                    .iter()
                    .enumerate()
                    .map(|(i, line)| {
                        let width = self.fonts.measure_text_width(line, s.font_size, bold);
                        let slack = (inner_width - width).max(0.0);
                        let shift = match align {
                            Align::Left => 0.0,
                            Align::Center => slack / 2.0,
                            Align::Right => slack,
                        };
                        TextLine {
                            text: line.clone(),
                            x_offset: (inset_left + shift) * scale,
                            y_offset: (inset_top + i as f32 * line_height) * scale,
                            width: width * scale,
                        }
                    })
                    .collect();

                lb.text = Some(TextContent {
                    lines: text_lines,
                    font_size: s.font_size * scale,
                    bold,
                    italic: s.font_style == style::FontStyle::Italic,
                    color: rgba(s.color),
                    line_height: line_height * scale,
                    align,
                    underline: s.text_decoration == style::TextDecoration::Underline,
                    list_marker: None,
                });
            }
            BoxContent::Image { src } => {
                lb.image = Some(ImageContent {
                    src: src.clone(),
                    width: pbox.width * scale,
                    height: pbox.height * scale,
                });
            }
            BoxContent::ListItem { marker } => {
                // No lines of its own: the item's text lives in child boxes.
                lb.text = Some(TextContent {
                    lines: Vec::new(),
                    font_size: s.font_size * scale,
                    bold,
                    italic: false,
                    color: rgba(s.color),
                    line_height: line_height * scale,
                    align: Align::Left,
                    underline: false,
                    list_marker: Some(marker.clone()),
                });
            }
            BoxContent::None => {}
        }

        for child in &pbox.children {
            let child_abs_y = abs_y + (child.y - pbox.y) * scale;
            lb.children.push(self.build_layout_box(child, child_abs_y));
        }

        lb
    }
}

fn rgba(c: style::Color) -> [f32; 4] {
    [c.r, c.g, c.b, c.a]
}
