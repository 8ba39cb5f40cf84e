//! Layout engine – uses Taffy to compute flexbox / grid layout from a styled
//! DOM tree, then converts the result into a tree of positioned boxes.
//!
//! All lengths here are CSS px; pagination converts them to PDF points.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::dom::Tag;
use crate::error::EngineError;
use crate::fonts::{wrap_text, FontManager};
use crate::style::{self, ComputedStyle, FontWeight, ListStyle, StyledNode};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
    pub keep_with_next: bool,
}

impl PositionedBox {
    /// A pure container whose children may be placed on different pages.
    pub fn is_splittable(&self) -> bool {
        matches!(self.content, BoxContent::None | BoxContent::ListItem { .. })
            && !self.children.is_empty()
    }

    /// Boxes pagination moves whole when they fit on a fresh page. List
    /// items count, since their marker is painted by the item itself.
    pub fn keeps_together(&self) -> bool {
        self.page_break_inside_avoid || matches!(self.content, BoxContent::ListItem { .. })
    }

    /// True when a descendant forces a page break.
    pub fn contains_forced_break(&self) -> bool {
        self.children
            .iter()
            .any(|c| c.page_break_before || c.page_break_after || c.contains_forced_break())
    }

    /// Height from this box's top to the bottom of the first piece that
    /// pagination would have to keep together.
    pub fn leading_height(&self) -> f32 {
        if self.keeps_together() || !self.is_splittable() {
            return self.height;
        }
        match self.children.first() {
            Some(first) => (first.y - self.y) + first.leading_height(),
            None => self.height,
        }
    }
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text {
        text: String,
        lines: Vec<String>,
    },
    Image {
        src: String,
    },
    /// List item marker
    ListItem {
        marker: String,
    },
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
    available_width: f32,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager, available_width: f32) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
            available_width,
        }
    }

    /// Collect the text of an inline subtree. `<br>` becomes a hard break,
    /// source newlines are ordinary whitespace.
    fn collect_inline_text(node: &StyledNode, out: &mut String) {
        match node {
            StyledNode::Text { text, .. } => out.push_str(&text.replace('\n', " ")),
            StyledNode::Element { tag: Tag::Br, .. } => out.push('\n'),
            StyledNode::Element { children, .. } => {
                for child in children {
                    Self::collect_inline_text(child, out);
                }
            }
        }
    }

    fn merged_text(children: &[StyledNode]) -> String {
        let mut raw = String::new();
        for child in children {
            Self::collect_inline_text(child, &mut raw);
        }
        raw.split('\n')
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
            .trim_matches('\n')
            .to_string()
    }

    /// Return true when every child is a text node or a display:inline element
    /// (no block-level children).
    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => style.display == style::Display::Inline && Self::all_inline(gc),
        })
    }

    /// Inherited typography only; used for anonymous text runs.
    fn text_style(block: &ComputedStyle) -> ComputedStyle {
        ComputedStyle {
            font_size: block.font_size,
            font_weight: block.font_weight,
            font_family: block.font_family.clone(),
            color: block.color,
            text_align: block.text_align,
            line_height: block.line_height,
            text_decoration: block.text_decoration,
            font_style: block.font_style,
            ..ComputedStyle::default()
        }
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> Result<NodeId, EngineError> {
        match styled {
            StyledNode::Text { text, style } => {
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                self.build_text_node(&text, style, &Tag::Span, parent_width)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, parent_width),
        }
    }

    /// A wrapped text leaf. The box model of `style` (margins, padding,
    /// background, flex item props) is kept, so paragraphs and headings are
    /// single leaves.
    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        tag: &Tag,
        parent_width: f32,
    ) -> Result<NodeId, EngineError> {
        let bold = style.font_weight == FontWeight::Bold;
        let line_height_px = self.fonts.line_height_px(style.font_size, style.line_height);
        let inset_x = style.padding_left + style.padding_right + 2.0 * style.border_width;
        let inset_y = style.padding_top
            + style.padding_bottom
            + style.border_width
            + style.border_width.max(style.border_top_width);

        let outer = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => {
                if parent_width > 0.0 {
                    parent_width
                } else {
                    self.available_width
                }
            }
        } - style.margin_left
            - style.margin_right;
        let max_w = (outer - inset_x).max(1.0);
        let lines = wrap_text(text, style.font_size, bold, max_w, self.fonts);

        let text_width = lines
            .iter()
            .map(|l| self.fonts.measure_text_width(l, style.font_size, bold))
            .fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height_px;

        let mut taffy_style = self.computed_to_taffy(style, tag);
        taffy_style.display = taffy::Display::Block;
        taffy_style.min_size.width = taffy::Dimension::Length((text_width + inset_x).min(outer.max(0.0)));
        taffy_style.size.height = taffy::Dimension::Length(text_height + inset_y);

        let node = self.taffy.new_leaf(taffy_style)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(
            node,
            BoxContent::Text {
                text: text.to_string(),
                lines,
            },
        );
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> Result<NodeId, EngineError> {
        let inline_only = !children.is_empty() && Self::all_inline(children);

        // Paragraph-like blocks whose children are all inline become one
        // wrapped text leaf so spans flow correctly.
        if tag.is_text_block() && inline_only {
            let combined = Self::merged_text(children);
            if !combined.is_empty() {
                return self.build_text_node(&combined, style, tag, parent_width);
            }
        }

        // Compute the width available for children
        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width - style.margin_left - style.margin_right,
        };
        let my_width = match style.max_width {
            style::Dimension::Px(max) => my_width.min(max),
            _ => my_width,
        };
        let inner_width =
            (my_width - style.padding_left - style.padding_right - 2.0 * style.border_width).max(1.0);

        // Other containers with inline content get one anonymous text child.
        if inline_only && *tag != Tag::Img {
            let combined = Self::merged_text(children);
            let mut child_nodes = Vec::new();
            if !combined.is_empty() {
                let text_style = Self::text_style(style);
                child_nodes.push(self.build_text_node(&combined, &text_style, &Tag::Span, inner_width)?);
            }
            let node = self
                .taffy
                .new_with_children(self.computed_to_taffy(style, tag), &child_nodes)?;
            self.node_styles.insert(node, style.clone());
            return Ok(node);
        }

        // Estimate per-child width for flex-row containers, grids and table
        // rows so that text is word-wrapped to the right column width.
        let is_flex_row = style.display == style::Display::Flex
            && style.flex_direction == style::FlexDirection::Row;
        let elem_child_count = children
            .iter()
            .filter(|c| matches!(c, StyledNode::Element { .. }))
            .count()
            .max(1);
        let columns = match (style.display, tag) {
            (_, Tag::Tr) => elem_child_count,
            (style::Display::Grid, Tag::Table) => 1,
            (style::Display::Grid, _) => style.grid_columns.max(1),
            _ if is_flex_row => elem_child_count,
            _ => 1,
        };
        let gap_total = style.gap * columns.saturating_sub(1) as f32;
        let child_build_width = ((inner_width - gap_total) / columns as f32).max(1.0);

        // Build child nodes
        let mut child_nodes = Vec::new();
        let mut list_counter = 0u32;

        for child in children {
            // Record the list marker so it can be rendered in the gutter.
            let li_marker = match child {
                StyledNode::Element { tag: Tag::Li, .. } => {
                    list_counter += 1;
                    match style.list_style {
                        ListStyle::Disc => Some("\u{2022}".to_string()),
                        ListStyle::Decimal => Some(format!("{list_counter}.")),
                        ListStyle::None => None,
                    }
                }
                _ => None,
            };

            let child_id = self.build_node(child, child_build_width)?;

            if let Some(marker) = li_marker {
                self.node_content
                    .insert(child_id, BoxContent::ListItem { marker });
            }

            child_nodes.push(child_id);
        }

        // <img> with an Auto dimension takes its intrinsic size from the
        // decoded data URI, otherwise a childless flex box computes to 0×0.
        let style_override = if *tag == Tag::Img
            && (matches!(style.width, style::Dimension::Auto)
                || matches!(style.height, style::Dimension::Auto))
        {
            let src = attrs.get("src").map(|s| s.as_str()).unwrap_or("");
            resolve_img_auto_dimensions(src, style, parent_width)
        } else {
            None
        };

        let effective_style = style_override.as_ref().unwrap_or(style);
        let taffy_style = self.computed_to_taffy(effective_style, tag);
        let node = self.taffy.new_with_children(taffy_style, &child_nodes)?;
        self.node_styles.insert(node, effective_style.clone());

        if *tag == Tag::Img {
            let src = attrs.get("src").cloned().unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }

        Ok(node)
    }

    fn spacing(s: &ComputedStyle) -> (Rect<LengthPercentageAuto>, Rect<LengthPercentage>, Rect<LengthPercentage>) {
        let margin = Rect {
            top: LengthPercentageAuto::Length(s.margin_top),
            right: LengthPercentageAuto::Length(s.margin_right),
            bottom: LengthPercentageAuto::Length(s.margin_bottom),
            left: LengthPercentageAuto::Length(s.margin_left),
        };
        let padding = Rect {
            top: LengthPercentage::Length(s.padding_top),
            right: LengthPercentage::Length(s.padding_right),
            bottom: LengthPercentage::Length(s.padding_bottom),
            left: LengthPercentage::Length(s.padding_left),
        };
        let border = Rect {
            top: LengthPercentage::Length(s.border_width.max(s.border_top_width)),
            right: LengthPercentage::Length(s.border_width),
            bottom: LengthPercentage::Length(s.border_width),
            left: LengthPercentage::Length(s.border_width),
        };
        (margin, padding, border)
    }

    fn computed_to_taffy(&self, s: &ComputedStyle, tag: &Tag) -> Style {
        let mut ts = Style::default();
        let (margin, padding, border) = Self::spacing(s);

        // HTML table model: always flex regardless of computed display.
        match tag {
            Tag::Table => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.size.width = self.dim_to_taffy(s.width);
                ts.size.height = self.dim_to_taffy(s.height);
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.padding = padding;
                ts.margin = margin;
                return ts;
            }
            Tag::Tr => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.align_items = Some(taffy::AlignItems::Stretch);
                ts.size.width = taffy::Dimension::Percent(1.0);
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.margin = margin;
                return ts;
            }
            Tag::Td | Tag::Th => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.flex_grow = 1.0;
                ts.flex_shrink = 1.0;
                ts.flex_basis = taffy::Dimension::Length(0.0); // equal columns
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.padding = padding;
                ts.border = border;
                return ts;
            }
            _ => {}
        }

        match s.display {
            style::Display::Flex => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match s.flex_direction {
                    style::FlexDirection::Row => taffy::FlexDirection::Row,
                    style::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                    style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                    style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            style::Display::Grid => {
                ts.display = taffy::Display::Grid;
                let cols = s.grid_columns.max(1);
                ts.grid_template_columns = vec![taffy::TrackSizingFunction::from_flex(1.0); cols];
            }
            style::Display::Block
            | style::Display::ListItem
            | style::Display::TableRow
            | style::Display::TableCell
            | style::Display::InlineBlock => {
                // Vertical stacking.
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
            }
            style::Display::Inline => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.flex_wrap = taffy::FlexWrap::Wrap;
            }
            style::Display::None => {
                ts.display = taffy::Display::None;
            }
        }

        ts.size = Size {
            width: self.dim_to_taffy(s.width),
            height: self.dim_to_taffy(s.height),
        };
        // Allow flex/shrink items to compress below their natural content size
        ts.min_size = Size {
            width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
                taffy::Dimension::Length(0.0)
            } else {
                self.dim_to_taffy(s.min_width)
            },
            height: taffy::Dimension::Auto,
        };
        ts.max_size = Size {
            width: self.dim_to_taffy(s.max_width),
            height: taffy::Dimension::Auto,
        };

        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;
        ts.margin = margin;
        ts.padding = padding;
        ts.border = border;
        ts.gap = Size {
            width: LengthPercentage::Length(s.gap),
            height: LengthPercentage::Length(s.gap),
        };

        ts
    }

    fn dim_to_taffy(&self, d: style::Dimension) -> taffy::Dimension {
        match d {
            style::Dimension::Auto => taffy::Dimension::Auto,
            style::Dimension::Px(v) => taffy::Dimension::Length(v),
            style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
        }
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox, EngineError> {
        let layout = self.taffy.layout(node)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)?
            .iter()
            .map(|&child| self.extract(child, x, y))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            page_break_before: style.page_break_before,
            page_break_after: style.page_break_after,
            page_break_inside_avoid: style.page_break_inside_avoid,
            keep_with_next: style.keep_with_next,
            style,
            content,
            children,
        })
    }
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Decode a base64 data-URI image and return a cloned [`ComputedStyle`] whose
/// `Auto` width/height are replaced by sizes derived from the intrinsic
/// dimensions, capped at the container width like `max-width: 100%`.
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    let bytes = crate::render::parse_data_uri(src).ok()?;
    let (px_w, px_h) = ::image::load_from_memory(&bytes)
        .ok()
        .map(|img| (img.width() as f32, img.height() as f32))?;
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        (None, None) => {
            let w = if parent_width > 0.0 { px_w.min(parent_width) } else { px_w };
            s.width = style::Dimension::Px(w);
            s.height = style::Dimension::Px((w / aspect).max(1.0));
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled tree, returning the top-level positioned
/// boxes in document coordinates (CSS px, x already offset by the margin).
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    page_width: f32,
    page_margin: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>, EngineError> {
    let content_width = page_width - 2.0 * page_margin;
    let mut builder = LayoutBuilder::new(fonts, content_width);

    let child_ids = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, content_width))
        .collect::<Result<Vec<_>, _>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: taffy::Dimension::Length(content_width),
            height: taffy::Dimension::Auto,
        },
        ..Default::default()
    };

    let root = builder.taffy.new_with_children(root_style, &child_ids)?;
    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(content_width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    let root_box = builder.extract(root, page_margin, 0.0)?;
    Ok(root_box.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::style::{build_styled_tree, StyleContext};

    fn layout(html: &str) -> Vec<PositionedBox> {
        let dom = parse_html(html);
        let styled = build_styled_tree(&dom, None, &StyleContext::default());
        compute_layout(&styled, 794.0, 20.0, &FontManager::default()).unwrap()
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>");
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].width > 0.0, "Box should have width");
        assert!(boxes[0].height > 0.0, "Box should have height");
        assert!(matches!(&boxes[0].content, BoxContent::Text { text, .. } if text == "Hello world"));
    }

    #[test]
    fn layout_flex_row_places_items_side_by_side() {
        let boxes =
            layout(r#"<div class="flex"><div class="flex-1">A</div><div class="flex-1">B</div></div>"#);
        let row = &boxes[0];
        assert_eq!(row.children.len(), 2);
        assert!(row.children[1].x > row.children[0].x);
        assert!((row.children[0].y - row.children[1].y).abs() < 0.01);
    }

    #[test]
    fn list_items_carry_markers() {
        let boxes = layout("<ol><li>uno</li><li>dos <strong>tres</strong></li></ol>");
        let markers: Vec<_> = boxes[0]
            .children
            .iter()
            .filter_map(|li| match &li.content {
                BoxContent::ListItem { marker } => Some(marker.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec!["1.", "2."]);
        // Inline content of the second item is one anonymous run.
        assert!(matches!(
            &boxes[0].children[1].children[0].content,
            BoxContent::Text { text, .. } if text == "dos tres"
        ));
    }

    #[test]
    fn br_forces_a_new_line() {
        let boxes = layout("<p>uno<br>dos</p>");
        match &boxes[0].content {
            BoxContent::Text { lines, .. } => assert_eq!(lines, &vec!["uno", "dos"]),
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn headings_keep_with_next() {
        let boxes = layout("<h2>Título</h2><p>texto</p>");
        assert!(boxes[0].keep_with_next);
        assert!(!boxes[1].keep_with_next);
    }
}
