//! Style resolver – maps inline styles and the Tailwind vocabulary used by
//! generated guides (brand palette, arbitrary `[#hex]` values, responsive
//! prefixes) to a flat [`ComputedStyle`] consumed by the layout engine.

use std::collections::HashMap;

use crate::dom::{DomNode, ElementNode, Tag};

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,
    pub grid_columns: usize,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    // Spacing (px)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,
    /// Accent bar drawn along the top edge (`border-t-4`).
    pub border_top_width: f32,
    pub border_color: Color,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub font_style: FontStyle,
    pub list_style: ListStyle,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
    /// Never end a page with this box (headings).
    pub keep_with_next: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            grid_columns: 0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_top_width: 0.0,
            border_color: Color::GRAY_200,
            font_size: 16.0,
            font_weight: FontWeight::Normal,
            font_family: "Montserrat".to_string(),
            color: Color::BRAND_TEXT,
            text_align: TextAlign::Left,
            line_height: 1.5,
            text_decoration: TextDecoration::None,
            font_style: FontStyle::Normal,
            list_style: ListStyle::Disc,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
            keep_with_next: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Grid,
    Inline,
    InlineBlock,
    ListItem,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Disc,
    Decimal,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };
    /// #4e526e, the brand body text colour.
    pub const BRAND_TEXT: Self = Self::rgb(0.306, 0.322, 0.431);
    /// #e5e7eb
    pub const GRAY_200: Self = Self::rgb(0.898, 0.906, 0.922);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Composite this colour at `alpha` over a white page. Pages are always
    /// white, so translucent fills can be flattened to opaque ones.
    pub fn over_white(self, alpha: f32) -> Self {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |c: f32| c * a + (1.0 - a);
        Self::rgb(mix(self.r), mix(self.g), mix(self.b))
    }
}

/// Resolve a palette name (`cf-green`, `gray-600`, `white`, `[#4cbf8c]`),
/// with an optional `/NN` opacity suffix.
fn palette_color(name: &str) -> Option<Color> {
    let (base, alpha) = match name.rsplit_once('/') {
        Some((base, pct)) if !base.ends_with('[') => {
            (base, pct.parse::<f32>().ok().map(|p| p / 100.0))
        }
        _ => (name, None),
    };

    let color = if let Some(inner) = base.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
        Color::from_hex(inner)?
    } else {
        let hex = match base {
            "white" => "#ffffff",
            "black" => "#000000",
            "cf-green" => "#4cbf8c",
            "cf-blue" => "#005fc5",
            "cf-celeste" => "#eef3fe",
            "cf-yellow" => "#ffc000",
            "cf-red" => "#ff6b75",
            "cf-gray" => "#4e526e",
            "gray-50" => "#f9fafb",
            "gray-100" => "#f3f4f6",
            "gray-200" => "#e5e7eb",
            "gray-300" => "#d1d5db",
            "gray-400" => "#9ca3af",
            "gray-500" => "#6b7280",
            "gray-600" => "#4b5563",
            "gray-700" => "#374151",
            "gray-800" => "#1f2937",
            "gray-900" => "#111827",
            "red-500" => "#ef4444",
            "blue-500" => "#3b82f6",
            "green-500" => "#22c55e",
            "yellow-500" => "#eab308",
            _ => return None,
        };
        Color::from_hex(hex)?
    };

    Some(match alpha {
        Some(a) => color.over_white(a),
        None => color,
    })
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Viewport the document is being laid out for; drives responsive prefixes.
#[derive(Debug, Clone, Copy)]
pub struct StyleContext {
    pub viewport_px: f32,
}

impl Default for StyleContext {
    fn default() -> Self {
        Self { viewport_px: 794.0 }
    }
}

/// Minimum viewport width for a Tailwind responsive prefix, or `None` for
/// state variants (`hover:`, `prose-h1:` …) that never apply on paper.
fn breakpoint_min(prefix: &str) -> Option<f32> {
    match prefix {
        "sm" => Some(640.0),
        "md" => Some(768.0),
        "lg" => Some(1024.0),
        "xl" => Some(1280.0),
        "2xl" => Some(1536.0),
        _ => None,
    }
}

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(
    element: &ElementNode,
    parent: Option<&ComputedStyle>,
    ctx: &StyleContext,
) -> ComputedStyle {
    let mut style = base_style_for_tag(&element.tag);

    if let Some(p) = parent {
        style.font_family = p.font_family.clone();
        style.color = p.color;
        style.text_align = p.text_align;
        style.line_height = p.line_height;
        if !element.tag.is_heading() {
            style.font_size = p.font_size;
            if style.font_weight == FontWeight::Normal {
                style.font_weight = p.font_weight;
            }
        }
        if style.font_style == FontStyle::Normal {
            style.font_style = p.font_style;
        }
    }

    // Unprefixed utilities first, then responsive ones in breakpoint order,
    // matching Tailwind's stylesheet order.
    let mut responsive: Vec<(f32, &str)> = Vec::new();
    for class in element.classes() {
        match class.rsplit_once(':') {
            None => apply_tailwind_class(&mut style, class),
            Some((prefix, utility)) => {
                if let Some(min) = breakpoint_min(prefix) {
                    if ctx.viewport_px >= min {
                        responsive.push((min, utility));
                    }
                }
            }
        }
    }
    responsive.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (_, utility) in responsive {
        apply_tailwind_class(&mut style, utility);
    }

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }

    style
}

/// Default styles based on tag semantics.
fn base_style_for_tag(tag: &Tag) -> ComputedStyle {
    let mut s = ComputedStyle::default();
    let heading = |s: &mut ComputedStyle, size: f32, top: f32, bottom: f32| {
        s.font_size = size;
        s.font_weight = FontWeight::Bold;
        s.margin_top = top;
        s.margin_bottom = bottom;
        s.keep_with_next = true;
    };
    match tag {
        Tag::H1 => heading(&mut s, 32.0, 16.0, 12.0),
        Tag::H2 => heading(&mut s, 24.0, 14.0, 10.0),
        Tag::H3 => heading(&mut s, 20.0, 12.0, 8.0),
        Tag::H4 => heading(&mut s, 18.0, 10.0, 6.0),
        Tag::H5 => heading(&mut s, 16.0, 8.0, 4.0),
        Tag::H6 => heading(&mut s, 14.0, 8.0, 4.0),
        Tag::P => {
            s.margin_bottom = 10.0;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_bottom = 10.0;
            s.padding_left = 24.0;
            s.list_style = if *tag == Tag::Ol {
                ListStyle::Decimal
            } else {
                ListStyle::Disc
            };
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 4.0;
        }
        Tag::Table => {
            s.display = Display::Grid;
            s.border_width = 1.0;
            s.page_break_inside_avoid = true;
        }
        Tag::Tr => {
            s.display = Display::TableRow;
            s.page_break_inside_avoid = true;
        }
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 4.0;
            s.padding_right = 8.0;
            s.padding_bottom = 4.0;
            s.padding_left = 8.0;
            s.border_width = 1.0;
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
                s.background_color = Color::rgb(0.93, 0.93, 0.93);
            }
        }
        Tag::Span | Tag::Br => {
            s.display = Display::Inline;
        }
        Tag::Strong => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::Em => {
            s.display = Display::Inline;
            s.font_style = FontStyle::Italic;
        }
        Tag::A => {
            s.display = Display::Inline;
            s.text_decoration = TextDecoration::Underline;
        }
        Tag::Img => {
            s.display = Display::InlineBlock;
            s.page_break_inside_avoid = true;
        }
        Tag::Head | Tag::Metadata(_) => {
            s.display = Display::None;
        }
        Tag::Div | Tag::Body | Tag::Html | Tag::Unknown(_) => {}
    }
    s
}

/// Apply a single Tailwind utility class.
fn apply_tailwind_class(s: &mut ComputedStyle, class: &str) {
    match class {
        // Display; positioned decorations are out of flow and not painted.
        "flex" | "inline-flex" => s.display = Display::Flex,
        "grid" => s.display = Display::Grid,
        "block" => s.display = Display::Block,
        "inline" => s.display = Display::Inline,
        "inline-block" => s.display = Display::InlineBlock,
        "hidden" | "absolute" | "fixed" => s.display = Display::None,

        "flex-row" => s.flex_direction = FlexDirection::Row,
        "flex-col" => s.flex_direction = FlexDirection::Column,
        "flex-wrap" => s.flex_wrap = FlexWrap::Wrap,
        "flex-nowrap" => s.flex_wrap = FlexWrap::NoWrap,
        "flex-grow" | "grow" => s.flex_grow = 1.0,
        "flex-shrink" | "shrink" => s.flex_shrink = 1.0,
        "flex-shrink-0" | "shrink-0" => s.flex_shrink = 0.0,
        "flex-1" => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
        }

        "justify-start" => s.justify_content = JustifyContent::Start,
        "justify-end" => s.justify_content = JustifyContent::End,
        "justify-center" => s.justify_content = JustifyContent::Center,
        "justify-between" => s.justify_content = JustifyContent::SpaceBetween,
        "justify-around" => s.justify_content = JustifyContent::SpaceAround,
        "justify-evenly" => s.justify_content = JustifyContent::SpaceEvenly,

        "items-start" => s.align_items = AlignItems::Start,
        "items-end" => s.align_items = AlignItems::End,
        "items-center" => s.align_items = AlignItems::Center,
        "items-stretch" => s.align_items = AlignItems::Stretch,

        "font-bold" | "font-semibold" | "font-extrabold" | "font-black" => {
            s.font_weight = FontWeight::Bold
        }
        "font-normal" | "font-medium" | "font-light" => s.font_weight = FontWeight::Normal,
        "italic" => s.font_style = FontStyle::Italic,
        "not-italic" => s.font_style = FontStyle::Normal,
        "underline" => s.text_decoration = TextDecoration::Underline,
        "no-underline" => s.text_decoration = TextDecoration::None,
        "text-left" => s.text_align = TextAlign::Left,
        "text-center" => s.text_align = TextAlign::Center,
        "text-right" => s.text_align = TextAlign::Right,

        "text-xs" => s.font_size = 12.0,
        "text-sm" => s.font_size = 14.0,
        "text-base" => s.font_size = 16.0,
        "text-lg" => s.font_size = 18.0,
        "text-xl" => s.font_size = 20.0,
        "text-2xl" => s.font_size = 24.0,
        "text-3xl" => s.font_size = 30.0,
        "text-4xl" => s.font_size = 36.0,
        "text-5xl" => s.font_size = 48.0,

        "leading-none" => s.line_height = 1.0,
        "leading-tight" => s.line_height = 1.25,
        "leading-snug" => s.line_height = 1.375,
        "leading-normal" => s.line_height = 1.5,
        "leading-relaxed" => s.line_height = 1.625,
        "leading-loose" => s.line_height = 2.0,

        "list-disc" => s.list_style = ListStyle::Disc,
        "list-decimal" => s.list_style = ListStyle::Decimal,
        "list-none" => s.list_style = ListStyle::None,

        "w-full" => s.width = Dimension::Percent(100.0),
        "w-auto" => s.width = Dimension::Auto,
        "w-1/2" => s.width = Dimension::Percent(50.0),
        "w-1/3" => s.width = Dimension::Percent(33.333),
        "w-2/3" => s.width = Dimension::Percent(66.666),
        "w-1/4" => s.width = Dimension::Percent(25.0),
        "w-3/4" => s.width = Dimension::Percent(75.0),
        "max-w-none" => s.max_width = Dimension::Auto,

        "border" => s.border_width = s.border_width.max(1.0),
        "border-0" => s.border_width = 0.0,

        // Card-like surfaces are never split across pages.
        "bg-white" => {
            s.background_color = Color::WHITE;
            s.page_break_inside_avoid = true;
        }
        "bg-[#eef3fe]" | "bg-cf-celeste" => {
            s.background_color = Color::rgb(0.933, 0.953, 0.996);
            s.page_break_inside_avoid = true;
        }

        "break-before" | "break-before-page" => s.page_break_before = true,
        "break-after" | "break-after-page" | "page-break" => s.page_break_after = true,
        "break-inside-avoid" => s.page_break_inside_avoid = true,

        _ => {
            if class.starts_with("rounded") || class.starts_with("shadow") {
                s.page_break_inside_avoid = true;
                return;
            }
            try_parse_spacing_class(s, class);
            try_parse_color_class(s, class);
            try_parse_border_class(s, class);
            try_parse_gap_class(s, class);
            try_parse_grid_cols_class(s, class);
            try_parse_size_class(s, class);
        }
    }
}

/// Tailwind spacing scale value: `4` → 16px, `[20px]` → 20px, `px` → 1px.
fn spacing_value(raw: &str) -> Option<f32> {
    if raw == "px" {
        return Some(1.0);
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return parse_px(inner);
    }
    raw.parse::<f32>().ok().map(|v| v * 4.0)
}

fn try_parse_spacing_class(s: &mut ComputedStyle, class: &str) {
    let Some((prefix, raw)) = class.split_once('-') else {
        return;
    };
    let Some(value) = spacing_value(raw) else {
        return;
    };
    match prefix {
        "p" => {
            s.padding_top = value;
            s.padding_right = value;
            s.padding_bottom = value;
            s.padding_left = value;
        }
        "px" => {
            s.padding_left = value;
            s.padding_right = value;
        }
        "py" => {
            s.padding_top = value;
            s.padding_bottom = value;
        }
        "pt" => s.padding_top = value,
        "pr" => s.padding_right = value,
        "pb" => s.padding_bottom = value,
        "pl" => s.padding_left = value,
        "m" => {
            s.margin_top = value;
            s.margin_right = value;
            s.margin_bottom = value;
            s.margin_left = value;
        }
        "mx" => {
            s.margin_left = value;
            s.margin_right = value;
        }
        "my" => {
            s.margin_top = value;
            s.margin_bottom = value;
        }
        "mt" => s.margin_top = value,
        "mr" => s.margin_right = value,
        "mb" => s.margin_bottom = value,
        "ml" => s.margin_left = value,
        _ => {}
    }
}

fn try_parse_color_class(s: &mut ComputedStyle, class: &str) {
    if let Some(name) = class.strip_prefix("text-") {
        if let Some(c) = palette_color(name) {
            s.color = c;
        }
    } else if let Some(name) = class.strip_prefix("bg-") {
        if let Some(c) = palette_color(name) {
            s.background_color = c;
        }
    }
}

fn try_parse_border_class(s: &mut ComputedStyle, class: &str) {
    let Some(rest) = class.strip_prefix("border-") else {
        return;
    };
    if let Some(width) = rest.strip_prefix("t-").and_then(|w| w.parse::<f32>().ok()) {
        s.border_top_width = width;
    } else if let Ok(width) = rest.parse::<f32>() {
        s.border_width = width;
    } else if let Some(c) = palette_color(rest) {
        s.border_color = c;
    }
}

fn try_parse_gap_class(s: &mut ComputedStyle, class: &str) {
    // space-y-* / space-x-* behave like a gap on our flex containers.
    let raw = class
        .strip_prefix("gap-")
        .or_else(|| class.strip_prefix("space-y-"))
        .or_else(|| class.strip_prefix("space-x-"));
    if let Some(v) = raw.and_then(spacing_value) {
        s.gap = v;
    }
}

fn try_parse_grid_cols_class(s: &mut ComputedStyle, class: &str) {
    if let Some(n) = class
        .strip_prefix("grid-cols-")
        .and_then(|rest| rest.parse::<usize>().ok())
    {
        s.grid_columns = n;
    }
}

fn try_parse_size_class(s: &mut ComputedStyle, class: &str) {
    if let Some(rest) = class.strip_prefix("max-w-") {
        if let Some(px) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')).and_then(parse_px) {
            s.max_width = Dimension::Px(px);
        }
    } else if let Some(v) = class.strip_prefix("w-").and_then(spacing_value) {
        s.width = Dimension::Px(v);
    } else if let Some(v) = class.strip_prefix("h-").and_then(spacing_value) {
        s.height = Dimension::Px(v);
    }
}

// ---------------------------------------------------------------------------
// Inline style parsing (limited subset)
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in style_str.split(';') {
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        apply_css_property(s, prop.trim(), val.trim());
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let set_px = |target: &mut f32| {
        if let Some(px) = parse_px(val) {
            *target = px;
        }
    };
    let breaks = val == "always" || val == "page";
    match prop {
        "display" => {
            s.display = match val {
                "flex" | "inline-flex" => Display::Flex,
                "grid" => Display::Grid,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" => FlexDirection::Row,
                "column" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "font-size" => set_px(&mut s.font_size),
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = if val == "italic" {
                FontStyle::Italic
            } else {
                FontStyle::Normal
            }
        }
        "color" => {
            if let Some(c) = Color::from_hex(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::from_hex(val) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "max-width" => s.max_width = parse_dimension(val),
        "margin" => apply_shorthand_spacing(
            val,
            [
                &mut s.margin_top,
                &mut s.margin_right,
                &mut s.margin_bottom,
                &mut s.margin_left,
            ],
        ),
        "margin-top" => set_px(&mut s.margin_top),
        "margin-right" => set_px(&mut s.margin_right),
        "margin-bottom" => set_px(&mut s.margin_bottom),
        "margin-left" => set_px(&mut s.margin_left),
        "padding" => apply_shorthand_spacing(
            val,
            [
                &mut s.padding_top,
                &mut s.padding_right,
                &mut s.padding_bottom,
                &mut s.padding_left,
            ],
        ),
        "padding-top" => set_px(&mut s.padding_top),
        "padding-right" => set_px(&mut s.padding_right),
        "padding-bottom" => set_px(&mut s.padding_bottom),
        "padding-left" => set_px(&mut s.padding_left),
        "border-width" | "border" => {
            if let Some(px) = val.split_whitespace().find_map(parse_px) {
                s.border_width = px;
            }
        }
        "border-top" | "border-top-width" => {
            if let Some(px) = val.split_whitespace().find_map(parse_px) {
                s.border_top_width = px;
            }
        }
        "border-color" => {
            if let Some(c) = Color::from_hex(val) {
                s.border_color = c;
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(px) = parse_px(val) {
                s.line_height = px / s.font_size;
            }
        }
        "gap" => set_px(&mut s.gap),
        "break-before" | "page-break-before" => s.page_break_before = breaks,
        "break-after" | "page-break-after" => {
            s.page_break_after = breaks;
            s.keep_with_next = val == "avoid";
        }
        "break-inside" | "page-break-inside" => s.page_break_inside_avoid = val == "avoid",
        _ => {}
    }
}

fn parse_px(s: &str) -> Option<f32> {
    s.trim().trim_end_matches("px").parse().ok()
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" || s == "none" {
        Dimension::Auto
    } else if let Some(pct) = s.strip_suffix('%') {
        pct.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_px(s).map(Dimension::Px).unwrap_or(Dimension::Auto)
    }
}

fn apply_shorthand_spacing(val: &str, [top, right, bottom, left]: [&mut f32; 4]) {
    let parts: Vec<f32> = val.split_whitespace().filter_map(parse_px).collect();
    let (t, r, b, l) = match parts[..] {
        [all] => (all, all, all, all),
        [v, h] => (v, h, v, h),
        [t, h, b] => (t, h, b, h),
        [t, r, b, l] => (t, r, b, l),
        _ => return,
    };
    *top = t;
    *right = r;
    *bottom = b;
    *left = l;
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
/// `display: none` subtrees are dropped here.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
    ctx: &StyleContext,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style, ctx);
                if style.display == Display::None {
                    continue;
                }
                let children = build_styled_tree(&e.children, Some(&style), ctx);
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                // Text renders inline: keep typography, drop the box model.
                let parent = parent_style.cloned().unwrap_or_default();
                let style = ComputedStyle {
                    font_size: parent.font_size,
                    font_weight: parent.font_weight,
                    font_family: parent.font_family,
                    color: parent.color,
                    text_align: parent.text_align,
                    line_height: parent.line_height,
                    text_decoration: parent.text_decoration,
                    font_style: parent.font_style,
                    ..ComputedStyle::default()
                };
                result.push(StyledNode::Text {
                    text: text.clone(),
                    style,
                });
            }
        }
    }
    result
}
