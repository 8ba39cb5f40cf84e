//! Pipeline – ties together parsing, styling, layout, pagination, and
//! rendering into a single function call.

use crate::brand::{CONTAINER_ID, DOCUMENT_TITLE};
use crate::dom::{body_children, find_by_id, parse_html, DomNode};
use crate::error::EngineError;
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::pagination::{paginate, PageGeometry, PAGE_MARGIN_PT};
use crate::render::{render_pdf, RasterOptions};
use crate::request::Orientation;
use crate::style::{build_styled_tree, StyleContext};

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Portrait page width in points (A4 = 595.28).
    pub page_width: f32,
    /// Portrait page height in points (A4 = 841.89).
    pub page_height: f32,
    /// Page margin in points.
    pub page_margin: f32,
    /// Swaps effective width/height when `Landscape`, and picks the viewport
    /// responsive classes are resolved against.
    pub orientation: Orientation,
    pub raster: RasterOptions,
    /// Render only the subtree with this id. `None` renders the whole body.
    pub container_id: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: DOCUMENT_TITLE.to_string(),
            page_width: 595.28,
            page_height: 841.89,
            page_margin: PAGE_MARGIN_PT,
            orientation: Orientation::Portrait,
            raster: RasterOptions::default(),
            container_id: Some(CONTAINER_ID.to_string()),
        }
    }
}

impl PipelineConfig {
    /// Default A4 config in the given orientation.
    pub fn a4(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }

    /// Render the whole body instead of the preview card.
    pub fn whole_body(mut self) -> Self {
        self.container_id = None;
        self
    }

    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            Orientation::Portrait => self.page_width,
            Orientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            Orientation::Portrait => self.page_height,
            Orientation::Landscape => self.page_width,
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(
            self.effective_width(),
            self.effective_height(),
            self.page_margin,
            self.orientation.viewport_px(),
        )
    }
}

/// Full pipeline: HTML string → PDF bytes plus the layout that produced them.
pub fn generate_pdf(html: &str, config: &PipelineConfig) -> Result<(Vec<u8>, LayoutConfig), EngineError> {
    let layout_config = compute_layout_config(html, config)?;
    let pdf_bytes = render_pdf(&layout_config, &config.raster)?;
    Ok((pdf_bytes, layout_config))
}

/// Everything up to (not including) painting – useful for testing.
pub fn compute_layout_config(html: &str, config: &PipelineConfig) -> Result<LayoutConfig, EngineError> {
    // 1. Parse and pick the render root
    let dom = parse_html(html);
    let roots = match &config.container_id {
        Some(id) => {
            let container = find_by_id(&dom, id).ok_or_else(|| EngineError::ContainerNotFound(id.clone()))?;
            vec![DomNode::Element(container.clone())]
        }
        None => body_children(&dom),
    };

    // 2. Style against the orientation's viewport
    let geometry = config.geometry();
    let ctx = StyleContext {
        viewport_px: config.orientation.viewport_px(),
    };
    let styled = build_styled_tree(&roots, None, &ctx);

    // 3. Layout
    let fonts = FontManager::default();
    let boxes = compute_layout(&styled, geometry.width_px(), geometry.margin_px(), &fonts)?;

    // 4. Paginate
    let mut layout_config = paginate(&boxes, &geometry, &fonts);
    layout_config.title = config.title.clone();
    log::debug!(
        "laid out {} top-level box(es) on {} page(s) ({})",
        boxes.len(),
        layout_config.pages.len(),
        config.orientation
    );
    Ok(layout_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_basic() {
        let html = "<h1>Hello</h1><p>World</p>";
        let (bytes, layout) = generate_pdf(html, &PipelineConfig::default().whole_body()).unwrap();
        assert!(!layout.pages.is_empty());
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert_eq!(layout.page_text(0), vec!["Hello", "World"]);
    }

    #[test]
    fn missing_container_is_reported() {
        let err = compute_layout_config("<p>x</p>", &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::ContainerNotFound(id) if id == CONTAINER_ID));
    }

    #[test]
    fn landscape_swaps_page_dimensions() {
        let config = PipelineConfig::a4(Orientation::Landscape).whole_body();
        let layout = compute_layout_config("<p>x</p>", &config).unwrap();
        assert!(layout.page_width_pt > layout.page_height_pt);
        assert!((config.geometry().width_px() - 1123.0).abs() < 0.01);
    }
}
