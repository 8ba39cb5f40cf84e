//! PDF painter – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::HashMap;
use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use ::image::codecs::jpeg::JpegEncoder;
use ::image::imageops::FilterType;
use ::image::{DynamicImage, Rgb as RgbPixel, RgbImage};
use printpdf::*;

use crate::error::EngineError;
use crate::layout_config::{LayoutBox, LayoutConfig};

/// CSS px per PDF point.
const PX_PER_PT: f32 = 96.0 / 72.0;

/// Raster asset handling: images are resampled to `scale` device pixels per
/// CSS px and embedded as JPEG.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub scale: f32,
    pub jpeg_quality: u8,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            jpeg_quality: 98,
        }
    }
}

/// A printpdf XObject together with the pixel dimensions it was encoded at.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Render a LayoutConfig into PDF bytes.
///
/// `<img>` elements whose `src` is not a base64 data URI, or whose bytes
/// cannot be decoded, are skipped with a `log::warn`.
pub fn render_pdf(config: &LayoutConfig, raster: &RasterOptions) -> Result<Vec<u8>, EngineError> {
    if config.page_width_pt <= 0.0 || config.page_height_pt <= 0.0 {
        return Err(EngineError::Paint(format!(
            "invalid page size {}x{}pt",
            config.page_width_pt, config.page_height_pt
        )));
    }
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);

    // ── Register every image once, at the largest size it is drawn ────────
    let mut widest: HashMap<&str, f32> = HashMap::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_images(lbox, &mut widest);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for (src, width_pt) in widest {
        let target_px = (width_pt * PX_PER_PT * raster.scale).ceil().max(1.0) as u32;
        let prepared = parse_data_uri(src).and_then(|bytes| prepare_raster(&bytes, target_px, raster.jpeg_quality));
        let (jpeg, px_width, px_height) = match prepared {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                continue;
            }
        };

        let raw = match RawImage::decode_from_bytes(&jpeg, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image: PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);
        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();
    for page_layout in &config.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &image_resources);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    log::debug!(
        "painted {} page(s), {} image(s)",
        pages.len(),
        image_resources.len()
    );
    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

/// Downsample an encoded image to at most `max_width_px` wide, flatten any
/// alpha onto white and re-encode it as JPEG.
///
/// Returns `(jpeg_bytes, width_px, height_px)`.
pub(crate) fn prepare_raster(
    bytes: &[u8],
    max_width_px: u32,
    quality: u8,
) -> Result<(Vec<u8>, u32, u32), String> {
    let decoded = ::image::load_from_memory(bytes).map_err(|e| format!("decode error: {e}"))?;
    let resized = if decoded.width() > max_width_px {
        let height = ((decoded.height() as u64 * max_width_px as u64) / decoded.width() as u64).max(1) as u32;
        decoded.resize_exact(max_width_px, height, FilterType::Lanczos3)
    } else {
        decoded
    };
    let rgb = flatten_on_white(&resized);

    let mut jpeg = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| format!("jpeg encode error: {e}"))?;
    Ok((jpeg.into_inner(), rgb.width(), rgb.height()))
}

fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let mix = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        RgbPixel([mix(r), mix(g), mix(b)])
    })
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en dash
            '\u{2014}' => 0x97, // em dash
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0xFF; printpdf passes these
    // bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
pub(crate) fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(format!("image src is not a data URI: {preview:?}"));
    };
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,`".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64 data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

fn collect_images<'a>(lbox: &'a LayoutBox, widest: &mut HashMap<&'a str, f32>) {
    if let Some(img) = &lbox.image {
        let entry = widest.entry(img.src.as_str()).or_insert(0.0);
        *entry = entry.max(img.width);
    }
    for child in &lbox.children {
        collect_images(child, widest);
    }
}

fn pdf_color(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Corners of a rectangle given its PDF-space top edge.
fn rect_points(x: f32, top: f32, width: f32, height: f32) -> Vec<LinePoint> {
    vec![
        point(x, top - height),
        point(x + width, top - height),
        point(x + width, top),
        point(x, top),
    ]
}

fn fill_rect(ops: &mut Vec<Op>, x: f32, top: f32, width: f32, height: f32, color: [f32; 4]) {
    ops.push(Op::SetFillColor {
        col: pdf_color(color),
    });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing {
                points: rect_points(x, top, width, height),
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}

fn write_text(ops: &mut Vec<Op>, text: &str, x: f32, baseline: f32, size: f32, font: BuiltinFont, color: [f32; 4]) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x),
            y: Pt(baseline),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font,
    });
    ops.push(Op::SetFillColor {
        col: pdf_color(color),
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(to_winlatin(text))],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
) {
    // PDF origin is bottom-left; layout origin is top-left.
    let top = page_height - lbox.y;

    if let Some(bg) = lbox.background_color {
        fill_rect(ops, lbox.x, top, lbox.width, lbox.height, bg);
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: pdf_color(border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: rect_points(lbox.x, top, lbox.width, lbox.height),
                is_closed: true,
            },
        });
    }

    if let Some(accent) = &lbox.accent {
        fill_rect(ops, lbox.x, top, lbox.width, accent.width, accent.color);
    }

    if let Some(text) = &lbox.text {
        let font = match (text.bold, text.italic) {
            (true, true) => BuiltinFont::HelveticaBoldOblique,
            (true, false) => BuiltinFont::HelveticaBold,
            (false, true) => BuiltinFont::HelveticaOblique,
            (false, false) => BuiltinFont::Helvetica,
        };
        // Half-leading above the glyphs, then the Helvetica ascender.
        let baseline_drop = (text.line_height - text.font_size) / 2.0 + text.font_size * 0.718;

        for tline in &text.lines {
            if tline.text.is_empty() {
                continue;
            }
            let text_x = lbox.x + tline.x_offset;
            let text_y = top - tline.y_offset - baseline_drop;
            write_text(ops, &tline.text, text_x, text_y, text.font_size, font, text.color);

            if text.underline {
                let underline_y = text_y - text.font_size * 0.1;
                ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
                ops.push(Op::SetOutlineColor {
                    col: pdf_color(text.color),
                });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: vec![point(text_x, underline_y), point(text_x + tline.width, underline_y)],
                        is_closed: false,
                    },
                });
            }
        }

        if let Some(marker) = &text.list_marker {
            let marker_x = lbox.x - text.font_size * 1.2;
            write_text(
                ops,
                marker,
                marker_x,
                top - baseline_drop,
                text.font_size,
                BuiltinFont::Helvetica,
                text.color,
            );
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.src) {
            // At dpi=72 printpdf draws 1 px = 1 pt, so scale = pt / px.
            let scale_x = img.width / res.px_width.max(1) as f32;
            let scale_y = img.height / res.px_height.max(1) as f32;
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(top - img.height)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, images);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::{BorderStyle, ImageContent, PageLayout};
    use ::image::{ImageFormat, Rgba, RgbaImage};
    use base64::Engine as _;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([76, 191, 140, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn render_empty_page() {
        let bytes = render_pdf(&LayoutConfig::a4(), &RasterOptions::default()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn zero_sized_page_is_a_paint_error() {
        let config = LayoutConfig {
            page_width_pt: 0.0,
            ..LayoutConfig::a4()
        };
        assert!(matches!(
            render_pdf(&config, &RasterOptions::default()),
            Err(EngineError::Paint(_))
        ));
    }

    #[test]
    fn raster_is_downsampled_and_jpeg_encoded() {
        let (jpeg, w, h) = prepare_raster(&png(400, 200), 100, 98).unwrap();
        assert_eq!((w, h), (100, 50));
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        // Smaller images keep their size.
        let (_, w, h) = prepare_raster(&png(40, 20), 100, 98).unwrap();
        assert_eq!((w, h), (40, 20));
    }

    #[test]
    fn translucent_pixels_flatten_onto_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])));
        assert_eq!(flatten_on_white(&img).get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn data_uri_parsing() {
        let uri = format!("data:image/png;base64,{}", BASE64_STD.encode(b"abc"));
        assert_eq!(parse_data_uri(&uri).unwrap(), b"abc");
        assert!(parse_data_uri("https://example.com/x.png").is_err());
        assert!(parse_data_uri("data:image/svg+xml,%3Csvg").is_err());
    }

    #[test]
    fn page_with_image_and_accent_renders() {
        let uri = format!("data:image/png;base64,{}", BASE64_STD.encode(png(64, 64)));
        let mut card = LayoutBox::new(20.0, 20.0, 200.0, 100.0);
        card.accent = Some(BorderStyle {
            width: 3.0,
            color: [0.3, 0.75, 0.55, 1.0],
        });
        let mut pic = LayoutBox::new(30.0, 30.0, 48.0, 48.0);
        pic.image = Some(ImageContent {
            src: uri,
            width: 48.0,
            height: 48.0,
        });
        card.children.push(pic);
        let config = LayoutConfig {
            pages: vec![PageLayout {
                page_index: 0,
                boxes: vec![card],
            }],
            ..LayoutConfig::a4()
        };
        let bytes = render_pdf(&config, &RasterOptions::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }
}
