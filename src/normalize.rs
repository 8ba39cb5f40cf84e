//! Content normalizer – wraps a generated HTML fragment in the branded,
//! self-contained document shell consumed by every renderer, and builds the
//! embeddable widget snippet used by the clipboard export.
//!
//! The fragment is embedded verbatim between two marker comments so it can be
//! recovered from a normalized document without re-parsing it.

use crate::brand::{self, colors};
use crate::request::Orientation;

const CONTENT_START: &str = "<!-- cf:content-start -->";
const CONTENT_END: &str = "<!-- cf:content-end -->";

/// Options that vary the shell without touching the fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellOptions {
    /// Viewport width the shell is laid out for, in CSS px.
    pub page_width_px: f32,
    /// Optional footer stamp (e.g. a generation date). The only
    /// non-constant text a shell may carry.
    pub footer_stamp: Option<String>,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self::for_orientation(Orientation::Portrait)
    }
}

impl ShellOptions {
    pub fn for_orientation(orientation: Orientation) -> Self {
        Self {
            page_width_px: orientation.viewport_px(),
            footer_stamp: None,
        }
    }

    pub fn with_footer_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.footer_stamp = Some(stamp.into());
        self
    }
}

/// A fragment wrapped in the brand shell. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    fragment: String,
    options: ShellOptions,
    html: String,
}

impl NormalizedDocument {
    /// Full HTML document text.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// The fragment this document was built from, byte for byte.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

/// Wrap `fragment` in the default (portrait) shell.
pub fn normalize(fragment: &str) -> NormalizedDocument {
    normalize_with(fragment, &ShellOptions::default())
}

/// Wrap `fragment` in a shell built from `options`.
pub fn normalize_with(fragment: &str, options: &ShellOptions) -> NormalizedDocument {
    let width = options.page_width_px.round() as u32;
    let stamp = options
        .footer_stamp
        .as_deref()
        .map(|s| format!("<span class=\"text-xs text-[{}] mr-4\">{}</span>", colors::GRAY, escape_text(s)))
        .unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="UTF-8" />
<meta name="viewport" content="width={width}, initial-scale=1.0" />
<title>{title}</title>
<script src="{tailwind}"></script>
<script>{tailwind_config}</script>
<link href="{fonts}" rel="stylesheet" />
<style>{css}</style>
</head>
<body class="bg-white">
<div class="w-full max-w-[{width}px] mx-auto">
<div id="{container}" class="bg-white rounded-xl overflow-hidden border border-gray-100 relative">
<div class="absolute top-0 right-0 w-32 h-32 bg-[{green}]/10 rounded-bl-full"></div>
<div class="absolute bottom-12 left-0 w-24 h-24 bg-[{yellow}]/10 rounded-tr-full"></div>
<div class="bg-white px-8 py-6 border-b border-gray-100 flex justify-between items-center">
<div class="flex items-center gap-2">
<div class="w-8 h-8 bg-[{green}] flex items-center justify-center"><p class="text-white font-bold text-sm">CF</p></div>
<p class="font-bold text-lg text-[{gray}]">Comunidad<span class="text-[{green}]">Feliz</span></p>
</div>
<div class="h-1 w-16 bg-[{blue}]/20"></div>
</div>
<div class="p-8 md:p-12">
<div class="prose max-w-none">
{start}{fragment}{end}
</div>
</div>
<div class="w-full h-8 bg-[{celeste}] flex items-center justify-end px-4" style="background-image: {pattern}; background-size: 20px 20px">
{stamp}<p class="text-xs text-[{gray}] font-medium">{footer}</p>
</div>
</div>
</div>
</body>
</html>
"#,
        width = width,
        title = brand::DOCUMENT_TITLE,
        tailwind = brand::TAILWIND_CDN,
        tailwind_config = brand::tailwind_config_script(),
        fonts = brand::FONTS_HREF,
        css = PRINT_CSS,
        container = brand::CONTAINER_ID,
        green = colors::GREEN,
        yellow = colors::YELLOW,
        blue = colors::BLUE,
        gray = colors::GRAY,
        celeste = colors::CELESTE,
        pattern = brand::CUBE_PATTERN,
        start = CONTENT_START,
        end = CONTENT_END,
        fragment = fragment,
        stamp = stamp,
        footer = brand::FOOTER_TEXT,
    );

    NormalizedDocument {
        fragment: fragment.to_string(),
        options: options.clone(),
        html,
    }
}

/// Recover the embedded fragment from a normalized document's HTML.
pub fn extract_fragment(html: &str) -> Option<&str> {
    let start = html.find(CONTENT_START)? + CONTENT_START.len();
    let end = html.rfind(CONTENT_END)?;
    (start <= end).then(|| &html[start..end])
}

/// Build the self-contained widget snippet placed on the clipboard.
pub fn widget_snippet(fragment: &str) -> String {
    format!(
        r#"<!-- ComunidadFeliz Widget Start -->
<div id="{id}">
<script src="{tailwind}"></script>
<link href="{fonts}" rel="stylesheet">
<script>{tailwind_config}</script>
<style>#{id} {{ font-family: 'Montserrat', sans-serif; color: {gray}; }}</style>
<div class="bg-[#fafafa] p-4 md:p-8 rounded-xl border-t-4 border-[{green}] shadow-lg">
{fragment}
</div>
</div>
<!-- ComunidadFeliz Widget End -->"#,
        id = brand::WIDGET_ID,
        tailwind = brand::TAILWIND_CDN,
        fonts = brand::FONTS_HREF,
        tailwind_config = brand::tailwind_config_script(),
        gray = colors::GRAY,
        green = colors::GREEN,
        fragment = fragment.trim(),
    )
}

/// Print rules shared with browser-based renderers: keep cards, tables and
/// images whole and keep headings with what follows.
const PRINT_CSS: &str = "body { font-family: 'Montserrat', sans-serif; color: #4e526e; background-color: #ffffff; } \
.rounded-xl, .rounded-2xl, .shadow-md, .shadow-lg, .shadow-sm, table, tr, img, figure, .bg-white { page-break-inside: avoid; break-inside: avoid; } \
h1, h2, h3, h4, h5, h6 { page-break-after: avoid; break-after: avoid; } \
p, li { orphans: 3; widows: 3; }";

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
