//! Brand constants shared by the document shell, the clipboard widget and
//! the download surface. Values are passed through to the renderers as-is.

/// Brand palette, as hex strings understood by both Tailwind and the engine.
pub mod colors {
    pub const GREEN: &str = "#4cbf8c";
    pub const BLUE: &str = "#005fc5";
    pub const CELESTE: &str = "#eef3fe";
    pub const YELLOW: &str = "#ffc000";
    pub const RED: &str = "#ff6b75";
    pub const GRAY: &str = "#4e526e";
}

/// Element id of the card that wraps header, content and footer. The local
/// exporter renders exactly this subtree.
pub const CONTAINER_ID: &str = "cf-preview-card";

/// Element id of the clipboard widget root.
pub const WIDGET_ID: &str = "cf-guide-widget";

/// Stem shared by every exported file name.
pub const FILE_STEM: &str = "guia-comunidadfeliz";

pub const DOCUMENT_TITLE: &str = "Guía Generada - ComunidadFeliz";

pub const FOOTER_TEXT: &str = "GENERADO POR COMUNIDADFELIZ";

pub const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com?plugins=typography";

pub const FONTS_HREF: &str =
    "https://fonts.googleapis.com/css2?family=Montserrat:wght@400;500;600;700&display=swap";

/// Footer texture as an inline SVG data URI so it resolves in isolated
/// rendering contexts.
pub const CUBE_PATTERN: &str = "url(\"data:image/svg+xml,%3Csvg width='20' height='20' viewBox='0 0 20 20' xmlns='http://www.w3.org/2000/svg'%3E%3Cg fill='%234cbf8c' fill-opacity='0.2' fill-rule='evenodd'%3E%3Cpath d='M0 0h10v10H0V0zm10 10h10v10H10V10z'/%3E%3C/g%3E%3C/svg%3E\")";

/// Tailwind runtime configuration registering the `cf-*` palette and the
/// Montserrat font stack.
pub fn tailwind_config_script() -> String {
    format!(
        "tailwind.config = {{ theme: {{ extend: {{ fontFamily: {{ sans: ['Montserrat', 'sans-serif'] }}, \
         colors: {{ cf: {{ green: '{}', blue: '{}', celeste: '{}', yellow: '{}', red: '{}', gray: '{}' }} }} }} }} }}",
        colors::GREEN,
        colors::BLUE,
        colors::CELESTE,
        colors::YELLOW,
        colors::RED,
        colors::GRAY,
    )
}
