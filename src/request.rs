//! Export request and artifact types shared by both exporters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::brand::FILE_STEM;

/// Page orientation requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Height > width (default).
    #[default]
    Portrait,
    /// Width > height.
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    /// CSS viewport width used to lay out an A4 page in this orientation.
    pub fn viewport_px(self) -> f32 {
        match self {
            Orientation::Portrait => 794.0,
            Orientation::Landscape => 1123.0,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!("unknown orientation: {other:?}")),
        }
    }
}

/// Which backend performs the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    /// In-process rendering, no network.
    Local,
    /// Render service reached over HTTP.
    Remote,
}

impl fmt::Display for ExportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStrategy::Local => f.write_str("local"),
            ExportStrategy::Remote => f.write_str("remote"),
        }
    }
}

/// One export, as requested by the caller.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Generated HTML fragment, embedded verbatim.
    pub fragment: String,
    pub orientation: Orientation,
    pub strategy: ExportStrategy,
}

impl ExportRequest {
    pub fn new(fragment: impl Into<String>, orientation: Orientation, strategy: ExportStrategy) -> Self {
        Self {
            fragment: fragment.into(),
            orientation,
            strategy,
        }
    }

    pub fn local(fragment: impl Into<String>) -> Self {
        Self::new(fragment, Orientation::Portrait, ExportStrategy::Local)
    }

    pub fn remote(fragment: impl Into<String>, orientation: Orientation) -> Self {
        Self::new(fragment, orientation, ExportStrategy::Remote)
    }

    /// True when the fragment holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.fragment.trim().is_empty()
    }
}

/// A finished PDF ready for the download surface.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Orientation the bytes were actually rendered in.
    pub orientation: Orientation,
    pub strategy: ExportStrategy,
}

impl ExportArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// JSON body of `POST {base}/export`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub html_content: String,
    /// Missing or unrecognised values mean portrait.
    #[serde(default, deserialize_with = "lenient_orientation")]
    pub orientation: Orientation,
}

impl ExportPayload {
    pub fn from_request(request: &ExportRequest) -> Self {
        Self {
            html_content: request.fragment.clone(),
            orientation: request.orientation,
        }
    }
}

fn lenient_orientation<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Orientation, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
}

/// File name for artifacts produced by the local exporter.
pub fn local_filename() -> String {
    format!("{FILE_STEM}.pdf")
}

/// File name for artifacts produced by the remote exporter.
pub fn remote_filename(orientation: Orientation) -> String {
    format!("{FILE_STEM}-{orientation}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_filenames_embed_orientation() {
        assert_eq!(
            remote_filename(Orientation::Landscape),
            "guia-comunidadfeliz-landscape.pdf"
        );
        assert_eq!(
            remote_filename(Orientation::Portrait),
            "guia-comunidadfeliz-portrait.pdf"
        );
        assert_eq!(local_filename(), "guia-comunidadfeliz.pdf");
    }

    #[test]
    fn orientation_wire_format() {
        let json = serde_json::to_string(&Orientation::Landscape).unwrap();
        assert_eq!(json, "\"landscape\"");
        assert_eq!("Portrait".parse::<Orientation>(), Ok(Orientation::Portrait));
        assert!("diagonal".parse::<Orientation>().is_err());
    }

    #[test]
    fn payload_orientation_is_lenient() {
        let p: ExportPayload = serde_json::from_str(r#"{"html_content":"<p>x</p>"}"#).unwrap();
        assert_eq!(p.orientation, Orientation::Portrait);
        let p: ExportPayload =
            serde_json::from_str(r#"{"html_content":"<p>x</p>","orientation":"sideways"}"#).unwrap();
        assert_eq!(p.orientation, Orientation::Portrait);
        let p: ExportPayload =
            serde_json::from_str(r#"{"html_content":"<p>x</p>","orientation":"landscape"}"#).unwrap();
        assert_eq!(p.orientation, Orientation::Landscape);
        let json = serde_json::to_value(ExportPayload::from_request(&ExportRequest::remote("<p>x</p>", Orientation::Landscape))).unwrap();
        assert_eq!(json, serde_json::json!({"html_content": "<p>x</p>", "orientation": "landscape"}));
    }

    #[test]
    fn whitespace_fragment_is_blank() {
        assert!(ExportRequest::remote("  \n\t", Orientation::Portrait).is_blank());
        assert!(!ExportRequest::local("<p>Hola</p>").is_blank());
    }
}
