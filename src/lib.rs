//! # guia-export – branded HTML guides → PDF
//!
//! Generated guides arrive as HTML fragments styled with Tailwind utility
//! classes. This crate wraps them in the brand document shell and exports
//! them to PDF through one of two strategies:
//!
//! * **Local** – the in-process engine: parse ([`dom`]), style ([`style`]),
//!   lay out with Taffy ([`layout`]), paginate to A4 ([`pagination`]) and
//!   paint with printpdf ([`render`]). Always portrait.
//! * **Remote** – POST the fragment to the render service ([`server`]) and
//!   download what it returns ([`remote`]).
//!
//! [`session::ExportController`] runs one export at a time and hands
//! successful artifacts to a [`download::DownloadSink`].

pub mod brand;
pub mod clipboard;
pub mod config;
pub mod content;
pub mod dom;
pub mod download;
pub mod engine;
pub mod error;
pub mod exporter;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod local;
pub mod normalize;
pub mod pagination;
pub mod pipeline;
pub mod remote;
pub mod render;
pub mod request;
pub mod server;
pub mod session;
pub mod style;

// Re-exports for convenience
pub use error::{ExportError, FailureKind};
pub use exporter::{ExportService, Exporter};
pub use normalize::{normalize, NormalizedDocument};
pub use pipeline::{generate_pdf, PipelineConfig};
pub use request::{ExportArtifact, ExportRequest, ExportStrategy, Orientation};
pub use session::{ExportController, ExportState};
