//! SVG rendering of payloads.
//!
//! Matrix computation is left to a [`QrEngine`]; this module only probes the matrix it
//! returns and lays out the dots and the optional logo.

mod engine;
mod matrix;
mod svg;

#[cfg(feature = "qrcode")]
pub use engine::QrCodeEngine;
pub use engine::{engine, reset_engine, set_engine, QrEngine};
pub use matrix::{ErrorCorrection, ModuleAccessor, ModuleMatrix, RawModules};
pub use svg::{generate_qr_svg, render_matrix, SvgOptions, SvgRenderer};
