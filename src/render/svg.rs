use std::sync::Arc;

use serde::Deserialize;

use super::{
    engine::{self, QrEngine},
    matrix::{ErrorCorrection, ModuleMatrix},
};
use crate::{encode, Error, PaymentInput};

const DOT_COLOR: &str = "#1A1A1A";
const BACKGROUND_COLOR: &str = "#FFFFFF";
const DOT_RADIUS_RATIO: f64 = 0.44;
const FINDER_RADIUS_RATIO: f64 = 0.8;
const FINDER_PATTERN_SIZE: usize = 7;

/// Rendering options, deserializable from the camelCase option bag used by web clients.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SvgOptions {
    /// Side of the image in pixels.
    pub size: f64,
    pub margin: f64,

    /// Image embedded at the center. Empty disables the overlay.
    pub logo_data_url: String,

    /// Logo side relative to the code, kept within `0.05..=0.5`.
    pub logo_size_ratio: f64,

    /// Padding relative to the logo side, kept within `0..=0.25`.
    pub logo_padding_ratio: f64,

    /// Corner radius relative to the logo background, kept within `0..=0.5`.
    pub logo_border_radius_ratio: f64,

    pub logo_background_color: String,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            size: 400.0,
            margin: 0.0,
            logo_data_url: String::new(),
            logo_size_ratio: 0.18,
            logo_padding_ratio: 0.0,
            logo_border_radius_ratio: 0.5,
            logo_background_color: BACKGROUND_COLOR.into(),
        }
    }
}

impl SvgOptions {
    pub fn with_logo(mut self, data_url: impl Into<String>) -> Self {
        self.logo_data_url = data_url.into();
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }
}

/// Draws payloads as dot-style SVG QR codes.
#[derive(Clone)]
pub struct SvgRenderer {
    engine: Arc<dyn QrEngine>,
}

impl SvgRenderer {
    pub fn new(engine: Arc<dyn QrEngine>) -> Self {
        Self { engine }
    }

    /// Renderer over the process-wide engine.
    pub fn global() -> Result<Self, Error> {
        Ok(Self::new(engine::engine()?))
    }

    pub fn render_payload(&self, payload: &str, options: &SvgOptions) -> Result<String, Error> {
        let matrix = self
            .engine
            .create(payload, ErrorCorrection::Medium)?
            .resolve()?;

        Ok(render_matrix(&matrix, options))
    }

    /// Encodes `input` with default payload options and draws it.
    pub fn render(&self, input: &PaymentInput, options: &SvgOptions) -> Result<String, Error> {
        let payload = encode(input)?;
        self.render_payload(&payload, options)
    }
}

/// Encodes `input` and draws it with the process-wide engine.
pub fn generate_qr_svg(input: &PaymentInput, options: &SvgOptions) -> Result<String, Error> {
    let payload = encode(input)?;
    SvgRenderer::global()?.render_payload(&payload, options)
}

/// Draws a resolved matrix.
///
/// Dark modules become dots, the three finder patterns use larger dots.
pub fn render_matrix(matrix: &ModuleMatrix, options: &SvgOptions) -> String {
    let count = matrix.size();
    let svg_size = options.size;
    let margin = options.margin;
    let cell = (svg_size - margin * 2.0) / count as f64;

    let dot_radius = cell * DOT_RADIUS_RATIO;
    let finder_radius = cell * FINDER_RADIUS_RATIO;

    let mut svg = String::with_capacity(64 * count * count);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {size} {size}" shape-rendering="geometricPrecision">"#,
        size = num(svg_size)
    ));
    svg.push_str(&format!(
        r#"<rect fill="{fill}" width="{size}" height="{size}" rx="{rx}" />"#,
        fill = BACKGROUND_COLOR,
        size = num(svg_size),
        rx = num(finder_radius)
    ));

    for row in 0..count {
        for col in 0..count {
            if !matrix.is_dark(row, col) {
                continue;
            }

            let x = margin + col as f64 * cell + cell / 2.0;
            let y = margin + row as f64 * cell + cell / 2.0;
            let radius = if is_finder_pattern(count, row, col) {
                finder_radius
            } else {
                dot_radius
            };

            svg.push_str(&format!(
                r#"<circle cx="{}" cy="{}" r="{}" fill="{}" />"#,
                num(x),
                num(y),
                num(radius),
                DOT_COLOR
            ));
        }
    }

    write_logo(&mut svg, margin, count as f64 * cell, options);
    svg.push_str("</svg>");

    svg
}

fn write_logo(svg: &mut String, margin: f64, drawable: f64, options: &SvgOptions) {
    if options.logo_data_url.is_empty() {
        return;
    }

    let logo_size = drawable * ratio(options.logo_size_ratio, 0.05, 0.5);
    let padding = logo_size * ratio(options.logo_padding_ratio, 0.0, 0.25);
    let background = logo_size + padding * 2.0;
    let radius = ratio(options.logo_border_radius_ratio, 0.0, 0.5) * background;
    let origin = margin + (drawable - background) / 2.0;
    let url = &options.logo_data_url;

    svg.push_str(&format!(
        r#"<g class="pispi-logo" transform="translate({o}, {o})" pointer-events="none">"#,
        o = num(origin)
    ));
    svg.push_str(&format!(
        r#"<rect width="{b}" height="{b}" rx="{r}" fill="{fill}" opacity="0.95"/>"#,
        b = num(background),
        r = num(radius),
        fill = options.logo_background_color
    ));
    svg.push_str(&format!(
        r#"<image x="{p}" y="{p}" width="{s}" height="{s}" href="{url}" xlink:href="{url}" preserveAspectRatio="xMidYMid meet"/>"#,
        p = num(padding),
        s = num(logo_size)
    ));
    svg.push_str("</g>");
}

fn is_finder_pattern(count: usize, row: usize, col: usize) -> bool {
    let top = row < FINDER_PATTERN_SIZE;
    let bottom = row + FINDER_PATTERN_SIZE >= count;
    let left = col < FINDER_PATTERN_SIZE;
    let right = col + FINDER_PATTERN_SIZE >= count;

    (top && left) || (top && right) || (bottom && left)
}

/// Non-finite ratios collapse to zero, others are clamped.
fn ratio(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}

/// At most 3 decimals, no trailing zeros.
fn num(value: f64) -> String {
    if !value.is_finite() {
        return "0".into();
    }

    let fixed = format!("{value:.3}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');

    match trimmed {
        "-0" | "" => "0".into(),
        other => other.into(),
    }
}
