//! Burns the coordinate label into a captured frame.
//!
//! Layout for a `w`×`h` frame, font size `f`, padding `p`, inset `i` and
//! measured text width `t`:
//! background box at `(w/2 - t, h - f - p)` sized `2t × (f + p)`,
//! text at `(w/2 - t + i, h - i)` limited to `2t` wide.

use wasm_bindgen::JsValue;

use crate::config::AnnotationConfig;
use crate::error::{CaptureError, js_error_text};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelLayout {
    pub background: Rect,
    pub text_x: f64,
    pub text_y: f64,
    pub max_text_width: f64,
}

pub fn layout(
    frame_width: f64,
    frame_height: f64,
    text_width: f64,
    style: &AnnotationConfig,
) -> LabelLayout {
    let f = style.font_size_px;
    LabelLayout {
        background: Rect {
            x: frame_width / 2.0 - text_width,
            y: frame_height - f - style.padding_px,
            width: text_width * 2.0,
            height: f + style.padding_px,
        },
        text_x: frame_width / 2.0 - text_width + style.inset_px,
        text_y: frame_height - style.inset_px,
        max_text_width: text_width * 2.0,
    }
}

/// The few 2D canvas calls the annotation needs.
pub trait AnnotationSurface {
    fn set_font(&self, font: &str);
    fn measure_text(&self, text: &str) -> Result<f64, CaptureError>;
    fn set_fill_style(&self, css: &str);
    fn fill_rect(&self, rect: Rect);
    fn fill_text(&self, text: &str, x: f64, y: f64, max_width: f64) -> Result<(), CaptureError>;
}

pub fn draw_label(
    surface: &impl AnnotationSurface,
    text: &str,
    frame_width: f64,
    frame_height: f64,
    style: &AnnotationConfig,
) -> Result<LabelLayout, CaptureError> {
    surface.set_font(&format!("{}px {}", style.font_size_px, style.font_family));
    let text_width = surface.measure_text(text)?;
    let l = layout(frame_width, frame_height, text_width, style);

    surface.set_fill_style(&style.background);
    surface.fill_rect(l.background);
    surface.set_fill_style(&style.foreground);
    surface.fill_text(text, l.text_x, l.text_y, l.max_text_width)?;
    Ok(l)
}

fn canvas_err(e: JsValue) -> CaptureError {
    CaptureError::Canvas(js_error_text(&e))
}

impl AnnotationSurface for web_sys::OffscreenCanvasRenderingContext2d {
    fn set_font(&self, font: &str) {
        web_sys::OffscreenCanvasRenderingContext2d::set_font(self, font);
    }

    fn measure_text(&self, text: &str) -> Result<f64, CaptureError> {
        web_sys::OffscreenCanvasRenderingContext2d::measure_text(self, text)
            .map(|m| m.width())
            .map_err(canvas_err)
    }

    fn set_fill_style(&self, css: &str) {
        self.set_fill_style_str(css);
    }

    fn fill_rect(&self, r: Rect) {
        web_sys::OffscreenCanvasRenderingContext2d::fill_rect(self, r.x, r.y, r.width, r.height);
    }

    fn fill_text(&self, text: &str, x: f64, y: f64, max_width: f64) -> Result<(), CaptureError> {
        self.fill_text_with_max_width(text, x, y, max_width)
            .map_err(canvas_err)
    }
}
