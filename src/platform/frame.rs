// Frame grab from the live video, annotation, and JPEG encoding.
use js_sys::Uint8Array;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, HtmlVideoElement, ImageEncodeOptions, OffscreenCanvas, OffscreenCanvasRenderingContext2d,
};

use crate::annotate::{self, Rect};
use crate::config::AnnotationConfig;
use crate::error::{CaptureError, js_error_text};
use crate::model::{EncodedPhoto, PHOTO_MIME};

fn canvas_err(e: JsValue) -> CaptureError {
    CaptureError::Canvas(js_error_text(&e))
}

fn encode_err(e: JsValue) -> CaptureError {
    CaptureError::Encode(js_error_text(&e))
}

/// Region of a `video_w`×`video_h` frame that `object-fit: cover` shows in a
/// `box_w`×`box_h` element: scaled to fill, centered, overflow cropped.
pub fn cover_source(video_w: f64, video_h: f64, box_w: f64, box_h: f64) -> Rect {
    let scale = (box_w / video_w).max(box_h / video_h);
    let width = box_w / scale;
    let height = box_h / scale;
    Rect {
        x: (video_w - width) / 2.0,
        y: (video_h - height) / 2.0,
        width,
        height,
    }
}

/// Copies the frame currently shown by `video` into an off-screen canvas of
/// the element's on-screen size and burns `label` into it. Only the part of
/// the stream visible in the element is kept, undistorted.
pub fn grab_annotated(
    video: &HtmlVideoElement,
    label: &str,
    style: &AnnotationConfig,
) -> Result<OffscreenCanvas, CaptureError> {
    let width = video.offset_width().max(0) as u32;
    let height = video.offset_height().max(0) as u32;
    if width == 0 || height == 0 {
        return Err(CaptureError::NoVideoFrame);
    }
    let canvas = OffscreenCanvas::new(width, height).map_err(canvas_err)?;
    let ctx = canvas
        .get_context("2d")
        .map_err(canvas_err)?
        .ok_or_else(|| CaptureError::Canvas("no 2d context".into()))?
        .dyn_into::<OffscreenCanvasRenderingContext2d>()
        .map_err(|_| CaptureError::Canvas("unexpected context type".into()))?;
    let (video_w, video_h) = (video.video_width(), video.video_height());
    if video_w == 0 || video_h == 0 {
        return Err(CaptureError::NoVideoFrame);
    }
    let src = cover_source(video_w as f64, video_h as f64, width as f64, height as f64);
    ctx.draw_image_with_html_video_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
        video,
        src.x,
        src.y,
        src.width,
        src.height,
        0.0,
        0.0,
        width as f64,
        height as f64,
    )
    .map_err(canvas_err)?;
    annotate::draw_label(&ctx, label, width as f64, height as f64, style)?;
    Ok(canvas)
}

/// Encodes the canvas as JPEG and reads the blob back into memory.
pub async fn encode_jpeg(canvas: OffscreenCanvas) -> Result<EncodedPhoto, CaptureError> {
    let options = ImageEncodeOptions::new();
    options.set_type(PHOTO_MIME);
    let blob: Blob = JsFuture::from(
        canvas
            .convert_to_blob_with_options(&options)
            .map_err(encode_err)?,
    )
    .await
    .map_err(encode_err)?
    .dyn_into()
    .map_err(encode_err)?;
    let buffer = JsFuture::from(blob.array_buffer()).await.map_err(encode_err)?;
    Ok(EncodedPhoto {
        bytes: Uint8Array::new(&buffer).to_vec(),
        width: canvas.width(),
        height: canvas.height(),
    })
}
