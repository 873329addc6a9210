use serde::{Deserialize, Serialize};

use crate::face_detector::FaceBounds;

/// Crop region within the source image, always inside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels, at least 1.
    pub width: u32,
    /// Height in pixels, at least 1.
    pub height: u32,
}

/// Widen a detected face rectangle by `padding` pixels on every side and
/// clamp the result to the `source_width` × `source_height` image.
///
/// Detector rectangles may start at negative coordinates or run past the
/// right/bottom edge; both are clipped first. Returns `None` when nothing of
/// the rectangle lies inside the image.
pub fn padded_region(
    bounds: &FaceBounds,
    padding: u32,
    source_width: u32,
    source_height: u32,
) -> Option<CropRegion> {
    let (x0, x1) = padded_span(bounds.x, bounds.width, padding, source_width)?;
    let (y0, y1) = padded_span(bounds.y, bounds.height, padding, source_height)?;

    Some(CropRegion {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

/// Clip `[start, start + length)` to `[0, limit)`, then widen by `padding`
/// and clip again. Returns the half-open span `(begin, end)` with `begin < end`.
fn padded_span(start: f64, length: f64, padding: u32, limit: u32) -> Option<(u32, u32)> {
    if !start.is_finite() || !length.is_finite() || limit == 0 {
        return None;
    }
    let limit_f = limit as f64;
    let begin = start.round().clamp(0.0, limit_f);
    let end = (start + length).round().clamp(0.0, limit_f);
    if end <= begin {
        return None;
    }

    let begin = (begin as u32).saturating_sub(padding);
    let end = (end as u32).saturating_add(padding).min(limit);
    Some((begin, end))
}
