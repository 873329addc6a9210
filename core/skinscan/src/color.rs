//! Lab and HSV planes in the 8-bit conventions the extractor thresholds were
//! tuned for.

use image::{GrayImage, Luma, RgbImage};
use palette::{FromColor, Hsv, Lab, Srgb};

/// L, a and b planes. L is scaled from 0..=100 to 0..=255; a and b are
/// offset by 128.
pub struct LabPlanes {
    pub l: GrayImage,
    pub a: GrayImage,
    pub b: GrayImage,
}

/// Hue, saturation and value planes. Hue is halved to 0..=180 so it fits a
/// byte; saturation and value are scaled to 0..=255.
pub struct HsvPlanes {
    pub h: GrayImage,
    pub s: GrayImage,
    pub v: GrayImage,
}

pub fn lab_planes(image: &RgbImage) -> LabPlanes {
    let (width, height) = image.dimensions();
    let mut planes = LabPlanes {
        l: GrayImage::new(width, height),
        a: GrayImage::new(width, height),
        b: GrayImage::new(width, height),
    };

    for (x, y, pixel) in image.enumerate_pixels() {
        let lab: Lab = Lab::from_color(to_srgb(pixel.0));
        planes.l.put_pixel(x, y, Luma([to_byte(lab.l * 255.0 / 100.0)]));
        planes.a.put_pixel(x, y, Luma([to_byte(lab.a + 128.0)]));
        planes.b.put_pixel(x, y, Luma([to_byte(lab.b + 128.0)]));
    }

    planes
}

pub fn hsv_planes(image: &RgbImage) -> HsvPlanes {
    let (width, height) = image.dimensions();
    let mut planes = HsvPlanes {
        h: GrayImage::new(width, height),
        s: GrayImage::new(width, height),
        v: GrayImage::new(width, height),
    };

    for (x, y, pixel) in image.enumerate_pixels() {
        let hsv: Hsv = Hsv::from_color(to_srgb(pixel.0));
        let hue = if hsv.saturation > 0.0 {
            hsv.hue.into_positive_degrees() / 2.0
        } else {
            0.0
        };
        planes.h.put_pixel(x, y, Luma([to_byte(hue.min(180.0))]));
        planes.s.put_pixel(x, y, Luma([to_byte(hsv.saturation * 255.0)]));
        planes.v.put_pixel(x, y, Luma([to_byte(hsv.value * 255.0)]));
    }

    planes
}

fn to_srgb([r, g, b]: [u8; 3]) -> Srgb {
    Srgb::new(r, g, b).into_format()
}

fn to_byte(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
