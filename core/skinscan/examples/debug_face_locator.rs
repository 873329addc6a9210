//! Debug face location on local images to see which candidate is chosen and
//! what crop the extractors would receive.
//!
//! Usage:
//!   cargo run --example debug_face_locator -- <seeta_model.bin> <image>...

use skinscan::locate::select_largest;
use skinscan::{FaceDetector, FaceLocator, LocatorConfig, RustfaceDetector};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let model_path = args
        .next()
        .expect("usage: debug_face_locator <seeta_model.bin> <image>...");
    let config = LocatorConfig::default();

    for sample in args {
        let input = std::fs::read(&sample).unwrap();
        let image = image::load_from_memory(&input).unwrap();
        let (width, height) = (image.width(), image.height());

        println!("=== {sample} ({width}x{height}) ===");

        // A fresh detector per image keeps the run order irrelevant
        let detector = RustfaceDetector::from_file(&model_path, &config).expect("failed to load model");
        let faces = detector.detect(&image).unwrap();

        if faces.is_empty() {
            println!("  NO FACES DETECTED");
            println!();
            continue;
        }

        println!("  Found {} face(s):", faces.len());
        for (i, face) in faces.iter().enumerate() {
            println!(
                "    face {i}: score={:.2}, bbox=({}, {}, {}x{}), area={}",
                face.confidence,
                face.x,
                face.y,
                face.width,
                face.height,
                face.area(),
            );
        }
        if let Some(best) = select_largest(&faces) {
            println!("  → largest: ({}, {}, {}x{})", best.x, best.y, best.width, best.height);
        }

        let locator = FaceLocator::new(&config).with_primary(Box::new(detector));
        match locator.locate(&image) {
            Some(region) => println!(
                "  → padded crop: ({}, {}, {}x{})",
                region.bounds.x, region.bounds.y, region.bounds.width, region.bounds.height
            ),
            None => println!("  → no usable crop"),
        }
        println!();
    }
}
