//! The processing pipeline around the detector: decode, resolution
//! normalization, scoring, and PNG encoding.

use super::canny::CannyEdgeDetector;
use super::grid::{Grid, PixelGrid};

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{GrayImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// Pixel count every source image is normalized to before detection, making
/// results resolution-independent.
pub const TARGET_PIXELS: u32 = 500_000;

/// The rendered result of one processing cycle.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Percentage of edge pixels in the output, in `[0, 100]`.
    pub edginess: f64,
    /// The edge map, PNG-encoded.
    pub png: Vec<u8>,
}

/// Decode -> normalize -> detect -> score -> encode.
///
/// Deterministic: identical input bytes and parameters always produce an
/// identical edge map and score.
pub struct EdgePipeline {
    detector: CannyEdgeDetector,
    target_pixels: u32,
}

impl EdgePipeline {
    pub fn new(detector: CannyEdgeDetector, target_pixels: u32) -> Self {
        Self {
            detector,
            target_pixels,
        }
    }

    /// Runs the full pipeline over raw source image bytes.
    pub fn process(&self, bytes: &[u8]) -> Result<ProcessedImage> {
        let decoded = image::load_from_memory(bytes)
            .context("Failed to decode source image")?
            .to_rgb8();
        let resized = self.normalise_size(&decoded);
        let edges = self.detector.detect(&to_pixel_grid(&resized));
        let edginess = self.edginess(&edges);
        let png = encode_png(&edges)?;

        Ok(ProcessedImage { edginess, png })
    }

    /// Resizes so the pixel count approximates the target, scaling both
    /// dimensions by the square root of the area ratio.
    fn normalise_size(&self, img: &RgbImage) -> RgbImage {
        let current = img.width() as f64 * img.height() as f64;
        let factor = (self.target_pixels as f64 / current).sqrt();
        let width = ((img.width() as f64 * factor) as u32).max(1);
        let height = ((img.height() as f64 * factor) as u32).max(1);
        image::imageops::resize(img, width, height, FilterType::Lanczos3)
    }

    /// Score: percentage of nonzero output pixels relative to the target
    /// pixel count, clamped into `[0, 100]`.
    fn edginess(&self, edges: &Grid) -> f64 {
        (100.0 * edges.count_nonzero() as f64 / self.target_pixels as f64).clamp(0.0, 100.0)
    }
}

impl Default for EdgePipeline {
    fn default() -> Self {
        Self::new(CannyEdgeDetector::default(), TARGET_PIXELS)
    }
}

fn to_pixel_grid(img: &RgbImage) -> PixelGrid {
    let pixels = img.pixels().map(|p| p.0).collect();
    PixelGrid::new(img.width() as usize, img.height() as usize, pixels)
}

fn encode_png(edges: &Grid) -> Result<Vec<u8>> {
    let data: Vec<u8> = edges.values().iter().map(|&v| v as u8).collect();
    let img = GrayImage::from_raw(edges.width() as u32, edges.height() as u32, data)
        .ok_or_else(|| anyhow::anyhow!("Edge map dimensions mismatch"))?;

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .context("Failed to encode edge map as PNG")?;
    Ok(buf.into_inner())
}
