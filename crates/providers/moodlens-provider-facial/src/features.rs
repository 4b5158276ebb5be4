//! Facial region feature extraction

use moodlens_core::PixelFrame;
use serde::{Deserialize, Serialize};

use crate::region::{detect_face_region, FaceRegion};

/// Brightness gradient above which a sampled pixel counts as an edge
pub const EDGE_GRADIENT_THRESHOLD: f64 = 30.0;

const THIRD_STRIDE: usize = 2;
const EDGE_STRIDE: usize = 4;
const VARIANCE_STRIDE: usize = 4;

/// Feature vector describing one detected face region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacialFeatures {
    /// Mean brightness of the upper third, 0..=1
    pub upper_brightness: f64,
    /// Mean brightness of the middle third, 0..=1
    pub middle_brightness: f64,
    /// Mean brightness of the lower third, 0..=1
    pub lower_brightness: f64,
    /// Fraction of sampled pixels on a strong gradient
    pub edge_density: f64,
    /// Brightness standard deviation, 0..=1
    pub color_variance: f64,
    /// Region the features were measured on
    pub region: FaceRegion,
}

impl FacialFeatures {
    /// Mean of the three thirds
    pub fn avg_brightness(&self) -> f64 {
        (self.upper_brightness + self.middle_brightness + self.lower_brightness) / 3.0
    }

    /// Upper third relative to the middle third
    pub fn upper_middle_ratio(&self) -> f64 {
        self.upper_brightness / self.middle_brightness.max(0.001)
    }

    /// Lower third relative to the middle third
    pub fn lower_middle_ratio(&self) -> f64 {
        self.lower_brightness / self.middle_brightness.max(0.001)
    }

    /// Look up a named feature
    pub fn value(&self, feature: FacialFeature) -> f64 {
        match feature {
            FacialFeature::UpperMiddleRatio => self.upper_middle_ratio(),
            FacialFeature::LowerMiddleRatio => self.lower_middle_ratio(),
            FacialFeature::EdgeDensity => self.edge_density,
            FacialFeature::AvgBrightness => self.avg_brightness(),
            FacialFeature::ColorVariance => self.color_variance,
        }
    }
}

/// Feature names referenced by expression profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacialFeature {
    /// Upper / middle brightness
    UpperMiddleRatio,
    /// Lower / middle brightness
    LowerMiddleRatio,
    /// Edge density
    EdgeDensity,
    /// Average brightness
    AvgBrightness,
    /// Brightness spread
    ColorVariance,
}

/// Turns a pixel frame into [`FacialFeatures`]
#[derive(Debug, Clone, Default)]
pub struct FacialFeatureExtractor;

impl FacialFeatureExtractor {
    /// Create an extractor
    pub fn new() -> Self {
        Self
    }

    /// Detect a face region and measure it; `None` when no face is found
    pub fn extract(&self, frame: &PixelFrame) -> Option<FacialFeatures> {
        let region = detect_face_region(frame)?;
        Some(self.measure(frame, region))
    }

    /// Measure features inside a known region
    pub fn measure(&self, frame: &PixelFrame, region: FaceRegion) -> FacialFeatures {
        let third = region.height / 3;
        let upper = region_brightness(frame, region.x, region.y, region.width, third);
        let middle = region_brightness(frame, region.x, region.y + third, region.width, third);
        let lower = region_brightness(
            frame,
            region.x,
            region.y + 2 * third,
            region.width,
            third,
        );

        FacialFeatures {
            upper_brightness: upper,
            middle_brightness: middle,
            lower_brightness: lower,
            edge_density: edge_density(frame, region),
            color_variance: color_variance(frame, region),
            region,
        }
    }
}

/// Mean brightness (0..=1) over a sub-rectangle, sampled every 2 px
fn region_brightness(frame: &PixelFrame, x: usize, y: usize, w: usize, h: usize) -> f64 {
    let y_end = (y + h).min(frame.height);
    let x_end = (x + w).min(frame.width);
    let mut total = 0.0;
    let mut count = 0usize;

    for py in (y..y_end).step_by(THIRD_STRIDE) {
        for px in (x..x_end).step_by(THIRD_STRIDE) {
            if let Some(b) = frame.brightness_at(px, py) {
                total += b;
                count += 1;
            }
        }
    }

    if count == 0 {
        0.0
    } else {
        total / count as f64 / 255.0
    }
}

/// Share of sampled pixels whose right+down gradient exceeds the threshold
fn edge_density(frame: &PixelFrame, region: FaceRegion) -> f64 {
    if frame.width < 3 || frame.height < 3 {
        return 0.0;
    }
    let x_start = (region.x + 1).max(1);
    let y_start = (region.y + 1).max(1);
    let x_end = (region.x + region.width).saturating_sub(1).min(frame.width - 2);
    let y_end = (region.y + region.height).saturating_sub(1).min(frame.height - 2);

    let mut edges = 0usize;
    let mut total = 0usize;
    for y in (y_start..y_end).step_by(EDGE_STRIDE) {
        for x in (x_start..x_end).step_by(EDGE_STRIDE) {
            let (Some(curr), Some(right), Some(below)) = (
                frame.brightness_at(x, y),
                frame.brightness_at(x + 1, y),
                frame.brightness_at(x, y + 1),
            ) else {
                continue;
            };
            let gradient = (curr - right).abs() + (curr - below).abs();
            if gradient > EDGE_GRADIENT_THRESHOLD {
                edges += 1;
            }
            total += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        edges as f64 / total as f64
    }
}

/// Brightness standard deviation (0..=1) sampled every 4 px
fn color_variance(frame: &PixelFrame, region: FaceRegion) -> f64 {
    let y_end = (region.y + region.height).min(frame.height);
    let x_end = (region.x + region.width).min(frame.width);
    let samples: Vec<f64> = (region.y..y_end)
        .step_by(VARIANCE_STRIDE)
        .flat_map(|y| {
            (region.x..x_end)
                .step_by(VARIANCE_STRIDE)
                .filter_map(move |x| frame.brightness_at(x, y))
        })
        .collect();

    if samples.is_empty() {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt() / 255.0
}
