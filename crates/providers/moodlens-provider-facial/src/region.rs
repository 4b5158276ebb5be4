//! Skin-tone face region detection

use moodlens_core::PixelFrame;
use serde::{Deserialize, Serialize};

/// Grid stride used when sampling for skin tones
pub const SKIN_SAMPLE_STRIDE: usize = 4;

/// Minimum skin-tone samples required to accept a region
pub const MIN_SKIN_SAMPLES: usize = 100;

/// Axis-aligned bounding box of the face-like region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    /// Left edge
    pub x: usize,
    /// Top edge
    pub y: usize,
    /// Width (at least 1)
    pub width: usize,
    /// Height (at least 1)
    pub height: usize,
}

impl FaceRegion {
    /// Area in pixels
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// YCbCr skin-tone membership test
///
/// Cb ∈ [60, 140], Cr ∈ [120, 180] and luma strictly within (20, 240).
pub fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = 128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b;

    (60.0..=140.0).contains(&cb) && (120.0..=180.0).contains(&cr) && y > 20.0 && y < 240.0
}

/// Bounding box of skin-tone samples on a coarse grid
///
/// Returns `None` for malformed frames or when fewer than
/// [`MIN_SKIN_SAMPLES`] samples match.
pub fn detect_face_region(frame: &PixelFrame) -> Option<FaceRegion> {
    if !frame.is_well_formed() {
        return None;
    }

    let mut matches = 0usize;
    let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
    let (mut max_x, mut max_y) = (0usize, 0usize);

    for y in (0..frame.height).step_by(SKIN_SAMPLE_STRIDE) {
        for x in (0..frame.width).step_by(SKIN_SAMPLE_STRIDE) {
            let Some((r, g, b)) = frame.rgb_at(x, y) else {
                continue;
            };
            if is_skin_tone(r, g, b) {
                matches += 1;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }

    if matches < MIN_SKIN_SAMPLES {
        tracing::trace!(matches, "Too few skin-tone samples for a face region");
        return None;
    }

    Some(FaceRegion {
        x: min_x,
        y: min_y,
        width: (max_x - min_x).max(1),
        height: (max_y - min_y).max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SKIN: (u8, u8, u8) = (200, 150, 120);

    fn frame_with_patch(w: usize, h: usize, patch: (usize, usize, usize, usize)) -> PixelFrame {
        let (px, py, pw, ph) = patch;
        let mut data = vec![0u8; w * h * 3];
        for y in 0..h {
            for x in 0..w {
                let i = (y * w + x) * 3;
                let (r, g, b) = if x >= px && x < px + pw && y >= py && y < py + ph {
                    SKIN
                } else {
                    (20, 60, 200)
                };
                data[i] = r;
                data[i + 1] = g;
                data[i + 2] = b;
            }
        }
        PixelFrame::rgb(w, h, data, Utc::now())
    }

    #[test]
    fn test_skin_tone() {
        assert!(is_skin_tone(SKIN.0, SKIN.1, SKIN.2));
        assert!(!is_skin_tone(20, 60, 200));
        assert!(!is_skin_tone(0, 0, 0));
        assert!(!is_skin_tone(255, 255, 255));
    }

    #[test]
    fn test_detects_patch() {
        let frame = frame_with_patch(160, 120, (40, 20, 80, 80));
        let region = detect_face_region(&frame).unwrap();
        assert_eq!(region.x, 40);
        assert_eq!(region.y, 20);
        assert_eq!(region.width, 76);
        assert_eq!(region.height, 76);
    }

    #[test]
    fn test_small_patch_is_rejected() {
        // 20x20 patch yields 25 grid samples
        let frame = frame_with_patch(160, 120, (40, 20, 20, 20));
        assert!(detect_face_region(&frame).is_none());
    }

    #[test]
    fn test_malformed_frame() {
        let frame = PixelFrame::rgb(100, 100, vec![0; 10], Utc::now());
        assert!(detect_face_region(&frame).is_none());
        let empty = PixelFrame::rgba(0, 0, vec![], Utc::now());
        assert!(detect_face_region(&empty).is_none());
    }
}
