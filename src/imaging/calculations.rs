//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::{AspectRatio, ResizeSettings};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("square resize needs equal width and height, got {width}x{height}")]
    NonSquareTarget { width: u32, height: u32 },
}

/// Calculate the output dimensions for a source image under `settings`.
///
/// - Disabled settings, or a zero target dimension, leave the source unchanged.
/// - [`AspectRatio::Preserve`] fits the source inside the target box.
/// - [`AspectRatio::Free`] and [`AspectRatio::Square`] use the box exactly.
///
/// Fractional edges are rounded half away from zero and never drop below 1.
/// Upscaling is allowed: a box larger than the source enlarges it.
///
/// # Examples
/// ```
/// # use towebp::imaging::{AspectRatio, Dimensions, ResizeSettings, plan_dimensions};
/// // 16:9 into an 800x800 box → 800x450
/// let source = Dimensions { width: 1600, height: 900 };
/// let settings = ResizeSettings::to_box(800, 800, AspectRatio::Preserve);
/// assert_eq!(
///     plan_dimensions(source, &settings).unwrap(),
///     Dimensions { width: 800, height: 450 }
/// );
/// ```
pub fn plan_dimensions(
    source: Dimensions,
    settings: &ResizeSettings,
) -> Result<Dimensions, PlanError> {
    let (tgt_w, tgt_h) = (settings.width, settings.height);

    if !settings.enabled || tgt_w == 0 || tgt_h == 0 {
        return Ok(source);
    }

    match settings.aspect_ratio {
        AspectRatio::Preserve => Ok(fit_within(source, (tgt_w, tgt_h))),
        AspectRatio::Free => Ok(Dimensions {
            width: tgt_w,
            height: tgt_h,
        }),
        AspectRatio::Square if tgt_w != tgt_h => Err(PlanError::NonSquareTarget {
            width: tgt_w,
            height: tgt_h,
        }),
        AspectRatio::Square => Ok(Dimensions {
            width: tgt_w,
            height: tgt_h,
        }),
    }
}

/// Largest box with the source aspect ratio that fits inside `target`.
///
/// One dimension matches the target exactly, the other is at most the target.
fn fit_within(source: Dimensions, target: (u32, u32)) -> Dimensions {
    let (tgt_w, tgt_h) = target;

    if source.width == 0 || source.height == 0 {
        return Dimensions {
            width: tgt_w,
            height: tgt_h,
        };
    }

    let src_aspect = source.width as f64 / source.height as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: width matches, height shrinks
        Dimensions {
            width: tgt_w,
            height: round_edge(tgt_w as f64 / src_aspect),
        }
    } else {
        // Source is taller or equal: height matches
        Dimensions {
            width: round_edge(tgt_h as f64 * src_aspect),
            height: tgt_h,
        }
    }
}

fn round_edge(value: f64) -> u32 {
    (value.round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn preserve(width: u32, height: u32) -> ResizeSettings {
        ResizeSettings::to_box(width, height, AspectRatio::Preserve)
    }

    // =========================================================================
    // No-op policy
    // =========================================================================

    #[test]
    fn disabled_returns_source_for_any_box() {
        for (w, h) in [(1, 1), (800, 800), (0, 0), (10_000, 3)] {
            let settings = ResizeSettings {
                enabled: false,
                width: w,
                height: h,
                aspect_ratio: AspectRatio::Free,
            };
            assert_eq!(plan_dimensions(dims(1234, 567), &settings), Ok(dims(1234, 567)));
        }
    }

    #[test]
    fn zero_target_dimension_is_noop() {
        let settings = ResizeSettings::to_box(0, 600, AspectRatio::Free);
        assert_eq!(plan_dimensions(dims(640, 480), &settings), Ok(dims(640, 480)));
    }

    // =========================================================================
    // Preserve
    // =========================================================================

    #[test]
    fn preserve_wide_source_into_square_box() {
        // 16:9 into 800x800 → 800x450
        assert_eq!(plan_dimensions(dims(1600, 900), &preserve(800, 800)), Ok(dims(800, 450)));
    }

    #[test]
    fn preserve_tall_source_into_landscape_box() {
        // 3:4 into 1920x1080 → height matches, width = 1080 * 0.75 = 810
        assert_eq!(plan_dimensions(dims(3000, 4000), &preserve(1920, 1080)), Ok(dims(810, 1080)));
    }

    #[test]
    fn preserve_same_aspect_matches_box() {
        assert_eq!(plan_dimensions(dims(4000, 3000), &preserve(800, 600)), Ok(dims(800, 600)));
    }

    #[test]
    fn preserve_upscales_small_source() {
        assert_eq!(plan_dimensions(dims(100, 50), &preserve(400, 400)), Ok(dims(400, 200)));
    }

    #[test]
    fn preserve_rounds_half_away_from_zero() {
        // 3:1 into 5x5 → height = 5 / 3 = 1.67 → 2
        assert_eq!(plan_dimensions(dims(300, 100), &preserve(5, 5)), Ok(dims(5, 2)));
        // 2:1 into 5x5 → height = 2.5 → 3
        assert_eq!(plan_dimensions(dims(200, 100), &preserve(5, 5)), Ok(dims(5, 3)));
    }

    #[test]
    fn preserve_never_returns_zero_edge() {
        // Extreme panorama into a tiny box
        assert_eq!(plan_dimensions(dims(10_000, 10), &preserve(10, 10)), Ok(dims(10, 1)));
    }

    #[test]
    fn preserve_output_fits_inside_box() {
        for (sw, sh) in [(1600, 900), (900, 1600), (1, 1), (4032, 3024), (333, 777)] {
            let out = plan_dimensions(dims(sw, sh), &preserve(640, 480)).unwrap();
            assert!(out.width <= 640 && out.height <= 480, "{sw}x{sh} -> {out:?}");
            assert!(out.width == 640 || out.height == 480);
        }
    }

    // =========================================================================
    // Free / Square
    // =========================================================================

    #[test]
    fn free_uses_box_exactly() {
        let settings = ResizeSettings::to_box(300, 700, AspectRatio::Free);
        assert_eq!(plan_dimensions(dims(1600, 900), &settings), Ok(dims(300, 700)));
    }

    #[test]
    fn square_with_equal_sides() {
        let settings = ResizeSettings::to_box(512, 512, AspectRatio::Square);
        assert_eq!(plan_dimensions(dims(1600, 900), &settings), Ok(dims(512, 512)));
    }

    #[test]
    fn square_with_unequal_sides_fails() {
        let settings = ResizeSettings::to_box(512, 256, AspectRatio::Square);
        assert_eq!(
            plan_dimensions(dims(1600, 900), &settings),
            Err(PlanError::NonSquareTarget {
                width: 512,
                height: 256
            })
        );
    }
}
