use approx::assert_abs_diff_eq;
use ndarray::Array2;

use seamblend_core::blend::collapse;
use seamblend_core::pixel::Rgb;
use seamblend_core::pyramid::{
    expand, filter_half_width, gaussian_pyramid, laplacian_pyramid, laplacian_pyramid_masked,
    mirror_index, reduce, roi_bounds,
};
use seamblend_core::roi::BoundingBox;

fn gradient(h: usize, w: usize) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| {
        ((r as f32 * 0.37).sin() + (c as f32 * 0.21).cos()) * 0.25 + 0.5
    })
}

#[test]
fn test_mirror_index() {
    assert_eq!(mirror_index(-1, 5), 1);
    assert_eq!(mirror_index(-2, 5), 2);
    assert_eq!(mirror_index(5, 5), 4);
    assert_eq!(mirror_index(6, 5), 3);
    assert_eq!(mirror_index(3, 1), 0);
}

#[test]
fn test_reduce_halves_with_ceiling() {
    let data = gradient(17, 32);
    let small = reduce(&data, false);
    assert_eq!(small.dim(), (9, 16));
}

#[test]
fn test_reduce_preserves_constant() {
    let data = Array2::<f32>::from_elem((20, 20), 0.7);
    for wrap in [false, true] {
        let small = reduce(&data, wrap);
        for &v in small.iter() {
            assert_abs_diff_eq!(v, 0.7, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_expand_preserves_constant() {
    let coarse = Array2::<f32>::from_elem((5, 7), 0.3);
    let fine = expand(&coarse, (10, 13), false);
    assert_eq!(fine.dim(), (10, 13));
    for &v in fine.iter() {
        assert_abs_diff_eq!(v, 0.3, epsilon = 1e-6);
    }
}

#[test]
fn test_gaussian_level_dims() {
    let data = gradient(100, 60);
    let gp = gaussian_pyramid(&data, 4, false);
    assert_eq!(gp.dims(), vec![(100, 60), (50, 30), (25, 15), (13, 8)]);
}

#[test]
fn test_pyramid_stops_at_single_pixel() {
    let data = gradient(4, 64);
    let gp = gaussian_pyramid(&data, 10, false);
    assert_eq!(gp.coarsest().map(|l| l.dim().0), Some(1));
    assert!(gp.len() < 10);
}

#[test]
fn test_laplacian_round_trip() {
    for (h, w) in [(64, 64), (37, 53), (9, 100)] {
        let data = gradient(h, w);
        let lp = laplacian_pyramid(&data, 5, false);
        let rebuilt = collapse(lp, false);
        assert_eq!(rebuilt.dim(), data.dim());
        let max_err = data
            .iter()
            .zip(rebuilt.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 1e-3, "{h}x{w}: max error {max_err}");
    }
}

#[test]
fn test_laplacian_round_trip_wrapping_rgb() {
    let data = Array2::from_shape_fn((32, 48), |(r, c)| {
        Rgb::new(r as f32 / 32.0, c as f32 / 48.0, 0.5)
    });
    let rebuilt = collapse(laplacian_pyramid(&data, 4, true), true);
    for (a, b) in data.iter().zip(rebuilt.iter()) {
        for ch in 0..3 {
            assert_abs_diff_eq!(a.0[ch], b.0[ch], epsilon = 1e-3);
        }
    }
}

#[test]
fn test_masked_laplacian_ignores_invalid_pixels() {
    let mut data = Array2::<f32>::from_elem((32, 32), 0.5);
    let mut alpha = Array2::from_elem((32, 32), true);
    for r in 0..32 {
        for c in 16..32 {
            data[[r, c]] = 100.0;
            alpha[[r, c]] = false;
        }
    }
    let lp = laplacian_pyramid_masked(&data, &alpha, 4, false).unwrap();
    let rebuilt = collapse(lp, false);
    // Valid pixels next to the hole do not see the garbage behind it.
    for r in 0..32 {
        for c in 0..16 {
            assert!(
                (rebuilt[[r, c]] - 0.5).abs() < 1e-3,
                "pixel ({r},{c}) = {}",
                rebuilt[[r, c]]
            );
        }
    }
}

#[test]
fn test_masked_pyramid_rejects_shape_mismatch() {
    let data = Array2::<f32>::zeros((8, 8));
    let alpha = Array2::from_elem((8, 9), true);
    assert!(laplacian_pyramid_masked(&data, &alpha, 3, false).is_err());
}

#[test]
fn test_roi_bounds_levels_and_border() {
    let canvas = BoundingBox::new(0, 0, 400, 100);
    let union = canvas;
    let intersection = BoundingBox::new(180, 0, 220, 100);

    let plan = roi_bounds(&canvas, &intersection, &union, 29, false);
    // 40 -> 20 -> 10 -> 5: four levels.
    assert_eq!(plan.levels, 4);
    let border = filter_half_width(4);
    assert_eq!(border, 30);
    assert_eq!(plan.roi, BoundingBox::new(150, 0, 250, 100));
    assert!(!plan.wraparound);
}

#[test]
fn test_roi_bounds_respects_max_levels() {
    let canvas = BoundingBox::new(0, 0, 1000, 1000);
    let plan = roi_bounds(&canvas, &canvas, &canvas, 3, false);
    assert_eq!(plan.levels, 3);
    assert_eq!(plan.roi, canvas);
}

#[test]
fn test_roi_bounds_wraps_only_across_full_width() {
    let canvas = BoundingBox::new(0, 0, 200, 50);
    let narrow = BoundingBox::new(90, 0, 110, 50);
    assert!(!roi_bounds(&canvas, &narrow, &canvas, 29, true).wraparound);

    let wide = BoundingBox::new(0, 0, 200, 20);
    assert!(roi_bounds(&canvas, &wide, &canvas, 29, true).wraparound);
    assert!(!roi_bounds(&canvas, &wide, &canvas, 29, false).wraparound);
}
