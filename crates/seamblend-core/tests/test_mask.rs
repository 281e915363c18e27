use ndarray::Array2;

use seamblend_core::error::BlendError;
use seamblend_core::mask::{create_mask, distance_to_uncovered, weighted_mask};
use seamblend_core::roi::BoundingBox;

/// Canvas-sized alpha covering columns `x0..x1` of every row.
fn strip(h: usize, w: usize, x0: usize, x1: usize) -> Array2<bool> {
    Array2::from_shape_fn((h, w), |(_, c)| c >= x0 && c < x1)
}

#[test]
fn test_exclusive_regions_follow_alpha() {
    let white = strip(10, 100, 40, 100);
    let black = strip(10, 100, 0, 60);
    let union = BoundingBox::new(0, 0, 100, 10);

    let mask = create_mask(&white, &black, &union, false).unwrap();
    assert_eq!(mask.dim(), (10, 100));
    for r in 0..10 {
        assert_eq!(mask[[r, 10]], 0.0);
        assert_eq!(mask[[r, 90]], 1.0);
    }
}

#[test]
fn test_seam_on_medial_line_of_overlap() {
    let white = strip(10, 100, 40, 100);
    let black = strip(10, 100, 0, 60);
    let union = BoundingBox::new(0, 0, 100, 10);

    let mask = create_mask(&white, &black, &union, false).unwrap();
    for r in 0..10 {
        for c in 40..60 {
            let expected = if c >= 50 { 1.0 } else { 0.0 };
            assert_eq!(mask[[r, c]], expected, "pixel ({r},{c})");
        }
    }
}

#[test]
fn test_mask_is_binary_and_zero_outside_both() {
    let mut white = Array2::from_elem((20, 20), false);
    let mut black = Array2::from_elem((20, 20), false);
    for r in 0..10 {
        for c in 0..10 {
            black[[r, c]] = true;
        }
    }
    for r in 5..15 {
        for c in 5..15 {
            white[[r, c]] = true;
        }
    }
    let union = BoundingBox::new(0, 0, 15, 15);
    let mask = create_mask(&white, &black, &union, false).unwrap();

    assert!(mask.iter().all(|&m| m == 0.0 || m == 1.0));
    // Neither image covers the lower-left corner of the union box.
    assert_eq!(mask[[14, 0]], 0.0);
    assert_eq!(mask[[14, 14]], 1.0);
    assert_eq!(mask[[0, 0]], 0.0);
}

#[test]
fn test_wraparound_moves_seam_across_edge() {
    // White covers both ends of the canvas, black only the left end.
    let white = Array2::from_shape_fn((4, 100), |(_, c)| c < 10 || c >= 90);
    let black = strip(4, 100, 0, 30);
    let union = BoundingBox::new(0, 0, 100, 4);

    let flat = create_mask(&white, &black, &union, false).unwrap();
    let wrapped = create_mask(&white, &black, &union, true).unwrap();

    // Flat: black lies deeper across the whole overlap.
    assert_eq!(flat[[0, 2]], 0.0);
    assert_eq!(flat[[0, 8]], 0.0);
    // Wrapped: black's uncovered right end is one step away from x=0.
    assert_eq!(wrapped[[0, 2]], 1.0);
    assert_eq!(wrapped[[0, 8]], 0.0);
    assert_eq!(wrapped[[0, 95]], 1.0);
    assert_eq!(flat[[0, 95]], 1.0);
}

#[test]
fn test_contained_image_gets_empty_mask() {
    // White sits strictly inside black; the box edge is not a hole.
    let black = strip(20, 40, 0, 40);
    let white = Array2::from_shape_fn((20, 40), |(r, c)| {
        (5..15).contains(&r) && (10..30).contains(&c)
    });
    let union = BoundingBox::new(0, 0, 40, 20);

    let mask = create_mask(&white, &black, &union, false).unwrap();
    assert!(mask.iter().all(|&m| m == 0.0));

    // The other way round white covers the whole box and wins everywhere.
    let mask = create_mask(&black, &white, &union, false).unwrap();
    assert!(mask.iter().all(|&m| m == 1.0));
}

#[test]
fn test_weighted_mask_ratio() {
    let white = strip(6, 30, 0, 30);
    let black = strip(6, 30, 0, 30);
    let ww = Array2::from_elem((6, 30), 3.0f32);
    let wb = Array2::from_elem((6, 30), 1.0f32);
    let union = BoundingBox::new(0, 0, 30, 6);

    let mask = weighted_mask(&white, &black, &ww, &wb, &union, false).unwrap();
    for &m in mask.iter() {
        assert!((m - 0.75).abs() < 1e-6);
    }
}

#[test]
fn test_weighted_mask_falls_back_without_weight() {
    let white = strip(6, 30, 10, 30);
    let black = strip(6, 30, 0, 20);
    let zero = Array2::<f32>::zeros((6, 30));
    let union = BoundingBox::new(0, 0, 30, 6);

    let hard = create_mask(&white, &black, &union, false).unwrap();
    let soft = weighted_mask(&white, &black, &zero, &zero, &union, false).unwrap();
    assert_eq!(hard, soft);
}

#[test]
fn test_alpha_shape_mismatch() {
    let white = Array2::from_elem((10, 10), true);
    let black = Array2::from_elem((10, 11), true);
    let union = BoundingBox::new(0, 0, 10, 10);
    assert!(matches!(
        create_mask(&white, &black, &union, false),
        Err(BlendError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_distance_grows_away_from_hole() {
    let mut covered = Array2::from_elem((5, 5), true);
    covered[[2, 2]] = false;
    let d = distance_to_uncovered(covered.view(), false);
    assert_eq!(d[[2, 2]], 0.0);
    assert_eq!(d[[2, 3]], 1.0);
    assert!((d[[3, 3]] - std::f32::consts::SQRT_2).abs() < 1e-6);
    assert!(d[[0, 0]] > d[[1, 1]]);
}
