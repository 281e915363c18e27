use approx::assert_abs_diff_eq;

use seamblend_core::color::{lab_to_srgb, srgb_to_lab};

#[test]
fn test_reference_points() {
    let white = srgb_to_lab([1.0, 1.0, 1.0]);
    assert_abs_diff_eq!(white[0], 100.0, epsilon = 0.05);
    assert_abs_diff_eq!(white[1], 0.0, epsilon = 0.05);
    assert_abs_diff_eq!(white[2], 0.0, epsilon = 0.05);

    let black = srgb_to_lab([0.0, 0.0, 0.0]);
    assert_abs_diff_eq!(black[0], 0.0, epsilon = 1e-4);

    let red = srgb_to_lab([1.0, 0.0, 0.0]);
    assert_abs_diff_eq!(red[0], 53.24, epsilon = 0.1);
    assert_abs_diff_eq!(red[1], 80.09, epsilon = 0.2);
    assert_abs_diff_eq!(red[2], 67.20, epsilon = 0.2);
}

#[test]
fn test_gray_has_no_chroma() {
    for v in [0.01f32, 0.2, 0.5, 0.9] {
        let lab = srgb_to_lab([v, v, v]);
        assert!(lab[1].abs() < 0.05 && lab[2].abs() < 0.05, "{v}: {lab:?}");
    }
}

#[test]
fn test_lab_round_trip() {
    let samples = [
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 1.0],
        [0.5, 0.25, 0.75],
        [0.02, 0.9, 0.3],
        [0.001, 0.002, 0.003],
    ];
    for rgb in samples {
        let back = lab_to_srgb(srgb_to_lab(rgb));
        for ch in 0..3 {
            assert_abs_diff_eq!(back[ch], rgb[ch], epsilon = 1e-4);
        }
    }
}
