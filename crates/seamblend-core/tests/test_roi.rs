use ndarray::Array2;

use seamblend_core::roi::{mask_bounds, BoundingBox};

#[test]
fn test_unite_commutative_and_associative() {
    let a = BoundingBox::new(0, 0, 10, 10);
    let b = BoundingBox::new(5, 3, 20, 8);
    let c = BoundingBox::new(30, 40, 31, 41);

    assert_eq!(a.unite(&b), b.unite(&a));
    assert_eq!(a.unite(&b).unite(&c), a.unite(&b.unite(&c)));
    assert_eq!(a.unite(&b), BoundingBox::new(0, 0, 20, 10));
}

#[test]
fn test_unite_with_empty_is_identity() {
    let a = BoundingBox::new(4, 5, 9, 7);
    assert_eq!(a.unite(&BoundingBox::empty()), a);
    assert_eq!(BoundingBox::empty().unite(&a), a);
}

#[test]
fn test_intersect_is_contained_in_both() {
    let a = BoundingBox::new(0, 0, 10, 10);
    let b = BoundingBox::new(5, 3, 20, 8);
    let i = a.intersect(&b).expect("boxes overlap");

    assert_eq!(i, BoundingBox::new(5, 3, 10, 8));
    assert!(a.contains(&i));
    assert!(b.contains(&i));
    assert!(a.unite(&b).contains(&a));
    assert!(a.unite(&b).contains(&b));
}

#[test]
fn test_touching_boxes_do_not_intersect() {
    let a = BoundingBox::new(0, 0, 10, 10);
    let b = BoundingBox::new(10, 0, 20, 10);
    assert_eq!(a.intersect(&b), None);
    assert!(a.clip_to(&b).is_empty());
}

#[test]
fn test_degenerate_corners_collapse_to_empty() {
    let b = BoundingBox::new(10, 10, 5, 5);
    assert!(b.is_empty());
    assert_eq!(b.area(), 0);
    assert_eq!(b.upper_left(), (10, 10));
}

#[test]
fn test_border_and_translation() {
    let b = BoundingBox::new(2, 3, 6, 8);
    assert_eq!(b.add_border(5), BoundingBox::new(0, 0, 11, 13));
    assert_eq!(b.translate(10, 1), BoundingBox::new(12, 4, 16, 9));
    assert_eq!(b.dim(), (5, 4));
    assert!(b.contains_point(2, 3));
    assert!(!b.contains_point(6, 3));
}

#[test]
fn test_relative_to_origin() {
    let canvas = BoundingBox::new(100, 50, 300, 150);
    let image = BoundingBox::new(120, 60, 140, 90);
    assert_eq!(image.relative_to(&canvas), BoundingBox::new(20, 10, 40, 40));
}

#[test]
fn test_mask_bounds() {
    let mut alpha = Array2::from_elem((10, 12), false);
    assert!(mask_bounds(&alpha).is_empty());

    alpha[[2, 3]] = true;
    alpha[[7, 9]] = true;
    assert_eq!(mask_bounds(&alpha), BoundingBox::new(3, 2, 10, 8));
}

#[test]
fn test_view_matches_box_shape() {
    let data = Array2::from_shape_fn((6, 8), |(r, c)| (r * 8 + c) as f32);
    let b = BoundingBox::new(2, 1, 5, 4);
    let view = b.view(&data);
    assert_eq!(view.dim(), b.dim());
    assert_eq!(view[[0, 0]], 10.0);
}
