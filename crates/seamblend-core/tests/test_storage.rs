use ndarray::Array2;

use seamblend_core::pixel::Rgb;
use seamblend_core::roi::BoundingBox;
use seamblend_core::storage::{
    create_store, store_from_array, MemoryStore, PixelStore, StorageMode, TiledStore,
};

fn pattern(h: usize, w: usize) -> Array2<Rgb> {
    Array2::from_shape_fn((h, w), |(r, c)| {
        Rgb::new(r as f32, c as f32, (r * w + c) as f32 * 0.01)
    })
}

#[test]
fn test_tiled_store_matches_memory() {
    // Not a multiple of the tile size in either direction.
    let (h, w) = (70, 131);
    let data = pattern(h, w);
    let dir = tempfile::tempdir().unwrap();

    let mut memory = MemoryStore::<Rgb>::new((h, w));
    let mut tiled = TiledStore::<Rgb>::create((h, w), Some(dir.path())).unwrap();
    let full = BoundingBox::from_dim((h, w));
    memory.write_region(&full, data.view()).unwrap();
    tiled.write_region(&full, data.view()).unwrap();

    assert_eq!(tiled.dim(), (h, w));
    assert_eq!(tiled.to_array(), data);

    let roi = BoundingBox::new(60, 10, 130, 69);
    assert_eq!(memory.read_region(&roi), tiled.read_region(&roi));
    assert_eq!(tiled.get(69, 130), data[[69, 130]]);
}

#[test]
fn test_write_region_where_only_touches_mask() {
    let dir = tempfile::tempdir().unwrap();
    let mode = StorageMode::Disk {
        dir: Some(dir.path().to_path_buf()),
    };
    for mode in [StorageMode::Memory, mode] {
        let mut store = create_store::<f32>(&mode, (10, 10)).unwrap();
        let roi = BoundingBox::new(2, 2, 6, 5);
        let data = Array2::from_elem(roi.dim(), 1.0f32);
        let mask = Array2::from_shape_fn(roi.dim(), |(r, c)| (r + c) % 2 == 0);
        store.write_region_where(&roi, data.view(), mask.view()).unwrap();

        let out = store.to_array();
        assert_eq!(out[[2, 2]], 1.0, "{mode}");
        assert_eq!(out[[2, 3]], 0.0, "{mode}");
        assert_eq!(out[[0, 0]], 0.0, "{mode}");
        assert_eq!(out.iter().filter(|&&v| v == 1.0).count(), 6, "{mode}");
    }
}

#[test]
fn test_region_outside_store_rejected() {
    let mut store = create_store::<f32>(&StorageMode::Memory, (4, 4)).unwrap();
    let roi = BoundingBox::new(2, 2, 6, 6);
    let data = Array2::<f32>::zeros(roi.dim());
    assert!(store.write_region(&roi, data.view()).is_err());

    let roi = BoundingBox::new(0, 0, 2, 2);
    let wrong = Array2::<f32>::zeros((3, 2));
    assert!(store.write_region(&roi, wrong.view()).is_err());
}

#[test]
fn test_store_from_array_round_trip() {
    let data = pattern(9, 65);
    let dir = tempfile::tempdir().unwrap();
    let disk = StorageMode::Disk {
        dir: Some(dir.path().to_path_buf()),
    };
    for mode in [StorageMode::Memory, disk] {
        let store = store_from_array(&mode, data.clone()).unwrap();
        assert_eq!(store.to_array(), data);
    }
}

#[test]
fn test_empty_tiled_store() {
    let store = TiledStore::<f32>::create((0, 0), None).unwrap();
    assert_eq!(store.dim(), (0, 0));
    assert_eq!(store.to_array().len(), 0);
}
