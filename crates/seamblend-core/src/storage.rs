//! Pixel storage behind a single access trait.
//!
//! Blend and deghosting code reads and writes through [`PixelStore`] and
//! does not know whether the buffer lives in memory or in a tiled scratch
//! file mapped from disk.

use std::fs::File;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use memmap2::MmapMut;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::TILE_SIZE;
use crate::error::{BlendError, Result};
use crate::pixel::Pixel;
use crate::roi::BoundingBox;

/// Where large working buffers are kept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum StorageMode {
    /// Plain heap arrays.
    #[default]
    Memory,
    /// Tiled scratch files, memory-mapped. `dir` defaults to the system temp dir.
    Disk { dir: Option<PathBuf> },
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "Memory"),
            Self::Disk { dir: Some(dir) } => write!(f, "Disk ({})", dir.display()),
            Self::Disk { dir: None } => write!(f, "Disk"),
        }
    }
}

pub trait PixelStore<P: Pixel>: Send + Sync {
    /// `(height, width)`.
    fn dim(&self) -> (usize, usize);

    fn get(&self, row: usize, col: usize) -> P;

    fn set(&mut self, row: usize, col: usize, value: P);

    /// Copy a region out into an owned array.
    fn read_region(&self, roi: &BoundingBox) -> Array2<P> {
        Array2::from_shape_fn(roi.dim(), |(r, c)| self.get(roi.y0 + r, roi.x0 + c))
    }

    /// Overwrite a region with `data`, which must have the region's shape.
    fn write_region(&mut self, roi: &BoundingBox, data: ArrayView2<P>) -> Result<()> {
        check_region(self.dim(), roi, data.dim())?;
        for ((r, c), &v) in data.indexed_iter() {
            self.set(roi.y0 + r, roi.x0 + c, v);
        }
        Ok(())
    }

    /// Overwrite the pixels of a region where `mask` is set.
    fn write_region_where(
        &mut self,
        roi: &BoundingBox,
        data: ArrayView2<P>,
        mask: ArrayView2<bool>,
    ) -> Result<()> {
        check_region(self.dim(), roi, data.dim())?;
        check_region(self.dim(), roi, mask.dim())?;
        for ((r, c), &v) in data.indexed_iter() {
            if mask[[r, c]] {
                self.set(roi.y0 + r, roi.x0 + c, v);
            }
        }
        Ok(())
    }

    fn to_array(&self) -> Array2<P> {
        self.read_region(&BoundingBox::from_dim(self.dim()))
    }
}

fn check_region(dim: (usize, usize), roi: &BoundingBox, data_dim: (usize, usize)) -> Result<()> {
    if !BoundingBox::from_dim(dim).contains(roi) {
        return Err(BlendError::Storage(format!(
            "region {roi} outside store of {}x{}",
            dim.1, dim.0
        )));
    }
    if data_dim != roi.dim() {
        return Err(BlendError::shape("storage", 0, roi.dim(), data_dim));
    }
    Ok(())
}

/// Heap-resident store.
pub struct MemoryStore<P> {
    data: Array2<P>,
}

impl<P: Pixel> MemoryStore<P> {
    pub fn new(dim: (usize, usize)) -> Self {
        Self {
            data: Array2::from_elem(dim, P::zero()),
        }
    }

    pub fn from_array(data: Array2<P>) -> Self {
        Self { data }
    }
}

impl<P: Pixel> PixelStore<P> for MemoryStore<P> {
    fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    fn get(&self, row: usize, col: usize) -> P {
        self.data[[row, col]]
    }

    fn set(&mut self, row: usize, col: usize, value: P) {
        self.data[[row, col]] = value;
    }

    fn read_region(&self, roi: &BoundingBox) -> Array2<P> {
        roi.view(&self.data).to_owned()
    }

    fn write_region(&mut self, roi: &BoundingBox, data: ArrayView2<P>) -> Result<()> {
        check_region(self.dim(), roi, data.dim())?;
        roi.view_mut(&mut self.data).assign(&data);
        Ok(())
    }

    fn to_array(&self) -> Array2<P> {
        self.data.clone()
    }
}

/// Tiled store in a memory-mapped scratch file.
///
/// Pixels are kept as little-endian `f32` channels, grouped in
/// `TILE_SIZE x TILE_SIZE` tiles so region access touches contiguous pages.
/// The scratch file is unlinked on creation and vanishes with the store.
pub struct TiledStore<P> {
    mmap: MmapMut,
    _file: File,
    height: usize,
    width: usize,
    tiles_x: usize,
    _marker: PhantomData<P>,
}

impl<P: Pixel> TiledStore<P> {
    pub fn create(dim: (usize, usize), dir: Option<&Path>) -> Result<Self> {
        let (height, width) = dim;
        let tiles_x = width.div_ceil(TILE_SIZE);
        let tiles_y = height.div_ceil(TILE_SIZE);
        let bytes = tiles_x * tiles_y * TILE_SIZE * TILE_SIZE * Self::pixel_bytes();

        let file = match dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        // Zero-length mappings are rejected on some platforms.
        file.set_len(bytes.max(Self::pixel_bytes()) as u64)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        debug!(width, height, tiles = tiles_x * tiles_y, "Created tiled store");

        Ok(Self {
            mmap,
            _file: file,
            height,
            width,
            tiles_x,
            _marker: PhantomData,
        })
    }

    fn pixel_bytes() -> usize {
        P::CHANNELS * std::mem::size_of::<f32>()
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        let tile = (row / TILE_SIZE) * self.tiles_x + col / TILE_SIZE;
        let within = (row % TILE_SIZE) * TILE_SIZE + col % TILE_SIZE;
        (tile * TILE_SIZE * TILE_SIZE + within) * Self::pixel_bytes()
    }

    /// Visit every `(row, col)` of `roi` tile by tile.
    fn for_each_tiled(roi: &BoundingBox, mut f: impl FnMut(usize, usize)) {
        if roi.is_empty() {
            return;
        }
        let ty0 = roi.y0 / TILE_SIZE;
        let ty1 = (roi.y1 - 1) / TILE_SIZE;
        let tx0 = roi.x0 / TILE_SIZE;
        let tx1 = (roi.x1 - 1) / TILE_SIZE;
        for ty in ty0..=ty1 {
            let rows = (ty * TILE_SIZE).max(roi.y0)..((ty + 1) * TILE_SIZE).min(roi.y1);
            for tx in tx0..=tx1 {
                let cols = (tx * TILE_SIZE).max(roi.x0)..((tx + 1) * TILE_SIZE).min(roi.x1);
                for row in rows.clone() {
                    for col in cols.clone() {
                        f(row, col);
                    }
                }
            }
        }
    }
}

impl<P: Pixel> PixelStore<P> for TiledStore<P> {
    fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    fn get(&self, row: usize, col: usize) -> P {
        debug_assert!(row < self.height && col < self.width);
        let base = self.offset(row, col);
        let mut channels = [0.0f32; 4];
        for (c, ch) in channels.iter_mut().take(P::CHANNELS).enumerate() {
            let at = base + c * 4;
            *ch = LittleEndian::read_f32(&self.mmap[at..at + 4]);
        }
        P::from_channels(&channels)
    }

    fn set(&mut self, row: usize, col: usize, value: P) {
        debug_assert!(row < self.height && col < self.width);
        let base = self.offset(row, col);
        let mut channels = [0.0f32; 4];
        value.write_channels(&mut channels);
        for (c, ch) in channels.iter().take(P::CHANNELS).enumerate() {
            let at = base + c * 4;
            LittleEndian::write_f32(&mut self.mmap[at..at + 4], *ch);
        }
    }

    fn read_region(&self, roi: &BoundingBox) -> Array2<P> {
        let mut out = Array2::from_elem(roi.dim(), P::zero());
        Self::for_each_tiled(roi, |row, col| {
            out[[row - roi.y0, col - roi.x0]] = self.get(row, col);
        });
        out
    }

    fn write_region(&mut self, roi: &BoundingBox, data: ArrayView2<P>) -> Result<()> {
        check_region(self.dim(), roi, data.dim())?;
        Self::for_each_tiled(roi, |row, col| {
            self.set(row, col, data[[row - roi.y0, col - roi.x0]]);
        });
        Ok(())
    }
}

/// Allocate a zero-filled store of the requested kind.
pub fn create_store<P: Pixel>(
    mode: &StorageMode,
    dim: (usize, usize),
) -> Result<Box<dyn PixelStore<P>>> {
    Ok(match mode {
        StorageMode::Memory => Box::new(MemoryStore::<P>::new(dim)),
        StorageMode::Disk { dir } => Box::new(TiledStore::<P>::create(dim, dir.as_deref())?),
    })
}

/// Move an array into a store of the requested kind.
pub fn store_from_array<P: Pixel>(
    mode: &StorageMode,
    data: Array2<P>,
) -> Result<Box<dyn PixelStore<P>>> {
    match mode {
        StorageMode::Memory => Ok(Box::new(MemoryStore::from_array(data))),
        StorageMode::Disk { .. } => {
            let mut store = create_store(mode, data.dim())?;
            store.write_region(&BoundingBox::from_dim(data.dim()), data.view())?;
            Ok(store)
        }
    }
}
