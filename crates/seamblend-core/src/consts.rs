/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Binomial 1D kernel coefficients: [1, 4, 6, 4, 1] / 16.
pub const BINOMIAL_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// Short side (in pixels) at which the level count stops growing.
pub const MIN_COARSE_SIZE: usize = 8;

/// Hard upper bound on pyramid levels, regardless of configuration.
pub const MAX_PYRAMID_LEVELS: usize = 29;

/// Neighborhood radius for kernel density estimation (1 = 3x3).
pub const NEIGHB_DIST: usize = 1;

/// Default kernel bandwidth in Lab units.
pub const DEFAULT_DEGHOST_SIGMA: f64 = 30.0;

/// Default number of weight refinement passes.
pub const DEFAULT_DEGHOST_ITERATIONS: usize = 4;

/// Exponent of the hat function used for initial weights.
pub const HAT_EXPONENT: i32 = 12;

/// Edge length of a tile in disk-backed storage.
pub const TILE_SIZE: usize = 64;

/// Chamfer weight for diagonal steps in the distance transform.
pub const CHAMFER_DIAGONAL: f32 = std::f32::consts::SQRT_2;

/// sRGB D65 reference white (X, Y, Z).
pub const D65_WHITE: [f32; 3] = [0.950_47, 1.0, 1.088_83];

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;
