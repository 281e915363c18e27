pub mod blend;
pub mod color;
pub mod consts;
pub mod deghost;
pub mod engine;
pub mod error;
pub mod io;
pub mod mask;
pub mod pipeline;
pub mod pixel;
pub mod pyramid;
pub mod roi;
pub mod storage;
