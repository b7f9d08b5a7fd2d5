pub mod backend;
pub mod brush;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod software;
pub mod surface;
pub mod text;
