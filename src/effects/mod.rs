pub mod blur;
pub mod composite;
pub mod glow;
pub mod raster;
pub mod settings;
