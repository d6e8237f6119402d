//! Color transform pipeline — parameters, matrix composition, caching and gamma LUTs.

pub mod cache;
pub mod lut;
pub mod matrix;
pub mod params;
