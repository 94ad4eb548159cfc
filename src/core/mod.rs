// Core modules: error model, point type, and the scaled-coordinate codec.
pub mod error;
pub mod point;
pub mod scaled;
