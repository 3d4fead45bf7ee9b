pub mod category;
pub mod confidence;
pub mod config;
pub mod error;
pub mod geometry;
pub mod model;
