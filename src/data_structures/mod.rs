//! Viewer data structures: models, textures, tilt and the scene host.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `tilt` is the pointer driven model rotation
//! - `scene` holds what is loaded and tracks the asset loads

pub mod model;
pub mod scene;
pub mod texture;
pub mod tilt;
