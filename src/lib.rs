//! tilt-viewer
//!
//! A small cross-platform viewer for a single glTF model lit by an HDR
//! environment panorama. Frames pass through a scene pass and a full screen
//! RGB shift effect before they are presented, and the model tilts towards the
//! pointer. Runs natively and in the browser (WebGL2).
//!
//! High-level modules
//! - `camera`: fixed perspective camera and its uniform
//! - `config`: every knob the viewer exposes
//! - `context`: GPU device, surface and the pass chain drawing into it
//! - `data_structures`: models, textures, tilt and the scene host
//! - `flow`: the winit event loop driving loads, input and frames
//! - `interaction`: pointer to tilt mapping and its tween
//! - `pipelines`: render pipeline definitions and shaders
//! - `render`: the per-frame pass chain
//! - `resources`: async loading of the model and the environment map
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod interaction;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use config::ViewerConfig;
pub use flow::{ShutdownHandle, Viewer, ViewerEvent, run};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
