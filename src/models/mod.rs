//! Model bundle contract, loading and score blending

pub mod blender;
pub mod bundle;
pub mod loader;
pub mod onnx;

pub use blender::ScoreBlender;
pub use bundle::{ModelBundle, ModelStore};
pub use loader::ModelLoader;
pub use onnx::OnnxModelBundle;
