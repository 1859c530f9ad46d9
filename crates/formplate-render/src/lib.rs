//! Formplate Render Library
//!
//! Resolves schema types to plugin render functions and builds a
//! toolkit-neutral scene of pages and fields for a host to paint.

mod dispatch;
mod paper;
pub mod plugins;
mod renderer;

pub use dispatch::{Dispatcher, SchemaChange};
pub use paper::SceneRenderer;
pub use plugins::builtin_plugins;
pub use renderer::{
    FrameContext, PageScene, RenderResult, Renderer, RendererError, Scene, SceneItem, ValueSource,
};
