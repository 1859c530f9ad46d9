//! Formplate Core Library
//!
//! Platform-agnostic data model and state synchronization for the Formplate
//! template editor: the template document, the plugin registry, the template
//! store, and the canvas/sidebar controllers that turn interaction into
//! mutations.

pub mod assets;
pub mod audit;
pub mod canvas;
pub mod input;
pub mod inputs;
pub mod layout;
pub mod options;
pub mod plugin;
pub mod schema;
pub mod selection;
pub mod sidebar;
pub mod store;
pub mod template;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use assets::{
    AssetError, AssetLoader, AssetResult, BlankPageLoader, BoxFuture, MemoryAssetLoader, PageAsset,
    decode_data_uri, encode_data_uri,
};
pub use audit::{audit, hash_template};
pub use canvas::{CanvasAction, CanvasController, CanvasState, DropPayload, InsertionDescriptor};
pub use input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use inputs::{InputChange, InputRecord, diff_inputs, sanitize_record, sanitize_value};
pub use layout::{
    MM_TO_PX, PaperFrame, PaperLayout, RULER_OFFSET, fit_scale, frame_at, page_frames, page_frames_at, page_rects,
    ruler_origin,
};
pub use options::{Container, UiOptions};
pub use plugin::{
    EditorKind, Mode, Plugin, PluginRegistry, PropertyChange, PropertyField, RenderContext, RenderFn,
    Visual,
};
pub use schema::{Schema, SchemaError, SchemaId};
pub use selection::{FieldState, HandleKind, SelectionState};
pub use sidebar::{Axis, ListEntry, PanelField, Sidebar, SidebarError, SidebarView};
pub use store::{Mutation, MutationReport, ObserverId, TemplateStore};
pub use template::{BasePdf, BlankPdf, Template, TemplateError};
