//! Formplate Application
//!
//! Mode facades over the core and render crates: a Designer for layout
//! editing, a Form for filling in values and a read-only Viewer.

mod designer;
mod engine;
mod form;
mod generator;
mod palette;
mod shortcuts;
mod viewer;

pub use designer::Designer;
pub use engine::{FacadeError, FacadeProps, FacadeResult, TemplateSource};
pub use form::Form;
pub use generator::{Generator, GeneratorError, GeneratorResult, JsonGenerator};
pub use palette::{DragData, Palette, PaletteItem};
pub use shortcuts::{Shortcut, ShortcutRegistry};
pub use viewer::Viewer;
