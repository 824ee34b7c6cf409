//! Composite generation: one image frame per raw product file.
//!
//! Rendering is delegated to an external command (for instance a satpy
//! script producing the natural colour composite), so this crate stays free
//! of any imaging stack.

mod command;
mod config;
mod error;
mod stage;
mod traits;

pub use command::{frame_stem, CommandRenderer};
pub use config::{CompositorConfig, INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER};
pub use error::RenderError;
pub use stage::CompositionStage;
pub use traits::Renderer;
