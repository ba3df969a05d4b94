pub mod input;
pub mod state;

pub use input::{EditorEvent, Interaction, Modifiers, PointerButton};
pub use state::{Document, EditorState, Tool};

#[cfg(test)]
mod scenarios;
