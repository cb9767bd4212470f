//! Boceto Model - the declarative patch graph a user edits
//!
//! A [`Sketch`] is a mapping of component id to [`Component`], plus a set of
//! external input ports. Components fan out to [`Destination`]s: another
//! component's input slot, the sketch's singleton output port, or one of the
//! sketch's input ports. A component may itself embed a whole child sketch
//! (a composite), which the compiler flattens at run time.
//!
//! Everything in this crate is a synchronous, pure transformation on the
//! control thread. Mutation APIs maintain two invariants:
//!
//! - **Referential integrity**: no destination stored anywhere in a sketch
//!   ever references a component id missing from that sketch.
//! - **Node budget**: the recursive count of primitive components never
//!   exceeds [`SKETCH_PRIMITIVE_MAX`]. Interface components (input,
//!   keyboards, speaker, meter) are free.
//!
//! # Editing Support
//!
//! - [`SketchHistory`] - bounded undo/redo log of sketch snapshots
//! - [`Debouncer`] - cancellable scheduled commit keyed by the latest value,
//!   used to coalesce edit bursts into one history entry / autosave write
//!
//! # Persistence
//!
//! Sketches serialize to JSON ([`Sketch::to_json`], [`Sketch::save`]) and
//! deserialize back to a structurally identical value.

mod component;
mod debounce;
mod destination;
mod error;
mod history;
mod sketch;

pub use component::{Component, ComponentClass, ComponentId, ComponentKind};
pub use debounce::Debouncer;
pub use destination::Destination;
pub use error::ModelError;
pub use history::SketchHistory;
pub use sketch::{Sketch, SketchInputPort};

/// Number of input slots a component exposes to incoming edges.
///
/// Matches the engine's per-node input arity.
pub const COMPONENT_INPUT_MAX: usize = 8;

/// Maximum number of primitive components per sketch, counted recursively
/// through embedded composite sketches.
pub const SKETCH_PRIMITIVE_MAX: usize = 256;

/// Maximum number of retained history snapshots.
pub const HISTORY_MAX: usize = 30;
