//! Error types for sketch operations and persistence.

use std::path::PathBuf;
use thiserror::Error;

use crate::component::ComponentId;
use crate::destination::Destination;

/// Errors from sketch mutation and persistence.
///
/// Mutation variants are the structural-defect class: they indicate an edit
/// the graph invariants forbid and abort the operation without applying it.
/// The file variants are ordinary I/O faults.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The referenced component does not exist in this sketch.
    #[error("unknown component: {0}")]
    UnknownComponent(ComponentId),

    /// A destination references a component id missing from the sketch.
    #[error("destination references missing component: {0}")]
    DanglingDestination(ComponentId),

    /// A component input index is outside the fixed slot range.
    #[error("input index {index} out of range (max {max})")]
    InputIndexOutOfRange {
        /// Offending input index.
        index: usize,
        /// Exclusive upper bound on input indices.
        max: usize,
    },

    /// The referenced sketch input port does not exist.
    #[error("sketch input port {0} does not exist")]
    UnknownInputPort(usize),

    /// An identical edge between the same two ports already exists.
    #[error("edge from '{source_id}' to {destination:?} already exists")]
    DuplicateEdge {
        /// Edge source component.
        source_id: ComponentId,
        /// Edge endpoint.
        destination: Destination,
    },

    /// A component with this id already exists in the sketch.
    #[error("component id already in use: {0}")]
    DuplicateComponent(ComponentId),

    /// The recursive primitive count would exceed the node budget.
    #[error("node budget exceeded: {count} primitive components (max {max})")]
    BudgetExceeded {
        /// Recursive primitive count after the rejected edit.
        count: usize,
        /// The node budget.
        max: usize,
    },

    /// Failed to read a sketch file.
    #[error("failed to read sketch '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a sketch file.
    #[error("failed to write sketch '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Sketch JSON could not be parsed or produced.
    #[error("sketch JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
