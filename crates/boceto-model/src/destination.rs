//! Edge endpoints.

use serde::{Deserialize, Serialize};

use crate::component::ComponentId;

/// Where an edge delivers its signal.
///
/// Equality is structural over the tag and fields: two destinations are the
/// same edge endpoint iff they are the same variant with equal field values.
/// Identity plays no role; every edge-mutation path relies on this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Destination {
    /// One of a component's fixed input slots.
    #[serde(rename_all = "camelCase")]
    Component {
        /// Target component id.
        id: ComponentId,
        /// Input slot on the target, `0..COMPONENT_INPUT_MAX`.
        input_index: usize,
    },
    /// The enclosing sketch's singleton output port.
    SketchOutput,
    /// The i-th external input port of the enclosing sketch. Meaningful
    /// inside nested sketches, where the port forwards the signal the parent
    /// wires into the composite component.
    #[serde(rename_all = "camelCase")]
    SketchInput {
        /// Port index into the enclosing sketch's `inputs`.
        index: usize,
    },
}

impl Destination {
    /// Shorthand for a component-input endpoint.
    pub fn component(id: impl Into<ComponentId>, input_index: usize) -> Self {
        Self::Component {
            id: id.into(),
            input_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_component_destinations_match() {
        assert_eq!(
            Destination::component("x", 0),
            Destination::component("x", 0)
        );
    }

    #[test]
    fn any_field_difference_breaks_equality() {
        assert_ne!(
            Destination::component("x", 0),
            Destination::component("y", 0)
        );
        assert_ne!(
            Destination::component("x", 0),
            Destination::component("x", 1)
        );
    }

    #[test]
    fn different_variants_never_match() {
        assert_ne!(Destination::component("x", 0), Destination::SketchOutput);
        assert_ne!(
            Destination::SketchOutput,
            Destination::SketchInput { index: 0 }
        );
        assert_ne!(
            Destination::SketchInput { index: 0 },
            Destination::SketchInput { index: 1 }
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Destination::component("a", 2)).unwrap();
        assert_eq!(json["type"], "component");
        assert_eq!(json["id"], "a");
        assert_eq!(json["inputIndex"], 2);

        let json = serde_json::to_value(Destination::SketchOutput).unwrap();
        assert_eq!(json["type"], "sketchOutput");
    }
}
