//! The sketch: a full patch graph and its mutation API.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentClass, ComponentId, ComponentKind};
use crate::destination::Destination;
use crate::error::ModelError;
use crate::{COMPONENT_INPUT_MAX, SKETCH_PRIMITIVE_MAX};

/// One external input port of a sketch, optionally bound to a single
/// destination inside the sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchInputPort {
    /// Display label.
    pub name: String,
    /// Where the signal arriving at this port is delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
}

impl SketchInputPort {
    /// Creates an unbound port.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: None,
        }
    }
}

/// The full declarative patch graph a user edits.
///
/// Mutations preserve referential integrity (no dangling [`Destination`])
/// and the recursive node budget. The pure transformations
/// [`remove_connections`](Self::remove_connections) and
/// [`remove_component`](Self::remove_component) return a new sketch and are
/// total over well-formed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sketch {
    /// Display identifier, not unique across sketches.
    pub name: String,
    /// Component map; iteration order is the id order, which keeps
    /// compilation and serialization deterministic.
    #[serde(default, rename = "component")]
    pub components: BTreeMap<ComponentId, Component>,
    /// External input ports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<SketchInputPort>,
}

impl Sketch {
    /// Creates an empty sketch.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: BTreeMap::new(),
            inputs: Vec::new(),
        }
    }

    /// Returns the component stored under `id`.
    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    // --- Mutation API ---

    /// Inserts a component, enforcing the node budget, id uniqueness, and
    /// the integrity of any edges it carries. Duplicate identical edges on
    /// the inserted component are deduplicated on write.
    pub fn add_component(
        &mut self,
        id: ComponentId,
        mut component: Component,
    ) -> Result<(), ModelError> {
        if self.components.contains_key(&id) {
            return Err(ModelError::DuplicateComponent(id));
        }

        let added = match component.kind.class() {
            ComponentClass::Primitive => 1,
            ComponentClass::Interface => 0,
            ComponentClass::Composite(child) => child.count_primitive_components(),
        };
        let count = self.count_primitive_components() + added;
        if count > SKETCH_PRIMITIVE_MAX {
            return Err(ModelError::BudgetExceeded {
                count,
                max: SKETCH_PRIMITIVE_MAX,
            });
        }

        dedup_destinations(&mut component.output_destinations);
        for destination in &component.output_destinations {
            // The component may target itself (feedback), so check against
            // the map with the new id considered present.
            self.check_destination_with(destination, Some(&id))?;
        }

        tracing::debug!(component = %id, "sketch_add");
        self.components.insert(id, component);
        Ok(())
    }

    /// Appends an edge from `source`'s output to `destination`.
    ///
    /// Duplicate identical edges are rejected
    /// ([`ModelError::DuplicateEdge`]); distinct edges to the same component
    /// are fine.
    pub fn connect(
        &mut self,
        source: &ComponentId,
        destination: Destination,
    ) -> Result<(), ModelError> {
        self.check_destination(&destination)?;
        let component = self
            .components
            .get_mut(source)
            .ok_or_else(|| ModelError::UnknownComponent(source.clone()))?;
        if component.output_destinations.contains(&destination) {
            return Err(ModelError::DuplicateEdge {
                source_id: source.clone(),
                destination,
            });
        }
        component.output_destinations.push(destination);
        Ok(())
    }

    /// Binds (or clears) the destination of input port `index`.
    pub fn bind_input(
        &mut self,
        index: usize,
        destination: Option<Destination>,
    ) -> Result<(), ModelError> {
        if let Some(destination) = &destination {
            self.check_destination(destination)?;
        }
        let port = self
            .inputs
            .get_mut(index)
            .ok_or(ModelError::UnknownInputPort(index))?;
        port.destination = destination;
        Ok(())
    }

    /// Returns a sketch with every edge matching any of `targets` dropped
    /// and every matching input binding cleared.
    ///
    /// Pure: `self` is untouched. After this call no edge or binding in the
    /// result references any element of `targets`.
    pub fn remove_connections(&self, targets: &[Destination]) -> Sketch {
        let components = self
            .components
            .iter()
            .map(|(id, component)| {
                let mut component = component.clone();
                component
                    .output_destinations
                    .retain(|destination| !targets.contains(destination));
                (id.clone(), component)
            })
            .collect();

        let inputs = self
            .inputs
            .iter()
            .map(|port| {
                let mut port = port.clone();
                if port
                    .destination
                    .as_ref()
                    .is_some_and(|destination| targets.contains(destination))
                {
                    port.destination = None;
                }
                port
            })
            .collect();

        Sketch {
            name: self.name.clone(),
            components,
            inputs,
        }
    }

    /// Returns a sketch with the component deleted and every edge into it
    /// severed.
    ///
    /// Incoming edges are removed first across the full input-index range,
    /// so no intermediate state with a dangling reference is observable.
    pub fn remove_component(&self, id: &ComponentId) -> Sketch {
        let targets: Vec<Destination> = (0..COMPONENT_INPUT_MAX)
            .map(|input_index| Destination::Component {
                id: id.clone(),
                input_index,
            })
            .collect();

        let mut sketch = self.remove_connections(&targets);
        sketch.components.remove(id);
        tracing::debug!(component = %id, "sketch_remove");
        sketch
    }

    // --- Accounting and validation ---

    /// Counts primitive components recursively through embedded sketches.
    ///
    /// Interface kinds contribute 0; a composite contributes its embedded
    /// sketch's recursive count. The dispatch is an exhaustive match, so an
    /// unrecognized kind cannot exist past compilation of this crate.
    pub fn count_primitive_components(&self) -> usize {
        self.components
            .values()
            .map(|component| match component.kind.class() {
                ComponentClass::Primitive => 1,
                ComponentClass::Interface => 0,
                ComponentClass::Composite(child) => child.count_primitive_components(),
            })
            .sum()
    }

    /// Checks referential integrity and the node budget over the whole
    /// sketch, recursively. Deserialized sketches go through this before
    /// they are trusted.
    pub fn validate(&self) -> Result<(), ModelError> {
        let count = self.count_primitive_components();
        if count > SKETCH_PRIMITIVE_MAX {
            return Err(ModelError::BudgetExceeded {
                count,
                max: SKETCH_PRIMITIVE_MAX,
            });
        }

        for component in self.components.values() {
            for destination in &component.output_destinations {
                self.check_destination(destination)?;
            }
            if let ComponentClass::Composite(child) = component.kind.class() {
                child.validate()?;
            }
        }
        for port in &self.inputs {
            if let Some(destination) = &port.destination {
                self.check_destination(destination)?;
            }
        }
        Ok(())
    }

    fn check_destination(&self, destination: &Destination) -> Result<(), ModelError> {
        self.check_destination_with(destination, None)
    }

    /// Validates one destination, optionally treating `pending` as an id
    /// about to be inserted.
    fn check_destination_with(
        &self,
        destination: &Destination,
        pending: Option<&ComponentId>,
    ) -> Result<(), ModelError> {
        match destination {
            Destination::Component { id, input_index } => {
                if *input_index >= COMPONENT_INPUT_MAX {
                    return Err(ModelError::InputIndexOutOfRange {
                        index: *input_index,
                        max: COMPONENT_INPUT_MAX,
                    });
                }
                if self.components.contains_key(id) || pending == Some(id) {
                    Ok(())
                } else {
                    Err(ModelError::DanglingDestination(id.clone()))
                }
            }
            Destination::SketchOutput => Ok(()),
            Destination::SketchInput { index } => {
                if *index < self.inputs.len() {
                    Ok(())
                } else {
                    Err(ModelError::UnknownInputPort(*index))
                }
            }
        }
    }

    // --- Persistence ---

    /// Serializes the sketch to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a sketch from JSON and validates it.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let mut sketch: Sketch = serde_json::from_str(json)?;
        sketch.dedup_edges();
        sketch.validate()?;
        Ok(sketch)
    }

    /// Loads and validates a sketch from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Saves the sketch to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let content = self.to_json()?;
        std::fs::write(path, content).map_err(|source| ModelError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Drops duplicate identical edges everywhere, recursively. External
    /// data may carry them; in-process mutations never produce them.
    fn dedup_edges(&mut self) {
        for component in self.components.values_mut() {
            dedup_destinations(&mut component.output_destinations);
            if let ComponentKind::Sketch { sketch } = &mut component.kind {
                sketch.dedup_edges();
            }
        }
    }
}

/// Removes repeated destinations while preserving first-seen order.
fn dedup_destinations(destinations: &mut Vec<Destination>) {
    let mut seen = Vec::with_capacity(destinations.len());
    destinations.retain(|destination| {
        if seen.contains(destination) {
            false
        } else {
            seen.push(destination.clone());
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: &str) -> ComponentId {
        id.into()
    }

    fn sine_patch() -> Sketch {
        let mut sketch = Sketch::new("example");
        sketch
            .add_component(
                "freq".into(),
                Component::new("input", ComponentKind::Input { value: "440".into() }),
            )
            .unwrap();
        sketch
            .add_component("sine".into(), Component::new("sine", ComponentKind::Sine))
            .unwrap();
        sketch
            .add_component(
                "speaker".into(),
                Component::new("speaker", ComponentKind::Speaker),
            )
            .unwrap();
        sketch
            .connect(&"freq".into(), Destination::component("sine", 0))
            .unwrap();
        sketch
            .connect(&"sine".into(), Destination::component("speaker", 0))
            .unwrap();
        sketch
    }

    #[test]
    fn connect_rejects_dangling_target() {
        let mut sketch = sine_patch();
        let err = sketch
            .connect(&"sine".into(), Destination::component("ghost", 0))
            .unwrap_err();
        assert!(matches!(err, ModelError::DanglingDestination(_)));
    }

    #[test]
    fn connect_rejects_duplicate_edge() {
        let mut sketch = sine_patch();
        let err = sketch
            .connect(&"sine".into(), Destination::component("speaker", 0))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEdge { .. }));

        // A different input slot on the same target is a distinct edge.
        sketch
            .connect(&"sine".into(), Destination::component("speaker", 1))
            .unwrap();
    }

    #[test]
    fn remove_connections_clears_edges_and_bindings() {
        let mut sketch = sine_patch();
        sketch.inputs.push(SketchInputPort::new("in"));
        sketch
            .bind_input(0, Some(Destination::component("sine", 0)))
            .unwrap();

        let target = Destination::component("sine", 0);
        let cleaned = sketch.remove_connections(std::slice::from_ref(&target));

        assert!(
            cleaned
                .components
                .values()
                .all(|c| !c.output_destinations.contains(&target))
        );
        assert!(cleaned.inputs[0].destination.is_none());
        // Untouched edge survives.
        assert_eq!(
            cleaned.components[&cid("sine")].output_destinations,
            vec![Destination::component("speaker", 0)]
        );
        // Pure: original is intact.
        assert_eq!(
            sketch.components[&cid("freq")].output_destinations,
            vec![Destination::component("sine", 0)]
        );
    }

    #[test]
    fn remove_component_leaves_no_reference() {
        let sketch = sine_patch();
        let removed = sketch.remove_component(&"sine".into());

        assert!(!removed.components.contains_key(&cid("sine")));
        for component in removed.components.values() {
            for destination in &component.output_destinations {
                if let Destination::Component { id, .. } = destination {
                    assert_ne!(id, &cid("sine"));
                }
            }
        }
    }

    #[test]
    fn budget_counts_recursively() {
        let mut inner = Sketch::new("inner");
        for (id, kind) in [
            ("a", ComponentKind::Sine),
            ("b", ComponentKind::Mixer),
            ("c", ComponentKind::Buffer),
        ] {
            inner
                .add_component(id.into(), Component::new(id, kind))
                .unwrap();
        }

        let mut outer = Sketch::new("outer");
        outer
            .add_component("x".into(), Component::new("x", ComponentKind::Saw))
            .unwrap();
        outer
            .add_component("y".into(), Component::new("y", ComponentKind::Amplifier))
            .unwrap();
        outer
            .add_component(
                "nested".into(),
                Component::new(
                    "nested",
                    ComponentKind::Sketch {
                        sketch: Box::new(inner),
                    },
                ),
            )
            .unwrap();
        // Interface components are free.
        outer
            .add_component(
                "speaker".into(),
                Component::new("speaker", ComponentKind::Speaker),
            )
            .unwrap();

        assert_eq!(outer.count_primitive_components(), 5);
    }

    #[test]
    fn budget_gates_component_creation() {
        let mut sketch = Sketch::new("full");
        for i in 0..SKETCH_PRIMITIVE_MAX {
            sketch
                .add_component(
                    ComponentId::new(format!("d{i}")),
                    Component::new("d", ComponentKind::Distributor),
                )
                .unwrap();
        }
        let err = sketch
            .add_component("one-too-many".into(), Component::new("d", ComponentKind::Sine))
            .unwrap_err();
        assert!(matches!(err, ModelError::BudgetExceeded { .. }));

        // Interface kinds still fit.
        sketch
            .add_component(
                "meter".into(),
                Component::new("meter", ComponentKind::Meter),
            )
            .unwrap();
    }

    #[test]
    fn json_round_trip_is_exact() {
        let mut sketch = sine_patch();
        sketch.inputs.push(SketchInputPort::new("in"));
        sketch
            .bind_input(0, Some(Destination::SketchOutput))
            .unwrap();

        let json = sketch.to_json().unwrap();
        let back = Sketch::from_json(&json).unwrap();
        assert_eq!(back, sketch);
    }

    #[test]
    fn from_json_dedups_duplicate_edges() {
        let json = r#"{
            "name": "dup",
            "component": {
                "a": {
                    "name": "sine",
                    "type": "sine",
                    "outputDestinations": [
                        { "type": "component", "id": "b", "inputIndex": 0 },
                        { "type": "component", "id": "b", "inputIndex": 0 }
                    ]
                },
                "b": { "name": "speaker", "type": "speaker" }
            }
        }"#;
        let sketch = Sketch::from_json(json).unwrap();
        assert_eq!(
            sketch.components[&cid("a")].output_destinations.len(),
            1
        );
    }

    #[test]
    fn from_json_rejects_dangling_reference() {
        let json = r#"{
            "name": "broken",
            "component": {
                "a": {
                    "name": "sine",
                    "type": "sine",
                    "outputDestinations": [
                        { "type": "component", "id": "ghost", "inputIndex": 0 }
                    ]
                }
            }
        }"#;
        assert!(matches!(
            Sketch::from_json(json),
            Err(ModelError::DanglingDestination(_))
        ));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch.json");
        let sketch = sine_patch();
        sketch.save(&path).unwrap();
        assert_eq!(Sketch::load(&path).unwrap(), sketch);
    }
}
