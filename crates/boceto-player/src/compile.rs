//! Sketch flattening and wiring into an engine instance graph.

use std::collections::{BTreeMap, HashMap};

use boceto_engine::{Engine, EngineError, EngineFault, NodeIndex, PrimitiveKind};
use boceto_model::{ComponentId, ComponentKind, Destination, SKETCH_PRIMITIVE_MAX, Sketch};

/// Errors from compiling a sketch into an engine graph.
///
/// All of these are structural defects in the sketch; the engine built so far
/// is dropped and no partial state survives.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// An edge references a component id missing from its sketch.
    #[error("destination references missing component: {0}")]
    DanglingDestination(ComponentId),

    /// An edge addresses an input port a sketch does not have.
    #[error("input port {index} does not exist (sketch has {ports})")]
    UnknownInputPort {
        /// Offending port index.
        index: usize,
        /// Number of ports the addressed sketch actually has.
        ports: usize,
    },

    /// The flattened graph contains more than one speaker.
    #[error("multiple speakers: '{first}' and '{second}'")]
    MultipleSinks {
        /// Root-level component carrying the first speaker found.
        first: ComponentId,
        /// Root-level component carrying the second speaker found.
        second: ComponentId,
    },

    /// An input component literal does not parse as a number.
    #[error("input component '{component}' has unparseable value '{value}'")]
    InvalidInputValue {
        /// The input component.
        component: ComponentId,
        /// The literal as entered.
        value: String,
    },

    /// The recursive primitive count exceeds the node budget.
    #[error("node budget exceeded: {count} primitive components (max {max})")]
    BudgetExceeded {
        /// Recursive primitive count of the rejected sketch.
        count: usize,
        /// The node budget.
        max: usize,
    },

    /// The engine rejected an allocation or wiring call, typically fan-in
    /// overflowing a proxy's input slots.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A sketch flattened into a wired engine, plus the bookkeeping needed to
/// talk about the running graph in sketch terms.
#[derive(Debug)]
pub struct CompiledGraph {
    pub(crate) engine: Engine,
    /// Root-level component id to engine slot.
    pub(crate) index_map: HashMap<ComponentId, NodeIndex>,
    /// Engine slot back to the root-level component it belongs to. Slots
    /// inside a composite map to the enclosing composite; root input-port
    /// proxies map to nothing.
    pub(crate) slot_owner: Vec<Option<ComponentId>>,
    /// The speaker proxy, if the sketch has one.
    pub(crate) sink: Option<NodeIndex>,
}

impl CompiledGraph {
    /// Engine slot of a root-level component.
    pub fn node_for(&self, id: &ComponentId) -> Option<NodeIndex> {
        self.index_map.get(id).copied()
    }

    /// Root-level component an engine slot belongs to. Used to surface
    /// runtime faults on an editable component.
    pub fn owner_of(&self, node: NodeIndex) -> Option<&ComponentId> {
        self.slot_owner
            .get(node.index() as usize)
            .and_then(Option::as_ref)
    }

    /// The sink node, if the sketch has a speaker.
    pub fn sink(&self) -> Option<NodeIndex> {
        self.sink
    }

    /// Number of engine nodes the sketch flattened to.
    pub fn node_count(&self) -> usize {
        self.engine.node_count()
    }

    /// Renders `frames` samples from the sink. A sketch without a speaker
    /// renders silence.
    pub fn process(&mut self, frames: usize) -> Result<Vec<f32>, EngineFault> {
        match self.sink {
            Some(sink) => self.engine.process(frames, sink),
            None => Ok(vec![0.0; frames]),
        }
    }
}

/// Compiles a sketch into a freshly wired engine.
///
/// Pure read of the sketch: flattens composites recursively, wires every
/// edge, seeds input constants, and locates the sink. Interface components
/// and sketch input/output ports become [`Distributor`](PrimitiveKind::Distributor)
/// proxy nodes; incoming edges on a proxy take successive input slots so the
/// proxy sums its fan-in.
pub fn compile(sketch: &Sketch, sample_rate: f32) -> Result<CompiledGraph, CompileError> {
    let count = sketch.count_primitive_components();
    if count > SKETCH_PRIMITIVE_MAX {
        return Err(CompileError::BudgetExceeded {
            count,
            max: SKETCH_PRIMITIVE_MAX,
        });
    }

    let mut compiler = Compiler {
        engine: Engine::new(sample_rate),
        slot_owner: Vec::new(),
        sinks: Vec::new(),
        fan_in: HashMap::new(),
    };
    let root = compiler.flatten(sketch, None)?;

    let sink = match compiler.sinks.as_slice() {
        [] => None,
        [(_, node)] => Some(*node),
        [(first, _), (second, _), ..] => {
            return Err(CompileError::MultipleSinks {
                first: first.clone(),
                second: second.clone(),
            });
        }
    };

    let mut index_map = HashMap::new();
    for (id, slot) in &root.slots {
        let node = match slot {
            Slot::Single(node) => *node,
            Slot::Composite(instance) => match instance.output {
                Some(node) => node,
                None => continue,
            },
        };
        index_map.insert(id.clone(), node);
    }

    tracing::debug!(
        sketch = %sketch.name,
        nodes = compiler.engine.node_count(),
        sink = ?sink,
        "compile_done"
    );

    Ok(CompiledGraph {
        engine: compiler.engine,
        index_map,
        slot_owner: compiler.slot_owner,
        sink,
    })
}

/// One flattened sketch instance: its components' engine slots, one proxy
/// per external input port, and (for nested instances) the output proxy its
/// `SketchOutput` edges collect into.
struct Instance {
    slots: BTreeMap<ComponentId, Slot>,
    ports: Vec<NodeIndex>,
    output: Option<NodeIndex>,
}

enum Slot {
    Single(NodeIndex),
    Composite(Instance),
}

fn source_node(slot: &Slot) -> Option<NodeIndex> {
    match slot {
        Slot::Single(node) => Some(*node),
        Slot::Composite(instance) => instance.output,
    }
}

struct Compiler {
    engine: Engine,
    slot_owner: Vec<Option<ComponentId>>,
    /// Speakers found so far, attributed to their root-level component.
    sinks: Vec<(ComponentId, NodeIndex)>,
    /// Next free input slot per proxy node.
    fan_in: HashMap<NodeIndex, usize>,
}

impl Compiler {
    fn alloc(&mut self, kind: PrimitiveKind, owner: Option<&ComponentId>) -> NodeIndex {
        let node = self.engine.create_node(kind);
        self.slot_owner.push(owner.cloned());
        node
    }

    /// Flattens one sketch instance. `owner` is the enclosing root-level
    /// component (`None` at the root), used for fault attribution.
    fn flatten(
        &mut self,
        sketch: &Sketch,
        owner: Option<&ComponentId>,
    ) -> Result<Instance, CompileError> {
        // Nested instances collect their SketchOutput edges into one proxy;
        // the root sketch has no output port.
        let output = owner
            .is_some()
            .then(|| self.alloc(PrimitiveKind::Distributor, owner));

        let ports: Vec<NodeIndex> = sketch
            .inputs
            .iter()
            .map(|_| self.alloc(PrimitiveKind::Distributor, owner))
            .collect();

        // Allocation pass: every component gets its engine nodes before any
        // edge of this instance is wired, so forward references resolve.
        let mut slots = BTreeMap::new();
        for (id, component) in &sketch.components {
            let slot = match &component.kind {
                ComponentKind::Amplifier => {
                    Slot::Single(self.alloc(PrimitiveKind::Amplifier, owner))
                }
                ComponentKind::Buffer => Slot::Single(self.alloc(PrimitiveKind::Buffer, owner)),
                ComponentKind::Differentiator => {
                    Slot::Single(self.alloc(PrimitiveKind::Differentiator, owner))
                }
                ComponentKind::Distributor => {
                    Slot::Single(self.alloc(PrimitiveKind::Distributor, owner))
                }
                ComponentKind::Divider => Slot::Single(self.alloc(PrimitiveKind::Divider, owner)),
                ComponentKind::Integrator => {
                    Slot::Single(self.alloc(PrimitiveKind::Integrator, owner))
                }
                ComponentKind::LowerSaturator => {
                    Slot::Single(self.alloc(PrimitiveKind::LowerSaturator, owner))
                }
                ComponentKind::Mixer => Slot::Single(self.alloc(PrimitiveKind::Mixer, owner)),
                ComponentKind::Noise => Slot::Single(self.alloc(PrimitiveKind::Noise, owner)),
                ComponentKind::Saw => Slot::Single(self.alloc(PrimitiveKind::Saw, owner)),
                ComponentKind::Sine => Slot::Single(self.alloc(PrimitiveKind::Sine, owner)),
                ComponentKind::Square => Slot::Single(self.alloc(PrimitiveKind::Square, owner)),
                ComponentKind::Subtractor => {
                    Slot::Single(self.alloc(PrimitiveKind::Subtractor, owner))
                }
                ComponentKind::Triangle => Slot::Single(self.alloc(PrimitiveKind::Triangle, owner)),
                ComponentKind::UpperSaturator => {
                    Slot::Single(self.alloc(PrimitiveKind::UpperSaturator, owner))
                }
                ComponentKind::Input { value } => {
                    let node = self.alloc(PrimitiveKind::Distributor, owner);
                    let parsed: f32 =
                        value
                            .trim()
                            .parse()
                            .map_err(|_| CompileError::InvalidInputValue {
                                component: id.clone(),
                                value: value.clone(),
                            })?;
                    self.engine.set_input_value(node, 0, parsed)?;
                    Slot::Single(node)
                }
                ComponentKind::KeyboardFrequency
                | ComponentKind::KeyboardSwitch
                | ComponentKind::Meter => {
                    Slot::Single(self.alloc(PrimitiveKind::Distributor, owner))
                }
                ComponentKind::Speaker => {
                    let node = self.alloc(PrimitiveKind::Distributor, owner);
                    let attributed = owner.unwrap_or(id).clone();
                    self.sinks.push((attributed, node));
                    Slot::Single(node)
                }
                ComponentKind::Sketch { sketch: child } => {
                    let child_owner = owner.unwrap_or(id);
                    Slot::Composite(self.flatten(child, Some(child_owner))?)
                }
            };
            slots.insert(id.clone(), slot);
        }

        let instance = Instance {
            slots,
            ports,
            output,
        };

        // Wiring pass: component edges, then input port bindings.
        for (id, component) in &sketch.components {
            let Some(source) = source_node(&instance.slots[id]) else {
                continue;
            };
            for destination in &component.output_destinations {
                self.wire(&instance, source, destination)?;
            }
        }
        for (port, proxy) in sketch.inputs.iter().zip(&instance.ports) {
            if let Some(destination) = &port.destination {
                self.wire(&instance, *proxy, destination)?;
            }
        }

        Ok(instance)
    }

    /// Resolves one destination within `instance`'s scope and wires the edge.
    fn wire(
        &mut self,
        instance: &Instance,
        source: NodeIndex,
        destination: &Destination,
    ) -> Result<(), CompileError> {
        let (target, input) = match destination {
            Destination::Component { id, input_index } => match instance.slots.get(id) {
                None => return Err(CompileError::DanglingDestination(id.clone())),
                Some(Slot::Single(node)) => (*node, *input_index),
                Some(Slot::Composite(child)) => {
                    // Edges into a composite address its external input ports.
                    let proxy = *child.ports.get(*input_index).ok_or(
                        CompileError::UnknownInputPort {
                            index: *input_index,
                            ports: child.ports.len(),
                        },
                    )?;
                    (proxy, self.next_fan_in(proxy))
                }
            },
            Destination::SketchInput { index } => {
                let proxy =
                    *instance
                        .ports
                        .get(*index)
                        .ok_or(CompileError::UnknownInputPort {
                            index: *index,
                            ports: instance.ports.len(),
                        })?;
                (proxy, self.next_fan_in(proxy))
            }
            Destination::SketchOutput => match instance.output {
                Some(out) => (out, self.next_fan_in(out)),
                None => {
                    // The root sketch has no output port; the edge is inert.
                    tracing::debug!(%source, "root sketch output edge dropped");
                    return Ok(());
                }
            },
        };
        self.engine.connect(target, input, source)?;
        Ok(())
    }

    fn next_fan_in(&mut self, proxy: NodeIndex) -> usize {
        let slot = self.fan_in.entry(proxy).or_insert(0);
        let taken = *slot;
        *slot += 1;
        taken
    }
}
