//! The engine handle: node allocation, wiring, and buffer rendering.

use std::collections::VecDeque;

use crate::node::{INPUT_SLOT_COUNT, Node, NodeIndex, PrimitiveKind};

/// Errors from engine construction calls (allocation, wiring, seeding).
///
/// These indicate a broken invariant in the caller; a compiler that wires a
/// well-formed sketch never triggers them.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The referenced node slot was never allocated by this engine.
    #[error("unknown node {0}")]
    UnknownNode(NodeIndex),

    /// The input slot index is outside `0..INPUT_SLOT_COUNT`.
    #[error("input slot {slot} out of range for node {node} (max {max})")]
    InputOutOfRange {
        /// Node whose input was addressed.
        node: NodeIndex,
        /// Offending slot index.
        slot: usize,
        /// Exclusive upper bound on slot indices.
        max: usize,
    },
}

/// Runtime faults raised while rendering a buffer.
///
/// Unlike [`EngineError`], a fault can surface at any point after processing
/// begins and is recoverable: the caller tears the graph down and reports the
/// offending node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineFault {
    /// Value propagation failed to stabilize within the frame budget. The
    /// named node sits on a feedback cycle with no delay element.
    #[error("infinite loop detected at node {node}")]
    InfiniteLoop {
        /// A node on the unstable cycle.
        node: NodeIndex,
    },

    /// The requested sink slot was never allocated by this engine.
    #[error("unknown sink {0}")]
    UnknownSink(NodeIndex),
}

/// A set of wired signal-processing nodes advancing in lockstep.
///
/// The engine is an explicit handle: construct as many as needed, one per
/// compiled graph. All construction calls ([`create_node`](Self::create_node),
/// [`connect`](Self::connect), [`set_input_value`](Self::set_input_value))
/// happen before processing; [`process`](Self::process) only advances state.
#[derive(Debug)]
pub struct Engine {
    nodes: Vec<Node>,
    sample_rate: f32,
    /// Reusable propagation worklist, kept across frames to avoid per-frame
    /// allocation in the audio path.
    worklist: VecDeque<u32>,
    /// Per-node re-evaluation counters for the current frame.
    visits: Vec<u32>,
}

impl Engine {
    /// Creates an empty engine running at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            nodes: Vec::new(),
            sample_rate,
            worklist: VecDeque::new(),
            visits: Vec::new(),
        }
    }

    /// Returns the sample rate this engine advances at.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Returns the number of allocated node slots.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Allocates one node of the given kind and returns its stable slot.
    pub fn create_node(&mut self, kind: PrimitiveKind) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        self.visits.push(0);
        tracing::trace!(%index, ?kind, "engine_create");
        index
    }

    /// Wires one edge: `source`'s output feeds `target`'s input slot.
    ///
    /// Duplicate identical wires are tolerated but sum nothing extra; callers
    /// deduplicate upstream.
    pub fn connect(
        &mut self,
        target: NodeIndex,
        target_input: usize,
        source: NodeIndex,
    ) -> Result<(), EngineError> {
        if target_input >= INPUT_SLOT_COUNT {
            return Err(EngineError::InputOutOfRange {
                node: target,
                slot: target_input,
                max: INPUT_SLOT_COUNT,
            });
        }
        self.check_node(target)?;
        self.check_node(source)?;

        let wire = (target, target_input);
        let outgoing = &mut self.nodes[source.0 as usize].targets;
        if !outgoing.contains(&wire) {
            outgoing.push(wire);
        }
        Ok(())
    }

    /// Seeds or overrides a node's input slot with a constant value.
    ///
    /// The value persists until upstream propagation overwrites the slot, so
    /// unwired slots behave as constant inputs.
    pub fn set_input_value(
        &mut self,
        node: NodeIndex,
        input: usize,
        value: f32,
    ) -> Result<(), EngineError> {
        if input >= INPUT_SLOT_COUNT {
            return Err(EngineError::InputOutOfRange {
                node,
                slot: input,
                max: INPUT_SLOT_COUNT,
            });
        }
        self.check_node(node)?;
        self.nodes[node.0 as usize].inputs[input] = value;
        Ok(())
    }

    /// Renders one buffer of `buffer_size` samples read from `sink`,
    /// advancing internal state by `buffer_size` frames.
    pub fn process(
        &mut self,
        buffer_size: usize,
        sink: NodeIndex,
    ) -> Result<Vec<f32>, EngineFault> {
        let sink_slot = sink.0 as usize;
        if sink_slot >= self.nodes.len() {
            return Err(EngineFault::UnknownSink(sink));
        }

        let mut buffer = Vec::with_capacity(buffer_size);
        for _ in 0..buffer_size {
            self.step()?;
            buffer.push(self.nodes[sink_slot].output);
        }
        Ok(buffer)
    }

    /// Advances every node by one frame and propagates values to a fixpoint.
    fn step(&mut self) -> Result<(), EngineFault> {
        for node in &mut self.nodes {
            node.tick(self.sample_rate);
        }

        // Propagate until stable. A node on an all-stateless cycle keeps
        // re-evaluating; once its counter exceeds the node count the value
        // cannot be converging through a DAG anymore.
        let budget = self.nodes.len() as u32 + 1;
        self.visits.fill(0);

        let mut worklist = std::mem::take(&mut self.worklist);
        worklist.clear();
        worklist.extend(0..self.nodes.len() as u32);

        while let Some(slot) = worklist.pop_front() {
            let output = self.nodes[slot as usize].output;
            for wire in 0..self.nodes[slot as usize].targets.len() {
                let (target, input) = self.nodes[slot as usize].targets[wire];
                let target_slot = target.0 as usize;
                if self.nodes[target_slot].inputs[input] == output {
                    continue;
                }
                self.nodes[target_slot].inputs[input] = output;
                if self.nodes[target_slot].kind.is_stateful() {
                    // Stateful nodes pick the new input up on the next tick.
                    continue;
                }
                let evaluated = self.nodes[target_slot].evaluate();
                if evaluated != self.nodes[target_slot].output {
                    self.nodes[target_slot].output = evaluated;
                    self.visits[target_slot] += 1;
                    if self.visits[target_slot] > budget {
                        self.worklist = worklist;
                        return Err(EngineFault::InfiniteLoop { node: target });
                    }
                    worklist.push_back(target.0);
                }
            }
        }

        self.worklist = worklist;
        Ok(())
    }

    fn check_node(&self, node: NodeIndex) -> Result<(), EngineError> {
        if (node.0 as usize) < self.nodes.len() {
            Ok(())
        } else {
            Err(EngineError::UnknownNode(node))
        }
    }
}
