//! Boceto Engine - primitive signal-processing runtime
//!
//! This crate implements the sample-accurate instance graph that a compiled
//! sketch runs on. It knows nothing about sketches, component ids, or the
//! editor: it deals in integer node slots, wired edges, and buffers of f32
//! samples.
//!
//! # Core Abstractions
//!
//! - [`Engine`] - an explicit engine handle owning a set of nodes. Multiple
//!   independent engines can coexist in one process; there is no global
//!   singleton.
//! - [`PrimitiveKind`] - the closed set of node behaviors (oscillators,
//!   arithmetic units, saturators, delay elements).
//! - [`NodeIndex`] - stable integer slot returned by
//!   [`create_node()`](Engine::create_node).
//!
//! # Processing Model
//!
//! [`process()`](Engine::process) renders one buffer. Each frame, stateful
//! nodes (oscillators, noise, buffer, integrator, differentiator) advance
//! once using the inputs settled at the end of the previous frame; stateless
//! arithmetic nodes then re-evaluate in a propagation loop until every value
//! is stable. A purely stateless cycle never stabilizes, so the propagation
//! budget trips and the frame aborts with
//! [`EngineFault::InfiniteLoop`] naming a node on the cycle. A [`Buffer`]
//! node delays its input by exactly one sample and therefore legitimately
//! breaks feedback cycles.
//!
//! [`Buffer`]: PrimitiveKind::Buffer
//!
//! # Example
//!
//! ```rust
//! use boceto_engine::{Engine, PrimitiveKind};
//!
//! let mut engine = Engine::new(48000.0);
//! let freq = engine.create_node(PrimitiveKind::Distributor);
//! let sine = engine.create_node(PrimitiveKind::Sine);
//! let sink = engine.create_node(PrimitiveKind::Distributor);
//!
//! engine.connect(sine, 0, freq).unwrap();
//! engine.connect(sink, 0, sine).unwrap();
//! engine.set_input_value(freq, 0, 440.0).unwrap();
//!
//! let buffer = engine.process(64, sink).unwrap();
//! assert_eq!(buffer.len(), 64);
//! ```

mod engine;
mod node;

pub use engine::{Engine, EngineError, EngineFault};
pub use node::{INPUT_SLOT_COUNT, NodeIndex, PrimitiveKind};
