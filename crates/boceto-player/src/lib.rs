//! Boceto Player - sketch compilation and live playback
//!
//! This crate turns a declarative [`Sketch`](boceto_model::Sketch) into a
//! running signal graph:
//!
//! - [`compile()`] flattens the sketch (composites, interface proxies, input
//!   ports) into a wired [`boceto_engine::Engine`] and locates the speaker
//!   sink. The result is a [`CompiledGraph`] that can render buffers without
//!   any audio device.
//! - [`Player`] binds a compiled sketch to a cpal output stream. The audio
//!   callback owns the engine; the control side talks to it only over
//!   channels ([`Player::set_input_value`], [`Player::poll_fault`]).
//! - [`render_offline()`] compiles and renders in one call, for file export
//!   and tests.
//!
//! # Fault Handling
//!
//! A feedback cycle with no `Buffer` component cannot settle within a frame;
//! the engine aborts the buffer with an infinite-loop fault. The player then
//! emits silence, releases the stream, and [`Player::poll_fault`] reports
//! which root-level component the cycle runs through so the editor can point
//! at it. Inserting a `Buffer` component into the cycle is the remedy.

mod compile;
mod player;

pub use compile::{CompileError, CompiledGraph, compile};
pub use player::{FaultReport, Player, PlayerConfig, PlayerError, PlayerState, render_offline};
