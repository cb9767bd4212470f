//! The live player: a compiled sketch bound to a cpal output stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use boceto_engine::{EngineFault, NodeIndex};
use boceto_model::{ComponentId, Sketch};

use crate::compile::{CompileError, CompiledGraph, compile};

/// Errors from starting or controlling a [`Player`].
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// No audio output device is available on this host.
    #[error("no audio output device available")]
    NoDevice,

    /// No output device matches the requested name.
    #[error("no output device matching '{0}'")]
    DeviceNotFound(String),

    /// The audio backend rejected a stream operation.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// The referenced component is not a root-level component of the
    /// playing sketch.
    #[error("unknown component: {0}")]
    UnknownComponent(ComponentId),

    /// The player has already stopped or faulted.
    #[error("player is not running")]
    NotRunning,

    /// The sketch failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The engine faulted while rendering offline.
    #[error(transparent)]
    Fault(#[from] EngineFault),
}

/// Lifecycle of a [`Player`]. A player is handed out already running; the
/// compiling phase happens inside [`Player::run`]. Faulted and Stopped are
/// terminal: a new `run` builds a fresh player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// The stream is live and rendering the compiled sketch.
    Running,
    /// The engine faulted; the stream has been released.
    Faulted,
    /// [`Player::stop`] released the stream.
    Stopped,
}

/// Player construction options.
#[derive(Debug, Clone, Default)]
pub struct PlayerConfig {
    /// Output device name; the host default when `None`.
    pub output_device: Option<String>,
}

/// A runtime fault surfaced to the control side.
#[derive(Debug, Clone)]
pub struct FaultReport {
    /// Engine slot the fault was raised on.
    pub node: NodeIndex,
    /// Root-level component the slot belongs to, when attributable.
    pub component: Option<ComponentId>,
}

/// A sketch playing live on an audio output stream.
///
/// The audio callback owns the compiled engine outright; the player keeps
/// only channels to it. Live input overrides travel over an mpsc command
/// channel the callback drains without blocking, and a fault travels back
/// once over a dedicated channel, after which the callback emits silence
/// until the player is torn down.
pub struct Player {
    state: PlayerState,
    stream: Option<cpal::Stream>,
    running: Arc<AtomicBool>,
    commands: mpsc::Sender<(NodeIndex, f32)>,
    faults: mpsc::Receiver<NodeIndex>,
    index_map: HashMap<ComponentId, NodeIndex>,
    slot_owner: Vec<Option<ComponentId>>,
    sample_rate: u32,
}

impl Player {
    /// Compiles `sketch` at the output device's native sample rate and
    /// starts playback.
    pub fn run(sketch: &Sketch, config: &PlayerConfig) -> Result<Self, PlayerError> {
        let host = cpal::default_host();
        let device = match &config.output_device {
            Some(name) => find_output_device(&host, name)?,
            None => host
                .default_output_device()
                .ok_or(PlayerError::NoDevice)?,
        };
        let stream_config = device
            .default_output_config()
            .map_err(|e| PlayerError::Stream(e.to_string()))?;
        let sample_rate = stream_config.sample_rate();
        let channels = stream_config.channels() as usize;

        let CompiledGraph {
            mut engine,
            index_map,
            slot_owner,
            sink,
        } = compile(sketch, sample_rate as f32)?;

        let (command_tx, command_rx) = mpsc::channel::<(NodeIndex, f32)>();
        let (fault_tx, fault_rx) = mpsc::channel::<NodeIndex>();
        let running = Arc::new(AtomicBool::new(true));

        let callback_running = Arc::clone(&running);
        let mut faulted = false;
        let stream = device
            .build_output_stream(
                &stream_config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if faulted || !callback_running.load(Ordering::SeqCst) {
                        data.fill(0.0);
                        return;
                    }

                    // Live constant overrides, delivered without blocking.
                    while let Ok((node, value)) = command_rx.try_recv() {
                        let _ = engine.set_input_value(node, 0, value);
                    }

                    let Some(sink) = sink else {
                        data.fill(0.0);
                        return;
                    };
                    let frames = data.len() / channels;
                    match engine.process(frames, sink) {
                        Ok(buffer) => {
                            for (frame, sample) in buffer.iter().enumerate() {
                                let start = frame * channels;
                                data[start..start + channels].fill(*sample);
                            }
                        }
                        Err(fault) => {
                            faulted = true;
                            let node = match fault {
                                EngineFault::InfiniteLoop { node }
                                | EngineFault::UnknownSink(node) => node,
                            };
                            let _ = fault_tx.send(node);
                            data.fill(0.0);
                        }
                    }
                },
                |err| tracing::warn!(%err, "output stream error"),
                None,
            )
            .map_err(|e| PlayerError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| PlayerError::Stream(e.to_string()))?;
        tracing::info!(sketch = %sketch.name, sample_rate, channels, "player_start");

        Ok(Self {
            state: PlayerState::Running,
            stream: Some(stream),
            running,
            commands: command_tx,
            faults: fault_rx,
            index_map,
            slot_owner,
            sample_rate,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Sample rate the stream is running at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Checks for a pending engine fault. On the first fault this releases
    /// the stream, transitions to [`PlayerState::Faulted`], and maps the
    /// faulting engine slot back to the root-level component it belongs to.
    pub fn poll_fault(&mut self) -> Option<FaultReport> {
        if self.state != PlayerState::Running {
            return None;
        }
        let node = self.faults.try_recv().ok()?;
        let component = self
            .slot_owner
            .get(node.index() as usize)
            .cloned()
            .flatten();
        tracing::warn!(%node, component = ?component, "player_fault");
        self.release();
        self.state = PlayerState::Faulted;
        Some(FaultReport { node, component })
    }

    /// Stops playback and releases the stream. Idempotent; a second call is
    /// a no-op.
    pub fn stop(&mut self) {
        if self.state == PlayerState::Running {
            self.release();
            self.state = PlayerState::Stopped;
            tracing::info!("player_stop");
        }
    }

    /// Overrides the constant value of a root-level input or keyboard
    /// component while playing.
    pub fn set_input_value(&self, id: &ComponentId, value: f32) -> Result<(), PlayerError> {
        if self.state != PlayerState::Running {
            return Err(PlayerError::NotRunning);
        }
        let node = *self
            .index_map
            .get(id)
            .ok_or_else(|| PlayerError::UnknownComponent(id.clone()))?;
        self.commands
            .send((node, value))
            .map_err(|_| PlayerError::NotRunning)
    }

    fn release(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }
}

/// Compiles and renders a sketch without touching an audio device.
pub fn render_offline(
    sketch: &Sketch,
    sample_rate: f32,
    frames: usize,
) -> Result<Vec<f32>, PlayerError> {
    let mut compiled = compile(sketch, sample_rate)?;
    Ok(compiled.process(frames)?)
}

fn find_output_device(host: &cpal::Host, name: &str) -> Result<cpal::Device, PlayerError> {
    let devices = host
        .output_devices()
        .map_err(|e| PlayerError::Stream(e.to_string()))?;
    for device in devices {
        if device.description().is_ok_and(|d| d.name() == name) {
            return Ok(device);
        }
    }
    Err(PlayerError::DeviceNotFound(name.to_owned()))
}
