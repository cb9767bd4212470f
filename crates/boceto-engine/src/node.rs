//! Node types for the signal engine.
//!
//! Each node has a fixed array of [`INPUT_SLOT_COUNT`] input slots, one
//! output value, and a list of outgoing wires. Input slot layouts are a
//! node-kind convention, not a type: oscillators read their frequency from
//! slot 0, binary arithmetic reads slots 0 and 1, and the summing kinds
//! (mixer, distributor) read every slot.

use core::f32::consts::TAU;

/// Number of input slots on every engine node.
pub const INPUT_SLOT_COUNT: usize = 8;

/// Unique identifier for a node slot within one [`Engine`](crate::Engine).
///
/// Indices are assigned sequentially and never reused within an engine
/// instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub(crate) u32);

impl NodeIndex {
    /// Returns the raw numeric slot.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeIndex({})", self.0)
    }
}

/// The closed set of primitive node behaviors.
///
/// Input slot conventions:
///
/// | Kind | Slots read |
/// |------|------------|
/// | `Sine`/`Saw`/`Square`/`Triangle` | 0 = frequency (Hz) |
/// | `Noise` | none |
/// | `Amplifier` | 0 × 1 |
/// | `Subtractor` | 0 − 1 |
/// | `Divider` | 0 ÷ 1 (0.0 when slot 1 is zero) |
/// | `Mixer`, `Distributor` | sum of all slots |
/// | `LowerSaturator` | max(0, 1) |
/// | `UpperSaturator` | min(0, 1) |
/// | `Buffer` | 0, delayed one sample |
/// | `Integrator` | running sum of slot 0 |
/// | `Differentiator` | slot 0 minus its previous value |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Multiplies slot 0 by slot 1.
    Amplifier,
    /// One-sample delay of slot 0. The only kind guaranteed to break a
    /// feedback cycle.
    Buffer,
    /// First difference of slot 0.
    Differentiator,
    /// Neutral pass-through: sums every input slot. Used as the proxy for
    /// interface components and sketch input ports.
    Distributor,
    /// Divides slot 0 by slot 1; outputs 0.0 on division by zero.
    Divider,
    /// Running sum of slot 0.
    Integrator,
    /// Clamps slot 0 from below at slot 1.
    LowerSaturator,
    /// Sums every input slot.
    Mixer,
    /// White noise, one fresh value per frame.
    Noise,
    /// Sawtooth oscillator, frequency from slot 0.
    Saw,
    /// Sine oscillator, frequency from slot 0.
    Sine,
    /// Square oscillator, frequency from slot 0.
    Square,
    /// Subtracts slot 1 from slot 0.
    Subtractor,
    /// Triangle oscillator, frequency from slot 0.
    Triangle,
    /// Clamps slot 0 from above at slot 1.
    UpperSaturator,
}

impl PrimitiveKind {
    /// Whether this kind advances per-frame state instead of re-evaluating
    /// during propagation. Stateful nodes read the inputs settled at the end
    /// of the previous frame, so they introduce one frame of latency on
    /// their control inputs.
    pub(crate) fn is_stateful(self) -> bool {
        match self {
            Self::Buffer
            | Self::Differentiator
            | Self::Integrator
            | Self::Noise
            | Self::Saw
            | Self::Sine
            | Self::Square
            | Self::Triangle => true,
            Self::Amplifier
            | Self::Distributor
            | Self::Divider
            | Self::LowerSaturator
            | Self::Mixer
            | Self::Subtractor
            | Self::UpperSaturator => false,
        }
    }
}

/// One allocated node slot: behavior, input values, output value, state,
/// and outgoing wires.
#[derive(Debug)]
pub(crate) struct Node {
    pub kind: PrimitiveKind,
    /// Current input slot values, written by upstream propagation and by
    /// [`set_input_value`](crate::Engine::set_input_value).
    pub inputs: [f32; INPUT_SLOT_COUNT],
    /// Current output value.
    pub output: f32,
    /// Outgoing wires as (target node, target input slot).
    pub targets: Vec<(NodeIndex, usize)>,
    /// Oscillator phase in [0, 1).
    phase: f32,
    /// Pending one-sample delay value (Buffer).
    delayed: f32,
    /// Running sum (Integrator).
    accumulator: f32,
    /// Previous slot-0 value (Differentiator).
    previous: f32,
    /// Noise state for pseudo-random generation.
    noise_state: u32,
}

impl Node {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            inputs: [0.0; INPUT_SLOT_COUNT],
            output: 0.0,
            targets: Vec::new(),
            phase: 0.0,
            delayed: 0.0,
            accumulator: 0.0,
            previous: 0.0,
            noise_state: 0x12345678,
        }
    }

    /// Re-evaluates a stateless node from its current inputs.
    ///
    /// Stateful kinds return their frame-fixed output unchanged.
    pub fn evaluate(&self) -> f32 {
        match self.kind {
            PrimitiveKind::Amplifier => self.inputs[0] * self.inputs[1],
            PrimitiveKind::Distributor | PrimitiveKind::Mixer => self.inputs.iter().sum(),
            PrimitiveKind::Divider => {
                if self.inputs[1] == 0.0 {
                    0.0
                } else {
                    self.inputs[0] / self.inputs[1]
                }
            }
            PrimitiveKind::LowerSaturator => self.inputs[0].max(self.inputs[1]),
            PrimitiveKind::Subtractor => self.inputs[0] - self.inputs[1],
            PrimitiveKind::UpperSaturator => self.inputs[0].min(self.inputs[1]),
            PrimitiveKind::Buffer
            | PrimitiveKind::Differentiator
            | PrimitiveKind::Integrator
            | PrimitiveKind::Noise
            | PrimitiveKind::Saw
            | PrimitiveKind::Sine
            | PrimitiveKind::Square
            | PrimitiveKind::Triangle => self.output,
        }
    }

    /// Advances a stateful node by one frame using the inputs settled at the
    /// end of the previous frame. Stateless nodes re-evaluate instead.
    pub fn tick(&mut self, sample_rate: f32) {
        self.output = match self.kind {
            PrimitiveKind::Sine => {
                self.advance_phase(sample_rate);
                (self.phase * TAU).sin()
            }
            PrimitiveKind::Saw => {
                self.advance_phase(sample_rate);
                2.0 * self.phase - 1.0
            }
            PrimitiveKind::Square => {
                self.advance_phase(sample_rate);
                if self.phase < 0.5 { 1.0 } else { -1.0 }
            }
            PrimitiveKind::Triangle => {
                self.advance_phase(sample_rate);
                4.0 * (self.phase - 0.5).abs() - 1.0
            }
            PrimitiveKind::Noise => {
                // xorshift32, mapped to [-1, 1].
                let mut x = self.noise_state;
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                self.noise_state = x;
                (x as f32 / u32::MAX as f32) * 2.0 - 1.0
            }
            PrimitiveKind::Buffer => {
                let out = self.delayed;
                self.delayed = self.inputs[0];
                out
            }
            PrimitiveKind::Integrator => {
                self.accumulator += self.inputs[0];
                self.accumulator
            }
            PrimitiveKind::Differentiator => {
                let out = self.inputs[0] - self.previous;
                self.previous = self.inputs[0];
                out
            }
            PrimitiveKind::Amplifier
            | PrimitiveKind::Distributor
            | PrimitiveKind::Divider
            | PrimitiveKind::LowerSaturator
            | PrimitiveKind::Mixer
            | PrimitiveKind::Subtractor
            | PrimitiveKind::UpperSaturator => self.evaluate(),
        };
    }

    fn advance_phase(&mut self, sample_rate: f32) {
        let increment = self.inputs[0].max(0.0) / sample_rate;
        self.phase = (self.phase + increment).rem_euclid(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amplifier_multiplies() {
        let mut node = Node::new(PrimitiveKind::Amplifier);
        node.inputs[0] = 3.0;
        node.inputs[1] = 0.5;
        assert_eq!(node.evaluate(), 1.5);
    }

    #[test]
    fn divider_guards_zero() {
        let mut node = Node::new(PrimitiveKind::Divider);
        node.inputs[0] = 1.0;
        node.inputs[1] = 0.0;
        assert_eq!(node.evaluate(), 0.0);
        node.inputs[1] = 2.0;
        assert_eq!(node.evaluate(), 0.5);
    }

    #[test]
    fn mixer_sums_all_slots() {
        let mut node = Node::new(PrimitiveKind::Mixer);
        node.inputs[0] = 1.0;
        node.inputs[3] = 2.0;
        node.inputs[7] = -0.5;
        assert_eq!(node.evaluate(), 2.5);
    }

    #[test]
    fn saturators_clamp() {
        let mut lower = Node::new(PrimitiveKind::LowerSaturator);
        lower.inputs[0] = -2.0;
        lower.inputs[1] = -1.0;
        assert_eq!(lower.evaluate(), -1.0);

        let mut upper = Node::new(PrimitiveKind::UpperSaturator);
        upper.inputs[0] = 2.0;
        upper.inputs[1] = 1.0;
        assert_eq!(upper.evaluate(), 1.0);
    }

    #[test]
    fn buffer_delays_one_frame() {
        let mut node = Node::new(PrimitiveKind::Buffer);
        node.inputs[0] = 1.0;
        node.tick(48000.0);
        assert_eq!(node.output, 0.0);
        node.tick(48000.0);
        assert_eq!(node.output, 1.0);
    }

    #[test]
    fn differentiator_outputs_first_difference() {
        let mut node = Node::new(PrimitiveKind::Differentiator);
        node.inputs[0] = 2.0;
        node.tick(48000.0);
        assert_eq!(node.output, 2.0);
        node.inputs[0] = 5.0;
        node.tick(48000.0);
        assert_eq!(node.output, 3.0);
    }

    #[test]
    fn sine_phase_wraps() {
        let mut node = Node::new(PrimitiveKind::Sine);
        node.inputs[0] = 480.0;
        for _ in 0..48000 {
            node.tick(48000.0);
            assert!(node.output.is_finite());
            assert!(node.output.abs() <= 1.0 + f32::EPSILON);
        }
    }

    #[test]
    fn noise_stays_in_range() {
        let mut node = Node::new(PrimitiveKind::Noise);
        let mut last = 0.0;
        let mut changed = false;
        for _ in 0..256 {
            node.tick(48000.0);
            assert!((-1.0..=1.0).contains(&node.output));
            changed |= node.output != last;
            last = node.output;
        }
        assert!(changed, "noise output never changed");
    }
}
