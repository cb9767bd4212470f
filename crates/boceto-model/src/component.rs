//! Components: the nodes of a sketch.

use serde::{Deserialize, Serialize};

use crate::destination::Destination;
use crate::sketch::Sketch;

/// Opaque unique identifier of a component, stable for its lifetime and
/// never reused.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl core::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed enumeration of component kinds, with kind-specific payload
/// carried on the variant.
///
/// Three classes (see [`ComponentClass`]): 15 primitives that map one-to-one
/// onto engine node kinds, 5 interface kinds compiled to pass-through
/// proxies, and the composite `Sketch` kind embedding a child sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComponentKind {
    /// Multiplies its first two inputs.
    Amplifier,
    /// One-sample delay; the canonical cycle breaker.
    Buffer,
    /// First difference of its input.
    Differentiator,
    /// Pass-through fan-out.
    Distributor,
    /// Divides input 0 by input 1.
    Divider,
    /// Running sum of its input.
    Integrator,
    /// Clamps input 0 from below at input 1.
    LowerSaturator,
    /// Sums all inputs.
    Mixer,
    /// White noise source.
    Noise,
    /// Sawtooth oscillator.
    Saw,
    /// Sine oscillator.
    Sine,
    /// Square oscillator.
    Square,
    /// Subtracts input 1 from input 0.
    Subtractor,
    /// Triangle oscillator.
    Triangle,
    /// Clamps input 0 from above at input 1.
    UpperSaturator,
    /// Constant value source; the literal is kept as entered and parsed at
    /// compile time.
    #[serde(rename_all = "camelCase")]
    Input {
        /// Literal value as entered in the editor.
        value: String,
    },
    /// Live keyboard frequency control.
    KeyboardFrequency,
    /// Live keyboard gate control.
    KeyboardSwitch,
    /// Designates the compiled graph's sink.
    Speaker,
    /// Signal probe for display.
    Meter,
    /// Composite component embedding a child sketch, flattened at compile
    /// time.
    #[serde(rename_all = "camelCase")]
    Sketch {
        /// The embedded child sketch.
        sketch: Box<Sketch>,
    },
}

/// The three structural classes of [`ComponentKind`].
pub enum ComponentClass<'a> {
    /// Atomic signal/arithmetic operation; counts against the node budget.
    Primitive,
    /// UI-facing component compiled to a pass-through proxy; budget-free.
    Interface,
    /// Embedded child sketch.
    Composite(&'a Sketch),
}

impl ComponentKind {
    /// Classifies the kind. The match is exhaustive on purpose: adding a
    /// kind flags every branching site at compile time.
    pub fn class(&self) -> ComponentClass<'_> {
        match self {
            Self::Amplifier
            | Self::Buffer
            | Self::Differentiator
            | Self::Distributor
            | Self::Divider
            | Self::Integrator
            | Self::LowerSaturator
            | Self::Mixer
            | Self::Noise
            | Self::Saw
            | Self::Sine
            | Self::Square
            | Self::Subtractor
            | Self::Triangle
            | Self::UpperSaturator => ComponentClass::Primitive,
            Self::Input { .. }
            | Self::KeyboardFrequency
            | Self::KeyboardSwitch
            | Self::Speaker
            | Self::Meter => ComponentClass::Interface,
            Self::Sketch { sketch } => ComponentClass::Composite(sketch),
        }
    }
}

/// One node of a sketch: a display name, a kind with payload, and the
/// ordered list of edges leaving its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Display label, independent of the kind.
    pub name: String,
    /// Kind and kind-specific payload.
    #[serde(flatten)]
    pub kind: ComponentKind,
    /// Edges leaving this component's output, in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_destinations: Vec<Destination>,
}

impl Component {
    /// Creates a component with no outgoing edges.
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            output_destinations: Vec::new(),
        }
    }
}
