//! Device-free integration tests: sketch in, samples out.

use boceto_engine::EngineFault;
use boceto_model::{Component, ComponentId, ComponentKind, Destination, Sketch, SketchInputPort};
use boceto_player::{CompileError, compile, render_offline};

const SAMPLE_RATE: f32 = 48000.0;

fn add(sketch: &mut Sketch, id: &str, kind: ComponentKind) {
    sketch
        .add_component(id.into(), Component::new(id, kind))
        .unwrap();
}

fn link(sketch: &mut Sketch, source: &str, target: &str, input: usize) {
    sketch
        .connect(&source.into(), Destination::component(target, input))
        .unwrap();
}

/// input(440) -> sine -> speaker.
fn sine_patch() -> Sketch {
    let mut sketch = Sketch::new("sine patch");
    add(&mut sketch, "freq", ComponentKind::Input { value: "440".into() });
    add(&mut sketch, "osc", ComponentKind::Sine);
    add(&mut sketch, "speaker", ComponentKind::Speaker);
    link(&mut sketch, "freq", "osc", 0);
    link(&mut sketch, "osc", "speaker", 0);
    sketch
}

#[test]
fn sine_patch_renders_exactly_requested_frames() {
    let buffer = render_offline(&sine_patch(), SAMPLE_RATE, 256).unwrap();
    assert_eq!(buffer.len(), 256);
    assert!(buffer.iter().all(|s| s.is_finite()));
    assert!(
        buffer.iter().any(|s| s.abs() > 0.1),
        "oscillator never moved"
    );
}

#[test]
fn sketch_without_speaker_renders_silence() {
    let sketch = sine_patch().remove_component(&"speaker".into());
    let buffer = render_offline(&sketch, SAMPLE_RATE, 64).unwrap();
    assert_eq!(buffer, vec![0.0; 64]);
}

#[test]
fn composite_signal_flows_through_ports() {
    // Inner sketch: port 0 feeds an oscillator, which feeds the output port.
    let mut inner = Sketch::new("voice");
    inner.inputs.push(SketchInputPort::new("frequency"));
    add(&mut inner, "osc", ComponentKind::Sine);
    inner
        .bind_input(0, Some(Destination::component("osc", 0)))
        .unwrap();
    inner
        .connect(&"osc".into(), Destination::SketchOutput)
        .unwrap();

    let mut outer = Sketch::new("host");
    add(&mut outer, "freq", ComponentKind::Input { value: "440".into() });
    add(
        &mut outer,
        "voice",
        ComponentKind::Sketch {
            sketch: Box::new(inner),
        },
    );
    add(&mut outer, "speaker", ComponentKind::Speaker);
    link(&mut outer, "freq", "voice", 0);
    link(&mut outer, "voice", "speaker", 0);

    let buffer = render_offline(&outer, SAMPLE_RATE, 256).unwrap();
    assert!(buffer.iter().any(|s| s.abs() > 0.1), "nested voice silent");
}

#[test]
fn composite_port_sums_parallel_sources() {
    // Inner sketch is a bare pass-through: port 0 straight to the output.
    let mut inner = Sketch::new("pass");
    inner.inputs.push(SketchInputPort::new("in"));
    inner.bind_input(0, Some(Destination::SketchOutput)).unwrap();

    let mut outer = Sketch::new("sum");
    add(&mut outer, "a", ComponentKind::Input { value: "2".into() });
    add(&mut outer, "b", ComponentKind::Input { value: "3".into() });
    add(
        &mut outer,
        "pass",
        ComponentKind::Sketch {
            sketch: Box::new(inner),
        },
    );
    add(&mut outer, "speaker", ComponentKind::Speaker);
    link(&mut outer, "a", "pass", 0);
    link(&mut outer, "b", "pass", 0);
    link(&mut outer, "pass", "speaker", 0);

    let buffer = render_offline(&outer, SAMPLE_RATE, 8).unwrap();
    assert_eq!(buffer, vec![5.0; 8]);
}

#[test]
fn multiple_speakers_are_rejected() {
    let mut sketch = sine_patch();
    add(&mut sketch, "second", ComponentKind::Speaker);
    link(&mut sketch, "osc", "second", 0);

    let err = compile(&sketch, SAMPLE_RATE).unwrap_err();
    assert!(matches!(err, CompileError::MultipleSinks { .. }));
}

#[test]
fn edge_into_missing_port_is_rejected() {
    let mut inner = Sketch::new("one port");
    inner.inputs.push(SketchInputPort::new("in"));

    let mut outer = Sketch::new("host");
    add(&mut outer, "freq", ComponentKind::Input { value: "1".into() });
    add(
        &mut outer,
        "nested",
        ComponentKind::Sketch {
            sketch: Box::new(inner),
        },
    );
    link(&mut outer, "freq", "nested", 3);

    let err = compile(&outer, SAMPLE_RATE).unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnknownInputPort { index: 3, ports: 1 }
    ));
}

#[test]
fn stateless_feedback_faults_with_component_attribution() {
    let mut sketch = Sketch::new("loop");
    add(&mut sketch, "one", ComponentKind::Input { value: "1".into() });
    add(&mut sketch, "sub", ComponentKind::Subtractor);
    add(&mut sketch, "speaker", ComponentKind::Speaker);
    link(&mut sketch, "one", "sub", 0);
    link(&mut sketch, "sub", "sub", 1);
    link(&mut sketch, "sub", "speaker", 0);

    let mut compiled = compile(&sketch, SAMPLE_RATE).unwrap();
    let fault = compiled.process(16).unwrap_err();
    let EngineFault::InfiniteLoop { node } = fault else {
        panic!("expected infinite loop fault, got {fault:?}");
    };
    assert_eq!(compiled.owner_of(node), Some(&ComponentId::from("sub")));
}

#[test]
fn fault_inside_composite_names_the_composite() {
    let mut inner = Sketch::new("looping voice");
    add(&mut inner, "one", ComponentKind::Input { value: "1".into() });
    add(&mut inner, "sub", ComponentKind::Subtractor);
    link(&mut inner, "one", "sub", 0);
    link(&mut inner, "sub", "sub", 1);
    inner
        .connect(&"sub".into(), Destination::SketchOutput)
        .unwrap();

    let mut outer = Sketch::new("host");
    add(
        &mut outer,
        "voice",
        ComponentKind::Sketch {
            sketch: Box::new(inner),
        },
    );
    add(&mut outer, "speaker", ComponentKind::Speaker);
    link(&mut outer, "voice", "speaker", 0);

    let mut compiled = compile(&outer, SAMPLE_RATE).unwrap();
    let EngineFault::InfiniteLoop { node } = compiled.process(4).unwrap_err() else {
        panic!("expected infinite loop fault");
    };
    assert_eq!(compiled.owner_of(node), Some(&ComponentId::from("voice")));
}

#[test]
fn buffer_component_breaks_feedback() {
    let mut sketch = Sketch::new("delayed loop");
    add(&mut sketch, "one", ComponentKind::Input { value: "1".into() });
    add(&mut sketch, "mix", ComponentKind::Mixer);
    add(&mut sketch, "delay", ComponentKind::Buffer);
    add(&mut sketch, "speaker", ComponentKind::Speaker);
    link(&mut sketch, "one", "mix", 0);
    link(&mut sketch, "mix", "delay", 0);
    link(&mut sketch, "delay", "mix", 1);
    link(&mut sketch, "mix", "speaker", 0);

    let buffer = render_offline(&sketch, SAMPLE_RATE, 16).unwrap();
    assert_eq!(buffer.len(), 16);
    assert!(buffer.iter().all(|s| s.is_finite()));
}

#[test]
fn keyboard_components_compile_to_controllable_slots() {
    let mut sketch = Sketch::new("keys");
    add(&mut sketch, "kbd", ComponentKind::KeyboardFrequency);
    add(&mut sketch, "osc", ComponentKind::Sine);
    add(&mut sketch, "speaker", ComponentKind::Speaker);
    link(&mut sketch, "kbd", "osc", 0);
    link(&mut sketch, "osc", "speaker", 0);

    let compiled = compile(&sketch, SAMPLE_RATE).unwrap();
    assert!(compiled.node_for(&"kbd".into()).is_some());
}
