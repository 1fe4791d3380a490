//! Deterministic software [`SignalDevice`].
//!
//! The clock is a frame counter advanced only by [`OfflineDevice::advance`]
//! and [`OfflineDevice::render_frames`], so a render is reproducible sample
//! for sample. The graph is evaluated one frame at a time in topological
//! order; connections that would close a cycle are refused.

use crate::oscillator::{Oscillator, SOURCE_FREQUENCY_HZ};
use crate::units::UnitState;
use motif_core::{
    CapturedAudio, DeviceError, DeviceResult, NodeId, ProcessingUnit, SignalDevice, UnitParam,
    Waveform,
};

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

const DESTINATION: NodeId = NodeId::new(0);

#[derive(Debug)]
struct SourceState {
    osc: Oscillator,
    start: Option<u64>,
    stop: Option<u64>,
}

impl SourceState {
    fn is_sounding(&self, frame: u64) -> bool {
        match self.start {
            Some(start) => frame >= start && self.stop.map_or(true, |stop| frame < stop),
            None => false,
        }
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    recording: bool,
    samples: Vec<f32>,
}

#[derive(Debug)]
enum NodeKind {
    Destination,
    Source(SourceState),
    Unit(UnitState),
    Recorder(RecorderState),
}

impl NodeKind {
    fn name(&self) -> &'static str {
        match self {
            NodeKind::Destination => "destination",
            NodeKind::Source(_) => "source",
            NodeKind::Unit(unit) => unit.kind(),
            NodeKind::Recorder(_) => "recording sink",
        }
    }

    fn has_output(&self) -> bool {
        matches!(self, NodeKind::Source(_) | NodeKind::Unit(_))
    }

    fn has_input(&self) -> bool {
        !matches!(self, NodeKind::Source(_))
    }
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    inputs: Vec<NodeId>,
}

/// Offline renderer implementing [`SignalDevice`].
///
/// ```ignore
/// let mut device = OfflineDevice::new(48_000);
/// let chain = EffectsChain::build(&mut device)?;
/// scheduler.schedule(&pattern, &chain, &mut device, 120.0);
/// device.advance(2.0);
/// let rendered = device.take_output();
/// ```
#[derive(Debug)]
pub struct OfflineDevice {
    sample_rate: u32,
    frame: u64,
    nodes: Vec<Option<Node>>,
    /// Released slots, reused before the table grows.
    free: Vec<u32>,
    /// Evaluation order, rebuilt lazily after topology changes.
    order: Option<Vec<usize>>,
    scratch: Vec<f64>,
    output: Vec<f32>,
}

impl Default for OfflineDevice {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl OfflineDevice {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frame: 0,
            nodes: vec![Some(Node {
                kind: NodeKind::Destination,
                inputs: Vec::new(),
            })],
            free: Vec::new(),
            order: None,
            scratch: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Current clock position in frames.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Render enough frames to move the clock forward by `seconds`.
    pub fn advance(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }
        let frames = (seconds * self.sample_rate as f64).round() as u64;
        self.render_frames(frames);
    }

    pub fn render_frames(&mut self, frames: u64) {
        for _ in 0..frames {
            self.render_frame();
        }
    }

    /// Everything that reached the destination so far.
    pub fn destination_output(&self) -> &[f32] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.output)
    }

    /// Number of live nodes, the destination included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Slots in the node table, live or free. Grows only with the peak
    /// number of simultaneous nodes.
    pub fn slot_capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Current value of a unit parameter.
    pub fn param(&self, unit: NodeId, param: UnitParam) -> Option<f64> {
        match &self.node(unit).ok()?.kind {
            NodeKind::Unit(state) => state.param(param),
            _ => None,
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_ok()
    }

    pub fn inputs(&self, node: NodeId) -> Option<&[NodeId]> {
        self.node(node).ok().map(|n| n.inputs.as_slice())
    }

    /// Sources producing signal at the current frame.
    pub fn sounding_sources(&self) -> usize {
        self.nodes
            .iter()
            .flatten()
            .filter(|n| matches!(&n.kind, NodeKind::Source(s) if s.is_sounding(self.frame)))
            .count()
    }

    fn node(&self, id: NodeId) -> DeviceResult<&Node> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(DeviceError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DeviceResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(DeviceError::UnknownNode(id))
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let node = Some(Node {
            kind,
            inputs: Vec::new(),
        });
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = node;
                NodeId::new(slot)
            }
            None => {
                self.nodes.push(node);
                NodeId::new(self.nodes.len() as u32 - 1)
            }
        };
        self.order = None;
        id
    }

    fn to_frame(&self, param: &'static str, seconds: f64) -> DeviceResult<u64> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(DeviceError::ParamOutOfRange {
                param,
                value: seconds,
            });
        }
        Ok((seconds * self.sample_rate as f64).round() as u64)
    }

    /// Whether `target` is reachable downstream of `from`.
    fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if std::mem::replace(&mut seen[current.index()], true) {
                continue;
            }
            for (idx, node) in self.nodes.iter().enumerate() {
                if let Some(node) = node {
                    if node.inputs.contains(&current) {
                        stack.push(NodeId::new(idx as u32));
                    }
                }
            }
        }
        false
    }

    /// Kahn's algorithm over the live nodes.
    fn evaluation_order(&self) -> Vec<usize> {
        let n = self.nodes.len();
        let mut indegree = vec![0usize; n];
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Some(node) = node {
                indegree[idx] = node.inputs.len();
                for input in &node.inputs {
                    downstream[input.index()].push(idx);
                }
            }
        }

        let mut ready: Vec<usize> = (0..n)
            .filter(|&i| self.nodes[i].is_some() && indegree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(idx) = ready.pop() {
            order.push(idx);
            for &next in &downstream[idx] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.push(next);
                }
            }
        }
        order
    }

    fn render_frame(&mut self) {
        let order = match self.order.take() {
            Some(order) => order,
            None => self.evaluation_order(),
        };

        self.scratch.clear();
        self.scratch.resize(self.nodes.len(), 0.0);
        let frame = self.frame;

        for &idx in &order {
            let Some(node) = self.nodes[idx].as_mut() else {
                continue;
            };
            let input: f64 = node.inputs.iter().map(|i| self.scratch[i.index()]).sum();
            let out = match &mut node.kind {
                NodeKind::Destination => {
                    self.output.push(input as f32);
                    0.0
                }
                NodeKind::Source(source) => {
                    if source.is_sounding(frame) {
                        source.osc.next_sample()
                    } else {
                        0.0
                    }
                }
                NodeKind::Unit(unit) => unit.process(input),
                NodeKind::Recorder(recorder) => {
                    if recorder.recording {
                        recorder.samples.push(input as f32);
                    }
                    0.0
                }
            };
            self.scratch[idx] = out;
        }

        self.order = Some(order);
        self.frame += 1;
    }
}

impl SignalDevice for OfflineDevice {
    fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_source(&mut self, waveform: Waveform) -> DeviceResult<NodeId> {
        let osc = Oscillator::new(waveform, SOURCE_FREQUENCY_HZ, self.sample_rate);
        Ok(self.add_node(NodeKind::Source(SourceState {
            osc,
            start: None,
            stop: None,
        })))
    }

    fn create_unit(&mut self, unit: ProcessingUnit) -> DeviceResult<NodeId> {
        let state = UnitState::new(unit, self.sample_rate);
        Ok(self.add_node(NodeKind::Unit(state)))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> DeviceResult<()> {
        let source = self.node(from)?;
        if !source.kind.has_output() {
            return Err(DeviceError::WrongNodeKind {
                node: from,
                expected: "node with an output",
            });
        }
        let target = self.node(to)?;
        if !target.kind.has_input() {
            return Err(DeviceError::WrongNodeKind {
                node: to,
                expected: "node with an input",
            });
        }
        if target.inputs.contains(&from) {
            return Ok(());
        }
        if self.reaches(to, from) {
            tracing::debug!(%from, %to, "refusing cyclic connection");
            return Err(DeviceError::Cycle { from, to });
        }

        self.node_mut(to)?.inputs.push(from);
        self.order = None;
        Ok(())
    }

    fn set_param(&mut self, unit: NodeId, param: UnitParam, value: f64) -> DeviceResult<()> {
        match &mut self.node_mut(unit)?.kind {
            NodeKind::Unit(state) => state.set_param(unit, param, value),
            kind => {
                tracing::debug!(node = %unit, kind = kind.name(), "parameter not supported");
                Err(DeviceError::WrongNodeKind {
                    node: unit,
                    expected: "processing unit",
                })
            }
        }
    }

    fn start_source(&mut self, source: NodeId, at: f64) -> DeviceResult<()> {
        let at = self.to_frame("start", at)?;
        match &mut self.node_mut(source)?.kind {
            NodeKind::Source(state) => {
                if state.start.is_some() {
                    return Err(DeviceError::AlreadyStarted(source));
                }
                state.start = Some(at);
                Ok(())
            }
            _ => Err(DeviceError::WrongNodeKind {
                node: source,
                expected: "source",
            }),
        }
    }

    fn stop_source(&mut self, source: NodeId, at: f64) -> DeviceResult<()> {
        let at = self.to_frame("stop", at)?;
        match &mut self.node_mut(source)?.kind {
            NodeKind::Source(state) => {
                state.stop = Some(at);
                Ok(())
            }
            _ => Err(DeviceError::WrongNodeKind {
                node: source,
                expected: "source",
            }),
        }
    }

    fn release(&mut self, node: NodeId) -> DeviceResult<()> {
        if node == DESTINATION {
            return Err(DeviceError::Unsupported(
                "the destination cannot be released".into(),
            ));
        }
        self.node(node)?;
        self.nodes[node.index()] = None;
        self.free.push(node.index() as u32);
        for other in self.nodes.iter_mut().flatten() {
            other.inputs.retain(|input| *input != node);
        }
        self.order = None;
        Ok(())
    }

    fn create_recording_sink(&mut self) -> DeviceResult<NodeId> {
        Ok(self.add_node(NodeKind::Recorder(RecorderState::default())))
    }

    fn start_recording(&mut self, sink: NodeId) -> DeviceResult<()> {
        match &mut self.node_mut(sink)?.kind {
            NodeKind::Recorder(recorder) => {
                recorder.recording = true;
                Ok(())
            }
            _ => Err(DeviceError::WrongNodeKind {
                node: sink,
                expected: "recording sink",
            }),
        }
    }

    fn stop_recording(&mut self, sink: NodeId) -> DeviceResult<CapturedAudio> {
        let sample_rate = self.sample_rate;
        match &mut self.node_mut(sink)?.kind {
            NodeKind::Recorder(recorder) => {
                recorder.recording = false;
                Ok(CapturedAudio {
                    sample_rate,
                    channels: 1,
                    samples: std::mem::take(&mut recorder.samples),
                })
            }
            _ => Err(DeviceError::WrongNodeKind {
                node: sink,
                expected: "recording sink",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn device() -> OfflineDevice {
        OfflineDevice::new(1000)
    }

    #[test]
    fn test_clock_counts_frames() {
        let mut device = device();
        assert_eq!(device.current_time(), 0.0);
        device.advance(0.25);
        assert_eq!(device.frame(), 250);
        assert_relative_eq!(device.current_time(), 0.25);
        device.advance(-1.0);
        device.advance(f64::NAN);
        assert_eq!(device.frame(), 250);
        assert_eq!(device.destination_output().len(), 250);
    }

    #[test]
    fn test_source_sounds_between_start_and_stop() {
        let mut device = device();
        let src = device.create_source(Waveform::Square).unwrap();
        device.connect(src, device.destination()).unwrap();
        device.start_source(src, 0.010).unwrap();
        device.stop_source(src, 0.020).unwrap();
        device.render_frames(30);

        let out = device.take_output();
        assert!(out[..10].iter().all(|s| *s == 0.0));
        assert!(out[10..20].iter().any(|s| s.abs() > 0.5));
        assert!(out[20..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut device = device();
        let src = device.create_source(Waveform::Sine).unwrap();
        device.start_source(src, 0.0).unwrap();
        assert_eq!(
            device.start_source(src, 1.0),
            Err(DeviceError::AlreadyStarted(src))
        );
        assert!(device.start_source(src, f64::NAN).is_err());
    }

    #[test]
    fn test_cycle_rejected() {
        let mut device = device();
        let a = device.create_unit(ProcessingUnit::Reverb).unwrap();
        let b = device.create_unit(ProcessingUnit::Reverb).unwrap();
        device.connect(a, b).unwrap();
        assert_eq!(
            device.connect(b, a),
            Err(DeviceError::Cycle { from: b, to: a })
        );
        assert!(matches!(
            device.connect(a, a),
            Err(DeviceError::Cycle { .. })
        ));
    }

    #[test]
    fn test_wrong_direction_rejected() {
        let mut device = device();
        let src = device.create_source(Waveform::Sine).unwrap();
        let unit = device.create_unit(ProcessingUnit::Reverb).unwrap();
        assert!(device.connect(unit, src).is_err());
        assert!(device.connect(device.destination(), unit).is_err());
        assert!(matches!(
            device.connect(NodeId::new(77), unit),
            Err(DeviceError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_gain_and_delay_through_chain() {
        let mut device = device();
        let src = device.create_source(Waveform::Square).unwrap();
        let delay = device
            .create_unit(ProcessingUnit::Delay {
                seconds: 0.005,
                max_seconds: 1.0,
            })
            .unwrap();
        let gain = device
            .create_unit(ProcessingUnit::Gain { level: 0.5 })
            .unwrap();
        device.connect(src, delay).unwrap();
        device.connect(delay, gain).unwrap();
        device.connect(gain, device.destination()).unwrap();
        device.start_source(src, 0.0).unwrap();
        device.render_frames(10);

        let out = device.take_output();
        assert!(out[..4].iter().all(|s| *s == 0.0));
        assert!(out[4..].iter().any(|s| *s != 0.0));
        assert!(out.iter().all(|s| s.abs() <= 0.75));
    }

    #[test]
    fn test_set_param_checks_kind_and_range() {
        let mut device = device();
        let gain = device
            .create_unit(ProcessingUnit::Gain { level: 1.0 })
            .unwrap();
        let delay = device
            .create_unit(ProcessingUnit::Delay {
                seconds: 0.0,
                max_seconds: 1.0,
            })
            .unwrap();

        assert!(device.set_param(gain, UnitParam::Level, 0.3).is_ok());
        assert_relative_eq!(device.param(gain, UnitParam::Level).unwrap(), 0.3, epsilon = 1e-6);
        assert!(matches!(
            device.set_param(gain, UnitParam::Cutoff, 100.0),
            Err(DeviceError::WrongNodeKind { .. })
        ));
        let src = device.create_source(Waveform::Sine).unwrap();
        assert!(matches!(
            device.set_param(src, UnitParam::Level, 1.0),
            Err(DeviceError::WrongNodeKind { .. })
        ));
        assert!(matches!(
            device.set_param(delay, UnitParam::DelayTime, 2.0),
            Err(DeviceError::ParamOutOfRange { .. })
        ));
        assert!(device.set_param(delay, UnitParam::DelayTime, 1.0).is_ok());
    }

    #[test]
    fn test_recording_sink_collects_only_while_recording() {
        let mut device = device();
        let src = device.create_source(Waveform::Square).unwrap();
        let sink = device.create_recording_sink().unwrap();
        device.connect(src, sink).unwrap();
        device.start_source(src, 0.0).unwrap();

        device.render_frames(5);
        device.start_recording(sink).unwrap();
        device.render_frames(10);
        let captured = device.stop_recording(sink).unwrap();
        device.render_frames(5);

        assert_eq!(captured.sample_rate, 1000);
        assert_eq!(captured.channels, 1);
        assert_eq!(captured.samples.len(), 10);
        // Sink is not wired to the destination
        assert!(device.destination_output().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_release_drops_edges() {
        let mut device = device();
        let unit = device.create_unit(ProcessingUnit::Reverb).unwrap();
        let src = device.create_source(Waveform::Sine).unwrap();
        device.connect(src, unit).unwrap();
        assert_eq!(device.node_count(), 3);

        device.release(src).unwrap();
        assert!(!device.contains(src));
        assert_eq!(device.inputs(unit), Some(&[][..]));
        assert!(device.release(src).is_err());
        assert!(device.release(device.destination()).is_err());
    }

    #[test]
    fn test_released_slots_are_reused() {
        let mut device = device();
        let unit = device.create_unit(ProcessingUnit::Reverb).unwrap();

        for _ in 0..500 {
            let src = device.create_source(Waveform::Square).unwrap();
            device.connect(src, unit).unwrap();
            device.start_source(src, device.current_time()).unwrap();
            device.render_frames(2);
            device.release(src).unwrap();
        }
        assert_eq!(device.node_count(), 2);
        assert_eq!(device.slot_capacity(), 3);

        // A reused slot starts with no edges
        let fresh = device.create_unit(ProcessingUnit::Reverb).unwrap();
        assert_eq!(device.inputs(fresh), Some(&[][..]));
        assert_eq!(device.inputs(unit), Some(&[][..]));
        assert_eq!(device.slot_capacity(), 3);
    }
}
