//! Command-logging device for unit tests.

use crate::device::{
    CapturedAudio, DeviceError, DeviceResult, NodeId, ProcessingUnit, SignalDevice, UnitParam,
};
use crate::note::Waveform;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    CreateSource(NodeId, Waveform),
    CreateUnit(NodeId, ProcessingUnit),
    Connect(NodeId, NodeId),
    SetParam(NodeId, UnitParam, f64),
    Start(NodeId, f64),
    Stop(NodeId, f64),
    Release(NodeId),
    CreateSink(NodeId),
    StartRecording(NodeId),
    StopRecording(NodeId),
}

/// Records every call. The clock only moves when a test sets `now`.
#[derive(Debug, Default)]
pub(crate) struct MockDevice {
    pub now: f64,
    pub commands: Vec<Command>,
    /// Refuse to create more than this many sources.
    pub source_limit: Option<usize>,
    next_id: u32,
    sources_created: usize,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            // 0 is the destination
            next_id: 1,
            ..Default::default()
        }
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn connections(&self) -> Vec<(NodeId, NodeId)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Connect(a, b) => Some((*a, *b)),
                _ => None,
            })
            .collect()
    }

    pub fn starts(&self) -> Vec<(NodeId, f64)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Start(n, t) => Some((*n, *t)),
                _ => None,
            })
            .collect()
    }

    pub fn stops(&self) -> Vec<(NodeId, f64)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Stop(n, t) => Some((*n, *t)),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<NodeId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Release(n) => Some(*n),
                _ => None,
            })
            .collect()
    }
}

impl SignalDevice for MockDevice {
    fn current_time(&self) -> f64 {
        self.now
    }

    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn destination(&self) -> NodeId {
        NodeId::new(0)
    }

    fn create_source(&mut self, waveform: Waveform) -> DeviceResult<NodeId> {
        if self.source_limit.is_some_and(|limit| self.sources_created >= limit) {
            return Err(DeviceError::Backend("source limit reached".into()));
        }
        self.sources_created += 1;
        let id = self.allocate();
        self.commands.push(Command::CreateSource(id, waveform));
        Ok(id)
    }

    fn create_unit(&mut self, unit: ProcessingUnit) -> DeviceResult<NodeId> {
        let id = self.allocate();
        self.commands.push(Command::CreateUnit(id, unit));
        Ok(id)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> DeviceResult<()> {
        self.commands.push(Command::Connect(from, to));
        Ok(())
    }

    fn set_param(&mut self, unit: NodeId, param: UnitParam, value: f64) -> DeviceResult<()> {
        self.commands.push(Command::SetParam(unit, param, value));
        Ok(())
    }

    fn start_source(&mut self, source: NodeId, at: f64) -> DeviceResult<()> {
        self.commands.push(Command::Start(source, at));
        Ok(())
    }

    fn stop_source(&mut self, source: NodeId, at: f64) -> DeviceResult<()> {
        self.commands.push(Command::Stop(source, at));
        Ok(())
    }

    fn release(&mut self, node: NodeId) -> DeviceResult<()> {
        self.commands.push(Command::Release(node));
        Ok(())
    }

    fn create_recording_sink(&mut self) -> DeviceResult<NodeId> {
        let id = self.allocate();
        self.commands.push(Command::CreateSink(id));
        Ok(id)
    }

    fn start_recording(&mut self, sink: NodeId) -> DeviceResult<()> {
        self.commands.push(Command::StartRecording(sink));
        Ok(())
    }

    fn stop_recording(&mut self, sink: NodeId) -> DeviceResult<CapturedAudio> {
        self.commands.push(Command::StopRecording(sink));
        Ok(CapturedAudio {
            sample_rate: self.sample_rate(),
            channels: 1,
            samples: Vec::new(),
        })
    }
}
