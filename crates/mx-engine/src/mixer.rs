//! The mixer: command execution and the pull-based render.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::mem;

use mx_core::Handle;
use parking_lot::Mutex;

use crate::bus::Bus;
use crate::command::{Command, CommandBuffer};
use crate::command_queue::CommandQueue;
use crate::config::MixerConfig;
use crate::error::MixerError;
use crate::event::{EventReceiver, EventSender, MixerEvent};
use crate::object_table::{HandleAllocator, Object, ObjectTable, SharedAllocator};
use crate::processor::ProcessorNode;
use crate::stream::{DataNode, StreamNode, StreamStatus};

/// Producer-side handle onto a [`Mixer`]. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct MixerProducer {
    queue: Arc<CommandQueue>,
    allocator: SharedAllocator,
}

impl MixerProducer {
    /// Reserve a handle for an object created by a later `Init*` command.
    pub fn allocate(&self) -> Handle {
        self.allocator.lock().allocate()
    }

    /// Queue a buffer for the next [`Mixer::process`].
    pub fn submit(&self, buffer: CommandBuffer) {
        self.queue.submit(buffer);
    }

    /// Number of buffers waiting for the render thread.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Owns the object graph and renders it.
///
/// Only the thread that owns the `Mixer` touches the graph; producers talk
/// to it through [`MixerProducer`]s.
pub struct Mixer {
    config: MixerConfig,
    objects: ObjectTable,
    queue: Arc<CommandQueue>,
    master: Option<Handle>,
    events: EventSender,
    receiver: Option<EventReceiver>,
    /// Drained buffers, kept to reuse the allocation.
    pending: Vec<CommandBuffer>,
}

impl Mixer {
    pub fn new(config: MixerConfig) -> Self {
        let allocator = Arc::new(Mutex::new(HandleAllocator::new()));
        let (events, receiver) = EventSender::channel(config.event_capacity);
        Self {
            config,
            objects: ObjectTable::new(allocator),
            queue: Arc::new(CommandQueue::new()),
            master: None,
            events,
            receiver: Some(receiver),
            pending: Vec::new(),
        }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn producer(&self) -> MixerProducer {
        MixerProducer {
            queue: Arc::clone(&self.queue),
            allocator: Arc::clone(self.objects.allocator()),
        }
    }

    /// Take the event consumer. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<EventReceiver> {
        self.receiver.take()
    }

    /// Events discarded because the consumer fell behind.
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    pub fn master_bus(&self) -> Option<Handle> {
        self.master
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    pub fn bus(&self, handle: Handle) -> Result<&Bus, MixerError> {
        self.objects.bus(handle)
    }

    pub fn stream(&self, handle: Handle) -> Result<&StreamNode, MixerError> {
        self.objects.stream(handle)
    }

    pub fn processor(&self, handle: Handle) -> Result<&ProcessorNode, MixerError> {
        self.objects.processor(handle)
    }

    // --- Command execution ---

    /// Drain the command queue and execute every queued command in order.
    ///
    /// # Panics
    /// On any configuration error; see [`try_process`](Self::try_process).
    pub fn process(&mut self) {
        if let Err(err) = self.try_process() {
            panic!("mixer command failed: {}", err);
        }
    }

    /// Drain the command queue and execute every queued command in order.
    ///
    /// Stops at the first failing command; the rest of the drained buffers
    /// are discarded.
    pub fn try_process(&mut self) -> Result<(), MixerError> {
        let mut pending = mem::take(&mut self.pending);
        self.queue.drain_into(&mut pending);

        let mut result = Ok(());
        for buffer in pending.drain(..) {
            if !buffer.name().is_empty() {
                log::debug!("executing command buffer '{}'", buffer.name());
            }
            for command in buffer.into_commands() {
                result = self.execute(command);
                if result.is_err() {
                    break;
                }
            }
            if result.is_err() {
                break;
            }
        }

        pending.clear();
        self.pending = pending;
        result
    }

    fn execute(&mut self, command: Command) -> Result<(), MixerError> {
        log::debug!("{:?}", command);
        match command {
            Command::InitBus { bus } => self.objects.insert(bus, Object::Bus(Bus::new())),
            Command::SetBusOutput { bus, output } => self.set_bus_output(bus, output),
            Command::AddProcessor { bus, processor } => self.add_processor(bus, processor),
            Command::RemoveProcessor { bus, processor } => self.remove_processor(bus, processor),
            Command::SetMasterBus { bus } => {
                if let Some(bus) = bus {
                    self.objects.bus(bus)?;
                }
                self.master = bus;
                Ok(())
            }
            Command::InitData { data, source } => {
                let node = DataNode::new(source)?;
                self.objects.insert(data, Object::Data(node))
            }
            Command::InitStream { stream, data } => {
                let node = self.objects.data(data)?.create_stream(data);
                self.objects.insert(stream, Object::Stream(node))
            }
            Command::PlayStream { stream, repeat } => {
                self.objects.stream_mut(stream)?.play(repeat);
                self.events.send(MixerEvent::StreamStarted { stream });
                Ok(())
            }
            Command::StopStream { stream, reset } => {
                self.objects.stream_mut(stream)?.stop(reset);
                self.events.send(MixerEvent::StreamStopped { stream });
                if reset {
                    self.events.send(MixerEvent::StreamReset { stream });
                }
                Ok(())
            }
            Command::SetStreamOutput { stream, bus } => self.set_stream_output(stream, bus),
            Command::InitProcessor { processor, effect } => {
                self.objects.insert(processor, Object::Processor(ProcessorNode::new(effect)))
            }
            Command::UpdateProcessor { processor, update } => {
                self.objects.processor_mut(processor)?.update(processor, update)
            }
            Command::DeleteObject { object } => self.delete_object(object),
        }
    }

    fn set_bus_output(&mut self, bus: Handle, output: Option<Handle>) -> Result<(), MixerError> {
        if let Some(out) = output {
            self.objects.bus(out)?;
        }
        let previous = self.objects.bus(bus)?.output;
        if let Some(prev) = previous {
            self.objects.bus_mut(prev)?.remove_input_bus(bus);
        }
        self.objects.bus_mut(bus)?.output = output;
        if let Some(out) = output {
            self.objects.bus_mut(out)?.add_input_bus(bus);
        }
        Ok(())
    }

    fn set_stream_output(&mut self, stream: Handle, bus: Option<Handle>) -> Result<(), MixerError> {
        if let Some(bus) = bus {
            self.objects.bus(bus)?;
        }
        let previous = self.objects.stream(stream)?.output;
        if let Some(prev) = previous {
            self.objects.bus_mut(prev)?.remove_input_stream(stream);
        }
        self.objects.stream_mut(stream)?.output = bus;
        if let Some(bus) = bus {
            self.objects.bus_mut(bus)?.add_input_stream(stream);
        }
        Ok(())
    }

    fn add_processor(&mut self, bus: Handle, processor: Handle) -> Result<(), MixerError> {
        let current = self.objects.bus(bus)?.processor;
        let previous_bus = self.objects.processor(processor)?.bus;

        if let Some(prev) = previous_bus.filter(|&b| b != bus) {
            self.objects.bus_mut(prev)?.processor = None;
        }
        if let Some(cur) = current.filter(|&p| p != processor) {
            self.objects.processor_mut(cur)?.bus = None;
        }
        self.objects.bus_mut(bus)?.processor = Some(processor);
        self.objects.processor_mut(processor)?.bus = Some(bus);
        Ok(())
    }

    fn remove_processor(&mut self, bus: Handle, processor: Handle) -> Result<(), MixerError> {
        self.objects.processor(processor)?;
        let target = self.objects.bus_mut(bus)?;
        if target.processor != Some(processor) {
            log::debug!("processor {} is not attached to bus {}", processor, bus);
            return Ok(());
        }
        target.processor = None;
        self.objects.processor_mut(processor)?.bus = None;
        Ok(())
    }

    /// Release an object and sever every edge that points at it.
    fn delete_object(&mut self, object: Handle) -> Result<(), MixerError> {
        match self.objects.release(object)? {
            Object::Bus(bus) => {
                if let Some(out) = bus.output {
                    if let Ok(out) = self.objects.bus_mut(out) {
                        out.remove_input_bus(object);
                    }
                }
                for &input in &bus.input_buses {
                    if let Ok(input) = self.objects.bus_mut(input) {
                        input.output = None;
                    }
                }
                for &stream in &bus.input_streams {
                    if let Ok(stream) = self.objects.stream_mut(stream) {
                        stream.output = None;
                    }
                }
                if let Some(processor) = bus.processor {
                    if let Ok(processor) = self.objects.processor_mut(processor) {
                        processor.bus = None;
                    }
                }
                if self.master == Some(object) {
                    self.master = None;
                }
            }
            Object::Stream(stream) => {
                if let Some(bus) = stream.output {
                    if let Ok(bus) = self.objects.bus_mut(bus) {
                        bus.remove_input_stream(object);
                    }
                }
            }
            Object::Processor(processor) => {
                if let Some(bus) = processor.bus {
                    if let Ok(bus) = self.objects.bus_mut(bus) {
                        if bus.processor == Some(object) {
                            bus.processor = None;
                        }
                    }
                }
            }
            // streams share the content, so they keep playing
            Object::Data(_) => {}
        }
        Ok(())
    }

    // --- Rendering ---

    /// Render `frames` frames of the master bus into `out` as planar
    /// (channel-major) samples clamped to `[-1, 1]`.
    ///
    /// # Panics
    /// On any configuration error; see [`try_get_samples`](Self::try_get_samples).
    pub fn get_samples(&mut self, frames: u32, channels: u16, sample_rate: u32, out: &mut Vec<f32>) {
        if let Err(err) = self.try_get_samples(frames, channels, sample_rate, out) {
            panic!("mixer render failed: {}", err);
        }
    }

    /// Render `frames` frames of the master bus into `out`.
    ///
    /// `out` is resized to `frames * channels`; `out[ch * frames + f]` is
    /// channel `ch` of frame `f`. Without a master bus the output is silence.
    pub fn try_get_samples(
        &mut self,
        frames: u32,
        channels: u16,
        sample_rate: u32,
        out: &mut Vec<f32>,
    ) -> Result<(), MixerError> {
        out.clear();
        out.resize(frames as usize * channels as usize, 0.0);

        let Some(master) = self.master else {
            return Ok(());
        };
        self.render_bus(master, frames, channels, sample_rate)?;

        let mix = self.objects.bus(master)?.mix.as_slice();
        for (dst, &src) in out.iter_mut().zip(mix) {
            *dst = src.clamp(-1.0, 1.0);
        }
        Ok(())
    }

    fn render_bus(&mut self, handle: Handle, frames: u32, channels: u16, rate: u32) -> Result<(), MixerError> {
        let mut bus = self.objects.lend_bus(handle)?;
        let result = self.mix_inputs(&mut bus, frames, channels, rate);
        self.objects.restore_bus(handle, bus);
        result
    }

    fn mix_inputs(&mut self, bus: &mut Bus, frames: u32, channels: u16, rate: u32) -> Result<(), MixerError> {
        bus.mix.resize(channels, frames);

        for &input in &bus.input_buses {
            self.render_bus(input, frames, channels, rate)?;
            bus.mix.mix_from(&self.objects.bus(input)?.mix);
        }

        for &handle in &bus.input_streams {
            let stream = self.objects.stream_mut(handle)?;
            if !stream.is_playing() {
                continue;
            }
            let status = stream.render(frames, channels, rate)?;
            bus.mix.mix_from(&stream.out);
            if status == StreamStatus::Finished {
                self.events.send(MixerEvent::StreamFinished { stream: handle });
            }
        }

        if let Some(processor) = bus.processor {
            self.objects
                .processor_mut(processor)?
                .process(frames, channels, rate, bus.mix.as_mut_slice());
        }
        Ok(())
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new(MixerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;
    use mx_core::PcmData;
    use ringbuf::traits::Consumer;

    fn run(mixer: &mut Mixer, build: impl FnOnce(&mut CommandBuffer)) {
        let mut buffer = CommandBuffer::new();
        build(&mut buffer);
        mixer.producer().submit(buffer);
        mixer.process();
    }

    fn render(mixer: &mut Mixer, frames: u32, channels: u16) -> Vec<f32> {
        let mut out = Vec::new();
        mixer.get_samples(frames, channels, 100, &mut out);
        out
    }

    fn constant_stream(mixer: &mut Mixer, bus: Handle, value: f32) -> Handle {
        let producer = mixer.producer();
        let data = producer.allocate();
        let stream = producer.allocate();
        run(mixer, |b| {
            b.init_data(data, PcmData::from_planar(1, 100, vec![value; 64]))
                .init_stream(stream, data)
                .set_stream_output(stream, Some(bus))
                .play_stream(stream, true);
        });
        stream
    }

    #[test]
    fn no_master_renders_silence() {
        let mut mixer = Mixer::default();
        assert_eq!(render(&mut mixer, 10, 2), vec![0.0; 20]);
    }

    #[test]
    fn nested_buses_sum_into_master() {
        let mut mixer = Mixer::default();
        let p = mixer.producer();
        let (master, sub) = (p.allocate(), p.allocate());
        run(&mut mixer, |b| {
            b.init_bus(master)
                .init_bus(sub)
                .set_bus_output(sub, Some(master))
                .set_master_bus(Some(master));
        });
        constant_stream(&mut mixer, master, 0.25);
        constant_stream(&mut mixer, sub, 0.5);

        let out = render(&mut mixer, 4, 1);
        assert_eq!(out, vec![0.75; 4]);
        assert_eq!(mixer.bus(master).unwrap().input_buses(), &[sub]);
    }

    #[test]
    fn output_is_clamped() {
        let mut mixer = Mixer::default();
        let master = mixer.producer().allocate();
        run(&mut mixer, |b| {
            b.init_bus(master).set_master_bus(Some(master));
        });
        constant_stream(&mut mixer, master, 0.75);
        constant_stream(&mut mixer, master, 0.75);
        assert_eq!(render(&mut mixer, 3, 2), vec![1.0; 6]);
    }

    #[test]
    fn rewiring_bus_output_moves_the_edge() {
        let mut mixer = Mixer::default();
        let p = mixer.producer();
        let (a, b, child) = (p.allocate(), p.allocate(), p.allocate());
        run(&mut mixer, |buf| {
            buf.init_bus(a)
                .init_bus(b)
                .init_bus(child)
                .set_bus_output(child, Some(a))
                .set_bus_output(child, Some(b));
        });
        assert!(mixer.bus(a).unwrap().input_buses().is_empty());
        assert_eq!(mixer.bus(b).unwrap().input_buses(), &[child]);
        assert_eq!(mixer.bus(child).unwrap().output(), Some(b));
    }

    #[test]
    fn processor_applies_to_bus_and_can_be_disabled() {
        let mut mixer = Mixer::default();
        let p = mixer.producer();
        let (master, gain) = (p.allocate(), p.allocate());
        run(&mut mixer, |b| {
            b.init_bus(master)
                .set_master_bus(Some(master))
                .init_processor(gain, EffectKind::Gain { db: -96.0 })
                .add_processor(master, gain);
        });
        constant_stream(&mut mixer, master, 0.5);
        assert!(render(&mut mixer, 4, 1).iter().all(|s| s.abs() < 1e-4));

        run(&mut mixer, |b| {
            b.set_processor_enabled(gain, false);
        });
        assert_eq!(render(&mut mixer, 4, 1), vec![0.5; 4]);

        run(&mut mixer, |b| {
            b.set_processor_enabled(gain, true).set_processor_param(gain, 0, 0.0);
        });
        assert_eq!(render(&mut mixer, 4, 1), vec![0.5; 4]);
    }

    #[test]
    fn attaching_processor_elsewhere_detaches_it() {
        let mut mixer = Mixer::default();
        let p = mixer.producer();
        let (a, b, fx, other) = (p.allocate(), p.allocate(), p.allocate(), p.allocate());
        run(&mut mixer, |buf| {
            buf.init_bus(a)
                .init_bus(b)
                .init_processor(fx, EffectKind::Gain { db: 0.0 })
                .init_processor(other, EffectKind::Gain { db: 0.0 })
                .add_processor(a, fx)
                .add_processor(b, other)
                .add_processor(b, fx);
        });
        assert_eq!(mixer.bus(a).unwrap().processor(), None);
        assert_eq!(mixer.bus(b).unwrap().processor(), Some(fx));
        assert_eq!(mixer.processor(fx).unwrap().bus(), Some(b));
        assert_eq!(mixer.processor(other).unwrap().bus(), None);

        run(&mut mixer, |buf| {
            buf.remove_processor(b, fx);
        });
        assert_eq!(mixer.bus(b).unwrap().processor(), None);
        assert_eq!(mixer.processor(fx).unwrap().bus(), None);
    }

    #[test]
    fn delete_bus_severs_edges_and_recycles_handle() {
        let mut mixer = Mixer::default();
        let p = mixer.producer();
        let (master, middle, leaf, fx) = (p.allocate(), p.allocate(), p.allocate(), p.allocate());
        run(&mut mixer, |b| {
            b.init_bus(master)
                .init_bus(middle)
                .init_bus(leaf)
                .set_bus_output(middle, Some(master))
                .set_bus_output(leaf, Some(middle))
                .init_processor(fx, EffectKind::Gain { db: 0.0 })
                .add_processor(middle, fx)
                .set_master_bus(Some(middle));
        });
        let stream = constant_stream(&mut mixer, middle, 0.1);

        run(&mut mixer, |b| {
            b.delete_object(middle);
        });
        assert!(mixer.bus(master).unwrap().input_buses().is_empty());
        assert_eq!(mixer.bus(leaf).unwrap().output(), None);
        assert_eq!(mixer.stream(stream).unwrap().output(), None);
        assert_eq!(mixer.processor(fx).unwrap().bus(), None);
        assert_eq!(mixer.master_bus(), None);
        assert_eq!(mixer.producer().allocate(), middle);
    }

    #[test]
    fn delete_stream_and_processor_unlink_from_bus() {
        let mut mixer = Mixer::default();
        let p = mixer.producer();
        let (master, fx) = (p.allocate(), p.allocate());
        run(&mut mixer, |b| {
            b.init_bus(master)
                .set_master_bus(Some(master))
                .init_processor(fx, EffectKind::Gain { db: 0.0 })
                .add_processor(master, fx);
        });
        let stream = constant_stream(&mut mixer, master, 0.3);
        run(&mut mixer, |b| {
            b.delete_object(stream).delete_object(fx);
        });
        let bus = mixer.bus(master).unwrap();
        assert!(bus.input_streams().is_empty());
        assert_eq!(bus.processor(), None);
        assert_eq!(render(&mut mixer, 2, 1), vec![0.0; 2]);
    }

    #[test]
    fn deleting_data_keeps_streams_playing() {
        let mut mixer = Mixer::default();
        let p = mixer.producer();
        let (master, data, stream) = (p.allocate(), p.allocate(), p.allocate());
        run(&mut mixer, |b| {
            b.init_bus(master)
                .set_master_bus(Some(master))
                .init_data(data, PcmData::from_planar(1, 100, vec![0.5; 8]))
                .init_stream(stream, data)
                .set_stream_output(stream, Some(master))
                .play_stream(stream, false)
                .delete_object(data);
        });
        assert_eq!(render(&mut mixer, 4, 1), vec![0.5; 4]);
    }

    #[test]
    fn cycle_is_reported_as_busy() {
        let mut mixer = Mixer::default();
        let p = mixer.producer();
        let (a, b) = (p.allocate(), p.allocate());
        run(&mut mixer, |buf| {
            buf.init_bus(a)
                .init_bus(b)
                .set_bus_output(a, Some(b))
                .set_bus_output(b, Some(a))
                .set_master_bus(Some(a));
        });
        let mut out = Vec::new();
        let err = mixer.try_get_samples(4, 2, 100, &mut out).unwrap_err();
        assert_eq!(err, MixerError::Busy(a));
        // every lent bus went back to its slot
        assert!(mixer.bus(a).is_ok());
        assert!(mixer.bus(b).is_ok());
    }

    #[test]
    fn missing_handle_fails_try_process() {
        let mut mixer = Mixer::default();
        let ghost = Handle::new(77).unwrap();
        let mut buffer = CommandBuffer::new();
        buffer.play_stream(ghost, false);
        mixer.producer().submit(buffer);
        assert_eq!(mixer.try_process(), Err(MixerError::MissingObject(ghost)));
    }

    #[test]
    #[should_panic(expected = "mixer command failed")]
    fn process_panics_on_configuration_error() {
        let mut mixer = Mixer::default();
        let mut buffer = CommandBuffer::new();
        buffer.set_master_bus(Handle::new(3));
        mixer.producer().submit(buffer);
        mixer.process();
    }

    #[test]
    fn events_follow_stream_lifecycle() {
        let mut mixer = Mixer::default();
        let mut events = mixer.take_events().unwrap();
        assert!(mixer.take_events().is_none());

        let p = mixer.producer();
        let (master, data, stream) = (p.allocate(), p.allocate(), p.allocate());
        run(&mut mixer, |b| {
            b.init_bus(master)
                .set_master_bus(Some(master))
                .init_data(data, PcmData::from_planar(1, 100, vec![0.5; 3]))
                .init_stream(stream, data)
                .set_stream_output(stream, Some(master))
                .play_stream(stream, false);
        });
        render(&mut mixer, 4, 1);
        run(&mut mixer, |b| {
            b.stop_stream(stream, true);
        });

        let seen: Vec<MixerEvent> = std::iter::from_fn(|| events.try_pop()).collect();
        assert_eq!(
            seen,
            [
                MixerEvent::StreamStarted { stream },
                MixerEvent::StreamFinished { stream },
                MixerEvent::StreamStopped { stream },
                MixerEvent::StreamReset { stream },
            ]
        );
        assert_eq!(mixer.dropped_events(), 0);
    }
}
