//! Pipeline controller: owns the frame loop and the tick loop.
//!
//! The frame loop runs as fast as the sources allow and strictly in series:
//! grab a frame, wait for the detector, run the estimators, publish one
//! [`FrameSample`]. The tick loop runs on a fixed period, reads whatever
//! sample was published last and drives the stabilizer and the capture flow.
//! All capture state lives on the tick thread; the outside world only reads
//! [`ReadinessSnapshot`]s and sends the two control signals.

use crate::{
    analysis::{DebugReadout, FrameAnalyzer, FrameSample},
    capture::{CaptureEvent, CaptureFlow, CapturePhase, StillEncoder},
    config::Config,
    source::{FrameSource, LandmarkSource},
    stabilizer::StabilizedSignals,
    Error, Result,
};
use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc, Mutex, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Signals the UI may send into the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// The user confirmed they are ready to start
    ConfirmReady,
    /// Discard the session and start over
    Reset,
}

/// Events delivered to the capture consumer
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Output of the capture flow
    Capture(CaptureEvent),
    /// A source died and the pipeline stopped
    Fault(String),
}

/// Read-only view of the pipeline, refreshed every tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessSnapshot {
    /// Ticks run since start
    pub tick: u64,
    pub phase: CapturePhase,
    /// Stills captured in the current session
    pub captured: usize,
    /// Stills required for the session
    pub required: usize,
    /// Debounced readiness signals
    pub signals: StabilizedSignals,
    /// Raw estimator numbers for the latest face, if any
    pub debug: Option<DebugReadout>,
    /// Stability progress of the current step, 0-100
    pub progress: u8,
    pub show_hint: bool,
    pub guidance: Option<&'static str>,
    /// Set once a source has failed
    pub fault: Option<String>,
}

impl ReadinessSnapshot {
    fn from_flow(tick: u64, flow: &CaptureFlow, debug: Option<DebugReadout>) -> Self {
        Self {
            tick,
            phase: flow.phase(),
            captured: flow.session().captured_count(),
            required: flow.session().angles().len(),
            signals: flow.signals(),
            debug,
            progress: flow.progress_percent(),
            show_hint: flow.show_hint(),
            guidance: flow.guidance(),
            fault: None,
        }
    }
}

struct Shared {
    running: AtomicBool,
    latest: Mutex<Option<FrameSample>>,
    snapshot: RwLock<ReadinessSnapshot>,
}

impl Shared {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn publish_sample(&self, sample: FrameSample) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(sample);
    }

    fn latest_sample(&self) -> Option<FrameSample> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn publish_snapshot(&self, mut snapshot: ReadinessSnapshot) {
        let mut current = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        // A fault sticks until the pipeline is restarted
        snapshot.fault = current.fault.take();
        *current = snapshot;
    }

    fn snapshot(&self) -> ReadinessSnapshot {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn fault(&self, error: &Error, events: &Sender<PipelineEvent>) {
        log::error!("Pipeline stopped: {error}");
        self.running.store(false, Ordering::SeqCst);
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner).fault = Some(error.to_string());
        // The consumer may already be gone
        let _ = events.send(PipelineEvent::Fault(error.to_string()));
    }
}

/// Running face capture pipeline
pub struct CapturePipeline {
    shared: Arc<Shared>,
    control: Option<Sender<Control>>,
    events: Receiver<PipelineEvent>,
    frame_worker: Option<JoinHandle<()>>,
    tick_worker: Option<JoinHandle<()>>,
}

impl CapturePipeline {
    /// Validate `config` and start both loops.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a worker thread
    /// cannot be spawned
    pub fn start(
        config: &Config,
        frames: Box<dyn FrameSource>,
        landmarks: Box<dyn LandmarkSource>,
        encoder: Box<dyn StillEncoder>,
    ) -> Result<Self> {
        config.validate()?;

        let flow = CaptureFlow::new(config);
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            latest: Mutex::new(None),
            snapshot: RwLock::new(ReadinessSnapshot::from_flow(0, &flow, None)),
        });
        let (control_tx, control_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let frame_loop = FrameLoop {
            shared: Arc::clone(&shared),
            frames,
            landmarks,
            analyzer: FrameAnalyzer::new(config),
            events: event_tx.clone(),
        };
        let frame_worker = thread::Builder::new()
            .name("frame-loop".to_string())
            .spawn(move || frame_loop.run())?;

        let tick_loop = TickLoop {
            shared: Arc::clone(&shared),
            flow,
            encoder,
            control: control_rx,
            events: event_tx,
            period: config.stabilizer.tick_period(),
            tick: 0,
        };
        let tick_worker = match thread::Builder::new()
            .name("tick-loop".to_string())
            .spawn(move || tick_loop.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                shared.running.store(false, Ordering::SeqCst);
                let _ = frame_worker.join();
                return Err(e.into());
            }
        };

        log::info!(
            "Capture pipeline started, tick period {} ms",
            config.stabilizer.tick_period_ms
        );

        Ok(Self {
            shared,
            control: Some(control_tx),
            events: event_rx,
            frame_worker: Some(frame_worker),
            tick_worker: Some(tick_worker),
        })
    }

    /// The user confirmed readiness
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is no longer running
    pub fn confirm_ready(&self) -> Result<()> {
        self.send(Control::ConfirmReady)
    }

    /// Retake: discard the session and wait for a new confirmation
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is no longer running
    pub fn reset(&self) -> Result<()> {
        self.send(Control::Reset)
    }

    fn send(&self, control: Control) -> Result<()> {
        if !self.shared.is_running() {
            return Err(Error::PipelineState(format!("Cannot send {control:?}: pipeline stopped")));
        }
        self.control
            .as_ref()
            .ok_or_else(|| Error::PipelineState("Pipeline stopped".to_string()))?
            .send(control)
            .map_err(|_| Error::PipelineState(format!("Cannot send {control:?}: tick loop exited")))
    }

    /// Latest readiness snapshot
    #[must_use]
    pub fn snapshot(&self) -> ReadinessSnapshot {
        self.shared.snapshot()
    }

    /// Both loops are still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Next pending event, if any
    #[must_use]
    pub fn try_next_event(&self) -> Option<PipelineEvent> {
        self.events.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    #[must_use]
    pub fn next_event_timeout(&self, timeout: Duration) -> Option<PipelineEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Stop both loops and wait for them to exit.
    ///
    /// The frame loop finishes at most the step it is blocked in. The capture
    /// flow, with its streaks and lock, is dropped with the tick thread.
    pub fn stop(&mut self) {
        let was_running = self.shared.running.swap(false, Ordering::SeqCst);
        // Wakes the tick loop out of its wait
        self.control = None;

        for worker in [self.tick_worker.take(), self.frame_worker.take()].into_iter().flatten() {
            if worker.join().is_err() {
                log::error!("Pipeline worker panicked");
            }
        }
        self.shared.latest.lock().unwrap_or_else(PoisonError::into_inner).take();

        if was_running {
            log::info!("Capture pipeline stopped");
        }
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

struct FrameLoop {
    shared: Arc<Shared>,
    frames: Box<dyn FrameSource>,
    landmarks: Box<dyn LandmarkSource>,
    analyzer: FrameAnalyzer,
    events: Sender<PipelineEvent>,
}

impl FrameLoop {
    fn run(mut self) {
        while self.shared.is_running() {
            let frame = match self.frames.next_frame() {
                Ok(frame) => frame,
                Err(e) => return self.shared.fault(&e, &self.events),
            };
            if !self.shared.is_running() {
                break;
            }

            let detected = match self.landmarks.detect(&frame) {
                Ok(detected) => detected,
                Err(e) => return self.shared.fault(&e, &self.events),
            };
            if !self.shared.is_running() {
                break;
            }

            log::trace!(
                "Frame {}: {}",
                frame.sequence(),
                if detected.is_some() { "face" } else { "no face" }
            );
            self.shared.publish_sample(self.analyzer.analyze(frame, detected));
        }
        log::debug!("Frame loop exited");
    }
}

struct TickLoop {
    shared: Arc<Shared>,
    flow: CaptureFlow,
    encoder: Box<dyn StillEncoder>,
    control: Receiver<Control>,
    events: Sender<PipelineEvent>,
    period: Duration,
    tick: u64,
}

impl TickLoop {
    fn run(mut self) {
        let mut next_tick = Instant::now() + self.period;

        while self.shared.is_running() {
            let now = Instant::now();
            if now < next_tick {
                match self.control.recv_timeout(next_tick - now) {
                    Ok(control) => {
                        self.apply(control);
                        continue;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            if !self.shared.is_running() {
                break;
            }

            // Skip missed ticks rather than bursting to catch up
            next_tick += self.period;
            let now = Instant::now();
            if next_tick < now {
                next_tick = now + self.period;
            }

            self.tick();
        }
        log::debug!("Tick loop exited after {} ticks", self.tick);
    }

    fn apply(&mut self, control: Control) {
        match control {
            Control::ConfirmReady => self.flow.confirm_ready(),
            Control::Reset => self.flow.reset(),
        }
        let debug = self.shared.latest_sample().and_then(|s| s.debug_readout());
        self.shared
            .publish_snapshot(ReadinessSnapshot::from_flow(self.tick, &self.flow, debug));
    }

    fn tick(&mut self) {
        self.tick += 1;
        let sample = self.shared.latest_sample();
        let events = self.flow.tick(sample.as_ref(), self.encoder.as_mut());

        let debug = sample.as_ref().and_then(FrameSample::debug_readout);
        let snapshot = ReadinessSnapshot::from_flow(self.tick, &self.flow, debug);
        log::trace!("Tick {}: {:?} {:?}", self.tick, snapshot.phase, snapshot.signals);
        self.shared.publish_snapshot(snapshot);

        for event in events {
            let _ = self.events.send(PipelineEvent::Capture(event));
        }
    }
}
