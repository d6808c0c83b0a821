use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info, warn};
use uci::{EngineInput, Encoder, SearchLine};

use crate::dispatcher::{ActiveSearch, Dispatcher, EngineCommand};
use crate::reader::OutputReader;
use crate::watchdog::Watchdog;
use crate::{EngineError, EngineProcess, EngineSettings, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Ready,
    Searching,
    Stopped,
}

/// Receives everything a session reports. Called from the session's worker threads.
pub trait EngineListener: Send + Sync {
    /// `line` is `None` when the engine answered but no variation matched its bestmove.
    fn on_search_result(&self, notation: &str, line: Option<&SearchLine>);

    /// Raised at most once per session, never while it is stopping.
    fn on_engine_fatal(&self, error: &EngineError);
}

/// State shared by the session and its workers.
pub(crate) struct Shared {
    writer: Mutex<Box<dyn Write + Send>>,
    state: Mutex<SessionState>,
    stopping: AtomicBool,
    fatal_raised: AtomicBool,
    quit_written: AtomicBool,
    listeners: Vec<Arc<dyn EngineListener>>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    fn new(writer: Box<dyn Write + Send>, listeners: Vec<Arc<dyn EngineListener>>) -> Self {
        Self {
            writer: Mutex::new(writer),
            state: Mutex::new(SessionState::Starting),
            stopping: AtomicBool::new(false),
            fatal_raised: AtomicBool::new(false),
            quit_written: AtomicBool::new(false),
            listeners,
        }
    }

    /// Writes one command line. All engine input goes through here.
    pub(crate) fn send(&self, command: &EngineInput) -> Result<(), EngineError> {
        let line = Encoder {}.encode(command);
        let mut writer = lock(&self.writer);
        debug!("Input: {:?}", line);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        if matches!(command, EngineInput::Quit) {
            self.quit_written.store(true, Ordering::Release);
        }
        Ok(())
    }

    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    pub(crate) fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        let mut current = lock(&self.state);
        if *current != SessionState::Stopped {
            *current = state;
        }
    }

    pub(crate) fn publish(&self, notation: &str, line: Option<&SearchLine>) {
        for listener in &self.listeners {
            listener.on_search_result(notation, line);
        }
    }

    pub(crate) fn raise_fatal(&self, error: EngineError) {
        if self.is_stopping() {
            debug!("Ignoring engine failure while stopping: {}", error);
            return;
        }
        if self.fatal_raised.swap(true, Ordering::AcqRel) {
            debug!("Engine failure already reported: {}", error);
            return;
        }

        error!("Engine fatal: {}", error);
        for listener in &self.listeners {
            listener.on_engine_fatal(&error);
        }
    }
}

/// One engine process and the workers that drive it.
pub struct EngineSession {
    settings: EngineSettings,
    shared: Arc<Shared>,
    commands: Sender<EngineCommand>,
    pending: Option<(Receiver<EngineCommand>, Box<dyn BufRead + Send>)>,
    process: Option<EngineProcess>,
    shutdown_tx: Option<Sender<()>>,
    shutdown_rx: Receiver<()>,
    dispatcher: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
    watchdogs: Vec<JoinHandle<()>>,
}

impl EngineSession {
    /// Spawns the engine process and starts the session.
    pub fn spawn(
        settings: EngineSettings,
        listeners: Vec<Arc<dyn EngineListener>>,
    ) -> Result<Self, EngineError> {
        let transport = Transport::spawn(&settings.path, &settings.args)?;
        let mut session = Self::with_transport(settings, transport, listeners);
        session.start()?;
        Ok(session)
    }

    /// A session over existing streams. Nothing is written until [`start`](Self::start).
    pub fn with_transport(
        settings: EngineSettings,
        transport: Transport,
        listeners: Vec<Arc<dyn EngineListener>>,
    ) -> Self {
        let (commands, command_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded(0);

        Self {
            settings,
            shared: Arc::new(Shared::new(transport.input, listeners)),
            commands,
            pending: Some((command_rx, transport.output)),
            process: transport.process,
            shutdown_tx: Some(shutdown_tx),
            shutdown_rx,
            dispatcher: None,
            reader: None,
            watchdogs: Vec::new(),
        }
    }

    /// Sends the handshake and starts the reader and dispatcher.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let Some((command_rx, output)) = self.pending.take() else {
            return Err(EngineError::AlreadyStarted);
        };

        self.shared.send(&EngineInput::Uci)?;
        for (name, value) in &self.settings.options {
            self.shared.send(&EngineInput::SetOption {
                name: name.clone(),
                value: value.clone(),
            })?;
        }
        if self.settings.line_count > 1 {
            self.shared.send(&multi_pv(self.settings.line_count))?;
        }

        // The active position slot holds at most one search awaiting its bestmove
        let (slot_tx, slot_rx) = bounded::<ActiveSearch>(1);

        let reader = OutputReader::new(
            Arc::clone(&self.shared),
            output,
            slot_rx,
            self.settings.options.clone(),
        );
        self.reader = Some(
            thread::Builder::new()
                .name("engine-reader".to_string())
                .spawn(move || reader.run())?,
        );

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.shared),
            command_rx,
            slot_tx,
            self.shutdown_rx.clone(),
            self.settings.move_time,
            self.settings.settle_delay,
        );
        self.dispatcher = Some(
            thread::Builder::new()
                .name("engine-dispatcher".to_string())
                .spawn(move || dispatcher.run())?,
        );

        info!("Engine session started");
        Ok(())
    }

    /// Queues a search of `notation`. Back-to-back submissions collapse to the latest.
    pub fn submit_position(&mut self, notation: &str) {
        if self.shared.is_stopping() {
            warn!("Engine is stopping, ignoring position {}", notation);
            return;
        }

        let (ack_tx, ack_rx) = bounded(1);
        let command = EngineCommand::SetPosition {
            notation: notation.to_string(),
            ack: ack_tx,
        };
        if self.commands.send(command).is_err() {
            warn!("Engine dispatcher is gone, dropping position {}", notation);
            return;
        }

        let watchdog = Watchdog::new(
            Arc::clone(&self.shared),
            notation.to_string(),
            ack_rx,
            self.shutdown_rx.clone(),
            self.settings.watchdog_deadline,
        );
        self.watchdogs.retain(|handle| !handle.is_finished());
        match thread::Builder::new()
            .name("engine-watchdog".to_string())
            .spawn(move || watchdog.run())
        {
            Ok(handle) => self.watchdogs.push(handle),
            Err(e) => warn!("Failed to start watchdog for {}: {}", notation, e),
        }
    }

    pub fn set_time_budget(&mut self, move_time: Duration) {
        self.settings.move_time = move_time;
        if self.commands.send(EngineCommand::SetTimeBudget(move_time)).is_err() {
            warn!("Engine dispatcher is gone, dropping move time {:?}", move_time);
        }
    }

    pub fn set_line_count(&mut self, count: u8) {
        self.settings.line_count = count;
        if self.commands.send(EngineCommand::SetLineCount(count)).is_err() {
            warn!("Engine dispatcher is gone, dropping line count {}", count);
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Quits the engine and joins every worker. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.shared.stopping.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Stopping engine session");

        let _ = self.commands.send(EngineCommand::Quit);
        // Releases a dispatcher blocked on the handoff and every waiting watchdog
        self.shutdown_tx.take();

        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }
        if !self.shared.quit_written.load(Ordering::Acquire) {
            let _ = self.shared.send(&EngineInput::Stop);
            let _ = self.shared.send(&EngineInput::Quit);
        }

        if let Some(mut process) = self.process.take() {
            process.terminate();
        }
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        for handle in self.watchdogs.drain(..) {
            let _ = handle.join();
        }

        self.shared.set_state(SessionState::Stopped);
        info!("Engine session stopped");
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.stop();
    }
}

pub(crate) fn multi_pv(count: u8) -> EngineInput {
    EngineInput::SetOption {
        name: "MultiPV".to_string(),
        value: count.to_string(),
    }
}
