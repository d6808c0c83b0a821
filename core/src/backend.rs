use std::sync::Arc;
use std::time::Duration;

use engine::{EngineError, EngineListener, EngineSession, EngineSettings};
use thiserror::Error;

/// What the helper needs from a running engine.
pub trait SearchBackend: Send {
    fn submit_position(&mut self, notation: &str);
    fn set_time_budget(&mut self, move_time: Duration);
    fn set_line_count(&mut self, count: u8);
    fn shutdown(&mut self);
}

/// Starts a fresh backend, at startup and after every fatal error.
pub trait BackendLauncher: Send {
    fn launch(
        &mut self,
        listener: Arc<dyn EngineListener>,
    ) -> Result<Box<dyn SearchBackend>, EngineError>;
}

#[derive(Debug, Error)]
pub enum EngineFault {
    #[error("Engine could not be restarted after {attempts} attempts")]
    RestartExhausted { attempts: u32 },
}

impl SearchBackend for EngineSession {
    fn submit_position(&mut self, notation: &str) {
        EngineSession::submit_position(self, notation);
    }

    fn set_time_budget(&mut self, move_time: Duration) {
        EngineSession::set_time_budget(self, move_time);
    }

    fn set_line_count(&mut self, count: u8) {
        EngineSession::set_line_count(self, count);
    }

    fn shutdown(&mut self) {
        self.stop();
    }
}

/// Spawns engine processes from fixed settings.
pub struct EngineLauncher {
    settings: EngineSettings,
}

impl EngineLauncher {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }
}

impl BackendLauncher for EngineLauncher {
    fn launch(
        &mut self,
        listener: Arc<dyn EngineListener>,
    ) -> Result<Box<dyn SearchBackend>, EngineError> {
        let session = EngineSession::spawn(self.settings.clone(), vec![listener])?;
        Ok(Box::new(session))
    }
}
