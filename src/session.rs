//! One long-lived search engine process shared by every request.
//!
//! The process is started lazily, every search holds the session lock from start to finish,
//! and any fault stops the process so that the next call starts a fresh one.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::analysis::{AnalysisResult, SearchLimit};
use crate::error::{EngineError, EngineUnavailable};
use crate::movetext::Game;

/// A running engine that can be asked to search positions.
#[async_trait]
pub trait EngineProcess: Send {
    /// Search the position reached by `game` under `limit` and wait for the search to finish.
    async fn analyse(
        &mut self,
        game: &Game,
        limit: SearchLimit,
    ) -> Result<AnalysisResult, EngineError>;

    /// Ask the process to exit. Must not fail; a dead process is simply dropped.
    async fn quit(&mut self);
}

/// Knows how to start an [`EngineProcess`].
#[async_trait]
pub trait Launcher: Send + Sync {
    type Process: EngineProcess + 'static;

    async fn launch(&self) -> Result<Self::Process, EngineError>;
}

enum SessionState<P> {
    Stopped,
    Running(P),
}

/// Whether the session currently holds a live process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Stopped,
    Running,
}

pub struct EngineSession<L: Launcher> {
    launcher: L,
    state: Mutex<SessionState<L::Process>>,
}

impl<L: Launcher> EngineSession<L> {
    /// Create a stopped session. Nothing is launched until the first call.
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            state: Mutex::new(SessionState::Stopped),
        }
    }

    /// Start the process now instead of on the first search.
    pub async fn start(&self) -> Result<(), EngineUnavailable> {
        let mut state = self.state.lock().await;
        if let SessionState::Stopped = *state {
            *state = SessionState::Running(self.launch().await?);
        }
        Ok(())
    }

    /// Run one search. Concurrent callers queue on the session lock.
    ///
    /// On any fault the process is shut down and the session is left stopped.
    pub async fn analyse(
        &self,
        game: &Game,
        limit: SearchLimit,
    ) -> Result<AnalysisResult, EngineUnavailable> {
        let mut state = self.state.lock().await;

        let mut process = match std::mem::replace(&mut *state, SessionState::Stopped) {
            SessionState::Running(process) => process,
            SessionState::Stopped => self.launch().await?,
        };

        match process.analyse(game, limit).await {
            Ok(analysis) => {
                *state = SessionState::Running(process);
                Ok(analysis)
            }
            Err(why) => {
                warn!(error = %why, ?limit, "engine search failed, stopping engine");
                process.quit().await;
                Err(EngineUnavailable(why))
            }
        }
    }

    pub async fn status(&self) -> SessionStatus {
        match *self.state.lock().await {
            SessionState::Stopped => SessionStatus::Stopped,
            SessionState::Running(_) => SessionStatus::Running,
        }
    }

    /// Stop the process if one is running.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let SessionState::Running(mut process) =
            std::mem::replace(&mut *state, SessionState::Stopped)
        {
            info!("stopping engine");
            process.quit().await;
        }
    }

    async fn launch(&self) -> Result<L::Process, EngineUnavailable> {
        match self.launcher.launch().await {
            Ok(process) => {
                info!("engine started");
                Ok(process)
            }
            Err(why) => {
                warn!(error = %why, "failed to start engine");
                Err(EngineUnavailable(why))
            }
        }
    }
}
