//! A scripted in-process engine for driving sessions without a real binary.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use move_resolver::shakmaty::uci::Uci;
use move_resolver::{
    AnalysisResult, EngineError, EngineProcess, Game, Launcher, Score, SearchLimit,
};

#[derive(Default)]
pub struct Script {
    pub launches: AtomicUsize,
    pub quits: AtomicUsize,
    pub searches: AtomicUsize,
    pub fail_launch: AtomicBool,
    /// Crash during the next search only.
    pub crash_next_search: AtomicBool,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub limits: Mutex<Vec<SearchLimit>>,
    /// The UCI move list of every searched game.
    pub games: Mutex<Vec<String>>,
    pub search_delay: Mutex<Duration>,
}

#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    pub script: Arc<Script>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launches(&self) -> usize {
        self.script.launches.load(Ordering::SeqCst)
    }

    pub fn limits(&self) -> Vec<SearchLimit> {
        self.script.limits.lock().unwrap().clone()
    }

    pub fn games(&self) -> Vec<String> {
        self.script.games.lock().unwrap().clone()
    }
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    type Process = ScriptedEngine;

    async fn launch(&self) -> Result<ScriptedEngine, EngineError> {
        if self.script.fail_launch.load(Ordering::SeqCst) {
            return Err(EngineError::Terminated);
        }
        self.script.launches.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedEngine {
            script: Arc::clone(&self.script),
        })
    }
}

pub struct ScriptedEngine {
    script: Arc<Script>,
}

#[async_trait]
impl EngineProcess for ScriptedEngine {
    async fn analyse(
        &mut self,
        game: &Game,
        limit: SearchLimit,
    ) -> Result<AnalysisResult, EngineError> {
        let script = &self.script;
        let now = script.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        script.max_in_flight.fetch_max(now, Ordering::SeqCst);
        script.searches.fetch_add(1, Ordering::SeqCst);
        script.limits.lock().unwrap().push(limit);
        script.games.lock().unwrap().push(game.uci_moves());

        let delay = *script.search_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        script.in_flight.fetch_sub(1, Ordering::SeqCst);

        if script.crash_next_search.swap(false, Ordering::SeqCst) {
            return Err(EngineError::Terminated);
        }
        Ok(AnalysisResult {
            pv: vec![
                Uci::from_str("g1f3").unwrap(),
                Uci::from_str("g8f6").unwrap(),
            ],
            score: Some(Score::Cp(50)),
            depth: Some(10),
            nodes: Some(4096),
            time: Some(Duration::from_millis(250)),
        })
    }

    async fn quit(&mut self) {
        self.script.quits.fetch_add(1, Ordering::SeqCst);
    }
}
