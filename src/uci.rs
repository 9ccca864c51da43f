//! External engine process speaking UCI over stdin/stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use shakmaty::uci::Uci;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisResult, Score, SearchLimit};
use crate::error::EngineError;
use crate::movetext::Game;
use crate::session::{EngineProcess, Launcher};

/// How long `quit` waits for the process to exit on its own before killing it.
pub const QUIT_GRACE: Duration = Duration::from_secs(2);

/// Starts UCI engines from a binary on disk.
#[derive(Debug, Clone)]
pub struct UciLauncher {
    program: PathBuf,
    args: Vec<String>,
    options: Vec<(String, String)>,
}

impl UciLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// UCI options sent with `setoption` right after the handshake.
    pub fn with_options(mut self, options: Vec<(String, String)>) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl Launcher for UciLauncher {
    type Process = UciEngine;

    async fn launch(&self) -> Result<UciEngine, EngineError> {
        info!(program = %self.program.display(), "launching engine");
        UciEngine::spawn(&self.program, &self.args, &self.options).await
    }
}

pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl UciEngine {
    /// Spawn the process and complete the UCI handshake.
    pub async fn spawn(
        program: &Path,
        args: &[String],
        options: &[(String, String)],
    ) -> Result<Self, EngineError> {
        let mut process = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: program.to_path_buf(),
                source,
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;
        for (name, value) in options {
            engine
                .send(&format!("setoption name {name} value {value}"))
                .await?;
        }
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "engine <");
        self.stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line).await? == 0 {
            return Err(EngineError::Terminated);
        }
        let line = line.trim().to_string();
        debug!(line = %line, "engine >");
        Ok(line)
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        while self.read_line().await? != expected {}
        Ok(())
    }

    /// Search the position reached by `game` and collect the `info` output up to `bestmove`.
    pub async fn go(
        &mut self,
        game: &Game,
        limit: SearchLimit,
    ) -> Result<AnalysisResult, EngineError> {
        self.send(&position_command(game)).await?;
        self.send(&go_command(limit)).await?;

        let mut analysis = AnalysisResult::default();
        loop {
            let line = self.read_line().await?;
            if line.starts_with("bestmove") {
                return Ok(analysis);
            }
            if line.starts_with("info") {
                merge_info(&mut analysis, &line);
            }
        }
    }
}

#[async_trait]
impl EngineProcess for UciEngine {
    async fn analyse(
        &mut self,
        game: &Game,
        limit: SearchLimit,
    ) -> Result<AnalysisResult, EngineError> {
        self.go(game, limit).await
    }

    async fn quit(&mut self) {
        let _ = self.send("quit").await;
        if tokio::time::timeout(QUIT_GRACE, self.process.wait()).await.is_err() {
            warn!("engine ignored quit, killing it");
            let _ = self.process.kill().await;
        }
    }
}

/// Send the game as its move list so the engine sees the history, not just the board.
fn position_command(game: &Game) -> String {
    if game.moves.is_empty() {
        "position startpos".to_string()
    } else {
        format!("position startpos moves {}", game.uci_moves())
    }
}

fn go_command(limit: SearchLimit) -> String {
    match limit {
        SearchLimit::Time(time) => format!("go movetime {}", time.as_millis()),
        SearchLimit::Depth(depth) => format!("go depth {depth}"),
    }
}

/// Fold one `info` line into the running analysis; later lines overwrite earlier values.
fn merge_info(analysis: &mut AnalysisResult, line: &str) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    // Free-text lines can contain anything, including keywords.
    if tokens.get(1) == Some(&"string") {
        return;
    }
    let value = |i: usize| tokens.get(i + 1).copied();

    let mut i = 1;
    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                if let Some(depth) = value(i).and_then(|v| v.parse().ok()) {
                    analysis.depth = Some(depth);
                }
                i += 2;
            }
            "nodes" => {
                if let Some(nodes) = value(i).and_then(|v| v.parse().ok()) {
                    analysis.nodes = Some(nodes);
                }
                i += 2;
            }
            "time" => {
                if let Some(ms) = value(i).and_then(|v| v.parse().ok()) {
                    analysis.time = Some(Duration::from_millis(ms));
                }
                i += 2;
            }
            "score" => {
                let score = match (value(i), tokens.get(i + 2)) {
                    (Some("cp"), Some(v)) => v.parse().ok().map(Score::Cp),
                    (Some("mate"), Some(v)) => v.parse().ok().map(Score::Mate),
                    _ => None,
                };
                if score.is_some() {
                    analysis.score = score;
                }
                i += 3;
            }
            "pv" => {
                analysis.pv = tokens[i + 1..]
                    .iter()
                    .map_while(|t| Uci::from_str(t).ok())
                    .collect();
                return;
            }
            _ => i += 1,
        }
    }
}
