pub mod analysis;
pub mod book;
pub mod chess_serde;
pub mod config;
pub mod error;
pub mod movetext;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod server_types;
pub mod session;
pub mod translate;
pub mod uci;

pub use analysis::{AnalysisResult, Evaluation, Score, SearchLimit};
pub use book::{MatchMode, OpeningBook};
pub use error::{EngineError, EngineUnavailable, RequestError};
pub use movetext::Game;
pub use pipeline::Resolver;
pub use server_types::{MoveRequest, ResolvedMove};
pub use session::{EngineProcess, EngineSession, Launcher, SessionStatus};
pub use uci::UciLauncher;

pub use shakmaty;
