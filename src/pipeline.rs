//! Book first, engine second.

use std::sync::Arc;

use tracing::{debug, info};

use crate::book::OpeningBook;
use crate::movetext;
use crate::server_types::{MoveRequest, ResolvedMove, ServiceInfo};
use crate::session::{EngineSession, Launcher};
use crate::translate::translate;

pub struct Resolver<L: Launcher> {
    book: OpeningBook,
    session: Arc<EngineSession<L>>,
}

impl<L: Launcher> Resolver<L> {
    pub fn new(book: OpeningBook, session: Arc<EngineSession<L>>) -> Self {
        Self { book, session }
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            id: env!("CARGO_PKG_NAME").to_string(),
            description: "Answers with an opening book move when one is known, otherwise \
                          with the engine's best move."
                .to_string(),
            book_lines: self.book.len(),
        }
    }

    /// Resolve the best move for the game in `request`.
    ///
    /// Never fails. Movetext is replayed up to its first unusable move, unreadable limits
    /// are dropped, and an unavailable engine gives the no-analysis fallback.
    pub async fn resolve(&self, request: &MoveRequest) -> ResolvedMove {
        let book_move = {
            let mut rng = rand::thread_rng();
            self.book.pick(&request.position, &mut rng)
        };
        if let Some(best_move) = book_move {
            info!(best_move = %best_move, "book move");
            return ResolvedMove::book(best_move);
        }

        let game = movetext::game_prefix(&request.position);
        let Some(limit) = request.search_limit() else {
            debug!("no search limit requested");
            return translate(&game.board, None);
        };

        let analysis = self.session.analyse(&game, limit).await.ok();
        translate(&game.board, analysis.as_ref())
    }
}
