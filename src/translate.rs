use shakmaty::{CastlingMode, Chess, Position};
use tracing::debug;

use crate::analysis::{AnalysisResult, Evaluation};
use crate::server_types::ResolvedMove;

/// Turn raw engine output for `board` into the client-facing result.
///
/// `None`, or an analysis missing any statistic or carrying an unplayable best move, gives
/// the no-analysis fallback with the board unchanged. `board` itself is never modified.
pub fn translate(board: &Chess, raw: Option<&AnalysisResult>) -> ResolvedMove {
    raw.and_then(|raw| analysed(board, raw))
        .unwrap_or_else(|| ResolvedMove::no_analysis(board.clone()))
}

fn analysed(board: &Chess, raw: &AnalysisResult) -> Option<ResolvedMove> {
    let best = raw.pv.first()?;
    let score = raw.score?;
    let (depth, nodes, time) = (raw.depth?, raw.nodes?, raw.time?);

    let Ok(m) = best.to_move(board) else {
        debug!(best_move = %best, "engine best move is not legal here");
        return None;
    };
    let mut after = board.clone();
    after.play_unchecked(&m);

    Some(ResolvedMove::Analysed {
        fen: after,
        best_move: m.to_uci(CastlingMode::Standard),
        score: Evaluation::after_best_move(score),
        depth,
        pv: raw.pv.clone(),
        nodes,
        time,
    })
}
