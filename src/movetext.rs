//! Lightweight movetext handling: pulling SAN out of PGN-ish text, replaying it, and
//! rendering move lists back into numbered movetext.

use std::fmt::Write;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use shakmaty::{san::SanPlus, CastlingMode, Chess, Move, Position};
use tracing::warn;

use crate::error::MovetextError;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid regex"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?")
        .expect("valid regex")
});

/// Extract the mainline SAN tokens, dropping tag pairs, comments, variations, move numbers
/// and results.
pub fn san_tokens(movetext: &str) -> Vec<String> {
    let no_headers = HEADER_RE.replace_all(movetext, " ");
    let no_comments = COMMENT_RE.replace_all(&no_headers, " ");
    let no_variations = VARIATION_RE.replace_all(&no_comments, " ");

    MOVE_RE
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A game replayed from the standard starting position.
#[derive(Debug, Clone, Default)]
pub struct Game {
    /// The position after the last move.
    pub board: Chess,
    /// Every move played, in order.
    pub moves: Vec<Move>,
}

impl Game {
    /// The moves in UCI notation, space-separated.
    pub fn uci_moves(&self) -> String {
        self.moves
            .iter()
            .map(|m| m.to_uci(CastlingMode::Standard).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Replay as many SAN tokens as are legal.
///
/// Stops at the first token that is not valid SAN or not legal in the reached position and
/// reports it alongside the game played so far.
pub fn replay_prefix<S: AsRef<str>>(tokens: &[S]) -> (Game, Option<MovetextError>) {
    let mut game = Game {
        board: Chess::default(),
        moves: Vec::with_capacity(tokens.len()),
    };
    for (ply, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        let Ok(san) = SanPlus::from_str(token) else {
            let error = MovetextError::InvalidSan {
                ply: ply + 1,
                token: token.to_string(),
            };
            return (game, Some(error));
        };
        let Ok(m) = san.san.to_move(&game.board) else {
            let error = MovetextError::IllegalMove {
                ply: ply + 1,
                token: token.to_string(),
            };
            return (game, Some(error));
        };
        game.board.play_unchecked(&m);
        game.moves.push(m);
    }
    (game, None)
}

/// Replay SAN tokens from the standard starting position, failing on the first bad token.
pub fn replay<S: AsRef<str>>(tokens: &[S]) -> Result<Game, MovetextError> {
    match replay_prefix(tokens) {
        (game, None) => Ok(game),
        (_, Some(error)) => Err(error),
    }
}

/// Parse a movetext string and replay its legal prefix, dropping everything from the first
/// bad move on.
pub fn game_prefix(movetext: &str) -> Game {
    let (game, error) = replay_prefix(&san_tokens(movetext));
    if let Some(error) = error {
        warn!(%error, kept = game.moves.len(), "ignoring rest of movetext");
    }
    game
}

/// Render moves played from the starting position as SAN, one entry per ply.
///
/// The moves must be legal in sequence.
pub fn render_san(moves: &[Move]) -> Vec<String> {
    let mut pos = Chess::default();
    moves
        .iter()
        .map(|m| SanPlus::from_move_and_play_unchecked(&mut pos, m).to_string())
        .collect()
}

/// Join SAN moves into numbered movetext, e.g. `1. e4 e5 2. Nf3`.
pub fn numbered<S: AsRef<str>>(sans: &[S]) -> String {
    let mut out = String::new();
    for (ply, san) in sans.iter().enumerate() {
        if ply % 2 == 0 {
            if ply > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{}. ", ply / 2 + 1);
        } else {
            out.push(' ');
        }
        out.push_str(san.as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;
    use shakmaty::EnPassantMode;

    fn position_after(movetext: &str) -> Result<Game, MovetextError> {
        replay(&san_tokens(movetext))
    }

    #[test]
    fn test_san_tokens_plain() {
        assert_eq!(san_tokens("1. e4 e5 2. Nf3 Nc6"), vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn test_san_tokens_skips_headers_comments_and_results() {
        let pgn = r#"[Event "Casual"]
[White "a"]

1. e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3 O-O 1-0"#;
        assert_eq!(san_tokens(pgn), vec!["e4", "e5", "Nf3", "O-O"]);
    }

    #[test]
    fn test_san_tokens_empty() {
        assert!(san_tokens("").is_empty());
        assert!(san_tokens("   ").is_empty());
    }

    #[test]
    fn test_replay_reaches_position() {
        let game = position_after("1. e4 e5 2. Nf3").unwrap();
        assert_eq!(game.moves.len(), 3);
        assert_eq!(game.uci_moves(), "e2e4 e7e5 g1f3");
        let fen = Fen::from_position(game.board, EnPassantMode::Legal).to_string();
        assert_eq!(
            fen,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
    }

    #[test]
    fn test_replay_rejects_illegal_move() {
        let err = position_after("1. e4 e4").unwrap_err();
        assert_eq!(
            err,
            MovetextError::IllegalMove {
                ply: 2,
                token: "e4".to_string()
            }
        );
    }

    #[test]
    fn test_render_and_number() {
        let game = position_after("1. e4 e5 2. Nf3 Nc6 3. Bb5").unwrap();
        let sans = render_san(&game.moves);
        assert_eq!(numbered(&sans), "1. e4 e5 2. Nf3 Nc6 3. Bb5");
    }

    #[test]
    fn test_render_keeps_check_suffix() {
        let game = position_after("1. e4 f5 2. Qh5+").unwrap();
        assert_eq!(render_san(&game.moves), vec!["e4", "f5", "Qh5+"]);
    }

    #[test]
    fn test_game_prefix_keeps_legal_moves() {
        let game = game_prefix("1. d4 d5 2. Ke3 Nf6");
        assert_eq!(game.uci_moves(), "d2d4 d7d5");
        assert_eq!(
            Fen::from_position(game.board, EnPassantMode::Legal).to_string(),
            "rnbqkbnr/ppp1pppp/8/3p4/3P4/8/PPP1PPPP/RNBQKBNR w KQkq - 0 2"
        );
        assert!(game_prefix("1. Ke2").moves.is_empty());
    }

    #[test]
    fn test_replay_prefix_reports_first_bad_ply() {
        let (game, error) = replay_prefix(&["e4", "e5", "Ke3"][..]);
        assert_eq!(game.moves.len(), 2);
        assert_eq!(
            error,
            Some(MovetextError::IllegalMove {
                ply: 3,
                token: "Ke3".to_string()
            })
        );
    }

    #[test]
    fn test_castling_sent_as_king_move() {
        let game = position_after("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O").unwrap();
        assert!(game.uci_moves().ends_with("e1g1"));
    }
}
