//! Opening book: recorded game lines and continuation lookup.
//!
//! The corpus is a text file with one game per line, each line a space-separated list of
//! UCI moves from the standard starting position. It is parsed once; every lookup then picks
//! uniformly at random among all continuations the matching lines offer.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use rand::{seq::SliceRandom, Rng};
use shakmaty::{uci::Uci, Chess, Move, Position};
use tracing::{debug, warn};

use crate::error::{BookError, ConfigError};
use crate::movetext;

/// How a request's movetext is matched against book lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Replay the request and require the line to start with exactly those moves.
    #[default]
    Structural,
    /// Look for the request text anywhere inside the line's rendered movetext.
    ///
    /// Permissive: a prefix that happens to occur later in an unrelated line matches too.
    Textual,
}

impl FromStr for MatchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structural" => Ok(MatchMode::Structural),
            "textual" => Ok(MatchMode::Textual),
            _ => Err(ConfigError::InvalidValue {
                key: "BOOK_MATCH",
                value: s.to_string(),
            }),
        }
    }
}

/// One recorded game.
#[derive(Debug, Clone)]
pub struct BookLine {
    moves: Vec<Move>,
    sans: Vec<String>,
    movetext: String,
}

impl BookLine {
    /// Parse a line of UCI moves. `line_no` is only used for error reporting.
    pub fn from_uci(line: &str, line_no: usize) -> Result<Self, BookError> {
        let mut pos = Chess::default();
        let mut moves = Vec::new();
        for token in line.split_whitespace() {
            let uci = Uci::from_str(token).map_err(|_| BookError::InvalidUci {
                line: line_no,
                token: token.to_string(),
            })?;
            let m = uci.to_move(&pos).map_err(|_| BookError::IllegalMove {
                line: line_no,
                token: token.to_string(),
            })?;
            pos.play_unchecked(&m);
            moves.push(m);
        }
        let sans = movetext::render_san(&moves);
        let movetext = movetext::numbered(&sans);
        Ok(Self {
            moves,
            sans,
            movetext,
        })
    }

    /// The line rendered as numbered movetext, e.g. `1. e4 e5 2. Nf3`.
    pub fn movetext(&self) -> &str {
        &self.movetext
    }

    fn first_move(&self) -> Option<&str> {
        self.sans.first().map(String::as_str)
    }

    fn textual_continuation(&self, prefix: &str) -> Option<&str> {
        let (_, after) = self.movetext.rsplit_once(prefix)?;
        let mut tokens = after.split_whitespace();
        let next = tokens.next()?;
        // A leading move number means the prefix ended on Black's move.
        if next.starts_with(|c: char| c.is_ascii_digit()) {
            tokens.next()
        } else {
            Some(next)
        }
    }

    fn structural_continuation(&self, prefix: &[Move]) -> Option<&str> {
        if !self.moves.starts_with(prefix) {
            return None;
        }
        self.sans.get(prefix.len()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    lines: Vec<BookLine>,
    mode: MatchMode,
}

impl OpeningBook {
    pub fn empty(mode: MatchMode) -> Self {
        Self {
            lines: Vec::new(),
            mode,
        }
    }

    /// Read and parse a corpus file.
    pub fn load<P: AsRef<Path>>(path: P, mode: MatchMode) -> Result<Self, BookError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| BookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_corpus(&text, mode))
    }

    /// Parse corpus text. Malformed lines are logged and left out.
    pub fn from_corpus(text: &str, mode: MatchMode) -> Self {
        let mut lines = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match BookLine::from_uci(line, idx + 1) {
                Ok(book_line) => lines.push(book_line),
                Err(why) => warn!(error = %why, "skipping book line"),
            }
        }
        Self { lines, mode }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn lines(&self) -> &[BookLine] {
        &self.lines
    }

    /// Every continuation offered by a line matching `prefix`, one entry per line.
    ///
    /// A prefix without any moves (empty, or only tag pairs) means the game has not started:
    /// each line offers its first move.
    pub fn continuations(&self, prefix: &str) -> Vec<&str> {
        let tokens = movetext::san_tokens(prefix);
        if tokens.is_empty() {
            return self.lines.iter().filter_map(BookLine::first_move).collect();
        }
        match self.mode {
            MatchMode::Textual => {
                let prefix = prefix.trim();
                self.lines
                    .iter()
                    .filter_map(|line| line.textual_continuation(prefix))
                    .collect()
            }
            MatchMode::Structural => {
                let Ok(played) = movetext::replay(&tokens) else {
                    return Vec::new();
                };
                self.lines
                    .iter()
                    .filter_map(|line| line.structural_continuation(&played.moves))
                    .collect()
            }
        }
    }

    /// Pick a continuation for `prefix` uniformly at random, or `None` if no line matches.
    pub fn pick<R: Rng + ?Sized>(&self, prefix: &str, rng: &mut R) -> Option<String> {
        let candidates = self.continuations(prefix);
        let chosen = candidates.choose(rng).map(|m| m.to_string());
        debug!(candidates = candidates.len(), chosen = ?chosen, "book lookup");
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const CORPUS: &str = "\
e2e4 e7e5 g1f3 b8c6 f1b5
e2e4 c7c5 g1f3 d7d6
d2d4 d7d5 c2c4
e2e4 e7e5 g1f3 g8f6
";

    fn book(mode: MatchMode) -> OpeningBook {
        OpeningBook::from_corpus(CORPUS, mode)
    }

    #[test]
    fn test_lines_render_as_movetext() {
        let book = book(MatchMode::Structural);
        assert_eq!(book.len(), 4);
        assert_eq!(book.lines()[0].movetext(), "1. e4 e5 2. Nf3 Nc6 3. Bb5");
        assert_eq!(book.lines()[2].movetext(), "1. d4 d5 2. c4");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let book = OpeningBook::from_corpus("e2e4 e7e5\nzz99\ne2e5\n\nd2d4\n", MatchMode::Textual);
        assert_eq!(book.len(), 2);
        assert!(OpeningBook::from_corpus("zz99\n", MatchMode::Textual).is_empty());
    }

    #[test]
    fn test_empty_prefix_offers_first_moves() {
        for mode in [MatchMode::Structural, MatchMode::Textual] {
            let book = book(mode);
            let mut candidates = book.continuations("");
            candidates.sort();
            assert_eq!(candidates, vec!["d4", "e4", "e4", "e4"]);
        }
    }

    #[test]
    fn test_tags_without_moves_offer_first_moves() {
        let pgn = "[Event \"Casual\"]\n[White \"a\"]\n\n*";
        for mode in [MatchMode::Structural, MatchMode::Textual] {
            let book = book(mode);
            let mut candidates = book.continuations(pgn);
            candidates.sort();
            assert_eq!(candidates, vec!["d4", "e4", "e4", "e4"]);
        }
    }

    #[test]
    fn test_empty_prefix_pick_returns_a_first_move() {
        let book = book(MatchMode::Structural);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let chosen = book.pick("", &mut rng).unwrap();
            assert!(chosen == "e4" || chosen == "d4", "unexpected {chosen}");
        }
    }

    #[test]
    fn test_structural_continuations() {
        let book = book(MatchMode::Structural);
        let mut after_e4 = book.continuations("1. e4");
        after_e4.sort();
        assert_eq!(after_e4, vec!["c5", "e5", "e5"]);

        let mut after_nf3 = book.continuations("1. e4 e5 2. Nf3");
        after_nf3.sort();
        assert_eq!(after_nf3, vec!["Nc6", "Nf6"]);

        assert!(book.continuations("1. c4").is_empty());
        assert!(book.continuations("1. d4 d5 2. c4").is_empty());
    }

    #[test]
    fn test_textual_skips_move_numbers() {
        let book = book(MatchMode::Textual);
        let mut after_e5 = book.continuations("1. e4 e5");
        after_e5.sort();
        assert_eq!(after_e5, vec!["Nf3", "Nf3"]);

        let mut after_e4 = book.continuations("1. e4");
        after_e4.sort();
        assert_eq!(after_e4, vec!["c5", "e5", "e5"]);
    }

    #[test]
    fn test_textual_matches_inside_lines() {
        // "Nf3" occurs mid-line in three games; the structural mode would reject it.
        let book = book(MatchMode::Textual);
        let mut candidates = book.continuations("Nf3");
        candidates.sort();
        assert_eq!(candidates, vec!["Nc6", "Nf6", "d6"]);
        assert!(OpeningBook::from_corpus(CORPUS, MatchMode::Structural)
            .continuations("Nf3")
            .is_empty());
    }

    #[test]
    fn test_pick_only_returns_extracted_continuations() {
        let book = book(MatchMode::Structural);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = Vec::new();
        for _ in 0..64 {
            let chosen = book.pick("1. e4 e5 2. Nf3", &mut rng).unwrap();
            assert!(chosen == "Nc6" || chosen == "Nf6");
            seen.push(chosen);
        }
        assert!(seen.iter().any(|m| m == "Nc6"));
        assert!(seen.iter().any(|m| m == "Nf6"));
    }

    #[test]
    fn test_pick_miss() {
        let book = book(MatchMode::Structural);
        assert_eq!(book.pick("1. h4", &mut StdRng::seed_from_u64(1)), None);
        assert_eq!(
            OpeningBook::empty(MatchMode::Textual).pick("", &mut StdRng::seed_from_u64(1)),
            None
        );
    }

    #[test]
    fn test_match_mode_from_str() {
        assert_eq!("Textual".parse::<MatchMode>().unwrap(), MatchMode::Textual);
        assert_eq!("structural".parse::<MatchMode>().unwrap(), MatchMode::Structural);
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }
}
