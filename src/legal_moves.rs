use std::collections::HashMap;

use crate::moves::Move;
use crate::square::Square;

/// Legal moves of the current position grouped by origin square.
///
/// Always rebuilt from scratch: a rebuild drops every entry of the
/// previous position before the new moves go in.
#[derive(Debug, Default, Clone)]
pub struct LegalMoves {
    by_origin: HashMap<Square, Vec<Move>>,
}

impl LegalMoves {
    pub fn new() -> LegalMoves {
        LegalMoves::default()
    }

    pub fn rebuild(&mut self, moves: impl IntoIterator<Item = Move>) {
        self.by_origin.clear();

        for m in moves {
            let entry = self.by_origin.entry(m.from).or_default();
            if !entry.contains(&m) {
                entry.push(m);
            }
        }
    }

    pub fn clear(&mut self) {
        self.by_origin.clear();
    }

    /// Exact membership, promotion piece included.
    pub fn contains(&self, m: &Move) -> bool {
        self.by_origin.get(&m.from).is_some_and(|moves| moves.contains(m))
    }

    pub fn moves_from(&self, origin: Square) -> &[Move] {
        self.by_origin.get(&origin).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct destinations reachable from `origin`.
    pub fn destinations(&self, origin: Square) -> Vec<Square> {
        let mut out: Vec<Square> = self.moves_from(origin).iter().map(|m| m.to).collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn can_reach(&self, origin: Square, destination: Square) -> bool {
        self.moves_from(origin).iter().any(|m| m.to == destination)
    }

    pub fn len(&self) -> usize {
        self.by_origin.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_origin.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(text: &[&str]) -> Vec<Move> {
        text.iter().map(|m| Move::new_from_text(m).unwrap()).collect()
    }

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn groups_by_origin() {
        let mut legal = LegalMoves::new();
        legal.rebuild(moves(&["e2e3", "e2e4", "g1f3", "g1h3", "b7b8q", "b7b8n", "b7b8r", "b7b8b"]));

        assert_eq!(legal.len(), 8);
        assert_eq!(legal.destinations(sq("e2")), vec![sq("e3"), sq("e4")]);
        assert_eq!(legal.destinations(sq("b7")), vec![sq("b8")]);
        assert_eq!(legal.moves_from(sq("b7")).len(), 4);
        assert!(legal.destinations(sq("a2")).is_empty());

        for m in moves(&["e2e3", "e2e4", "g1f3", "g1h3"]) {
            assert!(legal.moves_from(m.from).iter().all(|x| x.from == m.from));
        }
    }

    #[test]
    fn membership_is_exact() {
        let mut legal = LegalMoves::new();
        legal.rebuild(moves(&["b7b8q", "e2e4"]));

        assert!(legal.contains(&Move::new_from_text("b7b8q").unwrap()));
        assert!(!legal.contains(&Move::new_from_text("b7b8").unwrap()));
        assert!(!legal.contains(&Move::new_from_text("b7b8n").unwrap()));
        assert!(!legal.contains(&Move::new_from_text("e2e5").unwrap()));
        assert!(legal.can_reach(sq("b7"), sq("b8")));
    }

    #[test]
    fn rebuild_drops_stale_entries() {
        let mut legal = LegalMoves::new();
        legal.rebuild(moves(&["e2e4", "d2d4"]));
        legal.rebuild(moves(&["e7e5", "e2e4"]));

        assert!(!legal.contains(&Move::new_from_text("d2d4").unwrap()));
        assert!(legal.destinations(sq("d2")).is_empty());
        assert_eq!(legal.len(), 2);

        legal.rebuild(Vec::new());
        assert!(legal.is_empty());
    }
}
