//! Circular deck of lesson items with a cursor.

/// Ordered, immutable item list plus a cursor that wraps in both directions.
#[derive(Debug, Clone)]
pub struct Deck {
    items: Vec<String>,
    cursor: usize,
}

impl Deck {
    /// Build a deck from raw items (trimmed). Returns `None` for an empty list.
    pub fn new<I, S>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .collect();
        if items.is_empty() {
            return None;
        }
        Some(Self { items, cursor: 0 })
    }

    pub fn current(&self) -> &str {
        &self.items[self.cursor]
    }

    pub fn next(&mut self) -> &str {
        self.cursor = (self.cursor + 1) % self.items.len();
        self.current()
    }

    pub fn prev(&mut self) -> &str {
        let len = self.items.len();
        self.cursor = (self.cursor + len - 1) % len;
        self.current()
    }

    /// Move the cursor to `i`. Out-of-range indices leave the cursor untouched.
    pub fn go_to(&mut self, i: usize) -> bool {
        if i < self.items.len() {
            self.cursor = i;
            true
        } else {
            log::debug!("deck: ignoring go_to({}) outside 0..{}", i, self.items.len());
            false
        }
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Deck {
        Deck::new(["A", "B", "C"]).unwrap()
    }

    #[test]
    fn test_next_wraps_to_start() {
        let mut deck = abc();
        assert_eq!(deck.next(), "B");
        assert_eq!(deck.next(), "C");
        assert_eq!(deck.next(), "A");
        assert_eq!(deck.index(), 0);
    }

    #[test]
    fn test_prev_from_zero_wraps_to_end() {
        let mut deck = abc();
        assert_eq!(deck.prev(), "C");
        assert_eq!(deck.index(), 2);
    }

    #[test]
    fn test_go_to_out_of_range_is_noop() {
        let mut deck = abc();
        deck.go_to(1);
        assert!(!deck.go_to(3));
        assert!(!deck.go_to(usize::MAX));
        assert_eq!(deck.index(), 1);
    }

    #[test]
    fn test_items_are_trimmed() {
        let deck = Deck::new(["  the ", "and\n"]).unwrap();
        assert_eq!(deck.items(), &["the".to_string(), "and".to_string()]);
    }

    #[test]
    fn test_empty_deck_rejected() {
        assert!(Deck::new(Vec::<String>::new()).is_none());
    }
}
