use serde::Serialize;
use std::fmt::Display;

///A hypothesised category label. Only equality between labels carries meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Nonterminal(u64);

impl Nonterminal {
    ///The label given to the span covering a whole sentence.
    pub const START: Nonterminal = Nonterminal(0);

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for Nonterminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic allocator of [`Nonterminal`] labels.
#[derive(Debug, Clone, Default)]
pub struct Nonterminals {
    next: u64,
}

impl Nonterminals {
    pub fn new() -> Self {
        Self::default()
    }

    ///Mints the next unused label.
    pub fn fresh(&mut self) -> Nonterminal {
        let n = Nonterminal(self.next);
        self.next += 1;
        n
    }

    ///Creates a label with an explicit value and moves the counter past it.
    pub fn observe(&mut self, value: u64) -> Nonterminal {
        if value >= self.next {
            self.next = value + 1;
        }
        Nonterminal(value)
    }

    pub fn start(&mut self) -> Nonterminal {
        self.observe(Nonterminal::START.0)
    }

    ///The value the next call to [`Nonterminals::fresh`] will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_raise_the_counter() {
        let mut nts = Nonterminals::new();
        assert_eq!(nts.fresh(), Nonterminal(0));
        assert_eq!(nts.observe(7), Nonterminal(7));
        assert_eq!(nts.fresh(), Nonterminal(8));
        assert_eq!(nts.observe(3), Nonterminal(3));
        assert_eq!(nts.fresh(), Nonterminal(9));
        assert_eq!(nts.start(), Nonterminal::START);
        assert_eq!(nts.peek(), 10);
    }
}
