//! Interning of token strings so that every comparison in the aligners is an integer comparison.
use ahash::AHashMap;

/// An interned token. Two tokens are equal iff they were interned from the same string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(u32);

impl Token {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Append-only table mapping token strings to [`Token`] ids in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    ids: AHashMap<String, Token>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, word: &str) -> Token {
        if let Some(&token) = self.ids.get(word) {
            return token;
        }
        let token = Token(self.strings.len() as u32);
        self.strings.push(word.to_string());
        self.ids.insert(word.to_string(), token);
        token
    }

    pub fn get(&self, word: &str) -> Option<Token> {
        self.ids.get(word).copied()
    }

    ///Panics if the token was made by a different interner.
    pub fn resolve(&self, token: Token) -> &str {
        &self.strings[token.index()]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut interner = Interner::new();
        let the = interner.intern("the");
        let cat = interner.intern("cat");
        assert_eq!(interner.intern("the"), the);
        assert_ne!(the, cat);
        assert!(the < cat);
        assert_eq!(interner.resolve(cat), "cat");
        assert_eq!(interner.get("dog"), None);
        assert_eq!(interner.len(), 2);
    }
}
