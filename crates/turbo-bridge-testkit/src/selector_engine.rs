//! Selector parsing and matching for the in-memory document.
//!
//! Supports what generated selectors use: type selectors, `*`, `#id`,
//! `.class`, `:nth-child(n)`, the descendant and `>` combinators, and CSS
//! escapes inside identifiers. Anything else is rejected the way a
//! browser's `querySelector` rejects it, with an invalid-selector error.

use turbo_bridge::{BridgeError, BridgeResult};

/// One compound selector, e.g. `div.card:nth-child(2)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub universal: bool,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub nth_child: Option<usize>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.nth_child.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// A compound plus its relation to the compound on its left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub compound: Compound,
    pub combinator: Option<Combinator>,
}

/// Parse a selector into left-to-right parts.
pub fn parse(selector: &str) -> BridgeResult<Vec<Part>> {
    Parser::new(selector).parse()
}

/// Tree navigation needed to match a parsed selector.
pub trait SelectorTree {
    type Node: Copy + PartialEq;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Lowercase local name.
    fn local_name(&self, node: Self::Node) -> String;

    fn id(&self, node: Self::Node) -> String;

    fn has_class(&self, node: Self::Node, class: &str) -> bool;

    /// 1-based position among element siblings.
    fn child_index(&self, node: Self::Node) -> usize;
}

/// Whether `node` matches the whole selector.
pub fn matches<T: SelectorTree>(tree: &T, parts: &[Part], node: T::Node) -> bool {
    match parts.len() {
        0 => false,
        n => matches_from(tree, parts, n - 1, node),
    }
}

fn matches_from<T: SelectorTree>(tree: &T, parts: &[Part], index: usize, node: T::Node) -> bool {
    let part = &parts[index];
    if !matches_compound(tree, &part.compound, node) {
        return false;
    }
    if index == 0 {
        return true;
    }

    match part.combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Child => tree
            .parent(node)
            .is_some_and(|parent| matches_from(tree, parts, index - 1, parent)),
        Combinator::Descendant => {
            let mut ancestor = tree.parent(node);
            while let Some(candidate) = ancestor {
                if matches_from(tree, parts, index - 1, candidate) {
                    return true;
                }
                ancestor = tree.parent(candidate);
            }
            false
        }
    }
}

fn matches_compound<T: SelectorTree>(tree: &T, compound: &Compound, node: T::Node) -> bool {
    if let Some(tag) = &compound.tag {
        if !tree.local_name(node).eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if !compound.ids.is_empty() {
        let id = tree.id(node);
        if compound.ids.iter().any(|wanted| *wanted != id) {
            return false;
        }
    }
    if !compound.classes.iter().all(|class| tree.has_class(node, class)) {
        return false;
    }
    if let Some(n) = compound.nth_child {
        if tree.child_index(node) != n {
            return false;
        }
    }
    true
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn invalid(&self) -> BridgeError {
        BridgeError::InvalidSelector(self.source.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse(mut self) -> BridgeResult<Vec<Part>> {
        let mut parts: Vec<Part> = Vec::new();
        let mut combinator = None;
        self.skip_whitespace();

        loop {
            let compound = self.compound()?;
            parts.push(Part {
                compound,
                combinator: combinator.take(),
            });

            let had_space = self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinator = Some(Combinator::Child);
                }
                Some(_) if had_space => combinator = Some(Combinator::Descendant),
                Some(_) => return Err(self.invalid()),
            }
        }

        Ok(parts)
    }

    fn compound(&mut self) -> BridgeResult<Compound> {
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                compound.universal = true;
            }
            Some(c) if starts_ident(c, self.peek_at(1), self.peek_at(2)) => {
                compound.tag = Some(self.ident()?);
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    let id = self.ident()?;
                    compound.ids.push(id);
                }
                Some('.') => {
                    self.pos += 1;
                    let class = self.ident()?;
                    compound.classes.push(class);
                }
                Some(':') => {
                    self.pos += 1;
                    compound.nth_child = Some(self.nth_child()?);
                }
                _ => break,
            }
        }

        if compound.is_empty() {
            return Err(self.invalid());
        }
        Ok(compound)
    }

    fn nth_child(&mut self) -> BridgeResult<usize> {
        let name = self.ident()?;
        if !name.eq_ignore_ascii_case("nth-child") || self.peek() != Some('(') {
            return Err(self.invalid());
        }
        self.pos += 1;
        self.skip_whitespace();

        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        self.skip_whitespace();
        if digits.is_empty() || self.peek() != Some(')') {
            return Err(self.invalid());
        }
        self.pos += 1;

        digits.parse().map_err(|_| self.invalid())
    }

    /// Consume an identifier, decoding escapes.
    fn ident(&mut self) -> BridgeResult<String> {
        let starts = self
            .peek()
            .is_some_and(|c| starts_ident(c, self.peek_at(1), self.peek_at(2)));
        if !starts {
            return Err(self.invalid());
        }

        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    if !valid_escape(self.peek_at(1)) {
                        return Err(self.invalid());
                    }
                    self.pos += 1;
                    out.push(self.escape());
                }
                Some(c) if is_name_char(c) => {
                    out.push(c);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        Ok(out)
    }

    /// Consume an escape body; the backslash is already consumed.
    fn escape(&mut self) -> char {
        let start = self.pos;
        while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }

        if self.pos == start {
            let c = self.peek().unwrap_or('\u{FFFD}');
            self.pos += 1;
            return c;
        }

        let hex: String = self.chars[start..self.pos].iter().collect();
        if self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|&code| code != 0)
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}')
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{C}')
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

fn valid_escape(next: Option<char>) -> bool {
    matches!(next, Some(c) if c != '\n')
}

/// CSS "would start an identifier" check over the next three code points.
fn starts_ident(first: char, second: Option<char>, third: Option<char>) -> bool {
    match first {
        '-' => match second {
            Some('-') => true,
            Some('\\') => valid_escape(third),
            Some(c) => is_name_start(c),
            None => false,
        },
        '\\' => valid_escape(second),
        c => is_name_start(c),
    }
}
