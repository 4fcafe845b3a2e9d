//! Minimal term model consumed by the attention core.
//!
//! The core only needs a stable name (the concept key) and the component
//! structure (for term-link templates). Statement algebra, variables and
//! unification live with the inference collaborator.

use std::fmt;

use crate::constants::MAX_TERM_DEPTH;
use crate::error::{ParseError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Inheritance,
    Similarity,
    Implication,
    Equivalence,
    Product,
    Conjunction,
    Disjunction,
    Negation,
    SetExt,
    SetInt,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Inheritance => "-->",
            Self::Similarity => "<->",
            Self::Implication => "==>",
            Self::Equivalence => "<=>",
            Self::Product => "*",
            Self::Conjunction => "&&",
            Self::Disjunction => "||",
            Self::Negation => "--",
            Self::SetExt => "{}",
            Self::SetInt => "[]",
        }
    }

    /// Copulas: rendered as `<subject copula predicate>`.
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Self::Inheritance | Self::Similarity | Self::Implication | Self::Equivalence
        )
    }

    fn from_copula(s: &str) -> Option<Self> {
        match s {
            "-->" => Some(Self::Inheritance),
            "<->" => Some(Self::Similarity),
            "==>" => Some(Self::Implication),
            "<=>" => Some(Self::Equivalence),
            _ => None,
        }
    }

    fn from_prefix(s: &str) -> Option<Self> {
        match s {
            "*" => Some(Self::Product),
            "&&" => Some(Self::Conjunction),
            "||" => Some(Self::Disjunction),
            "--" => Some(Self::Negation),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Atom(String),
    Compound {
        op: Operator,
        components: Vec<Term>,
    },
}

impl Term {
    pub fn atom(name: &str) -> Self {
        Self::Atom(name.to_string())
    }

    pub fn compound(op: Operator, components: Vec<Term>) -> Self {
        Self::Compound { op, components }
    }

    pub fn statement(subject: Term, copula: Operator, predicate: Term) -> Self {
        Self::Compound {
            op: copula,
            components: vec![subject, predicate],
        }
    }

    /// Canonical rendering, used as the concept key.
    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Compound { .. })
    }

    pub fn operator(&self) -> Option<Operator> {
        match self {
            Self::Atom(_) => None,
            Self::Compound { op, .. } => Some(*op),
        }
    }

    pub fn components(&self) -> &[Term] {
        match self {
            Self::Atom(_) => &[],
            Self::Compound { components, .. } => components,
        }
    }

    /// Atoms count 1, compounds 1 plus their components.
    pub fn complexity(&self) -> usize {
        1 + self.components().iter().map(Term::complexity).sum::<usize>()
    }

    /// Variables (`$x`, `#x`, `?x`) are excluded from term-link templates.
    pub fn is_constant(&self) -> bool {
        match self {
            Self::Atom(name) => !name.starts_with(['$', '#', '?']),
            Self::Compound { components, .. } => components.iter().all(Term::is_constant),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(name) => write!(f, "{name}"),
            Term::Compound { op, components } if op.is_statement() && components.len() == 2 => {
                write!(f, "<{} {} {}>", components[0], op.symbol(), components[1])
            }
            Term::Compound { op, components } => {
                let (open, close) = match op {
                    Operator::SetExt => ("{", "}"),
                    Operator::SetInt => ("[", "]"),
                    _ => ("(", ")"),
                };
                write!(f, "{open}")?;
                if !matches!(op, Operator::SetExt | Operator::SetInt) {
                    write!(f, "{}", op.symbol())?;
                    if !components.is_empty() {
                        write!(f, ", ")?;
                    }
                }
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, "{close}")
            }
        }
    }
}

/// Parse a complete term; anything after it is an error.
pub fn parse(text: &str) -> Result<Term> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    if parser.at_end() {
        return Err(ParseError::Empty);
    }
    let term = parser.term()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(ParseError::TrailingInput(parser.rest().to_string()));
    }
    Ok(term)
}

/// Parse a term prefix and return it with the unconsumed remainder.
pub(crate) fn parse_prefix(text: &str) -> Result<(Term, &str)> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    if parser.at_end() {
        return Err(ParseError::Empty);
    }
    let term = parser.term()?;
    Ok((term, parser.rest()))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, depth: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<()> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(ParseError::UnexpectedChar {
                pos: self.pos - c.len_utf8(),
                found: c,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn term(&mut self) -> Result<Term> {
        self.skip_ws();
        if self.depth >= MAX_TERM_DEPTH {
            return Err(ParseError::TooDeep(MAX_TERM_DEPTH));
        }
        self.depth += 1;
        let term = match self.peek() {
            None => Err(ParseError::UnexpectedEnd),
            Some('<') => self.statement(),
            Some('(') => self.prefixed(),
            Some('{') => self.set('{', '}', Operator::SetExt),
            Some('[') => self.set('[', ']', Operator::SetInt),
            Some(_) => self.atom(),
        };
        self.depth -= 1;
        term
    }

    fn statement(&mut self) -> Result<Term> {
        self.expect('<')?;
        let subject = self.term()?;
        self.skip_ws();
        let copula: String = self.rest().chars().take(3).collect();
        let op = Operator::from_copula(&copula).ok_or(ParseError::UnknownCopula(copula))?;
        self.pos += 3;
        let predicate = self.term()?;
        self.expect('>')?;
        Ok(Term::statement(subject, op, predicate))
    }

    fn prefixed(&mut self) -> Result<Term> {
        self.expect('(')?;
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| c != ',' && c != ')' && !c.is_whitespace()) {
            self.bump();
        }
        let symbol = &self.src[start..self.pos];
        let op = Operator::from_prefix(symbol)
            .ok_or_else(|| ParseError::UnknownOperator(symbol.to_string()))?;
        let mut components = Vec::new();
        loop {
            self.skip_ws();
            match self.bump() {
                Some(',') => components.push(self.term()?),
                Some(')') => break,
                Some(c) => {
                    return Err(ParseError::UnexpectedChar {
                        pos: self.pos - c.len_utf8(),
                        found: c,
                    });
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
        Ok(Term::compound(op, components))
    }

    fn set(&mut self, open: char, close: char, op: Operator) -> Result<Term> {
        self.expect(open)?;
        let mut components = vec![self.term()?];
        loop {
            self.skip_ws();
            match self.bump() {
                Some(',') => components.push(self.term()?),
                Some(c) if c == close => break,
                Some(c) => {
                    return Err(ParseError::UnexpectedChar {
                        pos: self.pos - c.len_utf8(),
                        found: c,
                    });
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
        Ok(Term::compound(op, components))
    }

    fn atom(&mut self) -> Result<Term> {
        let start = self.pos;
        if self.peek().is_some_and(|c| matches!(c, '$' | '#' | '?')) {
            self.bump();
        }
        while let Some(c) = self.peek() {
            let hyphen = c == '-' && !self.rest().starts_with("-->");
            if !(c.is_alphanumeric() || c == '_' || hyphen) {
                break;
            }
            self.bump();
        }
        if self.pos == start {
            let found = self.peek().unwrap_or(' ');
            return Err(ParseError::UnexpectedChar { pos: start, found });
        }
        Ok(Term::Atom(self.src[start..self.pos].to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_atom() {
        assert_eq!(parse("bird").unwrap(), Term::atom("bird"));
        assert_eq!(parse("  $x ").unwrap(), Term::atom("$x"));
    }

    #[test]
    fn test_parse_statement() {
        let t = parse("<bird --> animal>").unwrap();
        assert_eq!(
            t,
            Term::statement(Term::atom("bird"), Operator::Inheritance, Term::atom("animal"))
        );
        assert_eq!(t.name(), "<bird --> animal>");
    }

    #[test]
    fn test_parse_nested() {
        let t = parse("<(*, acid, base) --> reaction>").unwrap();
        assert_eq!(t.components().len(), 2);
        assert_eq!(t.components()[0].operator(), Some(Operator::Product));
        assert_eq!(t.name(), "<(*, acid, base) --> reaction>");
        assert_eq!(t.complexity(), 5);
    }

    #[test]
    fn test_parse_sets_and_negation() {
        assert_eq!(parse("{tweety}").unwrap().name(), "{tweety}");
        assert_eq!(parse("[yellow, small]").unwrap().name(), "[yellow, small]");
        assert_eq!(parse("(--,<a --> b>)").unwrap().name(), "(--, <a --> b>)");
        assert_eq!(parse("(&&,a,b)").unwrap().name(), "(&&, a, b)");
    }

    #[test]
    fn test_hyphenated_atom_before_copula() {
        let t = parse("<sea-lion --> mammal>").unwrap();
        assert_eq!(t.components()[0], Term::atom("sea-lion"));
    }

    #[test]
    fn test_render_roundtrip_is_stable() {
        let src = "<(&&, <$x --> bird>, {tweety}) ==> <$x --> [flying]>>";
        let t = parse(src).unwrap();
        assert_eq!(parse(&t.name()).unwrap(), t);
    }

    #[test]
    fn test_constant() {
        assert!(parse("<a --> b>").unwrap().is_constant());
        assert!(!parse("<$x --> b>").unwrap().is_constant());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("<a ~~> b>"), Err(ParseError::UnknownCopula("~~>".into())));
        assert_eq!(parse("(%, a)"), Err(ParseError::UnknownOperator("%".into())));
        assert_eq!(parse("<a --> b"), Err(ParseError::UnexpectedEnd));
        assert!(matches!(parse("a b"), Err(ParseError::TrailingInput(_))));
    }

    #[test]
    fn test_parse_prefix_leaves_rest() {
        let (t, rest) = parse_prefix("<a --> b>. %1.0;0.9%").unwrap();
        assert_eq!(t.name(), "<a --> b>");
        assert_eq!(rest, ". %1.0;0.9%");
    }

    #[test]
    fn test_parse_rejects_deep_nesting() {
        let nested = |n: usize| format!("{}a{}", "(*, ".repeat(n), ")".repeat(n));
        assert!(parse(&nested(MAX_TERM_DEPTH - 1)).is_ok());
        assert_eq!(
            parse(&nested(MAX_TERM_DEPTH)),
            Err(ParseError::TooDeep(MAX_TERM_DEPTH))
        );
        assert_eq!(
            parse(&nested(50_000)),
            Err(ParseError::TooDeep(MAX_TERM_DEPTH))
        );
    }
}
