use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::budget::Budget;
use crate::constants::{
    DEFAULT_GOAL_DURABILITY, DEFAULT_GOAL_PRIORITY, DEFAULT_JUDGMENT_CONFIDENCE,
    DEFAULT_JUDGMENT_DURABILITY, DEFAULT_JUDGMENT_FREQUENCY, DEFAULT_JUDGMENT_PRIORITY,
    DEFAULT_QUESTION_DURABILITY, DEFAULT_QUESTION_PRIORITY,
};
use crate::error::{ParseError, Result};
use crate::item::Item;
use crate::term::{self, Term};

static BUDGET_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\$(?P<p>[0-9.]+)(?:;(?P<d>[0-9.]+))?(?:;(?P<q>[0-9.]+))?\$").unwrap()
});
static TRUTH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%(?P<f>[0-9.]+)(?:;(?P<c>[0-9.]+))?%\s*$").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Punctuation {
    Judgment,
    Question,
    Goal,
}

impl Punctuation {
    pub fn as_char(&self) -> char {
        match self {
            Self::Judgment => '.',
            Self::Question => '?',
            Self::Goal => '!',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Self::Judgment),
            '?' => Some(Self::Question),
            '!' => Some(Self::Goal),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Truth {
    pub frequency: f32,
    pub confidence: f32,
}

impl Truth {
    pub fn new(frequency: f32, confidence: f32) -> Self {
        Self {
            frequency: frequency.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 0.99),
        }
    }

    /// `c * (f - 0.5) + 0.5`
    pub fn expectation(&self) -> f32 {
        self.confidence * (self.frequency - 0.5) + 0.5
    }

    /// Quality assigned to a judgment's budget from its truth.
    pub fn to_quality(&self) -> f32 {
        let e = self.expectation();
        e.max((1.0 - e) * 0.75)
    }
}

impl Default for Truth {
    fn default() -> Self {
        Self::new(DEFAULT_JUDGMENT_FREQUENCY, DEFAULT_JUDGMENT_CONFIDENCE)
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{:.2};{:.2}%", self.frequency, self.confidence)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sentence {
    pub content: Term,
    pub punctuation: Punctuation,
    /// Present for judgments and goals.
    pub truth: Option<Truth>,
}

impl Sentence {
    pub fn new(content: Term, punctuation: Punctuation, truth: Option<Truth>) -> Self {
        let truth = match punctuation {
            Punctuation::Question => None,
            _ => Some(truth.unwrap_or_default()),
        };
        Self {
            content,
            punctuation,
            truth,
        }
    }

    pub fn judgment(content: Term, truth: Truth) -> Self {
        Self::new(content, Punctuation::Judgment, Some(truth))
    }

    pub fn question(content: Term) -> Self {
        Self::new(content, Punctuation::Question, None)
    }

    pub fn is_judgment(&self) -> bool {
        self.punctuation == Punctuation::Judgment
    }

    pub fn is_question(&self) -> bool {
        self.punctuation == Punctuation::Question
    }

    pub fn is_goal(&self) -> bool {
        self.punctuation == Punctuation::Goal
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.content, self.punctuation.as_char())?;
        if let Some(truth) = &self.truth {
            write!(f, " {truth}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOrigin {
    Input,
    Derived,
}

/// A sentence with a budget, waiting to be processed.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    key: String,
    sentence: Sentence,
    budget: Budget,
    origin: TaskOrigin,
    structural: bool,
}

impl Task {
    pub fn new(sentence: Sentence, budget: Budget, origin: TaskOrigin, structural: bool) -> Self {
        Self {
            key: sentence.to_string(),
            sentence,
            budget,
            origin,
            structural,
        }
    }

    pub fn input(sentence: Sentence, budget: Budget) -> Self {
        Self::new(sentence, budget, TaskOrigin::Input, false)
    }

    pub fn derived(sentence: Sentence, budget: Budget) -> Self {
        Self::new(sentence, budget, TaskOrigin::Derived, false)
    }

    /// Single-premise derivation; never fed back through a transform link.
    pub fn structural(sentence: Sentence, budget: Budget) -> Self {
        Self::new(sentence, budget, TaskOrigin::Derived, true)
    }

    pub fn sentence(&self) -> &Sentence {
        &self.sentence
    }

    pub fn content(&self) -> &Term {
        &self.sentence.content
    }

    pub fn origin(&self) -> TaskOrigin {
        self.origin
    }

    pub fn is_input(&self) -> bool {
        self.origin == TaskOrigin::Input
    }

    pub fn is_structural(&self) -> bool {
        self.structural
    }
}

impl Item for Task {
    fn key(&self) -> &str {
        &self.key
    }

    fn budget(&self) -> &Budget {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut Budget {
        &mut self.budget
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.budget, self.sentence)
    }
}

/// Default budget for an input sentence without an explicit `$p;d;q$`.
pub fn default_budget(sentence: &Sentence) -> Budget {
    match sentence.punctuation {
        Punctuation::Judgment => Budget::new(
            DEFAULT_JUDGMENT_PRIORITY,
            DEFAULT_JUDGMENT_DURABILITY,
            sentence.truth.unwrap_or_default().to_quality(),
        ),
        Punctuation::Question => {
            Budget::new(DEFAULT_QUESTION_PRIORITY, DEFAULT_QUESTION_DURABILITY, 1.0)
        }
        Punctuation::Goal => Budget::new(DEFAULT_GOAL_PRIORITY, DEFAULT_GOAL_DURABILITY, 1.0),
    }
}

fn number(s: &str) -> Result<f32> {
    s.parse::<f32>()
        .map_err(|_| ParseError::InvalidNumber(s.to_string()))
}

/// Parse an input line: `[$p;d;q$] term punctuation [%f;c%]`.
pub fn parse_task(line: &str) -> Result<Task> {
    let mut rest = line.trim();
    if rest.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut budget = None;
    if let Some(caps) = BUDGET_PREFIX.captures(rest) {
        let p = number(&caps["p"])?;
        let d = caps.name("d").map(|m| number(m.as_str())).transpose()?;
        let q = caps.name("q").map(|m| number(m.as_str())).transpose()?;
        budget = Some((p, d, q));
        rest = &rest[caps.get(0).map_or(0, |m| m.end())..];
    }

    let mut truth = None;
    if let Some(caps) = TRUTH_SUFFIX.captures(rest) {
        let f = number(&caps["f"])?;
        let c = caps
            .name("c")
            .map(|m| number(m.as_str()))
            .transpose()?
            .unwrap_or(DEFAULT_JUDGMENT_CONFIDENCE);
        truth = Some(Truth::new(f, c));
        rest = &rest[..caps.get(0).map_or(rest.len(), |m| m.start())];
    }

    let (content, tail) = term::parse_prefix(rest)?;
    let tail = tail.trim();
    let mut chars = tail.chars();
    let punctuation = chars
        .next()
        .and_then(Punctuation::from_char)
        .ok_or(ParseError::MissingPunctuation)?;
    let trailing = chars.as_str().trim();
    if !trailing.is_empty() {
        return Err(ParseError::TrailingInput(trailing.to_string()));
    }

    let sentence = Sentence::new(content, punctuation, truth);
    let defaults = default_budget(&sentence);
    let budget = match budget {
        Some((p, d, q)) => Budget::new(
            p,
            d.unwrap_or(defaults.durability()),
            q.unwrap_or(defaults.quality()),
        ),
        None => defaults,
    };
    Ok(Task::input(sentence, budget))
}
