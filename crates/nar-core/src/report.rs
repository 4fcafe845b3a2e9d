use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Input task accepted.
    In,
    /// Derived task accepted.
    Out,
    /// Question answered from a belief.
    Answer,
    /// Goal handed to execution.
    Exe,
}

impl ReportKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::Answer => "ANSWER",
            Self::Exe => "EXE",
        }
    }
}

/// Output notification produced by a cycle, for an external output channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub content: String,
    pub clock: u64,
}

impl Report {
    pub fn new(kind: ReportKind, content: impl Into<String>, clock: u64) -> Self {
        Self {
            kind,
            content: content.into(),
            clock,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.content)
    }
}
