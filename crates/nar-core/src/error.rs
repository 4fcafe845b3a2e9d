use std::fmt;

/// Configuration rejected at construction time. Fatal: a reasoner is never
/// built from a config that fails validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroCapacity(&'static str),
    ZeroLevels,
    ThresholdOutOfRange { threshold: usize, levels: usize },
    InvalidForgetRate(&'static str, f32),
    NotUnitInterval(&'static str, f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity(field) => write!(f, "{field} must be at least 1"),
            ConfigError::ZeroLevels => write!(f, "bag_level must be at least 1"),
            ConfigError::ThresholdOutOfRange { threshold, levels } => write!(
                f,
                "bag_threshold {threshold} must be below bag_level {levels}"
            ),
            ConfigError::InvalidForgetRate(field, v) => {
                write!(f, "{field} must be a positive number of cycles, got {v}")
            }
            ConfigError::NotUnitInterval(field, v) => {
                write!(f, "{field} must lie in [0, 1], got {v}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Malformed term or task text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Empty,
    UnexpectedEnd,
    UnexpectedChar { pos: usize, found: char },
    UnknownCopula(String),
    UnknownOperator(String),
    MissingPunctuation,
    InvalidNumber(String),
    TrailingInput(String),
    TooDeep(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty input"),
            ParseError::UnexpectedEnd => write!(f, "unexpected end of input"),
            ParseError::UnexpectedChar { pos, found } => {
                write!(f, "unexpected '{found}' at position {pos}")
            }
            ParseError::UnknownCopula(s) => write!(f, "unknown copula '{s}'"),
            ParseError::UnknownOperator(s) => write!(f, "unknown operator '{s}'"),
            ParseError::MissingPunctuation => write!(f, "missing punctuation ('.', '?' or '!')"),
            ParseError::InvalidNumber(s) => write!(f, "invalid number '{s}'"),
            ParseError::TrailingInput(s) => write!(f, "trailing input '{s}'"),
            ParseError::TooDeep(max) => write!(f, "terms nested deeper than {max}"),
        }
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;
