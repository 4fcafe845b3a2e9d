//! Resource-bounded attention engine for a term-logic reasoner.
//!
//! Concepts, buffered tasks, task-links and term-links all live in bounded
//! priority bags. Each bag is stratified into discrete levels and drained by
//! a deterministic distributor, so high-priority items are selected more
//! often, full bags evict from the lowest level, and items lose priority each
//! time they are processed and put back.
//!
//! The term logic is a collaborator behind the [`Inference`] trait. No I/O:
//! input arrives as task lines, output leaves as [`Report`]s.

pub mod bag;
pub mod budget;
pub mod concept;
pub mod config;
pub mod constants;
pub mod distributor;
pub mod error;
pub mod inference;
pub mod item;
pub mod link;
pub mod memory;
pub mod reasoner;
pub mod report;
pub mod task;
pub mod term;

pub use bag::{Bag, BagParams};
pub use budget::Budget;
pub use concept::Concept;
pub use config::{BagRole, ReasonerConfig};
pub use distributor::Distributor;
pub use error::{ConfigError, ParseError};
pub use inference::{Derivations, Inference, MatchingInference};
pub use item::Item;
pub use link::{LinkType, TaskLink, TermLink, TermLinkTemplate, prepare_templates};
pub use memory::Memory;
pub use reasoner::Reasoner;
pub use report::{Report, ReportKind};
pub use task::{Punctuation, Sentence, Task, TaskOrigin, Truth, parse_task};
pub use term::{Operator, Term, parse};
