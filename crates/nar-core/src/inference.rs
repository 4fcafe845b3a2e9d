//! Seam between the attention core and the term-logic rules.
//!
//! The core decides *what* gets processed and hands the selected premises
//! to an [`Inference`] implementation. Whatever the rules produce goes into
//! a [`Derivations`] buffer that memory absorbs once the step returns, so an
//! implementation never touches the bags directly.

use crate::budget::Budget;
use crate::concept::Concept;
use crate::item::Item;
use crate::link::{TaskLink, TermLink};
use crate::report::{Report, ReportKind};
use crate::task::{Punctuation, Task};
use crate::term::Term;

/// Output of one inference step.
#[derive(Debug, Default)]
pub struct Derivations {
    clock: u64,
    tasks: Vec<Task>,
    reports: Vec<Report>,
    activations: Vec<(Term, Budget)>,
}

impl Derivations {
    pub fn new(clock: u64) -> Self {
        Self {
            clock,
            ..Default::default()
        }
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Queue a derived task for the next intake phase.
    pub fn derive(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn report(&mut self, kind: ReportKind, content: impl Into<String>) {
        self.reports.push(Report::new(kind, content, self.clock));
    }

    /// Ask memory to raise the standing of the concept for `term`.
    pub fn activate(&mut self, term: Term, budget: Budget) {
        self.activations.push((term, budget));
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub(crate) fn into_parts(self) -> (Vec<Task>, Vec<Report>, Vec<(Term, Budget)>) {
        (self.tasks, self.reports, self.activations)
    }
}

pub trait Inference {
    /// A task has just reached its own concept. May lower the task's budget
    /// to stop it from spreading further.
    fn direct_process(&mut self, concept: &mut Concept, task: &mut Task, out: &mut Derivations);

    /// A transform task-link was selected. Single-premise rules only.
    fn transform(&mut self, _concept: &Concept, _task_link: &TaskLink, _out: &mut Derivations) {}

    /// A task-link and a novel term-link were selected in `concept`.
    /// `belief_concept` is the concept the term-link points at, when resident.
    fn reason(
        &mut self,
        _concept: &Concept,
        _task_link: &TaskLink,
        _term_link: &TermLink,
        _belief_concept: Option<&Concept>,
        _out: &mut Derivations,
    ) {
    }
}

/// Stores judgments as beliefs and answers questions whose content matches a
/// stored belief exactly. Derives nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatchingInference;

impl Inference for MatchingInference {
    fn direct_process(&mut self, concept: &mut Concept, task: &mut Task, out: &mut Derivations) {
        match task.sentence().punctuation {
            Punctuation::Judgment => {
                let belief = task.sentence().clone();
                if !concept.add_belief(belief.clone()) {
                    // repeated judgment: keep it from spreading again
                    let halved = task.priority() * 0.5;
                    task.budget_mut().set_priority(halved);
                    return;
                }
                for question in concept.questions() {
                    out.report(
                        ReportKind::Answer,
                        format!("{} => {}", question.sentence(), belief),
                    );
                }
            }
            Punctuation::Question => {
                let fresh = concept.add_question(task.clone());
                if let (true, Some(belief)) = (fresh, concept.best_belief()) {
                    out.report(
                        ReportKind::Answer,
                        format!("{} => {}", task.sentence(), belief),
                    );
                }
            }
            Punctuation::Goal => {}
        }
    }
}
