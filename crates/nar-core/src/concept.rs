use std::sync::Arc;

use crate::bag::Bag;
use crate::budget::Budget;
use crate::config::{BagRole, ReasonerConfig};
use crate::constants::INITIAL_CONCEPT_BUDGET;
use crate::distributor::Distributor;
use crate::item::Item;
use crate::link::{TaskLink, TermLink, TermLinkTemplate, prepare_templates};
use crate::task::{Sentence, Task};
use crate::term::Term;

/// Per-term record in the concept bag. Holds the links that attention flows
/// along when the concept fires, plus the beliefs and questions the
/// inference step has filed under this term.
pub struct Concept {
    key: String,
    term: Term,
    budget: Budget,
    task_links: Bag<TaskLink>,
    term_links: Bag<TermLink>,
    templates: Vec<TermLinkTemplate>,
    beliefs: Vec<Sentence>,
    questions: Vec<Task>,
    belief_capacity: usize,
    question_capacity: usize,
}

impl Concept {
    pub fn new(term: Term, config: &ReasonerConfig, distributor: Arc<Distributor>) -> Self {
        let params = config.bag_params();
        Self {
            key: term.name(),
            templates: prepare_templates(&term),
            term,
            budget: Budget::new(
                INITIAL_CONCEPT_BUDGET,
                INITIAL_CONCEPT_BUDGET,
                INITIAL_CONCEPT_BUDGET,
            ),
            task_links: Bag::new(
                config.task_link_bag_size,
                config.forget_rate(BagRole::TaskLinks),
                params,
                Arc::clone(&distributor),
            ),
            term_links: Bag::new(
                config.term_link_bag_size,
                config.forget_rate(BagRole::TermLinks),
                params,
                distributor,
            ),
            beliefs: Vec::new(),
            questions: Vec::new(),
            belief_capacity: config.belief_capacity,
            question_capacity: config.question_capacity,
        }
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Components this concept links to, prepared once at creation.
    pub fn templates(&self) -> &[TermLinkTemplate] {
        &self.templates
    }

    pub fn task_links(&self) -> &Bag<TaskLink> {
        &self.task_links
    }

    pub fn task_links_mut(&mut self) -> &mut Bag<TaskLink> {
        &mut self.task_links
    }

    pub fn term_links(&self) -> &Bag<TermLink> {
        &self.term_links
    }

    pub fn term_links_mut(&mut self) -> &mut Bag<TermLink> {
        &mut self.term_links
    }

    /// Returns the link that did not fit, if any.
    pub fn insert_task_link(&mut self, link: TaskLink) -> Option<TaskLink> {
        self.task_links.put_in(link)
    }

    pub fn insert_term_link(&mut self, link: TermLink) -> Option<TermLink> {
        self.term_links.put_in(link)
    }

    /// Newest first.
    pub fn beliefs(&self) -> &[Sentence] {
        &self.beliefs
    }

    pub fn questions(&self) -> &[Task] {
        &self.questions
    }

    /// File a belief at the front of the table. An identical sentence is
    /// moved to the front instead of duplicated. Returns false when it was
    /// already known.
    pub fn add_belief(&mut self, belief: Sentence) -> bool {
        let known = match self.beliefs.iter().position(|b| *b == belief) {
            Some(pos) => {
                self.beliefs.remove(pos);
                true
            }
            None => false,
        };
        self.beliefs.insert(0, belief);
        self.beliefs.truncate(self.belief_capacity);
        !known
    }

    /// Highest-confidence belief.
    pub fn best_belief(&self) -> Option<&Sentence> {
        self.beliefs.iter().max_by(|a, b| {
            let ca = a.truth.map_or(0.0, |t| t.confidence);
            let cb = b.truth.map_or(0.0, |t| t.confidence);
            ca.total_cmp(&cb)
        })
    }

    pub fn add_question(&mut self, question: Task) -> bool {
        if self.questions.iter().any(|q| q.key() == question.key()) {
            return false;
        }
        self.questions.insert(0, question);
        self.questions.truncate(self.question_capacity);
        true
    }
}

impl Item for Concept {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Truth;
    use crate::term::parse;

    fn concept(src: &str, config: &ReasonerConfig) -> Concept {
        let distributor = Arc::new(Distributor::new(config.bag_level));
        Concept::new(parse(src).unwrap(), config, distributor)
    }

    #[test]
    fn test_new_concept() {
        let config = ReasonerConfig::default();
        let c = concept("<bird --> animal>", &config);
        assert_eq!(c.key(), "<bird --> animal>");
        assert_eq!(c.priority(), INITIAL_CONCEPT_BUDGET);
        assert_eq!(c.templates().len(), 2);
        assert_eq!(c.task_links().capacity(), config.task_link_bag_size);
        assert_eq!(c.term_links().capacity(), config.term_link_bag_size);
        assert!(c.task_links().is_empty());
    }

    #[test]
    fn test_atom_concept_has_no_templates() {
        let c = concept("bird", &ReasonerConfig::default());
        assert!(c.templates().is_empty());
    }

    #[test]
    fn test_beliefs_bounded_newest_first() {
        let config = ReasonerConfig {
            belief_capacity: 2,
            ..Default::default()
        };
        let mut c = concept("<a --> b>", &config);
        let term = c.term().clone();
        for conf in [0.1, 0.2, 0.3] {
            assert!(c.add_belief(Sentence::judgment(term.clone(), Truth::new(1.0, conf))));
        }
        assert_eq!(c.beliefs().len(), 2);
        assert_eq!(c.beliefs()[0].truth.map(|t| t.confidence), Some(0.3));
        assert_eq!(c.best_belief().and_then(|b| b.truth).map(|t| t.confidence), Some(0.3));
    }

    #[test]
    fn test_duplicate_belief_not_repeated() {
        let mut c = concept("<a --> b>", &ReasonerConfig::default());
        let s = Sentence::judgment(c.term().clone(), Truth::default());
        assert!(c.add_belief(s.clone()));
        assert!(!c.add_belief(s));
        assert_eq!(c.beliefs().len(), 1);
    }

    #[test]
    fn test_questions_deduplicated() {
        let mut c = concept("<a --> b>", &ReasonerConfig::default());
        let q = Task::input(Sentence::question(c.term().clone()), Budget::new(0.9, 0.9, 1.0));
        assert!(c.add_question(q.clone()));
        assert!(!c.add_question(q));
        assert_eq!(c.questions().len(), 1);
    }
}
