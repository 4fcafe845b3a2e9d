//! Reasoner context: every bag and queue one reasoner owns.
//!
//! Attention enters through [`Memory::immediate_process`], which activates a
//! task's concept and then spreads the task along the concept's templates as
//! task-links and term-links. Budgets are split across templates on the way
//! down; once a split share falls under `budget_threshold` spreading stops.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::bag::Bag;
use crate::budget::{self, Budget};
use crate::concept::Concept;
use crate::config::{BagRole, ReasonerConfig};
use crate::distributor::Distributor;
use crate::error::ConfigError;
use crate::inference::{Derivations, Inference};
use crate::item::Item;
use crate::link::{LinkType, TaskLink, TermLink};
use crate::report::{Report, ReportKind};
use crate::task::Task;
use crate::term::Term;

pub struct Memory {
    config: ReasonerConfig,
    distributor: Arc<Distributor>,
    concepts: Bag<Concept>,
    novel_tasks: Bag<Task>,
    new_tasks: VecDeque<Task>,
    reports: Vec<Report>,
    clock: u64,
}

impl Memory {
    pub fn new(config: ReasonerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let distributor = Arc::new(Distributor::new(config.bag_level));
        let params = config.bag_params();
        Ok(Self {
            concepts: Bag::new(
                config.concept_bag_size,
                config.forget_rate(BagRole::Concepts),
                params,
                Arc::clone(&distributor),
            ),
            novel_tasks: Bag::new(
                config.task_buffer_size,
                config.forget_rate(BagRole::NovelTasks),
                params,
                Arc::clone(&distributor),
            ),
            new_tasks: VecDeque::new(),
            reports: Vec::new(),
            clock: 0,
            distributor,
            config,
        })
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub(crate) fn tick(&mut self) {
        self.clock += 1;
    }

    pub fn concepts(&self) -> &Bag<Concept> {
        &self.concepts
    }

    pub(crate) fn concepts_mut(&mut self) -> &mut Bag<Concept> {
        &mut self.concepts
    }

    pub fn novel_tasks(&self) -> &Bag<Task> {
        &self.novel_tasks
    }

    pub(crate) fn novel_tasks_mut(&mut self) -> &mut Bag<Task> {
        &mut self.novel_tasks
    }

    /// Tasks waiting for the next intake phase, oldest first.
    pub fn new_tasks(&self) -> &VecDeque<Task> {
        &self.new_tasks
    }

    pub(crate) fn pop_new_task(&mut self) -> Option<Task> {
        self.new_tasks.pop_front()
    }

    pub fn term_to_concept(&self, term: &Term) -> Option<&Concept> {
        self.concepts.peek(&term.name())
    }

    /// Fetch the concept for `term`, creating it when absent. `None` when a
    /// new concept could not win a place in a full concept bag.
    pub fn get_concept(&mut self, term: &Term) -> Option<&mut Concept> {
        let key = term.name();
        if !self.concepts.contains(&key) {
            let concept = Concept::new(term.clone(), &self.config, Arc::clone(&self.distributor));
            if let Some(out) = self.concepts.put_in(concept) {
                if out.key() == key {
                    return None;
                }
                tracing::debug!(concept = out.key(), "concept forgotten");
            }
        }
        self.concepts.get_mut(&key)
    }

    /// Pick the concept out, raise its budget, and put it in again. A term
    /// without a concept gets a fresh one with the activation already applied.
    /// Returns whether the concept is resident afterwards.
    pub fn activate_concept(&mut self, term: &Term, incoming: &Budget) -> bool {
        let key = term.name();
        let mut concept = match self.concepts.pick_out(&key) {
            Some(concept) => concept,
            None => Concept::new(term.clone(), &self.config, Arc::clone(&self.distributor)),
        };
        budget::activate(concept.budget_mut(), incoming);
        match self.concepts.put_in(concept) {
            Some(out) if out.key() == key => {
                tracing::debug!(concept = %key, "activation lost against full concept bag");
                false
            }
            Some(out) => {
                tracing::debug!(concept = out.key(), "concept forgotten");
                true
            }
            None => true,
        }
    }

    /// Activate the task's concept, run the direct inference step, then
    /// spread the task if its budget is still above threshold.
    pub fn immediate_process(&mut self, mut task: Task, inference: &mut impl Inference) {
        tracing::trace!(task = task.key(), "immediate process");
        let content = task.content().clone();
        if !self.activate_concept(&content, task.budget()) {
            tracing::debug!(task = task.key(), "neglected, no concept");
            return;
        }
        let key = content.name();
        let mut out = Derivations::new(self.clock);
        if let Some(concept) = self.concepts.get_mut(&key) {
            inference.direct_process(concept, &mut task, &mut out);
        }
        if task.budget().above_threshold(self.config.budget_threshold) {
            self.link_to_task(&key, task);
        }
        self.absorb(out);
    }

    /// Insert the task's self link into concept `key`, then a split share of
    /// it into every component concept, then build term-links.
    pub fn link_to_task(&mut self, key: &str, task: Task) {
        let threshold = self.config.budget_threshold;
        let task_budget = *task.budget();
        let Some(concept) = self.concepts.get_mut(key) else {
            return;
        };
        let templates = concept.templates().to_vec();
        concept.insert_task_link(TaskLink::new(task.clone(), None, task_budget));

        if templates.is_empty() {
            return;
        }
        let share = budget::distribute(&task_budget, templates.len());
        if share.priority() < threshold {
            tracing::debug!(concept = key, share = share.priority(), "task-link budget too thin");
            return;
        }
        for template in &templates {
            if task.is_structural() && template.link_type == LinkType::Transform {
                continue;
            }
            if let Some(component) = self.get_concept(&template.target) {
                component.insert_task_link(TaskLink::new(task.clone(), Some(template), share));
            }
        }
        self.build_term_links(key, &task_budget);
    }

    /// Link concept `key` with each of its non-transform components in both
    /// directions, and recurse into compound components.
    pub fn build_term_links(&mut self, key: &str, incoming: &Budget) {
        let threshold = self.config.budget_threshold;
        let Some(concept) = self.concepts.peek(key) else {
            return;
        };
        let term = concept.term().clone();
        let templates = concept.templates().to_vec();
        if templates.is_empty() {
            return;
        }
        let share = budget::distribute(incoming, templates.len());
        if share.priority() < threshold {
            return;
        }
        for template in templates {
            if template.link_type == LinkType::Transform {
                continue;
            }
            let Some(component) = self.get_concept(&template.target) else {
                continue;
            };
            component.insert_term_link(TermLink::from_template(term.clone(), &template, share));
            if let Some(concept) = self.concepts.get_mut(key) {
                concept.insert_term_link(TermLink::from_template(
                    template.target.clone(),
                    &template,
                    share,
                ));
            }
            if template.target.is_compound() {
                self.build_term_links(&template.target.name(), &share);
            }
        }
    }

    /// Accept a derivation into the new-task queue, or drop it when its
    /// budget is under threshold.
    pub fn derived_task(&mut self, task: Task) {
        if !task.budget().above_threshold(self.config.budget_threshold) {
            tracing::debug!(task = task.key(), "neglected, budget under threshold");
            return;
        }
        self.reports
            .push(Report::new(ReportKind::Out, task.sentence().to_string(), self.clock));
        self.push_new_task(task);
    }

    pub(crate) fn push_input(&mut self, task: Task) {
        self.reports
            .push(Report::new(ReportKind::In, task.sentence().to_string(), self.clock));
        self.push_new_task(task);
    }

    fn push_new_task(&mut self, task: Task) {
        if self.new_tasks.len() >= self.config.new_task_queue_size {
            if let Some(dropped) = self.new_tasks.pop_front() {
                tracing::warn!(task = dropped.key(), "new-task queue full, oldest dropped");
            }
        }
        self.new_tasks.push_back(task);
    }

    /// Fire concept `key`: select one task-link and reason it against up to
    /// `max_reasoned_term_links` novel term-links.
    pub(crate) fn fire(&mut self, key: &str, inference: &mut impl Inference) {
        let clock = self.clock;
        let max_reasoned = self.config.max_reasoned_term_links;
        let max_matched = self.config.max_matched_term_links;
        let record_length = self.config.term_link_record_length;

        let Some(mut task_link) = self
            .concepts
            .get_mut(key)
            .and_then(|c| c.task_links_mut().take_out())
        else {
            return;
        };
        tracing::trace!(concept = key, task_link = task_link.key(), "fire");
        let mut out = Derivations::new(clock);

        if task_link.link_type() == LinkType::Transform {
            if let Some(concept) = self.concepts.peek(key) {
                inference.transform(concept, &task_link, &mut out);
            }
        } else {
            let mut reasoned = 0;
            while reasoned < max_reasoned && !out.has_tasks() {
                let Some(term_link) = self.concepts.get_mut(key).and_then(|c| {
                    c.term_links_mut()
                        .take_out_where(max_matched, |tl| task_link.novel(tl, clock, record_length))
                }) else {
                    break;
                };
                if let Some(concept) = self.concepts.peek(key) {
                    let belief_concept = self.concepts.peek(&term_link.target().name());
                    inference.reason(concept, &task_link, &term_link, belief_concept, &mut out);
                }
                if let Some(concept) = self.concepts.get_mut(key) {
                    concept.term_links_mut().put_back(term_link);
                }
                reasoned += 1;
            }
        }

        if let Some(concept) = self.concepts.get_mut(key) {
            concept.task_links_mut().put_back(task_link);
        }
        self.absorb(out);
    }

    fn absorb(&mut self, out: Derivations) {
        let (tasks, reports, activations) = out.into_parts();
        self.reports.extend(reports);
        for (term, incoming) in activations {
            self.activate_concept(&term, &incoming);
        }
        for task in tasks {
            self.derived_task(task);
        }
    }

    pub fn drain_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }

    pub(crate) fn set_forget_rate(&mut self, role: BagRole, rate: f32) -> Result<(), ConfigError> {
        self.config.set_forget_rate(role, rate)?;
        match role {
            BagRole::Concepts => self.concepts.set_forget_rate(rate),
            BagRole::NovelTasks => self.novel_tasks.set_forget_rate(rate),
            BagRole::TaskLinks => self
                .concepts
                .for_each_mut(|c| c.task_links_mut().set_forget_rate(rate)),
            BagRole::TermLinks => self
                .concepts
                .for_each_mut(|c| c.term_links_mut().set_forget_rate(rate)),
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.concepts.clear();
        self.novel_tasks.clear();
        self.new_tasks.clear();
        self.reports.clear();
        self.clock = 0;
    }
}
