//! Attention-propagation edges: term-links between related concepts and
//! task-links from a concept to a pending task.
//!
//! Link types are named from the point of view of the concept holding the
//! link. `Component*` links sit at the compound and point down to a
//! component; `Compound*` links sit at the component and point up.

use std::collections::VecDeque;

use crate::budget::Budget;
use crate::item::Item;
use crate::task::Task;
use crate::term::{Operator, Term};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkType {
    /// At C, point to C. Task-links only.
    SelfLink,
    /// At (&&, A, C), point to C.
    Component,
    /// At C, point to (&&, A, C).
    Compound,
    /// At <C --> A>, point to C.
    ComponentStatement,
    /// At C, point to <C --> A>.
    CompoundStatement,
    /// At <(&&, C, B) ==> A>, point to C.
    ComponentCondition,
    /// At C, point to <(&&, C, B) ==> A>.
    CompoundCondition,
    /// At C, point to <(*, C, B) --> A>. Task-links only.
    Transform,
}

impl LinkType {
    fn marker(&self) -> &'static str {
        match self {
            Self::SelfLink => "_",
            Self::Component => "@c",
            Self::Compound => "#c",
            Self::ComponentStatement => "@s",
            Self::CompoundStatement => "#s",
            Self::ComponentCondition => "@k",
            Self::CompoundCondition => "#k",
            Self::Transform => "#t",
        }
    }

    /// The downward counterpart of an upward link type.
    pub fn toward_component(self) -> Self {
        match self {
            Self::Compound => Self::Component,
            Self::CompoundStatement => Self::ComponentStatement,
            Self::CompoundCondition => Self::ComponentCondition,
            other => other,
        }
    }
}

/// Where a component sits inside a compound, prepared once per compound
/// concept and reused every time it propagates attention.
#[derive(Clone, Debug, PartialEq)]
pub struct TermLinkTemplate {
    pub target: Term,
    pub link_type: LinkType,
    pub index: Vec<usize>,
}

impl TermLinkTemplate {
    fn new(target: &Term, link_type: LinkType, index: Vec<usize>) -> Self {
        Self {
            target: target.clone(),
            link_type,
            index,
        }
    }
}

fn is_product(term: &Term) -> bool {
    term.operator() == Some(Operator::Product)
}

fn is_condition_container(term: &Term) -> bool {
    matches!(
        term.operator(),
        Some(Operator::Conjunction) | Some(Operator::Negation)
    )
}

/// Templates for every constant component a compound links to: direct
/// components, their components, and product members inside statements as
/// transform links.
pub fn prepare_templates(term: &Term) -> Vec<TermLinkTemplate> {
    let mut out = Vec::new();
    if !term.is_compound() {
        return out;
    }
    let link_type = if term.operator().is_some_and(|op| op.is_statement()) {
        LinkType::CompoundStatement
    } else {
        LinkType::Compound
    };
    collect_templates(term, link_type, &[], &mut out);
    out
}

fn collect_templates(
    term: &Term,
    link_type: LinkType,
    prefix: &[usize],
    out: &mut Vec<TermLinkTemplate>,
) {
    let conditional = matches!(
        term.operator(),
        Some(Operator::Equivalence) | Some(Operator::Implication)
    );
    for (i, t1) in term.components().iter().enumerate() {
        let mut idx = prefix.to_vec();
        idx.push(i);
        if t1.is_constant() {
            out.push(TermLinkTemplate::new(t1, link_type, idx.clone()));
        }
        let is_antecedent = term.operator() == Some(Operator::Equivalence)
            || (term.operator() == Some(Operator::Implication) && i == 0);
        if conditional && is_antecedent && is_condition_container(t1) {
            collect_templates(t1, LinkType::CompoundCondition, &idx, out);
            continue;
        }
        for (j, t2) in t1.components().iter().enumerate() {
            let mut idx2 = idx.clone();
            idx2.push(j);
            if t2.is_constant() {
                let ty = if is_product(t1) {
                    LinkType::Transform
                } else {
                    link_type
                };
                out.push(TermLinkTemplate::new(t2, ty, idx2.clone()));
            }
            if is_product(t2) {
                for (k, t3) in t2.components().iter().enumerate() {
                    if t3.is_constant() {
                        let mut idx3 = idx2.clone();
                        idx3.push(k);
                        out.push(TermLinkTemplate::new(t3, LinkType::Transform, idx3));
                    }
                }
            }
        }
    }
}

fn index_tag(index: &[usize]) -> String {
    if index.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = index.iter().map(|i| i.to_string()).collect();
    format!("({})", parts.join("-"))
}

#[derive(Clone, Debug)]
pub struct TermLink {
    key: String,
    target: Term,
    link_type: LinkType,
    index: Vec<usize>,
    budget: Budget,
}

impl TermLink {
    pub fn new(target: Term, link_type: LinkType, index: Vec<usize>, budget: Budget) -> Self {
        let key = format!("{}{} {}", link_type.marker(), index_tag(&index), target);
        Self {
            key,
            target,
            link_type,
            index,
            budget,
        }
    }

    /// Build from a template. When `target` is the template's own component
    /// the link points down (held by the compound); otherwise it points up
    /// (held by the component, targeting the compound).
    pub fn from_template(target: Term, template: &TermLinkTemplate, budget: Budget) -> Self {
        let link_type = if target == template.target {
            template.link_type.toward_component()
        } else {
            template.link_type
        };
        Self::new(target, link_type, template.index.clone(), budget)
    }

    pub fn target(&self) -> &Term {
        &self.target
    }

    pub fn link_type(&self) -> LinkType {
        self.link_type
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }
}

impl Item for TermLink {
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

#[derive(Clone, Debug)]
pub struct TaskLink {
    key: String,
    task: Task,
    link_type: LinkType,
    index: Vec<usize>,
    budget: Budget,
    recorded: VecDeque<(String, u64)>,
}

impl TaskLink {
    /// Without a template the link is the task's own concept's self link.
    pub fn new(task: Task, template: Option<&TermLinkTemplate>, budget: Budget) -> Self {
        let (link_type, index) = match template {
            Some(t) => (t.link_type, t.index.clone()),
            None => (LinkType::SelfLink, Vec::new()),
        };
        let key = format!("{}{} {}", link_type.marker(), index_tag(&index), task.key());
        Self {
            key,
            task,
            link_type,
            index,
            budget,
            recorded: VecDeque::new(),
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn link_type(&self) -> LinkType {
        self.link_type
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Whether pairing this task-link with `term_link` at `clock` would be
    /// new. A pairing seen within the last `record_length` cycles is stale.
    /// A term-link back to the task's own content is never novel.
    pub fn novel(&mut self, term_link: &TermLink, clock: u64, record_length: usize) -> bool {
        if term_link.target() == self.task.content() {
            return false;
        }
        let key = term_link.key();
        if let Some(entry) = self.recorded.iter_mut().find(|(k, _)| k == key) {
            if clock < entry.1 + record_length as u64 {
                return false;
            }
            entry.1 = clock;
            return true;
        }
        if self.recorded.len() >= record_length {
            self.recorded.pop_front();
        }
        self.recorded.push_back((key.to_string(), clock));
        true
    }
}

impl Item for TaskLink {
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
