/// Number of discrete priority levels in every bag.
pub const BAG_LEVEL: usize = 100;

/// Levels below this yield one item per selection; levels at or above it
/// drain their whole content before the next selection.
pub const BAG_THRESHOLD: usize = 10;

/// Decay floor applied by `forget` on put-back.
pub const RELATIVE_THRESHOLD: f32 = 0.1;

/// Minimum budget for a task or split link budget to be accepted.
pub const BUDGET_THRESHOLD: f32 = 0.01;

/// Conventional expectation gate for novel judgments, used when
/// `creation_expectation` is set.
pub const CREATION_EXPECTATION: f32 = 0.66;

pub const CONCEPT_BAG_SIZE: usize = 1000;
pub const TASK_LINK_BAG_SIZE: usize = 20;
pub const TERM_LINK_BAG_SIZE: usize = 100;
pub const TASK_BUFFER_SIZE: usize = 10;

/// Forgetting rates, in cycles. Larger means slower decay.
pub const CONCEPT_FORGETTING_CYCLE: f32 = 10.0;
pub const TASK_LINK_FORGETTING_CYCLE: f32 = 20.0;
pub const TERM_LINK_FORGETTING_CYCLE: f32 = 50.0;
pub const NEW_TASK_FORGETTING_CYCLE: f32 = 1.0;

/// Term-links reasoned against one task-link per firing.
pub const MAX_REASONED_TERM_LINK: usize = 3;

/// Attempts at drawing a novel term-link before giving up.
pub const MAX_MATCHED_TERM_LINK: usize = 10;

/// How many recent term-link pairings a task-link remembers.
pub const TERM_LINK_RECORD_LENGTH: usize = 10;

/// Bound on the per-cycle new-task queue.
pub const NEW_TASK_QUEUE_SIZE: usize = 100;

pub const MAXIMUM_BELIEF_LENGTH: usize = 7;
pub const MAXIMUM_QUESTION_LENGTH: usize = 5;

/// Default truth for input judgments without an explicit truth value.
pub const DEFAULT_JUDGMENT_FREQUENCY: f32 = 1.0;
pub const DEFAULT_JUDGMENT_CONFIDENCE: f32 = 0.9;

/// Default budgets for input sentences, by punctuation.
pub const DEFAULT_JUDGMENT_PRIORITY: f32 = 0.8;
pub const DEFAULT_JUDGMENT_DURABILITY: f32 = 0.8;
pub const DEFAULT_QUESTION_PRIORITY: f32 = 0.9;
pub const DEFAULT_QUESTION_DURABILITY: f32 = 0.9;
pub const DEFAULT_GOAL_PRIORITY: f32 = 0.9;
pub const DEFAULT_GOAL_DURABILITY: f32 = 0.9;

/// Budget of a freshly created concept.
pub const INITIAL_CONCEPT_BUDGET: f32 = 0.01;

/// Average priority reported by an empty bag.
pub const EMPTY_BAG_PRIORITY: f32 = 0.01;

/// Deepest term nesting the parser accepts.
pub const MAX_TERM_DEPTH: usize = 256;
