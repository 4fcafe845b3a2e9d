//! Numeric parameters consumed by the reasoner. Plain data: the CLI loads
//! them from TOML, tests build them in code.

use serde::{Deserialize, Serialize};

use crate::bag::BagParams;
use crate::constants::*;
use crate::error::ConfigError;

/// Which bag a forgetting rate applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BagRole {
    Concepts,
    NovelTasks,
    TaskLinks,
    TermLinks,
}

impl BagRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concepts => "concepts",
            Self::NovelTasks => "novel_tasks",
            Self::TaskLinks => "task_links",
            Self::TermLinks => "term_links",
        }
    }

    pub fn from_str_lossy(s: &str) -> Option<Self> {
        match s {
            "concepts" | "concept" => Some(Self::Concepts),
            "novel_tasks" | "tasks" | "task_buffer" => Some(Self::NovelTasks),
            "task_links" => Some(Self::TaskLinks),
            "term_links" => Some(Self::TermLinks),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    pub concept_bag_size: usize,
    pub task_link_bag_size: usize,
    pub term_link_bag_size: usize,
    pub task_buffer_size: usize,

    pub concept_forgetting_cycle: f32,
    pub task_link_forgetting_cycle: f32,
    pub term_link_forgetting_cycle: f32,
    pub new_task_forgetting_cycle: f32,

    pub bag_level: usize,
    pub bag_threshold: usize,
    pub relative_threshold: f32,
    pub budget_threshold: f32,
    /// When set, only judgments whose truth expectation exceeds this value
    /// enter the novel-task buffer; other non-resident derived tasks are
    /// neglected. Unset buffers every non-resident derived task.
    pub creation_expectation: Option<f32>,

    pub max_reasoned_term_links: usize,
    pub max_matched_term_links: usize,
    pub term_link_record_length: usize,
    pub new_task_queue_size: usize,
    pub belief_capacity: usize,
    pub question_capacity: usize,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            concept_bag_size: CONCEPT_BAG_SIZE,
            task_link_bag_size: TASK_LINK_BAG_SIZE,
            term_link_bag_size: TERM_LINK_BAG_SIZE,
            task_buffer_size: TASK_BUFFER_SIZE,
            concept_forgetting_cycle: CONCEPT_FORGETTING_CYCLE,
            task_link_forgetting_cycle: TASK_LINK_FORGETTING_CYCLE,
            term_link_forgetting_cycle: TERM_LINK_FORGETTING_CYCLE,
            new_task_forgetting_cycle: NEW_TASK_FORGETTING_CYCLE,
            bag_level: BAG_LEVEL,
            bag_threshold: BAG_THRESHOLD,
            relative_threshold: RELATIVE_THRESHOLD,
            budget_threshold: BUDGET_THRESHOLD,
            creation_expectation: None,
            max_reasoned_term_links: MAX_REASONED_TERM_LINK,
            max_matched_term_links: MAX_MATCHED_TERM_LINK,
            term_link_record_length: TERM_LINK_RECORD_LENGTH,
            new_task_queue_size: NEW_TASK_QUEUE_SIZE,
            belief_capacity: MAXIMUM_BELIEF_LENGTH,
            question_capacity: MAXIMUM_QUESTION_LENGTH,
        }
    }
}

impl ReasonerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacities = [
            ("concept_bag_size", self.concept_bag_size),
            ("task_link_bag_size", self.task_link_bag_size),
            ("term_link_bag_size", self.term_link_bag_size),
            ("task_buffer_size", self.task_buffer_size),
            ("new_task_queue_size", self.new_task_queue_size),
            ("max_matched_term_links", self.max_matched_term_links),
            ("term_link_record_length", self.term_link_record_length),
            ("belief_capacity", self.belief_capacity),
            ("question_capacity", self.question_capacity),
        ];
        for (field, value) in capacities {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity(field));
            }
        }

        if self.bag_level == 0 {
            return Err(ConfigError::ZeroLevels);
        }
        if self.bag_threshold >= self.bag_level {
            return Err(ConfigError::ThresholdOutOfRange {
                threshold: self.bag_threshold,
                levels: self.bag_level,
            });
        }

        let rates = [
            ("concept_forgetting_cycle", self.concept_forgetting_cycle),
            ("task_link_forgetting_cycle", self.task_link_forgetting_cycle),
            ("term_link_forgetting_cycle", self.term_link_forgetting_cycle),
            ("new_task_forgetting_cycle", self.new_task_forgetting_cycle),
        ];
        for (field, value) in rates {
            validate_rate(field, value)?;
        }

        let unit = [
            ("relative_threshold", Some(self.relative_threshold)),
            ("budget_threshold", Some(self.budget_threshold)),
            ("creation_expectation", self.creation_expectation),
        ];
        for (field, value) in unit {
            if let Some(value) = value
                && !(0.0..=1.0).contains(&value)
            {
                return Err(ConfigError::NotUnitInterval(field, value));
            }
        }
        Ok(())
    }

    pub fn bag_params(&self) -> BagParams {
        BagParams {
            levels: self.bag_level,
            threshold: self.bag_threshold,
            relative_threshold: self.relative_threshold,
        }
    }

    pub fn forget_rate(&self, role: BagRole) -> f32 {
        match role {
            BagRole::Concepts => self.concept_forgetting_cycle,
            BagRole::NovelTasks => self.new_task_forgetting_cycle,
            BagRole::TaskLinks => self.task_link_forgetting_cycle,
            BagRole::TermLinks => self.term_link_forgetting_cycle,
        }
    }

    pub fn set_forget_rate(&mut self, role: BagRole, rate: f32) -> Result<(), ConfigError> {
        validate_rate(role.as_str(), rate)?;
        match role {
            BagRole::Concepts => self.concept_forgetting_cycle = rate,
            BagRole::NovelTasks => self.new_task_forgetting_cycle = rate,
            BagRole::TaskLinks => self.task_link_forgetting_cycle = rate,
            BagRole::TermLinks => self.term_link_forgetting_cycle = rate,
        }
        Ok(())
    }
}

fn validate_rate(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidForgetRate(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(ReasonerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = ReasonerConfig {
            task_buffer_size: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroCapacity("task_buffer_size"))
        );
    }

    #[test]
    fn test_zero_levels_rejected() {
        let config = ReasonerConfig {
            bag_level: 0,
            bag_threshold: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroLevels));
    }

    #[test]
    fn test_threshold_must_be_below_levels() {
        let config = ReasonerConfig {
            bag_level: 10,
            bag_threshold: 10,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn test_bad_forget_rate() {
        let mut config = ReasonerConfig::default();
        assert!(config.set_forget_rate(BagRole::TermLinks, 0.0).is_err());
        assert!(config.set_forget_rate(BagRole::TermLinks, f32::NAN).is_err());
        assert!(config.set_forget_rate(BagRole::TermLinks, 7.0).is_ok());
        assert_eq!(config.forget_rate(BagRole::TermLinks), 7.0);
    }

    #[test]
    fn test_partial_toml() {
        let config: ReasonerConfig = toml::from_str("concept_bag_size = 50\nbag_level = 20").unwrap();
        assert_eq!(config.concept_bag_size, 50);
        assert_eq!(config.bag_level, 20);
        assert_eq!(config.task_link_bag_size, TASK_LINK_BAG_SIZE);
        assert_eq!(config.creation_expectation, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_creation_expectation_gate() {
        let config: ReasonerConfig = toml::from_str("creation_expectation = 0.66").unwrap();
        assert_eq!(config.creation_expectation, Some(CREATION_EXPECTATION));
        assert!(config.validate().is_ok());

        let config = ReasonerConfig {
            creation_expectation: Some(1.5),
            ..ReasonerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotUnitInterval("creation_expectation", _))
        ));
    }

    #[test]
    fn test_role_names() {
        for role in [
            BagRole::Concepts,
            BagRole::NovelTasks,
            BagRole::TaskLinks,
            BagRole::TermLinks,
        ] {
            assert_eq!(BagRole::from_str_lossy(role.as_str()), Some(role));
        }
        assert_eq!(BagRole::from_str_lossy("nope"), None);
    }
}
