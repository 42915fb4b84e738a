//! Cost of a single assignment

use crate::config::{Config, SpecialTask};
use crate::error::ConfigError;
use crate::types::{SkillValue, Worker};

/// Computes weights from a [`Config`]. Pure: the same inputs always give the same weight.
#[derive(Debug, Clone, Copy)]
pub struct WeightModel<'a> {
    config: &'a Config,
}

impl<'a> WeightModel<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// `skill_weight * modality_factor`, unless an override exists for the pair
    pub fn base(&self, skill: &str, modality: &str) -> Result<f64, ConfigError> {
        if let Some(&value) = self
            .config
            .weight_overrides
            .get(skill)
            .and_then(|per_modality| per_modality.get(modality))
        {
            return Ok(value);
        }

        let skill_weight = self.config.skill_weights.get(skill).copied().ok_or_else(|| {
            ConfigError::MissingBaseWeight {
                skill: skill.to_string(),
            }
        })?;
        Ok(skill_weight * self.config.modality_factor(modality))
    }

    /// Weight booked against `worker` for one assignment.
    ///
    /// The base weight is scaled by the task's work amount and the code multiplier, then
    /// divided by the worker's effective modifier: a modifier of 0.5 books twice the
    /// weight. Skills marked `"w"` use the personal weighted modifier.
    pub fn weight(
        &self,
        skill: &str,
        modality: &str,
        worker: &Worker,
        task: Option<&SpecialTask>,
        code: Option<&str>,
    ) -> Result<f64, ConfigError> {
        let mut weight = self.base(skill, modality)?;

        if let Some(task) = task {
            weight *= task.work_amount;
        }

        if let Some(code) = code {
            weight *= self.config.code_multipliers.get(code).copied().unwrap_or(1.0);
        }

        let value = worker.skill_value(modality, skill);
        let modifier = worker.effective_modifier(value);
        if !modifier.is_finite() || modifier <= 0.0 {
            let field = match value {
                Some(SkillValue::Weighted) if worker.weighted_modifier.is_some() => {
                    "weighted_modifier"
                }
                _ => "modifier",
            };
            return Err(ConfigError::InvalidModifier {
                worker: worker.id.clone(),
                field,
                value: modifier,
            });
        }

        Ok(weight / modifier)
    }
}
