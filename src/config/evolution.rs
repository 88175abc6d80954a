use super::manager::Settings;
use super::traits::{reset_field, ConfigSection};
use crate::engines::generation::genome::Tree;
use crate::error::ChaseError;
use serde::{Deserialize, Serialize};

/// Shared schema for the pursued and pursuer populations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub mu: usize,
    pub lambda: usize,
    pub dmax_init: usize,
    pub dmax_overall: usize,
    pub mutation_rate: f64,
    pub parent_selection: ParentSelection,
    pub survival_selection: SurvivalSelection,
    pub parsimony: Parsimony,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentSelection {
    FitnessProportional,
    /// 80% of draws from the top `top` fraction, 20% from the rest.
    Overselection { top: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurvivalSelection {
    Truncation,
    KTournamentWithoutReplacement { tournament_size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsimonyTechnique {
    Size,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parsimony {
    pub technique: ParsimonyTechnique,
    pub coefficient: f64,
}

impl Parsimony {
    pub fn penalty(&self, tree: &Tree) -> f64 {
        let measure = match self.technique {
            ParsimonyTechnique::Size => tree.size(),
            ParsimonyTechnique::Height => tree.height(),
        };
        self.coefficient * measure as f64
    }
}

const DEFAULT_OVERSELECTION_TOP: f64 = 0.32;
const DEFAULT_TOURNAMENT_SIZE: usize = 4;

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            mu: 10,
            lambda: 5,
            dmax_init: 5,
            dmax_overall: 5,
            mutation_rate: 0.05,
            parent_selection: ParentSelection::FitnessProportional,
            survival_selection: SurvivalSelection::Truncation,
            parsimony: Parsimony {
                technique: ParsimonyTechnique::Size,
                coefficient: 0.05,
            },
        }
    }
}

impl ParentSelection {
    pub fn name(&self) -> &'static str {
        match self {
            ParentSelection::FitnessProportional => "fitness_proportional_selection",
            ParentSelection::Overselection { .. } => "overselection",
        }
    }

    fn from_settings(settings: &Settings, section: &str) -> Result<Self, ChaseError> {
        let default = PopulationConfig::default().parent_selection;
        let name: String = settings.get_or(section, "parent_selection", default.name().to_string());
        match name.trim().to_lowercase().as_str() {
            "fitness_proportional_selection" => Ok(ParentSelection::FitnessProportional),
            "overselection" => Ok(ParentSelection::Overselection {
                top: settings.get_or(section, "overselection_top", DEFAULT_OVERSELECTION_TOP),
            }),
            other => Err(ChaseError::UnknownMethod {
                setting: format!("{}.parent_selection", section),
                value: other.to_string(),
            }),
        }
    }
}

impl SurvivalSelection {
    pub fn name(&self) -> &'static str {
        match self {
            SurvivalSelection::Truncation => "truncation",
            SurvivalSelection::KTournamentWithoutReplacement { .. } => {
                "k_tournament_without_replacement"
            }
        }
    }

    fn from_settings(settings: &Settings, section: &str) -> Result<Self, ChaseError> {
        let default = PopulationConfig::default().survival_selection;
        let name: String =
            settings.get_or(section, "survival_selection", default.name().to_string());
        match name.trim().to_lowercase().as_str() {
            "truncation" => Ok(SurvivalSelection::Truncation),
            "k_tournament_without_replacement" => {
                Ok(SurvivalSelection::KTournamentWithoutReplacement {
                    tournament_size: settings.get_or(
                        section,
                        "tournament_size_for_survival_selection",
                        DEFAULT_TOURNAMENT_SIZE,
                    ),
                })
            }
            other => Err(ChaseError::UnknownMethod {
                setting: format!("{}.survival_selection", section),
                value: other.to_string(),
            }),
        }
    }
}

impl ParsimonyTechnique {
    pub fn name(&self) -> &'static str {
        match self {
            ParsimonyTechnique::Size => "size",
            ParsimonyTechnique::Height => "height",
        }
    }
}

impl Parsimony {
    fn from_settings(settings: &Settings, section: &str) -> Result<Self, ChaseError> {
        let default = PopulationConfig::default().parsimony;
        let name: String =
            settings.get_or(section, "parsimony_technique", default.technique.name().to_string());
        let technique = match name.trim().to_lowercase().as_str() {
            "size" => ParsimonyTechnique::Size,
            "height" => ParsimonyTechnique::Height,
            other => {
                return Err(ChaseError::UnknownMethod {
                    setting: format!("{}.parsimony_technique", section),
                    value: other.to_string(),
                })
            }
        };
        Ok(Parsimony {
            technique,
            coefficient: settings.get_or(section, "pppc", default.coefficient),
        })
    }
}

impl ConfigSection for PopulationConfig {
    fn section_name() -> &'static str {
        "population"
    }

    fn from_settings(settings: &Settings, section: &str) -> Result<Self, ChaseError> {
        let default = Self::default();
        Ok(Self {
            mu: settings.get_or(section, "mu", default.mu),
            lambda: settings.get_or(section, "lambda", default.lambda),
            dmax_init: settings.get_or(section, "dmax_init", default.dmax_init),
            dmax_overall: settings.get_or(section, "dmax_overall", default.dmax_overall),
            mutation_rate: settings.get_or(section, "p_m", default.mutation_rate),
            parent_selection: ParentSelection::from_settings(settings, section)?,
            survival_selection: SurvivalSelection::from_settings(settings, section)?,
            parsimony: Parsimony::from_settings(settings, section)?,
        })
    }

    fn repair(mut self, section: &str) -> Self {
        let default = Self::default();
        if self.mu == 0 {
            reset_field(section, "mu", &mut self.mu, default.mu, "must be at least 1");
        }
        if self.lambda == 0 {
            reset_field(section, "lambda", &mut self.lambda, default.lambda, "must be at least 1");
        }
        if self.dmax_init > self.dmax_overall {
            let cap = self.dmax_overall;
            reset_field(section, "dmax_init", &mut self.dmax_init, cap, "exceeds dmax_overall");
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            reset_field(
                section,
                "p_m",
                &mut self.mutation_rate,
                default.mutation_rate,
                "is not a probability",
            );
        }
        if let ParentSelection::Overselection { top } = &mut self.parent_selection {
            if !(*top > 0.0 && *top <= 1.0) {
                reset_field(
                    section,
                    "overselection_top",
                    top,
                    DEFAULT_OVERSELECTION_TOP,
                    "is not in (0, 1]",
                );
            }
        }
        if let SurvivalSelection::KTournamentWithoutReplacement { tournament_size } =
            &mut self.survival_selection
        {
            if *tournament_size == 0 {
                reset_field(
                    section,
                    "tournament_size_for_survival_selection",
                    tournament_size,
                    DEFAULT_TOURNAMENT_SIZE,
                    "must be at least 1",
                );
            }
        }
        if !self.parsimony.coefficient.is_finite() {
            reset_field(
                section,
                "pppc",
                &mut self.parsimony.coefficient,
                default.parsimony.coefficient,
                "is not finite",
            );
        }
        self
    }

    fn validate(&self) -> Result<(), ChaseError> {
        if self.mu == 0 {
            return Err(ChaseError::Configuration(
                "mu must be at least 1".to_string(),
            ));
        }
        if self.lambda == 0 {
            return Err(ChaseError::Configuration(
                "lambda must be at least 1".to_string(),
            ));
        }
        if self.dmax_init > self.dmax_overall {
            return Err(ChaseError::Configuration(format!(
                "dmax_init ({}) must not exceed dmax_overall ({})",
                self.dmax_init, self.dmax_overall
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ChaseError::Configuration(
                "Mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if let ParentSelection::Overselection { top } = self.parent_selection {
            if !(top > 0.0 && top <= 1.0) {
                return Err(ChaseError::Configuration(
                    "Overselection top must be in (0, 1]".to_string(),
                ));
            }
        }
        if let SurvivalSelection::KTournamentWithoutReplacement { tournament_size } =
            self.survival_selection
        {
            if tournament_size == 0 {
                return Err(ChaseError::Configuration(
                    "Tournament size must be at least 1".to_string(),
                ));
            }
        }
        if !self.parsimony.coefficient.is_finite() {
            return Err(ChaseError::Configuration(
                "Parsimony coefficient must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
