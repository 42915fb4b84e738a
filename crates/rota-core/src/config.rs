//! Configuration for weighting, exclusions, fallback chains and balancing

use crate::error::ConfigError;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Order in which the fallback cascade walks skill and modality chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Skill chain inside the requested modality first, then overflow modalities
    #[default]
    SkillPriority,
    /// Overflow modalities for the requested skill first, then the skill chain
    ModalityPriority,
    /// Every reachable (skill, modality) ranked together
    PoolPriority,
}

/// Fallback chain for one skill or modality.
///
/// In JSON a chain is a list; a nested list is a parallel group whose members are
/// ranked together: `["Notfall", ["Normal", "Msk"]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ChainRepr", into = "ChainRepr")]
pub enum FallbackChain {
    Leaf(String),
    Sequential(Vec<FallbackChain>),
    Parallel(Vec<FallbackChain>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ChainRepr {
    Name(String),
    List(Vec<ChainRepr>),
}

impl From<ChainRepr> for FallbackChain {
    fn from(repr: ChainRepr) -> Self {
        fn build(repr: ChainRepr, parallel: bool) -> FallbackChain {
            match repr {
                ChainRepr::Name(name) => FallbackChain::Leaf(name),
                ChainRepr::List(items) => {
                    let children = items.into_iter().map(|s| build(s, !parallel)).collect();
                    if parallel {
                        FallbackChain::Parallel(children)
                    } else {
                        FallbackChain::Sequential(children)
                    }
                }
            }
        }

        match repr {
            ChainRepr::Name(name) => FallbackChain::Sequential(vec![FallbackChain::Leaf(name)]),
            list => build(list, false),
        }
    }
}

impl From<FallbackChain> for ChainRepr {
    fn from(chain: FallbackChain) -> Self {
        match chain {
            FallbackChain::Leaf(name) => ChainRepr::Name(name),
            FallbackChain::Sequential(children) | FallbackChain::Parallel(children) => {
                ChainRepr::List(children.into_iter().map(ChainRepr::from).collect())
            }
        }
    }
}

impl FallbackChain {
    pub fn sequence<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FallbackChain::Sequential(
            names
                .into_iter()
                .map(|n| FallbackChain::Leaf(n.into()))
                .collect(),
        )
    }

    pub fn parallel<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FallbackChain::Parallel(
            names
                .into_iter()
                .map(|n| FallbackChain::Leaf(n.into()))
                .collect(),
        )
    }

    /// Every name mentioned in the chain, in walk order
    pub fn leaves(&self) -> Vec<&str> {
        match self {
            FallbackChain::Leaf(name) => vec![name.as_str()],
            FallbackChain::Sequential(children) | FallbackChain::Parallel(children) => {
                children.iter().flat_map(|c| c.leaves()).collect()
            }
        }
    }

    /// Flatten into stages; names within one stage are ranked together
    pub fn stages(&self) -> Vec<Vec<String>> {
        match self {
            FallbackChain::Leaf(name) => vec![vec![name.clone()]],
            FallbackChain::Sequential(children) => {
                children.iter().flat_map(|c| c.stages()).collect()
            }
            FallbackChain::Parallel(_) => {
                let mut stage: Vec<String> = Vec::new();
                for leaf in self.leaves() {
                    if !stage.iter().any(|s| s == leaf) {
                        stage.push(leaf.to_string());
                    }
                }
                if stage.is_empty() {
                    Vec::new()
                } else {
                    vec![stage]
                }
            }
        }
    }
}

fn default_work_amount() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// One (skill, modality) combination a special task maps onto
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTarget {
    pub skill: String,
    pub modality: String,
}

impl TaskTarget {
    pub fn new(skill: impl Into<String>, modality: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            modality: modality.into(),
        }
    }
}

/// Named task that remaps a request and scales its work amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialTask {
    pub targets: Vec<TaskTarget>,
    #[serde(default = "default_work_amount")]
    pub work_amount: f64,
    /// When false the task never leaves its target pools
    #[serde(default = "default_true")]
    pub allow_overflow: bool,
}

fn default_imbalance_pct() -> f64 {
    30.0
}

fn default_min_work_hours() -> f64 {
    0.5
}

/// Settings for the fairness ranker and fallback cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancerConfig {
    #[serde(default)]
    pub strategy: FallbackStrategy,

    /// Weighted count every active worker reaches per skill before anyone overflows (0 = off)
    #[serde(default)]
    pub min_assignments_per_skill: u32,

    /// Pick counts as imbalanced above `mean * (1 + pct / 100)`
    #[serde(default = "default_imbalance_pct")]
    pub imbalance_threshold_pct: f64,

    /// Consult level 2 when the level 1 pick is imbalanced
    #[serde(default)]
    pub imbalance_fallback: bool,

    /// Floor for hours worked in the ratio denominator
    #[serde(default = "default_min_work_hours")]
    pub min_work_hours: f64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            strategy: FallbackStrategy::default(),
            min_assignments_per_skill: 0,
            imbalance_threshold_pct: default_imbalance_pct(),
            imbalance_fallback: false,
            min_work_hours: default_min_work_hours(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base weight per skill
    #[serde(default)]
    pub skill_weights: BTreeMap<String, f64>,

    /// Factor per modality (1.0 when absent)
    #[serde(default)]
    pub modality_factors: BTreeMap<String, f64>,

    /// skill -> modality -> weight, replacing `base * factor`
    #[serde(default)]
    pub weight_overrides: BTreeMap<String, BTreeMap<String, f64>>,

    /// Optional multipliers keyed by request code
    #[serde(default)]
    pub code_multipliers: BTreeMap<String, f64>,

    #[serde(default)]
    pub special_tasks: BTreeMap<String, SpecialTask>,

    /// skill -> skills that, when active, keep a worker out of the strict pool
    #[serde(default)]
    pub exclusions: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub skill_fallback: BTreeMap<String, FallbackChain>,

    #[serde(default)]
    pub modality_fallback: BTreeMap<String, FallbackChain>,

    #[serde(default)]
    pub balancer: BalancerConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration written by `rota init`: common reading skills on ct/mr/xray
    pub fn starter() -> Self {
        let mut config = Self::new();
        for (skill, weight) in [
            ("Normal", 1.0),
            ("Notfall", 1.1),
            ("Herz", 1.2),
            ("Msk", 0.8),
            ("Chest", 0.8),
        ] {
            config.skill_weights.insert(skill.to_string(), weight);
        }
        for (modality, factor) in [("ct", 1.0), ("mr", 1.2), ("xray", 0.33)] {
            config.modality_factors.insert(modality.to_string(), factor);
        }
        config
            .exclusions
            .insert("Herz".to_string(), vec!["Chest".to_string()]);
        config.skill_fallback.insert(
            "Herz".to_string(),
            FallbackChain::Sequential(vec![FallbackChain::parallel(["Notfall", "Normal"])]),
        );
        config
            .skill_fallback
            .insert("Notfall".to_string(), FallbackChain::sequence(["Normal"]));
        config
            .modality_fallback
            .insert("xray".to_string(), FallbackChain::sequence(["ct", "mr"]));
        config.balancer.min_assignments_per_skill = 3;
        config
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            what: "config",
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn modality_factor(&self, modality: &str) -> f64 {
        self.modality_factors.get(modality).copied().unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("skill weight", &self.skill_weights)?;
        check_non_negative("modality factor", &self.modality_factors)?;
        check_non_negative("code multiplier", &self.code_multipliers)?;
        for per_modality in self.weight_overrides.values() {
            check_non_negative("weight override", per_modality)?;
        }

        let referenced = self
            .weight_overrides
            .keys()
            .map(String::as_str)
            .chain(
                self.exclusions
                    .iter()
                    .flat_map(|(k, v)| std::iter::once(k.as_str()).chain(v.iter().map(String::as_str))),
            )
            .chain(
                self.skill_fallback
                    .iter()
                    .flat_map(|(k, chain)| std::iter::once(k.as_str()).chain(chain.leaves())),
            )
            .chain(
                self.special_tasks
                    .values()
                    .flat_map(|t| t.targets.iter().map(|target| target.skill.as_str())),
            );
        for skill in referenced {
            if !self.skill_weights.contains_key(skill) {
                return Err(ConfigError::MissingBaseWeight {
                    skill: skill.to_string(),
                });
            }
        }

        for (name, task) in &self.special_tasks {
            if task.targets.is_empty() {
                return Err(ConfigError::InvalidTask {
                    task: name.clone(),
                    reason: "no target (skill, modality) combinations".to_string(),
                });
            }
            if !task.work_amount.is_finite() || task.work_amount <= 0.0 {
                return Err(ConfigError::InvalidTask {
                    task: name.clone(),
                    reason: format!("work_amount must be positive, got {}", task.work_amount),
                });
            }
        }

        let pct = self.balancer.imbalance_threshold_pct;
        if !pct.is_finite() || pct < 0.0 {
            return Err(ConfigError::InvalidSetting {
                field: "imbalance_threshold_pct",
                value: pct,
            });
        }
        let floor = self.balancer.min_work_hours;
        if !floor.is_finite() || floor <= 0.0 {
            return Err(ConfigError::InvalidSetting {
                field: "min_work_hours",
                value: floor,
            });
        }

        check_acyclic("skill", &self.skill_fallback)?;
        check_acyclic("modality", &self.modality_fallback)?;
        Ok(())
    }
}

fn check_non_negative(what: &'static str, values: &BTreeMap<String, f64>) -> Result<(), ConfigError> {
    for (key, &value) in values {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidWeight {
                what,
                key: key.clone(),
                value,
            });
        }
    }
    Ok(())
}

fn check_acyclic<'a>(
    kind: &'static str,
    chains: &'a BTreeMap<String, FallbackChain>,
) -> Result<(), ConfigError> {
    let mut graph: DiGraph<&'a str, ()> = DiGraph::new();
    let mut nodes: HashMap<&'a str, NodeIndex> = HashMap::new();

    for (from, chain) in chains {
        let from_idx = *nodes
            .entry(from.as_str())
            .or_insert_with(|| graph.add_node(from.as_str()));
        for to in chain.leaves() {
            let to_idx = *nodes.entry(to).or_insert_with(|| graph.add_node(to));
            graph.add_edge(from_idx, to_idx, ());
        }
    }

    toposort(&graph, None)
        .map(|_| ())
        .map_err(|cycle| ConfigError::CyclicFallback {
            kind,
            node: graph[cycle.node_id()].to_string(),
        })
}
