//! Skill-aware load balancing: picks the least-loaded qualified worker for a
//! (modality, skill) request and books the assignment.

mod balancer;
mod cascade;
mod config;
mod error;
mod filter;
mod ledger;
mod ranker;
mod types;
mod usage;
mod weight;

pub use balancer::{Balancer, WorkerLoad};
pub use cascade::{FallbackCascade, Level, ResolvedRequest, Selection};
pub use config::{BalancerConfig, Config, FallbackChain, FallbackStrategy, SpecialTask, TaskTarget};
pub use error::{ConfigError, EngineError};
pub use filter::{Candidate, CandidateFilter, Pools};
pub use ledger::{Ledger, Tally, WorkerLedger, WorkerSummary};
pub use ranker::{FairnessRanker, Phase, Ranked};
pub use types::{AssignRequest, Assignment, Roster, ShiftWindow, SkillValue, Worker};
pub use usage::{JsonlUsageLog, UsageSink};
pub use weight::WeightModel;
