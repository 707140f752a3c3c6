pub mod experience;
pub mod signal;
pub mod verdict;

pub use experience::{ExecutionQuality, ExperienceRecord};
pub use signal::{CandidateSignal, DayScope, Direction, SetupKind};
pub use verdict::{ConfidenceReport, RiskLevel, Verdict};
