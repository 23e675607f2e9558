pub mod agents;
pub mod chain;
pub mod config;
pub mod poster;
pub mod revision;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{AgentChain, ChainOutput};
pub use config::{PipelineConfig, RevisionPolicy, ScheduleConfig, SearchPolicy};
pub use poster::{AutoPoster, KeywordRun, RunOutcome, SkipReason, LANGUAGES};
pub use revision::{RevisionLoop, RevisionOutcome, RevisionState};

pub mod prelude {
    pub use super::agents::Draft;
    pub use super::{AgentChain, AutoPoster, PipelineConfig, RunOutcome, SkipReason};
    pub use bp_core::{BlogStorage, Error, Keyword, Language, Post, PostStatus, Publisher, Result};
}
