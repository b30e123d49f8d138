//! # danci-scheduler - vocabulary review scheduler
//!
//! Pure, synchronous scheduling core for the word-learning flow:
//!
//! - **Stage Policy** - five-stage ladder `passive → active → review1 → review2 → review3`
//! - **Scheduler** - applies an answer to a word and computes its next show time
//! - **Queue Query Engine** - available/overdue/next-card queries and statistics
//! - **Session** - owns the learning state, snapshots, analytics
//!
//! ## Module structure
//!
//! - [`scheduler`] - stage transitions, retry delay, item creation
//! - [`queue`] - read-only queue queries and selection priority
//! - [`session`] - session state manager, clock, export/import
//! - [`sanitize`] - item validation and defensive state coercion
//! - [`storage`] - persistence collaborators
//! - [`vocabulary`] - vocabulary collaborator
//! - [`config`] - thresholds and delays
//! - [`types`] - shared types and constants
//!
//! ## Example
//!
//! ```rust
//! use danci_scheduler::{CardResponse, LearningSession, ManualClock, SchedulerConfig, Stage};
//!
//! let mut session = LearningSession::new(SchedulerConfig::default(), ManualClock::new(0));
//! session.add_word(42).unwrap();
//! for t in 1..=3 {
//!     session.submit_response(&CardResponse::new(42, true, t)).unwrap();
//! }
//! assert_eq!(session.state().learning_queue[0].stage, Stage::Active);
//! assert!(session.next_item().is_none());
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod logging;
pub mod queue;
pub mod sanitize;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod types;
pub mod vocabulary;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use config::{SchedulerConfig, StageDelays};
pub use error::SchedulerError;
pub use sanitize::{validate_item, ItemValidation};
pub use scheduler::{apply_response, create_item, next_stage, previous_stage, ResponseOutcome};
pub use session::{Clock, LearningAnalytics, LearningSession, LearningState, ManualClock, SystemClock};
pub use storage::{JsonFileStore, MemoryStore, StateStore};
pub use vocabulary::{InMemoryVocabulary, Vocabulary, WordData};
