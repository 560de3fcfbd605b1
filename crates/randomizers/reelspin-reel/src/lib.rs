//! Slot-machine reels: a per-column state machine that lands a pre-chosen
//! item exactly, staggered multi-column sequences, restartable orchestration
//! and multi-spin sessions.

pub mod config;
pub mod orchestrator;
pub mod reel;
pub mod sequence;
pub mod session;
pub mod strip;

pub use config::{PhysicsConfig, TimingProfile};
pub use orchestrator::SpinOrchestrator;
pub use reel::{ReelPhase, ReelSnapshot, ReelState};
pub use sequence::{ColumnSpec, ReelEvent, SequenceSnapshot, SpinSequence};
pub use session::{SessionEvent, SessionState, SpinSession};
