//! Orchestration core: decision/conversation stages, action registry,
//! remote execution correlator, and the per-session orchestrator.

pub mod backend;
pub mod channel;
pub mod correlator;
pub mod orchestrator;
pub mod registry;
pub mod stage;

pub use backend::{BackendReply, ChatBackend, MockChatBackend, RigChatBackend};
pub use channel::{spawn_result_router, MpscPeerChannel, PeerChannel};
pub use correlator::RemoteCorrelator;
pub use orchestrator::SessionOrchestrator;
pub use registry::{ActionRegistry, LocalAction};
pub use stage::{ConversationStage, DecisionStage};
