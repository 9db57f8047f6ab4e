//! SMS send module: resolution, splitting, delivery tracking and dispatch.
//!
//! CHANGELOG:
//! - 03/02/2026 - Initial module structure

pub mod history;
pub mod orchestrator;
pub mod resolver;
pub mod splitter;
pub mod tracker;
pub mod transport;

pub use orchestrator::SmsDispatchOrchestrator;
pub use tracker::{CallbackToken, CommandId, CorrelationKey, DeliveryTracker, EventKind};
