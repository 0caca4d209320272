//! WiFi association and broker session management

pub mod deferred;
pub mod manager;
pub mod queue;
pub mod state;

pub use deferred::{Deferred, DeferredPublishes, PublishOutbox};
pub use manager::{ConnectionManager, Delivery, SharedLink, Subscription};
pub use queue::{OfflineQueue, QueueOutcome, QueuedMessage};
pub use state::{ConnectionState, LinkPhase};
