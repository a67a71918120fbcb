pub mod agent;
pub mod channel;
pub mod swarm;

pub use agent::{Agent, AgentSettings};
pub use channel::{AgentId, BroadcastChannel, Envelope, Publish, Receipt};
pub use swarm::Swarm;
