pub mod agent;
pub mod capability;
pub mod knowledge;

pub use agent::{mask_key, Agent, AgentResponse, CreateAgentRequest, UpdateAgentRequest};
pub use capability::{
    Capability, CapabilityParameter, CapabilityResponse, CreateCapabilityRequest,
    UpdateCapabilityRequest,
};
pub use knowledge::{CreateKnowledgeRequest, KnowledgeEntry, VerificationInfo};
