//! Port for the static agent contract registry.

use crate::domain::models::AgentContract;

/// Read-only registry of agent contracts. Loaded once at startup;
/// the engine never writes through this port.
pub trait ContractRegistry: Send + Sync {
    /// Contract for an agent id, if registered.
    fn get(&self, agent_id: &str) -> Option<AgentContract>;

    /// Whether an agent id is registered.
    fn contains(&self, agent_id: &str) -> bool {
        self.get(agent_id).is_some()
    }

    /// All registered contracts, ordered by id.
    fn all(&self) -> Vec<AgentContract>;
}
