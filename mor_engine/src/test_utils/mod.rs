mod memory_gateway;
pub mod prepare_env;

pub use memory_gateway::InMemoryGateway;
