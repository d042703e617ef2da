pub mod analysis;
pub mod gateway;
pub mod generation;
pub mod wire;

pub use analysis::Analysis;
pub use gateway::AiGateway;
pub use generation::{familiar_prompt, placeholder_url, prompt_image_url, quote};
