pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod matte;
pub mod outcome;
pub mod store;

// Convenience re-exports
pub use config::{GatewayConfig, Settings};
pub use error::{WorkshopError, WorkshopResult};
pub use gateway::{AiGateway, Analysis};
pub use http::{ImageFetcher, Transport, UreqClient};
pub use matte::{ImageSource, MatteEngine, MatteParams};
pub use outcome::{FallbackReason, Outcome};
pub use store::{Familiar, FamiliarPatch, FamiliarStore, NewFamiliar, Tally, Vote};
