pub mod familiar;
pub mod seed;
pub mod store;

pub use familiar::{Familiar, FamiliarPatch, NewFamiliar, Tally, Vote, LANE_COUNT};
pub use seed::seed_familiars;
pub use store::FamiliarStore;
