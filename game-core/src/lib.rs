pub mod cleanup;
pub mod context;
pub mod game_events;
pub mod game_state;
pub mod lobby;
pub mod pairing;
pub mod registry;
pub mod room;
pub mod scoring;
pub mod timer;
pub mod user;
pub mod word_validation;

// Re-export main components
pub use cleanup::*;
pub use context::*;
pub use game_events::*;
pub use game_state::*;
pub use lobby::*;
pub use pairing::*;
pub use registry::*;
pub use room::*;
pub use scoring::*;
pub use timer::*;
pub use user::*;
pub use word_validation::*;
