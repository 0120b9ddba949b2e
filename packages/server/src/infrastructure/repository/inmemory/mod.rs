//! In-memory implementations (state is lost on restart).

mod participant_registry;

pub use participant_registry::InMemoryParticipantRegistry;
