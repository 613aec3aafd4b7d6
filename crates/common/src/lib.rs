pub mod envelope;
pub mod types;

pub use envelope::Envelope;
pub use types::{Payload, ResourceId, SagaId};
