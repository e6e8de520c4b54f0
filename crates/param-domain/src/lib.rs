// param-domain: nodos de dominio construidos sobre param-core
pub mod error;
pub mod instrument;
pub mod pulse;
pub mod sequence;

pub use error::DomainError;
pub use instrument::{SimulatedBackend, SimulatedInstrument};
pub use pulse::{Pulse, PulseBuilder};
pub use sequence::{PulseQuery, PulseSequence};
