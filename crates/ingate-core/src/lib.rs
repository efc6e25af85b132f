// ingate-core - pipeline-facing contracts
//
// The record value type, the delivery/admission error taxonomy and the sink
// contract. No I/O and no runtime dependencies; everything that moves
// through the pipeline is defined here.

pub mod error;
pub mod record;
pub mod sink;

pub use error::{DeliveryError, QueueFullError};
pub use record::Record;
pub use sink::Sink;
