//! Wire protocol: the envelope every frame is carried in, the
//! opcode-specific payload shapes, and the error taxonomy handlers use
//! to decide between an ack, a warning, or closing the connection.

pub mod envelope;
pub mod error;
pub mod payloads;

pub use envelope::{ClientFrame, ServerFrame};
pub use error::SignalError;
pub use payloads::*;
