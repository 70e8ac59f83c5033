pub mod emitter;

pub use emitter::{emit, Emitter, HEADER};
