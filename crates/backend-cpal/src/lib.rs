// wavdeck audio backend: symphonia decoding, cpal output

pub mod backend;
pub mod clip;
pub mod decoder;
pub mod notifier;

pub use backend::CpalBackend;
pub use clip::{ClipCursor, DecodedClip, RenderOutcome};
pub use decoder::decode_file;
pub use notifier::Notifier;
