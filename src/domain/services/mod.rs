pub mod actions;
mod chunk_decoder;
mod relay;
mod session;
mod transcript;

pub use chunk_decoder::*;
pub use relay::*;
pub use session::*;
pub use transcript::*;
