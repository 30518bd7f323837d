pub mod gateway;
pub mod gemini;

pub use gateway::{GenerationBackend, GenerationError, GenerationGateway};
pub use gemini::{GeminiBackend, GeminiGateway};
