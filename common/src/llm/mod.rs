pub mod gemini;
pub mod model;

pub use gemini::GeminiClient;
pub use model::TextGenerator;
