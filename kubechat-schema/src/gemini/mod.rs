mod generate_error;
mod generate_request;
mod generate_response;

pub use generate_error::{GeminiErrorBody, GeminiErrorObject};
pub use generate_request::{Content, GeminiGenerateRequest, GenerationConfig, Part};
pub use generate_response::{Candidate, GeminiGenerateResponse};
