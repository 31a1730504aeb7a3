mod chat_error;
mod chat_request;
mod chat_response;

pub use chat_error::{OpenaiErrorBody, OpenaiErrorObject};
pub use chat_request::{OpenaiChatRequest, OpenaiMessage, ResponseFormat};
pub use chat_response::{OpenaiChatResponse, OpenaiChoice, OpenaiResponseMessage};
