pub mod error;

pub use error::{json_text_response, AppError};
