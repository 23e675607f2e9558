pub mod error;
pub mod models;
pub mod publish;
pub mod storage;
pub mod time;
pub mod types;

pub use error::{ApiError, Error};
pub use models::LanguageModel;
pub use publish::{PublishRequest, Publisher};
pub use storage::BlogStorage;
pub use types::*;

pub type Result<T> = std::result::Result<T, Error>;
