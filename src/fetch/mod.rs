pub mod browser;
pub mod error;

pub use browser::{BrowserSession, SessionConfig};
pub use error::FetchError;
