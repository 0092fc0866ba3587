pub mod auth;
pub mod error;
pub mod state;

pub use auth::*;
pub use error::*;
pub use state::*;
