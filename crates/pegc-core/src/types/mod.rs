mod config;
mod error;

pub use config::PegConfig;
pub use error::{PegcError, PegcResult};
