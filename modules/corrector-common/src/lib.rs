pub mod config;
pub mod dictionary;
pub mod error;
pub mod profile;
pub mod types;

pub use config::{BotSettings, Config};
pub use dictionary::{ErrorDictionary, ErrorPair};
pub use error::CorrectorError;
pub use profile::BotProfile;
pub use types::{CandidateRecord, Engagement, ErrorMatch};
