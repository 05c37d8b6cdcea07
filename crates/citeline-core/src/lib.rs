//! Citeline Core: identifiers, partial dates, configuration and errors.

pub mod config;
pub mod date;
pub mod error;
pub mod identifier;

pub use config::{CitelineConfig, CrossrefConfig, LayoutConfig};
pub use date::{PartialDate, PublicationDate, HALF_YEAR_MS};
pub use error::{Error, Result};
pub use identifier::Identifier;
