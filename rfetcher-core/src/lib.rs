pub mod config;
pub mod error;
pub mod filter;
pub mod flatten;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod types;

pub use config::*;
pub use error::*;
pub use filter::*;
pub use flatten::*;
pub use output::*;
pub use pipeline::*;
pub use source::*;
pub use types::*;
