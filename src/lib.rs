pub mod catalog;
pub mod config;
pub mod error;
pub mod kernel;
pub mod nlu;
pub mod outputs;

// Re-export specific items for convenient access
pub use catalog::Catalogs;
pub use config::PolicyConfig;
pub use error::DialogError;
pub use kernel::{Action, Context, DialogManager};
pub use nlu::TurnPayload;
