mod process;
pub mod types;

pub use process::InActionProcess;
pub use types::ProcessOutcome;
