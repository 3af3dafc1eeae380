#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;

pub use error::{ActionError, ArtifactError, DefinitionError, ProcessError};
pub use executor::ExecutorError;
