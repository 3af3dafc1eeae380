//! Concrete build actions.
//!
//! Actions that start subprocesses go through [`InActionProcess`] and so
//! suspend while the process streams; the file actions finish without
//! suspending.
//!
//! [`InActionProcess`]: crate::runner::InActionProcess

mod command;
mod copy_file;
mod docker;
mod group;
mod kustomize;
mod noop;
mod put_file;
mod runtime_config;

pub use command::RunCommand;
pub use copy_file::CopyFile;
pub use docker::BuildDockerImage;
pub use group::Group;
pub use kustomize::KustomizeApply;
pub use noop::NoOp;
pub use put_file::{FileContent, PutFile};
pub use runtime_config::{PutRuntimeConfiguration, Settings};
