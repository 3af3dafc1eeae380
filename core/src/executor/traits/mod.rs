mod action;
mod observer;

pub use action::Action;
pub use observer::{ExecutionEvent, ExecutionObserver};
