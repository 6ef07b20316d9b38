//! Client side of the task list: an HTTP gateway to the task API, the
//! view-model that drives a single list, and the markup it renders to.

pub mod api;
pub mod board;
pub mod html;
pub mod render;

pub use api::{ClientError, ErrorCategory, HttpTaskApi, TaskApi};
pub use board::{Command, Stats, TaskBoard};
pub use html::Markup;
