pub mod task_service;

pub use task_service::{MAX_TITLE_LEN, TaskService};
