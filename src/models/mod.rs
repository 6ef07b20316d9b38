pub mod health;
pub mod task;

pub use health::HealthReport;
pub use task::{NewTaskRequest, Task, UpdateTaskRequest};
