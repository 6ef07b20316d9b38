use chrono::{DateTime, Utc};

use crate::client::board::Stats;
use crate::client::html::Markup;
use crate::models::Task;
use crate::services::MAX_TITLE_LEN;

pub fn format_created_at(created_at: &DateTime<Utc>) -> (String, String) {
    (
        created_at.format("%d/%m/%Y").to_string(),
        created_at.format("%H:%M").to_string(),
    )
}

pub fn task_item(task: &Task, editing: bool) -> Markup {
    let (date, time) = format_created_at(&task.created_at);
    let mut m = Markup::new();

    m.raw(r#"<div class="task-item"#);
    if task.completed {
        m.raw(" completed");
    }
    if editing {
        m.raw(" editing");
    }
    m.raw(r#"" data-task-id=""#).value(task.id).raw(r#"">"#);

    m.raw(r#"<div class="task-content">"#)
        .raw(r#"<input type="checkbox" class="task-checkbox" data-action="toggle" data-task-id=""#)
        .value(task.id)
        .raw(r#"""#);
    if task.completed {
        m.raw(" checked");
    }
    m.raw(">");

    if editing {
        m.raw(r#"<input type="text" class="task-edit-input" maxlength=""#)
            .value(MAX_TITLE_LEN)
            .raw(r#"" value=""#)
            .text(&task.title)
            .raw(r#"" data-action="save" data-task-id=""#)
            .value(task.id)
            .raw(r#"">"#);
    } else {
        m.raw(r#"<span class="task-text">"#).text(&task.title).raw("</span>");
    }

    m.raw(r#"<div class="task-date-container"><span class="task-date">"#)
        .text(&date)
        .raw(r#"</span><span class="task-time">"#)
        .text(&time)
        .raw("</span></div></div>");

    m.raw(r#"<div class="task-actions">"#);
    if editing {
        m.raw(r#"<button class="save-btn" data-action="save" data-task-id=""#)
            .value(task.id)
            .raw(r#"">Save</button>"#)
            .raw(r#"<button class="cancel-btn" data-action="cancel-edit" data-task-id=""#)
            .value(task.id)
            .raw(r#"">Cancel</button>"#);
    } else {
        m.raw(r#"<button class="edit-btn" data-action="edit" data-task-id=""#)
            .value(task.id)
            .raw(r#"">Edit</button>"#)
            .raw(r#"<button class="delete-btn" data-action="delete" data-task-id=""#)
            .value(task.id)
            .raw(r#"">Delete</button>"#);
    }
    m.raw("</div></div>");
    m
}

pub fn task_list(tasks: &[Task], editing: Option<i64>) -> Markup {
    let mut m = Markup::new();
    m.raw(r#"<div id="tasksList">"#);
    if tasks.is_empty() {
        m.raw(r#"<div class="empty-state">No tasks yet. Add one to get started!</div>"#);
    }
    for task in tasks {
        m.append(&task_item(task, editing == Some(task.id)));
    }
    m.raw("</div>");
    m
}

pub fn stats(stats: &Stats) -> Markup {
    let mut m = Markup::new();
    m.raw(r#"<div class="stats"><span id="totalTasks">Total: "#)
        .value(stats.total)
        .raw(r#"</span><span id="completedTasks">Completed: "#)
        .value(stats.completed)
        .raw(r#"</span><span id="pendingTasks">Pending: "#)
        .value(stats.pending)
        .raw("</span></div>");
    m
}

/// Add-task input; the button stays disabled until the input has text.
pub fn task_form(value: &str) -> Markup {
    let mut m = Markup::new();
    m.raw(r#"<div class="task-form"><input type="text" id="taskInput" maxlength=""#)
        .value(MAX_TITLE_LEN)
        .raw(r#"" value=""#)
        .text(value)
        .raw(r#"" data-action="add">"#)
        .raw(r#"<button id="addTaskBtn" data-action="add""#);
    if value.trim().is_empty() {
        m.raw(" disabled");
    }
    m.raw(">Add task</button></div>");
    m
}

pub fn notice(message: &str) -> Markup {
    let mut m = Markup::new();
    m.raw(r#"<div id="errorMessage" class="error-message">"#)
        .text(message)
        .raw("</div>");
    m
}

pub fn delete_prompt(task: &Task) -> Markup {
    let mut m = Markup::new();
    m.raw(r#"<div class="confirm-delete" data-task-id=""#)
        .value(task.id)
        .raw(r#""><span>Delete this task? "#)
        .text(&task.title)
        .raw(r#"</span><button class="confirm-btn" data-action="confirm-delete">Delete</button>"#)
        .raw(r#"<button class="cancel-btn" data-action="dismiss-delete">Keep</button></div>"#);
    m
}

pub fn page(
    tasks: &[Task],
    editing: Option<i64>,
    pending_delete: Option<&Task>,
    counts: &Stats,
    draft: &str,
) -> Markup {
    let mut m = Markup::new();
    m.append(&task_form(draft));
    m.append(&stats(counts));
    if let Some(task) = pending_delete {
        m.append(&delete_prompt(task));
    }
    m.append(&task_list(tasks, editing));
    m
}
