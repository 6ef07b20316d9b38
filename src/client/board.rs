use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::api::{ClientError, ErrorCategory, TaskApi};
use crate::client::html::Markup;
use crate::client::render;
use crate::models::{Task, UpdateTaskRequest};
use crate::services::MAX_TITLE_LEN;

pub const MIN_TITLE_LEN: usize = 2;
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl Stats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total,
            completed,
            pending: total - completed,
        }
    }
}

/// User intent raised by the rendered markup and handed to
/// [`TaskBoard::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reload,
    Add(String),
    Toggle(i64),
    BeginEdit(i64),
    CancelEdit,
    SaveEdit { id: i64, title: String },
    RequestDelete(i64),
    ConfirmDelete,
    DismissDelete,
}

impl Command {
    /// Maps a `data-action` attribute (plus the element's `data-task-id` and
    /// current input value) back to a command.
    pub fn from_action(action: &str, id: Option<i64>, value: Option<&str>) -> Option<Self> {
        let command = match action {
            "reload" => Command::Reload,
            "add" => Command::Add(value?.to_string()),
            "toggle" => Command::Toggle(id?),
            "edit" => Command::BeginEdit(id?),
            "cancel-edit" => Command::CancelEdit,
            "save" => Command::SaveEdit {
                id: id?,
                title: value?.to_string(),
            },
            "delete" => Command::RequestDelete(id?),
            "confirm-delete" => Command::ConfirmDelete,
            "dismiss-delete" => Command::DismissDelete,
            _ => return None,
        };
        Some(command)
    }
}

#[derive(Debug, Clone)]
struct Notice {
    message: String,
    shown_at: Instant,
}

/// View-model for one task list.
///
/// Every transition borrows the board mutably, so a second action cannot
/// start while one is still waiting on the server.
pub struct TaskBoard<A> {
    api: A,
    tasks: Vec<Task>,
    editing: Option<i64>,
    pending_delete: Option<i64>,
    draft: String,
    notice: Option<Notice>,
    stats: Stats,
    view: Markup,
}

impl<A: TaskApi> TaskBoard<A> {
    pub fn new(api: A) -> Self {
        let mut board = Self {
            api,
            tasks: Vec::new(),
            editing: None,
            pending_delete: None,
            draft: String::new(),
            notice: None,
            stats: Stats::default(),
            view: Markup::new(),
        };
        board.refresh();
        board
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    /// Text left in the add form after a rejected add.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn view(&self) -> &Markup {
        &self.view
    }

    /// The current notice, until it has been on screen for [`NOTICE_TTL`].
    ///
    /// Not part of [`TaskBoard::view`]: it expires on a timer, so the host
    /// renders it through [`TaskBoard::notice_markup`] on its own schedule.
    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| n.shown_at.elapsed() < NOTICE_TTL)
            .map(|n| n.message.as_str())
    }

    pub fn notice_markup(&self) -> Option<Markup> {
        self.notice().map(render::notice)
    }

    pub async fn dispatch(&mut self, command: Command) {
        debug!("dispatch {:?}", command);
        match command {
            Command::Reload => self.load().await,
            Command::Add(title) => {
                self.add(&title).await;
            }
            Command::Toggle(id) => self.toggle(id).await,
            Command::BeginEdit(id) => self.begin_edit(id),
            Command::CancelEdit => self.cancel_edit(),
            Command::SaveEdit { id, title } => self.save_edit(id, &title).await,
            Command::RequestDelete(id) => self.request_delete(id),
            Command::ConfirmDelete => self.confirm_delete().await,
            Command::DismissDelete => self.dismiss_delete(),
        }
    }

    pub async fn load(&mut self) {
        match self.api.list_tasks().await {
            Ok(tasks) => {
                self.tasks = tasks;
                self.forget_missing();
                self.notice = None;
            }
            Err(e) => self.fail("Could not load tasks", &e),
        }
        self.refresh();
    }

    /// Returns `true` when the task was created, so the form can be cleared.
    pub async fn add(&mut self, title: &str) -> bool {
        let title = title.trim();
        if let Err(message) = validate_new_title(title) {
            self.draft = title.to_string();
            self.show_notice(message);
            self.refresh();
            return false;
        }

        let created = match self.api.create_task(title).await {
            Ok(task) => {
                self.tasks.insert(0, task);
                self.draft.clear();
                self.notice = None;
                true
            }
            Err(e) => {
                let message = match e.category() {
                    ErrorCategory::Network => "Connection error. Check your internet connection.",
                    ErrorCategory::Server => "Server error. Try again later.",
                    ErrorCategory::Other => "Could not add the task",
                };
                self.draft = title.to_string();
                self.fail(message, &e);
                false
            }
        };
        self.refresh();
        created
    }

    pub async fn toggle(&mut self, id: i64) {
        let Some(completed) = self.tasks.iter().find(|t| t.id == id).map(|t| t.completed) else {
            return;
        };

        match self.api.update_task(id, &UpdateTaskRequest::completed(!completed)).await {
            Ok(task) => {
                self.replace(task);
                self.notice = None;
            }
            Err(e) => self.fail("Could not update the task", &e),
        }
        self.refresh();
    }

    pub fn begin_edit(&mut self, id: i64) {
        if self.tasks.iter().any(|t| t.id == id) {
            self.editing = Some(id);
        }
        self.refresh();
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.refresh();
    }

    pub async fn save_edit(&mut self, id: i64, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            self.show_notice("Title cannot be empty");
            self.refresh();
            return;
        }

        match self.api.update_task(id, &UpdateTaskRequest::title(title)).await {
            Ok(task) => {
                self.replace(task);
                self.editing = None;
                self.notice = None;
            }
            Err(e) => self.fail("Could not save changes", &e),
        }
        self.refresh();
    }

    pub fn request_delete(&mut self, id: i64) {
        if self.tasks.iter().any(|t| t.id == id) {
            self.pending_delete = Some(id);
        }
        self.refresh();
    }

    pub fn dismiss_delete(&mut self) {
        self.pending_delete = None;
        self.refresh();
    }

    pub async fn confirm_delete(&mut self) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };

        match self.api.delete_task(id).await {
            Ok(()) => {
                self.tasks.retain(|t| t.id != id);
                self.forget_missing();
                self.notice = None;
            }
            Err(e) => self.fail("Could not delete the task", &e),
        }
        self.refresh();
    }

    fn replace(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    /// Drops `editing` / `pending_delete` ids that are no longer in the list.
    fn forget_missing(&mut self) {
        let tasks = &self.tasks;
        let held = |id: &i64| tasks.iter().any(|t| t.id == *id);
        self.editing = self.editing.filter(held);
        self.pending_delete = self.pending_delete.filter(held);
    }

    fn fail(&mut self, message: &str, err: &ClientError) {
        warn!("{}: {}", message, err);
        self.show_notice(message);
    }

    fn show_notice(&mut self, message: &str) {
        self.notice = Some(Notice {
            message: message.to_string(),
            shown_at: Instant::now(),
        });
    }

    fn refresh(&mut self) {
        self.stats = Stats::from_tasks(&self.tasks);
        let pending = self
            .pending_delete
            .and_then(|id| self.tasks.iter().find(|t| t.id == id));
        self.view = render::page(&self.tasks, self.editing, pending, &self.stats, &self.draft);
    }
}

fn validate_new_title(title: &str) -> Result<(), &'static str> {
    let len = title.chars().count();
    if len == 0 {
        Err("Please enter a task")
    } else if len < MIN_TITLE_LEN {
        Err("Task must be at least 2 characters")
    } else if len > MAX_TITLE_LEN {
        Err("Task is too long (max 255 characters)")
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use reqwest::StatusCode;

    use super::*;
    use crate::models::HealthReport;

    #[derive(Default)]
    struct FakeApi {
        rows: Mutex<Vec<Task>>,
        next_id: AtomicUsize,
        calls: AtomicUsize,
        creates: AtomicUsize,
        failing: AtomicBool,
    }

    impl FakeApi {
        fn with_tasks(tasks: Vec<Task>) -> Self {
            let api = Self::default();
            api.next_id.store(tasks.len(), Ordering::SeqCst);
            *api.rows.lock().unwrap() = tasks;
            api
        }

        fn fail_with_500(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        fn recover(&self) {
            self.failing.store(false, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn enter(&self) -> Result<(), ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TaskApi for FakeApi {
        async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
            self.enter()?;
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn create_task(&self, title: &str) -> Result<Task, ClientError> {
            self.enter()?;
            self.creates.fetch_add(1, Ordering::SeqCst);
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            let task = task(id, title, false);
            self.rows.lock().unwrap().insert(0, task.clone());
            Ok(task)
        }

        async fn update_task(&self, id: i64, changes: &UpdateTaskRequest) -> Result<Task, ClientError> {
            self.enter()?;
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(ClientError::Status(StatusCode::NOT_FOUND))?;
            if let Some(title) = &changes.title {
                row.title = title.clone();
            }
            if let Some(completed) = changes.completed {
                row.completed = completed;
            }
            Ok(row.clone())
        }

        async fn delete_task(&self, id: i64) -> Result<(), ClientError> {
            self.enter()?;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|t| t.id != id);
            if rows.len() == before {
                return Err(ClientError::Status(StatusCode::NOT_FOUND));
            }
            Ok(())
        }

        async fn health(&self) -> Result<HealthReport, ClientError> {
            self.enter()?;
            Ok(HealthReport::connected())
        }
    }

    fn task(id: i64, title: &str, completed: bool) -> Task {
        Task {
            id,
            title: title.to_string(),
            completed,
            created_at: Utc::now(),
        }
    }

    async fn loaded_board(tasks: Vec<Task>) -> TaskBoard<FakeApi> {
        let mut board = TaskBoard::new(FakeApi::with_tasks(tasks));
        board.load().await;
        board
    }

    #[tokio::test]
    async fn test_load_replaces_tasks_and_stats() {
        let board = loaded_board(vec![task(2, "b", true), task(1, "a", false)]).await;

        assert_eq!(board.tasks().len(), 2);
        assert_eq!(board.stats(), Stats { total: 2, completed: 1, pending: 1 });
        assert!(board.view().as_str().contains("Total: 2"));
        assert!(board.notice().is_none());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_state() {
        let mut board = loaded_board(vec![task(1, "a", false)]).await;
        board.api().fail_with_500();

        board.load().await;
        assert_eq!(board.tasks().len(), 1);
        assert_eq!(board.notice(), Some("Could not load tasks"));
    }

    #[tokio::test]
    async fn test_one_char_title_never_reaches_server() {
        let mut board = TaskBoard::new(FakeApi::default());

        assert!(!board.add("a").await);
        assert!(!board.add("   ").await);
        assert_eq!(board.api().calls(), 0);
        assert!(board.tasks().is_empty());
        assert_eq!(board.notice(), Some("Please enter a task"));
    }

    #[tokio::test]
    async fn test_two_char_title_creates_once_and_prepends() {
        let mut board = loaded_board(vec![task(1, "older", false)]).await;
        let before = board.api().calls();

        assert!(board.add(" ab ").await);
        assert_eq!(board.api().calls() - before, 1);
        assert_eq!(board.api().creates.load(Ordering::SeqCst), 1);
        assert_eq!(board.tasks()[0].title, "ab");
        assert_eq!(board.stats().total, 2);
    }

    #[tokio::test]
    async fn test_too_long_title_is_rejected_locally() {
        let mut board = TaskBoard::new(FakeApi::default());

        assert!(!board.add(&"x".repeat(MAX_TITLE_LEN + 1)).await);
        assert_eq!(board.api().calls(), 0);
        assert_eq!(board.notice(), Some("Task is too long (max 255 characters)"));
    }

    #[tokio::test]
    async fn test_add_server_error_is_categorized() {
        let mut board = TaskBoard::new(FakeApi::default());
        board.api().fail_with_500();

        assert!(!board.add("Buy milk").await);
        assert!(board.tasks().is_empty());
        assert_eq!(board.notice(), Some("Server error. Try again later."));
    }

    #[tokio::test]
    async fn test_successful_add_clears_earlier_notice() {
        let mut board = TaskBoard::new(FakeApi::default());
        board.api().fail_with_500();

        assert!(!board.add("Buy milk").await);
        assert_eq!(board.notice(), Some("Server error. Try again later."));
        assert_eq!(board.draft(), "Buy milk");
        assert!(board.view().as_str().contains(r#"value="Buy milk""#));

        board.api().recover();
        assert!(board.add("Buy milk").await);
        assert!(board.notice().is_none());
        assert_eq!(board.draft(), "");
        assert!(board.view().as_str().contains(r#"id="taskInput""#));
    }

    #[tokio::test]
    async fn test_successful_toggle_and_save_clear_earlier_notice() {
        let mut board = loaded_board(vec![task(1, "draft", false)]).await;

        board.api().fail_with_500();
        board.toggle(1).await;
        assert_eq!(board.notice(), Some("Could not update the task"));
        board.api().recover();
        board.toggle(1).await;
        assert!(board.notice().is_none());

        board.begin_edit(1);
        board.save_edit(1, "").await;
        assert!(board.notice().is_some());
        board.save_edit(1, "final").await;
        assert!(board.notice().is_none());
    }

    #[tokio::test]
    async fn test_begin_edit_unknown_id_is_ignored() {
        let mut board = TaskBoard::new(FakeApi::default());

        board.dispatch(Command::BeginEdit(99)).await;
        assert_eq!(board.editing(), None);
    }

    #[tokio::test]
    async fn test_reload_forgets_vanished_ids() {
        let mut board = loaded_board(vec![task(2, "b", false), task(1, "a", false)]).await;
        board.begin_edit(1);
        board.request_delete(2);

        board.api().rows.lock().unwrap().clear();
        board.load().await;
        assert!(board.tasks().is_empty());
        assert_eq!(board.editing(), None);
        assert_eq!(board.pending_delete(), None);
        assert!(!board.view().as_str().contains("confirm-delete"));
    }

    #[tokio::test]
    async fn test_toggle_replaces_in_place() {
        let mut board = loaded_board(vec![task(2, "b", false), task(1, "a", false)]).await;

        board.dispatch(Command::Toggle(1)).await;
        assert!(board.tasks()[1].completed);
        assert_eq!(board.tasks()[1].id, 1);
        assert_eq!(board.stats().completed, 1);

        board.dispatch(Command::Toggle(1)).await;
        assert!(!board.tasks()[1].completed);
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_is_ignored() {
        let mut board = loaded_board(vec![task(1, "a", false)]).await;
        let before = board.api().calls();

        board.toggle(99).await;
        assert_eq!(board.api().calls(), before);
    }

    #[tokio::test]
    async fn test_edit_flow() {
        let mut board = loaded_board(vec![task(1, "draft", false)]).await;

        board.dispatch(Command::BeginEdit(1)).await;
        assert_eq!(board.editing(), Some(1));
        assert!(board.view().as_str().contains("task-edit-input"));

        board.dispatch(Command::CancelEdit).await;
        assert_eq!(board.editing(), None);

        board.begin_edit(1);
        let before = board.api().calls();
        board.save_edit(1, "   ").await;
        assert_eq!(board.api().calls(), before);
        assert_eq!(board.editing(), Some(1));
        assert_eq!(board.notice(), Some("Title cannot be empty"));

        board
            .dispatch(Command::SaveEdit {
                id: 1,
                title: " final ".to_string(),
            })
            .await;
        assert_eq!(board.tasks()[0].title, "final");
        assert_eq!(board.editing(), None);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let mut board = loaded_board(vec![task(2, "b", false), task(1, "a", false)]).await;
        let before = board.api().calls();

        board.dispatch(Command::RequestDelete(1)).await;
        assert_eq!(board.pending_delete(), Some(1));
        assert!(board.view().as_str().contains("confirm-delete"));
        assert_eq!(board.api().calls(), before);

        board.dispatch(Command::DismissDelete).await;
        assert_eq!(board.pending_delete(), None);
        assert_eq!(board.tasks().len(), 2);

        board.dispatch(Command::RequestDelete(1)).await;
        board.dispatch(Command::ConfirmDelete).await;
        assert_eq!(board.api().calls(), before + 1);
        assert_eq!(board.tasks().iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(board.pending_delete(), None);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_task() {
        let mut board = loaded_board(vec![task(1, "a", false)]).await;
        board.api().fail_with_500();

        board.request_delete(1);
        board.confirm_delete().await;
        assert_eq!(board.tasks().len(), 1);
        assert_eq!(board.notice(), Some("Could not delete the task"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_expires() {
        let mut board = TaskBoard::new(FakeApi::default());
        board.add("").await;
        assert!(board.notice_markup().is_some());

        tokio::time::advance(NOTICE_TTL).await;
        assert!(board.notice().is_none());
    }

    #[tokio::test]
    async fn test_rendered_actions_map_back_to_commands() {
        let board = loaded_board(vec![task(7, "a", false)]).await;
        let html = board.view().as_str();

        for action in ["toggle", "edit", "delete"] {
            assert!(html.contains(&format!(r#"data-action="{}" data-task-id="7""#, action)));
        }
        assert_eq!(Command::from_action("toggle", Some(7), None), Some(Command::Toggle(7)));
        assert_eq!(Command::from_action("edit", Some(7), None), Some(Command::BeginEdit(7)));
        assert_eq!(Command::from_action("delete", Some(7), None), Some(Command::RequestDelete(7)));
        assert_eq!(
            Command::from_action("save", Some(7), Some("new")),
            Some(Command::SaveEdit { id: 7, title: "new".to_string() })
        );
        assert_eq!(Command::from_action("toggle", None, None), None);
        assert_eq!(Command::from_action("bogus", Some(7), None), None);
    }
}
