use crate::task::{NewTask, Task, TaskChanges, TaskError, TaskRepository};
use async_trait::async_trait;

/// Use cases exposed to the API layer.
///
/// Update, delete and complete report `false` when the task does not exist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn get_all_tasks(&self, user_id: i64) -> Result<Vec<Task>, TaskError>;

    async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskError>;

    async fn get_task_by_id(&self, task_id: i32) -> Result<Option<Task>, TaskError>;

    async fn update_task(&self, task_id: i32, changes: TaskChanges) -> Result<bool, TaskError>;

    async fn delete_task(&self, task_id: i32) -> Result<bool, TaskError>;

    async fn complete_task(&self, task_id: i32) -> Result<bool, TaskError>;
}

/// The [`TaskService`] used by the server, delegating to a [`TaskRepository`].
pub struct DefaultTaskService<R> {
    repository: R,
}

impl<R: TaskRepository> DefaultTaskService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: TaskRepository> TaskService for DefaultTaskService<R> {
    /// Retrieves all tasks owned by the given user.
    #[tracing::instrument(skip(self))]
    async fn get_all_tasks(&self, user_id: i64) -> Result<Vec<Task>, TaskError> {
        self.repository.list_by_owner(user_id).await
    }

    /// Creates a new task.
    ///
    /// # Arguments
    ///
    /// * `new_task` - The fields of the task, including its owner.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored `Task` with its assigned ID.
    #[tracing::instrument(skip(self))]
    async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskError> {
        let task = self.repository.create(new_task).await?;
        tracing::info!("Created task {} for user {}", task.id, task.user_id);
        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    async fn get_task_by_id(&self, task_id: i32) -> Result<Option<Task>, TaskError> {
        self.repository.find_by_id(task_id).await
    }

    /// Applies `changes` to a task.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no task with `task_id` exists, otherwise the repository's result.
    #[tracing::instrument(skip(self))]
    async fn update_task(&self, task_id: i32, changes: TaskChanges) -> Result<bool, TaskError> {
        match self.repository.find_by_id(task_id).await? {
            Some(task) => self.repository.update(&task, changes).await,
            None => Ok(false),
        }
    }

    /// Deletes a task.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no task with `task_id` exists, otherwise the repository's result.
    #[tracing::instrument(skip(self))]
    async fn delete_task(&self, task_id: i32) -> Result<bool, TaskError> {
        match self.repository.find_by_id(task_id).await? {
            Some(task) => self.repository.delete(&task).await,
            None => Ok(false),
        }
    }

    /// Marks a task as completed. Completing an already completed task succeeds.
    #[tracing::instrument(skip(self))]
    async fn complete_task(&self, task_id: i32) -> Result<bool, TaskError> {
        match self.repository.find_by_id(task_id).await? {
            Some(task) => self.repository.complete(&task).await,
            None => Ok(false),
        }
    }
}
