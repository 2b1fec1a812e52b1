use crate::entities::tasks;
use crate::task::{NewTask, Task, TaskChanges, TaskError};
use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::*;

/// Data access for tasks.
///
/// Lookups by id do not check ownership; callers that need owner scoping
/// have to compare [`Task::user_id`] themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Returns every task owned by `user_id`, oldest first.
    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Task>, TaskError>;

    /// Inserts a new, incomplete task and returns the stored row.
    async fn create(&self, new_task: NewTask) -> Result<Task, TaskError>;

    /// Looks up a task by id, regardless of its owner.
    async fn find_by_id(&self, task_id: i32) -> Result<Option<Task>, TaskError>;

    /// Writes `changes` to an existing task.
    ///
    /// Returns `false` if the row disappeared before the write.
    async fn update(&self, task: &Task, changes: TaskChanges) -> Result<bool, TaskError>;

    /// Removes a task. Returns `false` if there was nothing to remove.
    async fn delete(&self, task: &Task) -> Result<bool, TaskError>;

    /// Marks a task as completed.
    ///
    /// Returns `false` if the row disappeared before the write.
    async fn complete(&self, task: &Task) -> Result<bool, TaskError>;
}

/// [`TaskRepository`] backed by a SeaORM connection.
pub struct SeaOrmTaskRepository {
    db: DatabaseConnection,
}

impl SeaOrmTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists an update and maps a vanished row to `false`.
    async fn save(&self, active_model: tasks::ActiveModel) -> Result<bool, TaskError> {
        match active_model.update(&self.db).await {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().fixed_offset()
}

#[async_trait]
impl TaskRepository for SeaOrmTaskRepository {
    #[tracing::instrument(skip(self))]
    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Task>, TaskError> {
        let tasks = tasks::Entity::find()
            .filter(tasks::Column::UserId.eq(user_id))
            .order_by_asc(tasks::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, new_task: NewTask) -> Result<Task, TaskError> {
        let active_model = tasks::ActiveModel {
            title: ActiveValue::Set(new_task.title),
            description: ActiveValue::Set(new_task.description),
            due_date: ActiveValue::Set(new_task.due_date),
            status: ActiveValue::Set(false),
            user_id: ActiveValue::Set(new_task.user_id),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Task::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, task_id: i32) -> Result<Option<Task>, TaskError> {
        let task = tasks::Entity::find_by_id(task_id)
            .one(&self.db)
            .await?
            .map(Task::from);
        Ok(task)
    }

    #[tracing::instrument(skip(self, task), fields(task_id = task.id))]
    async fn update(&self, task: &Task, changes: TaskChanges) -> Result<bool, TaskError> {
        let mut active_model = tasks::ActiveModel {
            id: ActiveValue::Unchanged(task.id),
            updated_at: ActiveValue::Set(now()),
            ..Default::default()
        };
        if let Some(title) = changes.title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = changes.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(due_date) = changes.due_date {
            active_model.due_date = ActiveValue::Set(due_date);
        }
        self.save(active_model).await
    }

    #[tracing::instrument(skip(self, task), fields(task_id = task.id))]
    async fn delete(&self, task: &Task) -> Result<bool, TaskError> {
        let result = tasks::Entity::delete_by_id(task.id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    #[tracing::instrument(skip(self, task), fields(task_id = task.id))]
    async fn complete(&self, task: &Task) -> Result<bool, TaskError> {
        let active_model = tasks::ActiveModel {
            id: ActiveValue::Unchanged(task.id),
            status: ActiveValue::Set(true),
            updated_at: ActiveValue::Set(now()),
            ..Default::default()
        };
        self.save(active_model).await
    }
}
