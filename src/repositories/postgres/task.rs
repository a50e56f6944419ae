use async_trait::async_trait;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use time::OffsetDateTime;

use crate::entity::task::{self, ActiveModel, Column, Entity as TaskEntity};
use crate::error::{AppError, AppResult};
use crate::models::{NewTask, Task, TaskChanges, TaskStatus};
use crate::query::TaskQuery;
use crate::repositories::TaskRepository;

/// Task repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgTaskRepository {
    db: DatabaseConnection,
}

impl PgTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_live_model(&self, id: i64) -> AppResult<Option<task::Model>> {
        let model = TaskEntity::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(model)
    }

    async fn all_live(&self, cond: Condition) -> AppResult<Vec<Task>> {
        let models = in_creation_order(TaskEntity::find().filter(cond))
            .filter(Column::DeletedAt.is_null())
            .all(&self.db)
            .await?;

        models.into_iter().map(Task::try_from).collect()
    }
}

fn in_creation_order(select: Select<TaskEntity>) -> Select<TaskEntity> {
    select
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
}

/// Translate the composed task query into a SQL condition
fn query_condition(query: &TaskQuery) -> Condition {
    let mut cond = Condition::all().add(Column::UserId.eq(query.user_id));

    if !query.include_deleted {
        cond = cond.add(Column::DeletedAt.is_null());
    }
    if let Some(project_id) = query.project_id {
        cond = cond.add(Column::ProjectId.eq(project_id));
    }
    if let Some(status) = query.status {
        cond = cond.add(Column::Status.eq(status.as_str()));
    }
    if let Some(due_before) = query.due_before {
        cond = cond.add(Column::DueDate.lte(due_before));
    }
    if let Some(pattern) = query.search_pattern() {
        // NULL descriptions fall through to the title arm
        cond = cond.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.as_str()))
                .add(Expr::col(Column::Description).ilike(pattern.as_str())),
        );
    }

    cond
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn find(&self, query: &TaskQuery) -> AppResult<Vec<Task>> {
        let mut select = in_creation_order(TaskEntity::find().filter(query_condition(query)));

        if let Some(window) = query.window {
            select = select.offset(window.offset).limit(window.limit);
        }

        let models = select.all(&self.db).await?;
        models.into_iter().map(Task::try_from).collect()
    }

    async fn count(&self, query: &TaskQuery) -> AppResult<u64> {
        let count = TaskEntity::find()
            .filter(query_condition(query))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Task>> {
        self.find_live_model(id)
            .await?
            .map(Task::try_from)
            .transpose()
    }

    async fn find_by_project(&self, project_id: i64) -> AppResult<Vec<Task>> {
        self.all_live(Condition::all().add(Column::ProjectId.eq(project_id)))
            .await
    }

    async fn find_children(&self, parent_task_id: i64) -> AppResult<Vec<Task>> {
        self.all_live(Condition::all().add(Column::ParentTaskId.eq(parent_task_id)))
            .await
    }

    async fn create(&self, input: &NewTask) -> AppResult<Task> {
        let model = ActiveModel {
            user_id: Set(input.user_id),
            project_id: Set(input.project_id),
            parent_task_id: Set(input.parent_task_id),
            title: Set(input.title.clone()),
            description: Set(input.description.clone()),
            status: Set(input.status.as_str().to_string()),
            priority: Set(input.priority),
            due_date: Set(input.due_date),
            completed_at: Set(None),
            depth: Set(0),
            path: Set(None),
            created_at: Set(input.created_at),
            updated_at: Set(input.created_at),
            deleted_at: Set(None),
            ..Default::default()
        };

        let result = model.insert(&self.db).await?;
        Task::try_from(result)
    }

    async fn update(&self, id: i64, changes: &TaskChanges) -> AppResult<Option<Task>> {
        let Some(model) = self.find_live_model(id).await? else {
            return Ok(None);
        };

        let mut active: ActiveModel = model.into();

        if let Some(title) = &changes.title {
            active.title = Set(title.clone());
        }
        if let Some(description) = &changes.description {
            active.description = Set(description.clone());
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(priority) = changes.priority {
            active.priority = Set(priority);
        }
        if let Some(due_date) = changes.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(parent_task_id) = changes.parent_task_id {
            active.parent_task_id = Set(parent_task_id);
        }
        if let Some(completed_at) = changes.completed_at {
            active.completed_at = Set(completed_at);
        }
        active.updated_at = Set(changes.updated_at);

        let result = active.update(&self.db).await?;
        Task::try_from(result).map(Some)
    }

    async fn soft_delete(&self, id: i64, now: OffsetDateTime) -> AppResult<bool> {
        let result = TaskEntity::update_many()
            .col_expr(Column::DeletedAt, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

// Conversion from SeaORM model to our domain model
impl TryFrom<task::Model> for Task {
    type Error = AppError;

    fn try_from(m: task::Model) -> Result<Self, Self::Error> {
        let status = m.status.parse::<TaskStatus>().map_err(|e| {
            AppError::Persistence(format!("corrupt row tasks.status (id {}): {}", m.id, e))
        })?;

        Ok(Self {
            id: m.id,
            user_id: m.user_id,
            project_id: m.project_id,
            parent_task_id: m.parent_task_id,
            title: m.title,
            description: m.description,
            status,
            priority: m.priority,
            due_date: m.due_date,
            completed_at: m.completed_at,
            depth: m.depth,
            path: m.path,
            created_at: m.created_at,
            updated_at: m.updated_at,
            deleted_at: m.deleted_at,
        })
    }
}
