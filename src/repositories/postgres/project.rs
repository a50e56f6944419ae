use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::entity::project::{self, ActiveModel, Column, Entity as ProjectEntity};
use crate::error::AppResult;
use crate::models::{NewProject, ParentScope, Project, ProjectCriteria, UpdateProject};
use crate::repositories::ProjectRepository;

/// Project repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgProjectRepository {
    db: DatabaseConnection,
}

impl PgProjectRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_live_model(&self, id: i64) -> AppResult<Option<project::Model>> {
        let model = ProjectEntity::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(model)
    }
}

fn criteria_condition(criteria: &ProjectCriteria) -> Condition {
    let mut cond = Condition::all();

    if let Some(user_id) = criteria.user_id {
        cond = cond.add(Column::UserId.eq(user_id));
    }
    cond = match criteria.parent {
        ParentScope::Any => cond,
        ParentScope::Root => cond.add(Column::ParentProjectId.is_null()),
        ParentScope::Children(parent_id) => cond.add(Column::ParentProjectId.eq(parent_id)),
    };
    if !criteria.include_deleted {
        cond = cond.add(Column::DeletedAt.is_null());
    }

    cond
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn find(&self, criteria: &ProjectCriteria) -> AppResult<Vec<Project>> {
        let models = ProjectEntity::find()
            .filter(criteria_condition(criteria))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Project>> {
        Ok(self.find_live_model(id).await?.map(Into::into))
    }

    async fn find_children(&self, parent_id: i64) -> AppResult<Vec<Project>> {
        let criteria = ProjectCriteria::default().with_parent(ParentScope::Children(parent_id));
        self.find(&criteria).await
    }

    async fn create(&self, input: &NewProject) -> AppResult<Project> {
        let model = ActiveModel {
            user_id: Set(input.user_id),
            parent_project_id: Set(input.parent_project_id),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            color: Set(input.color.clone()),
            depth: Set(0),
            path: Set(None),
            created_at: Set(input.created_at),
            updated_at: Set(input.created_at),
            deleted_at: Set(None),
            ..Default::default()
        };

        let result = model.insert(&self.db).await?;
        Ok(result.into())
    }

    async fn update(
        &self,
        id: i64,
        input: &UpdateProject,
        now: OffsetDateTime,
    ) -> AppResult<Option<Project>> {
        let Some(model) = self.find_live_model(id).await? else {
            return Ok(None);
        };

        let mut active: ActiveModel = model.into();

        if let Some(name) = &input.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &input.description {
            active.description = Set(description.clone());
        }
        if let Some(color) = &input.color {
            active.color = Set(color.clone());
        }
        if let Some(parent_project_id) = input.parent_project_id {
            active.parent_project_id = Set(parent_project_id);
        }
        active.updated_at = Set(now);

        let result = active.update(&self.db).await?;
        Ok(Some(result.into()))
    }

    async fn soft_delete(&self, id: i64, now: OffsetDateTime) -> AppResult<bool> {
        let result = ProjectEntity::update_many()
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
impl From<project::Model> for Project {
    fn from(m: project::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            parent_project_id: m.parent_project_id,
            name: m.name,
            description: m.description,
            color: m.color,
            depth: m.depth,
            path: m.path,
            created_at: m.created_at,
            updated_at: m.updated_at,
            deleted_at: m.deleted_at,
        }
    }
}
