use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter, Set,
    Statement,
};
use time::OffsetDateTime;

use crate::entity::user::{self, ActiveModel, Column, Entity as UserEntity};
use crate::error::AppResult;
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::UserRepository;

/// Insert-or-restore keyed on the email unique index. The conditional
/// `DO UPDATE` only fires for soft-deleted rows, so a live collision
/// returns no row.
const UPSERT_RESTORING: &str = r#"
INSERT INTO users (email, display_name, created_at, updated_at)
VALUES ($1, $2, $3, $3)
ON CONFLICT (email) DO UPDATE
    SET display_name = EXCLUDED.display_name,
        updated_at = EXCLUDED.updated_at,
        deleted_at = NULL
    WHERE users.deleted_at IS NOT NULL
RETURNING id, email, display_name, created_at, updated_at, deleted_at
"#;

/// User repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_live_model(&self, id: i64) -> AppResult<Option<user::Model>> {
        let model = UserEntity::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(model)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.find_live_model(id).await?.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(Column::Email.eq(email))
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn upsert_restoring(&self, input: &NewUser) -> AppResult<Option<User>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            UPSERT_RESTORING,
            [
                input.email.clone().into(),
                input.display_name.clone().into(),
                input.created_at.into(),
            ],
        );

        let model = UserEntity::find()
            .from_raw_sql(stmt)
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update(
        &self,
        id: i64,
        input: &UpdateUser,
        now: OffsetDateTime,
    ) -> AppResult<Option<User>> {
        let Some(model) = self.find_live_model(id).await? else {
            return Ok(None);
        };

        let mut active: ActiveModel = model.into();

        if let Some(display_name) = &input.display_name {
            active.display_name = Set(display_name.clone());
        }
        active.updated_at = Set(now);

        let result = active.update(&self.db).await?;
        Ok(Some(result.into()))
    }

    async fn soft_delete(&self, id: i64, now: OffsetDateTime) -> AppResult<bool> {
        let result = UserEntity::update_many()
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
impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            display_name: m.display_name,
            created_at: m.created_at,
            updated_at: m.updated_at,
            deleted_at: m.deleted_at,
        }
    }
}
