use crate::deps::Deps;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateProject, NewProject, ParentScope, Project, ProjectCriteria, UpdateProject,
    DEFAULT_PROJECT_COLOR,
};

/// Project use-cases. Every operation is scoped to the acting user.
pub struct ProjectService;

impl ProjectService {
    /// Live project owned by `user_id`, or `None`.
    ///
    /// Missing, deleted and foreign projects are indistinguishable here.
    pub async fn get_project(deps: &Deps, id: i64, user_id: i64) -> AppResult<Option<Project>> {
        let project = deps.projects.find_by_id(id).await?;
        Ok(project.filter(|p| p.is_owned_by(user_id)))
    }

    /// Capability-checked lookup shared by every operation that needs access
    pub async fn require_project(deps: &Deps, id: i64, user_id: i64) -> AppResult<Project> {
        Self::get_project(deps, id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project".to_string()))
    }

    pub async fn list_projects(
        deps: &Deps,
        user_id: i64,
        scope: ParentScope,
    ) -> AppResult<Vec<Project>> {
        tracing::debug!(user_id, ?scope, "listing projects");
        let criteria = ProjectCriteria::owned_by(user_id).with_parent(scope);
        deps.projects.find(&criteria).await
    }

    /// Direct children of a project the user owns
    pub async fn list_child_projects(
        deps: &Deps,
        parent_id: i64,
        user_id: i64,
    ) -> AppResult<Vec<Project>> {
        // Resolve the parent first so a foreign parent never leaks its children
        Self::require_project(deps, parent_id, user_id).await?;
        deps.projects.find_children(parent_id).await
    }

    pub async fn create_project(deps: &Deps, input: CreateProject) -> AppResult<Project> {
        validate_name(&input.name)?;
        if let Some(color) = &input.color {
            validate_color(color)?;
        }

        if let Some(parent_id) = input.parent_project_id {
            Self::require_project(deps, parent_id, input.user_id)
                .await
                .inspect_err(|_| {
                    tracing::warn!(
                        user_id = input.user_id,
                        parent_id,
                        "parent project does not resolve"
                    )
                })?;
        }

        let new_project = NewProject {
            user_id: input.user_id,
            parent_project_id: input.parent_project_id,
            name: input.name,
            description: input.description,
            color: input
                .color
                .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
            created_at: deps.now(),
        };

        let project = deps.projects.create(&new_project).await?;
        tracing::info!(
            project_id = project.id,
            user_id = project.user_id,
            "project created"
        );
        Ok(project)
    }

    /// Update the fields present in `input`.
    ///
    /// Reparenting only rejects a project naming itself as parent; it does
    /// not walk the ancestor chain.
    pub async fn update_project(
        deps: &Deps,
        id: i64,
        input: UpdateProject,
        user_id: i64,
    ) -> AppResult<Project> {
        let current = Self::require_project(deps, id, user_id).await?;

        if let Some(name) = &input.name {
            validate_name(name)?;
        }
        if let Some(color) = &input.color {
            validate_color(color)?;
        }

        if let Some(new_parent) = input.parent_project_id {
            if new_parent != current.parent_project_id {
                if let Some(parent_id) = new_parent {
                    if parent_id == id {
                        tracing::warn!(project_id = id, "project cannot be its own parent");
                        return Err(AppError::InvalidHierarchy(
                            "A project cannot be its own parent".to_string(),
                        ));
                    }
                    Self::require_project(deps, parent_id, user_id).await?;
                }
            }
        }

        let project = deps
            .projects
            .update(id, &input, deps.now())
            .await?
            .ok_or_else(|| AppError::Persistence("project update affected no row".to_string()))?;

        tracing::info!(project_id = id, "project updated");
        Ok(project)
    }

    /// Soft delete a project that has no live children
    pub async fn delete_project(deps: &Deps, id: i64, user_id: i64) -> AppResult<()> {
        let children = Self::list_child_projects(deps, id, user_id).await?;
        if !children.is_empty() {
            tracing::warn!(
                project_id = id,
                children = children.len(),
                "refusing to delete project with children"
            );
            return Err(AppError::PreconditionFailed(
                "Project has child projects".to_string(),
            ));
        }

        if !deps.projects.soft_delete(id, deps.now()).await? {
            return Err(AppError::Persistence(
                "project delete affected no row".to_string(),
            ));
        }

        tracing::info!(project_id = id, "project soft-deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Project name is required".to_string()));
    }
    Ok(())
}

/// Accepts `#rgb` and `#rrggbb`
fn validate_color(color: &str) -> AppResult<()> {
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Color must be a hex string like {}",
            DEFAULT_PROJECT_COLOR
        )))
    }
}
