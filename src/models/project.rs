use time::OffsetDateTime;

/// Color given to projects created without one (mid-gray)
pub const DEFAULT_PROJECT_COLOR: &str = "#808080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    /// Owner, fixed at creation
    pub user_id: i64,
    pub parent_project_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub depth: i32,
    /// Materialized path placeholder, never computed here
    pub path: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

impl Project {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub user_id: i64,
    pub parent_project_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Row handed to the repository
#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: i64,
    pub parent_project_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: OffsetDateTime,
}

/// Partial update. Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub parent_project_id: Option<Option<i64>>,
}

/// Which part of the hierarchy a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentScope {
    /// Every project regardless of parent
    #[default]
    Any,
    /// Only projects without a parent
    Root,
    /// Direct children of the given project
    Children(i64),
}

impl ParentScope {
    pub fn admits(&self, parent_project_id: Option<i64>) -> bool {
        match self {
            ParentScope::Any => true,
            ParentScope::Root => parent_project_id.is_none(),
            ParentScope::Children(id) => parent_project_id == Some(*id),
        }
    }
}

/// Equality criteria for project lookups
#[derive(Debug, Clone, Default)]
pub struct ProjectCriteria {
    pub user_id: Option<i64>,
    pub parent: ParentScope,
    pub include_deleted: bool,
}

impl ProjectCriteria {
    pub fn owned_by(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: ParentScope) -> Self {
        self.parent = parent;
        self
    }

    pub fn matches(&self, project: &Project) -> bool {
        self.user_id.is_none_or(|id| project.user_id == id)
            && self.parent.admits(project.parent_project_id)
            && (self.include_deleted || !project.is_deleted())
    }
}
