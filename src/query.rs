//! Task filter composition
//!
//! A [`TaskFilter`] coming from a caller is normalized into a [`TaskQuery`]:
//! a conjunction of predicates rooted at `user_id AND NOT deleted`, plus an
//! optional page window. Both repository backends evaluate the same
//! `TaskQuery`, so the in-memory store and PostgreSQL agree on membership,
//! ordering and paging.

use std::cmp::Ordering;

use time::OffsetDateTime;

use crate::error::{AppError, AppResult};
use crate::models::{Task, TaskFilter, TaskStatus};

/// Offset/limit window derived from a 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl PageWindow {
    pub fn new(page: Option<u64>, limit: u64) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if limit == 0 {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }

        // Storage takes signed 64-bit offsets and limits
        let max = i64::MAX as u64;
        if limit > max {
            return Err(AppError::Validation("limit is out of range".to_string()));
        }
        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| *offset <= max)
            .ok_or_else(|| AppError::Validation("page is out of range".to_string()))?;

        Ok(Self {
            page,
            limit,
            offset,
        })
    }

    /// Number of pages needed to cover `total` rows
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// Normalized task predicate plus optional paging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub user_id: i64,
    pub include_deleted: bool,
    pub project_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub due_before: Option<OffsetDateTime>,
    /// Search text as given; blank input is dropped
    pub search: Option<String>,
    pub window: Option<PageWindow>,
}

impl TaskQuery {
    /// Build the query for `user_id` from caller-supplied filters
    pub fn compose(user_id: i64, filter: &TaskFilter) -> AppResult<Self> {
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);

        let window = match filter.limit {
            Some(limit) => Some(PageWindow::new(filter.page, limit)?),
            None => None,
        };

        Ok(Self {
            user_id,
            include_deleted: filter.include_deleted,
            project_id: filter.project_id,
            status: filter.status,
            due_before: filter.due_before,
            search,
            window,
        })
    }

    /// Same predicate with the page window removed (used for counting)
    pub fn unbounded(&self) -> Self {
        Self {
            window: None,
            ..self.clone()
        }
    }

    /// SQL (I)LIKE pattern for the search text, wildcards escaped
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|needle| format!("%{}%", escape_like(needle)))
    }

    /// Evaluate the predicate against a single row (window ignored)
    pub fn matches(&self, task: &Task) -> bool {
        if task.user_id != self.user_id {
            return false;
        }
        if !self.include_deleted && task.is_deleted() {
            return false;
        }
        if self.project_id.is_some_and(|id| task.project_id != id) {
            return false;
        }
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        if let Some(bound) = self.due_before {
            // NULL due dates never satisfy an upper bound
            match task.due_date {
                Some(due) if due <= bound => {}
                _ => return false,
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = task.title.to_lowercase().contains(needle.as_str());
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle.as_str()));
            if !(in_title || in_description) {
                return false;
            }
        }
        true
    }

    /// Filter, order and window a set of rows
    pub fn apply<'a, I>(&self, rows: I) -> Vec<Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut matched: Vec<Task> = rows
            .into_iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect();
        matched.sort_by(creation_order);

        match self.window {
            Some(window) => matched
                .into_iter()
                .skip(window.offset as usize)
                .take(window.limit as usize)
                .collect(),
            None => matched,
        }
    }
}

/// Listing order: creation time ascending, id breaks ties
pub fn creation_order(a: &Task, b: &Task) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Escape LIKE special characters for literal matching
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn task(id: i64, title: &str, description: Option<&str>) -> Task {
        let at = datetime!(2026-01-01 00:00 UTC);
        Task {
            id,
            user_id: 1,
            project_id: 10,
            parent_task_id: None,
            title: title.to_string(),
            description: description.map(str::to_string),
            status: TaskStatus::Pending,
            priority: 0,
            due_date: None,
            completed_at: None,
            depth: 0,
            path: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    #[test]
    fn window_defaults_to_first_page() {
        let window = PageWindow::new(None, 25).unwrap();
        assert_eq!(window.page, 1);
        assert_eq!(window.offset, 0);

        let window = PageWindow::new(Some(3), 25).unwrap();
        assert_eq!(window.offset, 50);
        assert_eq!(window.total_pages(51), 3);
        assert_eq!(window.total_pages(0), 0);
    }

    #[test]
    fn zero_page_or_limit_is_rejected() {
        assert!(matches!(
            PageWindow::new(Some(0), 10),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            PageWindow::new(Some(1), 0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        assert!(matches!(
            PageWindow::new(Some(u64::MAX), 1),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            PageWindow::new(Some(1), u64::MAX),
            Err(AppError::Validation(_))
        ));

        let last = PageWindow::new(Some(i64::MAX as u64 + 1), 1).unwrap();
        assert_eq!(last.offset, i64::MAX as u64);
    }

    #[test]
    fn search_keeps_surrounding_spaces() {
        let filter = TaskFilter {
            search: Some(" cat".to_string()),
            ..TaskFilter::default()
        };
        let query = TaskQuery::compose(1, &filter).unwrap();

        assert_eq!(query.search.as_deref(), Some(" cat"));
        assert!(query.matches(&task(1, "Feed the CAT", None)));
        assert!(!query.matches(&task(2, "concatenate", None)));
        assert_eq!(query.search_pattern().unwrap(), "% cat%");
    }

    #[test]
    fn blank_search_is_dropped() {
        let filter = TaskFilter {
            search: Some("   ".to_string()),
            ..TaskFilter::default()
        };
        let query = TaskQuery::compose(1, &filter).unwrap();
        assert_eq!(query.search, None);
        assert_eq!(query.search_pattern(), None);
    }

    #[test]
    fn search_matches_title_or_description_ignoring_case() {
        let filter = TaskFilter {
            search: Some("Report".to_string()),
            ..TaskFilter::default()
        };
        let query = TaskQuery::compose(1, &filter).unwrap();

        assert!(query.matches(&task(1, "Write REPORT", None)));
        assert!(query.matches(&task(2, "Email", Some("attach the report"))));
        assert!(!query.matches(&task(3, "Email", None)));
    }

    #[test]
    fn due_before_is_inclusive_and_skips_undated() {
        let bound = datetime!(2026-02-01 12:00 UTC);
        let filter = TaskFilter {
            due_before: Some(bound),
            ..TaskFilter::default()
        };
        let query = TaskQuery::compose(1, &filter).unwrap();

        let mut on_bound = task(1, "a", None);
        on_bound.due_date = Some(bound);
        let mut after = task(2, "b", None);
        after.due_date = Some(datetime!(2026-02-01 12:01 UTC));

        assert!(query.matches(&on_bound));
        assert!(!query.matches(&after));
        assert!(!query.matches(&task(3, "c", None)));
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let filter = TaskFilter {
            search: Some("50%_off".to_string()),
            ..TaskFilter::default()
        };
        let query = TaskQuery::compose(1, &filter).unwrap();
        assert_eq!(query.search_pattern().unwrap(), "%50\\%\\_off%");
    }

    #[test]
    fn ties_on_creation_time_order_by_id() {
        let rows = vec![task(3, "c", None), task(1, "a", None), task(2, "b", None)];
        let query = TaskQuery::compose(1, &TaskFilter::default()).unwrap();
        let ids: Vec<i64> = query.apply(&rows).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
