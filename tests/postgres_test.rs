//! Runs the use-cases against PostgreSQL. Each test returns early when
//! `DATABASE_URL` is not set.

mod common;

use time::macros::datetime;

use tasknest::error::AppError;
use tasknest::models::{CreateTask, CreateUser, Task, TaskFilter};
use tasknest::services::{TaskService, UserService};

use common::{postgres_deps, unique_email, Factory};

fn ids(tasks: &[Task]) -> Vec<i64> {
    tasks.iter().map(|t| t.id).collect()
}

fn search(text: &str) -> TaskFilter {
    TaskFilter {
        search: Some(text.to_string()),
        ..TaskFilter::default()
    }
}

#[tokio::test]
async fn test_pg_create_user_after_delete_restores_same_row() {
    let Some(deps) = postgres_deps().await else {
        return;
    };
    let email = unique_email("restore");

    let original = UserService::create_user(
        &deps,
        CreateUser {
            email: email.clone(),
            display_name: "Old Name".to_string(),
        },
    )
    .await
    .unwrap();
    UserService::delete_user(&deps, original.id).await.unwrap();
    assert!(UserService::get_user_by_email(&deps, &email)
        .await
        .unwrap()
        .is_none());

    let restored = UserService::create_user(
        &deps,
        CreateUser {
            email: email.clone(),
            display_name: "New Name".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(restored.id, original.id);
    assert_eq!(restored.display_name, "New Name");
    assert!(restored.deleted_at.is_none());
}

#[tokio::test]
async fn test_pg_create_user_with_live_email_conflicts() {
    let Some(deps) = postgres_deps().await else {
        return;
    };
    let email = unique_email("conflict");
    let live = Factory::new(&deps).create_user(&email).await;

    let result = UserService::create_user(
        &deps,
        CreateUser {
            email: email.clone(),
            display_name: "Copycat".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // The live row is untouched
    let still = UserService::get_user(&deps, live.id).await.unwrap().unwrap();
    assert_eq!(still.display_name, live.display_name);
}

#[tokio::test]
async fn test_pg_search_is_literal_and_case_insensitive() {
    let Some(deps) = postgres_deps().await else {
        return;
    };
    let factory = Factory::new(&deps);
    let user = factory.create_user(&unique_email("search")).await;
    let project = factory.create_project(user.id, "Shop").await;

    let sale = factory.create_task(user.id, project.id, "50% off sale").await;
    let bulk = factory.create_task(user.id, project.id, "500 items").await;
    let snake = factory.create_task(user.id, project.id, "rename a_b").await;
    let cat = factory.create_task(user.id, project.id, "Feed the CAT").await;
    let concat = factory.create_task(user.id, project.id, "concatenate").await;
    let described = factory
        .create_task_with(CreateTask {
            user_id: user.id,
            project_id: project.id,
            parent_task_id: None,
            title: "Weekly".to_string(),
            description: Some("Draft the REPORT".to_string()),
            priority: None,
            due_date: None,
        })
        .await;

    let percent = TaskService::list_tasks_by_user(&deps, user.id, &search("50%"))
        .await
        .unwrap();
    assert_eq!(ids(&percent), vec![sale.id]);

    let underscore = TaskService::list_tasks_by_user(&deps, user.id, &search("a_b"))
        .await
        .unwrap();
    assert_eq!(ids(&underscore), vec![snake.id]);

    let spaced = TaskService::list_tasks_by_user(&deps, user.id, &search(" cat"))
        .await
        .unwrap();
    assert_eq!(ids(&spaced), vec![cat.id]);

    // Description hit; tasks without a description only match on title
    let report = TaskService::list_tasks_by_user(&deps, user.id, &search("report"))
        .await
        .unwrap();
    assert_eq!(ids(&report), vec![described.id]);

    let fifty = TaskService::list_tasks_by_user(&deps, user.id, &search("50"))
        .await
        .unwrap();
    assert_eq!(ids(&fifty), vec![sale.id, bulk.id]);
    assert!(!ids(&fifty).contains(&concat.id));
}

#[tokio::test]
async fn test_pg_due_before_is_inclusive() {
    let Some(deps) = postgres_deps().await else {
        return;
    };
    let factory = Factory::new(&deps);
    let user = factory.create_user(&unique_email("due")).await;
    let project = factory.create_project(user.id, "Dates").await;
    let bound = datetime!(2026-03-05 00:00 UTC);

    let mut tasks = Vec::new();
    for due_date in [
        Some(datetime!(2026-03-04 00:00 UTC)),
        Some(bound),
        Some(datetime!(2026-03-05 00:00:01 UTC)),
        None,
    ] {
        let task = factory
            .create_task_with(CreateTask {
                user_id: user.id,
                project_id: project.id,
                parent_task_id: None,
                title: "Dated".to_string(),
                description: None,
                priority: None,
                due_date,
            })
            .await;
        tasks.push(task);
    }

    let due = TaskService::list_tasks_by_user(
        &deps,
        user.id,
        &TaskFilter {
            due_before: Some(bound),
            ..TaskFilter::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(ids(&due), vec![tasks[0].id, tasks[1].id]);
}

#[tokio::test]
async fn test_pg_concatenated_pages_equal_unbounded_listing() {
    let Some(deps) = postgres_deps().await else {
        return;
    };
    let factory = Factory::new(&deps);
    let user = factory.create_user(&unique_email("pages")).await;
    let project = factory.create_project(user.id, "Pages").await;
    for i in 0..7 {
        factory
            .create_task(user.id, project.id, &format!("Task {}", i))
            .await;
    }

    let filter = TaskFilter {
        project_id: Some(project.id),
        ..TaskFilter::default()
    };
    let unbounded = TaskService::list_tasks_by_user(&deps, user.id, &filter)
        .await
        .unwrap();
    let total = TaskService::count_tasks(&deps, user.id, &filter)
        .await
        .unwrap();
    assert_eq!(total, 7);
    assert_eq!(unbounded.len(), 7);

    for limit in 1..=4u64 {
        let mut concatenated = Vec::new();
        for page in 1..=total.div_ceil(limit) + 1 {
            let paged = TaskFilter {
                page: Some(page),
                limit: Some(limit),
                ..filter.clone()
            };
            concatenated.extend(
                TaskService::list_tasks_by_user(&deps, user.id, &paged)
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(ids(&concatenated), ids(&unbounded), "limit {}", limit);
    }
}
