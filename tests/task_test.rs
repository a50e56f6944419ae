mod common;

use time::Duration;

use tasknest::deps::{Clock, Deps};
use tasknest::error::AppError;
use tasknest::models::{CreateTask, TaskFilter, TaskStatus, UpdateTask};
use tasknest::services::{ProjectService, TaskService};

use common::{clocked_deps, Factory};

fn new_task(user_id: i64, project_id: i64, title: &str) -> CreateTask {
    CreateTask {
        user_id,
        project_id,
        parent_task_id: None,
        title: title.to_string(),
        description: None,
        priority: None,
        due_date: None,
    }
}

#[tokio::test]
async fn test_complete_task_scenario() {
    let (deps, clock) = clocked_deps();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;
    let work = factory.create_project(user.id, "Work").await;
    let task = factory.create_task(user.id, work.id, "Write report").await;

    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.priority, 0);
    assert!(task.completed_at.is_none());

    clock.advance(Duration::hours(1));
    let completed = TaskService::complete_task(&deps, task.id, user.id)
        .await
        .unwrap();
    assert_eq!(completed.status, TaskStatus::Completed);
    assert_eq!(completed.completed_at, Some(clock.now()));

    let again = TaskService::complete_task(&deps, task.id, user.id).await;
    assert!(matches!(again, Err(AppError::PreconditionFailed(_))));
}

#[tokio::test]
async fn test_create_task_under_foreign_project_is_forbidden() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let owner = factory.create_user("owner@example.com").await;
    let intruder = factory.create_user("intruder@example.com").await;
    let project = factory.create_project(owner.id, "Private").await;

    let result = TaskService::create_task(&deps, new_task(intruder.id, project.id, "Hi")).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_create_task_under_missing_project_is_not_found() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;

    let result = TaskService::create_task(&deps, new_task(user.id, 42, "Lost")).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_create_task_with_parent_in_other_project_is_invalid() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;
    let home = factory.create_project(user.id, "Home").await;
    let work = factory.create_project(user.id, "Work").await;
    let parent = factory.create_task(user.id, home.id, "Clean").await;

    let result = TaskService::create_task(
        &deps,
        CreateTask {
            parent_task_id: Some(parent.id),
            ..new_task(user.id, work.id, "Vacuum")
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::InvalidHierarchy(_))));

    let missing = TaskService::create_task(
        &deps,
        CreateTask {
            parent_task_id: Some(9_999),
            ..new_task(user.id, work.id, "Vacuum")
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::InvalidHierarchy(_))));
}

#[tokio::test]
async fn test_create_subtask_in_same_project() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;
    let project = factory.create_project(user.id, "Home").await;
    let parent = factory.create_task(user.id, project.id, "Clean").await;

    let child = factory
        .create_task_with(CreateTask {
            parent_task_id: Some(parent.id),
            priority: Some(3),
            ..new_task(user.id, project.id, "Vacuum")
        })
        .await;

    assert_eq!(child.parent_task_id, Some(parent.id));
    assert_eq!(child.priority, 3);

    let subtasks = TaskService::list_subtasks(&deps, parent.id, user.id)
        .await
        .unwrap();
    assert_eq!(subtasks, vec![child]);
}

#[tokio::test]
async fn test_update_task_of_other_user_is_not_found() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let owner = factory.create_user("owner@example.com").await;
    let stranger = factory.create_user("stranger@example.com").await;
    let project = factory.create_project(owner.id, "Mine").await;
    let task = factory.create_task(owner.id, project.id, "Secret").await;

    let update = UpdateTask {
        title: Some("Hijacked".to_string()),
        ..UpdateTask::default()
    };
    let foreign = TaskService::update_task(&deps, task.id, update.clone(), stranger.id).await;
    let missing = TaskService::update_task(&deps, 12_345, update, stranger.id).await;

    // Indistinguishable from a task that does not exist
    assert!(matches!(foreign, Err(AppError::NotFound(ref what)) if what == "Task"));
    assert!(matches!(missing, Err(AppError::NotFound(ref what)) if what == "Task"));

    let complete = TaskService::complete_task(&deps, task.id, stranger.id).await;
    assert!(matches!(complete, Err(AppError::NotFound(_))));
    let delete = TaskService::delete_task(&deps, task.id, stranger.id).await;
    assert!(matches!(delete, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_update_task_status_keeps_completed_at_in_sync() {
    let (deps, clock) = clocked_deps();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;
    let project = factory.create_project(user.id, "Work").await;
    let task = factory.create_task(user.id, project.id, "Ship").await;

    let started = TaskService::update_task(
        &deps,
        task.id,
        UpdateTask {
            status: Some(TaskStatus::InProgress),
            ..UpdateTask::default()
        },
        user.id,
    )
    .await
    .unwrap();
    assert_eq!(started.status, TaskStatus::InProgress);
    assert!(started.completed_at.is_none());

    clock.advance(Duration::minutes(30));
    let done = TaskService::update_task(
        &deps,
        task.id,
        UpdateTask {
            status: Some(TaskStatus::Completed),
            ..UpdateTask::default()
        },
        user.id,
    )
    .await
    .unwrap();
    assert_eq!(done.completed_at, Some(clock.now()));

    // Plain updates may leave the completed state; the stamp goes with it
    let reopened = TaskService::update_task(
        &deps,
        task.id,
        UpdateTask {
            status: Some(TaskStatus::Pending),
            ..UpdateTask::default()
        },
        user.id,
    )
    .await
    .unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert!(reopened.completed_at.is_none());

    // And completion works again afterwards
    let completed = TaskService::complete_task(&deps, task.id, user.id)
        .await
        .unwrap();
    assert!(completed.completed_at.is_some());
}

#[tokio::test]
async fn test_update_task_parent_rules() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;
    let home = factory.create_project(user.id, "Home").await;
    let work = factory.create_project(user.id, "Work").await;
    let a = factory.create_task(user.id, home.id, "A").await;
    let b = factory.create_task(user.id, home.id, "B").await;
    let elsewhere = factory.create_task(user.id, work.id, "Elsewhere").await;

    let self_parent = TaskService::update_task(
        &deps,
        a.id,
        UpdateTask {
            parent_task_id: Some(Some(a.id)),
            ..UpdateTask::default()
        },
        user.id,
    )
    .await;
    assert!(matches!(self_parent, Err(AppError::InvalidHierarchy(_))));

    let cross_project = TaskService::update_task(
        &deps,
        a.id,
        UpdateTask {
            parent_task_id: Some(Some(elsewhere.id)),
            ..UpdateTask::default()
        },
        user.id,
    )
    .await;
    assert!(matches!(cross_project, Err(AppError::InvalidHierarchy(_))));

    let nested = TaskService::update_task(
        &deps,
        a.id,
        UpdateTask {
            parent_task_id: Some(Some(b.id)),
            ..UpdateTask::default()
        },
        user.id,
    )
    .await
    .unwrap();
    assert_eq!(nested.parent_task_id, Some(b.id));

    let detached = TaskService::update_task(
        &deps,
        a.id,
        UpdateTask {
            parent_task_id: Some(None),
            ..UpdateTask::default()
        },
        user.id,
    )
    .await
    .unwrap();
    assert_eq!(detached.parent_task_id, None);
}

#[tokio::test]
async fn test_delete_task_with_subtasks_is_allowed() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;
    let project = factory.create_project(user.id, "Home").await;
    let parent = factory.create_task(user.id, project.id, "Parent").await;
    factory
        .create_task_with(CreateTask {
            parent_task_id: Some(parent.id),
            ..new_task(user.id, project.id, "Child")
        })
        .await;

    TaskService::delete_task(&deps, parent.id, user.id)
        .await
        .unwrap();

    assert!(TaskService::get_task(&deps, parent.id)
        .await
        .unwrap()
        .is_none());
    let again = TaskService::delete_task(&deps, parent.id, user.id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_soft_deleted_tasks_only_listed_on_request() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;
    let project = factory.create_project(user.id, "Home").await;
    let kept = factory.create_task(user.id, project.id, "Kept").await;
    let gone = factory.create_task(user.id, project.id, "Gone").await;

    TaskService::delete_task(&deps, gone.id, user.id)
        .await
        .unwrap();

    let live = TaskService::list_tasks_by_user(&deps, user.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(live.iter().map(|t| t.id).collect::<Vec<_>>(), vec![kept.id]);

    let everything = TaskService::list_tasks_by_user(
        &deps,
        user.id,
        &TaskFilter {
            include_deleted: true,
            ..TaskFilter::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(
        everything.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![kept.id, gone.id]
    );
    assert!(everything[1].deleted_at.is_some());

    let by_project = TaskService::list_tasks_by_project(&deps, project.id)
        .await
        .unwrap();
    assert_eq!(by_project.len(), 1);
}

#[tokio::test]
async fn test_deleted_project_rejects_new_tasks() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;
    let project = factory.create_project(user.id, "Closed").await;
    ProjectService::delete_project(&deps, project.id, user.id)
        .await
        .unwrap();

    let result = TaskService::create_task(&deps, new_task(user.id, project.id, "Late")).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_blank_title_is_rejected() {
    let deps = Deps::in_memory();
    let factory = Factory::new(&deps);
    let user = factory.create_user("a@example.com").await;
    let project = factory.create_project(user.id, "Home").await;

    let result = TaskService::create_task(&deps, new_task(user.id, project.id, "  ")).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}
