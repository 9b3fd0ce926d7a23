/// Project service: ownership, membership, cascading delete

mod common;

use bytes::Bytes;
use common::TestContext;
use taskhub_shared::error::ServiceError;
use taskhub_shared::models::activity::ActivityType;
use taskhub_shared::models::project::DEFAULT_PROJECT_COLOR;
use taskhub_shared::services::{AttachmentUpload, ProjectInput, ProjectPatch};
use taskhub_shared::store::Store;

#[tokio::test]
async fn test_create_project_seeds_owner_membership() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;

    let project = ctx
        .services
        .projects
        .create(
            &alice,
            ProjectInput {
                name: "  Website  ".to_string(),
                description: Some("Relaunch".to_string()),
                color: Some("#10b981".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(project.name, "Website");
    assert_eq!(project.color, "#10B981");
    assert_eq!(project.owner_id, alice.id);
    assert_eq!(project.member_ids, vec![alice.id]);

    let plain = ctx.project(&alice, "Plain").await;
    assert_eq!(plain.color, DEFAULT_PROJECT_COLOR);
    assert_eq!(plain.description, "");
}

#[tokio::test]
async fn test_create_project_validates_input() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;

    for input in [
        ProjectInput {
            name: "   ".to_string(),
            ..Default::default()
        },
        ProjectInput {
            name: "x".repeat(101),
            ..Default::default()
        },
        ProjectInput {
            name: "Ok".to_string(),
            color: Some("blue".to_string()),
            ..Default::default()
        },
        ProjectInput {
            name: "Ok".to_string(),
            description: Some("d".repeat(501)),
            ..Default::default()
        },
    ] {
        let err = ctx.services.projects.create(&alice, input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "{:?}", err);
    }
}

#[tokio::test]
async fn test_membership_gates_project_access() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let bob = ctx.user("Bob").await;
    let project = ctx.project(&alice, "P").await;

    let err = ctx.services.projects.get(&bob, project.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    ctx.services
        .projects
        .add_member(&alice, project.id, bob.id)
        .await
        .unwrap();

    let seen = ctx.services.projects.get(&bob, project.id).await.unwrap();
    assert_eq!(seen.id, project.id);

    let listed = ctx.services.projects.list(&bob).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_admin_sees_every_project() {
    let ctx = TestContext::new();
    let admin = ctx.admin("Root").await;
    let alice = ctx.user("Alice").await;
    let bob = ctx.user("Bob").await;
    ctx.project(&alice, "A").await;
    ctx.project(&bob, "B").await;

    assert_eq!(ctx.services.projects.list(&admin).await.unwrap().len(), 2);
    assert_eq!(ctx.services.projects.list(&alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_member_twice_is_conflict() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let bob = ctx.user("Bob").await;
    let project = ctx.project(&alice, "P").await;

    ctx.services
        .projects
        .add_member(&alice, project.id, bob.id)
        .await
        .unwrap();
    let err = ctx
        .services
        .projects
        .add_member(&alice, project.id, bob.id)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
    let stored = ctx.store.find_project(project.id).await.unwrap().unwrap();
    assert_eq!(stored.member_ids, vec![alice.id, bob.id]);

    let kinds = ctx.activity_kinds(project.id).await;
    assert_eq!(kinds, vec![ActivityType::MemberAdded]);
}

#[tokio::test]
async fn test_add_unknown_user_is_not_found() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let project = ctx.project(&alice, "P").await;

    let err = ctx
        .services
        .projects
        .add_member(&alice, project.id, uuid::Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_owner_cannot_be_removed() {
    let ctx = TestContext::new();
    let admin = ctx.admin("Root").await;
    let alice = ctx.user("Alice").await;
    let project = ctx.project(&alice, "P").await;

    for actor in [&alice, &admin] {
        let err = ctx
            .services
            .projects
            .remove_member(actor, project.id, alice.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    let stored = ctx.store.find_project(project.id).await.unwrap().unwrap();
    assert!(stored.member_ids.contains(&alice.id));
}

#[tokio::test]
async fn test_remove_member_revokes_access() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let bob = ctx.user("Bob").await;
    let project = ctx.project(&alice, "P").await;
    ctx.services
        .projects
        .add_member(&alice, project.id, bob.id)
        .await
        .unwrap();

    let updated = ctx
        .services
        .projects
        .remove_member(&alice, project.id, bob.id)
        .await
        .unwrap();
    assert_eq!(updated.member_ids, vec![alice.id]);

    let err = ctx.services.projects.get(&bob, project.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let again = ctx
        .services
        .projects
        .remove_member(&alice, project.id, bob.id)
        .await
        .unwrap_err();
    assert!(matches!(again, ServiceError::NotFound(_)));

    let activities = ctx.activities(project.id).await;
    assert_eq!(activities[0].kind, ActivityType::MemberRemoved);
    assert_eq!(activities[0].description, "Alice removed Bob from the project");
}

#[tokio::test]
async fn test_only_owner_deletes_project() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let bob = ctx.user("Bob").await;
    let project = ctx.project(&alice, "P").await;
    ctx.services
        .projects
        .add_member(&alice, project.id, bob.id)
        .await
        .unwrap();

    let err = ctx.services.projects.delete(&bob, project.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let renamed = ctx
        .services
        .projects
        .update(
            &bob,
            project.id,
            ProjectPatch {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Renamed");
}

#[tokio::test]
async fn test_delete_project_cascades_and_cleans_blobs() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let project = ctx.project(&alice, "P").await;
    let task = ctx.task(&alice, &project, "With files").await;

    for name in ["a.pdf", "b.pdf"] {
        ctx.services
            .attachments
            .upload(
                &alice,
                task.id,
                AttachmentUpload {
                    original_name: name.to_string(),
                    mime_type: "application/pdf".to_string(),
                    bytes: Bytes::from_static(b"%PDF-1.4"),
                },
            )
            .await
            .unwrap();
    }
    ctx.services
        .comments
        .create(&alice, task.id, "first")
        .await
        .unwrap();
    assert_eq!(ctx.blobs.object_count(), 2);

    ctx.services.projects.delete(&alice, project.id).await.unwrap();

    assert_eq!(ctx.blobs.delete_calls(), 2);
    assert_eq!(ctx.blobs.object_count(), 0);
    assert!(ctx.store.find_project(project.id).await.unwrap().is_none());
    assert!(ctx.store.find_task(task.id).await.unwrap().is_none());
    assert!(ctx.store.list_comments(task.id).await.unwrap().is_empty());
    assert_eq!(ctx.store.count_activities(project.id).await.unwrap(), 0);

    let err = ctx.services.projects.get(&alice, project.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
