/// Access control evaluator
///
/// Every project, task, and comment mutation asks [`authorize`] before it
/// touches the store. The evaluator is a pure function of the actor, the
/// action, and the already-loaded resource, so it never queries anything and
/// can be tested exhaustively.
///
/// # Rules (first match wins)
///
/// 1. Removing the project owner from the member list is denied for everyone,
///    admins included.
/// 2. Admins are allowed everything else.
/// 3. Project actions need the owner or a member; deleting the project needs
///    the owner.
/// 4. Task actions (including attachments) inherit the project check.
/// 5. Creating and viewing comments inherit the project check; editing needs
///    the author; deleting needs the author or the project owner.
///
/// Role changes are decided separately by [`authorize_role_change`].
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::access::{authorize, Action, Actor, Decision, Resource};
/// use taskhub_shared::models::project::Project;
/// use taskhub_shared::models::user::UserRole;
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let project = Project {
///     id: Uuid::new_v4(),
///     name: "Launch".into(),
///     description: String::new(),
///     color: "#3B82F6".into(),
///     owner_id: owner,
///     member_ids: vec![owner],
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
/// let stranger = Actor {
///     id: Uuid::new_v4(),
///     name: "Eve".into(),
///     email: "eve@example.com".into(),
///     role: UserRole::User,
/// };
///
/// let decision = authorize(&stranger, Action::ViewProject, Resource::Project(&project));
/// assert!(!decision.is_allowed());
/// ```

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::models::comment::Comment;
use crate::models::project::Project;
use crate::models::task::Task;
use crate::models::user::{User, UserRole};

/// The authenticated user a request acts on behalf of
///
/// Built from the freshly loaded user record, never from token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Something an actor wants to do to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewProject,
    UpdateProject,
    AddMember,
    RemoveMember { target: Uuid },
    DeleteProject,

    ViewTask,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ManageAttachments,

    CreateComment,
    ViewComments,
    EditComment,
    DeleteComment,
}

/// The loaded resource an action targets, with its owning project
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Project(&'a Project),
    Task {
        task: &'a Task,
        project: &'a Project,
    },
    Comment {
        comment: &'a Comment,
        project: &'a Project,
    },
}

impl<'a> Resource<'a> {
    fn project(&self) -> &'a Project {
        match *self {
            Resource::Project(project) => project,
            Resource::Task { project, .. } => project,
            Resource::Comment { project, .. } => project,
        }
    }
}

/// Why an action was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotProjectMember,
    NotProjectOwner,
    NotCommentAuthor,
    CannotRemoveOwner,
    AdminRequired,
    SelfDemotion,
}

impl DenyReason {
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::NotProjectMember => "You are not a member of this project",
            DenyReason::NotProjectOwner => "Only the project owner can perform this action",
            DenyReason::NotCommentAuthor => "Only the comment author can edit this comment",
            DenyReason::CannotRemoveOwner => "The project owner cannot be removed from the project",
            DenyReason::AdminRequired => "Admin access required",
            DenyReason::SelfDemotion => "You cannot remove your own admin role",
        }
    }

    /// Denials that describe a state conflict rather than missing rights
    pub fn is_conflict(&self) -> bool {
        matches!(self, DenyReason::CannotRemoveOwner | DenyReason::SelfDemotion)
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

fn member_check(actor: &Actor, project: &Project) -> Decision {
    if project.is_member(actor.id) {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotProjectMember)
    }
}

/// Decides whether `actor` may perform `action` on `resource`
pub fn authorize(actor: &Actor, action: Action, resource: Resource<'_>) -> Decision {
    let project = resource.project();

    if let Action::RemoveMember { target } = action {
        if project.is_owner(target) {
            return Decision::Deny(DenyReason::CannotRemoveOwner);
        }
    }

    if actor.is_admin() {
        return Decision::Allow;
    }

    match action {
        Action::DeleteProject => {
            if project.is_owner(actor.id) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotProjectOwner)
            }
        }

        Action::EditComment => match resource {
            Resource::Comment { comment, .. } if comment.author_id == actor.id => Decision::Allow,
            _ => Decision::Deny(DenyReason::NotCommentAuthor),
        },

        Action::DeleteComment => match resource {
            Resource::Comment { comment, project }
                if comment.author_id == actor.id || project.is_owner(actor.id) =>
            {
                Decision::Allow
            }
            _ => Decision::Deny(DenyReason::NotCommentAuthor),
        },

        Action::ViewProject
        | Action::UpdateProject
        | Action::AddMember
        | Action::RemoveMember { .. }
        | Action::ViewTask
        | Action::CreateTask
        | Action::UpdateTask
        | Action::DeleteTask
        | Action::ManageAttachments
        | Action::CreateComment
        | Action::ViewComments => member_check(actor, project),
    }
}

/// Decides whether `actor` may set `target_id`'s global role to `new_role`
pub fn authorize_role_change(actor: &Actor, target_id: Uuid, new_role: UserRole) -> Decision {
    if !actor.is_admin() {
        return Decision::Deny(DenyReason::AdminRequired);
    }

    if actor.id == target_id && !new_role.is_admin() {
        return Decision::Deny(DenyReason::SelfDemotion);
    }

    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use chrono::Utc;

    fn actor(role: UserRole) -> Actor {
        let id = Uuid::new_v4();
        Actor {
            id,
            name: format!("user-{}", id),
            email: format!("{}@example.com", id),
            role,
        }
    }

    fn project(owner: Uuid, members: Vec<Uuid>) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Board".to_string(),
            description: String::new(),
            color: "#3B82F6".to_string(),
            owner_id: owner,
            member_ids: members,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(project: &Project) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Write tests".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            project_id: project.id,
            assignee_id: None,
            created_by: project.owner_id,
            attachments: vec![],
            position: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn comment(author: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            content: "Looks good".to_string(),
            task_id: Uuid::new_v4(),
            author_id: author,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_project_actions_for_owner_member_and_stranger() {
        let owner = actor(UserRole::User);
        let member = actor(UserRole::User);
        let stranger = actor(UserRole::User);
        let p = project(owner.id, vec![owner.id, member.id]);

        for action in [Action::ViewProject, Action::UpdateProject, Action::AddMember] {
            assert_eq!(authorize(&owner, action, Resource::Project(&p)), Decision::Allow);
            assert_eq!(authorize(&member, action, Resource::Project(&p)), Decision::Allow);
            assert_eq!(
                authorize(&stranger, action, Resource::Project(&p)),
                Decision::Deny(DenyReason::NotProjectMember)
            );
        }
    }

    #[test]
    fn test_owner_counts_as_member_without_listing() {
        let owner = actor(UserRole::User);
        let p = project(owner.id, vec![]);

        assert!(authorize(&owner, Action::CreateTask, Resource::Project(&p)).is_allowed());
    }

    #[test]
    fn test_delete_project_requires_owner() {
        let owner = actor(UserRole::User);
        let member = actor(UserRole::User);
        let p = project(owner.id, vec![owner.id, member.id]);

        assert!(authorize(&owner, Action::DeleteProject, Resource::Project(&p)).is_allowed());
        assert_eq!(
            authorize(&member, Action::DeleteProject, Resource::Project(&p)),
            Decision::Deny(DenyReason::NotProjectOwner)
        );
    }

    #[test]
    fn test_admin_bypass() {
        let owner = actor(UserRole::User);
        let admin = actor(UserRole::Admin);
        let p = project(owner.id, vec![owner.id]);
        let t = task(&p);
        let c = comment(owner.id);

        assert!(authorize(&admin, Action::DeleteProject, Resource::Project(&p)).is_allowed());
        assert!(authorize(
            &admin,
            Action::DeleteTask,
            Resource::Task {
                task: &t,
                project: &p
            }
        )
        .is_allowed());
        assert!(authorize(
            &admin,
            Action::EditComment,
            Resource::Comment {
                comment: &c,
                project: &p
            }
        )
        .is_allowed());
    }

    #[test]
    fn test_owner_removal_denied_even_for_admin() {
        let owner = actor(UserRole::User);
        let admin = actor(UserRole::Admin);
        let member = actor(UserRole::User);
        let p = project(owner.id, vec![owner.id, member.id]);

        let remove_owner = Action::RemoveMember { target: owner.id };
        for who in [&owner, &admin, &member] {
            assert_eq!(
                authorize(who, remove_owner, Resource::Project(&p)),
                Decision::Deny(DenyReason::CannotRemoveOwner)
            );
        }

        let remove_member = Action::RemoveMember { target: member.id };
        assert!(authorize(&owner, remove_member, Resource::Project(&p)).is_allowed());
        assert!(authorize(&member, remove_member, Resource::Project(&p)).is_allowed());
    }

    #[test]
    fn test_task_actions_inherit_project_membership() {
        let owner = actor(UserRole::User);
        let member = actor(UserRole::User);
        let stranger = actor(UserRole::User);
        let p = project(owner.id, vec![owner.id, member.id]);
        let t = task(&p);
        let resource = Resource::Task {
            task: &t,
            project: &p,
        };

        for action in [
            Action::ViewTask,
            Action::UpdateTask,
            Action::DeleteTask,
            Action::ManageAttachments,
            Action::CreateComment,
            Action::ViewComments,
        ] {
            assert!(authorize(&member, action, resource).is_allowed());
            assert_eq!(
                authorize(&stranger, action, resource),
                Decision::Deny(DenyReason::NotProjectMember)
            );
        }
    }

    #[test]
    fn test_comment_edit_and_delete() {
        let owner = actor(UserRole::User);
        let author = actor(UserRole::User);
        let other = actor(UserRole::User);
        let p = project(owner.id, vec![owner.id, author.id, other.id]);
        let c = comment(author.id);
        let resource = Resource::Comment {
            comment: &c,
            project: &p,
        };

        assert!(authorize(&author, Action::EditComment, resource).is_allowed());
        assert_eq!(
            authorize(&owner, Action::EditComment, resource),
            Decision::Deny(DenyReason::NotCommentAuthor)
        );

        assert!(authorize(&author, Action::DeleteComment, resource).is_allowed());
        assert!(authorize(&owner, Action::DeleteComment, resource).is_allowed());
        assert_eq!(
            authorize(&other, Action::DeleteComment, resource),
            Decision::Deny(DenyReason::NotCommentAuthor)
        );
    }

    #[test]
    fn test_role_change_rules() {
        let admin = actor(UserRole::Admin);
        let user = actor(UserRole::User);
        let target = Uuid::new_v4();

        assert!(authorize_role_change(&admin, target, UserRole::Admin).is_allowed());
        assert!(authorize_role_change(&admin, target, UserRole::User).is_allowed());
        assert!(authorize_role_change(&admin, admin.id, UserRole::Admin).is_allowed());
        assert_eq!(
            authorize_role_change(&admin, admin.id, UserRole::User),
            Decision::Deny(DenyReason::SelfDemotion)
        );
        assert_eq!(
            authorize_role_change(&user, target, UserRole::Admin),
            Decision::Deny(DenyReason::AdminRequired)
        );
    }

    #[test]
    fn test_deny_messages_are_distinct() {
        let reasons = [
            DenyReason::NotProjectMember,
            DenyReason::NotProjectOwner,
            DenyReason::NotCommentAuthor,
            DenyReason::CannotRemoveOwner,
            DenyReason::AdminRequired,
            DenyReason::SelfDemotion,
        ];
        let messages: std::collections::HashSet<_> = reasons.iter().map(|r| r.message()).collect();
        assert_eq!(messages.len(), reasons.len());
    }
}
