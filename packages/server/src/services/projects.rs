use chrono::Utc;
use common::{Action, ProjectStatus};
use tracing::{info, instrument};

use super::HackdayService;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::project::ProjectEdit;
use crate::store::Project;

impl HackdayService<'_> {
    /// Submitted projects, plus the caller's own team project. Managers see all.
    pub async fn list_projects(&self, caller: &AuthUser) -> Result<Vec<Project>, AppError> {
        let own_team = self
            .store
            .find_team_of_user(caller.user_id)
            .await?
            .map(|t| t.id);
        let projects = self.store.list_projects().await?;
        Ok(projects
            .into_iter()
            .filter(|p| caller.is_manager() || p.status.is_submitted() || Some(p.team_id) == own_team)
            .collect())
    }

    /// Unsubmitted projects are visible only to their team and managers.
    pub async fn get_project(&self, caller: &AuthUser, id: i32) -> Result<Project, AppError> {
        let project = self.require_project(id).await?;
        if project.status.is_submitted() || caller.is_manager() {
            return Ok(project);
        }
        let on_team = self
            .store
            .find_team_of_user(caller.user_id)
            .await?
            .is_some_and(|t| t.id == project.team_id);
        if on_team {
            Ok(project)
        } else {
            Err(AppError::NotFound("Project not found".into()))
        }
    }

    async fn require_member_project(&self, caller: &AuthUser, id: i32) -> Result<Project, AppError> {
        let project = self.require_project(id).await?;
        let team = self.require_team(project.team_id).await?;
        if !team.is_member(caller.user_id) {
            return Err(AppError::PermissionDenied(
                "Only team members can edit this project".into(),
            ));
        }
        Ok(project)
    }

    /// Save draft fields. A submitted project stays submitted.
    #[instrument(skip(self, caller, edit), fields(user_id = caller.user_id))]
    pub async fn update_project(
        &self,
        caller: &AuthUser,
        id: i32,
        edit: ProjectEdit,
    ) -> Result<Project, AppError> {
        self.gate(caller, Action::SaveDraft).await?;
        let mut project = self.require_member_project(caller, id).await?;

        if let Some(title) = edit.title {
            project.title = title;
        }
        if let Some(description) = edit.description {
            project.description = description;
        }
        if let Some(url) = edit.repo_url {
            project.repo_url = url;
        }
        if let Some(url) = edit.video_url {
            project.video_url = url;
        }
        if let Some(url) = edit.demo_url {
            project.demo_url = url;
        }
        if project.status.is_submitted() && (project.title.trim().is_empty() || !project.has_link()) {
            return Err(AppError::Validation(
                "A submitted project needs a title and at least one link".into(),
            ));
        }
        project.status = project.status.after_save();
        project.updated_at = Utc::now();

        Ok(self.store.save_project(project).await?)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn submit_project(&self, caller: &AuthUser, id: i32) -> Result<Project, AppError> {
        self.gate(caller, Action::SubmitProject).await?;
        let mut project = self.require_member_project(caller, id).await?;
        if project.status.is_submitted() {
            return Ok(project);
        }
        if project.title.trim().is_empty() {
            return Err(AppError::Validation("Add a title before submitting".into()));
        }
        if !project.has_link() {
            return Err(AppError::Validation(
                "Add a repository, video or demo link before submitting".into(),
            ));
        }

        let now = Utc::now();
        project.status = ProjectStatus::Submitted;
        project.submitted_at = Some(now);
        project.updated_at = now;
        let project = self.store.save_project(project).await?;
        info!(project_id = project.id, team_id = project.team_id, "Project submitted");
        Ok(project)
    }
}
