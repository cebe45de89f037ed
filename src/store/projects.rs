//! Named snapshots of the working set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{keys, ExportBundle, Store};
use crate::db::KvBackend;
use crate::error::{LexgraphError, Result};
use crate::model::{Connection, PosType, RelationType, Word};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    pub words: Vec<Word>,
    pub connections: Vec<Connection>,
    pub relation_types: Vec<RelationType>,
    #[serde(default)]
    pub pos_types: Vec<PosType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: ProjectData,
}

impl Project {
    fn new(name: &str, description: Option<&str>, data: ProjectData) -> Self {
        let now = Utc::now();
        Self {
            id: format!("project_{}", Uuid::new_v4()),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
            data,
        }
    }
}

impl<B: KvBackend> Store<B> {
    pub fn projects(&self) -> Result<Vec<Project>> {
        Ok(self.load_value(keys::PROJECTS)?.unwrap_or_default())
    }

    fn save_projects(&self, projects: &[Project]) -> Result<()> {
        self.save_value(keys::PROJECTS, projects)
    }

    pub fn current_project_id(&self) -> Result<Option<String>> {
        self.load_value(keys::CURRENT_PROJECT)
    }

    fn set_current_project(&self, id: &str) -> Result<()> {
        self.save_value(keys::CURRENT_PROJECT, id)
    }

    fn working_set(&self) -> Result<ProjectData> {
        Ok(ProjectData {
            words: self.words()?,
            connections: self.connections()?,
            relation_types: self.relation_types()?,
            pos_types: self.pos_types()?,
        })
    }

    /// Snapshot the working set as a new project and make it current.
    pub fn create_project_from_current(&self, name: &str, description: Option<&str>) -> Result<Project> {
        let project = Project::new(name, description, self.working_set()?);
        let mut projects = self.projects()?;
        projects.push(project.clone());
        self.save_projects(&projects)?;
        self.set_current_project(&project.id)?;
        log::info!("Created project '{}' ({})", project.name, project.id);
        Ok(project)
    }

    /// Store an imported bundle as a project without touching the working set.
    pub fn import_as_project(&self, name: &str, bundle: ExportBundle, description: Option<&str>) -> Result<Project> {
        super::check_word_ids(&bundle.words)?;
        let data = ProjectData {
            words: bundle.words,
            connections: bundle.connections,
            relation_types: bundle.relation_types,
            pos_types: bundle.pos_types.unwrap_or_default(),
        };
        let project = Project::new(name, description, data);
        let mut projects = self.projects()?;
        projects.push(project.clone());
        self.save_projects(&projects)?;
        Ok(project)
    }

    /// Load a project's snapshot into the working set.
    pub fn switch_to_project(&self, id: &str) -> Result<()> {
        let projects = self.projects()?;
        let project = projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| LexgraphError::ProjectNotFound(id.to_string()))?;
        self.save_words(&project.data.words)?;
        self.save_connections(&project.data.connections)?;
        self.save_relation_types(&project.data.relation_types)?;
        self.save_pos_types(&project.data.pos_types)?;
        self.set_current_project(id)?;
        log::info!("Switched to project '{}'", project.name);
        Ok(())
    }

    /// True when the working set differs from the current project's snapshot.
    pub fn has_unsaved_changes(&self) -> Result<bool> {
        let Some(current) = self.current_project_id()? else {
            return Ok(false);
        };
        let projects = self.projects()?;
        let Some(project) = projects.iter().find(|p| p.id == current) else {
            return Ok(false);
        };
        Ok(self.working_set()? != project.data)
    }

    /// Overwrite the current project's snapshot with the working set.
    /// Returns false when no project is current.
    pub fn update_current_project(&self) -> Result<bool> {
        let Some(current) = self.current_project_id()? else {
            return Ok(false);
        };
        let mut projects = self.projects()?;
        let Some(project) = projects.iter_mut().find(|p| p.id == current) else {
            return Ok(false);
        };
        project.data = self.working_set()?;
        project.updated_at = Utc::now();
        self.save_projects(&projects)?;
        Ok(true)
    }

    pub fn rename_project(&self, id: &str, name: &str, description: Option<&str>) -> Result<bool> {
        let mut projects = self.projects()?;
        let Some(project) = projects.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        project.name = name.to_string();
        if let Some(description) = description {
            project.description = Some(description.to_string());
        }
        project.updated_at = Utc::now();
        self.save_projects(&projects)?;
        Ok(true)
    }

    /// Delete a project. Deleting the current project also clears the
    /// working set.
    pub fn delete_project(&self, id: &str) -> Result<bool> {
        let mut projects = self.projects()?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Ok(false);
        }
        self.save_projects(&projects)?;

        if self.current_project_id()?.as_deref() == Some(id) {
            self.remove_value(keys::CURRENT_PROJECT)?;
            self.clear_all()?;
        }
        Ok(true)
    }

    pub fn export_project(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.projects()?.into_iter().find(|p| p.id == id))
    }
}
