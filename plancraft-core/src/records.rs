//! Projects and equipment records
//!
//! The import pipeline only needs [`EquipmentRepository::create_equipment`]; the full
//! create/list/get/update/delete surface backs the CLI. [`MemoryRepository`]
//! implements both traits and can be saved to a single JSON file.

use crate::store::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// A financial plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub first_year: i32,
    pub num_years: u32,
    pub currency: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Bumped on every update and when the project is selected as current
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub first_year: i32,
    pub num_years: u32,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Fields left `None` keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub first_year: Option<i32>,
    pub num_years: Option<u32>,
    pub currency: Option<String>,
}

pub const DEFAULT_CURRENCY: &str = "EUR";
pub const DEFAULT_ANO0: &str = "0,00";

/// One line item of an asset sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: u64,
    pub project_id: u64,
    pub sheet_key: String,
    pub equipment_name: String,
    /// Initial-year value, display formatted ("1.234,50")
    pub ano0: String,
    /// Year -> display formatted value
    #[serde(default)]
    pub year_values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEquipment {
    /// May be omitted in bulk payloads, where the target sheet supplies it
    #[serde(default)]
    pub project_id: u64,
    #[serde(default)]
    pub sheet_key: String,
    pub equipment_name: String,
    #[serde(default)]
    pub ano0: Option<String>,
    #[serde(default)]
    pub year_values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentUpdate {
    pub sheet_key: Option<String>,
    pub equipment_name: Option<String>,
    pub ano0: Option<String>,
    pub year_values: Option<BTreeMap<String, String>>,
}

pub trait ProjectRepository {
    fn create_project(&mut self, project: NewProject) -> Result<Project>;
    fn list_projects(&self) -> Result<Vec<Project>>;
    fn get_project(&self, id: u64) -> Result<Project>;
    fn update_project(&mut self, id: u64, update: ProjectUpdate) -> Result<Project>;
    /// Deleting a project also deletes its equipment
    fn delete_project(&mut self, id: u64) -> Result<()>;
    /// Select `id` as the current project
    fn set_current_project(&mut self, id: u64) -> Result<Project>;
    /// The project most recently selected, created or updated
    fn current_project(&self) -> Result<Option<Project>>;
}

pub trait EquipmentRepository {
    fn create_equipment(&mut self, equipment: NewEquipment) -> Result<Equipment>;
    /// Equipment of one project sheet, in creation order
    fn list_equipment(&self, project_id: u64, sheet_key: &str) -> Result<Vec<Equipment>>;
    fn get_equipment(&self, id: u64) -> Result<Equipment>;
    fn update_equipment(&mut self, id: u64, update: EquipmentUpdate) -> Result<Equipment>;
    fn delete_equipment(&mut self, id: u64) -> Result<()>;
    /// Replace every item of one project sheet with `items`, whose own
    /// project and sheet fields are ignored. Nothing changes when an item is
    /// invalid.
    fn replace_equipment(
        &mut self,
        project_id: u64,
        sheet_key: &str,
        items: Vec<NewEquipment>,
    ) -> Result<Vec<Equipment>>;
}

/// In-memory records with sequential ids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRepository {
    next_id: u64,
    #[serde(default)]
    current: Option<u64>,
    projects: Vec<Project>,
    equipment: Vec<Equipment>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; a missing file yields an empty repository
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the whole repository; the file is replaced atomically
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path.as_ref(), json.as_bytes())?;
        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn project_index(&self, id: u64) -> Result<usize> {
        self.projects
            .iter()
            .position(|p| p.id == id)
            .ok_or(RepositoryError::NotFound {
                kind: "project",
                id,
            })
    }

    fn equipment_index(&self, id: u64) -> Result<usize> {
        self.equipment
            .iter()
            .position(|e| e.id == id)
            .ok_or(RepositoryError::NotFound {
                kind: "equipment",
                id,
            })
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RepositoryError::Invalid(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_years(num_years: u32) -> Result<()> {
    if num_years == 0 {
        return Err(RepositoryError::Invalid(
            "numYears must be at least 1".to_string(),
        ));
    }
    Ok(())
}

impl ProjectRepository for MemoryRepository {
    fn create_project(&mut self, project: NewProject) -> Result<Project> {
        require_text("name", &project.name)?;
        require_years(project.num_years)?;

        let now = Utc::now();
        let created = Project {
            id: self.allocate_id(),
            name: project.name,
            first_year: project.first_year,
            num_years: project.num_years,
            currency: project
                .currency
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            created_at: now,
            updated_at: now,
        };
        self.current = Some(created.id);
        self.projects.push(created.clone());
        Ok(created)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.projects.clone())
    }

    fn get_project(&self, id: u64) -> Result<Project> {
        let idx = self.project_index(id)?;
        Ok(self.projects[idx].clone())
    }

    fn update_project(&mut self, id: u64, update: ProjectUpdate) -> Result<Project> {
        let idx = self.project_index(id)?;
        if let Some(name) = &update.name {
            require_text("name", name)?;
        }
        if let Some(num_years) = update.num_years {
            require_years(num_years)?;
        }

        let project = &mut self.projects[idx];
        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(first_year) = update.first_year {
            project.first_year = first_year;
        }
        if let Some(num_years) = update.num_years {
            project.num_years = num_years;
        }
        if let Some(currency) = update.currency {
            project.currency = currency;
        }
        project.updated_at = Utc::now();
        let updated = project.clone();
        self.current = Some(id);
        Ok(updated)
    }

    fn delete_project(&mut self, id: u64) -> Result<()> {
        let idx = self.project_index(id)?;
        self.projects.remove(idx);
        self.equipment.retain(|e| e.project_id != id);
        if self.current == Some(id) {
            self.current = None;
        }
        Ok(())
    }

    fn set_current_project(&mut self, id: u64) -> Result<Project> {
        let idx = self.project_index(id)?;
        self.projects[idx].updated_at = Utc::now();
        self.current = Some(id);
        Ok(self.projects[idx].clone())
    }

    fn current_project(&self) -> Result<Option<Project>> {
        let selected = self
            .current
            .and_then(|id| self.projects.iter().find(|p| p.id == id));
        // Files without a selection fall back to the latest update
        let project = selected.or_else(|| self.projects.iter().max_by_key(|p| p.updated_at));
        Ok(project.cloned())
    }
}

impl EquipmentRepository for MemoryRepository {
    fn create_equipment(&mut self, equipment: NewEquipment) -> Result<Equipment> {
        self.project_index(equipment.project_id)?;
        require_text("sheetKey", &equipment.sheet_key)?;
        require_text("equipmentName", &equipment.equipment_name)?;

        let created = Equipment {
            id: self.allocate_id(),
            project_id: equipment.project_id,
            sheet_key: equipment.sheet_key,
            equipment_name: equipment.equipment_name,
            ano0: equipment.ano0.unwrap_or_else(|| DEFAULT_ANO0.to_string()),
            year_values: equipment.year_values,
        };
        self.equipment.push(created.clone());
        Ok(created)
    }

    fn list_equipment(&self, project_id: u64, sheet_key: &str) -> Result<Vec<Equipment>> {
        self.project_index(project_id)?;
        Ok(self
            .equipment
            .iter()
            .filter(|e| e.project_id == project_id && e.sheet_key == sheet_key)
            .cloned()
            .collect())
    }

    fn get_equipment(&self, id: u64) -> Result<Equipment> {
        let idx = self.equipment_index(id)?;
        Ok(self.equipment[idx].clone())
    }

    fn update_equipment(&mut self, id: u64, update: EquipmentUpdate) -> Result<Equipment> {
        let idx = self.equipment_index(id)?;
        if let Some(name) = &update.equipment_name {
            require_text("equipmentName", name)?;
        }
        if let Some(key) = &update.sheet_key {
            require_text("sheetKey", key)?;
        }

        let item = &mut self.equipment[idx];
        if let Some(key) = update.sheet_key {
            item.sheet_key = key;
        }
        if let Some(name) = update.equipment_name {
            item.equipment_name = name;
        }
        if let Some(ano0) = update.ano0 {
            item.ano0 = ano0;
        }
        if let Some(year_values) = update.year_values {
            item.year_values = year_values;
        }
        Ok(item.clone())
    }

    fn delete_equipment(&mut self, id: u64) -> Result<()> {
        let idx = self.equipment_index(id)?;
        self.equipment.remove(idx);
        Ok(())
    }

    fn replace_equipment(
        &mut self,
        project_id: u64,
        sheet_key: &str,
        items: Vec<NewEquipment>,
    ) -> Result<Vec<Equipment>> {
        self.project_index(project_id)?;
        require_text("sheetKey", sheet_key)?;
        for item in &items {
            require_text("equipmentName", &item.equipment_name)?;
        }

        self.equipment
            .retain(|e| !(e.project_id == project_id && e.sheet_key == sheet_key));

        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            saved.push(self.create_equipment(NewEquipment {
                project_id,
                sheet_key: sheet_key.to_string(),
                ..item
            })?);
        }
        log::debug!(
            "Replaced equipment of project {} sheet '{}' with {} items",
            project_id,
            sheet_key,
            saved.len()
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_project(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            first_year: 2024,
            num_years: 5,
            currency: None,
        }
    }

    fn new_item(project_id: u64, sheet_key: &str, name: &str) -> NewEquipment {
        NewEquipment {
            project_id,
            sheet_key: sheet_key.to_string(),
            equipment_name: name.to_string(),
            ano0: None,
            year_values: BTreeMap::new(),
        }
    }

    #[test]
    fn test_project_crud() {
        let mut repo = MemoryRepository::new();
        let project = repo.create_project(new_project("Padaria")).unwrap();
        assert_eq!(project.currency, "EUR");

        let updated = repo
            .update_project(
                project.id,
                ProjectUpdate {
                    currency: Some("AOA".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.currency, "AOA");
        assert_eq!(updated.name, "Padaria");

        assert_eq!(repo.list_projects().unwrap().len(), 1);
        repo.delete_project(project.id).unwrap();
        assert!(matches!(
            repo.get_project(project.id),
            Err(RepositoryError::NotFound { kind: "project", .. })
        ));
    }

    #[test]
    fn test_project_validation() {
        let mut repo = MemoryRepository::new();
        assert!(matches!(
            repo.create_project(new_project("  ")),
            Err(RepositoryError::Invalid(_))
        ));
        let mut zero_years = new_project("Loja");
        zero_years.num_years = 0;
        assert!(repo.create_project(zero_years).is_err());
    }

    #[test]
    fn test_equipment_filtered_by_project_and_sheet() {
        let mut repo = MemoryRepository::new();
        let a = repo.create_project(new_project("A")).unwrap();
        let b = repo.create_project(new_project("B")).unwrap();

        repo.create_equipment(new_item(a.id, "basico", "Forno")).unwrap();
        repo.create_equipment(new_item(a.id, "transporte", "Carrinha")).unwrap();
        repo.create_equipment(new_item(a.id, "basico", "Batedeira")).unwrap();
        repo.create_equipment(new_item(b.id, "basico", "Prensa")).unwrap();

        let names: Vec<_> = repo
            .list_equipment(a.id, "basico")
            .unwrap()
            .into_iter()
            .map(|e| e.equipment_name)
            .collect();
        assert_eq!(names, vec!["Forno", "Batedeira"]);
    }

    #[test]
    fn test_equipment_defaults_and_update() {
        let mut repo = MemoryRepository::new();
        let project = repo.create_project(new_project("A")).unwrap();
        let item = repo.create_equipment(new_item(project.id, "basico", "Forno")).unwrap();
        assert_eq!(item.ano0, "0,00");

        let updated = repo
            .update_equipment(
                item.id,
                EquipmentUpdate {
                    ano0: Some("1.500,00".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.ano0, "1.500,00");
        assert_eq!(updated.equipment_name, "Forno");

        repo.delete_equipment(item.id).unwrap();
        assert!(repo.get_equipment(item.id).is_err());
    }

    #[test]
    fn test_equipment_requires_project() {
        let mut repo = MemoryRepository::new();
        assert!(matches!(
            repo.create_equipment(new_item(42, "basico", "Forno")),
            Err(RepositoryError::NotFound { kind: "project", id: 42 })
        ));
    }

    #[test]
    fn test_delete_project_cascades() {
        let mut repo = MemoryRepository::new();
        let project = repo.create_project(new_project("A")).unwrap();
        let item = repo.create_equipment(new_item(project.id, "basico", "Forno")).unwrap();
        repo.delete_project(project.id).unwrap();
        assert!(repo.get_equipment(item.id).is_err());
    }

    #[test]
    fn test_json_shape() {
        let mut repo = MemoryRepository::new();
        let project = repo.create_project(new_project("A")).unwrap();
        let item = repo.create_equipment(new_item(project.id, "basico", "Forno")).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["equipmentName"], "Forno");
        assert_eq!(json["sheetKey"], "basico");
        assert_eq!(json["projectId"], project.id);
    }

    #[test]
    fn test_current_project_follows_selection() {
        let mut repo = MemoryRepository::new();
        assert_eq!(repo.current_project().unwrap(), None);

        let a = repo.create_project(new_project("A")).unwrap();
        let b = repo.create_project(new_project("B")).unwrap();
        assert_eq!(a.created_at, a.updated_at);
        assert_eq!(repo.current_project().unwrap().unwrap().id, b.id);

        let selected = repo.set_current_project(a.id).unwrap();
        assert!(selected.updated_at >= a.updated_at);
        assert_eq!(repo.current_project().unwrap().unwrap().id, a.id);

        repo.update_project(b.id, ProjectUpdate::default()).unwrap();
        assert_eq!(repo.current_project().unwrap().unwrap().id, b.id);

        repo.delete_project(b.id).unwrap();
        assert_eq!(repo.current_project().unwrap().unwrap().id, a.id);
        assert!(repo.set_current_project(b.id).is_err());
    }

    #[test]
    fn test_replace_equipment_of_one_sheet() {
        let mut repo = MemoryRepository::new();
        let project = repo.create_project(new_project("A")).unwrap();
        repo.create_equipment(new_item(project.id, "basico", "Forno")).unwrap();
        repo.create_equipment(new_item(project.id, "basico", "Batedeira")).unwrap();
        repo.create_equipment(new_item(project.id, "transporte", "Carrinha")).unwrap();

        let mut prensa = new_item(999, "ignored", "Prensa");
        prensa.ano0 = Some("1.000,00".to_string());
        prensa.year_values.insert("2025".to_string(), "2.000,00".to_string());
        let saved = repo
            .replace_equipment(project.id, "basico", vec![prensa])
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].project_id, project.id);
        assert_eq!(saved[0].sheet_key, "basico");

        let basico = repo.list_equipment(project.id, "basico").unwrap();
        assert_eq!(basico.len(), 1);
        assert_eq!(basico[0].equipment_name, "Prensa");
        assert_eq!(basico[0].year_values["2025"], "2.000,00");
        assert_eq!(repo.list_equipment(project.id, "transporte").unwrap().len(), 1);
    }

    #[test]
    fn test_replace_equipment_rejects_invalid_batch() {
        let mut repo = MemoryRepository::new();
        let project = repo.create_project(new_project("A")).unwrap();
        repo.create_equipment(new_item(project.id, "basico", "Forno")).unwrap();

        let batch = vec![
            new_item(project.id, "basico", "Prensa"),
            new_item(project.id, "basico", " "),
        ];
        assert!(matches!(
            repo.replace_equipment(project.id, "basico", batch),
            Err(RepositoryError::Invalid(_))
        ));
        assert!(matches!(
            repo.replace_equipment(7, "basico", Vec::new()),
            Err(RepositoryError::NotFound { kind: "project", id: 7 })
        ));

        let names: Vec<_> = repo
            .list_equipment(project.id, "basico")
            .unwrap()
            .into_iter()
            .map(|e| e.equipment_name)
            .collect();
        assert_eq!(names, vec!["Forno"]);
    }

    #[test]
    fn test_bulk_payload_without_target() {
        let mut repo = MemoryRepository::new();
        let project = repo.create_project(new_project("A")).unwrap();
        let items: Vec<NewEquipment> =
            serde_json::from_str(r#"[{"equipmentName": "Forno", "ano0": "500,00"}]"#).unwrap();
        assert_eq!(items[0].project_id, 0);

        let saved = repo.replace_equipment(project.id, "basico", items).unwrap();
        assert_eq!(saved[0].project_id, project.id);
        assert_eq!(saved[0].ano0, "500,00");
    }

    #[test]
    fn test_save_and_load_keep_selection() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let mut repo = MemoryRepository::new();
        let a = repo.create_project(new_project("A")).unwrap();
        repo.create_project(new_project("B")).unwrap();
        repo.set_current_project(a.id).unwrap();
        repo.save(&path).unwrap();

        let loaded = MemoryRepository::load(&path).unwrap();
        let current = loaded.current_project().unwrap().unwrap();
        assert_eq!(current.id, a.id);
        assert_eq!(current.created_at, a.created_at);
        let json = serde_json::to_value(&current).unwrap();
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
    }
}
