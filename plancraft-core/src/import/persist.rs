//! Saving imported rows as equipment records
//!
//! Rows are created one at a time. A row that fails is logged and counted as
//! a failure; the import as a whole still succeeds with a smaller saved count.

use super::ImportError;
use super::mapper::{ImportReport, ImportRow};
use crate::number::format_grouped_decimal;
use crate::records::{
    Equipment, EquipmentRepository, NewEquipment, ProjectRepository, RepositoryError,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// A single imported row that could not be saved
#[derive(Debug, Error)]
#[error("row {row} ({description}): {source}")]
pub struct ImportRowError {
    /// 1-based position among the imported items
    pub row: usize,
    pub description: String,
    #[source]
    pub source: RepositoryError,
}

/// What happened to an import that targeted a project
#[derive(Debug)]
pub struct ImportSummary {
    pub parsed: usize,
    pub saved: usize,
    pub sheet_key: String,
    pub sheet_name: String,
    pub currency: String,
    pub failures: Vec<ImportRowError>,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!(
            "{} itens importados e salvos com sucesso na aba \"{}\"!",
            self.saved, self.sheet_name
        )
    }
}

/// Create one equipment record per imported row under `project_id`.
///
/// Only a missing project aborts the whole import.
pub fn persist_import<R>(
    report: &ImportReport,
    repo: &mut R,
    project_id: u64,
    sheet_key: &str,
) -> Result<ImportSummary, ImportError>
where
    R: ProjectRepository + EquipmentRepository,
{
    let project = match repo.get_project(project_id) {
        Ok(project) => project,
        Err(RepositoryError::NotFound { .. }) => {
            return Err(ImportError::ProjectNotFound(project_id));
        }
        Err(e) => return Err(e.into()),
    };

    let results: Vec<Result<Equipment, ImportRowError>> = report
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| save_item(repo, project_id, sheet_key, i + 1, item))
        .collect();

    let mut saved = 0;
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(_) => saved += 1,
            Err(e) => {
                log::warn!("Skipping imported {}", e);
                failures.push(e);
            }
        }
    }

    let summary = ImportSummary {
        parsed: report.items.len(),
        saved,
        sheet_key: sheet_key.to_string(),
        sheet_name: sheet_display_name(sheet_key).to_string(),
        currency: project.currency,
        failures,
    };
    log::info!(
        "Import into project {} sheet '{}': {} parsed, {} saved",
        project_id,
        sheet_key,
        summary.parsed,
        summary.saved
    );
    Ok(summary)
}

fn save_item<R: EquipmentRepository>(
    repo: &mut R,
    project_id: u64,
    sheet_key: &str,
    row: usize,
    item: &ImportRow,
) -> Result<Equipment, ImportRowError> {
    repo.create_equipment(NewEquipment {
        project_id,
        sheet_key: sheet_key.to_string(),
        equipment_name: item.description.clone(),
        ano0: Some(format_grouped_decimal(item.total)),
        year_values: BTreeMap::new(),
    })
    .map_err(|source| ImportRowError {
        row,
        description: item.description.clone(),
        source,
    })
}

/// Display name of an asset sheet; unknown keys are shown as-is
pub fn sheet_display_name(sheet_key: &str) -> &str {
    match sheet_key {
        "ativos-tangiveis-terrenos" => "Terrenos e Recursos Naturais",
        "ativos-tangiveis-edificios" => "Edifícios e Outras Construções",
        "ativos-tangiveis-equipamento-basico" => "Equipamento Básico",
        "ativos-tangiveis-equipamento-transporte" => "Equipamento de Transporte",
        "ativos-tangiveis-equipamento-administrativo" => "Equipamento Administrativo",
        "ativos-tangiveis-equipamentos-biologicos" => "Equipamentos Biológicos",
        "ativos-intangiveis-goodwill" => "Goodwill",
        "ativos-intangiveis-projetos-desenvolvimento" => "Projetos de Desenvolvimento",
        "ativos-intangiveis-programas-computador" => "Programas de Computador",
        "ativos-intangiveis-propriedade-industrial" => "Propriedade Industrial",
        "ativos-intangiveis-outros" => "Outros Ativos Intangíveis",
        other => other,
    }
}
