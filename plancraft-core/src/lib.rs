//! plancraft: Core library for financial plan sheets
//!
//! This library stores plan sheets (labeled rows of locale-formatted values),
//! applies single-cell updates, recalculates derived cells, computes the
//! treasury safety reserve and imports line items from spreadsheet files.

pub mod config;
pub mod formulas;
pub mod import;
pub mod number;
pub mod records;
pub mod rst;
pub mod sheet;
pub mod store;
pub mod tax;
pub mod update;

use std::collections::BTreeMap;

pub use config::PlanConfig;
pub use formulas::{DerivedValues, Formula, Recalculator};
pub use sheet::{Row, Sheet};
pub use store::{JsonDirStore, KeyValueStore, MemoryStore, SheetStore, StoreError};
pub use update::{CellUpdate, CellUpdateRequest, UpdateError, Upsert};

use thiserror::Error;

/// Errors surfaced by [`PlanWorkspace`] operations
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Update(#[from] UpdateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of applying a cell update
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UpdateOutcome {
    pub upsert: UpsertKind,
    pub row_index: usize,
    pub calculated_values: DerivedValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertKind {
    Updated,
    Inserted,
}

/// Main interface: sheet storage plus recalculation
pub struct PlanWorkspace<S> {
    config: PlanConfig,
    store: SheetStore<S>,
    recalculator: Recalculator,
}

impl<S: KeyValueStore> PlanWorkspace<S> {
    /// Workspace with default configuration
    pub fn new(backend: S) -> Self {
        Self::with_config(backend, PlanConfig::default())
    }

    pub fn with_config(backend: S, config: PlanConfig) -> Self {
        let recalculator = Recalculator::with_config(&config);
        let store = SheetStore::with_layout(backend, config.sheets.clone());
        Self {
            config,
            store,
            recalculator,
        }
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn store(&self) -> &SheetStore<S> {
        &self.store
    }

    /// The stored sheet, or its default layout
    pub fn sheet(&self, name: &str) -> Result<Sheet, PlanError> {
        Ok(self.store.load(name)?)
    }

    /// Validate the request, upsert the cell, recalculate and persist.
    ///
    /// The stored row keeps the raw value; derived cells are only returned.
    pub fn apply_update(&self, request: CellUpdateRequest) -> Result<UpdateOutcome, PlanError> {
        let update = request.validate()?;
        let recalculator = &self.recalculator;

        let outcome = self.store.with_sheet(&update.sheet, |sheet| {
            let upsert = update.apply(sheet);
            let calculated_values = recalculator.recalculate(&update.sheet, sheet);
            let (upsert, row_index) = match upsert {
                Upsert::Updated(i) => (UpsertKind::Updated, i),
                Upsert::Inserted(i) => (UpsertKind::Inserted, i),
            };
            UpdateOutcome {
                upsert,
                row_index,
                calculated_values,
            }
        })?;

        log::debug!(
            "Updated '{}'[{}][{}]; {} derived values",
            update.sheet,
            update.row_name,
            update.column_index,
            outcome.calculated_values.len()
        );
        Ok(outcome)
    }

    /// Derived values of the stored sheet
    pub fn calculate(&self, name: &str) -> Result<DerivedValues, PlanError> {
        let sheet = self.store.load(name)?;
        Ok(self.recalculator.recalculate(name, &sheet))
    }

    /// Replace a whole sheet
    pub fn save_sheet(&self, name: &str, sheet: &Sheet) -> Result<(), PlanError> {
        Ok(self.store.save(name, sheet)?)
    }

    /// Reserve per year from the revenue rows of the named sheet,
    /// using the configured percentage policy
    pub fn rst_for_sheet(&self, name: &str) -> Result<BTreeMap<String, f64>, PlanError> {
        let sheet = self.store.load(name)?;
        let revenues = rst::revenues_from_sheet(&sheet);
        Ok(rst::calculate_rst(&revenues, self.config.rst.percentage))
    }
}
