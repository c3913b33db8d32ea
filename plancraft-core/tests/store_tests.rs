use plancraft_core::records::{MemoryRepository, NewProject, ProjectRepository};
use plancraft_core::{CellUpdateRequest, JsonDirStore, KeyValueStore, PlanWorkspace, StoreError};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn request(row: &str, column: i64, value: serde_json::Value) -> CellUpdateRequest {
    CellUpdateRequest {
        sheet: None,
        row_name: Some(row.to_string()),
        column_index: Some(column),
        value: Some(value),
    }
}

#[test]
fn test_sheets_survive_reopening() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    {
        let workspace = PlanWorkspace::new(JsonDirStore::open(dir.path())?);
        workspace.apply_update(request("Índice de Inflação", 1, json!("1")))?;
        workspace.apply_update(request("Taxa de Inflação", 2, json!("2,5")))?;
    }

    assert!(dir.path().join("pressupostos.json").exists());

    let workspace = PlanWorkspace::new(JsonDirStore::open(dir.path())?);
    let sheet = workspace.sheet("pressupostos")?;
    assert_eq!(sheet.rows.len(), 2);
    assert_eq!(sheet.rows[1].to_wire(), vec!["Taxa de Inflação", "", "2,5"]);

    let derived = workspace.calculate("pressupostos")?;
    assert_eq!(derived["Índice de Inflação-2"], "1.0250");
    Ok(())
}

#[test]
fn test_no_temp_files_left_behind() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = JsonDirStore::open(dir.path())?;
    store.put("vendas", r#"{"rows":[]}"#)?;
    store.put("vendas", r#"{"rows":[["Vendas","10"]]}"#)?;

    let names: Vec<String> = std::fs::read_dir(dir.path())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(names, vec!["vendas.json".to_string()]);
    assert_eq!(
        store.get("vendas")?.as_deref(),
        Some(r#"{"rows":[["Vendas","10"]]}"#)
    );
    Ok(())
}

#[test]
fn test_path_like_keys_are_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = JsonDirStore::open(dir.path().join("sheets"))?;

    for key in ["../escape", "a/b", "", "."] {
        assert!(matches!(store.put(key, "{}"), Err(StoreError::InvalidKey(_))));
    }
    Ok(())
}

#[test]
fn test_concurrent_updates_are_not_lost() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let workspace = Arc::new(PlanWorkspace::new(JsonDirStore::open(dir.path())?));

    let handles: Vec<_> = (1..=6)
        .map(|column| {
            let workspace = Arc::clone(&workspace);
            thread::spawn(move || {
                workspace
                    .apply_update(request("Taxa de Inflação", column, json!(column)))
                    .map(|_| ())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("update thread panicked")?;
    }

    let sheet = workspace.sheet("pressupostos")?;
    assert_eq!(sheet.rows.len(), 1);
    for column in 1..=6 {
        assert_eq!(sheet.rows[0].get(column as usize), Some(column.to_string().as_str()));
    }
    Ok(())
}

#[test]
fn test_concurrent_puts_on_one_key() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = Arc::new(JsonDirStore::open(dir.path())?);

    let writers: Vec<_> = ["Vendas", "Custos"]
        .into_iter()
        .map(|label| {
            let store = Arc::clone(&store);
            thread::spawn(move || -> Result<(), StoreError> {
                for i in 0..200 {
                    let blob = json!({ "rows": [[label, i.to_string()]] }).to_string();
                    store.put("vendas", &blob)?;
                }
                Ok(())
            })
        })
        .collect();

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || -> anyhow::Result<()> {
            for _ in 0..200 {
                if let Some(blob) = store.get("vendas")? {
                    serde_json::from_str::<serde_json::Value>(&blob)?;
                }
            }
            Ok(())
        })
    };

    for writer in writers {
        writer.join().expect("writer thread panicked")?;
    }
    reader.join().expect("reader thread panicked")?;

    let last: serde_json::Value = serde_json::from_str(&store.get("vendas")?.unwrap_or_default())?;
    assert_eq!(last["rows"][0][1], "199");
    let entries = std::fs::read_dir(dir.path())?.count();
    assert_eq!(entries, 1);
    Ok(())
}

#[test]
fn test_records_file_round_trip() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("records.json");

    let mut repo = MemoryRepository::load(&path)?;
    assert!(repo.list_projects()?.is_empty());
    let project = repo.create_project(NewProject {
        name: "Oficina".to_string(),
        first_year: 2026,
        num_years: 3,
        currency: None,
    })?;
    repo.save(&path)?;

    let reloaded = MemoryRepository::load(&path)?;
    assert_eq!(reloaded.get_project(project.id)?.currency, "EUR");
    Ok(())
}
