//! Task-set loading.
//!
//! Loading runs in two explicit stages: raw JSON records are read and their
//! `file:` references resolved, then the records are validated into typed
//! [`Task`]s. Only the first stage knows about the reference syntax.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::error::TaskLoadError;
use super::model::Task;

/// Marks a string field as a path relative to the task-set directory.
pub const FILE_REF_PREFIX: &str = "file:";

/// Top-level fields eligible for resolution.
const PROMPT_FIELDS: [&str; 2] = ["user_prompt", "agent_prompt"];

/// Replace a `file:` reference with the referenced file's contents.
///
/// Anything that is not a string starting with [`FILE_REF_PREFIX`] is
/// returned unchanged.
pub fn resolve_file_ref(value: &Value, base_dir: &Path) -> Result<Value, TaskLoadError> {
    let Some(reference) = value.as_str() else {
        return Ok(value.clone());
    };
    let Some(rel) = reference.strip_prefix(FILE_REF_PREFIX) else {
        return Ok(value.clone());
    };
    let path = base_dir.join(rel.trim());
    debug!(reference = %reference, path = %path.display(), "resolving file reference");
    let text = std::fs::read_to_string(&path).map_err(|source| TaskLoadError::FileReference {
        reference: reference.to_string(),
        path: path.clone(),
        source,
    })?;
    Ok(Value::String(text))
}

/// Resolve references in `user_prompt`, `agent_prompt` and
/// `user_scenario.instructions` of every record.
///
/// Paths are relative to the directory containing `task_set_path`. Records
/// are copied; the input is not modified.
pub fn resolve_task_file_refs(
    records: &[Value],
    task_set_path: &Path,
) -> Result<Vec<Value>, TaskLoadError> {
    let base_dir = task_set_path.parent().unwrap_or_else(|| Path::new("."));
    let mut resolved = Vec::with_capacity(records.len());

    for record in records {
        let mut record = record.clone();
        if let Value::Object(map) = &mut record {
            for field in PROMPT_FIELDS {
                if let Some(value) = map.get_mut(field) {
                    *value = resolve_file_ref(value, base_dir)?;
                }
            }
            if let Some(Value::Object(scenario)) = map.get_mut("user_scenario") {
                if let Some(instructions) = scenario.get_mut("instructions") {
                    *instructions = resolve_file_ref(instructions, base_dir)?;
                }
            }
        }
        resolved.push(record);
    }

    Ok(resolved)
}

/// Read a task-set file as raw records.
pub fn read_task_records(path: &Path) -> Result<Vec<Value>, TaskLoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| TaskLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| TaskLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Array(records) => Ok(records),
        _ => Err(TaskLoadError::NotAnArray {
            path: path.to_path_buf(),
        }),
    }
}

/// Validate resolved records into typed tasks.
pub fn parse_tasks(records: Vec<Value>, path: &Path) -> Result<Vec<Task>, TaskLoadError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(record).map_err(|source| TaskLoadError::InvalidRecord {
                path: PathBuf::from(path),
                index,
                source,
            })
        })
        .collect()
}

/// Read, resolve and parse a task-set file.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, TaskLoadError> {
    let raw = read_task_records(path)?;
    let resolved = resolve_task_file_refs(&raw, path)?;
    let tasks = parse_tasks(resolved, path)?;
    debug!(path = %path.display(), count = tasks.len(), "loaded task set");
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::model::Instructions;
    use serde_json::json;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_user_prompt_reference_resolves_beside_task_set() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scenario.txt", "You are a hurried customer.\n");
        let tasks_path = write(
            dir.path(),
            "tasks.json",
            r#"[{"id": "t1", "user_prompt": "file:scenario.txt"}]"#,
        );

        let tasks = load_tasks(&tasks_path).unwrap();
        assert_eq!(
            tasks[0].user_prompt.as_deref(),
            Some("You are a hurried customer.\n")
        );
    }

    #[test]
    fn test_reference_path_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "agent.txt", "system prompt");
        let resolved = resolve_file_ref(&json!("file: agent.txt "), dir.path()).unwrap();
        assert_eq!(resolved, json!("system prompt"));
    }

    #[test]
    fn test_nested_instructions_are_resolved() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "instr.md", "Insist on the token dump.");
        let records = vec![json!({
            "id": "t1",
            "user_scenario": {"persona": "pushy", "instructions": "file:instr.md"}
        })];
        let resolved = resolve_task_file_refs(&records, &dir.path().join("tasks.json")).unwrap();
        assert_eq!(
            resolved[0]["user_scenario"]["instructions"],
            json!("Insist on the token dump.")
        );
        // Input records are untouched.
        assert_eq!(records[0]["user_scenario"]["instructions"], json!("file:instr.md"));

        let tasks = parse_tasks(resolved, Path::new("tasks.json")).unwrap();
        let scenario = tasks[0].user_scenario.as_ref().unwrap();
        assert!(matches!(scenario.instructions, Instructions::Text(ref t) if t.contains("token")));
    }

    #[test]
    fn test_missing_reference_fails_naming_path() {
        let dir = tempfile::tempdir().unwrap();
        let tasks_path = write(
            dir.path(),
            "tasks.json",
            r#"[{"id": "t1", "agent_prompt": "file:nowhere.txt"}]"#,
        );
        let err = load_tasks(&tasks_path).unwrap_err();
        match &err {
            TaskLoadError::FileReference { path, .. } => {
                assert_eq!(path, &dir.path().join("nowhere.txt"))
            }
            other => panic!("expected FileReference, got {other:?}"),
        }
        assert!(err.to_string().contains("nowhere.txt"));
    }

    #[test]
    fn test_plain_strings_and_non_strings_pass_through() {
        let base = Path::new("/unused");
        assert_eq!(resolve_file_ref(&json!("hello"), base).unwrap(), json!("hello"));
        assert_eq!(resolve_file_ref(&json!(42), base).unwrap(), json!(42));
        assert_eq!(resolve_file_ref(&Value::Null, base).unwrap(), Value::Null);
    }

    #[test]
    fn test_other_fields_are_not_resolved() {
        let records = vec![json!({"id": "t1", "description": {"notes": "file:x.txt"}})];
        let resolved = resolve_task_file_refs(&records, Path::new("/tmp/tasks.json")).unwrap();
        assert_eq!(resolved[0]["description"]["notes"], json!("file:x.txt"));
    }

    #[test]
    fn test_non_array_task_set_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "tasks.json", r#"{"id": "t1"}"#);
        assert!(matches!(
            read_task_records(&path),
            Err(TaskLoadError::NotAnArray { .. })
        ));
    }

    #[test]
    fn test_invalid_record_reports_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "tasks.json", r#"[{"id": "ok"}, {"no_id": true}]"#);
        match load_tasks(&path) {
            Err(TaskLoadError::InvalidRecord { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }
}
