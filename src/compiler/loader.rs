use anyhow::{Result, Context as AnyhowContext};
use std::fs;
use crate::dsl::{ProcessDefinition, ProcessDocument};

pub fn parse_processes(source: &str) -> Result<Vec<ProcessDefinition>> {
    let document: ProcessDocument = serde_yaml::from_str(source)
        .context("Failed to deserialize process document")?;

    Ok(document.processes)
}

pub fn load_processes_from_yaml(file_path: &str) -> Result<Vec<ProcessDefinition>> {
    let yaml_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read YAML file from {}", file_path))?;

    parse_processes(&yaml_content)
        .with_context(|| format!("Failed to load processes from {}", file_path))
}
