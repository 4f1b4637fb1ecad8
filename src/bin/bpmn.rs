use clap::{Parser, Subcommand};
use bpmn_runtime::compiler::core::Compiler;
use bpmn_runtime::compiler::loader::load_processes_from_yaml;
use bpmn_runtime::runtime::listener::TracingListener;
use bpmn_runtime::{Event, EventKind, Properties, ProcessRef, SequentialBpmnEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Result, anyhow};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a process file and run one process to its first resulting state
    Run {
        /// Path to the process YAML file
        #[arg(long, short)]
        file: PathBuf,

        /// Process id to invoke
        #[arg(long, short)]
        process: String,

        /// Deployment group
        #[arg(long, default_value = "default")]
        group: String,

        /// Initial variables (key=value)
        #[arg(long, short = 'D', value_parser = parse_key_val)]
        vars: Vec<(String, serde_json::Value)>,
    },

    /// Deploy a process file and deliver a message or signal
    Send {
        /// Path to the process YAML file
        #[arg(long, short)]
        file: PathBuf,

        /// Event kind: message or signal
        #[arg(long, default_value = "message")]
        kind: String,

        /// Event name
        #[arg(long, short)]
        name: String,

        /// Deployment group
        #[arg(long, default_value = "default")]
        group: String,

        /// Initial variables (key=value)
        #[arg(long, short = 'D', value_parser = parse_key_val)]
        vars: Vec<(String, serde_json::Value)>,
    },

    /// Validate a process file without running it
    Check {
        /// Path to the process YAML file
        #[arg(long, short)]
        file: PathBuf,
    },
}

fn parse_key_val(s: &str) -> Result<(String, serde_json::Value), String> {
    let pos = s.find('=').ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    let key = s[..pos].to_string();
    let val_str = &s[pos + 1..];
    // Try parsing as JSON, otherwise treat as string
    let val = serde_json::from_str(val_str).unwrap_or_else(|_| serde_json::Value::String(val_str.to_string()));
    Ok((key, val))
}

fn path_str(file: &Path) -> Result<&str> {
    file.to_str().ok_or_else(|| anyhow!("non UTF-8 path: {}", file.display()))
}

async fn deploy_file(engine: &SequentialBpmnEngine, group: &str, file: &Path) -> Result<Vec<ProcessRef>> {
    let processes = load_processes_from_yaml(path_str(file)?)?;
    let refs = engine.deploy_definitions(group, processes).await?;
    info!("Deployed {} process(es) from {:?}", refs.len(), file);
    Ok(refs)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, process, group, vars } => {
            let engine = SequentialBpmnEngine::builder()
                .listener(Arc::new(TracingListener))
                .build();
            deploy_file(&engine, &group, &file).await?;

            let init_state: Properties = vars.into_iter().collect();
            let state = engine
                .invoke_by_id(&ProcessRef::new(group, process), init_state, Properties::new())
                .await?;

            println!("{}", serde_json::to_string_pretty(&state)?);
        }

        Commands::Send { file, kind, name, group, vars } => {
            let kind = match kind.as_str() {
                "message" => EventKind::Message,
                "signal" => EventKind::Signal,
                other => return Err(anyhow!("unsupported event kind: {}", other)),
            };
            let engine = SequentialBpmnEngine::builder()
                .listener(Arc::new(TracingListener))
                .build();
            deploy_file(&engine, &group, &file).await?;

            let init_state: Properties = vars.into_iter().collect();
            let event = Event::new(kind, group, name);
            let states = engine.invoke_by_event(&event, Some(init_state), None).await?;

            info!("Event produced {} state(s)", states.len());
            println!("{}", serde_json::to_string_pretty(&states)?);
        }

        Commands::Check { file } => {
            let processes = load_processes_from_yaml(path_str(&file)?)?;
            for process in &processes {
                let nodes = Compiler::new(process).compile()?;
                info!("Process '{}' OK ({} nodes).", process.id, nodes.len());
            }
            println!("{} process(es) valid", processes.len());
        }
    }

    Ok(())
}
