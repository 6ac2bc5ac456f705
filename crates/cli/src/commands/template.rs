//! `nexus template`: Manage and run prompt templates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Subcommand;
use nexus_agent::manager::agent_name;
use nexus_core::{Agent, Nexus};
use nexus_templates::{Context, TemplateDefinition, TemplateExecution};

use super::{Runtime, parse_key_value};

#[derive(Subcommand)]
pub enum TemplateCommand {
    /// List stored template names
    List,

    /// Print a stored template
    Show { name: String },

    /// Store a template read from a YAML file
    Add { name: String, file: PathBuf },

    /// Replace a stored template's content, optionally renaming it
    Update {
        name: String,
        file: PathBuf,
        #[arg(long)]
        rename: Option<String>,
    },

    /// Delete a stored template
    Delete { name: String },

    /// Execute a stored template or a template file
    Run {
        /// Stored template name
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        name: Option<String>,

        /// Execute this file instead of a stored template
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Input variable, repeatable
        #[arg(short, long = "input", value_parser = parse_key_value)]
        inputs: Vec<(String, String)>,

        /// Agent to execute with (defaults to the default provider's agent)
        #[arg(short, long)]
        agent: Option<String>,

        /// Agent profile to speak with
        #[arg(short, long)]
        profile: Option<String>,

        /// Print every phase instead of only the final result
        #[arg(long)]
        phases: bool,
    },

    /// Print the declared input and output fields of a template file
    Fields { file: PathBuf },
}

pub async fn run(command: TemplateCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        TemplateCommand::List => {
            let runtime = Runtime::load(None).await?;
            let names = runtime.engine.template_names().await?;
            if names.is_empty() {
                println!("No templates stored.");
            }
            for name in names {
                println!("{name}");
            }
        }
        TemplateCommand::Show { name } => {
            let runtime = Runtime::load(None).await?;
            let template = runtime
                .engine
                .get_template(&name)
                .await?
                .ok_or_else(|| format!("Template '{name}' not found"))?;
            println!("# {}", template.name);
            println!("# inputs:  {}", template.inputs.join(", "));
            println!("# outputs: {}", template.outputs.join(", "));
            println!("# updated: {}", template.updated_at.to_rfc3339());
            println!("{}", template.content);
        }
        TemplateCommand::Add { name, file } => {
            let content = read_template(&file)?;
            let runtime = Runtime::load(None).await?;
            runtime.engine.add_template(&name, &content).await?;
            println!("✅ Template '{name}' added");
        }
        TemplateCommand::Update { name, file, rename } => {
            let content = read_template(&file)?;
            let runtime = Runtime::load(None).await?;
            let new_name = rename.as_deref().unwrap_or(&name);
            runtime.engine.update_template(&name, new_name, &content).await?;
            println!("✅ Template '{new_name}' updated");
        }
        TemplateCommand::Delete { name } => {
            let runtime = Runtime::load(None).await?;
            match runtime.engine.delete_template(&name).await? {
                0 => println!("Template '{name}' not found"),
                _ => println!("🗑️  Template '{name}' deleted"),
            }
        }
        TemplateCommand::Run {
            name,
            file,
            inputs,
            agent,
            profile,
            phases,
        } => {
            let runtime = Runtime::load(profile.as_deref()).await?;
            let agent = select_agent(&runtime, agent.as_deref())?;
            let inputs: Context = inputs.into_iter().collect();

            let execution = match (file, name) {
                (Some(file), _) => {
                    let content = read_template(&file)?;
                    runtime.engine.execute_template(&agent, &content, &inputs).await?
                }
                (None, Some(name)) => runtime.engine.execute_named(&agent, &name, &inputs).await?,
                (None, None) => return Err("Give a template name or --file".into()),
            };

            print_execution(&execution, phases);
        }
        TemplateCommand::Fields { file } => {
            let content = read_template(&file)?;
            let fields = TemplateDefinition::parse(&content)?.fields();
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
    }

    Ok(())
}

fn read_template(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()).into())
}

/// The requested agent, else the default provider's agent, else the first one.
fn select_agent(runtime: &Runtime, requested: Option<&str>) -> Result<Arc<dyn Agent>, Box<dyn std::error::Error>> {
    if let Some(name) = requested {
        return runtime.chat.get_agent(name).ok_or_else(|| {
            format!(
                "Agent '{name}' not found (available: {})",
                runtime.chat.agent_names().join(", ")
            )
            .into()
        });
    }

    runtime
        .chat
        .get_agent(&agent_name(&runtime.config.default_provider))
        .or_else(|| runtime.chat.agents().first())
        .ok_or_else(|| "No agents configured".into())
}

fn print_execution(execution: &TemplateExecution, phases: bool) {
    if !phases {
        println!("{}", execution.result().unwrap_or_default());
        return;
    }

    let sections = [
        ("input prompt", &execution.iprompt),
        ("input result", &execution.iresult),
        ("output prompt", &execution.oprompt),
        ("output result", &execution.oresult),
    ];
    for (label, value) in sections {
        if let Some(value) = value {
            println!("── {label} ──");
            println!("{value}");
            println!();
        }
    }
}
