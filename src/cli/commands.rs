//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::core::{Config, Result};
use crate::llm::create_provider;

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Run the input as a chart task
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Configuration changed; rebuild the pipeline and show output
    Reconfigured(String),
    /// Exit the REPL
    Exit,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, config: &mut Config) -> Result<CommandResult> {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "models" => {
            let provider = create_provider(config)?;
            let models = provider.list_models().await?;
            let output = format!(
                "Available models ({}):\n{}\n\nCurrent:\n  Research: {}\n  Chart:    {}",
                provider.name(),
                models
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n"),
                config.models.research.model,
                config.models.chart.model
            );
            Ok(CommandResult::Handled(output))
        }

        "set" => Ok(handle_set_command(args, config)),

        "status" => Ok(CommandResult::Handled(status_text(config))),

        "save" => {
            let path = config.save_and_get_path()?;
            Ok(CommandResult::Handled(format!(
                "Configuration saved to {}",
                path.display()
            )))
        }

        _ => {
            // Not a command, treat as a chart task
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Handle 'set' subcommands
fn handle_set_command(args: &str, config: &mut Config) -> CommandResult {
    let parts: Vec<&str> = args.splitn(2, ' ').collect();

    if parts.is_empty() || parts[0].is_empty() {
        return CommandResult::Handled(
            "Usage: set <research|chart|cycles> <value>\n\
             Examples:\n\
               set research gpt-4o-mini\n\
               set chart gpt-4o\n\
               set cycles 3\n\
               set cycles unbounded"
                .to_string(),
        );
    }

    let key = parts[0].to_lowercase();
    let value = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match key.as_str() {
        "research" => {
            if value.is_empty() {
                return CommandResult::Handled(format!(
                    "Current research model: {}",
                    config.models.research.model
                ));
            }
            config.set_research_model(value);
            CommandResult::Reconfigured(format!("Research model set to: {}", value))
        }

        "chart" => {
            if value.is_empty() {
                return CommandResult::Handled(format!(
                    "Current chart model: {}",
                    config.models.chart.model
                ));
            }
            config.set_chart_model(value);
            CommandResult::Reconfigured(format!("Chart model set to: {}", value))
        }

        "cycles" => match value {
            "" => CommandResult::Handled(format!(
                "Current cycle cap: {}",
                describe_cap(config.pipeline.max_cycles)
            )),
            "unbounded" | "none" | "0" => {
                config.pipeline.max_cycles = None;
                CommandResult::Reconfigured("Cycle cap removed".to_string())
            }
            n => match n.parse::<usize>() {
                Ok(max) => {
                    config.pipeline.max_cycles = Some(max);
                    CommandResult::Reconfigured(format!("Cycle cap set to: {}", max))
                }
                Err(_) => CommandResult::Handled(format!("Not a number: {}", n)),
            },
        },

        _ => CommandResult::Handled(format!(
            "Unknown setting: {}. Available: research, chart, cycles",
            key
        )),
    }
}

fn describe_cap(cap: Option<usize>) -> String {
    cap.map(|n| n.to_string())
        .unwrap_or_else(|| "unbounded".to_string())
}

/// Current settings as shown by 'status'
fn status_text(config: &Config) -> String {
    format!(
        "Chartwright Status:\n\
         ─────────────────────────────\n\
         Provider:   {}\n\
         Research:   {} (temperature {})\n\
         Chart:      {} (temperature {})\n\
         Search:     {}\n\
         Cycle cap:  {}\n\
         Revisions:  {}",
        config.provider,
        config.models.research.model,
        config.models.research.temperature,
        config.models.chart.model,
        config.models.chart.temperature,
        if config.search.api_key.is_some() {
            "tavily"
        } else {
            "disabled (TAVILY_API_KEY not set)"
        },
        describe_cap(config.pipeline.max_cycles),
        config.pipeline.max_revisions
    )
}

/// Generate help text
fn help_text() -> String {
    r#"Chartwright Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Chartwright
  status           Show current configuration
  models           List models on the provider
  save             Save configuration to file

  set research <model>       Set the research worker model
  set chart <model>          Set the chart worker model
  set cycles <n|unbounded>   Set the research-chart cycle cap

Anything else is run as a chart task, e.g.
  Chart the top 5 EDM songs by streams.
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_is_a_task() {
        let mut config = Config::default();
        let result = handle_command("Chart sales by region.", &mut config).await.unwrap();
        assert_eq!(result, CommandResult::Continue("Chart sales by region.".to_string()));
    }

    #[tokio::test]
    async fn test_exit() {
        let mut config = Config::default();
        assert_eq!(handle_command("quit", &mut config).await.unwrap(), CommandResult::Exit);
    }

    #[tokio::test]
    async fn test_set_models() {
        let mut config = Config::default();
        let result = handle_command("set chart gpt-4.1", &mut config).await.unwrap();
        assert!(matches!(result, CommandResult::Reconfigured(_)));
        assert_eq!(config.models.chart.model, "gpt-4.1");

        handle_command("set research qwen3:8b", &mut config).await.unwrap();
        assert_eq!(config.models.research.model, "qwen3:8b");
    }

    #[tokio::test]
    async fn test_set_cycles() {
        let mut config = Config::default();
        handle_command("set cycles 2", &mut config).await.unwrap();
        assert_eq!(config.pipeline.max_cycles, Some(2));

        handle_command("set cycles unbounded", &mut config).await.unwrap();
        assert_eq!(config.pipeline.max_cycles, None);

        let result = handle_command("set cycles many", &mut config).await.unwrap();
        assert_eq!(result, CommandResult::Handled("Not a number: many".to_string()));
        assert_eq!(config.pipeline.max_cycles, None);
    }

    #[tokio::test]
    async fn test_unknown_slash_command() {
        let mut config = Config::default();
        let result = handle_command("/frobnicate", &mut config).await.unwrap();
        assert!(matches!(result, CommandResult::Handled(ref s) if s.contains("Unknown command")));
    }
}
