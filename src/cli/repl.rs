//! Interactive REPL for Chartwright
//!
//! Each line is either a command or a chart task run through the pipeline.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::agent::ChartPipeline;
use crate::cli::commands::{handle_command, CommandResult};
use crate::cli::report;
use crate::core::{Config, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    config: Config,
    pipeline: ChartPipeline,
    output: Option<PathBuf>,
}

impl Repl {
    /// Create a REPL with custom configuration
    ///
    /// When `output` is set, each successful run's JSON is written there.
    pub fn with_config(config: Config, output: Option<PathBuf>) -> Result<Self> {
        let pipeline = Self::build_pipeline(&config)?;
        Ok(Self {
            config,
            pipeline,
            output,
        })
    }

    fn build_pipeline(config: &Config) -> Result<ChartPipeline> {
        Ok(ChartPipeline::from_config(config)?.with_observer(report::progress_observer()))
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            // Print prompt
            print!("Task: ");
            stdout.flush()?;

            // Read input
            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.config).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::Reconfigured(output)) => {
                    match Self::build_pipeline(&self.config) {
                        Ok(pipeline) => {
                            self.pipeline = pipeline;
                            println!("{}\n", output);
                        }
                        Err(e) => eprintln!("Could not apply setting: {}\n", e),
                    }
                }
                Ok(CommandResult::Continue(task)) => self.run_task(&task).await,
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    async fn run_task(&self, task: &str) {
        match self.pipeline.run(task).await {
            Ok(outcome) => {
                println!();
                report::print_outcome(&outcome);
                if let Some(ref path) = self.output {
                    match report::write_output(&outcome, path) {
                        Ok(()) => eprintln!("Saved chart JSON to {}", path.display()),
                        Err(e) => eprintln!("Failed to save chart JSON: {}", e),
                    }
                }
                println!();
            }
            Err(e) => {
                eprintln!("\nError: {}\n", e);
            }
        }
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = &self.config;

        println!("\nChartwright - research a topic, get chart specifications\n");
        println!("Provider:   {}", config.provider);
        println!("Models:");
        println!("  Research: {}", config.models.research.model);
        println!("  Chart:    {}", config.models.chart.model);
        println!();
        println!("Commands: help, status, models, set, save, exit");
        println!("─────────────────────────────────────────────────────────");
    }
}
