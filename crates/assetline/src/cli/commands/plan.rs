//! Plan command

use std::collections::HashSet;

use clap::Args;

use assetline_pipeline::site_graph;

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Show the execution plan for a task
#[derive(Debug, Args)]
pub struct PlanCommand {
    /// Task to plan
    #[arg(default_value = "compile")]
    pub task: String,
}

impl PlanCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let (graph, tasks) = site_graph()?;
        let target = graph.require(&self.task)?;

        if cli.format == OutputFormat::Json {
            let mut done = HashSet::new();
            let mut planned = Vec::new();
            let mut steps = Vec::new();
            for step in tasks.steps_for(target) {
                let waves = graph.waves(&step.targets(), &done);
                let names: Vec<Vec<&str>> = waves
                    .iter()
                    .map(|wave| wave.iter().map(|id| graph.name(*id)).collect())
                    .collect();
                steps.push(serde_json::json!({ "waves": names }));
                for id in waves.into_iter().flatten() {
                    done.insert(id);
                    planned.push(id);
                }
            }
            let plan = serde_json::json!({
                "task": self.task,
                "steps": steps,
                "tasks": planned.iter().map(|id| {
                    let node = graph.get(*id);
                    serde_json::json!({
                        "name": node.name,
                        "description": node.description,
                        "group": node.is_group(),
                        "after": node.prerequisites.iter().map(|d| graph.name(*d)).collect::<Vec<_>>(),
                    })
                }).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }

        println!("{}", output::header(&format!("Plan for {}", self.task)));
        for (i, step) in tasks.steps_for(target).iter().enumerate() {
            println!();
            println!("Step {}:", i + 1);
            print!("{}", graph.execution_plan(&step.targets()));
        }
        Ok(())
    }
}
