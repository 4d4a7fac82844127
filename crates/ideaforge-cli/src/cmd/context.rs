use crate::output::print_json;
use anyhow::Context;
use ideaforge_core::{
    config::Settings,
    context::{build_context, ContextBudget},
    paths, ForgeError,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ContextOutput<'a> {
    project: &'a str,
    chars: usize,
    context: String,
}

pub fn run(root: &Path, project: &str, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root).context("failed to load settings")?;
    paths::validate_project_name(project)?;
    let dir = paths::project_dir(root, &settings.ideas_dir, project);
    if !dir.is_dir() {
        return Err(ForgeError::ProjectNotFound(project.to_string()).into());
    }

    let blob = build_context(
        &dir,
        ContextBudget {
            max_chars: settings.context_budget,
            per_file_overhead: settings.context_file_overhead,
        },
    );

    if json {
        print_json(&ContextOutput {
            project,
            chars: blob.chars().count(),
            context: blob,
        })
    } else {
        println!("{blob}");
        Ok(())
    }
}
