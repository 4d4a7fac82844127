use crate::output::{print_json, print_table};
use anyhow::Context;
use ideaforge_core::{
    config::{Mode, Settings},
    context, manifest, paths,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ProjectRow {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<usize>,
}

#[derive(Serialize)]
struct ListOutput {
    mode: &'static str,
    projects: Vec<ProjectRow>,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root).context("failed to load settings")?;
    let mode = Mode::from_env();

    let projects: Vec<ProjectRow> = match mode {
        Mode::SingleRepo => {
            let ideas = paths::ideas_dir(root, &settings.ideas_dir);
            manifest::local_projects(&ideas)
                .context("failed to list projects")?
                .into_iter()
                .map(|name| {
                    let files = context::list_files(&ideas.join(&name)).len();
                    ProjectRow {
                        name,
                        files: Some(files),
                    }
                })
                .collect()
        }
        Mode::MultiRepo(_) => manifest::load(&paths::manifest_path(root, &settings.manifest_file))
            .context("failed to read manifest")?
            .into_iter()
            .map(|name| ProjectRow { name, files: None })
            .collect(),
    };

    if json {
        return print_json(&ListOutput {
            mode: mode.as_str(),
            projects,
        });
    }

    if projects.is_empty() {
        println!("No projects yet.");
        return Ok(());
    }

    match mode {
        Mode::SingleRepo => {
            let rows: Vec<Vec<String>> = projects
                .iter()
                .map(|p| {
                    vec![
                        p.name.clone(),
                        p.files.map(|n| n.to_string()).unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["PROJECT", "FILES"], &rows);
        }
        Mode::MultiRepo(_) => {
            let rows: Vec<Vec<String>> = projects.iter().map(|p| vec![p.name.clone()]).collect();
            print_table(&["REPOSITORY"], &rows);
        }
    }
    Ok(())
}
