//! Prompt text for the two task kinds.
//!
//! Both prompts ask for the marker format understood by [`crate::parser`].

use crate::config::Settings;
use crate::parser::{END_TOKEN, FILE_TOKEN};
use crate::transport::{ModelRequest, PromptMessage};

fn format_rules(path_hint: &str, content_hint: &str) -> String {
    format!("{FILE_TOKEN} {path_hint}---\n{content_hint}\n{END_TOKEN}")
}

/// Prompt asking for one brand-new small project.
pub fn new_project_prompt() -> String {
    format!(
        "You are an inventive programmer. Come up with ONE small, concrete software \
project and write its first version.

Requirements:
- Reply with the project files only. No introduction and no closing remarks.
- Write every file in exactly this format:
{rules}
- Produce between 2 and 5 files: at least one source file (any language, for \
example Python, JavaScript, HTML or Go) and optionally a README.md.
- Keep the scope tiny and runnable: a command-line helper, a small web widget, \
a short script, a micro utility.
- The code must be self-contained. Do not use placeholder credentials.
- Begin your reply with {FILE_TOKEN}",
        rules = format_rules("relative/path/to/file.ext", "file content"),
    )
}

/// Prompt asking for one incremental improvement to `name`, given its
/// current files serialized by the context builder.
pub fn improve_prompt(name: &str, context: &str) -> String {
    format!(
        "Here is an existing project named \"{name}\". Move it forward by one \
concrete step.

Current files, each introduced by its path:
{context}

Pick one: add a small feature, fix a bug, add a test or an example, improve \
the README, or refactor something. Reply with only the files you add or \
change, paths relative to the project root, each in exactly this format:
{rules}

- Change between 1 and 4 files. A changed file must be given in full.
- No commentary. Begin your reply with {FILE_TOKEN}",
        rules = format_rules("path/to/file", "complete file content"),
    )
}

pub fn new_project_request(settings: &Settings) -> ModelRequest {
    ModelRequest {
        messages: vec![PromptMessage::user(new_project_prompt())],
        max_tokens: settings.max_tokens,
        temperature: settings.new_temperature,
    }
}

pub fn improve_request(settings: &Settings, name: &str, context: &str) -> ModelRequest {
    ModelRequest {
        messages: vec![PromptMessage::user(improve_prompt(name, context))],
        max_tokens: settings.max_tokens,
        temperature: settings.improve_temperature,
    }
}
