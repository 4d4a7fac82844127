use crate::output::{print_json, print_table};
use anyhow::Context;
use ideaforge_core::parser;
use std::io::Read;
use std::path::Path;

/// Parse a saved model response from `source` (`-` for stdin).
pub fn run(source: &Path, render: bool, json: bool) -> anyhow::Result<()> {
    let bytes = if source == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read(source).with_context(|| format!("failed to read {}", source.display()))?
    };

    let files = parser::parse_bytes(&bytes);

    if json {
        return print_json(&files);
    }
    if render {
        print!("{}", parser::render(&files));
        return Ok(());
    }
    if files.is_empty() {
        println!("No files found.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = files
        .iter()
        .map(|f| {
            vec![
                f.path.clone(),
                f.content.lines().count().to_string(),
                f.content.len().to_string(),
            ]
        })
        .collect();
    print_table(&["PATH", "LINES", "BYTES"], &rows);
    Ok(())
}
