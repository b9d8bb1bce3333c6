use super::OutputFormat;
use anyhow::Result;
use command_executor::{Executor, ResolveOptions};
use comfy_table::{Cell, Color, Table};
use serde_json::json;

pub fn run(
    executor: &Executor,
    names: &[String],
    prefer_alternate: bool,
    format: OutputFormat,
) -> Result<bool> {
    let options = ResolveOptions {
        prefer_alternate,
        ..ResolveOptions::default()
    };
    let descriptors: Vec<_> = names
        .iter()
        .map(|name| executor.resolver().resolve_with(name, options))
        .collect();

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = descriptors
                .iter()
                .map(|d| {
                    json!({
                        "name": d.logical_name(),
                        "path": d.resolved_path(),
                        "alternate_install": d.is_alternate_install(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            let mut table = Table::new();
            table.set_header(vec!["TOOL", "PATH", "ALTERNATE INSTALL"]);
            for descriptor in &descriptors {
                let path = match descriptor.resolved_path() {
                    Some(path) => Cell::new(path.display()),
                    None => Cell::new("not found").fg(Color::Red),
                };
                table.add_row(vec![
                    Cell::new(descriptor.logical_name()),
                    path,
                    Cell::new(if descriptor.is_alternate_install() { "yes" } else { "-" }),
                ]);
            }
            println!("{}", table);
        }
    }

    Ok(descriptors.iter().all(|d| d.is_resolved()))
}
