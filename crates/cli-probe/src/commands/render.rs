use comfy_table::Table;
use indexmap::IndexMap;
use response_parsers::{ContainerDetails, ContainerSummary, DiffEntry, ProcessTable};

/// Text form of a parsed payload
pub trait Render {
    fn render(&self) -> String;
}

impl Render for String {
    fn render(&self) -> String {
        self.clone()
    }
}

impl Render for Vec<String> {
    fn render(&self) -> String {
        self.join("\n")
    }
}

impl Render for i32 {
    fn render(&self) -> String {
        format!("exit code {self}")
    }
}

impl Render for () {
    fn render(&self) -> String {
        "ok".to_string()
    }
}

impl Render for ProcessTable {
    fn render(&self) -> String {
        self.to_string().trim_end().to_string()
    }
}

impl Render for serde_json::Value {
    fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Render for Vec<serde_json::Value> {
    fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Render for ContainerDetails {
    fn render(&self) -> String {
        let mut table = Table::new();
        table.set_header(vec!["FIELD", "VALUE"]);
        table.add_row(vec!["Id", self.id.as_str()]);
        table.add_row(vec!["Name", self.name.as_str()]);
        table.add_row(vec!["Image", self.config.image.as_str()]);
        table.add_row(vec!["Status", self.state.status.as_str()]);
        table.add_row(vec!["Pid".to_string(), self.state.pid.to_string()]);
        table.add_row(vec!["Exit code".to_string(), self.state.exit_code.to_string()]);
        if let Some(health) = &self.state.health {
            table.add_row(vec!["Health", health.status.as_str()]);
        }
        if let Some(entrypoint) = &self.config.entrypoint {
            table.add_row(vec!["Entrypoint".to_string(), entrypoint.join(" ")]);
        }
        if let Some(cmd) = &self.config.cmd {
            table.add_row(vec!["Cmd".to_string(), cmd.join(" ")]);
        }
        table.to_string()
    }
}

impl Render for IndexMap<String, String> {
    fn render(&self) -> String {
        let mut table = Table::new();
        table.set_header(vec!["NAME", "VALUE"]);
        for (name, value) in self {
            table.add_row(vec![name, value]);
        }
        table.to_string()
    }
}

impl Render for Vec<IndexMap<String, String>> {
    fn render(&self) -> String {
        let Some(first) = self.first() else {
            return String::new();
        };
        let mut table = Table::new();
        table.set_header(first.keys().collect::<Vec<_>>());
        for record in self {
            table.add_row(record.values().collect::<Vec<_>>());
        }
        table.to_string()
    }
}

impl Render for Vec<DiffEntry> {
    fn render(&self) -> String {
        self.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Render for Vec<ContainerSummary> {
    fn render(&self) -> String {
        let mut table = Table::new();
        table.set_header(vec!["CONTAINER ID", "IMAGE", "STATUS", "PORTS", "NAMES"]);
        for summary in self {
            table.add_row(vec![
                summary.id.chars().take(12).collect::<String>(),
                summary.image.clone(),
                summary.status.clone(),
                summary.ports.clone(),
                summary.names.join(","),
            ]);
        }
        table.to_string()
    }
}
