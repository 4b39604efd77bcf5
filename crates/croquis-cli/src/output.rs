use console::style;
use std::fmt::Display;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }

    pub fn success(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {}", style("✓").green().bold(), message);
            }
            OutputFormat::Json => self.status_line("success", message),
        }
    }

    pub fn info(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {}", style("ℹ").blue().bold(), message);
            }
            OutputFormat::Json => self.status_line("info", message),
        }
    }

    pub fn warning(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", style("⚠").yellow().bold(), message);
            }
            OutputFormat::Json => self.status_line("warning", message),
        }
    }

    pub fn error(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", style("✗").red().bold(), message);
            }
            OutputFormat::Json => self.status_line("error", message),
        }
    }

    /// Print a table with dynamic columns.
    pub fn table(&self, headers: Vec<String>, rows: Vec<Vec<String>>) {
        match self.format {
            OutputFormat::Human => {
                let mut builder = Builder::default();
                builder.push_record(headers);
                for row in rows {
                    builder.push_record(row);
                }
                println!("{}", builder.build().with(Style::rounded()));
            }
            OutputFormat::Json => {
                let objects: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|row| {
                        headers
                            .iter()
                            .zip(row)
                            .map(|(h, c)| (h.clone(), serde_json::json!(c)))
                            .collect::<serde_json::Map<_, _>>()
                            .into()
                    })
                    .collect();
                match serde_json::to_string_pretty(&objects) {
                    Ok(text) => println!("{text}"),
                    Err(e) => self.error(e),
                }
            }
        }
    }

    fn status_line(&self, status: &str, message: impl Display) {
        let output = serde_json::json!({
            "status": status,
            "message": message.to_string(),
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("{e}"),
        }
    }
}
