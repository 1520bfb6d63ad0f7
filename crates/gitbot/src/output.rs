use crate::cli::OutputFormat;
use colored::Colorize;
use gitbot::reply::{Button, Embed, InputStyle, ModalForm, Reply, Response};
use serde::Serialize;

pub fn output_result<T: Serialize + Displayable>(result: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(result) {
                println!("{}", json);
            }
        }
        OutputFormat::Text => {
            println!("{}", result.display());
        }
    }
}

#[derive(Serialize)]
struct JsonMessage<'a> {
    success: bool,
    message: &'a str,
}

/// Print a plain status line from the command-line tooling
pub fn output_message(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let json = JsonMessage {
                success: true,
                message,
            };
            if let Ok(json) = serde_json::to_string_pretty(&json) {
                println!("{}", json);
            }
        }
        OutputFormat::Text => println!("{}", message),
    }
}

#[derive(Serialize)]
pub struct JsonError {
    pub error: bool,
    pub code: String,
    pub message: String,
}

pub fn output_error(err: &anyhow::Error, format: OutputFormat) {
    let message = match format {
        OutputFormat::Json => {
            let json_err = JsonError {
                error: true,
                code: "error".to_string(),
                message: format!("{:#}", err),
            };
            serde_json::to_string_pretty(&json_err)
                .unwrap_or_else(|_| format!(r#"{{"error": true, "message": "{}"}}"#, err))
        }
        OutputFormat::Text => format!("{}: {:#}", "Error".red().bold(), err),
    };
    eprintln!("{}", message);
}

pub trait Displayable {
    fn display(&self) -> String;
}

impl Displayable for Response {
    fn display(&self) -> String {
        match self {
            Response::Message(reply) | Response::Update(reply) => reply.display(),
            Response::Modal(form) => form.display(),
            Response::Acknowledge => "(no change)".dimmed().to_string(),
        }
    }
}

impl Displayable for Reply {
    fn display(&self) -> String {
        let mut parts = Vec::new();
        if let Some(content) = &self.content {
            parts.push(content.clone());
        }
        if let Some(embed) = &self.embed {
            parts.push(embed.display());
        }
        if !self.buttons.is_empty() {
            let buttons: Vec<String> = self.buttons.iter().map(Displayable::display).collect();
            parts.push(buttons.join(" "));
        }
        if self.ephemeral {
            parts.push("(only visible to you)".dimmed().to_string());
        }
        parts.join("\n")
    }
}

impl Displayable for Embed {
    fn display(&self) -> String {
        let mut output = self.title.cyan().bold().to_string();
        if let Some(url) = &self.url {
            output.push_str(&format!("\n  {}", url.dimmed()));
        }
        if let Some(description) = &self.description {
            output.push_str(&format!("\n\n{}\n", description));
        }
        for field in &self.fields {
            if field.inline {
                output.push_str(&format!("\n  {}: {}", field.name.dimmed(), field.value));
            } else {
                output.push_str(&format!("\n  {}\n    {}", field.name.bold(), field.value));
            }
        }
        if let Some(footer) = &self.footer {
            output.push_str(&format!("\n{}", footer.dimmed()));
        }
        output
    }
}

impl Displayable for Button {
    fn display(&self) -> String {
        let label = format!("[{}]", self.label);
        if self.disabled {
            label.dimmed().to_string()
        } else {
            label.green().to_string()
        }
    }
}

impl Displayable for ModalForm {
    fn display(&self) -> String {
        let mut output = self.title.cyan().bold().to_string();
        for input in &self.inputs {
            let kind = match input.style {
                InputStyle::Short => "short",
                InputStyle::Paragraph => "paragraph",
            };
            let required = if input.required { ", required" } else { "" };
            output.push_str(&format!(
                "\n  {} ({}{}): {}",
                input.label,
                kind,
                required,
                input.placeholder.dimmed()
            ));
        }
        output
    }
}
