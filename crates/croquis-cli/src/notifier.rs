//! Terminal implementation of the editor's notification port.

use async_trait::async_trait;
use croquis_core::ports::{Notifier, ToastLevel};
use dialoguer::{Confirm, Input};

use crate::output::OutputWriter;

/// Routes toasts to the terminal and dialogs to interactive prompts.
pub struct ConsoleNotifier {
    output: OutputWriter,
    assume_yes: bool,
}

impl ConsoleNotifier {
    pub fn new(output: OutputWriter, assume_yes: bool) -> Self {
        Self { output, assume_yes }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn toast(&self, level: ToastLevel, message: &str) {
        match level {
            ToastLevel::Info => self.output.info(message),
            ToastLevel::Success => self.output.success(message),
            ToastLevel::Warning => self.output.warning(message),
            ToastLevel::Error => self.output.error(message),
        }
    }

    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .unwrap_or(false)
    }

    async fn prompt_text(&self, label: &str) -> Option<String> {
        Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .ok()
    }
}
