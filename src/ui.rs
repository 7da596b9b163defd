// UI layer: terminal prompting with `dialoguer` and a spinner from
// `indicatif`. Prompts and the spinner draw on stderr so stdout stays free
// for command output (a clone can be piped straight to a file).

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use crate::dispatch::{FieldDescriptor, Prompter};
use crate::error::{HecateError, Result};

/// Prompts for each field in order on the controlling terminal.
///
/// Secret fields use `Password`, which hides what is typed.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, fields: &[FieldDescriptor]) -> Result<BTreeMap<String, String>> {
        if !std::io::stdin().is_terminal() {
            return Err(HecateError::PromptAborted(
                "interactive mode requires a terminal; use --script or pass the values as flags".into(),
            ));
        }

        let mut answers = BTreeMap::new();
        for field in fields {
            let value = if field.secret {
                Password::new()
                    .with_prompt(&field.prompt)
                    .allow_empty_password(!field.required)
                    .interact()
            } else {
                let mut input = Input::<String>::new();
                input.with_prompt(&field.prompt).allow_empty(!field.required);
                if let Some(default) = &field.default {
                    input.default(default.clone());
                }
                input.interact_text()
            };
            let value = value.map_err(|e| HecateError::PromptAborted(e.to_string()))?;

            answers.insert(field.name.clone(), value);
        }
        Ok(answers)
    }
}

/// A ticking spinner on stderr. Hidden automatically when stderr is not a
/// terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
