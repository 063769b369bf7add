use anyhow::Result;
use colored::*;
use reedline::{
    Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline, Signal,
    ValidationResult, Validator,
};

/// Treats a trailing backslash as an explicit line continuation so long
/// editing requests can be typed across multiple lines.
pub struct EditPromptValidator;

impl Validator for EditPromptValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        if line.trim_end().ends_with('\\') {
            return ValidationResult::Incomplete;
        }
        ValidationResult::Complete
    }
}

pub struct EditPrompt;

impl Prompt for EditPrompt {
    fn render_prompt_left(&self) -> std::borrow::Cow<str> {
        "".into()
    }

    fn render_prompt_right(&self) -> std::borrow::Cow<str> {
        "".into()
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> std::borrow::Cow<str> {
        "› ".bright_green().bold().to_string().into()
    }

    fn render_prompt_multiline_indicator(&self) -> std::borrow::Cow<str> {
        "... ".dimmed().to_string().into()
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> std::borrow::Cow<str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        format!("({}reverse-search: {}) ", prefix, history_search.term).into()
    }
}

pub fn read_line() -> Result<String> {
    let mut line_editor = Reedline::create().with_validator(Box::new(EditPromptValidator));
    let prompt = EditPrompt;

    loop {
        let sig = line_editor.read_line(&prompt);
        match sig {
            Ok(Signal::Success(buffer)) => {
                return Ok(buffer);
            }
            Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                println!();
                println!("{}", "Goodbye!".bright_white());
                std::process::exit(0);
            }
            Err(e) => {
                return Err(anyhow::anyhow!("Error reading input: {}", e));
            }
        }
    }
}
