use rustyline::{Config, Editor, Result};

/// Prompt text for the next line: a search before there are suggestions,
/// feedback once there are.
pub fn generate_prompt(awaiting_feedback: bool) -> String {
    if awaiting_feedback {
        "feedback> ".to_string()
    } else {
        "> ".to_string()
    }
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    Editor::with_config(config)
}
