pub mod favorites;
pub mod prompt;
pub mod render;

use std::io::Write;
use std::process::ExitCode;

use color_print::cformat;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use eyre::Result;
use prompt::generate_prompt;
use tracing::{error, info};

use crate::workflow::state::ConversationState;
use crate::workflow::{RecipeWorkflow, TurnInput, TurnStatus};
use favorites::Favorites;

const WELCOME_TEXT: &str = "
Hi, I'm your recipe assistant. Tell me what you have or what you feel like eating.

Things to try
• I have eggs, flour, tomatoes and cheese
• Quick pasta dinner for 4 people
• Vegetarian lunch ideas

/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
Recipe Chat

1. Enter your ingredients or recipe request
2. Review the suggestions and their key ingredients
3. Give feedback: say \"I like option 1\" to pick a recipe,
   or ask for changes like \"I want something vegetarian\"

/new          Start a new chat
/save         Save the selected recipe to favorites
/favorites    List favorite recipes
/remove <n>   Remove favorite number n
/help         Show this help dialogue
/quit         Quit the application
";

const FEEDBACK_QUESTION: &str =
    "Do you like any of these suggestions or should I make any changes?";

/// Presentation-side session data. The workflow never sees it.
#[derive(Default)]
struct ChatSession {
    chat_counter: usize,
    current: Option<ConversationState>,
}

impl ChatSession {
    fn thread_id(&self) -> String {
        format!("chat-{}", self.chat_counter)
    }

    fn status(&self) -> Option<TurnStatus> {
        self.current.as_ref().map(TurnStatus::of)
    }

    fn awaiting_feedback(&self) -> bool {
        self.status() == Some(TurnStatus::AwaitingFeedback)
    }

    fn reset(&mut self) {
        self.current = None;
        self.chat_counter += 1;
    }
}

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    workflow: RecipeWorkflow,
    favorites: Favorites,
    session: ChatSession,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        workflow: RecipeWorkflow,
        favorites: Favorites,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            workflow,
            favorites,
            session: ChatSession::default(),
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Handle non-interactive mode (single query)
        if let Some(input) = self.input.take() {
            let ok = self.handle_input(&input).await?;
            return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }

        if self.interactive {
            writeln!(self.output, "{}", WELCOME_TEXT)?;
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = generate_prompt(self.session.awaiting_feedback());
            let readline = rl.readline(&prompt_text);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        writeln!(self.output, "Error: {}", e)?;
                    }
                }
                Err(e) => {
                    info!("Leaving chat: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Returns `false` when a turn failed and the user was shown an error.
    async fn handle_input(&mut self, input: &str) -> Result<bool> {
        let input = input.trim();
        let mut words = input.split_whitespace();

        match words.next() {
            Some("/help") => writeln!(self.output, "{}", HELP_TEXT)?,
            Some("/new") => self.new_chat()?,
            Some("/favorites") => render::favorites(&mut self.output, self.favorites.entries())?,
            Some("/save") => self.save_selected()?,
            Some("/remove") => self.remove_favorite(words.next())?,
            _ => return self.run_turn(input).await,
        }

        Ok(true)
    }

    async fn run_turn(&mut self, text: &str) -> Result<bool> {
        let thread_id = self.session.thread_id();
        let turn_input = if self.session.awaiting_feedback() {
            TurnInput::Feedback(text.to_string())
        } else {
            TurnInput::Message(text.to_string())
        };

        writeln!(self.output, "{}", cformat!("<dim>Searching for recipes...</dim>"))?;

        let state = match self.workflow.invoke(&thread_id, turn_input).await {
            Ok(state) => state,
            Err(e) => {
                error!("Turn failed: {}", e);
                writeln!(self.output, "An error occurred: {}", e)?;
                return Ok(false);
            }
        };

        self.display_state(&state)?;
        self.session.current = Some(state);
        Ok(true)
    }

    fn display_state(&mut self, state: &ConversationState) -> Result<()> {
        match TurnStatus::of(state) {
            TurnStatus::Selected(_) => {
                if let Some((recipe, feature)) = state.selection() {
                    writeln!(
                        self.output,
                        "{}",
                        cformat!("<green>Great! You selected: {}</green>", feature.dish_name)
                    )?;
                    render::selected_recipe(&mut self.output, recipe, feature)?;
                    writeln!(self.output, "\nType /save to keep it in your favorites.")?;
                }
            }
            TurnStatus::AwaitingFeedback => {
                if !state.query.is_empty() {
                    writeln!(self.output, "{}", cformat!("<dim>Searched for: {}</dim>", state.query))?;
                }
                render::recipe_features(&mut self.output, &state.features)?;
                writeln!(self.output, "\n{}", FEEDBACK_QUESTION)?;
            }
            TurnStatus::NoRecipes => {
                writeln!(
                    self.output,
                    "No recipes found. Try describing what you'd like differently."
                )?;
            }
        }
        Ok(())
    }

    fn new_chat(&mut self) -> Result<()> {
        self.workflow.forget_thread(&self.session.thread_id());
        self.session.reset();
        if self.interactive {
            execute!(self.output, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        writeln!(self.output, "Started a new chat.")?;
        Ok(())
    }

    fn save_selected(&mut self) -> Result<()> {
        let Some(recipe) = self
            .session
            .current
            .as_ref()
            .and_then(|state| state.selection())
            .map(|(recipe, _)| recipe.clone())
        else {
            writeln!(self.output, "Select a recipe before saving it.")?;
            return Ok(());
        };

        if self.favorites.add(&recipe)? {
            writeln!(self.output, "Recipe saved to favorites!")?;
        } else {
            writeln!(self.output, "This recipe is already in your favorites!")?;
        }
        Ok(())
    }

    fn remove_favorite(&mut self, position: Option<&str>) -> Result<()> {
        let Some(position) = position.and_then(|p| p.parse::<usize>().ok()) else {
            writeln!(self.output, "Usage: /remove <n>")?;
            return Ok(());
        };

        match self.favorites.remove(position) {
            Ok(removed) => writeln!(self.output, "Removed {} from favorites.", removed.recipe.name)?,
            Err(e) => writeln!(self.output, "{}", e)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::config::WorkflowConfig;
    use crate::testing::{features_reply, hit, ScriptedModel, StaticSearch};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn context(model: ScriptedModel, dir: &tempfile::TempDir) -> (ChatContext, SharedBuffer) {
        let search = Arc::new(StaticSearch::returning(vec![
            hit("Shakshuka"),
            hit("Cheese Souffle"),
            hit("Tomato Tart"),
        ]));
        let workflow = RecipeWorkflow::new(Arc::new(model), search, &WorkflowConfig::default());
        let favorites = Favorites::load(dir.path().join("favorites.json")).unwrap();
        let buffer = SharedBuffer::default();
        let context = ChatContext::new(Box::new(buffer.clone()), None, false, workflow, favorites);
        (context, buffer)
    }

    fn search_then_select() -> ScriptedModel {
        ScriptedModel::new()
            .with_completion("eggs tomato cheese recipe")
            .with_structured(features_reply(&["Shakshuka", "Cheese Souffle", "Tomato Tart"]))
            .with_structured(json!({"like": 1}))
    }

    #[tokio::test]
    async fn test_search_then_feedback_selects() {
        let dir = tempfile::tempdir().unwrap();
        let (mut chat, output) = context(search_then_select(), &dir);

        assert!(chat.handle_input("I have eggs, tomatoes and cheese").await.unwrap());
        assert!(chat.session.awaiting_feedback());
        assert!(output.contents().contains(FEEDBACK_QUESTION));

        assert!(chat.handle_input("the souffle please").await.unwrap());
        assert_eq!(chat.session.status(), Some(TurnStatus::Selected(1)));
        assert!(output.contents().contains("Great! You selected: Cheese Souffle"));
    }

    #[tokio::test]
    async fn test_save_requires_selection() {
        let dir = tempfile::tempdir().unwrap();
        let (mut chat, output) = context(search_then_select(), &dir);

        chat.handle_input("/save").await.unwrap();
        assert!(output.contents().contains("Select a recipe before saving it."));

        chat.handle_input("eggs").await.unwrap();
        chat.handle_input("number two").await.unwrap();
        chat.handle_input("/save").await.unwrap();
        chat.handle_input("/save").await.unwrap();

        let contents = output.contents();
        assert!(contents.contains("Recipe saved to favorites!"));
        assert!(contents.contains("This recipe is already in your favorites!"));
        assert_eq!(chat.favorites.entries()[0].recipe.name, "Cheese Souffle");
    }

    #[tokio::test]
    async fn test_new_chat_resets_session() {
        let dir = tempfile::tempdir().unwrap();
        let (mut chat, output) = context(search_then_select(), &dir);

        chat.handle_input("eggs").await.unwrap();
        let old_thread = chat.session.thread_id();
        chat.handle_input("/new").await.unwrap();

        assert!(chat.session.current.is_none());
        assert_ne!(chat.session.thread_id(), old_thread);
        assert!(chat.workflow.thread_state(&old_thread).is_none());
        assert!(output.contents().contains("Started a new chat."));
    }

    #[tokio::test]
    async fn test_failed_turn_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let (mut chat, output) = context(ScriptedModel::new().with_completion_error(), &dir);

        assert!(!chat.handle_input("eggs").await.unwrap());
        assert!(output.contents().contains("An error occurred:"));
        assert!(chat.session.current.is_none());
    }

    #[tokio::test]
    async fn test_remove_usage() {
        let dir = tempfile::tempdir().unwrap();
        let (mut chat, output) = context(ScriptedModel::new(), &dir);

        chat.handle_input("/remove").await.unwrap();
        chat.handle_input("/remove 3").await.unwrap();

        let contents = output.contents();
        assert!(contents.contains("Usage: /remove <n>"));
        assert!(contents.contains("no favorite at position 3"));
    }
}
