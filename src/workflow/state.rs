use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A search hit normalized into the shape the rest of the workflow consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub url: String,
    pub content: String,
}

/// Structured summary of a single recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFeature {
    pub dish_name: String,
    #[serde(default)]
    pub key_ingredients: Vec<String>,
    #[serde(default)]
    pub cooking_style: Option<String>,
}

/// The record threaded through every stage of a turn.
///
/// `recipes[i]` is always described by `features[i]`, and `selected`, when set,
/// indexes into both lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub features: Vec<RecipeFeature>,
    #[serde(default)]
    pub selected: Option<usize>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl ConversationState {
    /// Seed a fresh conversation with a single user message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(message)],
            ..Self::default()
        }
    }

    /// Selection as a signed index, `-1` meaning nothing has been chosen.
    pub fn selection_index(&self) -> i64 {
        self.selected.map(|i| i as i64).unwrap_or(-1)
    }

    /// Queue a feedback utterance, replacing any unconsumed one.
    pub fn set_feedback(&mut self, feedback: impl Into<String>) {
        self.feedback = Some(feedback.into());
    }

    /// Overwrite the most recent message with a user message, or push one if empty.
    pub fn replace_latest_message(&mut self, content: impl Into<String>) {
        let message = ChatMessage::user(content);
        match self.messages.last_mut() {
            Some(last) => *last = message,
            None => self.messages.push(message),
        }
    }

    /// Recipe and feature at the current selection.
    pub fn selection(&self) -> Option<(&Recipe, &RecipeFeature)> {
        let index = self.selected?;
        Some((self.recipes.get(index)?, self.features.get(index)?))
    }

    /// Whether `index` points at a recipe that has a matching feature.
    pub fn is_valid_index(&self, index: usize) -> bool {
        index < self.recipes.len() && index < self.features.len()
    }

    /// Drop recipes and features together so they never drift apart.
    pub fn clear_results(&mut self) {
        self.recipes.clear();
        self.features.clear();
        self.selected = None;
    }
}
