use std::collections::HashMap;
use std::sync::Mutex;

use super::state::ConversationState;

/// Keeps the last committed state of each conversation thread in memory.
#[derive(Default)]
pub struct MemoryCheckpointer {
    threads: Mutex<HashMap<String, ConversationState>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, thread_id: &str) -> Option<ConversationState> {
        self.threads.lock().ok()?.get(thread_id).cloned()
    }

    pub fn save(&self, thread_id: &str, state: &ConversationState) {
        if let Ok(mut threads) = self.threads.lock() {
            threads.insert(thread_id.to_string(), state.clone());
        }
    }

    pub fn remove(&self, thread_id: &str) {
        if let Ok(mut threads) = self.threads.lock() {
            threads.remove(thread_id);
        }
    }
}
