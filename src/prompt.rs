//! System prompt and prompt-window assembly for relay calls

use crate::conversation::{ConversationHistory, Message};

/// Persona instructions sent as the first message of every relay call
pub const SYSTEM_PROMPT: &str = "You are Uni-GPT, a professional voice assistant for UniQube bathroom and kitchen pods. You provide concise, helpful responses for:

- Calendar management (checking schedule, creating events)
- Email summaries (important/urgent messages)
- Weather information (Dubai/UAE focused)
- News briefings (90-second summaries)
- Kitchen recipes and cooking timers
- Grocery list management
- Smart home controls (lights, exhaust fans)

Keep responses brief and natural for voice interaction. Be friendly, professional, and contextually aware. When users ask about their schedule, weather, or specific information, provide clear, actionable responses.";

/// Number of prior history entries carried into each relay call
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Build the message list for one relay call
///
/// Layout is `[system, ..last `window` history entries, user]`. Entries older
/// than the window are left out of the prompt but stay in `history`.
#[must_use]
pub fn build_relay_messages(
    system_prompt: &str,
    history: &ConversationHistory,
    window: usize,
    user: &Message,
) -> Vec<Message> {
    let recent = history.recent(window);

    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend_from_slice(recent);
    messages.push(user.clone());
    messages
}
