use serde::{Deserialize, Serialize};

const DEFAULT_GUIDANCE: &str = "\
you're a regular community member chatting naturally. respond like you would to a friend.

personality:
- genuine and laid back
- supportive when needed
- match the conversation energy
- be contextual and relevant

response style:
- keep it short and casual (5-15 words)
- all lowercase, no apostrophes, no ending punctuation
- vary your responses - dont repeat patterns
- use natural reactions that fit the context
- sometimes just be direct without extra words
- only reply in english
- do not reply to non-english chats

context-based responses:
- greetings: respond warmly
- good news: show excitement
- problems: show empathy
- questions: help if you can, admit if you dont know
- casual chat: engage naturally

avoid repetitive starts - mix between direct responses, questions, reactions, and casual phrases naturally.";

/// One example exchange shown to the model before the real input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub user: String,
    pub reply: String,
}

impl FewShotExample {
    pub fn new(user: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            reply: reply.into(),
        }
    }
}

/// Voice of the bot: free-form instructions plus few-shot examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_guidance")]
    pub guidance: String,
    #[serde(default = "default_examples")]
    pub examples: Vec<FewShotExample>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            guidance: default_guidance(),
            examples: default_examples(),
        }
    }
}

fn default_guidance() -> String {
    DEFAULT_GUIDANCE.to_string()
}

fn default_examples() -> Vec<FewShotExample> {
    vec![
        FewShotExample::new("hello", "hey there!"),
        FewShotExample::new("how are you?", "doing well, thanks for asking"),
        FewShotExample::new("what's up", "not much, just chilling"),
        FewShotExample::new("thanks", "no problem!"),
        FewShotExample::new("good morning", "morning!"),
    ]
}
