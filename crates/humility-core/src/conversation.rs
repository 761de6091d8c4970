use crate::messages::{Message, Role};

/// Append-only transcript of a single chat session.
///
/// Always starts with exactly one system message (the persona). There is no
/// way to remove or edit a message once it has been appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a transcript seeded with the given persona instruction.
    pub fn seeded(persona: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(persona)],
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Full transcript in chronological order, seed message first.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn count_user_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages a person would see: everything except system instructions.
    pub fn visible(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role() != Role::System)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_with_single_system_message() {
        let conv = Conversation::seeded("persona");
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.all()[0], Message::system("persona"));
        assert_eq!(conv.count_user_turns(), 0);
        assert!(!conv.is_empty());
    }

    #[test]
    fn user_turn_count_tracks_appends() {
        for n in 0..25 {
            let mut conv = Conversation::seeded("persona");
            for i in 0..n {
                conv.append(Message::user(format!("u{i}")));
                conv.append(Message::assistant(format!("a{i}")));
            }
            assert_eq!(conv.count_user_turns(), n);
            assert_eq!(conv.len(), 1 + 2 * n);
        }
    }

    #[test]
    fn consecutive_user_messages_are_allowed() {
        let mut conv = Conversation::seeded("persona");
        conv.append(Message::user("one"));
        conv.append(Message::user("two"));
        assert_eq!(conv.count_user_turns(), 2);
        assert_eq!(conv.all().last().map(Message::content), Some("two"));
    }

    #[test]
    fn append_preserves_order() {
        let mut conv = Conversation::seeded("persona");
        conv.append(Message::user("Hello"));
        conv.append(Message::assistant("Hi there!"));

        let contents: Vec<&str> = conv.all().iter().map(Message::content).collect();
        assert_eq!(contents, vec!["persona", "Hello", "Hi there!"]);
        assert_eq!(conv.all()[0].role(), Role::System);
    }

    #[test]
    fn visible_skips_system_messages() {
        let mut conv = Conversation::seeded("persona");
        conv.append(Message::user("Hello"));
        conv.append(Message::assistant("Hi there!"));

        let roles: Vec<Role> = conv.visible().map(Message::role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }
}
