//! Markdown export of a conversation transcript.

use chrono::Utc;

use crate::core::conversation::Conversation;
use crate::core::message::Message;

/// Render a conversation as a Markdown document. `resolve_service` maps
/// service keys to display names (see `ServiceCatalog::display_name`).
pub fn conversation_markdown<F>(conversation: &Conversation, resolve_service: F) -> String
where
    F: Fn(&str) -> String,
{
    let now = Utc::now().format("%Y-%m-%d %H:%M UTC");
    let questions = conversation
        .messages()
        .iter()
        .filter(|message| message.is_user())
        .count();

    let mut lines = vec![
        "# Documentation Assistant — Session Export".to_string(),
        format!("Exported: {now}  "),
        format!("Questions: {questions}"),
        String::new(),
    ];

    let mut question_no = 0;
    for message in conversation.messages() {
        if message.is_user() {
            question_no += 1;
            lines.push(format!("---\n## Q{question_no}: {}\n", message.text));
            continue;
        }
        render_answer(&mut lines, message, &resolve_service);
    }

    lines.join("\n")
}

fn render_answer<F>(lines: &mut Vec<String>, message: &Message, resolve_service: &F)
where
    F: Fn(&str) -> String,
{
    let Some(meta) = message.meta.as_ref() else {
        lines.push(message.text.clone());
        lines.push(String::new());
        return;
    };

    if meta.is_error() {
        lines.push(format!("**Error:** {}\n", message.text));
        return;
    }

    if !meta.services.is_empty() {
        let names: Vec<String> = meta
            .services
            .iter()
            .map(|key| resolve_service(key))
            .collect();
        lines.push(format!("**Services:** {}  ", names.join(", ")));
    }
    if let Some(confidence) = meta.confidence {
        lines.push(format!("**Confidence:** {:.0}%  \n", confidence * 100.0));
    }
    lines.push(message.text.clone());
    lines.push(String::new());
    if !meta.links.is_empty() {
        lines.push("**Links:**".to_string());
        for link in &meta.links {
            lines.push(format!("- [{}]({}) — {}", link.title, link.url, link.description));
        }
        lines.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::api::DocLink;
    use crate::core::conversation::ConversationStore;
    use crate::core::message::MessageMeta;

    fn resolve(key: &str) -> String {
        match key {
            "ai-core" => "AI Core".to_string(),
            other => other.to_string(),
        }
    }

    #[test]
    fn export_numbers_questions_and_reports_metadata() {
        let mut store = ConversationStore::new();
        let id = store.create();
        store
            .append(id, Message::user("What is the runtime?"))
            .expect("append ok");
        store
            .append(
                id,
                Message::assistant(
                    "A managed runtime.",
                    MessageMeta {
                        confidence: Some(0.92),
                        in_scope: Some(true),
                        services: vec!["ai-core".to_string()],
                        links: vec![DocLink {
                            title: "Runtime guide".to_string(),
                            url: "https://docs.example.org/runtime".to_string(),
                            description: "Overview".to_string(),
                        }],
                        pipeline: Vec::new(),
                        error_kind: None,
                    },
                ),
            )
            .expect("append ok");
        store
            .append(id, Message::user("And when it is down?"))
            .expect("append ok");
        store
            .append(
                id,
                Message::assistant_failure("unreachable", "Cannot reach the API."),
            )
            .expect("append ok");

        let exported = conversation_markdown(store.get(id).expect("exists"), resolve);

        assert!(exported.starts_with("# Documentation Assistant — Session Export"));
        assert!(exported.contains("Questions: 2"));
        assert!(exported.contains("## Q1: What is the runtime?"));
        assert!(exported.contains("**Services:** AI Core  "));
        assert!(exported.contains("**Confidence:** 92%  "));
        assert!(exported.contains("A managed runtime."));
        assert!(exported.contains("- [Runtime guide](https://docs.example.org/runtime) — Overview"));
        assert!(exported.contains("## Q2: And when it is down?"));
        assert!(exported.contains("**Error:** Cannot reach the API."));
    }

    #[test]
    fn export_of_a_draft_has_no_question_sections() {
        let mut store = ConversationStore::new();
        let id = store.create();
        let exported = conversation_markdown(store.get(id).expect("exists"), resolve);
        assert!(exported.contains("Questions: 0"));
        assert!(!exported.contains("## Q"));
    }
}
