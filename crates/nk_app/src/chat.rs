use futures_util::StreamExt;
use nk_core::{ChatMessage, ChatRole, Error, Result, User};
use nk_inference::Gateway;
use tracing::error;

pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful and friendly news assistant. Your name is Kamo. Be concise in your answers.";
pub const CHAT_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

pub fn greeting(user: Option<&User>) -> String {
    let name = user.and_then(User::first_name).unwrap_or("there");
    format!("Hi {}! I'm Kamo, your news assistant. How can I help you today?", name)
}

/// A conversation with the news assistant, opened with a greeting.
#[derive(Debug)]
pub struct ChatSession {
    gateway: Gateway,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(gateway: Gateway, user: Option<&User>) -> Self {
        Self {
            gateway,
            messages: vec![ChatMessage::model(greeting(user))],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send `input` and stream the reply into the transcript, calling
    /// `on_fragment` for each piece as it arrives.
    ///
    /// A failing reply is not an error for the caller: the transcript gets
    /// [`CHAT_ERROR_MESSAGE`] instead, replacing the reply if nothing had
    /// arrived yet.
    pub async fn send<F>(&mut self, input: &str, mut on_fragment: F) -> Result<ChatMessage>
    where
        F: FnMut(&str),
    {
        if input.trim().is_empty() {
            return Err(Error::Validation { field: "message" });
        }
        self.messages.push(ChatMessage::user(input));
        let history = self.messages.clone();
        self.messages.push(ChatMessage::model(String::new()));

        let mut stream = self.gateway.stream_chat(SYSTEM_INSTRUCTION, &history).await;
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    if let Some(reply) = self.messages.last_mut() {
                        reply.text.push_str(&fragment);
                    }
                    on_fragment(&fragment);
                }
                Err(e) => {
                    error!("Chat reply failed: {}", e);
                    match self.messages.last_mut() {
                        Some(reply) if reply.role == ChatRole::Model && reply.text.is_empty() => {
                            reply.text = CHAT_ERROR_MESSAGE.to_string();
                        }
                        _ => self.messages.push(ChatMessage::model(CHAT_ERROR_MESSAGE)),
                    }
                    break;
                }
            }
        }

        Ok(self.messages.last().cloned().unwrap_or_else(|| ChatMessage::model(String::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream;
    use nk_core::{Article, NewsGateway, Quote, StockData, TextStream, Weather};
    use std::sync::Arc;
    use std::time::Duration;

    /// Replies with the scripted items, whatever is asked.
    #[derive(Debug)]
    struct ScriptedChat(Vec<std::result::Result<&'static str, &'static str>>);

    #[async_trait]
    impl NewsGateway for ScriptedChat {
        fn name(&self) -> &str {
            "ScriptedChat"
        }
        async fn generate_article(&self, _topic: &str) -> Result<Article> {
            Err(Error::Inference("unused".to_string()))
        }
        async fn fetch_weather(&self, _city: &str) -> Result<Weather> {
            Err(Error::Inference("unused".to_string()))
        }
        async fn fetch_daily_quote(&self) -> Result<Quote> {
            Err(Error::Inference("unused".to_string()))
        }
        async fn generate_creative_idea(&self) -> Result<String> {
            Err(Error::Inference("unused".to_string()))
        }
        async fn fetch_financial_news(&self) -> Result<Vec<Article>> {
            Err(Error::Inference("unused".to_string()))
        }
        async fn fetch_market_data(&self) -> Result<Vec<StockData>> {
            Err(Error::Inference("unused".to_string()))
        }
        async fn stream_news_updates(&self, _topic: &str) -> Result<TextStream> {
            Err(Error::Inference("unused".to_string()))
        }
        async fn stream_chat(&self, system: &str, history: &[ChatMessage]) -> Result<TextStream> {
            assert_eq!(system, SYSTEM_INSTRUCTION);
            assert_eq!(history.last().map(|m| m.role), Some(ChatRole::User));
            let items: Vec<Result<String>> = self
                .0
                .iter()
                .map(|item| match item {
                    Ok(text) => Ok(text.to_string()),
                    Err(e) => Err(Error::Inference(e.to_string())),
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    fn session(script: Vec<std::result::Result<&'static str, &'static str>>) -> ChatSession {
        let gateway = Gateway::new(Arc::new(ScriptedChat(script)), Duration::from_secs(1));
        ChatSession::new(gateway, None)
    }

    #[test]
    fn test_greeting() {
        let user = User {
            name: "Lerato Dlamini".to_string(),
            email: "lerato@example.com".to_string(),
            picture: String::new(),
        };
        assert_eq!(
            greeting(Some(&user)),
            "Hi Lerato! I'm Kamo, your news assistant. How can I help you today?"
        );
        assert!(greeting(None).starts_with("Hi there!"));
    }

    #[tokio::test]
    async fn test_streamed_reply() {
        let mut chat = session(vec![Ok("Markets "), Ok("are up.")]);
        let mut seen = Vec::new();
        let reply = chat.send("How are markets?", |f| seen.push(f.to_string())).await.unwrap();

        assert_eq!(reply, ChatMessage::model("Markets are up."));
        assert_eq!(seen, vec!["Markets ", "are up."]);
        assert_eq!(chat.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_error_replaces_empty_reply() {
        let mut chat = session(vec![Err("boom")]);
        let reply = chat.send("Hello", |_| {}).await.unwrap();
        assert_eq!(reply.text, CHAT_ERROR_MESSAGE);
        assert_eq!(chat.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_error_after_partial_reply_is_appended() {
        let mut chat = session(vec![Ok("Partial"), Err("boom")]);
        chat.send("Hello", |_| {}).await.unwrap();
        let texts: Vec<&str> = chat.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts[2..], ["Partial", CHAT_ERROR_MESSAGE]);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let mut chat = session(vec![]);
        assert!(matches!(
            chat.send("  ", |_| {}).await,
            Err(Error::Validation { field: "message" })
        ));
        assert_eq!(chat.messages().len(), 1);
    }
}
