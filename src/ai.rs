use crate::error::ResponderError;
use crate::prompt::BehaviorSpec;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestSystemMessageArgs, CreateChatCompletionRequestArgs},
};
use std::future::Future;

/// Produces the in-character reply of a persona.
///
/// Implementations make exactly one attempt per call; the turn controller
/// turns a failure into the fallback message instead of retrying.
pub trait Responder: Send + Sync + 'static {
    fn respond(
        &self,
        spec: &BehaviorSpec,
        user_message: &str,
    ) -> impl Future<Output = Result<String, ResponderError>> + Send;
}

#[derive(Clone)]
pub struct OpenAiResponder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiResponder {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        let openai_config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(openai_config),
            model: model.into(),
        }
    }

    pub fn with_client(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl Responder for OpenAiResponder {
    async fn respond(
        &self,
        spec: &BehaviorSpec,
        user_message: &str,
    ) -> Result<String, ResponderError> {
        log::debug!("Sending message to {}: {}", self.model, user_message);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestSystemMessageArgs::default()
                .content(spec.prompt_for(user_message))
                .build()?
                .into()])
            .build()?;

        let response = self.client.chat().create(request).await?;
        let reply = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ResponderError::EmptyReply)?;

        log::debug!("Reply received: {}", reply);
        Ok(reply)
    }
}
