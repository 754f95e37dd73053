use base64::{Engine as _, engine::general_purpose};

use crate::extract::errors::ExtractError;
use crate::llm::{ChatClient, ChatMessage, ChatRequest, ContentPart, ImageUrl};

/// Fixed instruction for the vision call. The model either transcribes the
/// text it can see or, failing that, describes the image.
pub const VISION_SYSTEM_PROMPT: &str = "You are an expert in image analysis and text \
extraction. Your job is to analyze images and extract ALL the text you can see, or describe \
the visual content in detail if there is no text. Respond in the language of the text found. \
If it is an invoice, receipt, document, letter, etc., extract all important data such as \
dates, numbers, names, etc. Be precise and complete in your analysis.";

/// Output token budget for one vision call.
pub const VISION_MAX_TOKENS: u32 = 2000;

/// Describe/transcribe an image through a vision-capable completion call.
///
/// The response content is the extracted text as-is; no further parsing.
pub async fn extract(
    chat: &dyn ChatClient,
    data: &[u8],
    mime: &str,
) -> Result<String, ExtractError> {
    let encoded = general_purpose::STANDARD.encode(data);
    let data_uri = format!("data:{mime};base64,{encoded}");

    let request = ChatRequest {
        messages: vec![
            ChatMessage::system(VISION_SYSTEM_PROMPT),
            ChatMessage::user_parts(vec![ContentPart::ImageUrl {
                image_url: ImageUrl { url: data_uri },
            }]),
        ],
        temperature: 0.0,
        max_tokens: Some(VISION_MAX_TOKENS),
        json_response: false,
    };

    let output = chat
        .complete(request)
        .await
        .map_err(|e| ExtractError::extraction("vision", e.to_string()))?;

    tracing::info!(chars = output.content.len(), "vision analysis complete");

    Ok(output.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatOutput, MessageContent, MockChatClient};

    #[tokio::test]
    async fn sends_base64_data_uri_with_fixed_budget() {
        let mut chat = MockChatClient::new();
        chat.expect_complete()
            .withf(|request| {
                let user = &request.messages[1];
                let MessageContent::Parts(parts) = &user.content else {
                    return false;
                };
                let ContentPart::ImageUrl { image_url } = &parts[0] else {
                    return false;
                };
                image_url.url.starts_with("data:image/png;base64,")
                    && request.max_tokens == Some(VISION_MAX_TOKENS)
                    && request.temperature == 0.0
                    && !request.json_response
            })
            .times(1)
            .returning(|_| {
                Ok(ChatOutput {
                    content: "A receipt from a hardware store".to_string(),
                    total_tokens: Some(42),
                })
            });

        let text = extract(&chat, &[0x89, 0x50, 0x4e, 0x47], "image/png")
            .await
            .unwrap();
        assert_eq!(text, "A receipt from a hardware store");
    }

    #[tokio::test]
    async fn completion_failure_wraps_as_vision_extraction_error() {
        let mut chat = MockChatClient::new();
        chat.expect_complete()
            .returning(|_| Err(crate::llm::LlmError::Transport("connection reset".into())));

        let err = extract(&chat, b"bytes", "image/jpeg").await.unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Extraction {
                method: "vision",
                ..
            }
        ));
    }
}
