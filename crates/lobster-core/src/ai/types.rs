//! Request and response shapes for the Gemini `generateContent` endpoint.
//!
//! Parts the model sends are kept as raw JSON when a turn has to be echoed
//! back, so fields this crate does not model (thought signatures and the
//! like) survive the round trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// The result of a function call, sent back to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
    /// A part echoed exactly as the model produced it.
    Raw(Value),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: Role::User,
            parts: responses
                .into_iter()
                .map(|function_response| Part::FunctionResponse { function_response })
                .collect(),
        }
    }

    /// Rebuild the model's turn from the raw candidate content.
    pub fn model_echo(candidate_content: &Value) -> Self {
        let parts = candidate_content
            .get("parts")
            .and_then(Value::as_array)
            .map(|parts| parts.iter().cloned().map(Part::Raw).collect())
            .unwrap_or_default();

        Self {
            role: Role::Model,
            parts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateConfig {
    pub system_instruction: String,
    pub temperature: f64,
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub config: GenerateConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    /// Concatenated non-thought text of the first candidate.
    pub text: String,
    pub function_calls: Vec<FunctionCall>,
    /// The first candidate's `content`, exactly as received.
    pub candidate_content: Option<Value>,
}

impl GenerateResponse {
    pub fn has_function_calls(&self) -> bool {
        !self.function_calls.is_empty()
    }

    /// Interpret a `generateContent` response body.
    pub fn from_body(body: &Value) -> Self {
        let candidate_content = body
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .cloned();

        let parts: &[Value] = candidate_content
            .as_ref()
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut text = String::new();
        let mut function_calls = Vec::new();

        for part in parts {
            if let Some(call) = part.get("functionCall") {
                if let Ok(call) = serde_json::from_value::<FunctionCall>(call.clone()) {
                    function_calls.push(call);
                }
                continue;
            }
            let is_thought = part.get("thought").and_then(Value::as_bool).unwrap_or(false);
            if let (Some(chunk), false) = (part.get("text").and_then(Value::as_str), is_thought) {
                text.push_str(chunk);
            }
        }

        Self {
            text,
            function_calls,
            candidate_content,
        }
    }
}

/// Body actually posted to the API.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRequest<'a> {
    pub contents: &'a [Content],
    pub system_instruction: WireSystemInstruction<'a>,
    pub generation_config: WireGenerationConfig,
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [Tool],
}

fn no_tools(tools: &&[Tool]) -> bool {
    tools.is_empty()
}

#[derive(Serialize)]
pub(crate) struct WireSystemInstruction<'a> {
    pub parts: [WireText<'a>; 1],
}

#[derive(Serialize)]
pub(crate) struct WireText<'a> {
    pub text: &'a str,
}

#[derive(Serialize)]
pub(crate) struct WireGenerationConfig {
    pub temperature: f64,
}

impl<'a> WireRequest<'a> {
    pub fn from_request(request: &'a GenerateRequest) -> Self {
        Self {
            contents: &request.contents,
            system_instruction: WireSystemInstruction {
                parts: [WireText {
                    text: &request.config.system_instruction,
                }],
            },
            generation_config: WireGenerationConfig {
                temperature: request.config.temperature,
            },
            tools: &request.config.tools,
        }
    }
}
