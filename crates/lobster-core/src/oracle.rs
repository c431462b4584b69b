//! The Lobster Oracle: a chat widget with one optional tool round trip per turn.
//!
//! A send is split in two so a UI can do the synchronous part (guard, append
//! the user turn, raise the busy flag) before handing the awaited part to a
//! task:
//!
//! 1. [`Oracle::submit`] validates the input and returns the message to send.
//! 2. [`run_turn`] talks to the model (and the price tool, if asked).
//! 3. [`Oracle::settle`] appends exactly one assistant turn and clears busy.
//!
//! [`Oracle::send`] chains the three for callers that can simply await.

use anyhow::{Result, anyhow};
use tracing::{debug, error, info};

use crate::ai::{Content, ContentGenerator, GenerateConfig, GenerateRequest, GenerateResponse};
use crate::persona::{
    EMPTY_REPLY_FALLBACK, INTERFERENCE_FALLBACK, LOBSTER_SYSTEM_INSTRUCTION, ORACLE_GREETING,
    ORACLE_TEMPERATURE,
};
use crate::prices::PriceSource;
use crate::state::ChatTurn;
use crate::tools::{crypto_price_tool, execute_tool_call, ToolInvocationResult};

pub struct Oracle {
    turns: Vec<ChatTurn>,
    pub input: String,
    busy: bool,
}

impl Default for Oracle {
    fn default() -> Self {
        Self::new()
    }
}

impl Oracle {
    /// A fresh conversation holding only the greeting.
    pub fn new() -> Self {
        Self {
            turns: vec![ChatTurn::assistant(ORACLE_GREETING)],
            input: String::new(),
            busy: false,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Accept the current input if it is sendable.
    ///
    /// Returns `None` (and changes nothing) for blank input or while a turn is
    /// in flight. Otherwise appends the user turn, clears the input, sets busy
    /// and returns the trimmed message.
    pub fn submit(&mut self) -> Option<String> {
        let message = self.input.trim();
        if message.is_empty() || self.busy {
            return None;
        }

        let message = message.to_string();
        self.turns.push(ChatTurn::user(message.clone()));
        self.input.clear();
        self.busy = true;
        Some(message)
    }

    /// Finish the in-flight turn with the model's text or the failure.
    pub fn settle(&mut self, outcome: Result<String>) {
        let reply = match outcome {
            Ok(text) if text.is_empty() => EMPTY_REPLY_FALLBACK.to_string(),
            Ok(text) => text,
            Err(err) => {
                error!(error = %err, "oracle turn failed");
                INTERFERENCE_FALLBACK.to_string()
            }
        };
        self.turns.push(ChatTurn::assistant(reply));
        self.busy = false;
    }

    /// Submit the current input and await the whole turn.
    ///
    /// Returns false when the submission was rejected.
    pub async fn send(
        &mut self,
        generator: &dyn ContentGenerator,
        prices: &dyn PriceSource,
        model: &str,
    ) -> bool {
        let Some(message) = self.submit() else {
            return false;
        };
        let outcome = run_turn(generator, prices, model, &message).await;
        self.settle(outcome);
        true
    }
}

/// What the first response asks for.
#[derive(Debug)]
pub enum TurnFlow {
    /// No tool calls: the response is the answer.
    Direct(GenerateResponse),
    /// The model asked for tools; answer them and ask again.
    ToolRound {
        model_turn: Content,
        results: Vec<ToolInvocationResult>,
    },
}

impl TurnFlow {
    pub async fn from_response(
        response: GenerateResponse,
        prices: &dyn PriceSource,
    ) -> Result<Self> {
        if !response.has_function_calls() {
            return Ok(TurnFlow::Direct(response));
        }

        let candidate_content = response
            .candidate_content
            .as_ref()
            .ok_or_else(|| anyhow!("function calls without candidate content"))?;
        let model_turn = Content::model_echo(candidate_content);

        let mut results = Vec::with_capacity(response.function_calls.len());
        for call in &response.function_calls {
            if let Some(result) = execute_tool_call(call, prices).await? {
                results.push(result);
            }
        }

        Ok(TurnFlow::ToolRound { model_turn, results })
    }
}

fn oracle_config(with_tools: bool) -> GenerateConfig {
    GenerateConfig {
        system_instruction: LOBSTER_SYSTEM_INSTRUCTION.to_string(),
        temperature: ORACLE_TEMPERATURE,
        tools: if with_tools { vec![crypto_price_tool()] } else { Vec::new() },
    }
}

/// Run one Oracle turn for `message` and return the model's final text.
///
/// Only the new message is sent; earlier turns are not replayed.
pub async fn run_turn(
    generator: &dyn ContentGenerator,
    prices: &dyn PriceSource,
    model: &str,
    message: &str,
) -> Result<String> {
    let user_turn = Content::user_text(message);

    let first = generator
        .generate_content(GenerateRequest {
            model: model.to_string(),
            contents: vec![user_turn.clone()],
            config: oracle_config(true),
        })
        .await?;

    let response = match TurnFlow::from_response(first, prices).await? {
        TurnFlow::Direct(response) => response,
        TurnFlow::ToolRound { model_turn, results } => {
            info!(results = results.len(), "answering tool calls");
            let responses = results
                .into_iter()
                .map(ToolInvocationResult::into_function_response)
                .collect();

            generator
                .generate_content(GenerateRequest {
                    model: model.to_string(),
                    contents: vec![user_turn, model_turn, Content::function_responses(responses)],
                    config: oracle_config(false),
                })
                .await?
        }
    };

    debug!(text_len = response.text.len(), "oracle turn complete");
    Ok(response.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, Part, Role};
    use crate::prices::usd_from_simple_price;
    use crate::state::ChatRole;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses and records every request.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<GenerateResponse, AiError>>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<GenerateResponse, AiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<GenerateRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContentGenerator for ScriptedGenerator {
        async fn generate_content(
            &self,
            request: GenerateRequest,
        ) -> Result<GenerateResponse, AiError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(AiError::BadStatus {
                        status: 500,
                        body: "no script".into(),
                    })
                })
        }
    }

    struct CannedPrices(Option<Value>);

    #[async_trait]
    impl PriceSource for CannedPrices {
        async fn usd_price(&self, coin_id: &str) -> Result<Option<f64>> {
            match &self.0 {
                Some(body) => Ok(usd_from_simple_price(body, coin_id)),
                None => Err(anyhow!("dns failure")),
            }
        }
    }

    fn text_reply(text: &str) -> GenerateResponse {
        GenerateResponse::from_body(&json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        }))
    }

    fn price_call_reply(symbol: &str) -> GenerateResponse {
        GenerateResponse::from_body(&json!({
            "candidates": [{"content": {"role": "model", "parts": [{
                "functionCall": {"name": "get_crypto_price", "args": {"symbol": symbol}, "id": "fc-1"},
                "thoughtSignature": "opaque"
            }]}}]
        }))
    }

    fn oracle_with(input: &str) -> Oracle {
        let mut oracle = Oracle::new();
        oracle.input = input.to_string();
        oracle
    }

    #[test]
    fn test_starts_with_greeting() {
        let oracle = Oracle::new();
        assert_eq!(oracle.turns(), &[ChatTurn::assistant(ORACLE_GREETING)]);
        assert!(!oracle.is_busy());
    }

    #[test]
    fn test_whitespace_submit_is_noop() {
        let mut oracle = oracle_with("   \n\t ");
        assert_eq!(oracle.submit(), None);
        assert_eq!(oracle.turns().len(), 1);
        assert!(!oracle.is_busy());
        assert_eq!(oracle.input, "   \n\t ");
    }

    #[test]
    fn test_submit_appends_trimmed_user_turn() {
        let mut oracle = oracle_with("  hello  ");
        assert_eq!(oracle.submit().as_deref(), Some("hello"));
        assert_eq!(oracle.turns().last(), Some(&ChatTurn::user("hello")));
        assert!(oracle.input.is_empty());
        assert!(oracle.is_busy());
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_noop() {
        let generator = ScriptedGenerator::new(vec![]);
        let prices = CannedPrices(None);

        let mut oracle = oracle_with("first");
        oracle.submit().unwrap();
        let turns_before = oracle.turns().len();

        oracle.input = "second".to_string();
        assert!(!oracle.send(&generator, &prices, "m").await);

        assert_eq!(oracle.turns().len(), turns_before);
        assert!(generator.requests().is_empty());
        assert_eq!(oracle.input, "second");
    }

    #[tokio::test]
    async fn test_plain_reply_single_call() {
        let generator = ScriptedGenerator::new(vec![Ok(text_reply("*snaps* Hello, human."))]);
        let prices = CannedPrices(None);

        let mut oracle = oracle_with("hello");
        assert!(oracle.send(&generator, &prices, "gemini-3-flash-preview").await);

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-3-flash-preview");
        assert_eq!(requests[0].contents, vec![Content::user_text("hello")]);
        assert_eq!(requests[0].config.system_instruction, LOBSTER_SYSTEM_INSTRUCTION);
        assert_eq!(requests[0].config.temperature, 0.7);
        assert_eq!(requests[0].config.tools, vec![crypto_price_tool()]);

        let turns = oracle.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1], ChatTurn::user("hello"));
        assert_eq!(turns[2], ChatTurn::assistant("*snaps* Hello, human."));
        assert!(!oracle.is_busy());
    }

    #[tokio::test]
    async fn test_only_newest_message_is_sent() {
        let generator = ScriptedGenerator::new(vec![Ok(text_reply("one")), Ok(text_reply("two"))]);
        let prices = CannedPrices(None);

        let mut oracle = oracle_with("first question");
        oracle.send(&generator, &prices, "m").await;
        oracle.input = "second question".to_string();
        oracle.send(&generator, &prices, "m").await;

        let requests = generator.requests();
        assert_eq!(requests[1].contents, vec![Content::user_text("second question")]);
        assert_eq!(oracle.turns().len(), 5);
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let generator = ScriptedGenerator::new(vec![
            Ok(price_call_reply("Solana")),
            Ok(text_reply("SOL swims at $142.50. *clicks*")),
        ]);
        let prices = CannedPrices(Some(json!({"solana": {"usd": 142.5}})));

        let mut oracle = oracle_with("price of solana");
        oracle.send(&generator, &prices, "m").await;

        let requests = generator.requests();
        assert_eq!(requests.len(), 2);

        let second = &requests[1];
        assert!(second.config.tools.is_empty());
        assert_eq!(second.config.system_instruction, LOBSTER_SYSTEM_INSTRUCTION);
        assert_eq!(second.config.temperature, 0.7);
        assert_eq!(second.contents.len(), 3);
        assert_eq!(second.contents[0], Content::user_text("price of solana"));

        // The model turn goes back exactly as received.
        assert_eq!(second.contents[1].role, Role::Model);
        assert_eq!(
            serde_json::to_value(&second.contents[1].parts).unwrap(),
            json!([{
                "functionCall": {"name": "get_crypto_price", "args": {"symbol": "Solana"}, "id": "fc-1"},
                "thoughtSignature": "opaque"
            }])
        );

        assert_eq!(second.contents[2].role, Role::User);
        match &second.contents[2].parts[..] {
            [Part::FunctionResponse { function_response }] => {
                assert_eq!(function_response.name, "get_crypto_price");
                assert_eq!(function_response.id.as_deref(), Some("fc-1"));
                assert_eq!(function_response.response, json!({"price": 142.5, "symbol": "solana"}));
            }
            other => panic!("unexpected parts: {other:?}"),
        }

        let last = oracle.turns().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "SOL swims at $142.50. *clicks*");
        assert!(!oracle.is_busy());
    }

    #[tokio::test]
    async fn test_tool_lookup_failure_still_answers() {
        let generator = ScriptedGenerator::new(vec![
            Ok(price_call_reply("bitcoin")),
            Ok(text_reply("The currents are murky.")),
        ]);
        let prices = CannedPrices(None);

        let mut oracle = oracle_with("btc?");
        oracle.send(&generator, &prices, "m").await;

        let requests = generator.requests();
        match &requests[1].contents[2].parts[..] {
            [Part::FunctionResponse { function_response }] => {
                assert_eq!(function_response.response, json!({"error": "Failed to fetch price"}));
            }
            other => panic!("unexpected parts: {other:?}"),
        }
        assert_eq!(oracle.turns().last().unwrap().content, "The currents are murky.");
    }

    #[tokio::test]
    async fn test_every_call_answered_in_one_message() {
        let model_parts = json!([
            {"functionCall": {"name": "get_crypto_price", "args": {"symbol": "Solana"}, "id": "a"}},
            {"functionCall": {"name": "get_weather", "args": {"city": "Reef"}, "id": "x"}},
            {"functionCall": {"name": "get_crypto_price", "args": {"symbol": "BITCOIN"}, "id": "b"}}
        ]);
        let first = GenerateResponse::from_body(&json!({
            "candidates": [{"content": {"role": "model", "parts": model_parts}}]
        }));
        let generator = ScriptedGenerator::new(vec![Ok(first), Ok(text_reply("ok"))]);
        let prices = CannedPrices(Some(json!({"solana": {"usd": 142.5}})));

        let mut oracle = oracle_with("sol and btc?");
        oracle.send(&generator, &prices, "m").await;

        let requests = generator.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert_eq!(second.contents.len(), 3);

        // All three calls are echoed, including the undeclared one.
        assert_eq!(serde_json::to_value(&second.contents[1].parts).unwrap(), model_parts);

        assert_eq!(second.contents[2].role, Role::User);
        match &second.contents[2].parts[..] {
            [
                Part::FunctionResponse { function_response: sol },
                Part::FunctionResponse { function_response: btc },
            ] => {
                assert_eq!(sol.id.as_deref(), Some("a"));
                assert_eq!(sol.response, json!({"price": 142.5, "symbol": "solana"}));
                assert_eq!(btc.id.as_deref(), Some("b"));
                assert_eq!(btc.response, json!({"price": "Price not found", "symbol": "bitcoin"}));
            }
            other => panic!("unexpected parts: {other:?}"),
        }

        assert_eq!(oracle.turns().last(), Some(&ChatTurn::assistant("ok")));
    }

    #[tokio::test]
    async fn test_api_failure_appends_interference_fallback() {
        let generator = ScriptedGenerator::new(vec![Err(AiError::BadStatus {
            status: 401,
            body: "API key not valid".into(),
        })]);
        let prices = CannedPrices(None);

        let mut oracle = oracle_with("hello");
        oracle.send(&generator, &prices, "m").await;

        let turns = oracle.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1], ChatTurn::user("hello"));
        assert_eq!(turns[2], ChatTurn::assistant(INTERFERENCE_FALLBACK));
        assert!(!oracle.is_busy());
    }

    #[tokio::test]
    async fn test_second_call_failure_appends_interference_fallback() {
        let generator = ScriptedGenerator::new(vec![Ok(price_call_reply("solana"))]);
        let prices = CannedPrices(Some(json!({"solana": {"usd": 1.0}})));

        let mut oracle = oracle_with("price of solana");
        oracle.send(&generator, &prices, "m").await;

        assert_eq!(generator.requests().len(), 2);
        assert_eq!(oracle.turns().len(), 3);
        assert_eq!(oracle.turns()[2], ChatTurn::assistant(INTERFERENCE_FALLBACK));
    }

    #[tokio::test]
    async fn test_empty_reply_uses_shell_fallback() {
        let generator = ScriptedGenerator::new(vec![Ok(GenerateResponse::default())]);
        let prices = CannedPrices(None);

        let mut oracle = oracle_with("hello");
        oracle.send(&generator, &prices, "m").await;

        assert_eq!(oracle.turns()[2], ChatTurn::assistant(EMPTY_REPLY_FALLBACK));
    }

    #[test]
    fn test_settle_clears_busy() {
        let mut oracle = oracle_with("hi");
        oracle.submit().unwrap();
        oracle.settle(Err(anyhow!("boom")));

        assert!(!oracle.is_busy());
        assert_eq!(oracle.turns().last(), Some(&ChatTurn::assistant(INTERFERENCE_FALLBACK)));
    }
}
