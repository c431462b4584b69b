//! The `get_crypto_price` tool: its declaration and local execution.

use anyhow::{Result, anyhow};
use serde::{Serialize, Serializer};
use serde_json::json;
use tracing::{debug, warn};

use crate::ai::{FunctionCall, FunctionDeclaration, FunctionResponse, Tool};
use crate::prices::PriceSource;

pub const CRYPTO_PRICE_TOOL_NAME: &str = "get_crypto_price";
pub const PRICE_NOT_FOUND: &str = "Price not found";
pub const PRICE_FETCH_FAILED: &str = "Failed to fetch price";

pub fn crypto_price_tool() -> Tool {
    Tool {
        function_declarations: vec![FunctionDeclaration {
            name: CRYPTO_PRICE_TOOL_NAME.to_string(),
            description: "Get the current price of a cryptocurrency in USD.".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "symbol": {
                        "type": "STRING",
                        "description": "The cryptocurrency symbol (e.g., 'solana', 'bitcoin', 'ethereum')."
                    }
                },
                "required": ["symbol"]
            }),
        }],
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    Usd(f64),
    NotFound,
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Price::Usd(value) => serializer.serialize_f64(*value),
            Price::NotFound => serializer.serialize_str(PRICE_NOT_FOUND),
        }
    }
}

/// Payload handed back to the model for one price lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PriceResult {
    Quote { price: Price, symbol: String },
    Failure { error: String },
}

impl PriceResult {
    pub fn from_lookup(symbol: &str, lookup: Result<Option<f64>>) -> Self {
        match lookup {
            Ok(price) => PriceResult::Quote {
                price: price.map(Price::Usd).unwrap_or(Price::NotFound),
                symbol: symbol.to_string(),
            },
            Err(err) => {
                warn!(symbol, error = %err, "price lookup failed");
                PriceResult::Failure {
                    error: PRICE_FETCH_FAILED.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationResult {
    pub name: String,
    pub id: Option<String>,
    pub result: PriceResult,
}

impl ToolInvocationResult {
    pub fn into_function_response(self) -> FunctionResponse {
        FunctionResponse {
            name: self.name,
            response: serde_json::to_value(&self.result).unwrap_or_default(),
            id: self.id,
        }
    }
}

/// Run one tool call requested by the model.
///
/// Returns `Ok(None)` for tools this application does not declare. A call
/// without a string `symbol` argument is an error for the whole turn.
pub async fn execute_tool_call(
    call: &FunctionCall,
    prices: &dyn PriceSource,
) -> Result<Option<ToolInvocationResult>> {
    if call.name != CRYPTO_PRICE_TOOL_NAME {
        warn!(tool = %call.name, "ignoring call to undeclared tool");
        return Ok(None);
    }

    let symbol = call
        .args
        .get("symbol")
        .and_then(|symbol| symbol.as_str())
        .ok_or_else(|| anyhow!("{} called without a symbol", CRYPTO_PRICE_TOOL_NAME))?
        .to_lowercase();

    debug!(%symbol, id = ?call.id, "looking up crypto price");
    let lookup = prices.usd_price(&symbol).await;

    Ok(Some(ToolInvocationResult {
        name: call.name.clone(),
        id: call.id.clone(),
        result: PriceResult::from_lookup(&symbol, lookup),
    }))
}
