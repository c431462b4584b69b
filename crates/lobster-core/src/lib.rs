pub mod ai;
pub mod clipboard;
pub mod config;
pub mod oracle;
pub mod persona;
pub mod prices;
pub mod state;
pub mod tools;
pub mod vibe;

// Re-export main types for convenience
pub use ai::{get_ai, AiError, ContentGenerator, GeminiClient, GenerateRequest, GenerateResponse};
pub use clipboard::{Clipboard, CopyAck, SystemClipboard};
pub use config::Config;
pub use oracle::{run_turn, Oracle, TurnFlow};
pub use prices::{CoinGeckoClient, PriceSource};
pub use state::{ChatRole, ChatTurn};
pub use tools::{PriceResult, ToolInvocationResult};
pub use vibe::{generate_document, strip_code_fence, VibeCoder, ViewMode};
