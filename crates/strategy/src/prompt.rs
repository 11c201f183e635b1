//! Prompt construction for the trade proposal request.

use std::fmt::Write;

use llm_trade_core::Candidate;

const CLOSING_INSTRUCTION: &str = "Suggest one stock to buy with entry price, target price (~2-3% above entry), and stop-loss (~1-2% below entry).";

/// Builds the single prompt listing every candidate's indicators and sentiment
/// under the configured objective.
pub fn build_prompt(objective: &str, candidates: &[Candidate]) -> String {
    let mut prompt = format!("You are my trading assistant. {objective}\n");
    prompt.push_str("Here is the current data for today's trading candidates:\n");
    for c in candidates {
        // Writing into a String cannot fail.
        let _ = writeln!(
            prompt,
            "- {}: Close ₹{}, Support ₹{}, Resistance ₹{}, RSI {}, Sentiment {}",
            c.symbol, c.close, c.support, c.resistance, c.rsi, c.sentiment
        );
    }
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt
}
