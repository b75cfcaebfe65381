//! CoinMarketCap metadata tool

use super::HttpTool;
use serde_json::json;

const INFO_URL: &str = "https://pro-api.coinmarketcap.com/v2/cryptocurrency/info";

/// Build the cryptocurrency-metadata tool against the CoinMarketCap v2 API.
pub fn metadata_tool(api_key: &str) -> HttpTool {
    HttpTool::new(
        "coinmarketcap",
        "Get metadata about a cryptocurrency.",
        INFO_URL,
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "The symbol of the cryptocurrency. Example: BTC, ETH."
                }
            },
            "required": ["symbol"]
        }),
    )
    .with_header("Accepts", "application/json")
    .with_header("X-CMC_PRO_API_KEY", api_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;

    #[test]
    fn schema_requires_symbol() {
        let tool = metadata_tool("test-key");
        assert_eq!(tool.name(), "coinmarketcap");

        let schema = tool.input_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, vec!["symbol"]);
        assert_eq!(schema["properties"]["symbol"]["type"], "string");
    }
}
