//! JSON-Schema tool definitions handed to the model adapter, mirroring
//! `tastytrade_tools.py::TRADE_TOOL_DEFINITIONS` for the trade tools and
//! extending the same shape to the filesystem tools (§4.7).

use alex_domain::tool::ToolDefinition;
use serde_json::json;

pub fn all() -> Vec<ToolDefinition> {
    let mut defs = filesystem();
    defs.extend(trade());
    defs
}

pub fn filesystem() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "read_file".into(),
            description: "Read the contents of a file within the project sandbox.".into(),
            parameters: json!({
                "type": "object",
                "properties": { "path": { "type": "string", "description": "Path relative to the project root" } },
                "required": ["path"],
            }),
        },
        ToolDefinition {
            name: "write_file".into(),
            description: "Write (create or overwrite) a file within the project sandbox.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "content": { "type": "string" },
                    "create_dirs": { "type": "boolean", "description": "Create parent directories if missing (default true)" },
                    "require_confirmation": { "type": "boolean", "description": "Set false to write a protected path (default true)" },
                },
                "required": ["path", "content"],
            }),
        },
        ToolDefinition {
            name: "list_directory".into(),
            description: "List entries in a directory within the project sandbox.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Directory to list (default '.')" },
                    "recursive": { "type": "boolean" },
                },
                "required": [],
            }),
        },
        ToolDefinition {
            name: "search_code".into(),
            description: "Search for a regex pattern across files in the project sandbox.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "pattern": { "type": "string" },
                    "path": { "type": "string" },
                    "file_pattern": { "type": "string", "description": "Glob suffix, e.g. '*.py' (default)" },
                    "max_results": { "type": "integer" },
                },
                "required": ["pattern"],
            }),
        },
        ToolDefinition {
            name: "git_status".into(),
            description: "Show the working tree status of the project repository.".into(),
            parameters: json!({ "type": "object", "properties": {}, "required": [] }),
        },
        ToolDefinition {
            name: "git_commit".into(),
            description: "Stage and commit changes in the project repository.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" },
                    "files": { "type": "array", "items": { "type": "string" }, "description": "Specific files to stage (default: all)" },
                },
                "required": ["message"],
            }),
        },
    ]
}

pub fn trade() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_positions".into(),
            description: "Get all current stock and option positions with P&L information from the brokerage account.".into(),
            parameters: json!({ "type": "object", "properties": {}, "required": [] }),
        },
        ToolDefinition {
            name: "get_account_balances".into(),
            description: "Get account balances including cash, buying power, and net liquidating value.".into(),
            parameters: json!({ "type": "object", "properties": {}, "required": [] }),
        },
        ToolDefinition {
            name: "place_order_dry_run".into(),
            description: "Validate a stock or option order WITHOUT executing it. Returns a trade_id that must be confirmed to execute.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Stock ticker symbol (e.g. 'AAPL')" },
                    "action": { "type": "string", "enum": ["buy", "sell"] },
                    "quantity": { "type": "integer" },
                    "order_type": { "type": "string", "enum": ["market", "limit"] },
                    "limit_price": { "type": "number" },
                    "instrument_type": { "type": "string", "enum": ["equity", "option"] },
                    "option_symbol": { "type": "string", "description": "Full OCC option symbol for option trades" },
                },
                "required": ["symbol", "action", "quantity"],
            }),
        },
        ToolDefinition {
            name: "close_position_dry_run".into(),
            description: "Validate closing an existing position WITHOUT executing it. Returns a trade_id that must be confirmed to execute.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string" },
                    "quantity": { "type": "integer", "description": "Shares to close (omit to close the entire position)" },
                },
                "required": ["symbol"],
            }),
        },
        ToolDefinition {
            name: "confirm_trade".into(),
            description: "Execute a previously validated trade. Requires the trade_id from a dry-run order.".into(),
            parameters: json!({
                "type": "object",
                "properties": { "trade_id": { "type": "string" } },
                "required": ["trade_id"],
            }),
        },
        ToolDefinition {
            name: "cancel_pending_trade".into(),
            description: "Cancel a pending trade without executing it.".into(),
            parameters: json!({
                "type": "object",
                "properties": { "trade_id": { "type": "string" } },
                "required": ["trade_id"],
            }),
        },
    ]
}
