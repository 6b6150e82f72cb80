//! Wires the filesystem and trading tool implementations up to the
//! `ToolCatalog` trait `alex-turn` drives the tool-call loop against.

use crate::brokerage::{BrokerageClient, BrokerageCredentials};
use crate::trading::TradeLedger;
use crate::{file_ops, trading};
use alex_domain::tool::{ToolCatalog, ToolDefinition, ToolResult};
use alex_domain::Config;
use alex_store::PostgresStore;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub struct AlexToolCatalog {
    project_root: PathBuf,
    user_id: String,
    store: Arc<PostgresStore>,
    brokerage: BrokerageClient,
    ledger: TradeLedger,
}

impl AlexToolCatalog {
    pub fn new(project_root: PathBuf, user_id: impl Into<String>, store: Arc<PostgresStore>, config: &Config) -> Self {
        let credentials = BrokerageCredentials {
            use_sandbox: config.trade.use_sandbox,
            username: config.trade.username.clone(),
            password: config.trade.password.clone(),
            sandbox_username: config.trade.sandbox_username.clone(),
            sandbox_password: config.trade.sandbox_password.clone(),
            remember_token: config.trade.remember_token.clone(),
        };
        Self { project_root, user_id: user_id.into(), store, brokerage: BrokerageClient::new(credentials), ledger: TradeLedger::new() }
    }

    async fn invoke_fs(&self, tool_name: &str, arguments: &Value) -> ToolResult {
        let result = match tool_name {
            "read_file" => {
                let Some(path) = arguments["path"].as_str() else { return ToolResult::err("missing 'path'") };
                file_ops::read_file(&self.project_root, path).await
            }
            "write_file" => {
                let Some(path) = arguments["path"].as_str() else { return ToolResult::err("missing 'path'") };
                let Some(content) = arguments["content"].as_str() else { return ToolResult::err("missing 'content'") };
                let create_dirs = arguments["create_dirs"].as_bool().unwrap_or(true);
                let require_confirmation = arguments["require_confirmation"].as_bool().unwrap_or(true);
                file_ops::write_file(&self.project_root, path, content, create_dirs, require_confirmation).await
            }
            "list_directory" => {
                let path = arguments["path"].as_str().unwrap_or(".");
                let recursive = arguments["recursive"].as_bool().unwrap_or(false);
                file_ops::list_directory(&self.project_root, path, recursive).await
            }
            "search_code" => {
                let Some(pattern) = arguments["pattern"].as_str() else { return ToolResult::err("missing 'pattern'") };
                let path = arguments["path"].as_str();
                let file_pattern = arguments["file_pattern"].as_str().unwrap_or("*.py");
                let max_results = arguments["max_results"].as_u64().unwrap_or(50) as usize;
                file_ops::search_code(&self.project_root, pattern, path, file_pattern, max_results).await
            }
            "git_status" => file_ops::git_status(&self.project_root).await,
            "git_commit" => {
                let Some(message) = arguments["message"].as_str() else { return ToolResult::err("missing 'message'") };
                let files: Option<Vec<String>> = arguments["files"].as_array().map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect());
                file_ops::git_commit(&self.project_root, message, files.as_deref()).await
            }
            other => return ToolResult::err(format!("unknown tool '{other}'")),
        };

        match result {
            Ok(data) => ToolResult::ok(data),
            Err(e) => ToolResult::err(e.to_string()),
        }
    }

    async fn invoke_trade(&self, tool_name: &str, arguments: &Value) -> ToolResult {
        let result = match tool_name {
            "get_positions" => match self.brokerage.get_primary_account().await {
                Ok(account) => self.brokerage.get_positions(&account).await,
                Err(e) => Err(e),
            },
            "get_account_balances" => match self.brokerage.get_primary_account().await {
                Ok(account) => self.brokerage.get_balances(&account).await,
                Err(e) => Err(e),
            },
            "place_order_dry_run" => {
                let Some(symbol) = arguments["symbol"].as_str() else { return ToolResult::err("missing 'symbol'") };
                let Some(action) = arguments["action"].as_str() else { return ToolResult::err("missing 'action'") };
                let Some(quantity) = arguments["quantity"].as_i64() else { return ToolResult::err("missing 'quantity'") };
                let order_type = arguments["order_type"].as_str().unwrap_or("market");
                let limit_price = arguments["limit_price"].as_f64();
                let instrument_type = arguments["instrument_type"].as_str().unwrap_or("equity");
                let option_symbol = arguments["option_symbol"].as_str();
                trading::place_order_dry_run(&self.ledger, &self.brokerage, symbol, action, quantity, order_type, limit_price, instrument_type, option_symbol).await
            }
            "close_position_dry_run" => {
                let Some(symbol) = arguments["symbol"].as_str() else { return ToolResult::err("missing 'symbol'") };
                let quantity = arguments["quantity"].as_i64();
                trading::close_position_dry_run(&self.ledger, &self.brokerage, symbol, quantity).await
            }
            "confirm_trade" => {
                let Some(trade_id) = arguments["trade_id"].as_str() else { return ToolResult::err("missing 'trade_id'") };
                trading::confirm_trade(&self.ledger, &self.brokerage, &self.store, &self.user_id, trade_id).await
            }
            "cancel_pending_trade" => {
                let Some(trade_id) = arguments["trade_id"].as_str() else { return ToolResult::err("missing 'trade_id'") };
                return ToolResult::ok(trading::cancel_pending_trade(&self.ledger, trade_id));
            }
            other => return ToolResult::err(format!("unknown tool '{other}'")),
        };

        match result {
            Ok(data) => ToolResult::ok(data),
            Err(e) => ToolResult::err(e.to_string()),
        }
    }
}

#[async_trait]
impl ToolCatalog for AlexToolCatalog {
    fn definitions(&self) -> Vec<ToolDefinition> {
        crate::definitions::all()
    }

    async fn invoke(&self, tool_name: &str, arguments: Value) -> ToolResult {
        match tool_name {
            "read_file" | "write_file" | "list_directory" | "search_code" | "git_status" | "git_commit" => self.invoke_fs(tool_name, &arguments).await,
            "get_positions" | "get_account_balances" | "place_order_dry_run" | "close_position_dry_run" | "confirm_trade" | "cancel_pending_trade" => {
                self.invoke_trade(tool_name, &arguments).await
            }
            other => ToolResult::err(format!("unknown tool '{other}'")),
        }
    }
}
