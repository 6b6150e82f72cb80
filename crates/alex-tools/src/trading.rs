//! Confirmed-trade state machine (§4.5), grounded on
//! `sa_tools::manager::ProcessManager`'s `RwLock<HashMap<id, Arc<...>>>`
//! registry-with-sweep shape, generalized to the two-phase dry-run/confirm
//! discipline of `tastytrade_tools.py`.

use crate::brokerage::BrokerageClient;
use alex_domain::entities::TradeAudit;
use alex_domain::{Error, Result};
use alex_store::PostgresStore;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const TRADE_EXPIRATION: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct PendingTrade {
    pub trade_id: String,
    pub account_number: String,
    pub symbol: String,
    pub action: String,
    pub quantity: i64,
    pub order_type: String,
    pub limit_price: Option<f64>,
    pub instrument_type: String,
    pub option_symbol: Option<String>,
    pub description: String,
    pub order_payload: Value,
    pub created_at: Instant,
}

impl PendingTrade {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > TRADE_EXPIRATION
    }
}

/// Per-process registry of trades validated by dry-run but not yet
/// submitted. Swept on every entry point (§4.5 invariant list).
pub struct TradeLedger {
    pending: RwLock<HashMap<String, PendingTrade>>,
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeLedger {
    pub fn new() -> Self {
        Self { pending: RwLock::new(HashMap::new()) }
    }

    fn sweep_expired(&self) {
        self.pending.write().retain(|_, trade| !trade.is_expired());
    }

    fn insert(&self, trade: PendingTrade) {
        self.pending.write().insert(trade.trade_id.clone(), trade);
    }

    /// Removes and returns the entry iff present and unexpired — the
    /// exactly-once discipline requires this happen before any submit call.
    fn take_if_live(&self, trade_id: &str) -> Option<PendingTrade> {
        let mut map = self.pending.write();
        match map.get(trade_id) {
            Some(trade) if trade.is_expired() => {
                map.remove(trade_id);
                None
            }
            Some(_) => map.remove(trade_id),
            None => None,
        }
    }

    pub fn cancel(&self, trade_id: &str) -> Option<PendingTrade> {
        self.sweep_expired();
        self.pending.write().remove(trade_id)
    }
}

fn validate_order_inputs(action: &str, order_type: &str, limit_price: Option<f64>, quantity: i64, instrument_type: &str, option_symbol: Option<&str>) -> Result<()> {
    if !matches!(action, "buy" | "sell") {
        return Err(Error::TradeValidationFailed("action must be 'buy' or 'sell'".into()));
    }
    if !matches!(order_type, "market" | "limit") {
        return Err(Error::TradeValidationFailed("order_type must be 'market' or 'limit'".into()));
    }
    if order_type == "limit" && limit_price.is_none() {
        return Err(Error::TradeValidationFailed("limit price required for limit orders".into()));
    }
    if quantity <= 0 {
        return Err(Error::TradeValidationFailed("quantity must be positive".into()));
    }
    if !matches!(instrument_type, "equity" | "option") {
        return Err(Error::TradeValidationFailed("instrument_type must be 'equity' or 'option'".into()));
    }
    if instrument_type == "option" && option_symbol.is_none() {
        return Err(Error::TradeValidationFailed("option_symbol required for option orders".into()));
    }
    Ok(())
}

fn build_order_payload(action: &str, order_type: &str, limit_price: Option<f64>, quantity: i64, instrument_type: &str, symbol: &str, option_symbol: Option<&str>) -> Value {
    let order_action = if action == "buy" { "Buy to Open" } else { "Sell to Close" };
    let leg_symbol = if instrument_type == "option" { option_symbol.unwrap_or(symbol) } else { symbol };

    let mut payload = serde_json::json!({
        "time-in-force": "Day",
        "order-type": if order_type == "market" { "Market" } else { "Limit" },
        "legs": [{
            "action": order_action,
            "symbol": leg_symbol,
            "quantity": quantity,
            "instrument-type": if instrument_type == "equity" { "Equity" } else { "Equity Option" },
        }],
    });

    if order_type == "limit" {
        if let Some(price) = limit_price {
            payload["price"] = serde_json::json!(price);
            payload["price-effect"] = serde_json::json!(if action == "buy" { "Debit" } else { "Credit" });
        }
    }
    payload
}

#[allow(clippy::too_many_arguments)]
pub async fn place_order_dry_run(
    ledger: &TradeLedger,
    brokerage: &BrokerageClient,
    symbol: &str,
    action: &str,
    quantity: i64,
    order_type: &str,
    limit_price: Option<f64>,
    instrument_type: &str,
    option_symbol: Option<&str>,
) -> Result<Value> {
    ledger.sweep_expired();

    let action = action.to_lowercase();
    let order_type = order_type.to_lowercase();
    let instrument_type = instrument_type.to_lowercase();
    validate_order_inputs(&action, &order_type, limit_price, quantity, &instrument_type, option_symbol)?;

    let account_number = brokerage.get_primary_account().await?;
    let order_payload = build_order_payload(&action, &order_type, limit_price, quantity, &instrument_type, symbol, option_symbol);

    let (ok, validation) = brokerage.submit_order_dry_run(&account_number, &order_payload).await?;
    if !ok {
        let message = validation["error"]["message"].as_str().unwrap_or("order validation failed").to_string();
        return Err(Error::TradeValidationFailed(message));
    }

    let trade_id = uuid::Uuid::new_v4().simple().to_string().chars().take(8).collect::<String>();
    let price_str = limit_price.map(|p| format!(" @ ${p}")).unwrap_or_else(|| " @ market".to_string());
    let leg = if instrument_type == "option" { option_symbol.unwrap_or(symbol) } else { symbol };
    let description = format!("{} {} {}{}", action.to_uppercase(), quantity, leg, price_str);

    ledger.insert(PendingTrade {
        trade_id: trade_id.clone(),
        account_number,
        symbol: symbol.to_string(),
        action,
        quantity,
        order_type,
        limit_price,
        instrument_type,
        option_symbol: option_symbol.map(str::to_string),
        description: description.clone(),
        order_payload,
        created_at: Instant::now(),
    });

    Ok(serde_json::json!({
        "success": true,
        "trade_id": trade_id,
        "mode": if brokerage.is_sandbox() { "SANDBOX" } else { "LIVE" },
        "description": description,
        "requires_confirmation": true,
        "expires_in_seconds": TRADE_EXPIRATION.as_secs(),
        "validation_response": validation["data"],
    }))
}

pub async fn close_position_dry_run(ledger: &TradeLedger, brokerage: &BrokerageClient, symbol: &str, quantity: Option<i64>) -> Result<Value> {
    ledger.sweep_expired();

    let account_number = brokerage.get_primary_account().await?;
    let positions = brokerage.get_positions(&account_number).await?;
    let items = positions["data"]["items"].as_array().cloned().unwrap_or_default();

    let position = items
        .iter()
        .find(|p| p["symbol"].as_str() == Some(symbol) || p["underlying-symbol"].as_str() == Some(symbol))
        .ok_or_else(|| Error::TradeValidationFailed(format!("no position found for {symbol}")))?;

    let open_quantity = position["quantity"].as_f64().unwrap_or(0.0);
    let abs_open = open_quantity.abs() as i64;
    let close_quantity = quantity.unwrap_or(abs_open);
    if close_quantity > abs_open {
        return Err(Error::TradeValidationFailed(format!("cannot close {close_quantity} shares, position only has {abs_open}")));
    }

    let action = if open_quantity > 0.0 { "sell" } else { "buy" };
    let instrument_type = if position["instrument-type"].as_str().unwrap_or("equity").to_lowercase().contains("option") { "option" } else { "equity" };
    let option_symbol = (instrument_type == "option").then(|| position["symbol"].as_str().unwrap_or(symbol).to_string());
    let leg_symbol = if instrument_type == "equity" { symbol.to_string() } else { position["underlying-symbol"].as_str().unwrap_or(symbol).to_string() };

    place_order_dry_run(ledger, brokerage, &leg_symbol, action, close_quantity, "market", None, instrument_type, option_symbol.as_deref()).await
}

/// Executes a previously validated trade. Removes the pending entry before
/// submitting; on submit failure the entry is not restored (§4.5 exactly-
/// once invariant).
pub async fn confirm_trade(ledger: &TradeLedger, brokerage: &BrokerageClient, store: &PostgresStore, user_id: &str, trade_id: &str) -> Result<Value> {
    ledger.sweep_expired();

    let pending = ledger
        .take_if_live(trade_id)
        .ok_or_else(|| Error::TradeExpired(format!("trade {trade_id} not found or has expired; please create a new order")))?;

    let (ok, response) = brokerage.submit_order(&pending.account_number, &pending.order_payload).await?;
    if !ok {
        let message = response["error"]["message"].as_str().unwrap_or("order execution failed").to_string();
        return Err(Error::TradeValidationFailed(message));
    }

    let order_id = response["data"]["order"]["id"].as_str().map(str::to_string);
    let status = response["data"]["order"]["status"].as_str().map(str::to_string);

    let audit = TradeAudit {
        trade_id: pending.trade_id.clone(),
        user_id: user_id.to_string(),
        timestamp: Utc::now(),
        symbol: pending.symbol.clone(),
        action: pending.action.clone(),
        quantity: pending.quantity,
        price: pending.limit_price,
        instrument_type: pending.instrument_type.clone(),
        option_symbol: pending.option_symbol.clone(),
        account: pending.account_number.clone(),
        mode: if brokerage.is_sandbox() { "SANDBOX".to_string() } else { "LIVE".to_string() },
        order_id: order_id.clone(),
        status: status.clone(),
    };
    if let Err(e) = store.store_trade_audit(&audit).await {
        tracing::error!(error = %e, trade_id = %pending.trade_id, "failed to persist trade audit row");
    }

    Ok(serde_json::json!({
        "success": true,
        "trade_id": pending.trade_id,
        "executed": true,
        "order_id": order_id,
        "status": status,
        "description": pending.description,
    }))
}

pub fn cancel_pending_trade(ledger: &TradeLedger, trade_id: &str) -> Value {
    match ledger.cancel(trade_id) {
        Some(trade) => serde_json::json!({ "success": true, "trade_id": trade_id, "cancelled": true, "message": format!("trade {trade_id} cancelled: {}", trade.description) }),
        None => serde_json::json!({ "success": false, "error": format!("trade {trade_id} not found or already expired/executed") }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade(id: &str, created_at: Instant) -> PendingTrade {
        PendingTrade {
            trade_id: id.to_string(),
            account_number: "acc-1".into(),
            symbol: "AAPL".into(),
            action: "buy".into(),
            quantity: 10,
            order_type: "market".into(),
            limit_price: None,
            instrument_type: "equity".into(),
            option_symbol: None,
            description: "BUY 10 AAPL @ market".into(),
            order_payload: serde_json::json!({}),
            created_at,
        }
    }

    #[test]
    fn validate_order_inputs_rejects_bad_action() {
        let err = validate_order_inputs("hold", "market", None, 1, "equity", None).unwrap_err();
        assert!(matches!(err, Error::TradeValidationFailed(_)));
    }

    #[test]
    fn validate_order_inputs_requires_limit_price_for_limit_orders() {
        let err = validate_order_inputs("buy", "limit", None, 1, "equity", None).unwrap_err();
        assert!(matches!(err, Error::TradeValidationFailed(_)));
    }

    #[test]
    fn validate_order_inputs_requires_option_symbol_for_options() {
        let err = validate_order_inputs("buy", "market", None, 1, "option", None).unwrap_err();
        assert!(matches!(err, Error::TradeValidationFailed(_)));
    }

    #[test]
    fn take_if_live_removes_entry_exactly_once() {
        let ledger = TradeLedger::new();
        ledger.insert(sample_trade("abc123", Instant::now()));
        assert!(ledger.take_if_live("abc123").is_some());
        assert!(ledger.take_if_live("abc123").is_none());
    }

    #[test]
    fn take_if_live_rejects_expired_entries() {
        let ledger = TradeLedger::new();
        let stale = Instant::now() - Duration::from_secs(301);
        ledger.insert(sample_trade("stale01", stale));
        assert!(ledger.take_if_live("stale01").is_none());
    }

    #[test]
    fn cancel_removes_pending_entry() {
        let ledger = TradeLedger::new();
        ledger.insert(sample_trade("xyz789", Instant::now()));
        let cancelled = cancel_pending_trade(&ledger, "xyz789");
        assert_eq!(cancelled["success"], true);
        assert!(ledger.take_if_live("xyz789").is_none());
    }

    #[test]
    fn cancel_unknown_trade_reports_failure() {
        let ledger = TradeLedger::new();
        let result = cancel_pending_trade(&ledger, "nope0000");
        assert_eq!(result["success"], false);
    }
}
