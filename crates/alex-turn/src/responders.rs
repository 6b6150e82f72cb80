//! The five cortex responders (§4.1/§4.2 Glossary "Cortex"). Each is a
//! `TurnState -> TurnStateDelta` node; fallback behaviour follows §4.1
//! "Fallback" literally (Pro degrades to Flash silently, Engineer falls
//! back to Pro with a `(fallback)` suffix on `model_used`).

use alex_domain::entities::ChangeType;
use alex_domain::tool::{Message, ToolCatalog};
use alex_domain::turn::{Cortex, TurnStateDelta};
use alex_domain::Config;
use alex_providers::{ChatRequest, ProviderRegistry};
use alex_store::PostgresStore;
use chrono::Utc;
use uuid::Uuid;

use crate::tool_loop;

fn system_prompt_for(memory: &alex_domain::entities::MemoryContext) -> String {
    let mut prompt = String::from("You are Alex, a helpful AI assistant with persistent memory.");
    if let Some(daily) = &memory.daily_summary {
        prompt.push_str(&format!("\n\nToday's context: {daily}"));
    }
    if let Some(weekly) = &memory.weekly_summary {
        prompt.push_str(&format!("\n\nThis week's context: {weekly}"));
    }
    prompt
}

async fn simple_chat(registry: &ProviderRegistry, role: &str, model: &str, messages: Vec<Message>) -> alex_domain::Result<(String, String)> {
    let provider = registry.for_role(role)?;
    let req = ChatRequest { messages, model: Some(model.to_string()), temperature: Some(0.7), ..Default::default() };
    let response = provider.chat(req).await?;
    Ok((response.content, response.model))
}

fn with_system(messages: &[Message], memory: &alex_domain::entities::MemoryContext) -> Vec<Message> {
    let mut out = vec![Message::system(system_prompt_for(memory))];
    out.extend(messages.iter().cloned());
    out
}

pub async fn respond_flash(registry: &ProviderRegistry, config: &Config, messages: &[Message], memory: &alex_domain::entities::MemoryContext) -> TurnStateDelta {
    match simple_chat(registry, "flash", &config.model.flash_model, with_system(messages, memory)).await {
        Ok((content, model)) => TurnStateDelta {
            append_message: Some(Message::assistant(&content)),
            assistant_response: Some(content),
            model_used: Some(model),
            cortex: Some(Cortex::Flash),
            ..Default::default()
        },
        Err(e) => TurnStateDelta { error: Some(format!("flash cortex failed: {e}")), ..Default::default() },
    }
}

/// Tries Pro first; any failure degrades silently to Flash (§4.1 Fallback).
pub async fn respond_pro(registry: &ProviderRegistry, config: &Config, messages: &[Message], memory: &alex_domain::entities::MemoryContext) -> TurnStateDelta {
    match simple_chat(registry, "pro", &config.model.pro_model, with_system(messages, memory)).await {
        Ok((content, model)) => TurnStateDelta {
            append_message: Some(Message::assistant(&content)),
            assistant_response: Some(content),
            model_used: Some(model),
            cortex: Some(Cortex::Pro),
            ..Default::default()
        },
        Err(e) => {
            tracing::warn!(error = %e, "pro cortex failed, degrading to flash");
            respond_flash(registry, config, messages, memory).await
        }
    }
}

/// Tries the engineering provider; falls back to Pro with a `(fallback)`
/// suffix on `model_used` if the engineering model can't be reached
/// (§4.1 Fallback, scenario 3 in §8).
pub async fn respond_engineer(registry: &ProviderRegistry, config: &Config, messages: &[Message], memory: &alex_domain::entities::MemoryContext) -> TurnStateDelta {
    match registry.for_role("engineer") {
        Ok(provider) => {
            let req = ChatRequest { messages: with_system(messages, memory), temperature: Some(0.3), ..Default::default() };
            match provider.chat(req).await {
                Ok(response) => TurnStateDelta {
                    append_message: Some(Message::assistant(&response.content)),
                    assistant_response: Some(response.content),
                    model_used: Some(response.model),
                    cortex: Some(Cortex::Engineer),
                    ..Default::default()
                },
                Err(e) => {
                    tracing::warn!(error = %e, "engineer cortex call failed, falling back to pro");
                    fallback_to_pro(registry, config, messages, memory).await
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "engineer cortex unavailable, falling back to pro");
            fallback_to_pro(registry, config, messages, memory).await
        }
    }
}

async fn fallback_to_pro(registry: &ProviderRegistry, config: &Config, messages: &[Message], memory: &alex_domain::entities::MemoryContext) -> TurnStateDelta {
    match simple_chat(registry, "pro", &config.model.pro_model, with_system(messages, memory)).await {
        Ok((content, model)) => TurnStateDelta {
            append_message: Some(Message::assistant(&content)),
            assistant_response: Some(content),
            model_used: Some(format!("{model} (fallback)")),
            cortex: Some(Cortex::Engineer),
            ..Default::default()
        },
        Err(e) => TurnStateDelta { error: Some(format!("engineer fallback to pro also failed: {e}")), ..Default::default() },
    }
}

/// Runs the bounded tool loop against the engineering provider, then
/// records a `CodeChange` row for any files successfully written
/// (§4.6 side-effect tracking, scenario 4 in §8).
pub async fn respond_self_modify(
    registry: &ProviderRegistry,
    store: &PostgresStore,
    catalog: &dyn ToolCatalog,
    messages: &[Message],
    memory: &alex_domain::entities::MemoryContext,
    user_id: &str,
    user_message: &str,
) -> TurnStateDelta {
    let provider = match registry.for_role("engineer") {
        Ok(p) => p,
        Err(e) => return TurnStateDelta { error: Some(format!("self-modify cortex unavailable: {e}")), ..Default::default() },
    };

    let seed = with_system(messages, memory);
    let outcome = match tool_loop::run(provider.as_ref(), catalog, None, seed).await {
        Ok(o) => o,
        Err(e) => return TurnStateDelta { error: Some(format!("self-modify tool loop failed: {e}")), ..Default::default() },
    };

    let files_modified: Vec<String> = outcome
        .invocations
        .iter()
        .filter(|inv| inv.tool_name == "write_file" && inv.result.success)
        .filter_map(|inv| inv.arguments.get("path").and_then(|v| v.as_str()).map(str::to_string))
        .collect();

    if !files_modified.is_empty() {
        let description = format!("Self-modification: {} file(s) updated", files_modified.len());
        if let Err(e) = store
            .store_code_change(
                Uuid::new_v4(),
                user_id,
                Utc::now().date_naive(),
                &files_modified,
                &description,
                user_message,
                ChangeType::Feature,
                None,
                None,
            )
            .await
        {
            tracing::error!(error = %e, "failed to persist code change record");
        }
    }

    TurnStateDelta {
        append_message: Some(Message::assistant(&outcome.final_text)),
        assistant_response: Some(outcome.final_text),
        model_used: Some("self_modify".to_string()),
        cortex: Some(Cortex::SelfModify),
        ..Default::default()
    }
}

/// Runs the bounded tool loop against the Pro provider for trade
/// negotiation/execution (dry-run, confirm, cancel are tool calls owned by
/// `alex-tools`'s trade catalog).
pub async fn respond_trade(registry: &ProviderRegistry, config: &Config, catalog: &dyn ToolCatalog, messages: &[Message], memory: &alex_domain::entities::MemoryContext) -> TurnStateDelta {
    let provider = match registry.for_role("pro") {
        Ok(p) => p,
        Err(e) => return TurnStateDelta { error: Some(format!("trade cortex unavailable: {e}")), ..Default::default() },
    };

    let seed = with_system(messages, memory);
    match tool_loop::run(provider.as_ref(), catalog, Some(config.model.pro_model.clone()), seed).await {
        Ok(outcome) => TurnStateDelta {
            append_message: Some(Message::assistant(&outcome.final_text)),
            assistant_response: Some(outcome.final_text),
            model_used: Some(config.model.pro_model.clone()),
            cortex: Some(Cortex::Trade),
            ..Default::default()
        },
        Err(e) => TurnStateDelta { error: Some(format!("trade cortex tool loop failed: {e}")), ..Default::default() },
    }
}
