//! Handlers for user-defined commands.
//!
//! Custom commands carry no code; their behavior is derived from the
//! definition's action kind and payload.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::types::{
    boxed_handler_future, ActionKind, CommandDefinition, CommandHandler, HandlerContext,
};
use crate::error::{CoreError, CoreResult};

/// Payload of a composite command: steps run in order.
#[derive(Debug, Clone, Deserialize)]
pub struct CompositePayload {
    pub steps: Vec<CompositeStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeStep {
    Say(String),
    Effect(Value),
    Launch(String),
    Stop(String),
}

/// Builds the handler the registry stores for a custom definition.
pub fn custom_handler(definition: &CommandDefinition) -> CommandHandler {
    let definition = Arc::new(definition.clone());
    Arc::new(move |ctx: HandlerContext| {
        let definition = definition.clone();
        boxed_handler_future(async move { run_custom(&definition, ctx).await })
    })
}

async fn run_custom(definition: &CommandDefinition, ctx: HandlerContext) -> CoreResult<String> {
    let rendered = definition.render_response(&ctx.input);
    match definition.action {
        ActionKind::Speak => Ok(rendered),
        ActionKind::Effector => {
            let payload = definition.custom_payload.as_ref().ok_or_else(|| {
                CoreError::InvalidInput(format!("command {} has no effect payload", definition.name))
            })?;
            let outcome = ctx.effector.invoke(ActionKind::Effector, payload).await?;
            if rendered.is_empty() {
                Ok(outcome)
            } else {
                Ok(rendered)
            }
        }
        ActionKind::Composite => {
            let payload = definition.custom_payload.clone().ok_or_else(|| {
                CoreError::InvalidInput(format!("command {} has no steps", definition.name))
            })?;
            let payload: CompositePayload = serde_json::from_value(payload).map_err(|error| {
                CoreError::InvalidInput(format!(
                    "command {} has invalid steps: {error}",
                    definition.name
                ))
            })?;
            let mut lines = Vec::new();
            if !rendered.is_empty() {
                lines.push(rendered);
            }
            for step in payload.steps {
                let line = run_step(definition, step, &ctx).await?;
                if !line.is_empty() {
                    lines.push(line);
                }
            }
            Ok(lines.join("\n"))
        }
    }
}

async fn run_step(
    definition: &CommandDefinition,
    step: CompositeStep,
    ctx: &HandlerContext,
) -> CoreResult<String> {
    match step {
        CompositeStep::Say(text) => Ok(definition.render(&text, &ctx.input)),
        CompositeStep::Effect(payload) => ctx.effector.invoke(ActionKind::Composite, &payload).await,
        CompositeStep::Launch(component) => {
            let outcome = ctx.supervisor.launch(&component)?;
            Ok(outcome.describe(&component))
        }
        CompositeStep::Stop(component) => {
            let outcome = ctx.supervisor.stop(&component, ctx.grace_period).await?;
            Ok(outcome.describe(&component))
        }
    }
}
