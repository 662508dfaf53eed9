//! Diagnostics and component lifecycle commands.

use std::sync::Arc;

use super::definition;
use crate::command::{
    boxed_handler_future, ActionKind, CommandDefinition, CommandHandler, CommandRegistry,
    HandlerContext,
};
use crate::error::CoreResult;
use crate::supervisor::{ComponentSpec, ProcessSupervisor};

const SUIT_REPORT: [&str; 6] = [
    "Running suit diagnostics.",
    "Power Core: 96%",
    "Servo Motors: All functioning",
    "HUD: Operational",
    "Shield Tracker: Connected",
    "Legs: Calibrated",
];

const LAUNCH_VERBS: [&str; 5] = ["launch", "launch the", "start up", "start up the", "open the"];
const STOP_VERBS: [&str; 3] = ["stop", "stop the", "close the"];

/// Trigger phrases pairing each verb with every component id and alias.
///
/// The `all` form comes first; input that names no component falls
/// through to custom commands.
fn lifecycle_triggers(verbs: &[&str], components: &[ComponentSpec]) -> Vec<String> {
    let mut triggers = vec![format!("{} all", verbs[0])];
    for component in components {
        let names = std::iter::once(&component.id).chain(component.aliases.iter());
        for name in names {
            for verb in verbs {
                let trigger = format!("{verb} {}", name.to_lowercase());
                if !triggers.contains(&trigger) {
                    triggers.push(trigger);
                }
            }
        }
    }
    triggers
}

pub fn register(registry: &mut CommandRegistry, components: &[ComponentSpec]) -> CoreResult<()> {
    registry.register_builtin(
        definition(
            "diagnostics",
            &["diagnostics"],
            ActionKind::Composite,
            "Running suit diagnostics.",
        ),
        handler(|ctx| Ok(diagnostics(&ctx.supervisor))),
    )?;
    registry.register_builtin(
        definition(
            "component_status",
            &["component status", "system status"],
            ActionKind::Speak,
            "",
        ),
        handler(|ctx| Ok(component_status(&ctx.supervisor, &ctx.input))),
    )?;
    registry.register_builtin(
        CommandDefinition::new(
            "launch_component",
            lifecycle_triggers(&LAUNCH_VERBS, components),
            ActionKind::Composite,
            "",
        ),
        handler(|ctx| launch(&ctx.supervisor, &ctx.input)),
    )?;
    registry.register_builtin(
        CommandDefinition::new(
            "stop_component",
            lifecycle_triggers(&STOP_VERBS, components),
            ActionKind::Composite,
            "",
        ),
        Arc::new(|ctx: HandlerContext| boxed_handler_future(async move { stop(&ctx).await })),
    )?;
    Ok(())
}

fn handler<F>(run: F) -> CommandHandler
where
    F: Fn(&HandlerContext) -> CoreResult<String> + Send + Sync + 'static,
{
    let run = Arc::new(run);
    Arc::new(move |ctx: HandlerContext| {
        let run = run.clone();
        boxed_handler_future(async move { run(&ctx) })
    })
}

fn diagnostics(supervisor: &ProcessSupervisor) -> String {
    let mut lines: Vec<String> = SUIT_REPORT.iter().map(|line| line.to_string()).collect();
    lines.extend(
        supervisor
            .components()
            .iter()
            .map(|component| status_line(supervisor, component)),
    );
    lines.join("\n")
}

fn status_line(supervisor: &ProcessSupervisor, component: &ComponentSpec) -> String {
    let state = supervisor
        .latest_record(&component.id)
        .map(|record| record.summary())
        .unwrap_or_else(|| "not started".to_string());
    format!("{}: {state}", component.id)
}

fn component_status(supervisor: &ProcessSupervisor, input: &str) -> String {
    if let Some(component) = supervisor.resolve_component(input) {
        return status_line(supervisor, component);
    }
    if supervisor.components().is_empty() {
        return "No components are configured.".to_string();
    }
    supervisor
        .components()
        .iter()
        .map(|component| status_line(supervisor, component))
        .collect::<Vec<_>>()
        .join("\n")
}

fn names_everything(input: &str) -> bool {
    input.split_whitespace().any(|word| word == "all" || word == "everything")
}

fn unresolved(supervisor: &ProcessSupervisor) -> String {
    let known: Vec<&str> = supervisor
        .components()
        .iter()
        .map(|component| component.id.as_str())
        .collect();
    format!("Which component? I know: {}.", known.join(", "))
}

fn launch(supervisor: &ProcessSupervisor, input: &str) -> CoreResult<String> {
    if names_everything(input) {
        let lines: Vec<String> = supervisor
            .launch_all()
            .into_iter()
            .map(|(component_id, outcome)| match outcome {
                Ok(outcome) => outcome.describe(&component_id),
                Err(error) => format!("Could not launch {component_id}: {error}"),
            })
            .collect();
        return Ok(lines.join("\n"));
    }
    let Some(component) = supervisor.resolve_component(input) else {
        return Ok(unresolved(supervisor));
    };
    let outcome = supervisor.launch(&component.id)?;
    Ok(outcome.describe(&component.id))
}

async fn stop(ctx: &HandlerContext) -> CoreResult<String> {
    let supervisor = &ctx.supervisor;
    if names_everything(&ctx.input) {
        let running: Vec<String> = supervisor
            .components()
            .iter()
            .filter(|component| supervisor.is_running(&component.id))
            .map(|component| component.id.clone())
            .collect();
        if running.is_empty() {
            return Ok("Nothing is running.".to_string());
        }
        let forced = supervisor.stop_all(ctx.grace_period).await;
        let lines: Vec<String> = running
            .iter()
            .map(|component_id| {
                if forced.contains(component_id) {
                    format!("Force stopped {component_id}.")
                } else {
                    format!("Stopped {component_id}.")
                }
            })
            .collect();
        return Ok(lines.join("\n"));
    }
    let Some(component) = supervisor.resolve_component(&ctx.input) else {
        return Ok(unresolved(supervisor));
    };
    let component_id = component.id.clone();
    let outcome = supervisor.stop(&component_id, ctx.grace_period).await?;
    Ok(outcome.describe(&component_id))
}
