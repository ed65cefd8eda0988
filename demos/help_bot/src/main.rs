//! Help Bot Example
//!
//! A console bot showing how router combinators compose into one tree.
//!
//! # Routing Tree
//!
//! ```text
//! first
//! ├── if_true(text == "help")      → help text
//! ├── if_true(state "ordering")    → dialog[order]
//! ├── if_true(text starts "order") → start the order dialog
//! └── best
//!     ├── question (score 0.8, only for "...?")
//!     ├── greeting (score 0.6)
//!     └── echo     (score 0.2)
//! ```
//!
//! Each reply is printed with the diagnostic path of the route that produced
//! it, e.g. `first[3]/best[1]/greeting`. The "ordering" flag set by one line
//! is still there for the next, because the runtime keeps state per
//! conversation and every stdin line belongs to the same one.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package help-bot
//! cargo run --package help-bot -- --config demos/help_bot/waypoint.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use waypoint::core::ExtractResult;
use waypoint::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "help-bot", about = "Waypoint console demo")]
struct Args {
    /// Configuration file to load instead of searching the current directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. "development".
    #[arg(short, long)]
    profile: Option<String>,
}

const ORDERING: &str = "ordering";

// ============================================================================
// Handler Functions
// ============================================================================

async fn help_handler() -> &'static str {
    "Commands: help, order. Ask me a question or just say hi."
}

async fn start_order(ctx: Arc<TurnContext>) -> ExtractResult<&'static str> {
    ctx.set_state(ORDERING, true)?;
    Ok("What would you like to order? (say 'cancel' to stop)")
}

async fn take_order(ctx: Arc<TurnContext>, Text(item): Text) -> String {
    ctx.remove_state(ORDERING);
    if item.trim() == "cancel" {
        "Order cancelled.".to_string()
    } else {
        format!("Ordered one {}.", item.trim())
    }
}

async fn greeting_handler() -> &'static str {
    "Hello there!"
}

async fn echo_handler(Text(text): Text) -> String {
    format!("You said: {text}")
}

/// Scores questions above the greeting, and declines everything else.
fn question_router() -> impl Router {
    from_fn(|ctx: Arc<TurnContext>| async move {
        if !ctx.text().is_some_and(|text| text.trim_end().ends_with('?')) {
            return Ok(None);
        }

        let route = Route::new(move || {
            let ctx = Arc::clone(&ctx);
            async move {
                ctx.reply("Good question. Try 'help'.");
                Ok(())
            }
        });
        Ok::<_, RouteError>(Some(route.with_score(0.8)))
    })
}

fn root_tree(dialogs: &DialogRegistry) -> BoxedRouter {
    first(vec![
        if_true(|ctx| ctx.text() == Some("help"), simple(help_handler).named("help")).boxed(),
        if_true(|ctx| ctx.has_state(ORDERING), dialogs.dialog("order")).boxed(),
        if_true(
            |ctx| ctx.text().is_some_and(|text| text.starts_with("order")),
            simple(start_order).named("order"),
        )
        .boxed(),
        best(vec![
            question_router().named("question").boxed(),
            scored(greeting_handler, 0.6).named("greeting").boxed(),
            scored(echo_handler, 0.2).named("echo").boxed(),
        ])
        .boxed(),
    ])
    .boxed()
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = WaypointRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile.clone());
    }
    let runtime = builder.build()?;

    runtime
        .dialogs()
        .register("order", simple(take_order).named("take"))?;
    runtime.set_router_boxed(root_tree(runtime.dialogs()));

    // One activity per stdin line.
    let lines = BufReader::new(tokio::io::stdin()).lines();
    let activities = stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let activity = Activity::message(line)
                    .with_channel("console")
                    .with_conversation("console");
                Some((activity, lines))
            }
            _ => None,
        }
    });

    let stats = runtime
        .run(activities, |outcome| {
            let path = outcome
                .path
                .as_ref()
                .map(|path| path.join(","))
                .unwrap_or_else(|| "-".to_string());
            for reply in &outcome.replies {
                println!("[{path}] {reply}");
            }
            if !outcome.matched {
                println!("(no route matched)");
            }
        })
        .await;

    info!(turns = stats.turns, failed = stats.failed, "Goodbye");
    Ok(())
}
