//! Room Echo Demo
//!
//! Walks a room through its lifecycle against the in-memory puppet:
//!
//! ```text
//! find_room(topic) ──▶ ready() ──▶ member_list / alias
//!                          │
//!                          └──▶ say / say_to ──▶ echoed Message
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package room-echo -- --topic ops --text "deploy finished"
//! cargo run --package room-echo -- --broken-member   # shows a cascade failure
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parlor::parlor_core::{ContactPayload, RoomMemberQueryFilter, RoomPayload, RoomQueryFilter};
use parlor::parlor_puppet_mock::MockPuppet;
use parlor::{ParlorError, ParlorRuntime, Sayable};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "room-echo", about = "Hydrate a room and talk to it")]
struct Args {
    /// Topic of the room to look up.
    #[arg(long, default_value = "ops")]
    topic: String,

    /// Text to send to the room.
    #[arg(long, default_value = "hello")]
    text: String,

    /// Configuration file (TOML).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Add a member whose contact payload is missing.
    #[arg(long)]
    broken_member: bool,

    /// Keep running until Ctrl+C after the walkthrough.
    #[arg(long)]
    wait: bool,
}

// ============================================================================
// Fixtures
// ============================================================================

fn seeded_puppet(topic: &str, broken_member: bool) -> Arc<MockPuppet> {
    let puppet = MockPuppet::new().with_name("demo");

    for (id, name) in [("C1", "alice"), ("C2", "bob"), ("C3", "carol")] {
        puppet.insert_contact(ContactPayload {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        });
    }

    let mut member_ids = vec!["C1".to_string(), "C2".to_string(), "C3".to_string()];
    if broken_member {
        member_ids.push("C404".to_string());
    }

    puppet.insert_room(RoomPayload {
        id: "R1".into(),
        topic: topic.to_string(),
        owner_id: Some("C1".into()),
        member_ids,
        ..Default::default()
    });
    puppet.set_member_alias("R1", "C2", "the-builder");

    Arc::new(puppet)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let puppet = seeded_puppet(&args.topic, args.broken_member);

    let mut builder = ParlorRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    let runtime = builder.build(puppet.clone())?;
    runtime.start().await?;

    let client = runtime.client();
    let room = client
        .find_rooms(&RoomQueryFilter::topic(args.topic.as_str()))
        .await?
        .into_iter()
        .next()
        .context("no room with that topic")?;

    match room.ready(false).await {
        Ok(()) => info!(room = %room, "Room hydrated"),
        Err(ParlorError::Cascade { failures, .. }) => {
            for (member_id, cause) in &failures {
                warn!(member_id = %member_id, error = %cause, "Member failed to hydrate");
            }
        }
        Err(e) => return Err(e.into()),
    }

    for member in room.member_list().await? {
        let alias = room.alias(&member).await?;
        info!(
            member = %member,
            alias = alias.as_deref().unwrap_or("-"),
            "Room member"
        );
    }

    if let Some(message) = room.say(args.text.as_str()).await? {
        info!(message = %message, "Sent");
    }

    let builder_member = room
        .member(&RoomMemberQueryFilter::room_alias("the-builder"))
        .await?;
    if let Some(member) = builder_member
        && let Some(message) = room.say_to("your turn", &[member]).await?
    {
        info!(message = %message, "Sent with mention");
    }

    let link = Sayable::UrlLink(parlor::parlor_core::UrlLinkPayload::new(
        "Runbook",
        "https://example.com/runbook",
    ));
    if let Err(e) = room.say_to(link, &[client.contact("C1")]).await {
        error!(error = %e, "Mentions only work with text");
    }

    if args.wait {
        info!("Walkthrough done. Press Ctrl+C to stop.");
        wait_for_ctrl_c().await;
    }
    runtime.stop().await?;

    info!(calls = puppet.calls().len(), "Puppet calls made");
    Ok(())
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
    }
}
