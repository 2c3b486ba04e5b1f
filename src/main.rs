// This is the command-line entry point.
//
// Usage: comment_moderation [POLICY_FILE] < submission.json
//
// This file's job is to:
// 1. Load configuration (.env, environment, optional policy file)
// 2. Initialize services (dependency injection)
// 3. Read one comment submission from stdin and print the decision as JSON

use anyhow::Context;
use comment_moderation::core::moderation::{
    Comment, ModerationDecision, ModerationService, PolicyConfig, PolicyRegistry, RequestContext,
    SpamChecker, SpamSettings,
};
use comment_moderation::infra::moderation::{AkismetClient, ConfiguredSite, ContentRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

/// What the submission endpoint hands over for one comment.
#[derive(Debug, Deserialize)]
struct Submission {
    comment: Comment,
    target: ContentRecord,
    #[serde(default)]
    context: RequestContext,
}

#[derive(Debug, Serialize)]
struct Report {
    #[serde(flatten)]
    decision: ModerationDecision,
    comments_open: bool,
    comments_moderated: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // The registry is filled here and never touched again once shared.

    let mut registry = PolicyRegistry::new(PolicyConfig::from_env());
    if let Some(path) = std::env::args().nth(1) {
        registry
            .load_json_file(&path)
            .with_context(|| format!("Failed to load policy file {}", path))?;
    }

    let spam = SpamChecker::new(
        AkismetClient::new()?,
        Box::new(ConfiguredSite::from_env()),
        SpamSettings::from_env(),
    );
    let service = ModerationService::new(Arc::new(registry), spam);

    // ========================================================================
    // EVALUATION
    // ========================================================================

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read submission from stdin")?;
    let mut submission: Submission =
        serde_json::from_str(&input).context("Submission is not valid JSON")?;

    let decision = service
        .evaluate(
            &mut submission.comment,
            &submission.target,
            &submission.context,
        )
        .await?;

    tracing::info!(
        content_type = %submission.target.content_type,
        allowed = decision.allowed,
        moderated = decision.moderated,
        removed = decision.removed,
        "Comment evaluated"
    );

    let report = Report {
        decision,
        comments_open: service.comments_are_open(&submission.target),
        comments_moderated: service.comments_are_moderated(&submission.target),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
