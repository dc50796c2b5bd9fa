#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{anyhow, bail, Context};
use resetflow::{
    flow::LinkValidator, CompleteResetPassword, FlowServiceFactory, FlowView, Integration,
    LocationContext, PasswordForm, ResetFlowSettings, SubmitOutcome,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use url::Url;

const LOST_RECOVERY_KEY_FLAG: &str = "--lost-recovery-key";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Also loads .env and initializes the logger
    let settings =
        ResetFlowSettings::load().map_err(|e| anyhow!("Failed to load settings: {e}"))?;

    let mut args = std::env::args().skip(1);
    let link = args
        .next()
        .context("usage: resetflow <reset link url> [--lost-recovery-key]")?;
    let lost_recovery_key = args.any(|arg| arg == LOST_RECOVERY_KEY_FLAG);

    let link = Url::parse(&link).context("reset link is not a valid URL")?;
    let search = link.query().map(|q| format!("?{q}")).unwrap_or_default();

    let mut location = LocationContext::new(&search);
    if lost_recovery_key {
        location = location.with_lost_recovery_key();
    }

    let integration = Integration::from_query(&search);
    let services = FlowServiceFactory::create(&settings, &integration)?;
    let mut web_channel = services.web_channel;

    let mut flow = CompleteResetPassword::new(
        services.dependencies,
        LinkValidator::parse(&search),
        integration,
        location,
    )
    .on_link_status_change(|status| log::info!("Link status is now {status:?}"));

    match flow.load().await {
        FlowView::SubmissionForm { banner } => {
            if let Some(banner) = banner {
                eprintln!("{}", banner.text);
            }
        }
        FlowView::Navigated(action) => {
            println!("{}", serde_json::to_string_pretty(&action)?);
            return Ok(());
        }
        FlowView::LinkExpired => bail!("reset link has expired"),
        FlowView::LinkDamaged => bail!("reset link is damaged"),
        FlowView::Loading => bail!("reset link could not be validated"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let new_password = prompt(&mut lines, "New password: ").await?;
        let confirm_password = prompt(&mut lines, "Confirm password: ").await?;

        match flow
            .submit(&PasswordForm::new(&new_password, &confirm_password))
            .await
        {
            SubmitOutcome::Navigated(action) => {
                println!("{}", serde_json::to_string_pretty(&action)?);
                break;
            }
            SubmitOutcome::Rejected(e) => eprintln!("{e}"),
            SubmitOutcome::Banner(banner) => eprintln!("{}", banner.text),
            SubmitOutcome::LinkExpired => bail!("reset link has expired"),
            SubmitOutcome::NotReady => bail!("reset form is not available"),
        }
    }

    while let Ok(message) = web_channel.try_recv() {
        println!("{message}");
    }
    Ok(())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> anyhow::Result<String> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(label.as_bytes()).await?;
    stderr.flush().await?;

    lines
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("stdin closed before a password was entered"))
}
