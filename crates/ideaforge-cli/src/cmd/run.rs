use crate::output::print_json;
use anyhow::Context;
use ideaforge_cli::transport::OpenRouterTransport;
use ideaforge_core::{
    config::{Config, Mode},
    hosting::GithubHost,
    lock::RunLock,
    orchestrator::Orchestrator,
    vcs::GitCli,
};
use std::path::Path;
use std::time::Duration;

/// One scheduled run. Returns whether the run succeeded; the status line
/// (or the JSON report) is printed either way.
pub fn run(root: &Path, json: bool) -> anyhow::Result<bool> {
    let config = Config::from_env(root).context("failed to load configuration")?;
    let _lock = RunLock::acquire(root, config.settings.lock_stale_after_secs)
        .context("failed to acquire run lock")?;

    let mut vcs = GitCli::detect()?;
    let host = match &config.mode {
        Mode::SingleRepo => None,
        Mode::MultiRepo(account) => {
            vcs = vcs.redacting(account.token.clone());
            Some(GithubHost::new(
                config.settings.github_api.clone(),
                account.owner.clone(),
                account.token.clone(),
                Duration::from_secs(config.settings.request_timeout_secs),
            )?)
        }
    };
    let transport = OpenRouterTransport::new(&config).context("failed to build model client")?;

    tracing::info!(
        root = %root.display(),
        mode = config.mode.as_str(),
        model = %config.model,
        "starting run"
    );

    let mut orchestrator = Orchestrator::new(&config, &transport, &vcs, rand::thread_rng());
    if let Some(host) = &host {
        orchestrator = orchestrator.with_host(host);
    }
    let report = orchestrator.run();

    if json {
        print_json(&report)?;
    } else {
        println!("{}", report.status_line());
    }
    Ok(report.is_success())
}
