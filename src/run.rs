use crate::cli;
use crate::config;
use crate::gitlab::client::GitLabClient;
use crate::output;
use crate::rocket::client::RocketClient;
use crate::sweep::Sweeper;
use anyhow::Context;
use tracing::{info, warn};

const USER_AGENT: &str = "branchsweep-cli";

pub async fn run(
    args: Vec<String>,
    mut stdout_additional: Option<&mut dyn std::io::Write>,
) -> anyhow::Result<()> {
    let args = match cli::parser::parse_args(&args) {
        Ok(args) => args,
        Err(err)
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            output::println(err.to_string().trim_end(), &mut stdout_additional)?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let file_config = config::load_config_file(args.config.as_deref(), &current_dir)?;
    let merged = config::update_config(&file_config, &args.to_config());
    let settings = config::Settings::from_config(&merged)?;

    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    let http = builder.build().context("Failed to create HTTP client")?;

    let mut rocket = RocketClient::new(http.clone(), &settings.rocket_url, &settings.rocket_channel);
    if !settings.dry_run {
        if let Err(err) = rocket
            .login(&settings.rocket_user, &settings.rocket_password)
            .await
        {
            let err = format!("{err:#}");
            warn!(error = %err, "Rocket.Chat login failed, messages will not be sent");
        }
    }
    info!(
        project = settings.gitlab_project,
        workers = settings.workers,
        dry_run = settings.dry_run,
        chat_session = rocket.is_logged_in(),
        "starting sweep"
    );

    let gitlab = GitLabClient::new(
        http,
        &settings.gitlab_url,
        &settings.gitlab_token,
        settings.gitlab_project,
    );

    let summary = Sweeper::new(&gitlab, &rocket)
        .workers(settings.workers)
        .dry_run(settings.dry_run)
        .run()
        .await
        .context("GitLab request failed, sweep aborted")?;

    info!(
        pages = summary.pages,
        deleted = summary.deleted,
        "sweep finished"
    );
    output::println(&summary.to_string(), &mut stdout_additional)?;
    Ok(())
}
