use crate::config::ConfigKey;
use clap::Parser;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Delete GitLab branches whose issue was closed and announce it in Rocket.Chat
#[derive(Parser, Debug, Default, PartialEq)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// GitLab URL
    #[arg(long = "glurl", value_name = "URL")]
    pub gitlab_url: Option<String>,

    /// GitLab private token
    #[arg(long = "gltoken", value_name = "TOKEN")]
    pub gitlab_token: Option<String>,

    /// GitLab project ID
    #[arg(long = "glproject", value_name = "ID")]
    pub gitlab_project: Option<u64>,

    /// Rocket.Chat URL
    #[arg(long = "rurl", value_name = "URL")]
    pub rocket_url: Option<String>,

    /// Rocket.Chat user
    #[arg(long = "ruser", value_name = "USER")]
    pub rocket_user: Option<String>,

    /// Rocket.Chat password
    #[arg(long = "rpass", value_name = "PASSWORD")]
    pub rocket_password: Option<String>,

    /// Rocket.Chat channel to post to
    #[arg(long = "rch", value_name = "CHANNEL")]
    pub rocket_channel: Option<String>,

    /// JSON config file (defaults to .branchsweep/config.json when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Issues processed at once within a page; 1 keeps strict page order
    #[arg(long, value_name = "N")]
    pub workers: Option<u64>,

    /// Per-request timeout in seconds; unset waits indefinitely
    #[arg(long = "timeout-secs", value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// List and search only, never delete or notify
    #[arg(long)]
    pub dry_run: bool,
}

/// Connection flags that also work with a single dash, e.g. `-glurl x`.
const SINGLE_DASH_FLAGS: [&str; 7] = [
    "glurl",
    "gltoken",
    "glproject",
    "rurl",
    "ruser",
    "rpass",
    "rch",
];

/// Parse command line arguments
///
/// # Arguments
/// * `args` - Command line arguments (including program name)
pub fn parse_args(args: &[String]) -> Result<Args, clap::Error> {
    let mut after_terminator = false;
    let args = args.iter().enumerate().map(|(index, arg)| {
        if index == 0 || after_terminator {
            return arg.clone();
        }
        if arg == "--" {
            after_terminator = true;
            return arg.clone();
        }
        double_dash(arg)
    });
    Args::try_parse_from(args)
}

fn double_dash(arg: &str) -> String {
    let Some(flag) = arg.strip_prefix('-').filter(|rest| !rest.starts_with('-')) else {
        return arg.to_string();
    };
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    if SINGLE_DASH_FLAGS.contains(&name) {
        format!("-{arg}")
    } else {
        arg.to_string()
    }
}

impl Args {
    /// The values given on the command line, keyed like the config file.
    pub fn to_config(&self) -> HashMap<ConfigKey, Value> {
        let mut config = HashMap::new();
        let strings = [
            (ConfigKey::GitlabUrl, &self.gitlab_url),
            (ConfigKey::GitlabToken, &self.gitlab_token),
            (ConfigKey::RocketUrl, &self.rocket_url),
            (ConfigKey::RocketUser, &self.rocket_user),
            (ConfigKey::RocketPassword, &self.rocket_password),
            (ConfigKey::RocketChannel, &self.rocket_channel),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                config.insert(key, Value::from(value.as_str()));
            }
        }

        let numbers = [
            (ConfigKey::GitlabProject, self.gitlab_project),
            (ConfigKey::Workers, self.workers),
            (ConfigKey::TimeoutSecs, self.timeout_secs),
        ];
        for (key, value) in numbers {
            if let Some(value) = value {
                config.insert(key, Value::from(value));
            }
        }

        if self.dry_run {
            config.insert(ConfigKey::DryRun, Value::Bool(true));
        }
        config
    }
}
