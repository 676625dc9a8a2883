//! gitbridge CLI - command-line front-end for the gitbridge client.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use gitbridge::Platform;
use gitbridge::platform::NewIssue;
use tracing_subscriber::EnvFilter;

use crate::commands::output::OutputFormat;
use crate::commands::read::{ListOptions, PageOptions, SortKey};

#[derive(Parser)]
#[command(name = "gitbridge")]
#[command(version)]
#[command(about = "Query and update GitHub and GitLab through one resilient client")]
#[command(
    long_about = "gitbridge talks to GitHub and GitLab through the same commands. Requests \
are retried with exponential backoff, throttled by a local sliding-window rate limiter, \
and read responses are cached for the lifetime of the process."
)]
#[command(after_long_help = r#"EXAMPLES
    Show a repository:
        $ gitbridge repo rust-lang/rust

    Open merge requests of a nested GitLab project:
        $ gitbridge -p gitlab prs gitlab-org/ci-cd/runner --state open

    Search, most starred first, as JSON:
        $ gitbridge search "http client" --sort stars -o json

    Close an issue:
        $ gitbridge close-issue my-org/app#42

    Check a webhook delivery:
        $ gitbridge verify-webhook payload.json --signature "sha256=..."

CONFIGURATION
    gitbridge reads configuration from:
      1. ~/.config/gitbridge/config.toml (or $XDG_CONFIG_HOME/gitbridge/config.toml)
      2. ./gitbridge.toml
      3. Environment variables (GITBRIDGE_* prefix, e.g., GITBRIDGE_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GITBRIDGE_GITHUB_TOKEN      GitHub personal access token
    GITBRIDGE_GITHUB_URL        GitHub API base URL (default: https://api.github.com)
    GITBRIDGE_GITLAB_TOKEN      GitLab personal access token
    GITBRIDGE_GITLAB_URL        GitLab API base URL (default: https://gitlab.com/api/v4)
    GITBRIDGE_WEBHOOK_SECRET    Shared secret for verify-webhook
    RUST_LOG                    Log filter (default: gitbridge=info,gitbridge_cli=info)
"#)]
struct Cli {
    /// Hosting platform to talk to
    #[arg(short, long, global = true, value_enum, default_value_t = PlatformArg::Github)]
    platform: PlatformArg,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlatformArg {
    Github,
    Gitlab,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Github => Platform::GitHub,
            PlatformArg::Gitlab => Platform::GitLab,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show one or more repositories
    Repo {
        /// Repository ids ([platform:]owner/name) - can specify multiple
        #[arg(required = true)]
        repos: Vec<String>,
    },
    /// Search repositories
    Search {
        /// Search terms
        query: String,

        /// Sort key (default: best match)
        #[arg(long, value_enum)]
        sort: Option<SortKey>,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,

        #[command(flatten)]
        paging: PageOptions,
    },
    /// List issues of a repository
    Issues {
        /// Repository id ([platform:]owner/name)
        repo: String,

        #[command(flatten)]
        options: ListOptions,
    },
    /// Show a single issue
    Issue {
        /// Issue reference (owner/name#number)
        reference: String,
    },
    /// List pull requests (merge requests on GitLab)
    Prs {
        /// Repository id ([platform:]owner/name)
        repo: String,

        #[command(flatten)]
        options: ListOptions,
    },
    /// Show a single pull request
    Pr {
        /// Pull request reference (owner/name#number)
        reference: String,
    },
    /// Show a user profile
    User {
        /// Login name
        login: String,
    },
    /// Show current rate limit status
    Limits,
    /// List commits of a repository
    Commits {
        /// Repository id ([platform:]owner/name)
        repo: String,

        /// Branch, tag or SHA to start from
        #[arg(short, long = "ref")]
        ref_name: Option<String>,

        /// Only commits touching this path
        #[arg(long)]
        path: Option<String>,

        #[command(flatten)]
        paging: PageOptions,
    },
    /// List releases of a repository
    Releases {
        /// Repository id ([platform:]owner/name)
        repo: String,

        #[command(flatten)]
        paging: PageOptions,
    },
    /// Open a new issue
    CreateIssue {
        /// Repository id ([platform:]owner/name)
        repo: String,

        /// Issue title
        #[arg(short, long)]
        title: String,

        /// Issue body
        #[arg(short, long)]
        body: Option<String>,

        /// Label to apply (repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,

        /// Login to assign (repeatable)
        #[arg(short, long = "assignee")]
        assignees: Vec<String>,
    },
    /// Close an issue
    CloseIssue {
        /// Issue reference (owner/name#number)
        reference: String,

        /// Reopen instead of close
        #[arg(long)]
        reopen: bool,
    },
    /// Verify a webhook payload signature (or print it when none is given)
    VerifyWebhook {
        /// Payload file, or - for stdin
        payload: PathBuf,

        /// Signature as delivered, e.g. the X-Hub-Signature-256 header
        #[arg(short, long)]
        signature: Option<String>,

        /// Shared webhook secret
        #[arg(long, env = "GITBRIDGE_WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so table/JSON output on stdout stays clean.
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("gitbridge=info,gitbridge_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = cli.output;

    // Needs no credentials.
    if let Commands::VerifyWebhook {
        payload,
        signature,
        secret,
    } = &cli.command
    {
        return commands::webhook::handle_verify_webhook(payload, signature.as_deref(), secret);
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();
    let platform = Platform::from(cli.platform);
    let client = gitbridge::client_for(platform, &config.client_config(platform)?)?;
    let client = client.as_ref();

    let result = match cli.command {
        Commands::Repo { repos } => commands::read::handle_repo(client, &repos, output).await,
        Commands::Search {
            query,
            sort,
            asc,
            paging,
        } => commands::read::handle_search(client, query, sort, asc, &paging, output).await,
        Commands::Issues { repo, options } => {
            commands::read::handle_issues(client, &repo, &options, output).await
        }
        Commands::Issue { reference } => {
            commands::read::handle_issue(client, &reference, output).await
        }
        Commands::Prs { repo, options } => {
            commands::read::handle_pull_requests(client, &repo, &options, output).await
        }
        Commands::Pr { reference } => {
            commands::read::handle_pull_request(client, &reference, output).await
        }
        Commands::User { login } => commands::read::handle_user(client, &login, output).await,
        Commands::Limits => commands::limits::handle_limits(client, output).await,
        Commands::Commits {
            repo,
            ref_name,
            path,
            paging,
        } => commands::read::handle_commits(client, &repo, ref_name, path, &paging, output).await,
        Commands::Releases { repo, paging } => {
            commands::read::handle_releases(client, &repo, &paging, output).await
        }
        Commands::CreateIssue {
            repo,
            title,
            body,
            labels,
            assignees,
        } => {
            let mut issue = NewIssue::new(title)
                .with_labels(labels)
                .with_assignees(assignees);
            if let Some(body) = body {
                issue = issue.with_body(body);
            }
            commands::write::handle_create_issue(client, &repo, issue, output).await
        }
        Commands::CloseIssue { reference, reopen } => {
            commands::write::handle_close_issue(client, &reference, reopen, output).await
        }
        Commands::VerifyWebhook { .. } => Ok(()),
    };

    client.shutdown();
    result
}
