use clap::{Parser, Subcommand};
use mypage::actions::{AdminActions, CreateUserForm};
use mypage::config::{Config, DEFAULT_BASE_URL, DEFAULT_LIMIT};
use mypage::models::{DateRange, Direction, Span, TagId};
use mypage::settings::Settings;
use mypage::ui::ConsoleView;
use mypage::{Dashboard, PageContext, PageEvent};
use std::io::{self, Stdout};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "mypage", about = "Terminal client for the mypage dashboard API")]
struct Cli {
    #[arg(long, env = "MYPAGE_API_BASE", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "MYPAGE_API_TOKEN", hide_env_values = true)]
    token: String,

    #[arg(long, env = "MYPAGE_PAGE_LIMIT", default_value_t = DEFAULT_LIMIT)]
    limit: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Draw page 0 of every span for a tag.
    Chart { tag: TagId },
    /// Interactive data page driven by commands on stdin.
    Browse {
        #[arg(long)]
        tag: Option<TagId>,
    },
    AddTag { name: String },
    CreateUser {
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        verify_password: String,
        #[arg(long)]
        admin: bool,
    },
    EditUser {
        id: String,
        #[arg(long)]
        admin: bool,
    },
    DeleteUser { id: String },
    RegenerateToken,
    ChangePassword {
        #[arg(long)]
        password: String,
        #[arg(long)]
        verify_password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::new(cli.base_url, cli.token, cli.limit)?;
    info!(base_url = %config.base_url, "mypage client ready");
    let ctx = PageContext::new(config);
    let view = ConsoleView::new(io::stdout());

    let outcome = match cli.command {
        Command::Chart { tag } => Dashboard::new(ctx, view).switch_tag(tag).await,
        Command::Browse { tag } => {
            browse(Dashboard::new(ctx, view), tag).await;
            Ok(())
        }
        Command::AddTag { name } => Dashboard::new(ctx, view).add_tag(&name).await,
        Command::CreateUser {
            name,
            password,
            verify_password,
            admin,
        } => {
            let form = CreateUserForm {
                name,
                password,
                verify_password,
                is_admin: admin,
            };
            AdminActions::new(ctx, view).create_user(form).await
        }
        Command::EditUser { id, admin } => AdminActions::new(ctx, view).edit_user(&id, admin).await,
        Command::DeleteUser { id } => AdminActions::new(ctx, view).delete_user(&id).await,
        Command::RegenerateToken => Settings::new(ctx, view).regenerate_token().await,
        Command::ChangePassword {
            password,
            verify_password,
        } => {
            Settings::new(ctx, view)
                .change_password(&password, &verify_password)
                .await
        }
    };

    if let Err(err) = outcome {
        warn!("command failed: {err}");
        std::process::exit(1);
    }

    Ok(())
}

async fn browse(mut dashboard: Dashboard<ConsoleView<Stdout>>, tag: Option<TagId>) {
    let (events_tx, events_rx) = mpsc::channel(16);

    tokio::spawn(async move {
        if let Some(tag) = tag {
            let _ = events_tx.send(PageEvent::SelectTag(tag)).await;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line,
                _ = tokio::signal::ctrl_c() => break,
            };
            let Ok(Some(line)) = line else { break };
            match parse_event(&line) {
                Ok(Some(event)) => {
                    if events_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(message) => eprintln!("{message}"),
            }
        }
    });

    dashboard.run(events_rx).await;
}

/// `Ok(None)` means quit.
fn parse_event(line: &str) -> Result<Option<PageEvent>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let event = match words.as_slice() {
        [] => return Err("empty command".to_string()),
        ["quit"] | ["exit"] => return Ok(None),
        ["tag", id] => PageEvent::SelectTag(id.parse().map_err(|_| format!("bad tag id {id:?}"))?),
        ["add-tag", name] => PageEvent::AddTag(name.to_string()),
        ["hover", direction, span] => PageEvent::Hover(span.parse()?, direction.parse()?),
        [direction @ ("prev" | "next"), span] => PageEvent::Click(span.parse()?, direction.parse::<Direction>()?),
        ["range", start, end] => PageEvent::SetRange(DateRange {
            start_at: start.to_string(),
            end_at: end.to_string(),
        }),
        ["point", span, index] => PageEvent::HoverPoint(
            span.parse::<Span>()?,
            index.parse().map_err(|_| format!("bad point index {index:?}"))?,
        ),
        _ => return Err(format!("unknown command {line:?}")),
    };
    Ok(Some(event))
}
