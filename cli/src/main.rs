use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use realtime::hubs::{ActivityHub, ChatHub, CommentsHub, IdeasHub, VotesHub};
use realtime::optimistic::IdeaSync;
use realtime::presence::PresenceEngine;
use realtime::registry::{HubRegistry, RegistryError};
use realtime::rest::{IdeaApi, RestClient, RestError};
use realtime::transport::WsConnector;
use wire::types::VoteKind;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing token; pass --token, set IDEABOARD_TOKEN, or run `login` first")]
    MissingToken,
    #[error(transparent)]
    Rest(#[from] RestError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "ideaboard-cli", about = "Ideaboard REST and realtime-hub CLI")]
struct Cli {
    #[arg(long, env = "IDEABOARD_BASE_URL", default_value = "http://127.0.0.1:5000")]
    base_url: String,

    #[arg(long, env = "IDEABOARD_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "IDEABOARD_USER_ID", default_value = "cli")]
    user_id: String,

    #[arg(long, env = "IDEABOARD_USER_NAME", default_value = "cli")]
    user_name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate and print the session token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Idea(IdeaCommand),
    /// Connect the ideas, votes, and activity hubs and print broadcasts.
    Watch,
    /// Join a chat room and print incoming messages.
    Chat {
        #[arg(long, default_value = "general")]
        room: String,
        /// Send one message after joining.
        #[arg(long)]
        message: Option<String>,
    },
}

#[derive(Args, Debug)]
struct IdeaCommand {
    #[command(subcommand)]
    command: IdeaSubcommand,
}

#[derive(Subcommand, Debug)]
enum IdeaSubcommand {
    List,
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Vote {
        idea_id: String,
        #[arg(long, default_value_t = false)]
        down: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Login { ref email, ref password } => run_login(&cli, email, password).await,
        Command::Idea(ref idea) => run_idea(&cli, idea).await,
        Command::Watch => run_watch(&cli).await,
        Command::Chat { ref room, ref message } => run_chat(&cli, room, message.as_deref()).await,
    }
}

fn rest_client(cli: &Cli) -> Result<RestClient, CliError> {
    let client = RestClient::new(&cli.base_url);
    match &cli.token {
        Some(token) => {
            client.set_token(token);
            Ok(client)
        }
        None => Err(CliError::MissingToken),
    }
}

fn hub_registry(client: &RestClient, cli: &Cli) -> HubRegistry {
    HubRegistry::new(&cli.base_url, Arc::new(WsConnector), client.token_provider())
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_login(cli: &Cli, email: &str, password: &str) -> Result<(), CliError> {
    let client = RestClient::new(&cli.base_url);
    let session = client.login(email, password).await?;
    println!("{}", session.token);
    eprintln!("logged in as {} ({})", session.user_name, session.user_id);
    Ok(())
}

async fn run_idea(cli: &Cli, idea: &IdeaCommand) -> Result<(), CliError> {
    let client = rest_client(cli)?;
    match &idea.command {
        IdeaSubcommand::List => {
            let ideas = client.list_ideas().await?;
            for idea in &ideas {
                println!(
                    "{}  [{}] +{}/-{} ({} comments)  {}",
                    idea.id, idea.status, idea.upvotes, idea.downvotes, idea.comment_count,
                    idea.title,
                );
            }
            Ok(())
        }
        IdeaSubcommand::Create { title, description } => {
            let draft = wire::types::IdeaDraft {
                title: title.clone(),
                description: description.clone(),
            };
            let created = client.create_idea(&draft).await?;
            print_json(&created)
        }
        IdeaSubcommand::Vote { idea_id, down } => {
            let kind = if *down { VoteKind::Down } else { VoteKind::Up };
            let state = client.submit_vote(idea_id, kind).await?;
            print_json(&state)
        }
    }
}

async fn run_watch(cli: &Cli) -> Result<(), CliError> {
    let client = Arc::new(rest_client(cli)?);
    let registry = hub_registry(&client, cli);

    let sync = IdeaSync::new(
        Arc::clone(&client) as Arc<dyn IdeaApi>,
        &cli.user_id,
        &cli.user_name,
    );
    sync.set_ideas(client.list_ideas().await?);
    {
        let snapshot = sync.clone();
        sync.on_change(move || {
            println!("--- {} ideas", snapshot.ideas().len());
            for idea in snapshot.ideas() {
                println!(
                    "{}  [{}] +{}/-{} ({} comments)  {}",
                    idea.id, idea.status, idea.upvotes, idea.downvotes, idea.comment_count,
                    idea.title,
                );
            }
        });
    }

    let ideas = IdeasHub::new(registry.clone());
    ideas.connect().await?;
    ideas.attach_sync(&sync);

    let votes = VotesHub::new(registry.clone());
    votes.connect().await?;
    votes.attach_sync(&sync);

    let comments = CommentsHub::new(registry.clone());
    comments.connect().await?;
    comments.attach_sync(&sync);

    let activity = ActivityHub::new(registry.clone());
    activity.connect().await?;
    let presence = PresenceEngine::new();
    activity.attach_presence(&presence);
    {
        let snapshot = presence.clone();
        presence.on_change(move || {
            println!("active users: {}", snapshot.active_users().len());
        });
    }

    println!("watching; ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    presence.shutdown();
    registry.disconnect_all().await;
    Ok(())
}

async fn run_chat(cli: &Cli, room: &str, message: Option<&str>) -> Result<(), CliError> {
    let client = rest_client(cli)?;
    let registry = hub_registry(&client, cli);

    let chat = ChatHub::new(registry.clone());
    chat.connect().await?;

    let on_message = realtime::dispatch::handler(|data| {
        let user = data["userName"].as_str().unwrap_or("?");
        let content = data["content"].as_str().unwrap_or_default();
        println!("<{user}> {content}");
    });
    chat.dispatcher().on(realtime::hubs::chat::events::MESSAGE_RECEIVED, &on_message);
    let on_lifecycle = realtime::dispatch::handler(|_| {
        eprintln!("connection state changed");
    });
    chat.dispatcher().on(realtime::hubs::chat::events::CONNECTING, &on_lifecycle);
    chat.dispatcher().on(realtime::hubs::chat::events::RECONNECTED, &on_lifecycle);
    chat.dispatcher().on(realtime::hubs::chat::events::DISCONNECTED, &on_lifecycle);

    chat.join_chat(&cli.user_id).await?;
    chat.join_room(room).await?;

    if let Some(message) = message {
        chat.send_message(room, message).await?;
    }

    println!("joined {room}; ctrl-c to leave");
    tokio::signal::ctrl_c().await?;

    if let Err(e) = chat.leave_room(room).await {
        tracing::warn!(error = %e, "leave failed during shutdown");
    }
    registry.disconnect_all().await;
    Ok(())
}
