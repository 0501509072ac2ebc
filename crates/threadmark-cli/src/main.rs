use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use threadmark_common::{
    DirectoryEntityKind, HostConfig, HostFileLinks, LoginUser, StaticDirectory,
};
use threadmark_renderer::mention::{escape, unescape};
use threadmark_renderer::{EditorSession, RenderOptions, create_mention_token};

#[derive(Parser)]
#[command(version, about = "Threadmark - Markdown comments with mentions for the host comment box", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve mentions and render a Markdown comment to HTML on stdout
    Render {
        /// Markdown file, stdin when omitted or `-`
        file: Option<PathBuf>,

        /// JSON array of directory entities used to resolve mentions
        #[arg(long, env = "THREADMARK_DIRECTORY")]
        directory: Option<PathBuf>,

        /// Keep single newlines instead of turning them into `<br>`
        #[arg(long)]
        no_breaks: bool,

        /// Code of the signed-in user
        #[arg(long, env = "THREADMARK_USER", default_value = "")]
        user: String,

        /// The signed-in user's locale, used for file download links
        #[arg(long, env = "THREADMARK_USER_LOCALE")]
        locale: Option<String>,
    },
    /// Print the mention token for a directory code
    Token {
        /// user, org or group
        kind: String,
        code: String,
    },
    /// Escape a directory code for use in a mention token
    Escape { code: String },
    /// Decode an escaped mention code
    Unescape { escaped: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            file,
            directory,
            no_breaks,
            user,
            locale,
        } => {
            let login = LoginUser::new(user, locale.unwrap_or_default());
            render_comment(file, directory, no_breaks, &login).await?
        }
        Commands::Token { kind, code } => {
            println!(
                "{}",
                create_mention_token(DirectoryEntityKind::from_tag(&kind), &code)
            );
        }
        Commands::Escape { code } => println!("{}", escape(&code)),
        Commands::Unescape { escaped } => println!("{}", unescape(&escaped)),
    }

    Ok(())
}

async fn render_comment(
    file: Option<PathBuf>,
    directory: Option<PathBuf>,
    no_breaks: bool,
    login: &LoginUser,
) -> Result<()> {
    let config = HostConfig::from_env()?;
    tracing::debug!("host api prefix {}", config.api_prefix());

    let directory = match directory {
        Some(path) => StaticDirectory::load(&path)?,
        None => {
            tracing::info!("no directory given, mentions will stay as written");
            StaticDirectory::new()
        }
    };

    let markdown = match file {
        Some(path) if path.as_os_str() != "-" => {
            std::fs::read_to_string(&path).into_diagnostic()?
        }
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).into_diagnostic()?;
            text
        }
    };

    let options = RenderOptions {
        breaks: !no_breaks,
        ..Default::default()
    };
    let links = HostFileLinks::for_login(&config, login);
    let session = EditorSession::with_files(directory, links, options);
    let html = session
        .render(&markdown)
        .await
        .ok_or_else(|| miette::miette!("render was superseded"))?;
    println!("{html}");

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .context_lines(3)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
