// Parley CLI — terminal front end for the Parley chat backend.
//
// Subcommands cover auth and one-shot queries; the default `chat` command
// drops into a REPL where plain lines are streamed prompts and slash
// commands handle voice, files, stickers, and history.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::warn;

use parley::atoms::error::{ClientError, ClientResult};
use parley::atoms::types::{ChatMessage, MessageKind, ProfilePicture, Role, SignupRequest};
use parley::client::ApiClient;
use parley::convo::Conversation;
use parley::recorder::VoiceRecorder;
use parley::session::{DiskStorage, Session};

#[derive(Parser)]
#[command(name = "parley", version, about = "Chat with the Parley backend from your terminal")]
struct Cli {
    /// Backend base URL.
    #[arg(long, env = "PARLEY_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session token.
    Login {
        username: String,
    },
    /// Create an account (prompts for profile fields).
    Signup,
    /// Notify the backend and clear the local session.
    Logout,
    /// Show the signed-in profile.
    Whoami,
    /// Print the stored conversation history.
    History,
    /// Interactive chat (the default).
    Chat,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let storage = DiskStorage::new()?;
    let mut session = Session::hydrate(storage);
    let mut api = ApiClient::new(&cli.base_url);
    api.set_token(session.token().map(String::from));

    match cli.command.unwrap_or(Command::Chat) {
        Command::Login { username } => {
            let password = prompt_line("Password: ")?;
            let login = api.login(&username, password.trim()).await?;
            session.login(login.access_token.clone())?;
            api.set_token(Some(login.access_token));
            // Best-effort profile fetch so `whoami` works offline later.
            match api.fetch_user().await {
                Ok(profile) => session.set_user(profile)?,
                Err(e) => warn!("could not fetch profile after login: {}", e),
            }
            println!("Signed in as {}.", username);
        }
        Command::Signup => {
            let request = prompt_signup()?;
            let created = api.signup(&request).await?;
            session.login(created.token.clone())?;
            api.set_token(Some(created.token));
            println!("{} (user id {})", created.message, created.user_id);
        }
        Command::Logout => {
            session.logout(&api).await?;
            println!("Signed out.");
        }
        Command::Whoami => match session.user() {
            Some(user) => {
                println!("{} <{}>", user.username, user.email);
                println!("{}, age {}", user.profession, user.age);
                if let Some(description) = &user.description {
                    println!("{}", description);
                }
            }
            None if session.authenticated() => {
                let profile = api.fetch_user().await?;
                println!("{} <{}>", profile.username, profile.email);
                session.set_user(profile)?;
            }
            None => println!("Not signed in."),
        },
        Command::History => {
            let mut convo = Conversation::new(api);
            convo.load_history().await?;
            for message in convo.transcript().messages() {
                print_turn(message);
            }
        }
        Command::Chat => {
            chat_repl(api).await?;
        }
    }

    Ok(())
}

// ── Chat REPL ──────────────────────────────────────────────────────────

async fn chat_repl(api: ApiClient) -> ClientResult<()> {
    let mut convo = Conversation::new(api);
    let mut recorder = VoiceRecorder::new();

    // Prior turns are nice to have; chat still works without them.
    if let Err(e) = convo.load_history().await {
        warn!("could not load history: {}", e);
    }
    for message in convo.transcript().messages() {
        print_turn(message);
    }

    println!("Type a message, or /voice, /file <path> [prompt], /sticker <emoji>, /history, /quit.");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();

        let outcome = match line {
            "/quit" | "/exit" => break,
            "/voice" => handle_voice(&mut convo, &mut recorder).await,
            "/history" => match convo.load_history().await {
                Ok(_) => {
                    for message in convo.transcript().messages() {
                        print_turn(message);
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            },
            _ if line.starts_with("/sticker ") => {
                convo.send_sticker(line["/sticker ".len()..].trim());
                Ok(())
            }
            _ if line.starts_with("/file ") => {
                handle_file(&mut convo, line["/file ".len()..].trim()).await
            }
            _ if line.starts_with('/') => {
                Err(ClientError::Other(format!("unknown command: {}", line)))
            }
            _ => handle_prompt(&mut convo, line).await,
        };

        // Transient notice, never fatal: the REPL stays usable.
        if let Err(e) = outcome {
            eprintln!("! {}", e);
        }
    }

    if recorder.is_recording() {
        recorder.cancel();
    }
    Ok(())
}

async fn handle_prompt(convo: &mut Conversation, line: &str) -> ClientResult<()> {
    let mut printed_any = false;
    let result = convo
        .send_text(line, |piece| {
            print!("{}", piece);
            let _ = std::io::stdout().flush();
            printed_any = true;
        })
        .await;

    if printed_any {
        println!();
    }
    result.map(|_| ())
}

/// First `/voice` starts recording; the second stops, uploads, and prints
/// the reply.
async fn handle_voice(
    convo: &mut Conversation,
    recorder: &mut VoiceRecorder,
) -> ClientResult<()> {
    if !recorder.is_recording() {
        recorder.start()?;
        println!("Recording… type /voice again to stop and send.");
        return Ok(());
    }

    let samples = recorder
        .stop()
        .ok_or_else(|| ClientError::Audio("no recording in progress".into()))?;
    let reply = convo.send_voice(&samples, recorder.sample_rate()).await?;
    println!("{}", reply);
    Ok(())
}

async fn handle_file(convo: &mut Conversation, args: &str) -> ClientResult<()> {
    let (path, prompt) = match args.split_once(' ') {
        Some((path, rest)) => (path, Some(rest.trim())),
        None => (args, None),
    };
    if path.is_empty() {
        return Err(ClientError::Other("usage: /file <path> [prompt]".into()));
    }

    let path = PathBuf::from(path);
    let bytes = std::fs::read(&path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin");

    let reply = convo.send_file(file_name, bytes, prompt).await?;
    println!("{}", reply);
    Ok(())
}

// ── Output helpers ─────────────────────────────────────────────────────

fn print_turn(message: &ChatMessage) {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    match message.kind {
        MessageKind::File => {
            let name = message.file_name.as_deref().unwrap_or("file");
            println!("[{}] 📎 {}", who, name);
        }
        MessageKind::Audio => println!("[{}] 🎤 {}", who, message.content),
        _ => println!("[{}] {}", who, message.content),
    }
}

fn prompt_line(label: &str) -> ClientResult<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_signup() -> ClientResult<SignupRequest> {
    let username = prompt_line("Username: ")?;
    let password = prompt_line("Password: ")?;
    let confirm_password = prompt_line("Confirm password: ")?;
    let age = prompt_line("Age: ")?
        .parse::<u32>()
        .map_err(|_| ClientError::Other("age must be a number".into()))?;
    let profession = prompt_line("Profession: ")?;
    let email = prompt_line("Email: ")?;
    let phone = prompt_line("Phone number: ")?;
    let description = {
        let d = prompt_line("Description (optional): ")?;
        if d.is_empty() {
            None
        } else {
            Some(d)
        }
    };
    let profile_picture = {
        let p = prompt_line("Profile picture path (optional): ")?;
        if p.is_empty() {
            None
        } else {
            let path = PathBuf::from(&p);
            let bytes = std::fs::read(&path)?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("avatar.png")
                .to_string();
            Some(ProfilePicture { file_name, bytes })
        }
    };

    Ok(SignupRequest {
        username,
        password,
        confirm_password,
        age,
        profession,
        email,
        phone,
        description,
        profile_picture,
    })
}
