//! Purpose: Offline `x-login` utility that turns a username/password login into a cookie file.
//! Role: Interactive companion to the C ABI; its output feeds `Initialize` directly.
//! Invariants: Prompts only for values not given as flags; the password prompt never echoes.
//! Invariants: Cookies go to stdout (or `--output`); diagnostics and prompts go to stderr.
//! Invariants: Exit code is 0 on success, otherwise the error kind's code.
#![allow(clippy::result_large_err)]
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use dialoguer::{Input, Password};
use tracing_subscriber::EnvFilter;
use tweetbridge::api::{CookieRecord, Error, ErrorKind, LoginCredentials, LoginPrompt, login};

#[derive(Parser, Debug)]
#[command(
    name = "x-login",
    version,
    about = "Log in with username and password and print the session cookies as JSON"
)]
struct Cli {
    /// Account username or handle; prompted when omitted.
    #[arg(long)]
    username: Option<String>,
    /// Account password; prompted (hidden) when omitted.
    #[arg(long)]
    password: Option<String>,
    /// Email or phone used if the platform asks to confirm the account.
    #[arg(long)]
    email: Option<String>,
    /// Proxy URL (http://, socks4:// or socks5://).
    #[arg(long)]
    proxy: Option<String>,
    /// Write cookies to this file instead of stdout.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

struct TerminalPrompt;

impl LoginPrompt for TerminalPrompt {
    fn two_factor_code(&mut self) -> Result<String, Error> {
        Input::<String>::new()
            .with_prompt("Two-factor code")
            .interact_text()
            .map_err(|err| prompt_error("two-factor code", err))
    }

    fn alternate_identifier(&mut self, hint: &str) -> Result<String, Error> {
        Input::<String>::new()
            .with_prompt(format!("Account confirmation ({hint})"))
            .interact_text()
            .map_err(|err| prompt_error(hint, err))
    }
}

fn main() {
    init_tracing();
    let exit_code = match run(Cli::parse()) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("x-login: {err}");
            err.kind().code()
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<(), Error> {
    let username = match cli.username {
        Some(username) => username,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(|err| prompt_error("username", err))?,
    };
    let password = match cli.password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|err| prompt_error("password", err))?,
    };
    let credentials = LoginCredentials {
        username: username.trim().to_string(),
        password,
        email: cli.email,
    };

    let cookies = login(&credentials, &mut TerminalPrompt, cli.proxy.as_deref())?;
    tracing::info!(count = cookies.len(), "received session cookies");

    let json = render_cookies(&cookies)?;
    match cli.output {
        Some(path) => write_cookies(&path, &json),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn render_cookies(cookies: &[CookieRecord]) -> Result<String, Error> {
    serde_json::to_string_pretty(cookies).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode cookies")
            .with_source(err)
    })
}

fn write_cookies(path: &Path, json: &str) -> Result<(), Error> {
    fs::write(path, format!("{json}\n")).map_err(|err| {
        Error::new(ErrorKind::Config)
            .with_message(format!("failed to write {}", path.display()))
            .with_source(err)
    })
}

fn prompt_error(what: &str, err: dialoguer::Error) -> Error {
    Error::new(ErrorKind::InvalidInput)
        .with_message(format!("failed to read {what}"))
        .with_source(err)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
