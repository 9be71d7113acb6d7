//! Entry point for the ecopulse TUI. Parses args, resolves settings and runs the App.

use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use ecopulse::api::HttpApi;
use ecopulse::app::App;
use ecopulse::config::{fallback_url, Settings};
use ecopulse::logging::init_logging;
use ecopulse::profiles::{
    load_profiles, save_profiles, ProfileEntry, ProfileRequest, ProfilesFile, ResolveProfile,
};
use tracing::info;

const USAGE_FLAGS: &str = "[--tls-ca CERT_PEM|-t CERT_PEM] [--profile NAME|-P NAME] [--save] [--dry-run] [--interval MS|-i MS] [--limit N|-n N] [--timeout SECS] [--chat-url URL] [http://HOST:PORT]";

#[derive(Debug, Default)]
struct ParsedArgs {
    url: Option<String>,
    tls_ca: Option<String>,
    profile: Option<String>,
    chat_url: Option<String>,
    interval_ms: Option<u64>,
    history_limit: Option<usize>,
    timeout_secs: Option<u64>,
    save: bool,
    dry_run: bool,
    help: bool,
}

impl ParsedArgs {
    fn overrides(&self) -> ProfileEntry {
        ProfileEntry {
            url: self.url.clone().unwrap_or_default(),
            tls_ca: self.tls_ca.clone(),
            chat_url: self.chat_url.clone(),
            interval_ms: self.interval_ms,
            history_limit: self.history_limit,
            timeout_secs: self.timeout_secs,
        }
    }
}

fn number<T: std::str::FromStr>(flag: &str, v: Option<String>) -> Result<T, String> {
    let v = v.ok_or_else(|| format!("{flag} needs a value"))?;
    v.trim()
        .parse()
        .map_err(|_| format!("{flag}: '{v}' is not a valid number"))
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "ecopulse".into());
    let mut out = ParsedArgs::default();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => out.help = true,
            "--tls-ca" | "-t" => out.tls_ca = it.next(),
            "--profile" | "-P" => out.profile = it.next(),
            "--chat-url" => out.chat_url = it.next(),
            "--interval" | "-i" => out.interval_ms = Some(number(&arg, it.next())?),
            "--limit" | "-n" => out.history_limit = Some(number(&arg, it.next())?),
            "--timeout" => out.timeout_secs = Some(number(&arg, it.next())?),
            "--save" => out.save = true,
            "--dry-run" => out.dry_run = true,
            _ if arg.starts_with("--tls-ca=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        out.tls_ca = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with("--profile=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        out.profile = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with('-') => {
                return Err(format!("Unknown option '{arg}'. Usage: {prog} {USAGE_FLAGS}"));
            }
            _ => {
                if out.url.is_none() {
                    out.url = Some(arg);
                } else {
                    return Err(format!("Unexpected argument. Usage: {prog} {USAGE_FLAGS}"));
                }
            }
        }
    }
    if out.help {
        return Err(format!("Usage: {prog} {USAGE_FLAGS}"));
    }
    Ok(out)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) if msg.starts_with("Usage:") => {
            println!("{msg}");
            return Ok(());
        }
        Err(msg) => anyhow::bail!(msg),
    };

    init_logging();

    let Some(entry) = resolve_entry(&parsed)? else {
        return Ok(());
    };
    let settings = Settings::from_entry(&entry)?;

    if parsed.dry_run {
        print_settings(&settings);
        return Ok(());
    }

    let http = settings
        .http_config()
        .with_context(|| format!("reading TLS CA {:?}", settings.tls_ca))?;
    let api = Arc::new(HttpApi::new(&http)?);
    info!(url = %settings.base_url, interval_ms = settings.poll.interval.as_millis() as u64, "starting dashboard");

    let mut app = App::new(api, settings.poll);
    app.run().await
}

/// Applies the profile rules. `None` means the user aborted a prompt.
fn resolve_entry(parsed: &ParsedArgs) -> anyhow::Result<Option<ProfileEntry>> {
    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        overrides: parsed.overrides(),
    };
    let mut profiles_mut = profiles_file.clone();

    let entry = match req.resolve(&profiles_file) {
        ResolveProfile::Direct(mut entry) => {
            if let Some(name) = parsed.profile.as_ref() {
                match profiles_mut.profiles.get(name) {
                    None => {
                        // New profile: auto-save immediately
                        profiles_mut.profiles.insert(name.clone(), entry.clone());
                        persist(&profiles_mut);
                    }
                    Some(existing) => {
                        // options not repeated on the command line come from the profile
                        entry = entry.or_from(existing);
                        let changed = *existing != entry;
                        if changed
                            && (parsed.save
                                || prompt_yes_no(&format!(
                                    "Overwrite existing profile '{name}'? [y/N]: "
                                )))
                        {
                            profiles_mut.profiles.insert(name.clone(), entry.clone());
                            persist(&profiles_mut);
                        }
                    }
                }
            }
            entry
        }
        ResolveProfile::Loaded(entry) => entry,
        ResolveProfile::PromptSelect(names) => {
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let picked = line
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|idx| (1..=names.len()).contains(idx))
                .and_then(|idx| profiles_mut.profiles.get(&names[idx - 1]));
            match picked {
                Some(saved) => parsed.overrides().or_from(saved).with_url(&saved.url),
                None => return Ok(None),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter API URL (http://HOST:PORT or https://...): ")?;
            if url.trim().is_empty() {
                return Ok(None);
            }
            let ca = prompt_string("Enter TLS CA path (or leave blank): ")?;
            let mut entry = parsed.overrides().with_url(url.trim());
            if !ca.trim().is_empty() {
                entry.tls_ca = Some(ca.trim().to_string());
            }
            profiles_mut.profiles.insert(name, entry.clone());
            persist(&profiles_mut);
            entry
        }
        ResolveProfile::None => parsed.overrides().with_url(&fallback_url()),
    };
    Ok(Some(entry))
}

fn persist(profiles: &ProfilesFile) {
    if let Err(e) = save_profiles(profiles) {
        eprintln!("warning: could not save profiles: {e}");
    }
}

fn print_settings(s: &Settings) {
    println!("base_url: {}", s.base_url);
    match &s.chat_url {
        Some(u) => println!("chat_url: {u}"),
        None => println!("chat_url: {} (base)", s.base_url),
    }
    println!("interval_ms: {}", s.poll.interval.as_millis());
    println!("history_limit: {}", s.poll.history_limit);
    match s.request_timeout {
        Some(t) => println!("timeout_secs: {}", t.as_secs()),
        None => println!("timeout_secs: off"),
    }
    match &s.tls_ca {
        Some(p) => println!("tls_ca: {}", p.display()),
        None => println!("tls_ca: none"),
    }
}

fn prompt_yes_no(prompt: &str) -> bool {
    prompt_string(prompt)
        .map(|line| matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
        .unwrap_or(false)
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
