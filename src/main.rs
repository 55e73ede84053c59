use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use onlineschool_exporter::console::Console;
use onlineschool_exporter::menu::{Choice, Menu, MenuError, State};
use onlineschool_exporter::school::{self, Endpoints, SchoolClient};
use onlineschool_exporter::{export, secrets};

/// Exports the textbook text of an enrolled subject into a single file.
#[derive(Parser, Debug)]
#[command(name = "onlineschool-exporter", version)]
struct Args {
    /// JSON file holding `login` and `password`
    #[arg(long, env = "SCHOOL_SECRETS", default_value = "secrets.json")]
    secrets: PathBuf,

    /// Local copy of the subject list
    #[arg(long, env = "SCHOOL_CACHE", default_value = "subjects.json")]
    cache: PathBuf,

    /// Do not overwrite the cache after loading subjects again
    #[arg(long)]
    no_save_cache: bool,

    /// Export path, `{name}` is replaced by the subject name
    #[arg(long, env = "SCHOOL_OUTPUT", default_value = export::DEFAULT_TEMPLATE)]
    output: String,

    /// Raw lesson response of the last fetch, for debugging
    #[arg(long, env = "SCHOOL_DUMP", default_value = "res.html")]
    dump: PathBuf,

    #[arg(long)]
    no_dump: bool,

    #[arg(long, env = "SCHOOL_API_ROOT", default_value = school::DEFAULT_API_ROOT)]
    api_root: String,

    #[arg(long, env = "SCHOOL_SITE_ROOT", default_value = school::DEFAULT_SITE_ROOT)]
    site_root: String,
}

fn stop() {
    println!("\n[+] Stopping...");
}

/// Status line for a run that ended in an error. The exit status stays the
/// same either way.
fn failure_line(result: &Result<(), Box<dyn Error>>) -> Option<String> {
    result.as_ref().err().map(|e| format!("[-] {}", e))
}

async fn run(args: Args, creds: secrets::Credentials) -> Result<(), Box<dyn Error>> {
    let mut input = Console::stdin();
    let mut menu = Menu::new();

    let reload = loop {
        let prompt = menu.prompt().unwrap_or_default();
        let Some(line) = input.ask(&prompt).await? else {
            stop();
            return Ok(());
        };
        match menu.feed(&line) {
            Ok(State::AwaitingCatalog { reload }) => break *reload,
            Ok(_) => {}
            Err(e) => println!("{}\n", e),
        }
    };

    let dump = (!args.no_dump).then_some(args.dump);
    let mut client = SchoolClient::new(
        creds.login,
        creds.password,
        Endpoints::new(args.api_root, args.site_root),
    )?
    .with_dump(dump);

    client.authenticate().await?;
    println!("[+] Authorized, received a token");

    let records = client
        .load_catalog(reload, &args.cache, !args.no_save_cache)
        .await?;
    let mut subjects = client.subjects(&records)?;
    menu.offer(subjects.iter().map(|s| s.name.clone()).collect());

    let index = loop {
        let prompt = menu.prompt().unwrap_or_default();
        let Some(line) = input.ask(&prompt).await? else {
            stop();
            return Ok(());
        };
        match menu.feed(&line) {
            Ok(State::Resolved(Choice::Subject(i))) => break *i,
            Ok(State::Resolved(Choice::Exit)) => {
                stop();
                return Ok(());
            }
            Ok(_) => {}
            Err(e @ MenuError::InvalidChoice { .. }) => {
                debug!(error = %e, "invalid subject choice");
                println!("[-] Failed to chose answer, try again or close using \"esc\" or \"ex\" command...");
            }
            Err(e) => println!("[-] {}", e),
        }
    };

    let subject = &mut subjects[index];
    let path = export::output_path(&args.output, &subject.name);
    println!("[+] Saving result to \"{}\"...", path.display());
    export::export_with_reauth(&mut client, subject, Some(&args.output)).await?;
    println!("[+] Saved {}", subject);

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match secrets::load(&args.secrets) {
        Ok(creds) => tokio::select! {
            result = run(args, creds) => result,
            _ = tokio::signal::ctrl_c() => {
                stop();
                Ok(())
            }
        },
        Err(e) if e.needs_setup() => {
            println!("[!] {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    };

    if let Some(line) = failure_line(&result) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onlineschool_exporter::school::SchoolError;
    use reqwest::StatusCode;

    #[test]
    fn failures_are_reported_once_as_a_status_line() {
        let result: Result<(), Box<dyn Error>> =
            Err(SchoolError::RequestFailed(StatusCode::BAD_GATEWAY).into());
        assert_eq!(
            failure_line(&result).as_deref(),
            Some("[-] Request failed with status 502 Bad Gateway")
        );
        assert_eq!(failure_line(&Ok(())), None);
    }
}
