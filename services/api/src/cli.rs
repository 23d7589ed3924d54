use crate::commands::{run_compose, run_diagnose, run_fields, ComposeArgs, FieldsArgs};
use crate::server;
use crate::infra::parse_policy;
use clap::{Args, Parser, Subcommand};
use omnisorter::error::AppError;
use omnisorter::workflows::request::HiddenFieldPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "OmniSorter Request Desk",
    about = "Compose OmniSorter quotation and drawing requests and store them in Notion",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the form field catalog
    Fields(FieldsArgs),
    /// Render request documents from a JSON value map
    Compose(ComposeArgs),
    /// Check the connection to each configured Notion database
    Diagnose,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override OMNISORTER_HIDDEN_FIELDS (purge or retain)
    #[arg(long, value_parser = parse_policy)]
    pub(crate) hidden_fields: Option<HiddenFieldPolicy>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Fields(args) => run_fields(args),
        Command::Compose(args) => run_compose(args),
        Command::Diagnose => run_diagnose().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_accepts_policy_override() {
        let cli = Cli::try_parse_from(["omnisorter-api", "serve", "--hidden-fields", "retain"])
            .expect("arguments parse");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.hidden_fields, Some(HiddenFieldPolicy::Retain));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(
            Cli::try_parse_from(["omnisorter-api", "serve", "--hidden-fields", "never"]).is_err()
        );
    }
}
