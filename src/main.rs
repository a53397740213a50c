use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use checkgate::cli::handlers::{self, CommandContext, CompliancePeriod, StartParams};
use checkgate::cli::{Cli, Commands, TrackAction};

fn main() {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .and_then(|path| path.or_else(checkgate::logging::default_log_path));
    checkgate::logging::init(cli.verbose, log_file);

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Init {
        checklists_dir,
        bare,
    } = cli.command
    {
        return handlers::handle_init(checklists_dir, bare);
    }

    let cwd = std::env::current_dir()?;
    let ctx = CommandContext::discover(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Validate { path, json } => handlers::handle_validate(&ctx, path, json),
        Commands::List { json } => handlers::handle_list(&ctx, json),
        Commands::Show { name, json } => handlers::handle_show(&ctx, name, json),
        Commands::Source { name } => handlers::handle_source(&ctx, name),
        Commands::Track(action) => match action {
            TrackAction::Start {
                checklist,
                artifact_type,
                artifact,
                by,
                epic,
                story,
                workflow,
            } => handlers::handle_track_start(
                &ctx,
                StartParams {
                    checklist,
                    artifact_type,
                    artifact,
                    by,
                    epic,
                    story,
                    workflow,
                },
            ),
            TrackAction::Record {
                id,
                item,
                status,
                notes,
                evidence,
            } => handlers::handle_track_record(&ctx, id, item, status, notes, evidence),
            TrackAction::Complete { id, notes } => handlers::handle_track_complete(&ctx, id, notes),
        },
        Commands::Import { file, json } => handlers::handle_import(&ctx, file, json),
        Commands::Results { id, json } => handlers::handle_results(&ctx, id, json),
        Commands::Failed { id, json } => handlers::handle_failed(&ctx, id, json),
        Commands::History { name, limit, json } => {
            handlers::handle_history(&ctx, name, limit, json)
        }
        Commands::Story { epic, story, json } => handlers::handle_story(&ctx, epic, story, json),
        Commands::Compliance {
            artifact_type,
            since,
            until,
            json,
        } => handlers::handle_compliance(
            &ctx,
            artifact_type,
            CompliancePeriod { since, until },
            json,
        ),
        Commands::Pending {
            artifact_type,
            artifact_id,
            required,
            json,
        } => handlers::handle_pending(&ctx, artifact_type, artifact_id, required, json),
    }
}
