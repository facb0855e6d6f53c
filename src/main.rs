use clap::Parser;
use scrip::cli::{
    handle_add, handle_delete, handle_edit, handle_export, handle_get, handle_import, handle_init,
    handle_list, handle_mark, handle_note, Cli, Commands, Context,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "scrip=debug" } else { "scrip=warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let ctx = Context::new(cli.data_dir, cli.database);

    let result = match cli.command {
        Commands::Init => handle_init(&ctx).await,
        Commands::Add {
            name,
            description,
            kinds,
            start,
            end,
            json,
        } => handle_add(&ctx, name, description, kinds, start, end, json).await,
        Commands::List { json } => handle_list(&ctx, json).await,
        Commands::Get { id, json } => handle_get(&ctx, id, json).await,
        Commands::Edit {
            id,
            name,
            description,
            kinds,
            start,
            end,
            json,
        } => handle_edit(&ctx, id, name, description, kinds, start, end, json).await,
        Commands::Delete { id, force } => handle_delete(&ctx, id, force).await,
        Commands::Mark { id, date } => handle_mark(&ctx, id, date).await,
        Commands::Note {
            id,
            date,
            text,
            stdin,
        } => handle_note(&ctx, id, date, text, stdin).await,
        Commands::Export { output } => handle_export(&ctx, output).await,
        Commands::Import { input } => handle_import(&ctx, input).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
