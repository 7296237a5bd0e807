use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use guides_bot::application::guide_service::{DEFAULT_RECENT_DAYS, GuideService};
use guides_bot::data::guide_repository::SqliteGuideRepository;
use guides_bot::domain::guide::Guide;
use guides_bot::infrastructure::database::{create_pool, run_migrations};

#[derive(Parser, Debug)]
#[clap(about = "Administer the channel guides store")]
struct Cli {
    #[clap(
        short,
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://guides.db?mode=rwc"
    )]
    database: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    Count,
    List {
        #[clap(long)]
        limit: Option<i64>,
    },
    Show {
        message_id: i64,
    },
    Search {
        term: String,
        #[clap(long)]
        limit: Option<i64>,
    },
    Recent {
        #[clap(long, default_value_t = DEFAULT_RECENT_DAYS)]
        days: i64,
        #[clap(long)]
        limit: Option<i64>,
    },
    Stats,
    Delete {
        message_id: i64,
    },
    /// Writes every guide as JSON, to stdout unless --output is given.
    Export {
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Loads guides from a JSON export; existing message ids are kept.
    Import {
        file: PathBuf,
    },
    /// Deletes every stored guide.
    Reset {
        #[clap(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let pool = create_pool(&args.database)
        .await
        .with_context(|| format!("cannot open {}", args.database))?;
    run_migrations(&pool).await?;
    let guides = GuideService::new(Arc::new(SqliteGuideRepository::new(pool)));

    match args.command {
        Command::Count => {
            println!("{}", guides.count().await?);
        }
        Command::List { limit } => {
            let list = guides.list_guides(limit).await?;
            println!("Guides ({})", list.len());
            print_guides(&list);
        }
        Command::Show { message_id } => {
            let guide = guides.get_guide(message_id).await?;
            println!("[{}] {}", guide.message_id, guide.title);
            println!("published: {}", guide.created_at.to_rfc3339());
            println!("saved:     {}", guide.saved_at.to_rfc3339());
            println!();
            println!("{}", guide.content);
        }
        Command::Search { term, limit } => {
            print_guides(&guides.search(&term, limit).await?);
        }
        Command::Recent { days, limit } => {
            print_guides(&guides.recent(days, limit).await?);
        }
        Command::Stats => {
            let stats = guides.stats().await?;
            println!("total:      {}", stats.total);
            println!("last week:  {}", stats.last_week);
            if let Some(first) = stats.first_created_at {
                println!("first:      {}", first.to_rfc3339());
            }
            if let Some(latest) = stats.latest_created_at {
                println!("latest:     {}", latest.to_rfc3339());
            }
        }
        Command::Delete { message_id } => {
            guides.delete_guide(message_id).await?;
            println!("Guide {message_id} deleted!");
        }
        Command::Export { output } => {
            let json = serde_json::to_string_pretty(&guides.export().await?)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("cannot write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Import { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            let backup: Vec<Guide> = serde_json::from_str(&raw).context("invalid export file")?;
            let total = backup.len();
            let imported = guides.import(backup).await?;
            println!("Imported {imported} of {total} guides");
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to wipe the store without --yes");
            }
            let removed = guides.reset().await?;
            println!("Removed {removed} guides");
        }
    }

    Ok(())
}

fn print_guides(guides: &[Guide]) {
    for guide in guides {
        println!(
            "- [{}] {} ({})",
            guide.message_id,
            guide.title,
            guide.created_at.format("%Y-%m-%d")
        );
    }
}
