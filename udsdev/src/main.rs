use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uds_core::error::Result;
use uds_core::store_factory::{Backend, open_store};
use uds_core::{NameIndex, ObjectStore, PushOptions, convert, directory, format, pull, push};

#[derive(Parser)]
#[command(author, version, about = "udsdev CLI (alpha)", long_about = None)]
struct Cli {
    /// Object store directory
    #[arg(long, global = true, default_value = ".uds-store")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file from this computer
    Push {
        path: PathBuf,
        /// Force serial chunk upload
        #[arg(long)]
        disable_multi: bool,
    },
    /// Download a stored file by container ID
    Pull {
        id: String,
        #[arg(long, default_value = "downloads")]
        out: PathBuf,
    },
    /// Re-upload an existing plain stored object as a chunked file
    Convert {
        id: String,
        /// Where the fetched copy is written before re-upload
        #[arg(long, default_value = "downloads")]
        out: PathBuf,
        /// Delete the source object after conversion
        #[arg(long)]
        delete: bool,
    },
    /// List stored files, optionally filtered by name
    List { query: Option<String> },
    /// Delete a stored file by container ID
    Delete { id: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let store = open_store(Backend::Fs, &cli.store)?;
    let store = store.as_ref();
    let index_path = cli.store.join("index.json");

    match cli.command {
        Commands::Push { path, disable_multi } => {
            let opts = PushOptions {
                parallel: !disable_multi,
                ..Default::default()
            };
            let summary = push(store, &path, Some(&opts))?;

            let mut index = NameIndex::load(&index_path)?;
            index.record(&summary.name, &summary.container_id);
            index.save()?;

            println!(
                "Uploaded {} ({} -> {} encoded) as {} chunk(s)",
                summary.name,
                format::human_bytes(summary.byte_size),
                format::human_bytes(summary.encoded_size),
                summary.chunk_count
            );
            println!("Container ID: {}", summary.container_id);
        }

        Commands::Pull { id, out } => {
            let path = pull(store, &id, &out, None)?;
            println!("Downloaded to {}", path.display());
        }

        Commands::Convert { id, out, delete } => {
            let summary = convert(store, &id, &out, None)?;

            let mut index = NameIndex::load(&index_path)?;
            index.record(&summary.name, &summary.container_id);
            index.save()?;

            if delete {
                store.delete_object(&id)?;
            }
            println!(
                "Converted {} ({}) into container {}",
                summary.name,
                format::human_bytes(summary.byte_size),
                summary.container_id
            );
        }

        Commands::List { query } => {
            let files = directory::list_all(store, query.as_deref())?;
            if files.is_empty() {
                println!("No UDS files found.");
            } else {
                println!("{:<32} {:>12} {:>12}  ID", "Name", "Size", "Encoded");
                for f in files {
                    let size = f.byte_size.map(format::human_bytes).unwrap_or_default();
                    let enc = f.encoded_size.map(format::human_bytes).unwrap_or_default();
                    println!("{:<32} {:>12} {:>12}  {}", f.name, size, enc, f.container_id);
                }
            }
        }

        Commands::Delete { id } => {
            directory::delete_container(store, &id)?;
            let mut index = NameIndex::load(&index_path)?;
            index.forget(&id);
            index.save()?;
            println!("Deleted {id}");
        }
    }

    Ok(())
}
