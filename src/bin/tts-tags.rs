//! tts-tags - command line access to the speaker tag store
//!
//! Inspect and edit the tags file without starting the GUI.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tts_tester::config::Config;
use tts_tester::tags::format::{default_description, CURRENT_VERSION};
use tts_tester::tags::{SpeakerTagStore, DEFAULT_COLOR};

/// Command line access to the speaker tag store
#[derive(Parser)]
#[command(name = "tts-tags")]
#[command(version)]
#[command(about = "Inspect and edit TTS Tester speaker tags", long_about = None)]
struct Cli {
    /// Tags file, defaults to the one in the config
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show store statistics
    Summary,

    /// List tags and the speakers carrying them
    List {
        /// Only show speakers of this model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Tag a speaker
    Add {
        model: String,
        speaker: String,
        tag: String,
    },

    /// Remove a tag from a speaker
    Remove {
        model: String,
        speaker: String,
        tag: String,
    },

    /// Create or update a tag definition
    Define {
        tag: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Color as #rrggbb
        #[arg(short, long)]
        color: Option<String>,
    },

    /// Delete a tag and all its speaker associations
    Undefine { tag: String },

    /// Set the download status of a model
    Mark {
        model: String,
        #[arg(long, conflicts_with = "not_downloaded")]
        downloaded: bool,
        #[arg(long)]
        not_downloaded: bool,
    },

    /// Rewrite the file in the current format
    Migrate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = match cli.file {
        Some(path) => path,
        None => PathBuf::from(Config::load()?.tags_file),
    };
    let mut store = SpeakerTagStore::try_load(&path)?;

    match cli.command {
        Commands::Summary => {
            let s = store.summary();
            println!("File:             {}", s.tags_file.display());
            println!("Exists:           {}", s.file_exists);
            if let Some(format) = store.loaded_format() {
                println!("Format:           {}", format);
            }
            println!("Tag definitions:  {}", s.tag_definitions_count);
            println!("Tagged models:    {}", s.models_count);
            println!("Tagged speakers:  {}", s.total_speakers);
            println!("Tag assignments:  {}", s.total_tags);
            println!("Downloaded:       {}", s.downloaded_models.len());
            println!("Available:        {}", s.available_models.len());
        }
        Commands::List { model } => {
            for tag in store.get_all_tags() {
                let Some(def) = store.get_tag_definition(&tag) else {
                    continue;
                };
                println!("{} [{}] {}", tag, def.color, def.description);
                for (m, speakers) in &def.speakers {
                    if model.as_deref().map(|want| want == m).unwrap_or(true) {
                        println!("    {}: {}", m, speakers.join(", "));
                    }
                }
            }
        }
        Commands::Add {
            model,
            speaker,
            tag,
        } => {
            if !store.add_tag_to_speaker(&model, &speaker, &tag) {
                bail!("model, speaker and tag must not be empty");
            }
            store.save()?;
            println!("Added '{}' to {} / {}", tag, model, speaker);
        }
        Commands::Remove {
            model,
            speaker,
            tag,
        } => {
            if !store.remove_tag_from_speaker(&model, &speaker, &tag) {
                bail!("Speaker '{}' doesn't have tag '{}'", speaker, tag);
            }
            store.save()?;
            println!("Removed '{}' from {} / {}", tag, model, speaker);
        }
        Commands::Define {
            tag,
            description,
            color,
        } => {
            if store.get_tag_definition(&tag).is_some() {
                store.update_tag_definition(&tag, description.as_deref(), color.as_deref());
            } else {
                let description = description.unwrap_or_else(|| default_description(&tag));
                let color = color.unwrap_or_else(|| DEFAULT_COLOR.to_string());
                store.add_tag_definition(&tag, &description, &color);
            }
            store.save()?;
            println!("Defined '{}'", tag);
        }
        Commands::Undefine { tag } => {
            if !store.remove_tag_definition(&tag) {
                bail!("No tag named '{}'", tag);
            }
            store.save()?;
            println!("Removed '{}'", tag);
        }
        Commands::Mark {
            model,
            downloaded,
            not_downloaded,
        } => {
            let changed = match (downloaded, not_downloaded) {
                (true, false) => store.mark_model_downloaded(&model),
                (false, true) => store.mark_model_not_downloaded(&model),
                _ => bail!("pass --downloaded or --not-downloaded"),
            };
            store.save()?;
            println!(
                "{} {}",
                model,
                if changed { "updated" } else { "unchanged" }
            );
        }
        Commands::Migrate => {
            let from = store
                .loaded_format()
                .map(|f| f.to_string())
                .unwrap_or_else(|| "nothing".to_string());
            store.save()?;
            println!(
                "Migrated {} from {} to {}",
                path.display(),
                from,
                CURRENT_VERSION
            );
        }
    }

    Ok(())
}
