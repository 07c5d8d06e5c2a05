use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use wallpaper_core::{
    CatalogService, CoreConfig, ImageFormat, ImageUpload, UploadRequest, Wallpaper,
};

#[derive(Parser)]
#[command(name = "wallpaper")]
#[command(about = "Wallpaper catalog CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all wallpapers, newest first
    List {
        /// Only show wallpapers whose name contains, or whose tag equals, this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Search wallpapers by name or tag
    Search {
        /// Search text
        query: String,
    },
    /// Add an image file to the catalog
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// Tags (comma-separated)
        #[arg(long)]
        tags: String,
        /// Path to a JPEG, PNG, GIF or WebP image
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a wallpaper and its image
    Delete {
        /// Wallpaper id
        id: i64,
    },
    /// Remove stored images that no wallpaper references
    Sweep {
        /// Leave files younger than this alone
        #[arg(long, default_value_t = 60)]
        min_age_minutes: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'wallpaper --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::from_env_values(
        std::env::var("WALLPAPER_DB_PATH").ok(),
        std::env::var("WALLPAPER_PUBLIC_DIR").ok(),
    )?;
    let service = CatalogService::open(&cfg).await?;

    match command {
        Commands::List { filter } => {
            let snapshot = service.snapshot().await?;
            let shown = snapshot.filter(filter.as_deref().unwrap_or_default());
            if shown.is_empty() {
                println!("No wallpapers found.");
            }
            for wallpaper in shown {
                print_wallpaper(wallpaper);
            }
        }
        Commands::Search { query } => match service.search(&query).await {
            Ok(found) if found.is_empty() => println!("No wallpapers match '{}'.", query),
            Ok(found) => found.iter().for_each(print_wallpaper),
            Err(e) => eprintln!("Error searching wallpapers: {}", e),
        },
        Commands::Add { name, tags, file } => {
            let request = UploadRequest {
                name: Some(name),
                tags: Some(tags),
                image: Some(read_image(&file)?),
            };
            match service.upload(request).await {
                Ok(wallpaper) => println!(
                    "Added wallpaper {} at {}",
                    wallpaper.id, wallpaper.image_url
                ),
                Err(e) => eprintln!("Error adding wallpaper: {}", e),
            }
        }
        Commands::Delete { id } => match service.delete(id).await {
            Ok(()) => println!("Deleted wallpaper {}", id),
            Err(e) => eprintln!("Error deleting wallpaper: {}", e),
        },
        Commands::Sweep { min_age_minutes } => {
            let removed = service
                .sweep_orphans(chrono::Duration::minutes(min_age_minutes))
                .await?;
            println!("Removed {} orphaned image(s)", removed.len());
            for file_name in removed {
                println!("  {}", file_name);
            }
        }
    }

    Ok(())
}

fn print_wallpaper(wallpaper: &Wallpaper) {
    println!(
        "ID: {}, Name: {}, Tags: {}, URL: {}, Created: {}",
        wallpaper.id,
        wallpaper.name,
        wallpaper.tags.join(", "),
        wallpaper.image_url,
        wallpaper.created_at
    );
}

/// Media type implied by a file's extension; empty when it is not an allowed image.
fn mime_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .map(ImageFormat::mime_type)
        .unwrap_or_default()
}

fn read_image(path: &Path) -> std::io::Result<ImageUpload> {
    Ok(ImageUpload {
        original_file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        mime_type: mime_type_for(path).to_string(),
        bytes: std::fs::read(path)?,
    })
}
