use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "picshelf",
    about = "Picshelf: image storage with thumbnails, catalogues and tags",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Storage root (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload image files or directories of images
    Upload(UploadArgs),
    /// List images, or show one
    Images(ImagesArgs),
    /// Delete an image and its thumbnail
    Delete(DeleteArgs),
    /// Rename an image
    Rename(RenameArgs),
    /// Save an original (or its thumbnail) to disk
    Download(DownloadArgs),
    /// Manage catalogues
    Catalogue(CatalogueArgs),
    /// Tag all images, or the images of one catalogue
    Tag(TagArgs),
    /// Show how many images carry each tag
    Stats,
    /// Print the tag audit log
    Log,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct UploadArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct ImagesArgs {
    pub name: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub name: String,
}

#[derive(Args)]
pub struct RenameArgs {
    pub old: String,
    pub new: String,
}

#[derive(Args)]
pub struct DownloadArgs {
    pub name: String,
    /// Output path (defaults to the stored file name)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// Download the thumbnail instead of the original
    #[arg(long)]
    pub thumbnail: bool,
}

#[derive(Args)]
pub struct CatalogueArgs {
    #[command(subcommand)]
    pub action: CatalogueAction,
}

#[derive(Subcommand)]
pub enum CatalogueAction {
    /// Create a catalogue, optionally with existing images
    Create { name: String, images: Vec<String> },
    /// List all catalogues
    List,
    /// Show one catalogue
    Show { name: String },
    /// Add images to a catalogue
    Add {
        name: String,
        #[arg(required = true)]
        images: Vec<String>,
    },
    /// Remove images from a catalogue
    Remove {
        name: String,
        #[arg(required = true)]
        images: Vec<String>,
    },
    /// Rename a catalogue
    Rename { name: String, new_name: String },
    /// Delete a catalogue (its images are kept)
    Delete { name: String },
}

#[derive(Args)]
pub struct TagArgs {
    /// Only tag the images of this catalogue
    #[arg(long)]
    pub catalogue: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address (overrides the config file)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_upload() {
        let cli = Cli::try_parse_from(["picshelf", "upload", "a.png", "photos/"]).unwrap();
        if let Command::Upload(args) = cli.command {
            assert_eq!(args.paths, vec![PathBuf::from("a.png"), PathBuf::from("photos/")]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn upload_needs_paths() {
        assert!(Cli::try_parse_from(["picshelf", "upload"]).is_err());
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "picshelf", "images", "--root", "/data", "--format", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/data")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_download() {
        let cli = Cli::try_parse_from([
            "picshelf",
            "download",
            "a.png",
            "-o",
            "/tmp/x.png",
            "--thumbnail",
        ])
        .unwrap();
        if let Command::Download(args) = cli.command {
            assert_eq!(args.name, "a.png");
            assert_eq!(args.out, Some(PathBuf::from("/tmp/x.png")));
            assert!(args.thumbnail);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_catalogue_actions() {
        let cli =
            Cli::try_parse_from(["picshelf", "catalogue", "create", "fruit", "a.png", "b.png"])
                .unwrap();
        match cli.command {
            Command::Catalogue(CatalogueArgs {
                action: CatalogueAction::Create { name, images },
            }) => {
                assert_eq!(name, "fruit");
                assert_eq!(images, vec!["a.png", "b.png"]);
            }
            _ => panic!("wrong command"),
        }

        let cli =
            Cli::try_parse_from(["picshelf", "catalogue", "rename", "fruit", "food"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Catalogue(CatalogueArgs {
                action: CatalogueAction::Rename { .. }
            })
        ));
        assert!(Cli::try_parse_from(["picshelf", "catalogue", "add", "fruit"]).is_err());
    }

    #[test]
    fn parse_tag_scope() {
        let cli = Cli::try_parse_from(["picshelf", "tag", "--catalogue", "fruit"]).unwrap();
        if let Command::Tag(args) = cli.command {
            assert_eq!(args.catalogue.as_deref(), Some("fruit"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve_bind() {
        let cli = Cli::try_parse_from(["picshelf", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind.map(|a| a.port()), Some(8080));
        } else {
            panic!("wrong command");
        }
        assert!(Cli::try_parse_from(["picshelf", "serve", "--bind", "nope"]).is_err());
    }
}
