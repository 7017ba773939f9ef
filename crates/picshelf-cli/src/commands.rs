use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use picshelf_core::{Shelf, TagScope, UploadFile, UploadReport};
use picshelf_server::PicshelfServer;
use serde::Serialize;
use walkdir::WalkDir;

use crate::cli::*;
use crate::settings::Settings;

/// JSON shape of a rename, for images and catalogues alike.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Renamed<'a> {
    old_name: &'a str,
    new_name: &'a str,
}

#[derive(Serialize)]
struct Deleted<'a> {
    deleted: &'a str,
}

#[derive(Serialize)]
struct Saved {
    path: PathBuf,
    bytes: usize,
}

#[derive(Serialize)]
struct Added<'a> {
    catalogue: &'a str,
    added: Vec<String>,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    run_command_to(cli, &mut std::io::stdout())
}

/// Run `cli`, writing command output to `out`.
pub fn run_command_to(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let settings = Settings::resolve(cli.config.as_deref(), cli.root)?;
    let format = cli.format;
    let shelf = Shelf::open(settings.shelf.clone())
        .with_context(|| format!("opening {}", settings.shelf.storage_root.display()))?;

    match cli.command {
        Command::Upload(args) => cmd_upload(&shelf, out, format, args),
        Command::Images(args) => cmd_images(&shelf, out, format, args),
        Command::Delete(args) => {
            shelf.delete_image(&args.name)?;
            emit(out, format, &Deleted { deleted: &args.name }, |out, d| {
                writeln!(out, "{} Deleted {}", "✓".green(), d.deleted.yellow())
            })
        }
        Command::Rename(args) => {
            shelf.rename_image(&args.old, &args.new)?;
            let renamed = Renamed {
                old_name: &args.old,
                new_name: &args.new,
            };
            emit(out, format, &renamed, |out, r| {
                writeln!(
                    out,
                    "{} Renamed {} → {}",
                    "✓".green(),
                    r.old_name.yellow(),
                    r.new_name.yellow()
                )
            })
        }
        Command::Download(args) => cmd_download(&shelf, out, format, args),
        Command::Catalogue(args) => cmd_catalogue(&shelf, out, format, args.action),
        Command::Tag(args) => cmd_tag(&shelf, out, format, args),
        Command::Stats => {
            let stats = shelf.tag_statistics()?;
            emit(out, format, &stats, |out, stats| {
                if stats.is_empty() {
                    writeln!(out, "No tags.")?;
                }
                for (tag, count) in stats {
                    writeln!(out, "{:>6}  {}", count.to_string().bold(), tag.cyan())?;
                }
                Ok(())
            })
        }
        Command::Log => {
            let log = shelf.tag_log()?;
            let lines: Vec<&str> = log.lines().collect();
            emit(out, format, &lines, |out, _| write!(out, "{log}"))
        }
        Command::Serve(args) => cmd_serve(shelf, out, settings, args),
    }
}

/// Write `value` as pretty JSON, or hand it to `text` for human output.
fn emit<T: Serialize>(
    out: &mut dyn Write,
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&mut dyn Write, &T) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(value)?)?,
        OutputFormat::Text => text(out, value)?,
    }
    Ok(())
}

/// Expand the given paths into files, walking directories recursively.
fn collect_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.with_context(|| format!("walking {}", path.display()))?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(UploadFile::new(name, bytes))
}

fn cmd_upload(
    shelf: &Shelf,
    out: &mut dyn Write,
    format: OutputFormat,
    args: UploadArgs,
) -> anyhow::Result<()> {
    let files = collect_files(&args.paths)?;
    if files.is_empty() {
        anyhow::bail!("no files found");
    }

    let mut total = UploadReport::default();
    for chunk in files.chunks(shelf.config().max_batch) {
        let batch = chunk
            .iter()
            .map(|path| read_upload(path))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let report = shelf.upload(batch)?;
        total.processed.extend(report.processed);
        total.failed.extend(report.failed);
    }

    emit(out, format, &total, |out, report| {
        for image in &report.processed {
            let note = if image.thumbnail_created { "" } else { " (thumbnail kept)" };
            writeln!(out, "  {} {}{}", "uploaded:".green(), image.name, note.dimmed())?;
        }
        for failure in &report.failed {
            writeln!(out, "  {} {}: {}", "failed:".red(), failure.name, failure.error)?;
        }
        writeln!(
            out,
            "{} {} uploaded, {} failed",
            "✓".green().bold(),
            report.processed.len(),
            report.failed.len()
        )
    })?;
    if !total.failed.is_empty() {
        anyhow::bail!("{} of {} files failed", total.failed.len(), files.len());
    }
    Ok(())
}

fn cmd_images(
    shelf: &Shelf,
    out: &mut dyn Write,
    format: OutputFormat,
    args: ImagesArgs,
) -> anyhow::Result<()> {
    let images = match args.name {
        Some(name) => vec![shelf.get_image(&name)?],
        None => shelf.list_images()?,
    };
    emit(out, format, &images, |out, images| {
        if images.is_empty() {
            writeln!(out, "No images.")?;
        }
        for image in images {
            let tags: Vec<&str> = image.tags.iter().collect();
            writeln!(
                out,
                "{}  {}  [{}]",
                image.name.yellow().bold(),
                image.upload_timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                tags.join(", ").cyan()
            )?;
        }
        Ok(())
    })
}

fn cmd_download(
    shelf: &Shelf,
    out: &mut dyn Write,
    format: OutputFormat,
    args: DownloadArgs,
) -> anyhow::Result<()> {
    let (bytes, default_name) = if args.thumbnail {
        (shelf.read_thumbnail(&args.name)?, format!("thumbnail-{}", args.name))
    } else {
        (shelf.read_original(&args.name)?, args.name.clone())
    };
    let path = args.out.unwrap_or_else(|| PathBuf::from(default_name));
    std::fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    let saved = Saved {
        path,
        bytes: bytes.len(),
    };
    emit(out, format, &saved, |out, saved| {
        writeln!(
            out,
            "{} Saved {} ({} bytes)",
            "✓".green(),
            saved.path.display().to_string().bold(),
            saved.bytes
        )
    })
}

fn cmd_catalogue(
    shelf: &Shelf,
    out: &mut dyn Write,
    format: OutputFormat,
    action: CatalogueAction,
) -> anyhow::Result<()> {
    match action {
        CatalogueAction::Create { name, images } => {
            let record = shelf.create_catalogue(&name, &images)?;
            let dropped = images.len().saturating_sub(record.images.len());
            emit(out, format, &record, |out, record| {
                writeln!(
                    out,
                    "{} Created catalogue {} with {} images",
                    "✓".green(),
                    record.name.yellow(),
                    record.images.len()
                )?;
                if dropped > 0 {
                    let note = "note:".dimmed();
                    writeln!(out, "  {note} {dropped} unknown or duplicate images skipped")?;
                }
                Ok(())
            })
        }
        CatalogueAction::List => {
            let catalogues = shelf.list_catalogues()?;
            emit(out, format, &catalogues, |out, catalogues| {
                if catalogues.is_empty() {
                    writeln!(out, "No catalogues.")?;
                }
                for (name, record) in catalogues {
                    writeln!(out, "{}  ({} images)", name.yellow().bold(), record.images.len())?;
                }
                Ok(())
            })
        }
        CatalogueAction::Show { name } => {
            let record = shelf.get_catalogue(&name)?;
            emit(out, format, &record, |out, record| {
                writeln!(
                    out,
                    "{}  created {}",
                    record.name.yellow().bold(),
                    record.creation_timestamp.format("%Y-%m-%d %H:%M:%S")
                )?;
                for image in &record.images {
                    writeln!(out, "  {image}")?;
                }
                Ok(())
            })
        }
        CatalogueAction::Add { name, images } => {
            let added = Added {
                catalogue: &name,
                added: shelf.add_images_to_catalogue(&name, &images)?,
            };
            emit(out, format, &added, |out, a| {
                let count = a.added.len();
                writeln!(out, "{} Added {count} images to {}", "✓".green(), a.catalogue.yellow())
            })
        }
        CatalogueAction::Remove { name, images } => {
            let report = shelf.remove_images_from_catalogue(&name, &images)?;
            emit(out, format, &report, |out, report| {
                let removed = report.removed;
                writeln!(out, "{} Removed {removed} images from {}", "✓".green(), name.yellow())?;
                for missing in &report.not_found {
                    writeln!(out, "  {} {missing}", "not in catalogue:".red())?;
                }
                Ok(())
            })
        }
        CatalogueAction::Rename { name, new_name } => {
            shelf.rename_catalogue(&name, &new_name)?;
            let renamed = Renamed {
                old_name: &name,
                new_name: &new_name,
            };
            emit(out, format, &renamed, |out, r| {
                writeln!(
                    out,
                    "{} Renamed catalogue {} → {}",
                    "✓".green(),
                    r.old_name.yellow(),
                    r.new_name.yellow()
                )
            })
        }
        CatalogueAction::Delete { name } => {
            shelf.delete_catalogue(&name)?;
            emit(out, format, &Deleted { deleted: &name }, |out, d| {
                writeln!(out, "{} Deleted catalogue {}", "✓".green(), d.deleted.yellow())
            })
        }
    }
}

fn cmd_tag(
    shelf: &Shelf,
    out: &mut dyn Write,
    format: OutputFormat,
    args: TagArgs,
) -> anyhow::Result<()> {
    let report = shelf.tag_images(TagScope::from_catalogue(args.catalogue))?;
    emit(out, format, &report, |out, report| {
        for tagged in &report.tagged {
            writeln!(out, "  {} {}", tagged.name, tagged.labels.join(", ").cyan())?;
        }
        for failure in &report.failed {
            writeln!(out, "  {} {}: {}", "failed:".red(), failure.name, failure.error)?;
        }
        writeln!(out, "{} Tagged {} images", "✓".green().bold(), report.tagged.len())
    })
}

fn cmd_serve(
    shelf: Shelf,
    out: &mut dyn Write,
    settings: Settings,
    args: ServeArgs,
) -> anyhow::Result<()> {
    let mut config = settings.server;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    writeln!(
        out,
        "Picshelf server on {} (root: {})",
        config.bind_addr.to_string().bold(),
        settings.shelf.storage_root.display()
    )?;
    out.flush()?;

    let server = PicshelfServer::new(config, Arc::new(shelf));
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve_until(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn output(root: &Path, args: &[&str]) -> anyhow::Result<String> {
        let root = root.to_string_lossy().into_owned();
        let mut argv = vec!["picshelf", "--root", root.as_str()];
        argv.extend_from_slice(args);
        let mut out = Vec::new();
        run_command_to(Cli::try_parse_from(argv)?, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn run(root: &Path, args: &[&str]) -> anyhow::Result<()> {
        output(root, args).map(drop)
    }

    fn json(root: &Path, args: &[&str]) -> serde_json::Value {
        let mut argv = vec!["--format", "json"];
        argv.extend_from_slice(args);
        let text = output(root, &argv).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn collects_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::write(dir.path().join("nested/b.png"), b"b").unwrap();
        std::fs::write(dir.path().join("nested/deeper/c.png"), b"c").unwrap();
        let single = dir.path().join("a.png");

        let files = collect_files(&[dir.path().join("nested"), single.clone()]).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.contains(&single));
        assert!(files.iter().any(|f| f.ends_with("deeper/c.png")));
    }

    #[test]
    fn upload_file_uses_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"bytes").unwrap();
        let file = read_upload(&path).unwrap();
        assert_eq!(file.name, "photo.jpg");
        assert_eq!(file.bytes, b"bytes");
    }

    #[test]
    fn catalogue_commands_round_trip_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["catalogue", "create", "fruit"]).unwrap();
        run(dir.path(), &["catalogue", "add", "fruit", "x.png"]).unwrap();
        run(dir.path(), &["catalogue", "rename", "fruit", "food"]).unwrap();
        run(dir.path(), &["--format", "json", "catalogue", "list"]).unwrap();

        let shelf = Shelf::open(picshelf_core::ShelfConfig::with_root(dir.path())).unwrap();
        assert_eq!(shelf.get_catalogue("food").unwrap().images, vec!["x.png"]);

        assert!(run(dir.path(), &["catalogue", "show", "fruit"]).is_err());
        run(dir.path(), &["catalogue", "delete", "food"]).unwrap();
    }

    #[test]
    fn failed_uploads_fail_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("broken.png"), b"not an image").unwrap();
        let store = dir.path().join("store");

        let err = run(&store, &["upload", src.to_str().unwrap()]).unwrap_err();
        assert!(err.to_string().contains("1 of 1 files failed"));
    }

    #[test]
    fn tag_and_stats_on_empty_shelf() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["tag"]).unwrap();
        run(dir.path(), &["stats"]).unwrap();
        run(dir.path(), &["log"]).unwrap();
        assert!(run(dir.path(), &["tag", "--catalogue", "missing"]).is_err());
    }

    #[test]
    fn missing_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["delete", "ghost.png"]).is_err());
        assert!(run(dir.path(), &["images", "ghost.png"]).is_err());
    }

    #[test]
    fn mutating_commands_honour_json_format() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        std::fs::create_dir_all(root.join("originals")).unwrap();
        std::fs::create_dir_all(root.join("thumbnails")).unwrap();
        std::fs::write(root.join("originals/a.png"), b"original").unwrap();
        std::fs::write(root.join("thumbnails/thumbnail-a.png"), b"thumb").unwrap();

        let created = json(&root, &["catalogue", "create", "fruit", "a.png", "ghost.png"]);
        assert_eq!(created["name"], "fruit");
        assert_eq!(created["images"], serde_json::json!(["a.png"]));

        let added = json(&root, &["catalogue", "add", "fruit", "x.png", "a.png"]);
        assert_eq!(added["added"], serde_json::json!(["x.png"]));

        let removed = json(&root, &["catalogue", "remove", "fruit", "x.png", "zzz"]);
        assert_eq!(removed["removed"], 1);
        assert_eq!(removed["notFound"], serde_json::json!(["zzz"]));

        let renamed = json(&root, &["catalogue", "rename", "fruit", "food"]);
        assert_eq!(renamed["oldName"], "fruit");
        assert_eq!(renamed["newName"], "food");
        assert_eq!(json(&root, &["catalogue", "delete", "food"])["deleted"], "food");

        let target = dir.path().join("out.png");
        let target_arg = target.to_string_lossy().into_owned();
        let saved = json(
            &root,
            &["download", "a.png", "--thumbnail", "-o", target_arg.as_str()],
        );
        assert_eq!(saved["bytes"], 5);
        assert_eq!(std::fs::read(&target).unwrap(), b"thumb");

        let renamed = json(&root, &["rename", "a.png", "b.png"]);
        assert_eq!(renamed["newName"], "b.png");
        assert_eq!(json(&root, &["delete", "b.png"])["deleted"], "b.png");
        assert_eq!(json(&root, &["log"]), serde_json::json!([]));
    }

    #[test]
    fn text_format_stays_human_readable() {
        let dir = tempfile::tempdir().unwrap();
        let text = output(dir.path(), &["catalogue", "create", "fruit"]).unwrap();
        assert!(text.contains("Created catalogue"));
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_err());
    }
}
