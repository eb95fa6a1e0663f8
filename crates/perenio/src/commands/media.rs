//! `perenio snapshot`, `perenio files`, `perenio stream`

use std::io::Write;
use std::path::{Path, PathBuf};

use perenio_api::RecordedFile;
use perenio_core::Integration;
use serde_json::Value;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Snapshot ────────────────────────────────────────────────────────

pub async fn snapshot(
    integration: &Integration,
    camera_id: &str,
    file: Option<PathBuf>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let image = integration
        .client()
        .try_get_camera_snapshot(camera_id)
        .await?;

    let path = file.unwrap_or_else(|| PathBuf::from(format!("{camera_id}.jpg")));
    if path == Path::new("-") {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&image)?;
        stdout.flush()?;
        return Ok(());
    }

    std::fs::write(&path, &image)?;
    output::status(
        &format!("Saved {} bytes to {}", image.len(), path.display()),
        global.quiet,
    );
    Ok(())
}

// ── Recorded files ──────────────────────────────────────────────────

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Entry")]
    entry: String,
}

pub async fn files(
    integration: &Integration,
    camera_id: &str,
    limit: u32,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let files: Vec<Value> = integration
        .client()
        .try_get_camera_files(camera_id, limit)
        .await?
        .into_iter()
        .map(RecordedFile::into_raw)
        .collect();

    let mut index = 0;
    let out = output::render_list(
        &global.output,
        &files,
        |f| {
            index += 1;
            FileRow {
                index,
                entry: f.to_string(),
            }
        },
        Value::to_string,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Stream offer ────────────────────────────────────────────────────

pub async fn stream(
    integration: &Integration,
    camera_id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let offer = integration
        .client()
        .try_get_camera_stream_offer(camera_id)
        .await?
        .into_raw();

    let out = output::render_single(&global.output, &offer, |raw| {
        serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string())
    })?;
    output::print_output(&out, global.quiet);
    output::status(
        "Note: this is a WebRTC offer, not a playable URL.",
        global.quiet,
    );
    Ok(())
}
