//! Example: Upload a local file to a Quqi drive
//!
//! Usage:
//!   QUQI_ACCOUNT=... QUQI_PASSWORD=... QUQI_USER_ID=... QUQI_ROOT_DIR_ID=... \
//!   cargo run --example put -- [--state STATE_FILE] [--proxy PROXY] <LOCAL_FILE> <REMOTE_PATH>

mod cli;

use std::process;
use std::sync::Arc;

use cli::{format_size, init_tracing, parse_options, usage_and_exit};
use indicatif::{ProgressBar, ProgressStyle};
use quqifs::TransferProgress;

const USAGE: &str = "Usage: cargo run --example put -- [--state STATE_FILE] [--proxy PROXY] <LOCAL_FILE> <REMOTE_PATH>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let options = parse_options(USAGE);
    let [local_file, remote_path] = options.positionals.as_slice() else {
        usage_and_exit(USAGE);
    };

    let file_size = tokio::fs::metadata(local_file).await?.len();
    let progress_bar = ProgressBar::new(file_size.max(1));
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    let progress_bar_for_cb = progress_bar.clone();

    let fs = options.connect().await?.with_progress(Arc::new(
        move |progress: &TransferProgress| {
            progress_bar_for_cb.set_length(progress.total.max(1));
            progress_bar_for_cb.set_position(progress.done.min(progress.total));
            progress_bar_for_cb.set_message(progress.filename.clone());
        },
    ));

    println!(
        "Uploading {} ({}) to {}",
        local_file,
        format_size(file_size),
        remote_path
    );
    match fs.upload(local_file, remote_path).await {
        Ok(entry) => {
            progress_bar.finish_with_message("done");
            println!("Created node {} ({} bytes)", entry.node_id, entry.size);
        }
        Err(e) => {
            progress_bar.abandon();
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    options.save(&fs).await?;
    Ok(())
}
