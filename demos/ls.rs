//! Example: List a directory of a Quqi drive
//!
//! Usage:
//!   QUQI_ACCOUNT=... QUQI_PASSWORD=... QUQI_USER_ID=... QUQI_ROOT_DIR_ID=... \
//!   cargo run --example ls -- [--state STATE_FILE] [--proxy PROXY] [PATH]

mod cli;

use cli::{format_size, init_tracing, parse_options, usage_and_exit};

const USAGE: &str =
    "Usage: cargo run --example ls -- [--state STATE_FILE] [--proxy PROXY] [PATH]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let options = parse_options(USAGE);
    let path = match options.positionals.as_slice() {
        [] => "/".to_string(),
        [path] => path.clone(),
        _ => usage_and_exit(USAGE),
    };

    let fs = options.connect().await?;

    println!("Listing: {}\n", path);
    let children = fs.list_directory(&path).await?;
    if children.is_empty() {
        println!("  (empty)");
    }
    for child in children {
        let entry = fs.stat(&child).await?;
        if entry.is_directory() {
            println!("  [dir]  {}", child);
        } else {
            println!("  [file] {} {}", child, format_size(entry.size));
        }
    }

    options.save(&fs).await?;
    Ok(())
}
