use std::env;
use std::process;

use quqifs::{Account, ClientConfig, QuqiFileSystem};
use tracing_subscriber::{EnvFilter, fmt};

pub fn usage_and_exit(usage: &str) -> ! {
    eprintln!("{usage}");
    process::exit(1);
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quqifs=debug"));
    fmt().with_env_filter(filter).with_target(false).init();
}

pub struct ArgParser {
    args: Vec<String>,
    usage: &'static str,
}

impl ArgParser {
    pub fn new(usage: &'static str) -> Self {
        let args: Vec<String> = env::args().skip(1).collect();

        if args.iter().any(|a| a == "--help" || a == "-h") {
            println!("{usage}");
            process::exit(0);
        }

        Self { args, usage }
    }

    pub fn take_value(&mut self, names: &[&str]) -> Option<String> {
        let mut i = 0;
        while i < self.args.len() {
            if names.contains(&self.args[i].as_str()) {
                let value = self.args.get(i + 1).cloned();
                if value.is_none() {
                    usage_and_exit(self.usage);
                }
                self.args.drain(i..=i + 1);
                return value;
            }
            i += 1;
        }
        None
    }

    pub fn remaining(self) -> Vec<String> {
        self.args
    }
}

/// Connection options shared by the demos.
///
/// Anything not given on the command line falls back to the `QUQI_*`
/// environment variables.
pub struct Options {
    pub state: Option<String>,
    pub positionals: Vec<String>,
    config: ClientConfig,
    account: Option<Account>,
}

pub fn parse_options(usage: &'static str) -> Options {
    let mut parser = ArgParser::new(usage);
    let state = parser.take_value(&["--state"]);
    let proxy = parser.take_value(&["--proxy"]);

    let mut config = ClientConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        usage_and_exit(usage)
    });
    if let Some(proxy) = proxy {
        config = config.with_proxy(proxy);
    }

    let account = Account::from_env().ok();
    Options {
        state,
        positionals: parser.remaining(),
        config,
        account,
    }
}

impl Options {
    /// Restore from `--state` when it exists, otherwise start fresh; then log in.
    pub async fn connect(&self) -> quqifs::Result<QuqiFileSystem> {
        let restored = match &self.state {
            Some(path) => QuqiFileSystem::load(path, self.config.clone()).await?,
            None => None,
        };
        let fs = match (restored, &self.account) {
            (Some(fs), _) => fs,
            (None, Some(account)) => QuqiFileSystem::new(self.config.clone(), account.clone())?,
            (None, None) => {
                return Err(quqifs::QuqiError::Custom(
                    "set QUQI_ACCOUNT, QUQI_PASSWORD, QUQI_USER_ID and QUQI_ROOT_DIR_ID".into(),
                ));
            }
        };
        fs.connect().await?;
        Ok(fs)
    }

    /// Write the cache back to `--state`, if given.
    pub async fn save(&self, fs: &QuqiFileSystem) -> quqifs::Result<()> {
        if let Some(path) = &self.state {
            fs.save(path).await?;
        }
        Ok(())
    }
}

pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else if bytes < 1_073_741_824 {
        format!("{:.1}MB", bytes as f64 / 1_048_576.0)
    } else {
        format!("{:.2}GB", bytes as f64 / 1_073_741_824.0)
    }
}
