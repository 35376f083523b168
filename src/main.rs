use clap::Parser;
use follow_newest::{FollowConfig, StartPosition, Update, follow_newest};
use std::io::{self, Write};
use std::process;
use std::time::Duration;
use tokio_stream::{Stream, StreamExt};
use tracing_subscriber::EnvFilter;

/// Like "tail -F", but it always follows the newest file
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to follow. Accepts file(s), directories or globs
    #[arg(value_name = "PATH", default_value = "*")]
    paths: Vec<String>,

    /// Show the whole file (only the first file opened)
    #[arg(short, long, conflicts_with = "bytes")]
    whole_file: bool,

    /// Start at byte NUM, negative counts from the end (only the first file opened)
    #[arg(short = 'c', long, value_name = "NUM", allow_negative_numbers = true)]
    bytes: Option<i64>,

    /// Don't print notices about files
    #[arg(short, long)]
    quiet: bool,

    /// Seconds to sleep between checks
    #[arg(short, long, value_name = "SECS", default_value_t = 0.5)]
    sleep_interval: f64,

    /// Only poll, don't use file change notifications
    #[arg(long)]
    no_watch: bool,
}

impl Args {
    fn start(&self) -> StartPosition {
        if self.whole_file {
            StartPosition::Start
        } else {
            self.bytes
                .map(StartPosition::from_signed)
                .unwrap_or_default()
        }
    }

    fn into_config(self) -> Result<FollowConfig, String> {
        let interval = Duration::try_from_secs_f64(self.sleep_interval)
            .map_err(|e| format!("invalid sleep interval {}: {}", self.sleep_interval, e))?;

        Ok(FollowConfig::new(self.paths.clone())
            .with_start(self.start())
            .with_interval(interval)
            .with_quiet(self.quiet)
            .with_watch(!self.no_watch))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    let stream = match follow_newest(config).await {
        Ok(stream) => Box::pin(stream),
        Err(e) => {
            eprintln!("Error setting up follower: {}", e);
            process::exit(1);
        }
    };

    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    if let Outcome::Failed(message) = forward(stream, ctrl_c, write_update).await {
        eprintln!("{}", message);
        process::exit(1);
    }
}

/// How the forwarding loop finished.
#[derive(Debug, PartialEq)]
enum Outcome {
    Interrupted,
    Ended,
    Failed(String),
}

/// Writes updates until the stream ends, fails, or `shutdown` resolves.
///
/// `shutdown` is created once and polled across iterations, so a signal that
/// arrives while an update is being written is still seen.
async fn forward<S, D, W>(mut stream: S, shutdown: D, mut write: W) -> Outcome
where
    S: Stream<Item = follow_newest::Result<Update>> + Unpin,
    D: Future<Output = ()>,
    W: FnMut(&Update) -> io::Result<()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return Outcome::Interrupted,
            item = stream.next() => match item {
                Some(Ok(update)) => {
                    if let Err(e) = write(&update) {
                        return Outcome::Failed(format!("Error writing output: {}", e));
                    }
                }
                Some(Err(e)) => return Outcome::Failed(format!("Error reading file: {}", e)),
                None => return Outcome::Ended,
            }
        }
    }
}

fn write_update(update: &Update) -> io::Result<()> {
    if !update.notices.is_empty() {
        let mut stderr = io::stderr().lock();
        for notice in &update.notices {
            writeln!(stderr, "{}", notice)?;
        }
    }
    if !update.data.is_empty() {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&update.data)?;
        stdout.flush()?;
    }
    Ok(())
}
