use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use witness_browser::{discovery, PageDriver};
use witness_harness::{LocationScenario, PollSpec};

/// Witness -- end-to-end browser verification with request mocking.
#[derive(Parser, Debug)]
#[command(name = "witness", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the account-settings location verification scenario
    Verify {
        /// Application origin under test (e.g. http://localhost:3000)
        #[arg(long)]
        base_url: String,

        /// DevTools HTTP endpoint of the running browser
        #[arg(long, default_value = "http://127.0.0.1:9222")]
        devtools_url: String,

        /// Write the final screenshot to this path
        #[arg(long)]
        screenshot: Option<PathBuf>,

        /// Maximum seconds to wait for each polled condition
        #[arg(long, default_value_t = 15)]
        wait_secs: u64,

        /// Milliseconds between condition probes
        #[arg(long, default_value_t = 250)]
        poll_interval_ms: u64,

        /// User ID the mocked backend answers for
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Navigate to a page and capture a screenshot, with no mocking
    Smoke {
        /// URL to load
        #[arg(long)]
        url: String,

        /// DevTools HTTP endpoint of the running browser
        #[arg(long, default_value = "http://127.0.0.1:9222")]
        devtools_url: String,

        /// Where to write the screenshot
        #[arg(long, default_value = "smoke.png")]
        screenshot: PathBuf,

        /// Maximum seconds to wait for the page load event
        #[arg(long, default_value_t = 60)]
        wait_secs: u64,
    },

    /// List the browser's debuggable targets
    Targets {
        /// DevTools HTTP endpoint of the running browser
        #[arg(long, default_value = "http://127.0.0.1:9222")]
        devtools_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Verify {
            base_url,
            devtools_url,
            screenshot,
            wait_secs,
            poll_interval_ms,
            user_id,
        } => {
            let target = discovery::resolve_page_target(&devtools_url, None).await?;
            let ws_url = target
                .ws_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("page target has no WebSocket debugger URL"))?;
            tracing::info!(target = %target.id, url = %target.url, "attaching to page target");

            let driver = PageDriver::connect(ws_url).await?;

            let mut scenario = LocationScenario::new(base_url).with_poll(PollSpec::new(
                Duration::from_millis(poll_interval_ms),
                Duration::from_secs(wait_secs),
            ));
            if let Some(user_id) = user_id {
                scenario.user_id = user_id;
            }
            if let Some(path) = screenshot {
                scenario = scenario.with_screenshot(path);
            }

            let report = scenario.run(&driver).await?;

            println!("verified location: {}", report.verified_location);
            if let Some(path) = report.screenshot {
                println!("screenshot: {}", path.display());
            }
            Ok(())
        }

        Commands::Smoke {
            url,
            devtools_url,
            screenshot,
            wait_secs,
        } => {
            let target = discovery::resolve_page_target(&devtools_url, None).await?;
            let ws_url = target
                .ws_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("page target has no WebSocket debugger URL"))?;

            let driver = PageDriver::connect(ws_url).await?;
            driver.goto(&url, Duration::from_secs(wait_secs)).await?;

            let png = driver.screenshot().await?;
            tokio::fs::write(&screenshot, &png).await?;
            println!("loaded {url}, screenshot: {}", screenshot.display());
            Ok(())
        }

        Commands::Targets { devtools_url } => {
            let targets = discovery::list_targets(&devtools_url).await?;
            if targets.is_empty() {
                println!("no targets at {devtools_url}");
                return Ok(());
            }
            for target in targets {
                let attachable = if target.ws_url.is_some() { "" } else { " (attached elsewhere)" };
                println!("{}  [{}]  {}{}", target.id, target.kind, target.url, attachable);
            }
            Ok(())
        }
    }
}
