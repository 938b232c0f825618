// Command-line configuration. Every option has a default so a bare
// invocation checks the local development server.

use std::time::Duration;

use clap::Parser;

use crate::api::DEFAULT_BASE_URL;

#[derive(Parser, Debug)]
#[command(
    name = "category-smoke",
    version,
    about = "Smoke-test the category-management API endpoints"
)]
pub struct Cli {
    #[arg(
        long,
        env = "CATEGORY_API_URL",
        default_value = DEFAULT_BASE_URL,
        help = "API base URL"
    )]
    pub base_url: String,
    #[arg(
        long,
        env = "CATEGORY_API_TIMEOUT",
        default_value_t = 10,
        help = "Per-request timeout in seconds (0 disables it)"
    )]
    pub timeout: u64,
    #[arg(long, default_value_t = 3, help = "Entries listed per step before eliding")]
    pub preview: usize,
    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,
    #[arg(long, short, help = "Do not show progress spinners")]
    pub quiet: bool,
}

impl Cli {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    pub fn show_spinner(&self) -> bool {
        !(self.json || self.quiet)
    }
}
