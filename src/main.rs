// Entrypoint for the smoke-test runner.
// - Logs go to stderr so stdout carries only the report.
// - Exit status: 0 when every check passed, 1 when any failed, 2 when the
//   run could not start.

use std::io;
use std::process::ExitCode;

use category_smoke::api::ApiClient;
use category_smoke::config::Cli;
use category_smoke::ui::{render, render_json, RenderOptions, WithSpinner};
use category_smoke::validator::Validator;
use clap::Parser;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let client = ApiClient::new(&cli.base_url, cli.request_timeout())?;
    let api = WithSpinner::new(client, cli.show_spinner());

    let report = Validator::new(&api).run();

    let mut stdout = io::stdout().lock();
    if cli.json {
        render_json(&report, &mut stdout)?;
    } else {
        let opts = RenderOptions {
            base_url: &cli.base_url,
            preview: cli.preview,
        };
        render(&report, &opts, &mut stdout)?;
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
