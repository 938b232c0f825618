// UI layer: turns a `ValidationReport` into console text (or JSON) and
// shows a spinner while requests are in flight.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{ApiError, CategoryApi, CategorySummary, CategoryWithChildren, SubCategory};
use crate::validator::{Failure, FailureKind, Step, ValidationReport};

pub struct RenderOptions<'a> {
    /// Shown in the connectivity message and the status summary.
    pub base_url: &'a str,
    /// How many entries to list per step before eliding.
    pub preview: usize,
}

/// Write the human-readable report.
pub fn render(
    report: &ValidationReport,
    opts: &RenderOptions<'_>,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "Category API smoke test against {}", opts.base_url)?;
    writeln!(out, "{}", "=".repeat(60))?;

    if let Some(failure) = report.connectivity_failure() {
        writeln!(out, "FAIL could not connect to the server at {}", opts.base_url)?;
        writeln!(out, "     make sure the server is running ({})", failure.detail)?;
        return Ok(());
    }

    for step in &report.steps {
        if *step == Step::ServerStatus && !report.attempted(Step::Subcategories) {
            writeln!(out)?;
            writeln!(out, "{}", Step::Subcategories)?;
            writeln!(out, "   SKIP no main categories to probe")?;
        }
        writeln!(out)?;
        writeln!(out, "{}", step)?;
        if let Some(failure) = report.failure_for(*step) {
            writeln!(out, "   FAIL {}", describe(failure))?;
            continue;
        }
        match step {
            Step::MainCategories => render_main(report, opts.preview, out)?,
            Step::MainWithSubcategories => render_nested(report, out)?,
            Step::Subcategories => render_subs(report, opts.preview, out)?,
            Step::ServerStatus => render_status(report, opts.base_url, out)?,
        }
    }
    writeln!(out)?;
    writeln!(out, "Summary")?;
    writeln!(out, "   main categories: {}", report.main_category_count)?;
    writeln!(out, "   subcategories:   {}", report.total_subcategory_count)?;
    if report.is_success() {
        writeln!(out, "All checks passed.")?;
    } else {
        writeln!(out, "{} check(s) failed:", report.failures.len())?;
        for failure in &report.failures {
            writeln!(out, "   [{}] {}", failure.step, describe(failure))?;
        }
    }
    Ok(())
}

/// Write the report as pretty-printed JSON.
pub fn render_json(report: &ValidationReport, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).context("Serializing report")?;
    writeln!(out)?;
    Ok(())
}

fn describe(failure: &Failure) -> String {
    match &failure.kind {
        FailureKind::Connectivity => "could not connect to the server".to_string(),
        FailureKind::Endpoint { status } => format!("endpoint returned error status {}", status),
        FailureKind::Unclassified => format!("unexpected error: {}", failure.detail),
    }
}

fn render_main(report: &ValidationReport, preview: usize, out: &mut impl Write) -> Result<()> {
    let cats: &[CategorySummary] = &report.main_categories;
    writeln!(out, "   OK fetched {} main categories", cats.len())?;
    for (i, cat) in cats.iter().take(preview).enumerate() {
        writeln!(out, "      {}. {} - {}", i + 1, cat.code, cat.name)?;
    }
    if cats.len() > preview {
        writeln!(out, "      ... and {} more", cats.len() - preview)?;
    }
    Ok(())
}

fn render_nested(report: &ValidationReport, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "   OK fetched {} categories with their subcategories",
        report.categories_with_subcategories
    )?;
    for (code, count) in &report.per_category_subcounts {
        writeln!(out, "      {}: {} subcategories", code, count)?;
    }
    writeln!(out, "   total subcategories: {}", report.total_subcategory_count)?;
    Ok(())
}

fn render_subs(report: &ValidationReport, preview: usize, out: &mut impl Write) -> Result<()> {
    let subs: &[SubCategory] = &report.first_category_subcategories;
    let code = report.probed_code.as_deref().unwrap_or("?");
    writeln!(out, "   OK fetched {} subcategories for '{}'", subs.len(), code)?;
    for (i, sub) in subs.iter().take(preview).enumerate() {
        writeln!(out, "      {}. [{}] {}", i + 1, sub.subcategory_id, sub.name)?;
    }
    if subs.len() > preview {
        writeln!(out, "      ... and {} more", subs.len() - preview)?;
    }
    Ok(())
}

fn render_status(report: &ValidationReport, base_url: &str, out: &mut impl Write) -> Result<()> {
    writeln!(out, "   server reachable at {}", base_url)?;
    if report.server_healthy() {
        writeln!(out, "   OK all endpoints responded")?;
    } else {
        writeln!(out, "   WARN {} endpoint check(s) failed", report.failures.len())?;
    }
    Ok(())
}

/// Wraps a `CategoryApi` and shows a spinner on stderr for each call.
pub struct WithSpinner<A> {
    inner: A,
    enabled: bool,
}

impl<A: CategoryApi> WithSpinner<A> {
    pub fn new(inner: A, enabled: bool) -> Self {
        WithSpinner { inner, enabled }
    }

    fn spin<T>(&self, msg: String, call: impl FnOnce(&A) -> T) -> T {
        let pb = if self.enabled {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(100));
        let out = call(&self.inner);
        pb.finish_and_clear();
        out
    }
}

impl<A: CategoryApi> CategoryApi for WithSpinner<A> {
    fn main_categories(&self) -> Result<Vec<CategorySummary>, ApiError> {
        self.spin("Fetching main categories...".into(), |api| api.main_categories())
    }

    fn main_with_subcategories(&self) -> Result<Vec<CategoryWithChildren>, ApiError> {
        self.spin("Fetching categories with subcategories...".into(), |api| {
            api.main_with_subcategories()
        })
    }

    fn subcategories(&self, code: &str) -> Result<Vec<SubCategory>, ApiError> {
        self.spin(format!("Fetching subcategories for '{}'...", code), |api| {
            api.subcategories(code)
        })
    }
}
