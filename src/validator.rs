// Endpoint validator: runs the category checks in a fixed order against any
// `CategoryApi` and folds every outcome into a `ValidationReport`.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::ControlFlow;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::api::{ApiError, CategoryApi, CategorySummary, SubCategory};

/// The checks in the order they run.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    MainCategories,
    MainWithSubcategories,
    Subcategories,
    ServerStatus,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::MainCategories => 1,
            Step::MainWithSubcategories => 2,
            Step::Subcategories => 3,
            Step::ServerStatus => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::MainCategories => "main categories",
            Step::MainWithSubcategories => "categories with subcategories",
            Step::Subcategories => "subcategories by code",
            Step::ServerStatus => "server status",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FailureKind {
    /// Transport-level failure; the run stopped here.
    Connectivity,
    /// The endpoint answered with a non-200 status.
    Endpoint { status: u16 },
    /// Malformed payload or any other surprise; the run stopped here.
    Unclassified,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Failure {
    pub step: Step,
    #[serde(flatten)]
    pub kind: FailureKind,
    pub detail: String,
}

/// Everything one run learned about the server.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub main_category_count: usize,
    pub main_categories: Vec<CategorySummary>,
    pub categories_with_subcategories: usize,
    pub total_subcategory_count: usize,
    /// Codes with at least one child, from the nested listing.
    pub per_category_subcounts: BTreeMap<String, usize>,
    /// Code used for the dependent lookup, when it ran.
    pub probed_code: Option<String>,
    pub first_category_subcategories: Vec<SubCategory>,
    pub steps: Vec<Step>,
    pub failures: Vec<Failure>,
}

impl ValidationReport {
    pub fn attempted(&self, step: Step) -> bool {
        self.steps.contains(&step)
    }

    pub fn failure_for(&self, step: Step) -> Option<&Failure> {
        self.failures.iter().find(|f| f.step == step)
    }

    /// The run could not reach the server at all.
    pub fn connectivity_failure(&self) -> Option<&Failure> {
        self.failures
            .iter()
            .find(|f| f.kind == FailureKind::Connectivity)
    }

    pub fn server_healthy(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Validator<'a, A: CategoryApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: CategoryApi + ?Sized> Validator<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Validator { api }
    }

    /// Run all checks. Never fails: every problem ends up in the report.
    pub fn run(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.run_steps(&mut report).is_break() {
            info!(failures = report.failures.len(), "run stopped early");
        }
        report
    }

    fn run_steps(&self, report: &mut ValidationReport) -> ControlFlow<()> {
        report.steps.push(Step::MainCategories);
        let main_ok = match self.api.main_categories() {
            Ok(categories) => {
                info!(count = categories.len(), "fetched main categories");
                report.main_category_count = categories.len();
                report.main_categories = categories;
                true
            }
            Err(err) => {
                record(report, Step::MainCategories, err)?;
                false
            }
        };

        report.steps.push(Step::MainWithSubcategories);
        match self.api.main_with_subcategories() {
            Ok(categories) => {
                report.categories_with_subcategories = categories.len();
                for category in &categories {
                    let count = category.children.len();
                    report.total_subcategory_count += count;
                    if count > 0 {
                        *report
                            .per_category_subcounts
                            .entry(category.code.clone())
                            .or_default() += count;
                    }
                }
                info!(
                    categories = categories.len(),
                    subcategories = report.total_subcategory_count,
                    "fetched categories with subcategories"
                );
            }
            Err(err) => record(report, Step::MainWithSubcategories, err)?,
        }

        // Only the first main category is probed, without fallback.
        let first_code = report.main_categories.first().map(|c| c.code.clone());
        if let (true, Some(code)) = (main_ok, first_code) {
            report.steps.push(Step::Subcategories);
            report.probed_code = Some(code.clone());
            match self.api.subcategories(&code) {
                Ok(subs) => {
                    info!(code = %code, count = subs.len(), "fetched subcategories");
                    report.first_category_subcategories = subs;
                }
                Err(err) => record(report, Step::Subcategories, err)?,
            }
        }

        report.steps.push(Step::ServerStatus);
        ControlFlow::Continue(())
    }
}

/// Fold one step error into the report. Breaks when the run cannot go on.
fn record(report: &mut ValidationReport, step: Step, err: ApiError) -> ControlFlow<()> {
    match err {
        ApiError::Status { status, body } => {
            warn!(%step, status, "endpoint returned error status");
            report.failures.push(Failure {
                step,
                kind: FailureKind::Endpoint { status },
                detail: body,
            });
            ControlFlow::Continue(())
        }
        ApiError::Connect { url, reason } => {
            error!(%step, %url, %reason, "server unreachable, aborting run");
            *report = ValidationReport {
                failures: vec![Failure {
                    step,
                    kind: FailureKind::Connectivity,
                    detail: reason,
                }],
                ..ValidationReport::default()
            };
            ControlFlow::Break(())
        }
        ApiError::Unexpected(message) => {
            warn!(%step, %message, "unexpected error, aborting run");
            report.failures.push(Failure {
                step,
                kind: FailureKind::Unclassified,
                detail: message,
            });
            ControlFlow::Break(())
        }
    }
}
