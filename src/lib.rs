// Library root
// -----------
// The binary (`main.rs`) wires these modules together into the smoke-test
// runner.
//
// Module responsibilities:
// - `api`: response models and the blocking HTTP client for the category
//   endpoints, behind the `CategoryApi` trait.
// - `validator`: runs the checks in order and builds a `ValidationReport`.
// - `ui`: renders the report and shows request spinners.
// - `config`: command-line flags and environment overrides.
pub mod api;
pub mod config;
pub mod ui;
pub mod validator;
