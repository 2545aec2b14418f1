//! Self-registering unit tests with a console reporter
//!
//! Tests declared with [`unit_test!`] register themselves into a global
//! registry at program start. [`run_all`] executes every registered test
//! sequentially in deterministic order and prints a colored report;
//! [`run_where`] restricts a run to one module, optionally filtered by
//! categories.
//!
//! A test is a plain `fn() -> bool`; `true` means passed. Panicking tests
//! are caught, counted as failed, and logged at debug level.

mod macros;
mod reporter;


use once_cell::sync::Lazy;
use reporter::Reporter;
use std::any::Any;
use std::fmt;
use std::panic;
use std::sync::RwLock;
use std::time::Duration;

/// Outcome of one registered test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// Not selected by the last run, or never run.
    NotRun,
    Passed,
    Failed,
}

/// A registered unit test.
#[derive(Debug, Clone, Copy)]
pub struct UnitTest {
    /// Module path captured at the declaration site.
    pub module: &'static str,
    /// Categories used for filtering and ordering. May be empty.
    pub categories: &'static [&'static str],
    /// Function name of the test.
    pub name: &'static str,
    /// The test body; `true` means passed.
    pub run: fn() -> bool,
}

impl fmt::Display for UnitTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.module)?;
        for category in self.categories {
            write!(f, "{} ", category)?;
        }
        write!(f, "{}", self.name)
    }
}

/// Summary of one test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestReport {
    /// Number of tests selected for the run.
    pub total: usize,
    /// Tests that returned `true`.
    pub passed: usize,
    /// Tests that returned `false` or panicked.
    pub failed: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

struct Registered {
    test: UnitTest,
    outcome: TestOutcome,
}

static REGISTRY: Lazy<RwLock<Vec<Registered>>> = Lazy::new(|| RwLock::new(Vec::new()));

/// Add a test to the global registry. [`unit_test!`] calls this at program
/// start.
pub fn register(test: UnitTest) {
    log::debug!("Registering unit test: {}", test);
    let mut registry = REGISTRY.write().unwrap();
    registry.push(Registered {
        test,
        outcome: TestOutcome::NotRun,
    });
}

/// Run every registered test and print a report.
pub fn run_all() -> TestReport {
    run_filtered(|_| true)
}

/// Run the tests of `module` that carry every one of `categories`.
///
/// Unselected tests stay `NotRun` and do not appear in the report.
pub fn run_where(module: &str, categories: &[&str]) -> TestReport {
    run_filtered(|test| {
        test.module == module && categories.iter().all(|c| test.categories.contains(c))
    })
}

fn run_filtered<F: Fn(&UnitTest) -> bool>(selected: F) -> TestReport {
    {
        let mut registry = REGISTRY.write().unwrap();
        registry.sort_by(|a, b| sort_key(&a.test).cmp(&sort_key(&b.test)));
    }

    let chosen: Vec<(usize, UnitTest)> = REGISTRY
        .read()
        .unwrap()
        .iter()
        .enumerate()
        .filter(|(_, entry)| selected(&entry.test))
        .map(|(index, entry)| (index, entry.test))
        .collect();

    let reporter = Reporter::new(chosen.len());

    // the default hook prints a banner for every caught panic; keep runs quiet
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));

    for (index, test) in &chosen {
        let outcome = run_test(test);
        REGISTRY.write().unwrap()[*index].outcome = outcome;
    }

    panic::set_hook(previous_hook);

    let report = reporter.finish();

    let mut registry = REGISTRY.write().unwrap();
    for entry in registry.iter_mut() {
        entry.outcome = TestOutcome::NotRun;
    }

    report
}

fn run_test(test: &UnitTest) -> TestOutcome {
    match panic::catch_unwind(test.run) {
        Ok(true) => TestOutcome::Passed,
        Ok(false) => TestOutcome::Failed,
        Err(payload) => {
            log::debug!("{} panicked: {}", test, payload_message(payload.as_ref()));
            TestOutcome::Failed
        }
    }
}

/// Ordering: module, then categories compared element-wise with the empty
/// list first, then name.
fn sort_key(test: &UnitTest) -> (&'static str, &'static [&'static str], &'static str) {
    (test.module, test.categories, test.name)
}

fn payload_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
