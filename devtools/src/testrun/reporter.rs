//! Console reporting for test runs
//!
//! The reporter announces the run on creation and prints per-test lines
//! plus a summary when finished. An early drop reports too, so a run that
//! aborts halfway still shows what it had.

use super::{TestOutcome, TestReport, REGISTRY};
use colored::Colorize;
use std::time::Instant;

pub(super) struct Reporter {
    start: Instant,
    total: usize,
    finished: bool,
}

impl Reporter {
    pub(super) fn new(total: usize) -> Self {
        println!("Commencing {} Tests", total);
        Reporter {
            start: Instant::now(),
            total,
            finished: false,
        }
    }

    pub(super) fn finish(mut self) -> TestReport {
        self.finished = true;
        self.report()
    }

    fn report(&self) -> TestReport {
        let elapsed = self.start.elapsed();
        let mut passed = 0;
        let mut failed = 0;

        if self.total != 0 {
            let registry = REGISTRY.read().unwrap();
            for entry in registry.iter() {
                match entry.outcome {
                    TestOutcome::Passed => {
                        passed += 1;
                        println!("{} - {}", "PASSED".green(), entry.test);
                    }
                    TestOutcome::Failed => {
                        failed += 1;
                        eprintln!("{} - {}", "FAILED".red(), entry.test);
                    }
                    TestOutcome::NotRun => {}
                }
            }

            let seconds = elapsed.as_secs_f32();
            let passed_part = format!("{} passed", passed);
            let failed_part = format!("{} failed", failed);
            println!(
                "{} test{} and {} test{} in {} second{}",
                if passed == 0 {
                    passed_part.red()
                } else {
                    passed_part.green()
                },
                if passed == 1 { "" } else { "s" },
                if failed == 0 {
                    failed_part.green()
                } else {
                    failed_part.red()
                },
                if failed == 1 { "" } else { "s" },
                seconds,
                if seconds == 1.0 { "" } else { "s" },
            );
        }

        TestReport {
            total: self.total,
            passed,
            failed,
            elapsed,
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if !self.finished {
            self.report();
        }
    }
}
