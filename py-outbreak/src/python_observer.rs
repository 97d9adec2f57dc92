//! Argmin observer that writes to Python's stdout.
//!
//! Rust's `println!` writes to the OS-level stream, which does not show up in Jupyter, so
//! calibration progress goes through `sys.stdout` instead.

use argmin::core::observers::Observe;
use argmin::core::{State, KV};
use pyo3::prelude::*;

/// Writes optimization progress to Python's sys.stdout as a table
pub struct PythonObserver {
    /// Iterations between header repeats
    header_interval: u64,
    last_header_iter: Option<u64>,
}

impl PythonObserver {
    pub fn new() -> Self {
        Self::with_header_interval(100)
    }

    pub fn with_header_interval(header_interval: u64) -> Self {
        Self {
            header_interval,
            last_header_iter: None,
        }
    }

    fn print_header(&self) {
        let separator = "=".repeat(92);
        write_to_python(&separator);
        write_to_python(&format!(
            "{:>12} | {:>14} | {:>16} | {:>16} | {:>16}",
            "Iteration", "Time (s)", "Objective", "Best Objective", "Obj. Evaluations"
        ));
        write_to_python(&separator);
    }
}

impl Default for PythonObserver {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a line to Python's stdout, falling back to stderr
pub fn write_to_python(message: &str) {
    Python::with_gil(|py| {
        if let Err(e) = py
            .import("sys")
            .and_then(|sys| sys.getattr("stdout"))
            .and_then(|stdout| {
                stdout.call_method1("write", (format!("{message}\n"),))?;
                stdout.call_method0("flush")
            })
        {
            eprintln!("Failed to write to Python stdout: {e}");
            eprintln!("{message}");
        }
    });
}

impl<I> Observe<I> for PythonObserver
where
    I: State,
    <I as State>::Float: std::fmt::LowerExp,
{
    fn observe_iter(&mut self, state: &I, _kv: &KV) -> Result<(), argmin::core::Error> {
        let iter = state.get_iter();

        let header_due = self
            .last_header_iter
            .map_or(true, |last| iter.saturating_sub(last) >= self.header_interval);
        if header_due {
            self.print_header();
            self.last_header_iter = Some(iter);
        }

        let time = state.get_time().map(|d| d.as_secs_f64()).unwrap_or(0.0);
        let evaluations = state
            .get_func_counts()
            .get("cost_count")
            .copied()
            .unwrap_or(0);

        write_to_python(&format!(
            "{:>12} | {:>14.6} | {:>16} | {:>16} | {:>16}",
            iter,
            time,
            format!("{:.6e}", state.get_cost()),
            format!("{:.6e}", state.get_best_cost()),
            evaluations,
        ));
        Ok(())
    }
}
