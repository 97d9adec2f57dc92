use outbreak_core::SimulationError;
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

mod calibration;
mod core;
mod python_observer;
mod stochastic;

/// Map an engine error onto the closest Python exception
pub(crate) fn simulation_err(e: SimulationError) -> PyErr {
    let message = e.to_string();
    match e {
        SimulationError::Io(_) => PyIOError::new_err(message),
        SimulationError::InvalidParameter { .. } | SimulationError::Json(_) => {
            PyValueError::new_err(message)
        }
        _ => PyRuntimeError::new_err(message),
    }
}

/// Stochastic outbreak detection simulations.
#[pymodule]
fn outbreak_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let core_mod = PyModule::new(m.py(), "core")?;
    core::register(&core_mod)?;
    m.add_submodule(&core_mod)?;

    let stochastic_mod = PyModule::new(m.py(), "stochastic")?;
    stochastic::register(&stochastic_mod)?;
    m.add_submodule(&stochastic_mod)?;

    let calibration_mod = PyModule::new(m.py(), "calibration")?;
    calibration::register(&calibration_mod)?;
    m.add_submodule(&calibration_mod)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_errors_map_to_python_exceptions() {
        Python::with_gil(|py| {
            let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "outbreak.json");
            assert!(simulation_err(SimulationError::Io(missing)).is_instance_of::<PyIOError>(py));

            let invalid = SimulationError::InvalidParameter {
                name: "coverage".into(),
                value: 1.5,
                reason: "must be within [0, 1]".into(),
            };
            assert!(simulation_err(invalid).is_instance_of::<PyValueError>(py));

            let json = serde_json::from_str::<u32>("not a number").unwrap_err();
            assert!(simulation_err(SimulationError::Json(json)).is_instance_of::<PyValueError>(py));

            let domain = SimulationError::NumericDomain {
                curve: "hosp_prob",
                day: 0,
                value: -1.0,
            };
            assert!(simulation_err(domain).is_instance_of::<PyRuntimeError>(py));
        });
    }
}
