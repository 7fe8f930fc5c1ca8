//! PyO3 bindings for the price bounds engine.
//!
//! Exposes the Rust pipeline to Python:
//! - Tick, sigma and boundary types
//! - The per-security bounds engine
//! - A file-level entry point mirroring the CLI without writing outputs

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use bounds_batch::{BatchRunner, SecuritySelector};
use bounds_core::{
    BoundaryRow as RustBoundaryRow, Config as RustConfig, Error as RustError,
    SecurityId, SigmaPoint as RustSigmaPoint, Tick as RustTick, DATE_FORMAT, TIME_FORMAT,
};
use bounds_features::{BoundsEngine, SecurityBounds};
use bounds_ingestion::{resolve_input, resolve_open_prices, TickTable};
use chrono::{NaiveDate, NaiveTime};
use std::path::Path;

fn to_py_err(err: RustError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One minute bar. `date` is `YYYYMMDD`, `time` is `HH:MM:SS`.
#[pyclass]
#[derive(Clone)]
pub struct Tick {
    #[pyo3(get, set)]
    pub security_id: String,
    #[pyo3(get, set)]
    pub date: String,
    #[pyo3(get, set)]
    pub time: String,
    #[pyo3(get, set)]
    pub open_price: f64,
    #[pyo3(get, set)]
    pub close_price: f64,
}

#[pymethods]
impl Tick {
    #[new]
    fn new(security_id: String, date: String, time: String, open_price: f64, close_price: f64) -> Self {
        Tick {
            security_id,
            date,
            time,
            open_price,
            close_price,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Tick(security_id={}, date={}, time={}, open={}, close={})",
            self.security_id, self.date, self.time, self.open_price, self.close_price
        )
    }
}

impl TryFrom<&Tick> for RustTick {
    type Error = PyErr;

    fn try_from(t: &Tick) -> PyResult<Self> {
        let date = NaiveDate::parse_from_str(&t.date, DATE_FORMAT)
            .map_err(|e| PyValueError::new_err(format!("bad date {:?}: {e}", t.date)))?;
        let time = NaiveTime::parse_from_str(&t.time, TIME_FORMAT)
            .map_err(|e| PyValueError::new_err(format!("bad time {:?}: {e}", t.time)))?;
        Ok(RustTick {
            security_id: SecurityId::canonicalize(&t.security_id).map_err(to_py_err)?,
            date,
            time,
            open_price: t.open_price,
            close_price: t.close_price,
        })
    }
}

/// Mean absolute movement at one minute.
#[pyclass]
#[derive(Clone)]
pub struct SigmaPoint {
    #[pyo3(get)]
    pub time: String,
    #[pyo3(get)]
    pub sigma: f64,
    #[pyo3(get)]
    pub samples: usize,
}

#[pymethods]
impl SigmaPoint {
    fn __repr__(&self) -> String {
        format!(
            "SigmaPoint(time={}, sigma={:.6}, samples={})",
            self.time, self.sigma, self.samples
        )
    }
}

impl From<&RustSigmaPoint> for SigmaPoint {
    fn from(p: &RustSigmaPoint) -> Self {
        SigmaPoint {
            time: p.time.format(TIME_FORMAT).to_string(),
            sigma: p.sigma,
            samples: p.samples,
        }
    }
}

/// Lower/upper bound at one minute.
#[pyclass]
#[derive(Clone)]
pub struct BoundaryRow {
    #[pyo3(get)]
    pub time: String,
    #[pyo3(get)]
    pub lower: f64,
    #[pyo3(get)]
    pub upper: f64,
}

#[pymethods]
impl BoundaryRow {
    #[getter]
    fn width(&self) -> f64 {
        self.upper - self.lower
    }

    fn __repr__(&self) -> String {
        format!(
            "BoundaryRow(time={}, lower={}, upper={})",
            self.time, self.lower, self.upper
        )
    }
}

impl From<&RustBoundaryRow> for BoundaryRow {
    fn from(r: &RustBoundaryRow) -> Self {
        BoundaryRow {
            time: r.time.format(TIME_FORMAT).to_string(),
            lower: r.lower,
            upper: r.upper,
        }
    }
}

/// Everything derived for one security.
#[pyclass]
#[derive(Clone)]
pub struct Bounds {
    #[pyo3(get)]
    pub security_id: String,
    /// Window dates as `YYYYMMDD`.
    #[pyo3(get)]
    pub dates: Vec<String>,
    #[pyo3(get)]
    pub today_open: f64,
    #[pyo3(get)]
    pub prior_close: Option<f64>,
    #[pyo3(get)]
    pub precision: u32,
    #[pyo3(get)]
    pub profile: Vec<SigmaPoint>,
    #[pyo3(get)]
    pub rows: Vec<BoundaryRow>,
    /// Warning messages raised for this security.
    #[pyo3(get)]
    pub warnings: Vec<String>,
}

#[pymethods]
impl Bounds {
    fn __repr__(&self) -> String {
        format!(
            "Bounds(security_id={}, days={}, rows={}, warnings={})",
            self.security_id,
            self.dates.len(),
            self.rows.len(),
            self.warnings.len()
        )
    }
}

impl From<&SecurityBounds> for Bounds {
    fn from(b: &SecurityBounds) -> Self {
        Bounds {
            security_id: b.security_id.to_string(),
            dates: b
                .window
                .dates()
                .iter()
                .map(|d| d.format(DATE_FORMAT).to_string())
                .collect(),
            today_open: b.references.today_open,
            prior_close: b.references.prior_close,
            precision: b.precision,
            profile: b.profile.points().iter().map(Into::into).collect(),
            rows: b.rows.iter().map(Into::into).collect(),
            warnings: b.diagnostics.warnings().iter().map(|w| w.to_string()).collect(),
        }
    }
}

// ============================================================================
// Python-exposed Engine Classes
// ============================================================================

/// Per-security bounds engine.
#[pyclass]
pub struct PyBoundsEngine {
    inner: BoundsEngine,
}

#[pymethods]
impl PyBoundsEngine {
    #[new]
    #[pyo3(signature = (precision = 2, trading_days = 14))]
    fn new(precision: u32, trading_days: usize) -> PyResult<Self> {
        let mut config = RustConfig::default();
        config.window.trading_days = trading_days;
        config.bounds.precision = Some(precision);
        config.validate().map_err(to_py_err)?;
        Ok(PyBoundsEngine {
            inner: BoundsEngine::new(&config, precision),
        })
    }

    /// Load the engine settings from a JSON config file.
    #[staticmethod]
    #[pyo3(signature = (path, precision = 2))]
    fn from_config_file(path: &str, precision: u32) -> PyResult<Self> {
        let config = RustConfig::from_json_file(path).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        let precision = config.bounds.precision.unwrap_or(precision);
        Ok(PyBoundsEngine {
            inner: BoundsEngine::new(&config, precision),
        })
    }

    #[getter]
    fn precision(&self) -> u32 {
        self.inner.precision()
    }

    /// Compute bounds for one security. Ticks of other securities are ignored.
    fn compute(&self, security_id: &str, ticks: Vec<Tick>, today_open: f64) -> PyResult<Bounds> {
        let id = SecurityId::canonicalize(security_id).map_err(to_py_err)?;
        let mut rust_ticks = Vec::with_capacity(ticks.len());
        for tick in &ticks {
            let tick = RustTick::try_from(tick)?;
            if tick.security_id == id {
                rust_ticks.push(tick);
            }
        }
        Ok((&self.inner.compute(&id, &rust_ticks, today_open)).into())
    }
}

/// Run the pipeline over a tick file without writing outputs.
///
/// `open_price` is a numeric price or a reference table path; `security` is a
/// code or `ALL`.
#[pyfunction]
#[pyo3(signature = (path, open_price, security, data_dir = "data"))]
fn compute_bounds_file(
    path: &str,
    open_price: &str,
    security: &str,
    data_dir: &str,
) -> PyResult<Vec<Bounds>> {
    let selector: SecuritySelector = security.parse().map_err(to_py_err)?;
    let mut config = RustConfig::default();
    config.io.data_dir = data_dir.into();

    let input = resolve_input(Path::new(path), &config.io.data_dir).map_err(to_py_err)?;
    let table = TickTable::from_path(&input).map_err(to_py_err)?;
    let open_prices = resolve_open_prices(open_price, &config.io.data_dir).map_err(to_py_err)?;

    let outcome = BatchRunner::new(config)
        .run(&table, &selector, &open_prices)
        .map_err(to_py_err)?;
    Ok(outcome.results.iter().map(Into::into).collect())
}

// ============================================================================
// Module Definition
// ============================================================================

/// Price Bounds Core - per-minute price bounds computed in Rust.
#[pymodule]
fn price_bounds_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<Tick>()?;
    m.add_class::<SigmaPoint>()?;
    m.add_class::<BoundaryRow>()?;
    m.add_class::<Bounds>()?;

    // Engine classes
    m.add_class::<PyBoundsEngine>()?;
    m.add_function(wrap_pyfunction!(compute_bounds_file, m)?)?;

    Ok(())
}
