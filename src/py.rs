use crate::features::patch::{patch_location, patch_size};
use crate::subwindow::grid::SamplingGrid;
use crate::utils::bbox::{BoundingBox, Size};
use crate::utils::clamp::clamp_indices;
use crate::utils::rounding::round_half_up_all;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn to_py_err(e: anyhow::Error) -> PyErr {
    PyValueError::new_err(format!("{}", e))
}

fn py_bbox(location: (f32, f32, f32, f32)) -> PyResult<BoundingBox> {
    BoundingBox::try_new(location.0, location.1, location.2, location.3).map_err(to_py_err)
}

/// Clamps the indices into `[lower, upper]`
///
#[pyfunction]
#[pyo3(name = "clamp", signature = (index, lower, upper))]
pub fn clamp_py(index: Vec<i64>, lower: i64, upper: i64) -> Vec<i64> {
    clamp_indices(&index, lower, upper)
}

/// Rounds the values, `.5` fractions are rounded up
///
#[pyfunction]
#[pyo3(name = "round_half_up", signature = (values))]
pub fn round_half_up_py(values: Vec<f64>) -> Vec<f64> {
    round_half_up_all(&values)
}

/// Sampling indices `(rows, cols)` of the sub-window `location = (x, y, w, h)` in an image of
/// `image_size = (width, height)`
///
#[pyfunction]
#[pyo3(name = "subwindow_indices", signature = (location, image_size))]
pub fn subwindow_indices_py(
    location: (f32, f32, f32, f32),
    image_size: (usize, usize),
) -> PyResult<(Vec<usize>, Vec<usize>)> {
    let grid = SamplingGrid::build(&py_bbox(location)?, image_size.0, image_size.1)
        .map_err(to_py_err)?;
    Ok((grid.rows().to_vec(), grid.cols().to_vec()))
}

/// Patch `(r0, c0, r1, c1)` and its odd size `(rows, cols)` for a map of
/// `feature_size = (height, width)`
///
#[pyfunction]
#[pyo3(
    name = "patch_location",
    signature = (target_size, search_window, feature_size)
)]
pub fn patch_location_py(
    target_size: (f32, f32),
    search_window: (f32, f32, f32, f32),
    feature_size: (usize, usize),
) -> PyResult<((i64, i64, i64, i64), (i64, i64))> {
    let target = Size::new(target_size.0, target_size.1);
    let search = py_bbox(search_window)?;
    let (height, width) = feature_size;
    let loc = patch_location(&target, &search, height, width);
    let size = patch_size(&target, &search, height, width);
    Ok(((loc.r0, loc.c0, loc.r1, loc.c1), (size.x, size.y)))
}

#[pymodule]
#[pyo3(name = "trackfeat")]
fn trackfeat(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_function(wrap_pyfunction!(clamp_py, m)?)?;
    m.add_function(wrap_pyfunction!(round_half_up_py, m)?)?;
    m.add_function(wrap_pyfunction!(subwindow_indices_py, m)?)?;
    m.add_function(wrap_pyfunction!(patch_location_py, m)?)?;
    Ok(())
}
