use crate::{WfError, WfResult};

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> WfResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(WfError::NonFinite { what, value: v })
    }
}

/// Relative change `|new - old| / |new|`, falling back to the absolute change
/// when `new` is zero.
pub fn relative_change(old: Real, new: Real) -> Real {
    let diff = (new - old).abs();
    if new == 0.0 { diff } else { diff / new.abs() }
}

/// Check `lo <= v <= hi`, naming the quantity on failure.
pub fn ensure_in_range(v: Real, lo: Real, hi: Real, what: &'static str) -> WfResult<Real> {
    let v = ensure_finite(v, what)?;
    if v < lo || v > hi {
        return Err(WfError::InvalidArg { what });
    }
    Ok(v)
}
