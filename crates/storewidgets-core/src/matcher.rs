use serde_json::Value;

/// A configured (variant, group) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantGroupEntry {
    pub variant_id: i64,
    pub group_id: i64,
}

/// Read-only accessor for the variant the host is currently showing.
/// `None` while the host has not resolved a selected variant.
pub trait CurrentVariant {
    fn current_variant(&self) -> Option<i64>;
}

/// Return the group of the first entry whose variant equals `current`.
/// Entries are scanned in order, so earlier duplicates win.
pub fn match_group(current: Option<i64>, entries: &[VariantGroupEntry]) -> Option<i64> {
    let current = current?;
    entries
        .iter()
        .find(|entry| entry.variant_id == current)
        .map(|entry| entry.group_id)
}

// Integral floats above this lose precision when cast.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Coerce a host-supplied value (number or numeric string) into an integer id.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        Some(f as i64)
    } else {
        None
    }
}
