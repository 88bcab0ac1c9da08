//! Status filter parsing.

use domain::OrderStatus;

/// Parses the optional status filter of an order listing.
///
/// Only the exact status names are recognised. Anything else, including a
/// blank value, means "no filter" rather than an error.
pub fn parse_status_filter(raw: Option<&str>) -> Option<OrderStatus> {
    let raw = raw?;
    match raw.parse() {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::debug!(filter = raw, error = %e, "ignoring unknown status filter");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses() {
        for status in OrderStatus::ALL {
            assert_eq!(parse_status_filter(Some(status.as_str())), Some(status));
        }
    }

    #[test]
    fn test_unknown_filter_is_ignored() {
        assert_eq!(parse_status_filter(None), None);
        assert_eq!(parse_status_filter(Some("")), None);
        assert_eq!(parse_status_filter(Some("Shipped")), None);
        assert_eq!(parse_status_filter(Some("packing")), None);
    }
}
