//! The utilities module provides general capabilities, that span the
//! models, dynamics, simulator and output modules.  The utilities are
//! centered around error reporting and logging.

pub mod errors;
pub mod logging;

/// Formats a time for log and error messages, spelling out the
/// infinities the way modelers write them.
pub fn format_time(time: f64) -> String {
    if time == f64::INFINITY {
        String::from("+inf")
    } else if time == f64::NEG_INFINITY {
        String::from("-inf")
    } else {
        format!("{}", time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_infinities() {
        assert_eq!("+inf", format_time(f64::INFINITY));
        assert_eq!("-inf", format_time(f64::NEG_INFINITY));
        assert_eq!("1.5", format_time(1.5));
    }
}
