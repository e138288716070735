use colored::Colorize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} failed due to {1} errors")]
    AggregatedErrors(String, usize),
}

/// Collects errors so a pass over the whole pipeline can report
/// every problem at once instead of stopping at the first.
pub struct Errors {
    errors: Vec<anyhow::Error>,
}

impl Default for Errors {
    fn default() -> Self {
        Self {
            // ideally we won't have any,
            // and we don't mind reallocating if we're already in an error state:
            errors: Vec::with_capacity(0),
        }
    }
}

impl Errors {
    pub fn add_context(&mut self, e: anyhow::Error, msg: String) {
        log::trace!("{msg}: {e:?}");
        self.errors.push(e.context(msg));
    }

    /// Print full list of errors to stderr, then fail if there were any.
    /// A single error is returned as is, so callers can still downcast it;
    /// more than one becomes an aggregated error.
    pub fn print_recap(self, label: &str) -> anyhow::Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        eprintln!("\nEncountered errors while {label}:\n");
        for e in &self.errors {
            eprintln!("{}: {e:?}\n", "ERROR".red());
        }
        let count = self.errors.len();
        let mut errors = self.errors;
        match errors.pop() {
            Some(e) if count == 1 => Err(e),
            _ => Err(Error::AggregatedErrors(label.to_owned(), count).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("bad input")]
    struct BadInput;

    #[test]
    fn test_recap() {
        assert!(Errors::default().print_recap("checking").is_ok());

        let mut errors = Errors::default();
        errors.add_context(anyhow::anyhow!("first"), "module a".to_owned());
        errors.add_context(anyhow::anyhow!("second"), "module b".to_owned());
        let err = errors.print_recap("checking").unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::AggregatedErrors(label, 2)) => assert_eq!(label, "checking"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_single_error_keeps_its_type() {
        let mut errors = Errors::default();
        errors.add_context(BadInput.into(), "module a".to_owned());
        let err = errors.print_recap("checking").unwrap_err();
        assert!(err.downcast_ref::<BadInput>().is_some());
        assert_eq!(err.to_string(), "module a");
    }
}
