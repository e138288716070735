use std::fmt;

use crate::fs::Status;

use super::Error;

/// Where a module is in its run. Phases only move forward; `advance`
/// rejects anything the state machine doesn't allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unstarted,
    CheckingDependencies,
    DependenciesChecked,
    Executing,
    CleaningUp,
    Complete,
    Failed,
    PrecheckStarted,
    PrecheckComplete,
    PrecheckFailed,
}

impl Phase {
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Unstarted, CheckingDependencies)
                | (Unstarted, PrecheckStarted)
                | (CheckingDependencies, DependenciesChecked)
                | (CheckingDependencies, Failed)
                | (DependenciesChecked, Executing)
                | (DependenciesChecked, Failed)
                | (Executing, CleaningUp)
                | (CleaningUp, Complete)
                | (CleaningUp, Failed)
                | (PrecheckStarted, PrecheckComplete)
                | (PrecheckStarted, PrecheckFailed)
        )
    }

    pub fn advance(self, next: Phase) -> Result<Phase, Error> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(Error::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }

    /// The marker a module in this phase should have on disk.
    /// `None` means leave whatever is there.
    pub fn status(self) -> Option<Status> {
        match self {
            Self::Unstarted => None,
            Self::CheckingDependencies
            | Self::DependenciesChecked
            | Self::Executing
            | Self::CleaningUp => Some(Status::Started),
            Self::Complete => Some(Status::Complete),
            Self::Failed => Some(Status::Failed),
            Self::PrecheckStarted => Some(Status::PrecheckStarted),
            Self::PrecheckComplete => Some(Status::PrecheckComplete),
            Self::PrecheckFailed => Some(Status::PrecheckFailed),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_path() -> Result<(), Error> {
        let phase = Phase::Unstarted
            .advance(Phase::CheckingDependencies)?
            .advance(Phase::DependenciesChecked)?
            .advance(Phase::Executing)?
            .advance(Phase::CleaningUp)?
            .advance(Phase::Complete)?;
        assert_eq!(phase.status(), Some(Status::Complete));
        Ok(())
    }

    #[test]
    fn test_precheck_never_executes() {
        let phase = Phase::PrecheckStarted;
        assert!(phase.can_advance_to(Phase::PrecheckComplete));
        assert!(!phase.can_advance_to(Phase::Executing));
        assert!(!Phase::PrecheckComplete.can_advance_to(Phase::Executing));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(Phase::Unstarted.advance(Phase::Executing).is_err());
        assert!(Phase::Executing.advance(Phase::Complete).is_err());
        assert!(Phase::Complete.advance(Phase::Executing).is_err());
        assert!(Phase::Failed.advance(Phase::CleaningUp).is_err());
    }
}
