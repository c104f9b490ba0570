use crate::{
    error::{Error, ErrorKind},
    spec::ElementType,
    state::{ContextType, State},
};

impl Error {
    pub(crate) fn invalid_state(operation: &'static str, actual: State, valid: &[State]) -> Self {
        ErrorKind::InvalidState {
            operation,
            actual,
            valid: valid.to_vec(),
        }
        .into()
    }

    pub(crate) fn invalid_context(
        operation: &'static str,
        actual: ContextType,
        valid: &[ContextType],
    ) -> Self {
        ErrorKind::InvalidContext {
            operation,
            actual,
            valid: valid.to_vec(),
        }
        .into()
    }

    pub(crate) fn unexpected_type(
        operation: &'static str,
        expected: ElementType,
        actual: ElementType,
    ) -> Self {
        ErrorKind::UnexpectedType {
            operation,
            expected,
            actual,
        }
        .into()
    }

    pub(crate) fn closed(operation: &'static str) -> Self {
        ErrorKind::Closed { operation }.into()
    }

    #[cfg(test)]
    pub(crate) fn is_invalid_state(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidState { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_invalid_context(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidContext { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_unexpected_type(&self) -> bool {
        matches!(self.kind, ErrorKind::UnexpectedType { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        matches!(self.kind, ErrorKind::Closed { .. })
    }
}
