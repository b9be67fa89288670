use kernel_cpu::FatalPrecondition;

/// Reasons architecture setup stops.
///
/// Everything else that can go wrong during setup is logged and skipped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Fatal(#[from] FatalPrecondition),
}
