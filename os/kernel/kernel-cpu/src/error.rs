/// Conditions under which bring-up cannot continue.
///
/// There is no fallback identification path and no safe way to run without
/// exception stacks, so callers report these and halt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalPrecondition {
    #[error("unable to determine CPU architecture (ID {id:08x})")]
    UnknownArchitecture { id: u32 },
    #[error("CPU configuration botched (ID {id:08x}), unable to continue")]
    UnsupportedProcessor { id: u32 },
    #[error("CPU{core}: bad primary CPU number (table holds {capacity})")]
    CoreIndexOutOfRange { core: usize, capacity: usize },
}
