//! # Machine Description

/// How the platform should perform a reset.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RebootMode {
    #[default]
    Cold,
    Warm,
    Hard,
    Soft,
    Gpio,
}

/// Platform restart hook.
pub type RestartFn = fn(RebootMode, Option<&str>);

/// Platform initialization hook.
pub type InitHookFn = fn();

/// Board description resolved from the boot hardware descriptor.
///
/// Produced by the descriptor parser before bring-up starts and treated as
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct MachineDesc {
    /// Human-readable board name.
    pub name: &'static str,

    /// Restart handler installed as the system reset hook, if any.
    pub restart: Option<RestartFn>,

    /// Mode passed to [`restart`](Self::restart) unless overridden.
    pub reboot_mode: RebootMode,

    /// Runs at the very end of architecture setup.
    pub init_early: Option<InitHookFn>,

    /// Runs once the driver model is available.
    pub init_machine: Option<InitHookFn>,

    /// Runs after all initcalls.
    pub init_late: Option<InitHookFn>,

    /// Reserve the legacy parallel port at `0x3bc..=0x3be`.
    pub reserve_lp0: bool,

    /// Reserve the legacy parallel port at `0x378..=0x37f`.
    pub reserve_lp1: bool,

    /// Reserve the legacy parallel port at `0x278..=0x27f`.
    pub reserve_lp2: bool,

    /// Physical start of the video memory window, or 0.
    pub video_start: u64,

    /// Physical end (inclusive) of the video memory window.
    pub video_end: u64,
}

impl MachineDesc {
    /// A descriptor with no hooks and no reservations.
    #[must_use]
    pub const fn generic(name: &'static str) -> Self {
        Self {
            name,
            restart: None,
            reboot_mode: RebootMode::Cold,
            init_early: None,
            init_machine: None,
            init_late: None,
            reserve_lp0: false,
            reserve_lp1: false,
            reserve_lp2: false,
            video_start: 0,
            video_end: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn has_video(&self) -> bool {
        self.video_start != 0
    }
}

/// Physical extents of the loaded kernel image, end addresses exclusive.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct KernelImage {
    pub code_start: u64,
    pub code_end: u64,
    pub data_start: u64,
    pub data_end: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_machine_reserves_nothing() {
        let m = MachineDesc::generic("Generic DT based system");
        assert!(!m.reserve_lp0 && !m.reserve_lp1 && !m.reserve_lp2);
        assert!(!m.has_video());
        assert!(m.restart.is_none());
    }
}
