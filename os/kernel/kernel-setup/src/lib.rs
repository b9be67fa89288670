//! # Architecture Setup
//!
//! Brings the boot core from "running with a stack" to a described system:
//!
//! ```text
//!  setup_arch
//!   ├─ setup_processor      identify, capabilities, cache classification
//!   ├─ parse_early_params   mem=, fpe=
//!   ├─ Platform::paging_init
//!   ├─ request_standard_resources
//!   ├─ install CPU map + build MPIDR hash   (SMP)
//!   ├─ reserve_crashkernel
//!   └─ MachineDesc::init_early
//!
//!  customize_machine        MachineDesc::init_machine
//!  init_machine_late        MachineDesc::init_late
//! ```
//!
//! The result is a [`BootSystemInfo`] that later subsystems and secondary
//! cores read instead of global variables.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod cmdline;
mod crashkernel;
mod error;
mod processor;
mod resources;
mod setup;

pub use cmdline::{CommandLine, FpeType, MemParam, ParamError, memparse};
pub use crashkernel::{CrashKernelError, CrashKernelRequest, parse_crashkernel, reserve_crashkernel};
pub use error::SetupError;
pub use processor::{Endianness, PlatformName, ProcessorInfo, setup_processor};
pub use resources::request_standard_resources;
pub use setup::{
    BootSystemInfo, EarlyParams, Platform, SetupConfig, customize_machine, init_machine_late,
    parse_early_params, setup_arch,
};

/// Number of resources the boot resource tree can hold, roots included.
pub const RESOURCE_SLOTS: usize = 64;

/// The `iomem`/`ioport` trees built during setup.
pub type BootResources = kernel_memblock::ResourceTree<RESOURCE_SLOTS>;
