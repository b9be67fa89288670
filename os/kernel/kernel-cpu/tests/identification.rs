use kernel_cpu::{
    CapabilitySet, CpuArchitecture, HwCap, RegisterSnapshot, classify_cache, identify,
    lookup_processor_type,
};

/// Cheap deterministic spread of 32-bit values.
fn sample_ids() -> impl Iterator<Item = u32> {
    (0..4096_u32).map(|i| i.wrapping_mul(0x9e37_79b9) ^ (i << 7))
}

#[test]
fn zero_scheme_field_always_unknown() {
    for raw in sample_ids() {
        let id = raw & !0x0008_f000;
        let regs = RegisterSnapshot {
            mmfr0: 0xffff_ffff,
            ..RegisterSnapshot::with_id(id)
        };
        assert_eq!(identify(&regs).architecture, CpuArchitecture::Unknown, "{id:08x}");
    }
}

#[test]
fn revised_scheme_thresholds() {
    for raw in sample_ids() {
        let id = raw | 0x000f_0000;
        for vmsa in 0..16_u32 {
            for pmsa in 0..16_u32 {
                let regs = RegisterSnapshot {
                    mmfr0: vmsa | (pmsa << 4),
                    ..RegisterSnapshot::with_id(id)
                };
                let arch = identify(&regs).architecture;
                let expected = if vmsa >= 3 || pmsa >= 3 {
                    CpuArchitecture::ARMv7
                } else if vmsa == 2 || pmsa == 2 {
                    CpuArchitecture::ARMv6
                } else {
                    CpuArchitecture::Unknown
                };
                assert_eq!(arch, expected, "{id:08x} vmsa={vmsa} pmsa={pmsa}");
            }
        }
    }
}

#[test]
fn divide_amplification_levels() {
    let divide_caps = HwCap::IDIVA | HwCap::IDIVT;
    let mut regs = RegisterSnapshot::cortex_a7();
    for divide in 0..16_u32 {
        regs.isar0 = divide << 24;
        let mut caps = CapabilitySet::default();
        caps.amplify(CpuArchitecture::ARMv7, &regs);

        let expected = match divide {
            1 => HwCap::IDIVT,
            2 => divide_caps,
            _ => HwCap::empty(),
        };
        assert_eq!(caps.hwcap & divide_caps, expected, "divide={divide}");
    }
}

#[test]
fn fixup_only_removes_and_is_idempotent() {
    let all = HwCap::all();
    for raw in sample_ids() {
        let regs = RegisterSnapshot {
            midr: raw,
            isar3: raw.rotate_left(8),
            isar4: raw.rotate_right(4),
            ..RegisterSnapshot::cortex_a7()
        };
        let start = CapabilitySet::new(HwCap::from_bits_truncate(raw) | HwCap::SWP | HwCap::TLS);

        let mut once = start;
        once.apply_fixup(&regs);
        assert!(start.hwcap.contains(once.hwcap), "{raw:08x} added capabilities");
        assert!(all.contains(once.hwcap));

        let mut twice = once;
        twice.apply_fixup(&regs);
        assert_eq!(once, twice, "{raw:08x}");
    }
}

#[test]
fn non_revised_id_keeps_swp() {
    // Decodes as ARMv7 through ID_MMFR0 on a revised core, but the same
    // feature registers under an architecture field of 7 must be ignored.
    let revised = RegisterSnapshot::cortex_a7();
    assert_eq!(identify(&revised).architecture, CpuArchitecture::ARMv7);

    let legacy = RegisterSnapshot {
        midr: 0x4107_c075,
        ..revised
    };
    let mut caps = CapabilitySet::new(HwCap::SWP);
    caps.apply_fixup(&legacy);
    assert!(caps.contains(HwCap::SWP));
}

#[test]
fn cortex_a7_full_probe() {
    let regs = RegisterSnapshot::cortex_a7();
    let identity = identify(&regs);
    let info = lookup_processor_type(identity.id).expect("supported");

    let mut caps = info.capabilities();
    caps.amplify(identity.architecture, &regs);
    caps.apply_config_mask(true);
    caps.apply_fixup(&regs);

    assert_eq!(caps.to_string(), "half thumb fastmult edsp tls idiva idivt lpae");

    let cache = classify_cache(identity.architecture, &regs).expect("known");
    assert!(cache.icache_aliasing());
}
