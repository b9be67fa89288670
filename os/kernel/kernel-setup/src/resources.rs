use kernel_info::boot::{KernelImage, MachineDesc};
use kernel_memblock::{Memblock, Resource, ResourceFlags, ResourceTree};
use log::warn;

const IO_BUSY: ResourceFlags = ResourceFlags::IO.union(ResourceFlags::BUSY);

/// Legacy parallel port windows, claimed when the machine asks for them.
const LP_PORTS: [(u64, u64); 3] = [(0x3bc, 0x3be), (0x378, 0x37f), (0x278, 0x27f)];

fn image_part(name: &'static str, start: u64, end: u64) -> Option<Resource> {
    (end > start).then(|| Resource::busy_mem(name, start, end - start))
}

/// Publishes registered RAM, the kernel image, video memory and legacy
/// ports in the resource tree.
///
/// Conflicts are logged and the offending resource skipped.
pub fn request_standard_resources<M: Memblock + ?Sized, const N: usize>(
    memblock: &M,
    mdesc: &MachineDesc,
    image: &KernelImage,
    tree: &mut ResourceTree<N>,
) {
    let parts = [
        image_part("Kernel code", image.code_start, image.code_end),
        image_part("Kernel data", image.data_start, image.data_end),
    ];

    for region in memblock.memory_regions() {
        let ram = Resource::busy_mem("System RAM", region.base, region.size);
        let id = match tree.request(tree.iomem(), ram) {
            Ok(id) => id,
            Err(e) => {
                warn!("System RAM 0x{:08x}-0x{:08x}: {e}", ram.start, ram.end);
                continue;
            }
        };

        for part in parts.iter().flatten().copied() {
            if ram.contains(&part)
                && let Err(e) = tree.request(id, part)
            {
                warn!("{}: {e}", part.name);
            }
        }
    }

    if mdesc.has_video() {
        let video = Resource::new(
            "Video RAM",
            mdesc.video_start,
            mdesc.video_end,
            ResourceFlags::MEM,
        );
        if let Err(e) = tree.request(tree.iomem(), video) {
            warn!("Video RAM: {e}");
        }
    }

    let wanted = [mdesc.reserve_lp0, mdesc.reserve_lp1, mdesc.reserve_lp2];
    for (&(start, end), _) in LP_PORTS.iter().zip(wanted).filter(|(_, on)| *on) {
        if let Err(e) = tree.request(tree.ioport(), Resource::new("reserved", start, end, IO_BUSY)) {
            warn!("reserved 0x{start:x}-0x{end:x}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memblock::StaticMemblock;

    fn image() -> KernelImage {
        KernelImage {
            code_start: 0x4000_8000,
            code_end: 0x4040_0000,
            data_start: 0x4040_0000,
            data_end: 0x4050_0000,
        }
    }

    #[test]
    fn kernel_nests_inside_its_ram_region() {
        let mut m = StaticMemblock::<4>::new();
        m.add(0x4000_0000, 0x1000_0000).unwrap();
        m.add(0x8000_0000, 0x1000_0000).unwrap();
        let mut tree = ResourceTree::<16>::new();

        request_standard_resources(&m, &MachineDesc::generic("virt"), &image(), &mut tree);

        let rams: Vec<_> = tree.children(tree.iomem()).collect();
        assert_eq!(rams.len(), 2);
        let code = tree.find("Kernel code").unwrap();
        let data = tree.find("Kernel data").unwrap();
        assert_eq!(tree.parent(code), Some(rams[0]));
        assert_eq!(tree.parent(data), Some(rams[0]));
        assert_eq!(tree.get(code).unwrap().end, 0x403f_ffff);
        assert_eq!(tree.children(rams[1]).count(), 0);
        assert_eq!(tree.children(tree.ioport()).count(), 0);
    }

    #[test]
    fn video_and_parallel_ports() {
        let m = StaticMemblock::<4>::new();
        let mut mdesc = MachineDesc::generic("board");
        mdesc.video_start = 0x1000_0000;
        mdesc.video_end = 0x100f_ffff;
        mdesc.reserve_lp0 = true;
        mdesc.reserve_lp2 = true;
        let mut tree = ResourceTree::<16>::new();

        request_standard_resources(&m, &mdesc, &image(), &mut tree);

        let video = tree.find("Video RAM").unwrap();
        assert_eq!(tree.get(video).unwrap().flags, ResourceFlags::MEM);

        let ports: Vec<_> = tree
            .children(tree.ioport())
            .filter_map(|id| tree.get(id).map(|r| (r.start, r.end, r.name)))
            .collect();
        assert_eq!(ports, [(0x278, 0x27f, "reserved"), (0x3bc, 0x3be, "reserved")]);
    }
}
