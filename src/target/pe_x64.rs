use super::{LoopHead, Target};
use crate::emitter::{Emitter, Fixup};
use crate::pe;

/// x86-64 Windows. Cells are addressed through `rbx`; console I/O goes
/// through `msvcrt.dll` (`putchar` in `rsi`, `getchar` in `rdi`, `exit`
/// loaded in the epilogue), calls wrapped in the Win64 32-byte shadow
/// space. The prologue and epilogue leave four address slots behind;
/// the container pass fills them from the import table layout.
pub struct PeX64 {
    timestamp: u32,
    putchar_slot: Option<Fixup>,
    getchar_slot: Option<Fixup>,
    bss_slot: Option<Fixup>,
    exit_slot: Option<Fixup>,
}

impl PeX64 {
    pub fn new(timestamp: u32) -> PeX64 {
        PeX64 {
            timestamp,
            putchar_slot: None,
            getchar_slot: None,
            bss_slot: None,
            exit_slot: None,
        }
    }
}

fn patch_slot(e: &mut Emitter, slot: Option<Fixup>, value: u32) {
    if let Some(fixup) = slot {
        e.patch_u32(fixup, value);
    }
}

impl Target for PeX64 {
    fn header_size(&self) -> usize {
        pe::CODE_OFFSET
    }

    fn prologue(&mut self, e: &mut Emitter) {
        // push rsi; push rdi; push rbp
        e.put_bytes(&[0x56, 0x57, 0x55]);
        // mov rsi, ds:[putchar IAT entry]
        e.put_bytes(&[0x48, 0x8b, 0x34, 0x25]);
        self.putchar_slot = Some(e.reserve_u32());
        // mov rdi, ds:[getchar IAT entry]
        e.put_bytes(&[0x48, 0x8b, 0x3c, 0x25]);
        self.getchar_slot = Some(e.reserve_u32());
        // mov rbx, bss base
        e.put_bytes(&[0x48, 0xc7, 0xc3]);
        self.bss_slot = Some(e.reserve_u32());
    }

    fn epilogue(&mut self, e: &mut Emitter) {
        // pop rbp; pop rdi; pop rsi
        e.put_bytes(&[0x5d, 0x5f, 0x5e]);
        // xor ecx, ecx
        e.put_bytes(&[0x31, 0xc9]);
        // mov rsi, ds:[exit IAT entry]
        e.put_bytes(&[0x48, 0x8b, 0x34, 0x25]);
        self.exit_slot = Some(e.reserve_u32());
        // sub rsp, 0x20
        e.put_bytes(&[0x48, 0x83, 0xec, 0x20]);
        // call rsi
        e.put_bytes(&[0xff, 0xd6]);
    }

    fn ptr_add(&mut self, e: &mut Emitter, count: u32) {
        if count > 127 {
            // add rbx, imm32
            e.put_bytes(&[0x48, 0x81, 0xc3]);
            e.put_u32(count);
        } else if count > 1 {
            // add rbx, imm8
            e.put_bytes(&[0x48, 0x83, 0xc3, count as u8]);
        } else {
            // inc rbx
            e.put_bytes(&[0x48, 0xff, 0xc3]);
        }
    }

    fn ptr_sub(&mut self, e: &mut Emitter, count: u32) {
        if count > 127 {
            // sub rbx, imm32
            e.put_bytes(&[0x48, 0x81, 0xeb]);
            e.put_u32(count);
        } else if count > 1 {
            // sub rbx, imm8
            e.put_bytes(&[0x48, 0x83, 0xeb, count as u8]);
        } else {
            // dec rbx
            e.put_bytes(&[0x48, 0xff, 0xcb]);
        }
    }

    fn cell_add(&mut self, e: &mut Emitter, count: u8) {
        if count > 1 {
            // add byte [rbx], imm8
            e.put_bytes(&[0x80, 0x03, count]);
        } else if count == 1 {
            // inc byte [rbx]
            e.put_bytes(&[0xfe, 0x03]);
        }
    }

    fn cell_sub(&mut self, e: &mut Emitter, count: u8) {
        if count > 1 {
            // sub byte [rbx], imm8
            e.put_bytes(&[0x80, 0x2b, count]);
        } else if count == 1 {
            // dec byte [rbx]
            e.put_bytes(&[0xfe, 0x0b]);
        }
    }

    fn output(&mut self, e: &mut Emitter) {
        // mov rcx, [rbx]
        e.put_bytes(&[0x48, 0x8b, 0x0b]);
        // sub rsp, 0x20; call rsi; add rsp, 0x20
        e.put_bytes(&[0x48, 0x83, 0xec, 0x20]);
        e.put_bytes(&[0xff, 0xd6]);
        e.put_bytes(&[0x48, 0x83, 0xc4, 0x20]);
    }

    fn input(&mut self, e: &mut Emitter) {
        // sub rsp, 0x20; call rdi; add rsp, 0x20
        e.put_bytes(&[0x48, 0x83, 0xec, 0x20]);
        e.put_bytes(&[0xff, 0xd7]);
        e.put_bytes(&[0x48, 0x83, 0xc4, 0x20]);
        // mov byte [rbx], al
        e.put_bytes(&[0x88, 0x03]);
    }

    fn clear_cell(&mut self, e: &mut Emitter) {
        // mov byte [rbx], 0
        e.put_bytes(&[0xc6, 0x03, 0x00]);
    }

    fn loop_head(&mut self, e: &mut Emitter) -> LoopHead {
        let cmp_pos = e.pos();
        // cmp byte [rbx], 0
        e.put_bytes(&[0x80, 0x3b, 0x00]);
        // je rel32, resolved at the matching ']'
        e.put_bytes(&[0x0f, 0x84]);
        let disp = e.reserve_u32();
        LoopHead { cmp_pos, disp }
    }

    fn write_container(&mut self, e: &mut Emitter, code_size: usize) {
        let layout = pe::Layout::new(code_size);
        // zero padding up to the code alignment; the cursor sits at the
        // end of the epilogue
        e.skip(layout.aligned_code as usize - code_size);
        e.seek(0);
        pe::write_header(e, code_size, self.timestamp);
        pe::write_idata(e, code_size, self.timestamp);

        patch_slot(e, self.putchar_slot, layout.iat_entry_addr(0));
        patch_slot(e, self.getchar_slot, layout.iat_entry_addr(1));
        patch_slot(e, self.exit_slot, layout.iat_entry_addr(2));
        patch_slot(e, self.bss_slot, layout.bss_addr());
    }
}

#[cfg(test)]
mod tests {
    use crate::compile;
    use crate::pe;
    use crate::target::TargetKind;

    fn read_u32(image: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            image[offset],
            image[offset + 1],
            image[offset + 2],
            image[offset + 3],
        ])
    }

    #[test]
    fn prologue_slots_are_patched_from_the_import_layout() {
        let image = compile(b"+.", TargetKind::PeX64).unwrap();
        let code = pe::CODE_OFFSET;
        let layout = pe::Layout::new(image.len() - code);

        assert_eq!(&image[code..code + 7], &[0x56, 0x57, 0x55, 0x48, 0x8b, 0x34, 0x25]);
        assert_eq!(read_u32(&image, code + 7), layout.iat_entry_addr(0));
        assert_eq!(read_u32(&image, code + 15), layout.iat_entry_addr(1));
        assert_eq!(read_u32(&image, code + 22), layout.bss_addr());
    }

    #[test]
    fn epilogue_calls_imported_exit() {
        let image = compile(b"", TargetKind::PeX64).unwrap();
        let code = pe::CODE_OFFSET;
        let layout = pe::Layout::new(image.len() - code);
        // prologue is 26 bytes; epilogue follows immediately
        let epilogue = code + 26;
        assert_eq!(
            &image[epilogue..epilogue + 9],
            &[0x5d, 0x5f, 0x5e, 0x31, 0xc9, 0x48, 0x8b, 0x34, 0x25]
        );
        assert_eq!(read_u32(&image, epilogue + 9), layout.iat_entry_addr(2));
        assert_eq!(
            &image[epilogue + 13..epilogue + 19],
            &[0x48, 0x83, 0xec, 0x20, 0xff, 0xd6]
        );
    }

    #[test]
    fn io_wraps_calls_in_shadow_space() {
        let image = compile(b",.", TargetKind::PeX64).unwrap();
        let code = pe::CODE_OFFSET + 26;
        // ',' calls getchar and stores al
        assert_eq!(
            &image[code..code + 12],
            &[0x48, 0x83, 0xec, 0x20, 0xff, 0xd7, 0x48, 0x83, 0xc4, 0x20, 0x88, 0x03]
        );
        // '.' loads the cell and calls putchar
        assert_eq!(
            &image[code + 12..code + 25],
            &[0x48, 0x8b, 0x0b, 0x48, 0x83, 0xec, 0x20, 0xff, 0xd6, 0x48, 0x83, 0xc4, 0x20]
        );
    }

    #[test]
    fn clear_loop_stores_zero_immediate() {
        let image = compile(b"+++++[-]", TargetKind::PeX64).unwrap();
        let code = pe::CODE_OFFSET + 26;
        // add byte [rbx], 5 then mov byte [rbx], 0, straight to the epilogue
        assert_eq!(
            &image[code..code + 6],
            &[0x80, 0x03, 0x05, 0xc6, 0x03, 0x00]
        );
        assert_eq!(image[code + 6], 0x5d);
    }
}
