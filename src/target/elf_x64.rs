use super::{LoopHead, Target};
use crate::elf;
use crate::emitter::Emitter;

/// x86-64 Linux. The cell pointer lives in `rsi` so it doubles as the
/// buffer argument of the read/write syscalls, and `edx` stays 1 as the
/// length argument. `dh == 0` as a consequence, which backs the short
/// `cmp [rsi], dh` / `mov [rsi], dh` encodings.
pub struct ElfX64;

impl Target for ElfX64 {
    fn header_size(&self) -> usize {
        elf::HEADER64_SIZE
    }

    fn prologue(&mut self, e: &mut Emitter) {
        // movabs rsi, BSS_ADDR
        e.put_bytes(&[0x48, 0xbe]);
        e.put_u64(elf::BSS_ADDR);
        // mov edx, 1
        e.put_u8(0xba);
        e.put_u32(1);
    }

    fn epilogue(&mut self, e: &mut Emitter) {
        // mov eax, 60 (exit_group)
        e.put_u8(0xb8);
        e.put_u32(60);
        // xor edi, edi
        e.put_bytes(&[0x31, 0xff]);
        // syscall
        e.put_bytes(&[0x0f, 0x05]);
    }

    fn ptr_add(&mut self, e: &mut Emitter, count: u32) {
        if count > 127 {
            // add rsi, imm32
            e.put_bytes(&[0x48, 0x81, 0xc6]);
            e.put_u32(count);
        } else if count > 1 {
            // add rsi, imm8
            e.put_bytes(&[0x48, 0x83, 0xc6, count as u8]);
        } else {
            // inc rsi
            e.put_bytes(&[0x48, 0xff, 0xc6]);
        }
    }

    fn ptr_sub(&mut self, e: &mut Emitter, count: u32) {
        if count > 127 {
            // sub rsi, imm32
            e.put_bytes(&[0x48, 0x81, 0xee]);
            e.put_u32(count);
        } else if count > 1 {
            // sub rsi, imm8
            e.put_bytes(&[0x48, 0x83, 0xee, count as u8]);
        } else {
            // dec rsi
            e.put_bytes(&[0x48, 0xff, 0xce]);
        }
    }

    fn cell_add(&mut self, e: &mut Emitter, count: u8) {
        if count > 1 {
            // add byte [rsi], imm8
            e.put_bytes(&[0x80, 0x06, count]);
        } else if count == 1 {
            // inc byte [rsi]
            e.put_bytes(&[0xfe, 0x06]);
        }
    }

    fn cell_sub(&mut self, e: &mut Emitter, count: u8) {
        if count > 1 {
            // sub byte [rsi], imm8
            e.put_bytes(&[0x80, 0x2e, count]);
        } else if count == 1 {
            // dec byte [rsi]
            e.put_bytes(&[0xfe, 0x0e]);
        }
    }

    fn output(&mut self, e: &mut Emitter) {
        // mov eax, edx; mov edi, edx  (write = 1, fd = 1)
        e.put_bytes(&[0x89, 0xd0, 0x89, 0xd7]);
        // syscall
        e.put_bytes(&[0x0f, 0x05]);
    }

    fn input(&mut self, e: &mut Emitter) {
        // xor eax, eax; xor edi, edi  (read = 0, fd = 0)
        e.put_bytes(&[0x31, 0xc0, 0x31, 0xff]);
        // syscall
        e.put_bytes(&[0x0f, 0x05]);
    }

    fn clear_cell(&mut self, e: &mut Emitter) {
        // mov byte [rsi], dh
        e.put_bytes(&[0x88, 0x36]);
    }

    fn loop_head(&mut self, e: &mut Emitter) -> LoopHead {
        let cmp_pos = e.pos();
        // cmp byte [rsi], dh
        e.put_bytes(&[0x38, 0x36]);
        // je rel32, resolved at the matching ']'
        e.put_bytes(&[0x0f, 0x84]);
        let disp = e.reserve_u32();
        LoopHead { cmp_pos, disp }
    }

    fn write_container(&mut self, e: &mut Emitter, code_size: usize) {
        elf::write_elf64(e, code_size);
    }
}

#[cfg(test)]
mod tests {
    use crate::compile;
    use crate::elf;
    use crate::target::TargetKind;

    #[test]
    fn lowering_of_add_output_program() {
        let image = compile(b"+++.", TargetKind::ElfX64).unwrap();
        let code = &image[elf::HEADER64_SIZE..];
        let expected: &[u8] = &[
            0x48, 0xbe, 0x00, 0x80, 0x24, 0x04, 0x00, 0x00, 0x00, 0x00, // movabs rsi, 0x04248000
            0xba, 0x01, 0x00, 0x00, 0x00, // mov edx, 1
            0x80, 0x06, 0x03, // add byte [rsi], 3
            0x89, 0xd0, 0x89, 0xd7, 0x0f, 0x05, // mov eax, edx; mov edi, edx; syscall
            0xb8, 0x3c, 0x00, 0x00, 0x00, // mov eax, 60
            0x31, 0xff, // xor edi, edi
            0x0f, 0x05, // syscall
        ];
        assert_eq!(&code[..expected.len()], expected);
    }

    #[test]
    fn pointer_runs_pick_immediate_width() {
        let image = compile(b">", TargetKind::ElfX64).unwrap();
        assert_eq!(
            &image[elf::HEADER64_SIZE + 15..][..3],
            &[0x48, 0xff, 0xc6]
        );

        let image = compile(&vec![b'>'; 5], TargetKind::ElfX64).unwrap();
        assert_eq!(
            &image[elf::HEADER64_SIZE + 15..][..4],
            &[0x48, 0x83, 0xc6, 0x05]
        );

        let image = compile(&vec![b'<'; 200], TargetKind::ElfX64).unwrap();
        assert_eq!(
            &image[elf::HEADER64_SIZE + 15..][..7],
            &[0x48, 0x81, 0xee, 200, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn io_uses_length_register_invariant() {
        let image = compile(b",.", TargetKind::ElfX64).unwrap();
        let code = &image[elf::HEADER64_SIZE + 15..];
        assert_eq!(&code[..6], &[0x31, 0xc0, 0x31, 0xff, 0x0f, 0x05]);
        assert_eq!(&code[6..12], &[0x89, 0xd0, 0x89, 0xd7, 0x0f, 0x05]);
    }
}
