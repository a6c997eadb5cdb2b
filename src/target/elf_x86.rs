use super::{LoopHead, Target};
use crate::elf;
use crate::emitter::Emitter;

/// i386 Linux. The cell pointer lives in `ecx` (the int 0x80 buffer
/// argument) and `edx` stays 1 as the length argument. For programs
/// that never read input, the write-syscall setup (`eax = 4`,
/// `ebx = 1`) is hoisted into the prologue so each `.` is a bare
/// `int 0x80`.
pub struct ElfX86 {
    output_only: bool,
}

impl ElfX86 {
    pub fn new(output_only: bool) -> ElfX86 {
        ElfX86 { output_only }
    }

    fn write_setup(&self, e: &mut Emitter) {
        // mov eax, 4 (write)
        e.put_u8(0xb8);
        e.put_u32(4);
        // mov ebx, edx (fd = 1)
        e.put_bytes(&[0x89, 0xd3]);
    }
}

impl Target for ElfX86 {
    fn header_size(&self) -> usize {
        elf::HEADER32_SIZE
    }

    fn prologue(&mut self, e: &mut Emitter) {
        // mov ecx, BSS_ADDR
        e.put_u8(0xb9);
        e.put_u32(elf::BSS_ADDR as u32);
        // mov edx, 1
        e.put_u8(0xba);
        e.put_u32(1);
        if self.output_only {
            self.write_setup(e);
        }
    }

    fn epilogue(&mut self, e: &mut Emitter) {
        // mov eax, edx (exit = 1)
        e.put_bytes(&[0x89, 0xd0]);
        // xor ebx, ebx
        e.put_bytes(&[0x31, 0xdb]);
        // int 0x80
        e.put_bytes(&[0xcd, 0x80]);
    }

    fn ptr_add(&mut self, e: &mut Emitter, count: u32) {
        if count > 127 {
            // add ecx, imm32
            e.put_bytes(&[0x81, 0xc1]);
            e.put_u32(count);
        } else if count > 1 {
            // add ecx, imm8
            e.put_bytes(&[0x83, 0xc1, count as u8]);
        } else {
            // inc ecx
            e.put_u8(0x41);
        }
    }

    fn ptr_sub(&mut self, e: &mut Emitter, count: u32) {
        if count > 127 {
            // sub ecx, imm32
            e.put_bytes(&[0x81, 0xe9]);
            e.put_u32(count);
        } else if count > 1 {
            // sub ecx, imm8
            e.put_bytes(&[0x83, 0xe9, count as u8]);
        } else {
            // dec ecx
            e.put_u8(0x49);
        }
    }

    fn cell_add(&mut self, e: &mut Emitter, count: u8) {
        if count > 1 {
            // add byte [ecx], imm8
            e.put_bytes(&[0x80, 0x01, count]);
        } else if count == 1 {
            // inc byte [ecx]
            e.put_bytes(&[0xfe, 0x01]);
        }
    }

    fn cell_sub(&mut self, e: &mut Emitter, count: u8) {
        if count > 1 {
            // sub byte [ecx], imm8
            e.put_bytes(&[0x80, 0x29, count]);
        } else if count == 1 {
            // dec byte [ecx]
            e.put_bytes(&[0xfe, 0x09]);
        }
    }

    fn output(&mut self, e: &mut Emitter) {
        if !self.output_only {
            self.write_setup(e);
        }
        // int 0x80
        e.put_bytes(&[0xcd, 0x80]);
    }

    fn input(&mut self, e: &mut Emitter) {
        // mov eax, 3 (read)
        e.put_u8(0xb8);
        e.put_u32(3);
        // xor ebx, ebx (fd = 0)
        e.put_bytes(&[0x31, 0xdb]);
        // int 0x80
        e.put_bytes(&[0xcd, 0x80]);
    }

    fn clear_cell(&mut self, e: &mut Emitter) {
        // mov byte [ecx], dh
        e.put_bytes(&[0x88, 0x31]);
    }

    fn loop_head(&mut self, e: &mut Emitter) -> LoopHead {
        let cmp_pos = e.pos();
        // cmp byte [ecx], dh
        e.put_bytes(&[0x38, 0x31]);
        // je rel32, resolved at the matching ']'
        e.put_bytes(&[0x0f, 0x84]);
        let disp = e.reserve_u32();
        LoopHead { cmp_pos, disp }
    }

    fn write_container(&mut self, e: &mut Emitter, code_size: usize) {
        elf::write_elf32(e, code_size);
    }
}

#[cfg(test)]
mod tests {
    use crate::compile;
    use crate::elf;
    use crate::target::TargetKind;

    #[test]
    fn output_only_program_hoists_write_setup() {
        let image = compile(b".", TargetKind::ElfX86).unwrap();
        let code = &image[elf::HEADER32_SIZE..];
        let expected: &[u8] = &[
            0xb9, 0x00, 0x80, 0x24, 0x04, // mov ecx, 0x04248000
            0xba, 0x01, 0x00, 0x00, 0x00, // mov edx, 1
            0xb8, 0x04, 0x00, 0x00, 0x00, // mov eax, 4
            0x89, 0xd3, // mov ebx, edx
            0xcd, 0x80, // int 0x80 (the entire '.')
            0x89, 0xd0, // mov eax, edx
            0x31, 0xdb, // xor ebx, ebx
            0xcd, 0x80, // int 0x80
        ];
        assert_eq!(&code[..expected.len()], expected);
    }

    #[test]
    fn mixed_io_program_reloads_syscall_number() {
        let image = compile(b",.", TargetKind::ElfX86).unwrap();
        let code = &image[elf::HEADER32_SIZE + 10..];
        // ',' = read
        assert_eq!(
            &code[..9],
            &[0xb8, 0x03, 0x00, 0x00, 0x00, 0x31, 0xdb, 0xcd, 0x80]
        );
        // '.' sets up write before trapping
        assert_eq!(
            &code[9..18],
            &[0xb8, 0x04, 0x00, 0x00, 0x00, 0x89, 0xd3, 0xcd, 0x80]
        );
    }

    #[test]
    fn pointer_encodings_use_short_forms() {
        let image = compile(b"><", TargetKind::ElfX86).unwrap();
        let code = &image[elf::HEADER32_SIZE + 17..];
        assert_eq!(&code[..2], &[0x41, 0x49]);
    }

    #[test]
    fn clear_loop_stores_zero_through_dh() {
        let image = compile(b"+++++[-]", TargetKind::ElfX86).unwrap();
        let code = &image[elf::HEADER32_SIZE + 17..];
        // add byte [ecx], 5 then mov [ecx], dh, straight to the epilogue
        assert_eq!(&code[..5], &[0x80, 0x01, 0x05, 0x88, 0x31]);
        assert_eq!(code[5], 0x89);
    }
}
