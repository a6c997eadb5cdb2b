use crate::emitter::Emitter;

mod types;
use types::*;

// Minimal ELF emission, sufficient for very simple static Linux
// executables in both the 64-bit and 32-bit classes.

// Sources:
// * /usr/include/elf.h
// * https://en.wikipedia.org/wiki/Executable_and_Linkable_Format
// * http://www.sco.com/developers/gabi/latest/ch4.eheader.html

/// Virtual address the RX segment (headers + code) is loaded at.
pub const BASE_ADDR: u64 = 0x0404_8000;
/// Virtual address of the zero-filled cell array.
pub const BSS_ADDR: u64 = 0x0424_8000;
/// Size of the cell array.
pub const BSS_SIZE: u64 = 0x10000;

/// Section name string table: indexes 1, 7, and 17 are the sh_name
/// values used below.
const SHSTRTAB: &[u8] = b"\0.text\0.shstrtab\0.bss\0";
pub const SHSTRTAB_LEN: usize = 22;

const NSECTIONS: usize = 4;

/// File offset at which code starts; headers occupy everything before.
pub const HEADER64_SIZE: usize = EHDR64_SIZE + 2 * PHDR64_SIZE;
pub const HEADER32_SIZE: usize = EHDR32_SIZE + 2 * PHDR32_SIZE;

const FOOTER64_SIZE: usize = NSECTIONS * SHDR64_SIZE;
const FOOTER32_SIZE: usize = NSECTIONS * SHDR32_SIZE;

fn ident(class: u8) -> [u8; 16] {
    let mut id = [0u8; 16];
    id[..4].copy_from_slice(&ELFMAG);
    id[EI_CLASS] = class;
    id[EI_DATA] = ELFDATA2LSB;
    id[EI_VERSION] = 1;
    id[EI_OSABI] = ELFOSABI_LINUX;
    id
}

/// Append the string table and section table, then rewind and write the
/// ELF and program headers over the reserved region. The cursor is
/// expected to sit at the end of the code.
pub fn write_elf64(e: &mut Emitter, code_size: usize) {
    write_footer64(e, code_size);
    e.seek(0);
    write_header64(e, code_size);
}

pub fn write_elf32(e: &mut Emitter, code_size: usize) {
    write_footer32(e, code_size);
    e.seek(0);
    write_header32(e, code_size);
}

fn write_header64(e: &mut Emitter, code_size: usize) {
    let file_size = HEADER64_SIZE + code_size + SHSTRTAB_LEN + FOOTER64_SIZE;

    Elf64_Ehdr {
        e_ident: ident(ELFCLASS64),
        e_type: ET_EXEC,
        e_machine: EM_X86_64,
        e_version: 1,
        e_entry: BASE_ADDR + HEADER64_SIZE as u64,
        // Program headers immediately after the ELF header
        e_phoff: EHDR64_SIZE as u64,
        e_shoff: (HEADER64_SIZE + code_size + SHSTRTAB_LEN) as u64,
        e_flags: 0,
        e_ehsize: EHDR64_SIZE as u16,
        e_phentsize: PHDR64_SIZE as u16,
        e_phnum: 2,
        e_shentsize: SHDR64_SIZE as u16,
        e_shnum: NSECTIONS as u16,
        e_shstrndx: 1,
    }
    .write(e);

    // RX segment covering the whole file
    Elf64_Phdr {
        p_type: PT_LOAD,
        p_flags: PF_R | PF_X,
        p_offset: 0,
        p_vaddr: BASE_ADDR,
        p_paddr: BASE_ADDR,
        p_filesz: file_size as u64,
        p_memsz: file_size as u64,
        p_align: 0x1000,
    }
    .write(e);

    // Anonymous RW segment backing the cell array
    Elf64_Phdr {
        p_type: PT_LOAD,
        p_flags: PF_R | PF_W,
        p_offset: 0,
        p_vaddr: BSS_ADDR,
        p_paddr: BSS_ADDR,
        p_filesz: 0,
        p_memsz: BSS_SIZE,
        p_align: 0x1000,
    }
    .write(e);
}

fn write_footer64(e: &mut Emitter, code_size: usize) {
    e.put_bytes(SHSTRTAB);

    Elf64_Shdr {
        sh_type: SHT_NULL,
        ..Default::default()
    }
    .write(e);

    Elf64_Shdr {
        sh_name: 7,
        sh_type: SHT_STRTAB,
        sh_offset: (HEADER64_SIZE + code_size) as u64,
        sh_size: SHSTRTAB_LEN as u64,
        sh_addralign: 1,
        ..Default::default()
    }
    .write(e);

    Elf64_Shdr {
        sh_name: 1,
        sh_type: SHT_PROGBITS,
        sh_flags: SHF_EXECINSTR | SHF_ALLOC,
        sh_addr: BASE_ADDR + HEADER64_SIZE as u64,
        sh_offset: HEADER64_SIZE as u64,
        sh_size: code_size as u64,
        sh_addralign: 4,
        ..Default::default()
    }
    .write(e);

    Elf64_Shdr {
        sh_name: 17,
        sh_type: SHT_NOBITS,
        sh_flags: SHF_ALLOC | SHF_WRITE,
        sh_addr: BSS_ADDR,
        sh_offset: 0x1000,
        sh_size: BSS_SIZE,
        sh_addralign: 16,
        ..Default::default()
    }
    .write(e);
}

fn write_header32(e: &mut Emitter, code_size: usize) {
    let file_size = HEADER32_SIZE + code_size + SHSTRTAB_LEN + FOOTER32_SIZE;

    Elf32_Ehdr {
        e_ident: ident(ELFCLASS32),
        e_type: ET_EXEC,
        e_machine: EM_386,
        e_version: 1,
        e_entry: BASE_ADDR as u32 + HEADER32_SIZE as u32,
        e_phoff: EHDR32_SIZE as u32,
        e_shoff: (HEADER32_SIZE + code_size + SHSTRTAB_LEN) as u32,
        e_flags: 0,
        e_ehsize: EHDR32_SIZE as u16,
        e_phentsize: PHDR32_SIZE as u16,
        e_phnum: 2,
        e_shentsize: SHDR32_SIZE as u16,
        e_shnum: NSECTIONS as u16,
        e_shstrndx: 1,
    }
    .write(e);

    Elf32_Phdr {
        p_type: PT_LOAD,
        p_offset: 0,
        p_vaddr: BASE_ADDR as u32,
        p_paddr: BASE_ADDR as u32,
        p_filesz: file_size as u32,
        p_memsz: file_size as u32,
        p_flags: PF_R | PF_X,
        p_align: 0x1000,
    }
    .write(e);

    Elf32_Phdr {
        p_type: PT_LOAD,
        p_offset: 0,
        p_vaddr: BSS_ADDR as u32,
        p_paddr: BSS_ADDR as u32,
        p_filesz: 0,
        p_memsz: BSS_SIZE as u32,
        p_flags: PF_R | PF_W,
        p_align: 0x1000,
    }
    .write(e);
}

fn write_footer32(e: &mut Emitter, code_size: usize) {
    e.put_bytes(SHSTRTAB);

    Elf32_Shdr {
        sh_type: SHT_NULL,
        ..Default::default()
    }
    .write(e);

    Elf32_Shdr {
        sh_name: 7,
        sh_type: SHT_STRTAB,
        sh_offset: (HEADER32_SIZE + code_size) as u32,
        sh_size: SHSTRTAB_LEN as u32,
        sh_addralign: 1,
        ..Default::default()
    }
    .write(e);

    Elf32_Shdr {
        sh_name: 1,
        sh_type: SHT_PROGBITS,
        sh_flags: (SHF_EXECINSTR | SHF_ALLOC) as u32,
        sh_addr: BASE_ADDR as u32 + HEADER32_SIZE as u32,
        sh_offset: HEADER32_SIZE as u32,
        sh_size: code_size as u32,
        sh_addralign: 4,
        ..Default::default()
    }
    .write(e);

    Elf32_Shdr {
        sh_name: 17,
        sh_type: SHT_NOBITS,
        sh_flags: (SHF_ALLOC | SHF_WRITE) as u32,
        sh_addr: BSS_ADDR as u32,
        sh_offset: 0x1000,
        sh_size: BSS_SIZE as u32,
        sh_addralign: 16,
        ..Default::default()
    }
    .write(e);
}
