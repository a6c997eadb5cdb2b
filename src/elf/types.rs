#![allow(non_camel_case_types)]

use static_assertions::assert_eq_size;

use crate::emitter::Emitter;

pub type Elf64_Half = u16;
pub type Elf64_Word = u32;
pub type Elf64_Xword = u64;
pub type Elf64_Addr = u64;
pub type Elf64_Off = u64;

pub type Elf32_Half = u16;
pub type Elf32_Word = u32;
pub type Elf32_Addr = u32;
pub type Elf32_Off = u32;

pub const ELFMAG: [u8; 4] = *b"\x7fELF";
pub const ELFCLASS64: u8 = 2;
pub const ELFCLASS32: u8 = 1;
pub const ELFDATA2LSB: u8 = 1;
pub const ELFOSABI_LINUX: u8 = 3;

pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;
pub const EI_OSABI: usize = 7;

pub const ET_EXEC: u16 = 2;
pub const EM_X86_64: u16 = 62;
pub const EM_386: u16 = 3;
pub const PT_LOAD: u32 = 1;

pub const PF_X: u32 = 1 << 0;
pub const PF_W: u32 = 1 << 1;
pub const PF_R: u32 = 1 << 2;

pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOBITS: u32 = 8;

pub const SHF_WRITE: u64 = 1 << 0;
pub const SHF_ALLOC: u64 = 1 << 1;
pub const SHF_EXECINSTR: u64 = 1 << 2;

pub const EHDR64_SIZE: usize = 64;
pub const PHDR64_SIZE: usize = 56;
pub const SHDR64_SIZE: usize = 64;

pub const EHDR32_SIZE: usize = 52;
pub const PHDR32_SIZE: usize = 32;
pub const SHDR32_SIZE: usize = 40;

assert_eq_size!(ehdr64_size_assert; Elf64_Ehdr, [u8; EHDR64_SIZE]);
assert_eq_size!(phdr64_size_assert; Elf64_Phdr, [u8; PHDR64_SIZE]);
assert_eq_size!(shdr64_size_assert; Elf64_Shdr, [u8; SHDR64_SIZE]);
assert_eq_size!(ehdr32_size_assert; Elf32_Ehdr, [u8; EHDR32_SIZE]);
assert_eq_size!(phdr32_size_assert; Elf32_Phdr, [u8; PHDR32_SIZE]);
assert_eq_size!(shdr32_size_assert; Elf32_Shdr, [u8; SHDR32_SIZE]);

// ELF header
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Elf64_Ehdr {
    pub e_ident: [u8; 16],
    pub e_type: Elf64_Half,
    pub e_machine: Elf64_Half,
    pub e_version: Elf64_Word,
    pub e_entry: Elf64_Addr,
    pub e_phoff: Elf64_Off,
    pub e_shoff: Elf64_Off,
    pub e_flags: Elf64_Word,
    pub e_ehsize: Elf64_Half,
    pub e_phentsize: Elf64_Half,
    pub e_phnum: Elf64_Half,
    pub e_shentsize: Elf64_Half,
    pub e_shnum: Elf64_Half,
    pub e_shstrndx: Elf64_Half,
}

impl Elf64_Ehdr {
    pub fn write(&self, e: &mut Emitter) {
        e.put_bytes(&self.e_ident);
        e.put_u16(self.e_type);
        e.put_u16(self.e_machine);
        e.put_u32(self.e_version);
        e.put_u64(self.e_entry);
        e.put_u64(self.e_phoff);
        e.put_u64(self.e_shoff);
        e.put_u32(self.e_flags);
        e.put_u16(self.e_ehsize);
        e.put_u16(self.e_phentsize);
        e.put_u16(self.e_phnum);
        e.put_u16(self.e_shentsize);
        e.put_u16(self.e_shnum);
        e.put_u16(self.e_shstrndx);
    }
}

// Program header
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Elf64_Phdr {
    pub p_type: Elf64_Word,
    pub p_flags: Elf64_Word,
    pub p_offset: Elf64_Off,
    pub p_vaddr: Elf64_Addr,
    pub p_paddr: Elf64_Addr,
    pub p_filesz: Elf64_Xword,
    pub p_memsz: Elf64_Xword,
    pub p_align: Elf64_Xword,
}

impl Elf64_Phdr {
    pub fn write(&self, e: &mut Emitter) {
        e.put_u32(self.p_type);
        e.put_u32(self.p_flags);
        e.put_u64(self.p_offset);
        e.put_u64(self.p_vaddr);
        e.put_u64(self.p_paddr);
        e.put_u64(self.p_filesz);
        e.put_u64(self.p_memsz);
        e.put_u64(self.p_align);
    }
}

// Section header
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct Elf64_Shdr {
    pub sh_name: Elf64_Word,
    pub sh_type: Elf64_Word,
    pub sh_flags: Elf64_Xword,
    pub sh_addr: Elf64_Addr,
    pub sh_offset: Elf64_Off,
    pub sh_size: Elf64_Xword,
    pub sh_link: Elf64_Word,
    pub sh_info: Elf64_Word,
    pub sh_addralign: Elf64_Xword,
    pub sh_entsize: Elf64_Xword,
}

impl Elf64_Shdr {
    pub fn write(&self, e: &mut Emitter) {
        e.put_u32(self.sh_name);
        e.put_u32(self.sh_type);
        e.put_u64(self.sh_flags);
        e.put_u64(self.sh_addr);
        e.put_u64(self.sh_offset);
        e.put_u64(self.sh_size);
        e.put_u32(self.sh_link);
        e.put_u32(self.sh_info);
        e.put_u64(self.sh_addralign);
        e.put_u64(self.sh_entsize);
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Elf32_Ehdr {
    pub e_ident: [u8; 16],
    pub e_type: Elf32_Half,
    pub e_machine: Elf32_Half,
    pub e_version: Elf32_Word,
    pub e_entry: Elf32_Addr,
    pub e_phoff: Elf32_Off,
    pub e_shoff: Elf32_Off,
    pub e_flags: Elf32_Word,
    pub e_ehsize: Elf32_Half,
    pub e_phentsize: Elf32_Half,
    pub e_phnum: Elf32_Half,
    pub e_shentsize: Elf32_Half,
    pub e_shnum: Elf32_Half,
    pub e_shstrndx: Elf32_Half,
}

impl Elf32_Ehdr {
    pub fn write(&self, e: &mut Emitter) {
        e.put_bytes(&self.e_ident);
        e.put_u16(self.e_type);
        e.put_u16(self.e_machine);
        e.put_u32(self.e_version);
        e.put_u32(self.e_entry);
        e.put_u32(self.e_phoff);
        e.put_u32(self.e_shoff);
        e.put_u32(self.e_flags);
        e.put_u16(self.e_ehsize);
        e.put_u16(self.e_phentsize);
        e.put_u16(self.e_phnum);
        e.put_u16(self.e_shentsize);
        e.put_u16(self.e_shnum);
        e.put_u16(self.e_shstrndx);
    }
}

// Note the different field order from Elf64_Phdr: p_flags moved.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Elf32_Phdr {
    pub p_type: Elf32_Word,
    pub p_offset: Elf32_Off,
    pub p_vaddr: Elf32_Addr,
    pub p_paddr: Elf32_Addr,
    pub p_filesz: Elf32_Word,
    pub p_memsz: Elf32_Word,
    pub p_flags: Elf32_Word,
    pub p_align: Elf32_Word,
}

impl Elf32_Phdr {
    pub fn write(&self, e: &mut Emitter) {
        e.put_u32(self.p_type);
        e.put_u32(self.p_offset);
        e.put_u32(self.p_vaddr);
        e.put_u32(self.p_paddr);
        e.put_u32(self.p_filesz);
        e.put_u32(self.p_memsz);
        e.put_u32(self.p_flags);
        e.put_u32(self.p_align);
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct Elf32_Shdr {
    pub sh_name: Elf32_Word,
    pub sh_type: Elf32_Word,
    pub sh_flags: Elf32_Word,
    pub sh_addr: Elf32_Addr,
    pub sh_offset: Elf32_Off,
    pub sh_size: Elf32_Word,
    pub sh_link: Elf32_Word,
    pub sh_info: Elf32_Word,
    pub sh_addralign: Elf32_Word,
    pub sh_entsize: Elf32_Word,
}

impl Elf32_Shdr {
    pub fn write(&self, e: &mut Emitter) {
        e.put_u32(self.sh_name);
        e.put_u32(self.sh_type);
        e.put_u32(self.sh_flags);
        e.put_u32(self.sh_addr);
        e.put_u32(self.sh_offset);
        e.put_u32(self.sh_size);
        e.put_u32(self.sh_link);
        e.put_u32(self.sh_info);
        e.put_u32(self.sh_addralign);
        e.put_u32(self.sh_entsize);
    }
}
