//! Bf2bin is an ahead-of-time brainfuck compiler that emits native
//! executables directly, with no assembler or linker involved: 64-bit
//! Linux ELF, 32-bit Linux ELF, and 64-bit Windows PE.
//!
//! # Examples
//! ```
//! extern crate bf2bin;
//!
//! fn main() {
//!     let image = bf2bin::compile(b"+++.", bf2bin::TargetKind::ElfX64).unwrap();
//!     assert!(image.starts_with(b"\x7fELF"));
//! }
//! ```

mod codegen;
mod compiler;
mod elf;
mod emitter;
mod pe;
mod target;
mod token;

pub use codegen::{CompileError, CompileErrorKind};
pub use compiler::{compile, run_executable, write_executable};
pub use emitter::{Emitter, Fixup};
pub use target::TargetKind;
