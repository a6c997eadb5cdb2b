use std::fs::File;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::codegen::{generate, CompileError};
use crate::emitter::Emitter;
use crate::target::{ElfX64, ElfX86, PeX64, Target, TargetKind};
use crate::token::{normalize, Normalized};

/// Compiles brainfuck source into a complete executable image for the
/// chosen format.
pub fn compile(source: &[u8], kind: TargetKind) -> Result<Vec<u8>, CompileError> {
    let norm = normalize(source);
    match kind {
        TargetKind::ElfX64 => compile_with(&mut ElfX64, source, &norm),
        TargetKind::ElfX86 => compile_with(&mut ElfX86::new(norm.is_output_only()), source, &norm),
        TargetKind::PeX64 => compile_with(&mut PeX64::new(unix_timestamp()), source, &norm),
    }
}

fn compile_with<T: Target>(
    target: &mut T,
    source: &[u8],
    norm: &Normalized,
) -> Result<Vec<u8>, CompileError> {
    let mut e = Emitter::new();
    e.skip(target.header_size());
    generate(target, &mut e, source, norm)?;
    let code_size = e.pos() - target.header_size();
    target.write_container(&mut e, code_size);
    Ok(e.into_bytes())
}

fn unix_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Writes the image to `path` in binary mode, marking it executable
/// (mode 0755) for the ELF formats.
pub fn write_executable(path: &str, image: &[u8], kind: TargetKind) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(image)?;
    if kind.is_elf() {
        let mut permissions = file.metadata()?.permissions();
        permissions.set_mode(0o755);
        file.set_permissions(permissions)?;
    }
    Ok(())
}

/// Runs the compiled executable as a child process and returns its exit
/// status. A child killed by a signal reports status 1.
pub fn run_executable(path: &str) -> io::Result<i32> {
    let path = if path.contains('/') {
        path.to_string()
    } else {
        format!("./{}", path)
    };
    let status = Command::new(path).status()?;
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_format_yields_its_magic() {
        assert!(compile(b"+.", TargetKind::ElfX64)
            .unwrap()
            .starts_with(b"\x7fELF"));
        assert!(compile(b"+.", TargetKind::ElfX86)
            .unwrap()
            .starts_with(b"\x7fELF"));
        assert!(compile(b"+.", TargetKind::PeX64).unwrap().starts_with(b"MZ"));
    }

    #[test]
    fn empty_source_is_a_valid_program() {
        for &kind in &[TargetKind::ElfX64, TargetKind::ElfX86, TargetKind::PeX64] {
            assert!(compile(b"", kind).is_ok());
        }
    }

    #[test]
    fn hello_world_compiles_on_every_format() {
        let src: &[u8] = b"++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.\
                           >---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
        for &kind in &[TargetKind::ElfX64, TargetKind::ElfX86, TargetKind::PeX64] {
            assert!(compile(src, kind).is_ok());
        }
    }

    #[test]
    fn nested_loops_balance() {
        assert!(compile(b">+[-->---[-<]>]>+", TargetKind::ElfX64).is_ok());
        assert!(compile(b"[[[]]]", TargetKind::ElfX64).is_ok());
        assert!(compile(b"[[]", TargetKind::ElfX64).is_err());
    }

    #[test]
    fn comments_do_not_affect_output() {
        let with = compile(b"hello + world . end", TargetKind::ElfX64).unwrap();
        let without = compile(b"+.", TargetKind::ElfX64).unwrap();
        assert_eq!(with, without);
    }
}
