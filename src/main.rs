use std::fs;
use std::process;

extern crate clap;
use clap::{App, Arg};

extern crate bf2bin;
use bf2bin::TargetKind;

fn main() {
    let matches = App::new("bf2bin")
        .version("0.1.0")
        .author("Ian D. Scott <ian@iandouglasscott.com>")
        .about("Brainfuck compiler emitting native executables")
        .arg(
            Arg::with_name("target")
                .short("t")
                .long("target")
                .help("Executable format to produce")
                .takes_value(true)
                .possible_values(&["elf-x64", "elf-x86", "pe-x64"])
                .default_value("elf-x64"),
        )
        .arg(
            Arg::with_name("out_name")
                .short("o")
                .help("Output file name")
                .takes_value(true)
                .empty_values(false)
                .value_name("file"),
        )
        .arg(
            Arg::with_name("no_run")
                .long("no-run")
                .help("Do not execute the compiled program"),
        )
        .arg(
            Arg::with_name("FILENAME")
                .help("Source file to compile")
                .default_value("source.bf")
                .index(1),
        )
        .get_matches();

    let kind = match matches.value_of("target").unwrap() {
        "elf-x86" => TargetKind::ElfX86,
        "pe-x64" => TargetKind::PeX64,
        _ => TargetKind::ElfX64,
    };

    let path = matches.value_of("FILENAME").unwrap();
    let source = match fs::read(path) {
        Ok(source) => source,
        Err(_) => {
            eprintln!("Failed to open {}", path);
            process::exit(1);
        }
    };

    let image = match bf2bin::compile(&source, kind) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    let out_name = matches
        .value_of("out_name")
        .unwrap_or_else(|| kind.default_output());
    if bf2bin::write_executable(out_name, &image, kind).is_err() {
        eprintln!("Failed to open {}", out_name);
        process::exit(1);
    }

    if !matches.is_present("no_run") {
        match bf2bin::run_executable(out_name) {
            Ok(code) => process::exit(code),
            Err(err) => {
                eprintln!("Failed to run {}: {}", out_name, err);
                process::exit(1);
            }
        }
    }
}
