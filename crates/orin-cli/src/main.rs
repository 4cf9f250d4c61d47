//! Orin backend CLI
//!
//! Consumes a resolved program serialized by the frontend and emits one
//! Jasmin `.j` unit per class, ready for the downstream assembler.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orin_ast::Program;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "orinc")]
#[command(about = "Orin compiler backend", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a resolved program to .j files
    Build {
        /// Resolved program (JSON, as written by the frontend)
        input: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,
    },

    /// Compile and print the assembly to stdout
    Dump {
        /// Resolved program (JSON, as written by the frontend)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { input, out_dir } => build(&input, &out_dir),
        Commands::Dump { input } => dump(&input),
    }
}

fn load_program(input: &Path) -> Result<Program> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a resolved Orin program", input.display()))
}

fn build(input: &Path, out_dir: &Path) -> Result<()> {
    let program = load_program(input)?;
    let classes = orin_codegen::compile_program(&program)
        .with_context(|| format!("failed to compile {}", program.name))?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    for class in &classes {
        let path = out_dir.join(format!("{}.j", class.name));
        fs::write(&path, orin_jasm::render_class(class))
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn dump(input: &Path) -> Result<()> {
    let program = load_program(input)?;
    let classes = orin_codegen::compile_program(&program)
        .with_context(|| format!("failed to compile {}", program.name))?;
    for class in &classes {
        print!("{}", orin_jasm::render_class(class));
        println!();
    }
    Ok(())
}
