// src/codegen/link.rs
//! Turning assembly text into an executable with the system toolchain.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::errors::CodegenError;

fn io_error(context: &str) -> impl FnOnce(std::io::Error) -> CodegenError + '_ {
    move |source| CodegenError::Io {
        context: context.to_string(),
        message: source.to_string(),
    }
}

fn run(tool: &str, command: &mut Command) -> Result<std::process::ExitStatus, CodegenError> {
    command.status().map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            CodegenError::ToolNotFound {
                tool: tool.to_string(),
            }
        } else {
            io_error(tool)(source)
        }
    })
}

/// Assemble `text` with nasm and link the object with ld, producing an
/// executable at `output`. Intermediates go to the system temp
/// directory under names unique to this process.
pub fn assemble_and_link(text: &str, output: &Path) -> Result<(), CodegenError> {
    let scratch = std::env::temp_dir();
    let stem = format!("spinel-{}", std::process::id());
    let asm_path = scratch.join(format!("{stem}.s"));
    let object_path = scratch.join(format!("{stem}.o"));

    std::fs::write(&asm_path, text).map_err(io_error("writing assembly"))?;
    debug!(path = %asm_path.display(), "assembly written");

    let status = run(
        "nasm",
        Command::new("nasm")
            .arg("-f")
            .arg("elf64")
            .arg(&asm_path)
            .arg("-o")
            .arg(&object_path),
    )?;
    if !status.success() {
        return Err(CodegenError::AssemblyFailed {
            status: status.to_string(),
        });
    }
    debug!(path = %object_path.display(), "object assembled");

    let status = run(
        "ld",
        Command::new("ld").arg(&object_path).arg("-o").arg(output),
    )?;
    if !status.success() {
        return Err(CodegenError::LinkFailed {
            status: status.to_string(),
        });
    }
    debug!(path = %output.display(), "executable linked");

    let _ = std::fs::remove_file(&asm_path);
    let _ = std::fs::remove_file(&object_path);
    Ok(())
}
