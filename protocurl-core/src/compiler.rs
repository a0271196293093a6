//! # Descriptor Compiler
//!
//! Turns a directory of `.proto` files into a [`Registry`].
//!
//! `protoc` is invoked with `--include_imports`, so the `FileDescriptorSet` it writes is
//! self-contained: every import, including the well-known types, ends up in the registry.
//! The output is written into a temporary directory that is removed when compilation
//! returns, whether it succeeded or not.
use crate::{
    TEMP_PREFIX,
    locator::{ExecutableLocator, LocateError},
    registry::Registry,
    report::Reporter,
};
use prost_reflect::DescriptorError;
use std::{
    env::consts::EXE_SUFFIX,
    path::{Path, PathBuf},
    process::ExitStatus,
};
use tokio::process::Command;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const PROTOC: &str = "protoc";

const PROTO_EXTENSION: &str = "proto";

/// Well-known types shipped by most system-wide protobuf installations.
const SYSTEM_INCLUDE: &str = "/usr/include";

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    ProtocNotFound(#[from] LocateError),

    #[error("No .proto files found in '{0}'")]
    NoProtoFiles(PathBuf),

    #[error("Failed to create a temporary directory for protoc: '{0}'")]
    TempDir(#[source] std::io::Error),

    #[error("Failed to run protoc at '{path}': '{source}'")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to convert input .proto to FileDescriptorSet. protoc exited with {status}.\nprotoc stderr:\n{stderr}")]
    ProtocFailed { status: ExitStatus, stderr: String },

    #[error("protoc did not write a FileDescriptorSet: '{0}'")]
    MissingOutput(#[source] std::io::Error),

    #[error("Failed to build the descriptor registry: '{0}'")]
    InvalidDescriptorSet(#[from] DescriptorError),
}

/// Which `.proto` files under the proto directory get compiled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileSelection {
    /// Every `.proto` file found recursively.
    #[default]
    Infer,
    /// A single file, relative to the proto directory.
    Explicit(PathBuf),
}

/// Where `protoc` comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProtocSource {
    /// The protoc bundled next to the executable, falling back to `PATH`.
    #[default]
    Bundled,
    /// The protoc found on `PATH`.
    Global,
    /// A user-given protoc executable.
    Custom(PathBuf),
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub proto_dir: PathBuf,
    pub files: FileSelection,
    pub protoc: ProtocSource,
}

struct Protoc {
    path: PathBuf,
    /// Root containing `google/protobuf/*.proto`.
    include: PathBuf,
}

/// Compiles the selected `.proto` files into a [`Registry`].
///
/// With `raw_decode`, `google.protobuf.Empty` is added to the registry so responses can be
/// decoded without a schema.
pub async fn compile(
    options: &CompileOptions,
    locator: &ExecutableLocator,
    reporter: &dyn Reporter,
    raw_decode: bool,
) -> Result<Registry, CompileError> {
    let files = match &options.files {
        FileSelection::Infer => {
            debug!(
                "Converting all files in {} to a FileDescriptorSet.",
                options.proto_dir.display()
            );
            let files = collect_proto_files(&options.proto_dir);
            if files.is_empty() {
                return Err(CompileError::NoProtoFiles(options.proto_dir.clone()));
            }
            files
        }
        FileSelection::Explicit(file) => {
            debug!(
                "Converting file {} in {} to a FileDescriptorSet.",
                file.display(),
                options.proto_dir.display()
            );
            vec![file.clone()]
        }
    };

    let protoc = locate_protoc(&options.protoc, locator)?;

    let tmp_dir = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempdir()
        .map_err(CompileError::TempDir)?;
    let output_path = tmp_dir.path().join("descriptors.bin");

    let mut command = Command::new(&protoc.path);
    command.arg("--include_imports").arg("-o").arg(&output_path);

    if protoc.include.is_dir() {
        debug!("Using google protobuf include: {}", protoc.include.display());
        command.arg("-I").arg(&protoc.include);
    } else {
        debug!(
            "Google protobuf include {} does not exist, skipping it.",
            protoc.include.display()
        );
    }

    command.arg("-I").arg(&options.proto_dir);
    command.args(files.iter().map(|file| options.proto_dir.join(file)));

    debug!("Invoking protoc: {command:?}");

    let output = command
        .output()
        .await
        .map_err(|source| CompileError::Spawn {
            path: protoc.path.clone(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !stderr.trim().is_empty() {
        reporter.tool_output(PROTOC, "", &stderr);
    }

    if !output.status.success() {
        return Err(CompileError::ProtocFailed {
            status: output.status,
            stderr,
        });
    }

    let bytes = tokio::fs::read(&output_path)
        .await
        .map_err(CompileError::MissingOutput)?;

    let registry = Registry::decode(&bytes)?;
    debug!("Loaded {} files into the registry.", registry.files().count());

    if raw_decode {
        debug!("Adding google.protobuf.Empty to the registry to decode raw Protobuf.");
        return Ok(registry.with_empty_message()?);
    }

    Ok(registry)
}

/// Paths of every `.proto` file under `proto_dir`, relative to it.
///
/// Unreadable entries are logged and skipped. No particular order is guaranteed.
pub fn collect_proto_files(proto_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(proto_dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(
                    "Encountered an error while walking through {}: {err}",
                    proto_dir.display()
                );
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext == PROTO_EXTENSION)
        })
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(proto_dir)
                .ok()
                .map(Path::to_path_buf)
        })
        .inspect(|file| debug!("Found .proto: {}", file.display()))
        .collect()
}

fn locate_protoc(source: &ProtocSource, locator: &ExecutableLocator) -> Result<Protoc, CompileError> {
    match source {
        ProtocSource::Bundled => {
            if let Some(bundle) = locator.bundled_dir() {
                let path = bundle.join("bin").join(format!("{PROTOC}{EXE_SUFFIX}"));
                if path.is_file() {
                    debug!("Found bundled protoc at {}", path.display());
                    return Ok(Protoc {
                        path,
                        include: bundle.join("include"),
                    });
                }
            }
            debug!("No bundled protoc available, looking for {PROTOC} in PATH.");
            Ok(global_protoc(locator.find(PROTOC)?))
        }
        ProtocSource::Global => Ok(global_protoc(locator.find(PROTOC)?)),
        ProtocSource::Custom(path) => {
            debug!("Using custom {PROTOC} path: {}", path.display());
            Ok(global_protoc(ExecutableLocator::custom(path)))
        }
    }
}

// Installations put the well-known types in `<prefix>/include` for `<prefix>/bin/protoc`.
fn global_protoc(path: PathBuf) -> Protoc {
    let include = path
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .map(|prefix| prefix.join("include"))
        .filter(|include| include.join("google").join("protobuf").is_dir())
        .unwrap_or_else(|| PathBuf::from(SYSTEM_INCLUDE));

    Protoc { path, include }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn collects_nested_proto_files_relative_to_the_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("root.proto"), "").unwrap();
        fs::write(dir.path().join("a/b/deep.proto"), "").unwrap();
        fs::write(dir.path().join("a/notes.txt"), "").unwrap();

        let mut files = collect_proto_files(dir.path());
        files.sort();

        assert_eq!(
            files,
            vec![PathBuf::from("a/b/deep.proto"), PathBuf::from("root.proto")]
        );
    }

    #[test]
    fn missing_directory_yields_no_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_proto_files(&dir.path().join("ghost")).is_empty());
    }
}
