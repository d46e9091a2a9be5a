//! Assembling and executing external tool invocations.
//!
//! Every artifact is produced by the box generator, contracted only
//! through its argument list and exit status. Some targets additionally
//! route the drawing through a vector-path flattener, staging the
//! intermediate file in a scoped temporary location.

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::error::DispatchError;
use crate::params::ParamSet;

/// The box generator program.
pub const GENERATOR: &str = "boxes";

/// The post-processor flattening text and strokes into plain paths.
pub const FLATTENER: &str = "inkscape";

/// One fully materialized external invocation.
///
/// The parameter set is complete before dispatch; nothing is appended at
/// execution time except the destination flag.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Program to spawn.
    pub program: String,
    /// Generator name passed as the first argument.
    pub generator: String,
    /// Design parameters.
    pub params: ParamSet,
    /// Externally authored layout file, for generators that read one.
    pub input: Option<Utf8PathBuf>,
    /// Final artifact path.
    pub output: Utf8PathBuf,
    /// Route the drawing through the path flattener.
    pub flatten: bool,
}

impl Invocation {
    /// Creates a generator invocation writing to `output`.
    pub fn generate(
        generator: impl Into<String>,
        params: ParamSet,
        output: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            program: GENERATOR.into(),
            generator: generator.into(),
            params,
            input: None,
            output: output.into(),
            flatten: false,
        }
    }

    /// Overrides the spawned program.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Points the generator at an externally authored layout file.
    pub fn input(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    /// Routes the artifact through the path-flattening post-processor.
    pub fn flattened(mut self) -> Self {
        self.flatten = true;
        self
    }

    /// Argument list for the generator stage, writing to `output`.
    pub fn args_for(&self, output: &Utf8Path) -> Vec<String> {
        let mut args = vec![self.generator.clone()];

        args.extend(self.params.to_args());

        if let Some(input) = &self.input {
            args.push(format!("--input={input}"));
        }

        args.push(format!("--output={output}"));
        args
    }

    /// Argument list for the flattening stage, reading from `source`.
    pub fn flatten_args(&self, source: &Utf8Path) -> Vec<String> {
        vec![
            source.to_string(),
            format!("--export-plain-svg={}", self.output),
            String::from("--export-text-to-path"),
        ]
    }
}

/// Strategy for carrying out invocations.
///
/// The default [`ProcessDispatcher`] spawns the external tools; swap in a
/// different implementation to observe invocations without side effects.
pub trait Dispatcher {
    fn dispatch(&self, invocation: &Invocation) -> Result<(), DispatchError>;
}

/// Spawns the external tools and blocks until they exit.
#[derive(Debug, Clone)]
pub struct ProcessDispatcher {
    /// Program used for the flattening stage.
    pub flattener: String,
}

impl ProcessDispatcher {
    pub fn new() -> Self {
        Self {
            flattener: FLATTENER.into(),
        }
    }

    fn run(&self, program: &str, args: &[String]) -> Result<(), DispatchError> {
        debug!("running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| DispatchError::Spawn {
                command: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(DispatchError::Tool {
                command: program.to_string(),
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        if !output.stdout.is_empty() {
            debug!("{}", String::from_utf8_lossy(&output.stdout).trim_end());
        }

        Ok(())
    }
}

impl Default for ProcessDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for ProcessDispatcher {
    fn dispatch(&self, invocation: &Invocation) -> Result<(), DispatchError> {
        if !invocation.flatten {
            return self.run(&invocation.program, &invocation.args_for(&invocation.output));
        }

        let dir = match invocation.output.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };

        // The generator writes to a staging file which is removed on every
        // exit path, including generator and flattener failures.
        let staged = tempfile::Builder::new()
            .prefix(".stage-")
            .suffix(".svg")
            .tempfile_in(dir)?
            .into_temp_path();
        let staged_path = Utf8PathBuf::try_from(staged.to_path_buf())?;

        self.run(&invocation.program, &invocation.args_for(&staged_path))?;
        self.run(&self.flattener, &invocation.flatten_args(&staged_path))?;

        Ok(())
    }
}

/// Logs every invocation instead of spawning anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunDispatcher;

impl Dispatcher for DryRunDispatcher {
    fn dispatch(&self, invocation: &Invocation) -> Result<(), DispatchError> {
        info!(
            "would run: {} {}",
            invocation.program,
            invocation.args_for(&invocation.output).join(" ")
        );

        if invocation.flatten {
            info!(
                "would run: {} <staged>.svg --export-plain-svg={} --export-text-to-path",
                FLATTENER,
                invocation.output
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_args() {
        let params = ParamSet::new()
            .set("x", 215)
            .set("y", 60)
            .set("h", 30)
            .set("thickness", 3.0);
        let invocation =
            Invocation::generate("TwoPiece", params, "_build/sharpening-stone_3mm.svg");

        assert_eq!(
            invocation.args_for(&invocation.output),
            [
                "TwoPiece",
                "--x=215",
                "--y=60",
                "--h=30",
                "--thickness=3",
                "--output=_build/sharpening-stone_3mm.svg",
            ]
        );
    }

    #[test]
    fn test_layout_input_precedes_the_destination() {
        let invocation = Invocation::generate(
            "TrayLayout",
            ParamSet::new().set("h", 40),
            "_build/parts-tray_3mm.svg",
        )
        .input("layouts/parts-tray.txt");

        assert_eq!(
            invocation.args_for(&invocation.output),
            [
                "TrayLayout",
                "--h=40",
                "--input=layouts/parts-tray.txt",
                "--output=_build/parts-tray_3mm.svg",
            ]
        );
    }

    #[test]
    fn test_flatten_args() {
        let invocation =
            Invocation::generate("UniversalBox", ParamSet::new(), "_build/stamp-box_6mm.svg")
                .flattened();

        assert_eq!(
            invocation.flatten_args(Utf8Path::new("_build/.stage-x.svg")),
            [
                "_build/.stage-x.svg",
                "--export-plain-svg=_build/stamp-box_6mm.svg",
                "--export-text-to-path",
            ]
        );
    }

    #[cfg(unix)]
    mod process {
        use super::*;

        fn scratch() -> (tempfile::TempDir, Utf8PathBuf) {
            let dir = tempfile::tempdir().unwrap();
            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            (dir, root)
        }

        fn staged_files(root: &Utf8Path) -> usize {
            std::fs::read_dir(root)
                .unwrap()
                .filter(|entry| {
                    entry
                        .as_ref()
                        .unwrap()
                        .file_name()
                        .to_string_lossy()
                        .starts_with(".stage-")
                })
                .count()
        }

        #[test]
        fn test_zero_exit_is_success() {
            let (_dir, root) = scratch();
            let invocation =
                Invocation::generate("TwoPiece", ParamSet::new(), root.join("out.svg"))
                    .program("true");

            ProcessDispatcher::new().dispatch(&invocation).unwrap();
        }

        #[test]
        fn test_nonzero_exit_surfaces_the_status() {
            let (_dir, root) = scratch();
            let invocation =
                Invocation::generate("TwoPiece", ParamSet::new(), root.join("out.svg"))
                    .program("false");

            let err = ProcessDispatcher::new().dispatch(&invocation).unwrap_err();

            match err {
                DispatchError::Tool {
                    command, status, ..
                } => {
                    assert_eq!(command, "false");
                    assert!(!status.success());
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_failure_carries_stdout_diagnostics() {
            let dispatcher = ProcessDispatcher::new();

            let err = dispatcher
                .run("sh", &["-c".into(), "echo oops; exit 3".into()])
                .unwrap_err();

            match err {
                DispatchError::Tool { status, stdout, .. } => {
                    assert_eq!(status.code(), Some(3));
                    assert!(stdout.contains("oops"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_missing_program_is_a_spawn_error() {
            let (_dir, root) = scratch();
            let invocation =
                Invocation::generate("TwoPiece", ParamSet::new(), root.join("out.svg"))
                    .program("kerf-no-such-tool");

            let err = ProcessDispatcher::new().dispatch(&invocation).unwrap_err();

            assert!(matches!(err, DispatchError::Spawn { .. }));
        }

        #[test]
        fn test_staged_file_is_removed_on_success() {
            let (_dir, root) = scratch();
            let invocation =
                Invocation::generate("TwoPiece", ParamSet::new(), root.join("out.svg"))
                    .program("true")
                    .flattened();

            let dispatcher = ProcessDispatcher {
                flattener: String::from("true"),
            };

            dispatcher.dispatch(&invocation).unwrap();

            assert_eq!(staged_files(&root), 0);
        }

        #[test]
        fn test_staged_file_is_removed_on_failure() {
            let (_dir, root) = scratch();
            let invocation =
                Invocation::generate("TwoPiece", ParamSet::new(), root.join("out.svg"))
                    .program("false")
                    .flattened();

            ProcessDispatcher::new().dispatch(&invocation).unwrap_err();

            assert_eq!(staged_files(&root), 0);
        }

        #[test]
        fn test_staged_file_is_removed_on_flattener_failure() {
            let (_dir, root) = scratch();
            let invocation =
                Invocation::generate("TwoPiece", ParamSet::new(), root.join("out.svg"))
                    .program("true")
                    .flattened();

            let dispatcher = ProcessDispatcher {
                flattener: String::from("false"),
            };

            let err = dispatcher.dispatch(&invocation).unwrap_err();

            assert!(matches!(err, DispatchError::Tool { .. }));
            assert_eq!(staged_files(&root), 0);
        }
    }
}
