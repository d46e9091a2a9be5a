//! The built-in build targets.
//!
//! Each target records one shop design as a fixed generator invocation;
//! the numbers are the designs, not logic. Internal dimensions unless a
//! target says otherwise.

use crate::error::RegistryError;
use crate::invoke::Invocation;
use crate::output::Artifact;
use crate::params::{ParamSet, Value};
use crate::registry::Registry;

/// Registers every built-in target.
///
/// All artifact-producing targets depend on `mkdir_build`, so the build
/// directory exists before a generator writes into it.
pub fn install(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register("mkdir_build", &[], |ctx| {
        ctx.workspace.ensure()?;
        Ok(())
    })?;

    registry.register("clean", &["mkdir_build"], |ctx| {
        ctx.workspace.clean()?;
        Ok(())
    })?;

    // Two piece boxes sized to the sharpening stones they store.
    registry.register("sharpening-stone", &["mkdir_build"], |ctx| {
        let artifact = Artifact::new("sharpening-stone");
        let params = ParamSet::new()
            .set("x", 215)
            .set("y", 60)
            .set("h", 30)
            .set("thickness", artifact.thickness);

        ctx.generate(&Invocation::generate(
            "TwoPiece",
            params,
            ctx.resolve(&artifact),
        ))?;
        Ok(())
    })?;

    registry.register("slip-stone", &["mkdir_build"], |ctx| {
        let artifact = Artifact::new("slip-stone");
        let params = ParamSet::new()
            .set("x", 118)
            .set("y", 47)
            .set("h", 15)
            .set("thickness", artifact.thickness);

        ctx.generate(&Invocation::generate(
            "TwoPiece",
            params,
            ctx.resolve(&artifact),
        ))?;
        Ok(())
    })?;

    // Storage for DIN 100 film spools, outer dimensions.
    registry.register("spool-din-100", &["mkdir_build"], |ctx| {
        let artifact = Artifact::new("spool-din-100");
        let params = ParamSet::new()
            .set("x", 104)
            .set("y", 104)
            .set("h", 84)
            .set("outside", true)
            .set("thickness", artifact.thickness);

        ctx.generate(&Invocation::generate(
            "ClosedBox",
            params,
            ctx.resolve(&artifact),
        ))?;
        Ok(())
    })?;

    // Tray for two stacks of playing cards.
    registry.register("card-box", &["mkdir_build"], |ctx| {
        let artifact = Artifact::new("card-box");
        let params = ParamSet::new()
            .set("sx", Value::list([68, 68]))
            .set("sy", Value::list([92]))
            .set("h", 30)
            .set("thickness", artifact.thickness);

        ctx.generate(&Invocation::generate(
            "TypeTray",
            params,
            ctx.resolve(&artifact),
        ))?;
        Ok(())
    })?;

    // Compartment layout is authored separately in the layout file.
    registry.register("parts-tray", &["mkdir_build"], |ctx| {
        let artifact = Artifact::new("parts-tray");
        let params = ParamSet::new()
            .set("h", 40)
            .set("thickness", artifact.thickness);

        ctx.generate(
            &Invocation::generate("TrayLayout", params, ctx.resolve(&artifact))
                .input("layouts/parts-tray.txt"),
        )?;
        Ok(())
    })?;

    // Engraved lid label, so text gets flattened into paths.
    registry.register("stamp-box", &["mkdir_build"], |ctx| {
        let artifact = Artifact::new("stamp-box").thickness(6.0);
        let params = ParamSet::new()
            .set("x", 160)
            .set("y", 110)
            .set("h", 55)
            .set("burn", 0.07)
            .set("thickness", artifact.thickness);

        ctx.generate(
            &Invocation::generate("UniversalBox", params, ctx.resolve(&artifact)).flattened(),
        )?;
        Ok(())
    })?;

    // Rack plus a matching drawer, cut from the same sheet thickness.
    registry.register("spice-rack", &["mkdir_build"], |ctx| {
        let rack = Artifact::new("spice-rack");
        let params = ParamSet::new()
            .set("sx", Value::list([55, 55, 55, 55]))
            .set("sy", Value::list([95]))
            .set("h", 60)
            .set("outside", true)
            .set("thickness", rack.thickness);

        ctx.generate(&Invocation::generate(
            "TypeTray",
            params,
            ctx.resolve(&rack),
        ))?;

        let drawer = Artifact::new("spice-rack-drawer");
        let params = ParamSet::new()
            .set("x", 51)
            .set("y", 90)
            .set("h", 55)
            .set("thickness", drawer.thickness);

        ctx.generate(&Invocation::generate(
            "OpenBox",
            params,
            ctx.resolve(&drawer),
        ))?;
        Ok(())
    })?;

    registry.register(
        "all",
        &[
            "sharpening-stone",
            "slip-stone",
            "spool-din-100",
            "card-box",
            "parts-tray",
            "stamp-box",
            "spice-rack",
        ],
        |_| Ok(()),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use camino::Utf8PathBuf;

    use super::*;
    use crate::error::DispatchError;
    use crate::invoke::Dispatcher;
    use crate::output::Scheme;
    use crate::registry::BuildContext;
    use crate::workspace::Workspace;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl Dispatcher for Recording {
        fn dispatch(&self, invocation: &Invocation) -> Result<(), DispatchError> {
            self.calls.lock().unwrap().push((
                invocation.program.clone(),
                invocation.args_for(&invocation.output),
            ));
            Ok(())
        }
    }

    fn installed() -> Registry {
        let mut registry = Registry::new();
        install(&mut registry).unwrap();
        registry
    }

    fn scratch_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_install_registers_every_target() {
        let registry = installed();

        let names: Vec<&str> = registry.tasks().map(|(name, _)| name).collect();
        assert_eq!(names.len(), 10);
        assert!(names.contains(&"mkdir_build"));
        assert!(names.contains(&"clean"));
        assert!(names.contains(&"all"));
    }

    #[test]
    fn test_install_twice_fails() {
        let mut registry = installed();

        let err = install(&mut registry).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTask(_)));
    }

    #[test]
    fn test_box_targets_depend_on_the_build_directory() {
        let registry = installed();

        for (name, prerequisites) in registry.tasks() {
            if name == "mkdir_build" || name == "all" {
                continue;
            }
            assert!(
                prerequisites.contains(&String::from("mkdir_build")),
                "{name} misses mkdir_build"
            );
        }
    }

    #[test]
    fn test_sharpening_stone_invocation() {
        let (_dir, root) = scratch_root();
        let registry = installed();

        let scheme = Scheme::new("_build");
        let workspace = Workspace::new(root);
        let dispatcher = Recording::default();
        let context = BuildContext {
            scheme: &scheme,
            workspace: &workspace,
            dispatcher: &dispatcher,
        };

        registry.run(&["sharpening-stone"], &context).unwrap();

        let calls = dispatcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "boxes");
        assert_eq!(
            calls[0].1,
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
    fn test_all_artifact_paths_are_unique() {
        let (_dir, root) = scratch_root();
        let registry = installed();

        let scheme = Scheme::new("_build");
        let workspace = Workspace::new(root);
        let dispatcher = Recording::default();
        let context = BuildContext {
            scheme: &scheme,
            workspace: &workspace,
            dispatcher: &dispatcher,
        };

        registry.run(&["all"], &context).unwrap();

        let calls = dispatcher.calls.lock().unwrap();
        let outputs: Vec<&String> = calls
            .iter()
            .map(|(_, args)| args.last().unwrap())
            .collect();

        // The spice rack dispatches twice, the other seven targets once.
        assert_eq!(outputs.len(), 8);

        let mut unique = outputs.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), outputs.len());

        assert!(outputs
            .iter()
            .all(|output| output.starts_with("--output=_build/")));
        assert!(outputs.contains(&&String::from(
            "--output=_build/stamp-box_6mm.svg"
        )));
    }

    #[test]
    fn test_client_prefix_flows_through() {
        let (_dir, root) = scratch_root();
        let registry = installed();

        let scheme = Scheme::new("_build").with_client("acme");
        let workspace = Workspace::new(root);
        let dispatcher = Recording::default();
        let context = BuildContext {
            scheme: &scheme,
            workspace: &workspace,
            dispatcher: &dispatcher,
        };

        registry.run(&["card-box"], &context).unwrap();

        let calls = dispatcher.calls.lock().unwrap();
        assert_eq!(
            calls[0].1.last().unwrap(),
            "--output=_build/acme_card-box_3mm.svg"
        );
    }

    #[test]
    fn test_clean_purges_stale_artifacts() {
        let (_dir, root) = scratch_root();
        let registry = installed();

        std::fs::write(root.join("stale.svg"), "<svg/>").unwrap();

        let scheme = Scheme::new(root.clone());
        let workspace = Workspace::new(root.clone());
        let dispatcher = Recording::default();
        let context = BuildContext {
            scheme: &scheme,
            workspace: &workspace,
            dispatcher: &dispatcher,
        };

        registry.run(&["clean"], &context).unwrap();

        assert!(!root.join("stale.svg").exists());
        assert!(root.is_dir());
    }
}
