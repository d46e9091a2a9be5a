use std::time::Instant;

use camino::Utf8PathBuf;
use clap::Parser;
use console::style;

use kerf::utils::{as_overhead, init_logging};
use kerf::{
    BUILD_DIR, BuildContext, Dispatcher, DryRunDispatcher, ProcessDispatcher, Registry, Scheme,
    Workspace,
};

#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
struct Args {
    /// Target names to run.
    tasks: Vec<String>,

    /// List the registered targets and exit.
    #[clap(long)]
    list: bool,

    /// Directory collecting generated artifacts.
    #[clap(long, default_value = BUILD_DIR)]
    build_dir: Utf8PathBuf,

    /// Client identifier prefixed to artifact names, overriding the
    /// BOXES_CLIENT_ID environment binding.
    #[clap(long)]
    client: Option<String>,

    /// Log invocations without spawning the external tools. Workspace
    /// side effects still happen: the build directory is created and
    /// `clean` still purges artifacts.
    #[clap(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging();

    let mut registry = Registry::new();
    kerf::catalog::install(&mut registry)?;

    if args.list || args.tasks.is_empty() {
        list_tasks(&registry);
        return Ok(());
    }

    eprintln!(
        "Running {} in {} mode.",
        style("kerf").red(),
        style(if args.dry_run { "dry-run" } else { "build" }).blue()
    );

    let scheme = match args.client {
        Some(client) => Scheme::new(args.build_dir.clone()).with_client(client),
        None => Scheme::from_env(args.build_dir.clone()),
    };
    let workspace = Workspace::new(args.build_dir.clone());

    let dispatcher: Box<dyn Dispatcher> = if args.dry_run {
        Box::new(DryRunDispatcher)
    } else {
        Box::new(ProcessDispatcher::new())
    };

    let context = BuildContext {
        scheme: &scheme,
        workspace: &workspace,
        dispatcher: dispatcher.as_ref(),
    };

    let names: Vec<&str> = args.tasks.iter().map(String::as_str).collect();

    let s = Instant::now();
    let report = registry.run(&names, &context)?;

    eprintln!(
        "Finished {} tasks {}",
        style(report.executed.len()).green(),
        as_overhead(s)
    );

    Ok(())
}

fn list_tasks(registry: &Registry) {
    eprintln!("Available tasks:");

    for (name, prerequisites) in registry.tasks() {
        if prerequisites.is_empty() {
            eprintln!("  {}", style(name).cyan());
        } else {
            eprintln!(
                "  {} (after {})",
                style(name).cyan(),
                prerequisites.join(", ")
            );
        }
    }
}
