//! Command implementations.

use shtest::{Catalog, EXIT_FAILURE, EXIT_SUCCESS, Outcome, RunConfig, Runner, StatusReporter};

use crate::cli::Cli;
use crate::terminal;

/// Dispatch to listing or running.
pub fn run_command(cli: &Cli) -> i32 {
    let catalog = match load_catalog(cli) {
        Ok(c) => c,
        Err(e) => {
            terminal::error(&format!("Error: {e}"));
            return EXIT_FAILURE;
        }
    };

    if cli.list {
        list_catalog(&catalog);
        return EXIT_SUCCESS;
    }

    run_suite(cli, &catalog)
}

fn load_catalog(cli: &Cli) -> Result<Catalog, shtest::CatalogError> {
    let catalog = match &cli.manifest {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };
    Ok(match &cli.filter {
        Some(pattern) => catalog.filter(pattern),
        None => catalog,
    })
}

fn list_catalog(catalog: &Catalog) {
    for id in catalog {
        println!("{id}");
    }
}

fn run_suite(cli: &Cli, catalog: &Catalog) -> i32 {
    if catalog.is_empty() {
        terminal::warning("No tests selected");
        return EXIT_SUCCESS;
    }

    let config = RunConfig::default()
        .with_root(&cli.root)
        .with_simulator(&cli.simulator)
        .with_timeout(cli.timeout)
        .with_keep_output(cli.keep_output);

    let runner = match Runner::new(config) {
        Ok(r) => r,
        Err(e) => {
            terminal::error(&format!("Error: {e}"));
            return EXIT_FAILURE;
        }
    };

    if cli.verbose {
        terminal::info(&format!("Suite root: {}", runner.config().root.display()));
        terminal::info(&format!(
            "Simulator: {}",
            runner.executor().simulator().display()
        ));
    }

    let summary = if cli.silent {
        runner.run(catalog, &mut StatusReporter::new(std::io::sink()))
    } else {
        let mut reporter =
            StatusReporter::new(std::io::stdout()).with_color(console::colors_enabled());
        runner.run(catalog, &mut reporter)
    };

    match &summary.failure {
        Some(failure) if cli.silent => {
            if let Outcome::Fail(e) = &failure.outcome {
                terminal::error(&format!("{}: {e}", failure.id));
            }
        }
        Some(_) => terminal::error(&format!(
            "aborted after {} of {} tests",
            summary.passed + 1,
            summary.total
        )),
        None if cli.silent => {}
        None => terminal::success(&format!("{} tests passed", summary.passed)),
    }

    summary.exit_code()
}
