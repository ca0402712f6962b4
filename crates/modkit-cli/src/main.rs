use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;

use modkit_core::{
    Config, ModkitError, PluginManager, Result, SourcePublisher, SyncReport,
};

mod args;
use args::{Cli, Commands, ConfigAction, Shell, SourceAction};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        init_logging();
    }

    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => match Config::default_base_dir() {
            Ok(dir) => dir,
            Err(err) => {
                report_error(&err);
                return ExitCode::FAILURE;
            }
        },
    };

    match dispatch(cli.command, &base_dir, cli.quiet) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("modkit_core=debug,modkit=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn dispatch(command: Commands, base_dir: &Path, quiet: bool) -> Result<()> {
    match command {
        Commands::Config { action } => return handle_config(action, base_dir),
        Commands::Completions { shell } => {
            handle_completions(shell);
            return Ok(());
        }
        Commands::Publish {
            dir,
            name,
            id,
            base_url,
            output,
        } => return handle_publish(&dir, &name, &id, &base_url, output),
        _ => {}
    }

    let config = Config::load(base_dir)?;
    let manager = PluginManager::new(base_dir, &config)?;

    match command {
        Commands::List => handle_list(&manager),
        Commands::Enable { id } => handle_enable(&manager, &id),
        Commands::Disable { id } => handle_disable(&manager, &id),
        Commands::Install { address, file } => handle_install(&manager, address, file, quiet),
        Commands::Upload { id, output } => handle_upload(&manager, &id, output),
        Commands::Remove { id, force } => handle_remove(&manager, &id, force),
        Commands::Update => handle_update(&manager, quiet),
        Commands::Search { keyword } => handle_search(&manager, &keyword),
        Commands::Source { action } => match action {
            SourceAction::List => handle_source_list(&manager),
            SourceAction::Add { url } => handle_source_add(&manager, &url, quiet),
            SourceAction::Remove { index } => handle_source_remove(&manager, index),
        },
        // Handled above
        Commands::Config { .. } | Commands::Completions { .. } | Commands::Publish { .. } => Ok(()),
    }
}

fn report_error(err: &ModkitError) {
    eprintln!("{} {}", "[ERROR]".red().bold(), err);

    // The conflict case carries the data the user needs to retry
    if let ModkitError::AmbiguousInstall { candidates, .. } = err {
        eprintln!();
        for candidate in candidates {
            eprintln!(
                "  modkit install {}  ({}/{})",
                candidate.address().cyan(),
                candidate.source_name,
                candidate.module_name
            );
        }
    }
}

// ========== Plugins ==========

fn handle_list(manager: &PluginManager) -> Result<()> {
    let listing = manager.list_plugins()?;

    println!();
    println!("{}", "Plugins".bold());
    println!();

    if listing.is_empty() {
        println!("No plugins installed.");
        return Ok(());
    }

    if !listing.enabled.is_empty() {
        println!("{}", "Enabled".green());
        for id in &listing.enabled {
            println!("  {}", id);
        }
    }

    if !listing.disabled.is_empty() {
        if !listing.enabled.is_empty() {
            println!();
        }
        println!("{}", "Disabled".red());
        for id in &listing.disabled {
            println!("  {}", id);
        }
    }

    Ok(())
}

fn handle_enable(manager: &PluginManager, id: &str) -> Result<()> {
    manager.enable(id)?;
    println!("{} {}", "Enabled:".green(), id.cyan());
    Ok(())
}

fn handle_disable(manager: &PluginManager, id: &str) -> Result<()> {
    manager.disable(id)?;
    println!("{} {}", "Disabled:".yellow(), id.cyan());
    Ok(())
}

fn handle_install(
    manager: &PluginManager,
    address: Option<String>,
    file: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    match (address, file) {
        (Some(address), _) => {
            if !quiet {
                println!("Resolving {} ...", address.cyan());
            }

            let outcome = manager.install(&address)?;
            println!(
                "{} {} ({}) from {}",
                "Installed:".green(),
                outcome.module_name.cyan(),
                outcome.plugin_id,
                outcome.source_name
            );
            Ok(())
        }
        (None, Some(path)) => {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            let content = fs::read_to_string(&path)?;

            let (id, _) = manager.install_from_attachment(&filename, &content)?;
            println!("{} {}", "Installed:".green(), id.cyan());
            Ok(())
        }
        (None, None) => unreachable!("clap enforces an address or --file"),
    }
}

fn handle_upload(manager: &PluginManager, id: &str, output: Option<PathBuf>) -> Result<()> {
    let exported = manager.export_plugin(id)?;

    let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;
    let target = output_dir.join(&exported.filename);
    fs::write(&target, exported.content)?;

    println!("{} {}", "Exported:".green(), target.display());
    Ok(())
}

fn handle_remove(manager: &PluginManager, id: &str, force: bool) -> Result<()> {
    if !force {
        print!("Remove plugin '{}'? [y/N]: ", id);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    manager.remove_plugin(id)?;
    println!("{} {}", "Removed:".green(), id.cyan());
    Ok(())
}

// ========== Sources ==========

fn handle_update(manager: &PluginManager, quiet: bool) -> Result<()> {
    if manager.registry().is_empty() {
        println!("No sources to update.");
        return Ok(());
    }

    let report = manager.update_sources(|progress| {
        if !quiet {
            println!(
                "[{}/{}] Updating {} ...",
                progress.index, progress.total, progress.name
            );
        }
    })?;

    print_sync_report(&report);
    Ok(())
}

fn print_sync_report(report: &SyncReport) {
    println!();
    println!(
        "{} {}/{} sources updated",
        "Done:".green(),
        report.updated,
        report.total
    );

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failed".red());
        for failure in &report.failures {
            println!("  {}: {}", failure.name, failure.reason);
        }
    }
}

fn handle_search(manager: &PluginManager, keyword: &str) -> Result<()> {
    let groups = manager.search(keyword);

    if groups.is_empty() {
        println!("No modules matching '{}'.", keyword);
        return Ok(());
    }

    println!();
    for group in groups {
        println!(
            "{} {} ({})",
            "Source:".bold(),
            group.source_name,
            group.source_id
        );
        for module in &group.modules {
            println!(
                "  {}  {}",
                format!("{}/{}", group.source_id, module.id).cyan(),
                module.name
            );
        }
        println!();
    }

    Ok(())
}

fn handle_source_list(manager: &PluginManager) -> Result<()> {
    let sources = manager.list_sources();

    if sources.is_empty() {
        println!("No sources registered.");
        return Ok(());
    }

    println!();
    println!("{}", "Sources".bold());
    println!();

    for (i, source) in sources.iter().enumerate() {
        println!("{}: {} ({})", i + 1, source.name.cyan(), source.id);
        println!("   modules: {}", source.module_count());
        println!("   url: {}", source.url);
    }

    Ok(())
}

fn handle_source_add(manager: &PluginManager, url: &str, quiet: bool) -> Result<()> {
    if !quiet {
        println!("Fetching {} ...", url);
    }

    let source = manager.add_source(url)?;
    println!(
        "{} {} ({}, {} modules)",
        "Added:".green(),
        source.name.cyan(),
        source.id,
        source.module_count()
    );
    Ok(())
}

fn handle_source_remove(manager: &PluginManager, index: usize) -> Result<()> {
    let removed = manager.remove_source(index)?;
    println!("{} {}", "Removed:".green(), removed.name.cyan());
    Ok(())
}

// ========== Config ==========

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            Ok(())
        }
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                    Ok(())
                }
                None => Err(ModkitError::ConfigKeyNotFound { key }),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key.cyan(), value);
            Ok(())
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Config:".green(), path.display());
            Ok(())
        }
    }
}

// ========== Publish ==========

fn handle_publish(
    dir: &Path,
    name: &str,
    id: &str,
    base_url: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let publisher = SourcePublisher::new(name, id, base_url);
    let output = output.unwrap_or_else(|| dir.join("source.json"));

    let manifest = publisher.write(dir, &output)?;

    println!(
        "{} {} with {} modules",
        "Generated:".green(),
        output.display(),
        manifest.data.len()
    );
    Ok(())
}

// ========== Completions ==========

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = "modkit";

    match shell {
        Shell::Bash => generate(clap_complete::shells::Bash, &mut cmd, bin_name, &mut io::stdout()),
        Shell::Zsh => generate(clap_complete::shells::Zsh, &mut cmd, bin_name, &mut io::stdout()),
        Shell::Fish => generate(clap_complete::shells::Fish, &mut cmd, bin_name, &mut io::stdout()),
        Shell::PowerShell => generate(
            clap_complete::shells::PowerShell,
            &mut cmd,
            bin_name,
            &mut io::stdout(),
        ),
        Shell::Elvish => generate(
            clap_complete::shells::Elvish,
            &mut cmd,
            bin_name,
            &mut io::stdout(),
        ),
    }
}
