//! CRUD Type Generator CLI
//!
//! Command-line interface for generating aggregated type declarations,
//! inspecting type closures and linting universe files.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crud_typegen::{
    is_generated, lint, load_manifest, load_templates, load_universe_auto, read_text, FileStatus,
    Flattener, Generator, QualifiedName, Severity, Templates, TypeOracle,
};

#[derive(Parser)]
#[command(name = "crud-typegen")]
#[command(about = "Aggregate CRUD operation types and emit their declarations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the declarations described by a manifest
    Generate {
        /// Type universe: file path or URL (http:// or https://)
        #[arg(long)]
        universe: String,

        /// Generation manifest file
        #[arg(long)]
        manifest: PathBuf,

        /// License header file placed above the generated marker
        #[arg(long)]
        header: Option<PathBuf>,

        /// Directory with struct.tmpl, field.tmpl, enum.tmpl or file.tmpl overrides
        #[arg(long)]
        template_dir: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an output file that was not generated by this tool
        #[arg(long)]
        force: bool,
    },

    /// Print the dependency closure of a type
    Closure {
        /// Type universe: file path or URL (http:// or https://)
        #[arg(long)]
        universe: String,

        /// Qualified type name (e.g., example.com/rds.CreateDBInstanceInput)
        #[arg(long = "type")]
        type_name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Lint universe files for errors (syntax, broken type references, unsupported shapes)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            universe,
            manifest,
            header,
            template_dir,
            output,
            force,
        } => run_generate(GenerateArgs {
            universe,
            manifest,
            header,
            template_dir,
            output,
            force,
        }),

        Commands::Closure {
            universe,
            type_name,
            json,
        } => run_closure(&universe, &type_name, json),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

struct GenerateArgs {
    universe: String,
    manifest: PathBuf,
    header: Option<PathBuf>,
    template_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    force: bool,
}

fn run_generate(args: GenerateArgs) -> Result<(), u8> {
    let universe = load_universe_auto(&args.universe).map_err(|e| {
        eprintln!("Error: loading universe: {}", e);
        e.exit_code() as u8
    })?;

    let manifest = load_manifest(&args.manifest).map_err(|e| {
        eprintln!("Error: loading manifest: {}", e);
        e.exit_code() as u8
    })?;

    let mut templates = Templates::builtin().map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    if let Some(dir) = &args.template_dir {
        templates = load_templates(dir, templates).map_err(|e| {
            eprintln!("Error: loading templates: {}", e);
            e.exit_code() as u8
        })?;
    }

    let mut generator = Generator::new(&universe, templates);
    if let Some(path) = &args.header {
        let header = read_text(path).map_err(|e| {
            eprintln!("Error: loading header: {}", e);
            e.exit_code() as u8
        })?;
        generator = generator.with_header(header);
    }

    let generated = generator.run(&manifest).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    match args.output {
        Some(path) => {
            if !args.force && path.exists() {
                let existing = std::fs::read_to_string(&path).map_err(|e| {
                    eprintln!("Error reading {}: {}", path.display(), e);
                    3u8
                })?;
                if !is_generated(&existing) {
                    eprintln!(
                        "Error: {} was not generated by this tool; use --force to overwrite",
                        path.display()
                    );
                    return Err(2);
                }
            }
            std::fs::write(&path, &generated.content).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            print!("{}", generated.content);
        }
    }

    Ok(())
}

fn run_closure(universe_source: &str, type_name: &str, json_output: bool) -> Result<(), u8> {
    let universe = load_universe_auto(universe_source).map_err(|e| {
        eprintln!("Error: loading universe: {}", e);
        e.exit_code() as u8
    })?;

    let name = QualifiedName::parse(type_name).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    let root = universe.lookup(&name).ok_or_else(|| {
        eprintln!("Error: unknown type {}", name);
        2u8
    })?;

    let closure = Flattener::new(&universe).flatten(root).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    if json_output {
        let members: Vec<serde_json::Value> = closure
            .members()
            .map(|m| {
                serde_json::json!({
                    "name": m.name.to_string(),
                    "kind": m.shape.kind(),
                })
            })
            .collect();
        let output = serde_json::json!({
            "root": closure.root().to_string(),
            "members": members,
        });
        let text = serde_json::to_string_pretty(&output).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", text);
    } else {
        for member in closure.members() {
            println!("{}\t{}", member.shape.kind(), member.name);
        }
    }

    Ok(())
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let text = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", text);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
