use clap::{Parser, Subcommand};
use erlpb_gen::cmds;
use erlpb_gen::cmds::codegen::CodegenOverrides;
use erlpb_gen::config::GroupPolicy;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "erlpb-gen")]
#[command(about = "Erlang protobuf codec generator", long_about = None)]
struct Cli {
    /* Log at debug level unless RUST_LOG says otherwise */
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /* Generate Erlang modules from descriptor files */
    Codegen {
        /* Input YAML descriptor files */
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /* Include directories for dependency files */
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /* Output directory for generated code */
        #[arg(short = 'o', long = "output", value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /* Generator config file (YAML) */
        #[arg(short = 'c', long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /* Suffix appended to module names */
        #[arg(long = "module-suffix", value_name = "SUFFIX")]
        module_suffix: Option<String>,

        /* What to do with group fields */
        #[arg(long = "group-policy", value_enum)]
        group_policy: Option<GroupPolicy>,

        /* Fail decoding on unknown field numbers instead of skipping them */
        #[arg(long = "strict-fields")]
        strict_fields: bool,

        /* Do not write .hrl record headers */
        #[arg(long = "no-header")]
        no_header: bool,
    },

    /* Resolve descriptor files and report types and generated functions */
    Analyze {
        /* Input YAML descriptor files */
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /* Include directories for dependency files */
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /* Generator config file (YAML) */
        #[arg(short = 'c', long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /* Print the codec plan (JSON) after analysis */
        #[arg(long = "print-plan")]
        print_plan: bool,
    },

    /* Run as a protoc plugin (protoc-gen-erl) */
    Plugin,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Codegen {
            files,
            include_dirs,
            output_dir,
            config,
            module_suffix,
            group_policy,
            strict_fields,
            no_header,
        } => {
            let overrides = CodegenOverrides {
                output_dir,
                module_suffix,
                group_policy,
                strict_fields,
                no_header,
            };
            cmds::codegen::run(files, include_dirs, config, overrides)?;
        }

        Commands::Analyze {
            files,
            include_dirs,
            config,
            print_plan,
        } => {
            cmds::analyze::run(files, include_dirs, config, print_plan)?;
        }

        Commands::Plugin => cmds::plugin::run()?,
    }

    Ok(())
}
