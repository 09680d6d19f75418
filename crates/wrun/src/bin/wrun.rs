use std::io::Write;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use wrun::{
    Engine, FAILURE_EXIT_CODE, Harness, IntrinsicRegistry, Preload, RunOptions, Runner, Runtime,
};

#[derive(Parser)]
#[command(name = "wrun", about = "Link and run a WebAssembly module")]
struct Cli {
    /// Path to a .wat, .wast or .wasm module.
    module: Option<PathBuf>,

    /// Call this export with the given arguments instead of `main`.
    #[arg(short, long, value_name = "NAME")]
    function: Option<String>,

    /// Load and validate the module without running it.
    #[arg(short, long)]
    check: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Instantiate PATH first and offer its exports to imports from module NAME.
    #[arg(long, value_name = "NAME=PATH")]
    preload: Vec<Preload>,

    /// Arguments passed to the module. Everything after MODULE is forwarded.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    wrun::init_logging(cli.debug);

    let Some(module) = cli.module else {
        Cli::command().write_help(&mut std::io::stderr())?;
        std::process::exit(FAILURE_EXIT_CODE);
    };

    let options = RunOptions {
        module,
        function: cli.function,
        check_only: cli.check,
        preloads: cli.preload,
        args: cli.args,
    };

    let engine = Engine::default();
    let runner = Runner::new(engine.clone(), IntrinsicRegistry::standard());
    let mut runtime = Runtime::new(&engine);
    let status = Harness::default().run(&runner, &mut runtime, &options);
    // exit() skips destructors; putchar output may still be buffered.
    std::io::stdout().flush()?;
    std::process::exit(status)
}
