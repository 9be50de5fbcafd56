use progtoken_cli_lib::args::parse_args;
use progtoken_cli_lib::runner::{assembler, run};
use progtoken_core::log::init_logger;
use progtoken_core::{error, info};
use serde_json::json;
use std::process::exit;

pub fn main() {
    let args = parse_args();
    if let Err(err) = init_logger(args.logdir.as_deref(), &args.log_level) {
        println!("Unable to initialize the logger: {err}");
        exit(1);
    }
    let Some(command) = args.command.clone() else {
        println!("No command given, see --help");
        exit(1);
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().worker_threads(args.async_threads.max(1)).enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            println!("Unable to start the async runtime: {err}");
            exit(1);
        }
    };

    let result = assembler(&args).and_then(|assembler| {
        info!("Assembling for {}", assembler.settings().network);
        runtime.block_on(run(&assembler, &command))
    });
    match result {
        Ok(output) => println!("{output:#}"),
        Err(err) => {
            error!("{}", err);
            println!("{:#}", json!({ "code": err.code(), "message": err.to_string() }));
            exit(1);
        }
    }
}
