use anyhow::Error;
use clap::Parser;
use stampede::{cfg::Config, cmd::Cmd, engine::Runtime};
use tokio::runtime::Builder;

pub fn main() {
    let cmd = Cmd::parse();
    if let Err(err) = stampede::logging::init(cmd.verbose as usize) {
        eprintln!("ERROR: failed to initialize logging: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(cmd) {
        eprintln!("ERROR: {err:#}");
        std::process::exit(1);
    }
}

fn run(cmd: Cmd) -> Result<(), Error> {
    let json = cmd.json;
    let cfg: Config = cmd.try_into()?;

    let report = Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .thread_name("stampede")
        .build()?
        .block_on(async {
            let runtime = Runtime::new(cfg);

            runtime.run().await
        });

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }

    Ok(())
}
