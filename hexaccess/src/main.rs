use clap::Parser;
use hexaccess::app::AccessCliArguments;

fn main() {
    env_logger::init();
    let args = AccessCliArguments::parse();
    match args.op.run() {
        Ok(_) => log::info!("finished."),
        Err(e) => {
            log::error!("failed running hexaccess: {e}");
            std::process::exit(1);
        }
    }
}
