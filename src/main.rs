fn run() -> anyhow::Result<()> {
    let app = point_shadow::default()?;
    app.run()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Point light shadow demo starting");

    if let Err(e) = run() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
