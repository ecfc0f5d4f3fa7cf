use anyhow::Context;
use wine_quality::RunConfig;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = RunConfig::default();
    if let Some(source) = std::env::args().nth(1) {
        config.source = source;
    }

    let stdout = std::io::stdout();
    wine_quality::run(&config, stdout.lock())
        .with_context(|| format!("wine quality run on {} failed", config.source))?;
    Ok(())
}
