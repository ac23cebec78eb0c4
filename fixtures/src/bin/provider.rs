use clap::Parser;
use fixtures::{provider, run_server, FixtureArgs};

/// Identity provider and payment API fixture server
#[derive(Parser, Debug)]
#[clap(name = "provider-fixture")]
struct Cli {
    #[clap(flatten)]
    common: FixtureArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let app = provider::router(provider::ProviderFixture::new());

    run_server(args.common, app).await
}
