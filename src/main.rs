#[tokio::main]
async fn main() -> anyhow::Result<()> {
    branchsweep::logging::init();

    let args: Vec<String> = std::env::args().collect();
    branchsweep::run::run(args, None).await
}
